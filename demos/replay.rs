//! Replays recorded boxes through a scene and prints crossings.
//!
//! Input has one frame per line: `<timestamp_ms>:<json array of [l,t,r,b]>`,
//! e.g. `1200:[[10,10,30,30],[200,40,230,90]]`. Lines that fail to parse are
//! treated as frames without boxes.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use clap::{Parser, ValueEnum};
use std::io::BufRead;
use std::path::PathBuf;

use qcount::bbox::{BBox, Ltrb};
use qcount::matching::{GreedyMatcher, Matcher, MunkresMatcher};
use qcount::scene::Scene;
use qcount::{Config, Direction, Frame};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MatcherKind {
    Greedy,
    Munkres,
}

#[derive(Parser)]
#[command(about = "Replay recorded boxes through a line-crossing scene")]
struct Args {
    /// Recorded boxes, one frame per line
    input: PathBuf,
    /// JSON config, defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "500")]
    width: u32,
    #[arg(long, default_value = "375")]
    height: u32,
    #[arg(long, value_enum, default_value = "greedy")]
    matcher: MatcherKind,
    /// Write the entry/exit journal here as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn parse_line(line: &str) -> Option<(DateTime<Utc>, Vec<BBox<Ltrb>>)> {
    let idx = line.find(':')?;
    let (ts, boxes) = line.split_at(idx);

    let ts_ms: i64 = ts.trim().parse().ok()?;
    let boxes: Vec<BBox<Ltrb>> = serde_json::from_str(&boxes[1..]).ok()?;
    let ts = Utc.timestamp_millis_opt(ts_ms).single()?;

    Some((ts, boxes))
}

fn run<M: Matcher>(mut scene: Scene<M>, args: &Args) -> Result<()> {
    let file = std::fs::File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let mut last_ts = Utc::now();

    for (lineno, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let update = match parse_line(&line) {
            Some((ts, boxes)) => {
                last_ts = ts;
                scene.process(&Frame::new((args.width, args.height), boxes, ts))?
            }
            None => {
                log::warn!("line {}: wrong format, treating as empty frame", lineno + 1);
                scene.skip(last_ts)?
            }
        };

        for ev in &update.events {
            let label = match ev.kind {
                Direction::Down => "IN ",
                Direction::Up => "OUT",
            };

            println!(
                "{} #{:<4} ({}, {}) {}",
                label,
                ev.id,
                ev.centroid.x,
                ev.centroid.y,
                ev.timestamp.to_rfc3339()
            );
        }

        for alert in &update.alerts {
            println!("ALERT inside={} threshold={}", alert.inside, alert.threshold);
        }
    }

    let counter = scene.counter();
    println!(
        "frames: {}, in: {}, out: {}, inside: {}",
        scene.frames(),
        counter.total_down(),
        counter.total_up(),
        counter.inside()
    );

    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        scene.journal().write_csv(std::io::BufWriter::new(file))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    log::info!(
        "replaying {} with max_disappeared={} max_distance={} line={}",
        args.input.display(),
        config.tracker.max_disappeared,
        config.tracker.max_distance,
        config.counter.line_position
    );

    match args.matcher {
        MatcherKind::Greedy => run(Scene::with_matcher(&config, GreedyMatcher)?, &args),
        MatcherKind::Munkres => run(Scene::with_matcher(&config, MunkresMatcher)?, &args),
    }
}
