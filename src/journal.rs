//! Running log of entries (downward crossings) and exits (upward crossings).

use chrono::{DateTime, Utc};
use serde_derive::Serialize;
use std::io::Write;

use crate::counter::{CrossingEvent, Direction};
use crate::error::Error;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const HEADER: [&str; 4] = ["entry_count", "entry_time", "exit_count", "exit_time"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mark {
    count: u32,
    time: DateTime<Utc>,
}

/// One output row. Entries and exits are independent columns, so a row
/// may carry only one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalRow {
    pub entry_count: Option<u32>,
    pub entry_time: Option<String>,
    pub exit_count: Option<u32>,
    pub exit_time: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct CountJournal {
    entries: Vec<Mark>,
    exits: Vec<Mark>,
}

impl CountJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event under the running total it produced.
    pub fn record(&mut self, event: &CrossingEvent, total: u32) {
        let mark = Mark {
            count: total,
            time: event.timestamp,
        };

        match event.kind {
            Direction::Down => self.entries.push(mark),
            Direction::Up => self.exits.push(mark),
        }
    }

    #[inline]
    pub fn entries(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn exits(&self) -> usize {
        self.exits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.exits.is_empty()
    }

    pub fn rows(&self) -> Vec<JournalRow> {
        let n = self.entries.len().max(self.exits.len());
        let fmt = |m: &Mark| m.time.format(TIME_FORMAT).to_string();

        (0..n)
            .map(|i| {
                let entry = self.entries.get(i);
                let exit = self.exits.get(i);

                JournalRow {
                    entry_count: entry.map(|m| m.count),
                    entry_time: entry.map(fmt),
                    exit_count: exit.map(|m| m.count),
                    exit_time: exit.map(fmt),
                }
            })
            .collect()
    }

    /// Writes the journal as CSV with every cell quoted.
    pub fn write_csv<W: Write>(&self, mut out: W) -> Result<(), Error> {
        write_record(&mut out, HEADER.iter().map(|s| s.to_string()))?;

        for row in self.rows() {
            let cells = [
                row.entry_count.map(|c| c.to_string()),
                row.entry_time,
                row.exit_count.map(|c| c.to_string()),
                row.exit_time,
            ];

            write_record(&mut out, cells.into_iter().map(Option::unwrap_or_default))?;
        }

        out.flush()?;
        Ok(())
    }
}

fn write_record<W: Write, I: Iterator<Item = String>>(out: &mut W, cells: I) -> Result<(), Error> {
    let line: Vec<String> = cells
        .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
        .collect();

    writeln!(out, "{}", line.join(","))?;
    Ok(())
}
