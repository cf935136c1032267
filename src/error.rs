use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Assignment could not be solved: {0}")]
    Assignment(String),

    #[error("Identity space exhausted, no id left to register a new object")]
    IdsExhausted,

    #[error("Alert queue is full, alert dropped")]
    AlertQueueFull,

    #[error("Alert dispatcher is closed")]
    AlertDispatcherClosed,
}
