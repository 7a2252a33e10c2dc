#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Fetch Error: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Not Found: no table with class '{0}' on the page")]
    NotFound(String),
    #[error("Malformed Table: {0}")]
    MalformedTable(String),
    #[error("Discovery Error: no column matches the {0} role")]
    Discovery(String),
    #[error("Empty Result: {0} produced no rows")]
    EmptyResult(&'static str),
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Publish Error: {0}")]
    Publish(#[from] kafka::error::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
