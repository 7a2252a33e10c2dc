pub mod error;
pub mod extract;
pub mod load;
pub mod publish;
pub mod structs;
pub mod transform;

// Re-export public API
pub use error::{PipelineError, Result};
pub use extract::{extract_table, fetch_html};
pub use load::write_json;
pub use publish::{KafkaSink, MessageSink, publish, publish_with};
pub use structs::{BuildingRecord, RawTable, Role, ScrapeConfig, SimpleLogger};
pub use transform::clean;
