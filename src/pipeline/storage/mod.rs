// Storage sinks for the normalized table bundle

pub mod in_memory;
pub mod ndjson;
pub mod sqlite;

pub use in_memory::InMemorySink;
pub use ndjson::NdjsonSink;
pub use sqlite::SqliteSink;
