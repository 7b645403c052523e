// Pipeline ingestion: reading the raw CSV sources

pub mod csv_source;

pub use csv_source::CsvSource;
