//! Pipeline counters.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.

use metrics::{describe_counter, Unit};

/// Register descriptions for every counter this crate emits
pub fn describe() {
    describe_counter!("normalize_rows_loaded_total", Unit::Count, "Source rows read from CSV");
    describe_counter!("normalize_issues_total", Unit::Count, "Rows recovered from or dropped");
    describe_counter!("normalize_duplicates_removed_total", Unit::Count, "Exact-duplicate rows removed");
    describe_counter!("sink_tables_written_total", Unit::Count, "Tables written to a sink");
    describe_counter!("sink_rows_written_total", Unit::Count, "Rows written to a sink");
}

pub mod normalize {
    use crate::pipeline::processing::report::IssueKind;

    pub fn rows_loaded(source: &str, rows: usize) {
        ::metrics::counter!("normalize_rows_loaded_total", "source" => source.to_string())
            .increment(rows as u64);
    }

    pub fn issue_recorded(kind: IssueKind) {
        ::metrics::counter!("normalize_issues_total", "kind" => kind.as_str()).increment(1);
    }

    pub fn duplicates_removed(rows: usize) {
        ::metrics::counter!("normalize_duplicates_removed_total").increment(rows as u64);
    }
}

pub mod sink {
    pub fn table_written(sink: &'static str, rows: usize) {
        ::metrics::counter!("sink_tables_written_total", "sink" => sink).increment(1);
        ::metrics::counter!("sink_rows_written_total", "sink" => sink).increment(rows as u64);
    }
}
