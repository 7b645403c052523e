use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What went wrong with one source row or junction tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// CSV row that could not be deserialized; skipped
    MalformedRow,
    /// List field that could not be parsed; treated as empty
    MalformedList,
    /// Row without the natural key it is joined on; dropped
    MissingKey,
    /// Junction label absent from the entity mapping; dropped
    UnresolvedEntity,
    /// Surrogate id that does not fit the stored integer type; dropped
    IdOutOfRange,
    /// Junction row referencing a movie id missing from `movies`; dropped
    UnknownMovie,
}

/// The two non-fatal error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Parse,
    Integrity,
}

impl IssueKind {
    pub fn category(self) -> IssueCategory {
        match self {
            IssueKind::MalformedRow | IssueKind::MalformedList => IssueCategory::Parse,
            IssueKind::MissingKey
            | IssueKind::UnresolvedEntity
            | IssueKind::IdOutOfRange
            | IssueKind::UnknownMovie => IssueCategory::Integrity,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::MalformedRow => "malformed_row",
            IssueKind::MalformedList => "malformed_list",
            IssueKind::MissingKey => "missing_key",
            IssueKind::UnresolvedEntity => "unresolved_entity",
            IssueKind::IdOutOfRange => "id_out_of_range",
            IssueKind::UnknownMovie => "unknown_movie",
        }
    }

    /// Whether the affected row is removed from the output
    pub fn drops_row(self) -> bool {
        self != IssueKind::MalformedList
    }
}

/// One audited data-quality problem: enough context to trace lost data
/// back to the source row and field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub table: String,
    pub row: String,
    pub field: String,
    pub detail: String,
}

impl Issue {
    pub fn new(
        kind: IssueKind,
        table: impl Into<String>,
        row: impl Into<String>,
        field: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            table: table.into(),
            row: row.into(),
            field: field.into(),
            detail: detail.into(),
        }
    }
}

/// Everything a run recovered from instead of aborting
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizeReport {
    issues: Vec<Issue>,
    duplicates_removed: BTreeMap<String, usize>,
}

impl NormalizeReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and keep an issue
    pub fn record(&mut self, issue: Issue) {
        match issue.kind.category() {
            IssueCategory::Parse if !issue.kind.drops_row() => warn!(
                table = %issue.table,
                row = %issue.row,
                field = %issue.field,
                kind = issue.kind.as_str(),
                "Malformed list field treated as empty: {}",
                issue.detail
            ),
            IssueCategory::Parse => warn!(
                table = %issue.table,
                row = %issue.row,
                field = %issue.field,
                kind = issue.kind.as_str(),
                "Skipping malformed source row: {}",
                issue.detail
            ),
            IssueCategory::Integrity => warn!(
                table = %issue.table,
                row = %issue.row,
                field = %issue.field,
                kind = issue.kind.as_str(),
                "Integrity violation, dropping row: {}",
                issue.detail
            ),
        }
        crate::metrics::normalize::issue_recorded(issue.kind);
        self.issues.push(issue);
    }

    pub fn record_duplicates(&mut self, table: &str, removed: usize) {
        if removed == 0 {
            return;
        }
        debug!(table, removed, "Removed duplicate rows");
        crate::metrics::normalize::duplicates_removed(removed);
        *self.duplicates_removed.entry(table.to_string()).or_insert(0) += removed;
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues_of(kind).count()
    }

    pub fn count_category(&self, category: IssueCategory) -> usize {
        self.issues
            .iter()
            .filter(|i| i.kind.category() == category)
            .count()
    }

    /// Rows removed for integrity or parse reasons, excluding duplicates
    pub fn dropped_rows(&self) -> usize {
        self.issues.iter().filter(|i| i.kind.drops_row()).count()
    }

    pub fn duplicates_removed(&self) -> &BTreeMap<String, usize> {
        &self.duplicates_removed
    }

    pub fn duplicates_in(&self, table: &str) -> usize {
        self.duplicates_removed.get(table).copied().unwrap_or(0)
    }

    /// Issue totals keyed by kind name, for summaries
    pub fn counts_by_kind(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.duplicates_removed.is_empty()
    }
}
