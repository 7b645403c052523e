use std::collections::HashSet;

use super::junction::Candidate;
use super::report::{Issue, IssueKind, NormalizeReport};
use crate::domain::{Record, Value};

/// Turn resolved candidates into junction rows.
///
/// Candidates with no entity id, and ids that cannot be stored as `i64`,
/// are dropped and recorded against `table`/`field` with the parent row
/// identity given by `describe`.
pub fn drop_unresolved<P, R>(
    table: &str,
    field: &str,
    candidates: Vec<Candidate<P>>,
    describe: impl Fn(&P) -> String,
    build: impl Fn(P, i64) -> R,
    report: &mut NormalizeReport,
) -> Vec<R> {
    let mut rows = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let Some(entity_id) = candidate.entity_id else {
            report.record(Issue::new(
                IssueKind::UnresolvedEntity,
                table,
                describe(&candidate.parent),
                field,
                format!("label {:?} has no entity id", candidate.label),
            ));
            continue;
        };

        match i64::try_from(entity_id) {
            Ok(id) => rows.push(build(candidate.parent, id)),
            Err(_) => report.record(Issue::new(
                IssueKind::IdOutOfRange,
                table,
                describe(&candidate.parent),
                field,
                format!("entity id {} does not fit an integer column", entity_id),
            )),
        }
    }

    rows
}

/// Keep only rows whose movie id exists in the `movies` table
pub fn retain_known_movies<R>(
    table: &str,
    rows: Vec<R>,
    known_movies: &HashSet<String>,
    movie_id: impl Fn(&R) -> &str,
    report: &mut NormalizeReport,
) -> Vec<R> {
    rows.into_iter()
        .filter(|row| {
            let id = movie_id(row);
            if known_movies.contains(id) {
                return true;
            }
            report.record(Issue::new(
                IssueKind::UnknownMovie,
                table,
                id,
                "id",
                "movie id not present in movies",
            ));
            false
        })
        .collect()
}

/// Remove exact-duplicate rows; the first occurrence of each row is kept
/// in its original position.
pub fn dedup_rows<R: Record>(table: &str, rows: Vec<R>, report: &mut NormalizeReport) -> Vec<R> {
    let before = rows.len();
    let mut seen: HashSet<Vec<Value>> = HashSet::with_capacity(before);
    let kept: Vec<R> = rows
        .into_iter()
        .filter(|row| seen.insert(row.values()))
        .collect();

    report.record_duplicates(table, before - kept.len());
    kept
}
