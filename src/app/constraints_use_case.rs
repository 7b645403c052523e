use rusqlite::Connection;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::constants::{
    BEST_MOVIES, CHARACTERS, COUNTRIES, CREDITS, GENRES, MOVIES, MOVIE_COUNTRIES, MOVIE_GENRES,
    RECOMMENDATIONS,
};
use crate::pipeline::storage::sqlite::quote_ident;

/// A unique key standing in for a primary key SQLite cannot add after the fact
#[derive(Debug, Clone, Copy)]
pub struct KeyConstraint {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

/// A reference from `table.column` to `parent.parent_column`, checked by
/// counting orphans rather than enforced
#[derive(Debug, Clone, Copy)]
pub struct ReferenceConstraint {
    pub table: &'static str,
    pub column: &'static str,
    pub parent: &'static str,
    pub parent_column: &'static str,
}

pub const KEYS: [KeyConstraint; 9] = [
    KeyConstraint { table: MOVIES, columns: &["id"] },
    KeyConstraint { table: GENRES, columns: &["genre_id"] },
    KeyConstraint { table: COUNTRIES, columns: &["country_id"] },
    KeyConstraint { table: CHARACTERS, columns: &["character_id"] },
    KeyConstraint { table: CREDITS, columns: &["person_id", "character_id", "id"] },
    KeyConstraint { table: MOVIE_GENRES, columns: &["id", "genre_id"] },
    KeyConstraint { table: MOVIE_COUNTRIES, columns: &["id", "country_id"] },
    KeyConstraint { table: RECOMMENDATIONS, columns: &["recommendation_id"] },
    // Fails, and is reported, when the curated list was not loaded
    KeyConstraint { table: BEST_MOVIES, columns: &["index"] },
];

pub const REFERENCES: [ReferenceConstraint; 6] = [
    ReferenceConstraint { table: CREDITS, column: "id", parent: MOVIES, parent_column: "id" },
    ReferenceConstraint { table: CREDITS, column: "character_id", parent: CHARACTERS, parent_column: "character_id" },
    ReferenceConstraint { table: MOVIE_GENRES, column: "id", parent: MOVIES, parent_column: "id" },
    ReferenceConstraint { table: MOVIE_GENRES, column: "genre_id", parent: GENRES, parent_column: "genre_id" },
    ReferenceConstraint { table: MOVIE_COUNTRIES, column: "id", parent: MOVIES, parent_column: "id" },
    ReferenceConstraint { table: MOVIE_COUNTRIES, column: "country_id", parent: COUNTRIES, parent_column: "country_id" },
];

impl KeyConstraint {
    pub fn index_name(&self) -> String {
        format!("pk_{}", self.table)
    }

    pub fn sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
            quote_ident(&self.index_name()),
            quote_ident(self.table),
            columns.join(", ")
        )
    }
}

impl ReferenceConstraint {
    pub fn describe(&self) -> String {
        format!("{}.{} -> {}.{}", self.table, self.column, self.parent, self.parent_column)
    }

    pub fn orphan_count_sql(&self) -> String {
        let (t, c) = (quote_ident(self.table), quote_ident(self.column));
        let (p, pc) = (quote_ident(self.parent), quote_ident(self.parent_column));
        format!(
            "SELECT COUNT(*) FROM {t} WHERE {c} IS NOT NULL AND {c} NOT IN (SELECT {pc} FROM {p})"
        )
    }
}

/// Outcome of one constraint command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ConstraintOutcome {
    Applied,
    Clean,
    Orphans { count: i64 },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintResult {
    pub name: String,
    pub outcome: ConstraintOutcome,
}

/// Applies the key and reference checks to a loaded database.
///
/// Each command runs on its own; a failing command is logged and the
/// remaining ones still run.
pub struct ConstraintsUseCase<'a> {
    conn: &'a Connection,
}

impl<'a> ConstraintsUseCase<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn apply(&self) -> Vec<ConstraintResult> {
        let mut results = Vec::with_capacity(KEYS.len() + REFERENCES.len());

        for key in &KEYS {
            let sql = key.sql();
            info!(table = key.table, "Executing: {}", sql);
            let outcome = match self.conn.execute_batch(&sql) {
                Ok(()) => ConstraintOutcome::Applied,
                Err(e) => {
                    error!(table = key.table, "Error executing {}: {}", sql, e);
                    ConstraintOutcome::Failed { error: e.to_string() }
                }
            };
            results.push(ConstraintResult {
                name: key.index_name(),
                outcome,
            });
        }

        for reference in &REFERENCES {
            let sql = reference.orphan_count_sql();
            info!(reference = %reference.describe(), "Executing: {}", sql);
            let outcome = match self.conn.query_row(&sql, [], |row| row.get::<_, i64>(0)) {
                Ok(0) => ConstraintOutcome::Clean,
                Ok(count) => {
                    warn!(reference = %reference.describe(), count, "Orphaned references found");
                    ConstraintOutcome::Orphans { count }
                }
                Err(e) => {
                    error!(reference = %reference.describe(), "Error executing {}: {}", sql, e);
                    ConstraintOutcome::Failed { error: e.to_string() }
                }
            };
            results.push(ConstraintResult {
                name: reference.describe(),
                outcome,
            });
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::TableSink;
    use crate::domain::{Column, ColumnKind, RawCredit, RawTitle, TableData, Value};
    use crate::pipeline::processing::{Normalizer, RawDataset};
    use crate::pipeline::storage::SqliteSink;

    fn best_movies() -> TableData {
        let mut table = TableData::new(
            BEST_MOVIES,
            vec![Column::new("index", ColumnKind::Text), Column::new("TITLE", ColumnKind::Text)],
        );
        table.rows.push(vec![Value::from("0"), Value::from("Heat")]);
        table.rows.push(vec![Value::from("1"), Value::from("Ronin")]);
        table
    }

    fn loaded_sink_with(credits: Vec<RawCredit>) -> SqliteSink {
        let catalog = Normalizer::default().normalize(RawDataset {
            titles: vec![RawTitle::with_lists("tm1", Some("['drama']"), Some("['US']"))],
            credits,
            passthrough: vec![best_movies()],
            ..RawDataset::default()
        });
        let mut sink = SqliteSink::in_memory().unwrap();
        sink.write_bundle(&catalog.to_bundle().unwrap()).unwrap();
        sink
    }

    fn loaded_sink() -> SqliteSink {
        loaded_sink_with(vec![RawCredit::new("tm1", 1, Some("Ben"))])
    }

    fn outcome_of<'r>(results: &'r [ConstraintResult], name: &str) -> &'r ConstraintOutcome {
        &results.iter().find(|r| r.name == name).unwrap().outcome
    }

    #[test]
    fn test_normalized_output_satisfies_every_constraint() {
        let sink = loaded_sink();
        let results = ConstraintsUseCase::new(sink.connection()).apply();

        assert_eq!(results.len(), KEYS.len() + REFERENCES.len());
        assert_eq!(outcome_of(&results, "pk_recommendations"), &ConstraintOutcome::Applied);
        assert_eq!(outcome_of(&results, "pk_best_movies"), &ConstraintOutcome::Applied);
        for result in &results {
            assert!(
                matches!(result.outcome, ConstraintOutcome::Applied | ConstraintOutcome::Clean),
                "{} -> {:?}",
                result.name,
                result.outcome
            );
        }
    }

    #[test]
    fn test_failures_do_not_stop_later_commands() {
        let sink = loaded_sink();
        let conn = sink.connection();
        conn.execute_batch("DROP TABLE genres; INSERT INTO credits VALUES (9, 'tm404', NULL, NULL, 1);")
            .unwrap();

        let results = ConstraintsUseCase::new(conn).apply();

        let genres_key = results.iter().find(|r| r.name == "pk_genres").unwrap();
        assert!(matches!(genres_key.outcome, ConstraintOutcome::Failed { .. }));

        let credits_movies = results
            .iter()
            .find(|r| r.name == "credits.id -> movies.id")
            .unwrap();
        assert_eq!(credits_movies.outcome, ConstraintOutcome::Orphans { count: 1 });

        let countries_key = results.iter().find(|r| r.name == "pk_countries").unwrap();
        assert_eq!(countries_key.outcome, ConstraintOutcome::Applied);
    }

    #[test]
    fn test_duplicate_key_is_reported() {
        let sink = loaded_sink();
        let conn = sink.connection();
        conn.execute_batch("INSERT INTO movies (id) VALUES ('tm1');").unwrap();

        let results = ConstraintsUseCase::new(conn).apply();
        let movies_key = results.iter().find(|r| r.name == "pk_movies").unwrap();
        assert!(matches!(movies_key.outcome, ConstraintOutcome::Failed { .. }));
    }

    #[test]
    fn test_recommendation_ids_are_unique() {
        let sink = loaded_sink();
        let conn = sink.connection();
        ConstraintsUseCase::new(conn).apply();

        conn.execute_batch("INSERT INTO recommendations VALUES (1, 'Heat', '2024-01-01T00:00:00+00:00');")
            .unwrap();
        assert!(conn
            .execute_batch("INSERT INTO recommendations VALUES (1, 'Ronin', '2024-01-02T00:00:00+00:00');")
            .is_err());
    }

    #[test]
    fn test_missing_curated_list_fails_only_its_key() {
        let sink = loaded_sink();
        let conn = sink.connection();
        conn.execute_batch("DROP TABLE best_movies;").unwrap();

        let results = ConstraintsUseCase::new(conn).apply();

        assert!(matches!(outcome_of(&results, "pk_best_movies"), ConstraintOutcome::Failed { .. }));
        let failed = results
            .iter()
            .filter(|r| matches!(r.outcome, ConstraintOutcome::Failed { .. }))
            .count();
        assert_eq!(failed, 1);
    }

    #[test]
    fn test_credits_differing_only_in_name_break_the_key() {
        let mut first = RawCredit::new("tm1", 1, Some("Ben"));
        first.name = Some("Jane Doe".to_string());
        let mut second = RawCredit::new("tm1", 1, Some("Ben"));
        second.name = Some("J. Doe".to_string());
        let sink = loaded_sink_with(vec![first, second]);

        let credits: i64 = sink
            .connection()
            .query_row("SELECT COUNT(*) FROM credits", [], |r| r.get(0))
            .unwrap();
        assert_eq!(credits, 2);

        let results = ConstraintsUseCase::new(sink.connection()).apply();
        assert!(matches!(outcome_of(&results, "pk_credits"), ConstraintOutcome::Failed { .. }));
    }
}
