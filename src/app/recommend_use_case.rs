use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use crate::constants::{BEST_MOVIES, BEST_MOVIES_TITLE_COLUMN, RECOMMENDATIONS};
use crate::domain::{Record, Recommendation};
use crate::error::Result;
use crate::pipeline::storage::sqlite::quote_ident;

/// Picks a random title from the curated list and records it
pub struct RecommendUseCase<'a> {
    conn: &'a Connection,
}

impl<'a> RecommendUseCase<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Every non-null title in the curated list, in table order
    pub fn candidate_titles(&self) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT {col} FROM {table} WHERE {col} IS NOT NULL",
            col = quote_ident(BEST_MOVIES_TITLE_COLUMN),
            table = quote_ident(BEST_MOVIES)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let titles = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(titles)
    }

    /// Choose a title uniformly at random and store it with the next id.
    /// Returns `None` when there is nothing to choose from.
    pub fn recommend<R: Rng + ?Sized>(&self, rng: &mut R, now: DateTime<Utc>) -> Result<Option<Recommendation>> {
        let titles = self.candidate_titles()?;
        let Some(title) = titles.choose(rng) else {
            warn!(table = BEST_MOVIES, "No titles available to recommend");
            return Ok(None);
        };

        self.ensure_table()?;
        let recommendation = Recommendation {
            recommendation_id: self.next_id()?,
            title: title.clone(),
            datestamp: now,
        };

        self.conn.execute(
            &format!(
                "INSERT INTO {} (recommendation_id, title, datestamp) VALUES (?1, ?2, ?3)",
                quote_ident(RECOMMENDATIONS)
            ),
            params![
                recommendation.recommendation_id,
                recommendation.title,
                recommendation.datestamp.to_rfc3339()
            ],
        )?;

        info!(
            id = recommendation.recommendation_id,
            title = %recommendation.title,
            "Recorded recommendation"
        );
        Ok(Some(recommendation))
    }

    /// All recorded recommendations, oldest first
    pub fn history(&self) -> Result<Vec<(i64, String, String)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT recommendation_id, title, datestamp FROM {} ORDER BY recommendation_id",
            quote_ident(RECOMMENDATIONS)
        ))?;
        let rows: Vec<(i64, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn next_id(&self) -> Result<i64> {
        let max: Option<i64> = self
            .conn
            .query_row(
                &format!(
                    "SELECT MAX(recommendation_id) FROM {}",
                    quote_ident(RECOMMENDATIONS)
                ),
                [],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .flatten();
        Ok(max.unwrap_or(0) + 1)
    }

    /// The table exists after any run; recreate it when the database was
    /// populated some other way.
    fn ensure_table(&self) -> Result<()> {
        let columns: Vec<String> = Recommendation::columns()
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.kind.sql_type()))
            .collect();
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            quote_ident(RECOMMENDATIONS),
            columns.join(", ")
        ))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::TableSink;
    use crate::domain::{Column, ColumnKind, Table, TableData, Value};
    use crate::pipeline::storage::SqliteSink;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sink_with_titles(titles: &[Option<&str>]) -> SqliteSink {
        let mut sink = SqliteSink::in_memory().unwrap();
        let mut best = TableData::new(BEST_MOVIES, vec![Column::new("TITLE", ColumnKind::Text)]);
        for title in titles {
            best.rows.push(vec![Value::text(*title)]);
        }
        sink.write_table(&best).unwrap();
        sink.write_table(&Table::<Recommendation>::empty(RECOMMENDATIONS).to_data())
            .unwrap();
        sink
    }

    #[test]
    fn test_recommendation_ids_increase() {
        let sink = sink_with_titles(&[Some("Heat"), None, Some("Ronin")]);
        let use_case = RecommendUseCase::new(sink.connection());
        let mut rng = StdRng::seed_from_u64(7);

        let first = use_case.recommend(&mut rng, Utc::now()).unwrap().unwrap();
        let second = use_case.recommend(&mut rng, Utc::now()).unwrap().unwrap();

        assert_eq!(first.recommendation_id, 1);
        assert_eq!(second.recommendation_id, 2);
        assert!(["Heat", "Ronin"].contains(&first.title.as_str()));

        let history = use_case.history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].1, second.title);
    }

    #[test]
    fn test_empty_source_recommends_nothing() {
        let sink = sink_with_titles(&[]);
        let use_case = RecommendUseCase::new(sink.connection());
        let mut rng = StdRng::seed_from_u64(1);

        assert!(use_case.recommend(&mut rng, Utc::now()).unwrap().is_none());
        assert!(use_case.history().unwrap().is_empty());
    }

    #[test]
    fn test_missing_curated_table_is_an_error() {
        let sink = SqliteSink::in_memory().unwrap();
        let use_case = RecommendUseCase::new(sink.connection());
        let mut rng = StdRng::seed_from_u64(1);

        assert!(use_case.recommend(&mut rng, Utc::now()).is_err());
    }

    #[test]
    fn test_recommendations_table_is_created_on_demand() {
        let mut sink = SqliteSink::in_memory().unwrap();
        let mut best = TableData::new(BEST_MOVIES, vec![Column::new("TITLE", ColumnKind::Text)]);
        best.rows.push(vec![Value::from("Heat")]);
        sink.write_table(&best).unwrap();

        let use_case = RecommendUseCase::new(sink.connection());
        let picked = use_case
            .recommend(&mut StdRng::seed_from_u64(3), Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(picked.title, "Heat");
        assert_eq!(picked.recommendation_id, 1);
    }
}
