use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span};

use crate::app::ports::RawSource;
use crate::config::SourceConfig;
use crate::constants::{CREDITS_SOURCE, TITLES_SOURCE};
use crate::domain::{Column, ColumnKind, RawCredit, RawTitle, TableData, Value};
use crate::error::{NormalizeError, Result};
use crate::pipeline::processing::{Issue, IssueKind, RawDataset};

const TITLES_REQUIRED: [&str; 3] = ["id", "genres", "production_countries"];
const CREDITS_REQUIRED: [&str; 3] = ["id", "person_id", "character"];

/// Reads the titles and credits CSVs plus any passthrough tables
#[derive(Debug, Clone)]
pub struct CsvSource {
    titles_path: PathBuf,
    credits_path: PathBuf,
    passthrough: Vec<(String, PathBuf)>,
}

impl CsvSource {
    pub fn new(titles_path: impl Into<PathBuf>, credits_path: impl Into<PathBuf>) -> Self {
        Self {
            titles_path: titles_path.into(),
            credits_path: credits_path.into(),
            passthrough: Vec::new(),
        }
    }

    pub fn with_passthrough(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.passthrough.push((name.into(), path.into()));
        self
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        config.passthrough.iter().fold(
            Self::new(&config.titles_path, &config.credits_path),
            |source, (name, path)| source.with_passthrough(name, path),
        )
    }

    pub fn read_titles(&self, issues: &mut Vec<Issue>) -> Result<Vec<RawTitle>> {
        read_rows(&self.titles_path, TITLES_SOURCE, &TITLES_REQUIRED, issues)
    }

    pub fn read_credits(&self, issues: &mut Vec<Issue>) -> Result<Vec<RawCredit>> {
        read_rows(&self.credits_path, CREDITS_SOURCE, &CREDITS_REQUIRED, issues)
    }

    /// Load one passthrough table. A missing file is not fatal: it is
    /// logged and yields an empty table with no columns.
    pub fn read_passthrough(&self, name: &str, path: &Path, issues: &mut Vec<Issue>) -> Result<TableData> {
        if !path.exists() {
            error!(table = name, path = %path.display(), "Passthrough source not found, writing empty table");
            return Ok(TableData::new(name, Vec::new()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_path(path)?;
        let columns: Vec<Column> = reader
            .headers()?
            .iter()
            .map(|h| Column::new(h, ColumnKind::Text))
            .collect();
        let mut table = TableData::new(name, columns);

        for result in reader.records() {
            match result {
                Ok(record) => table.rows.push(
                    record
                        .iter()
                        .map(|cell| if cell.is_empty() { Value::Null } else { Value::from(cell) })
                        .collect(),
                ),
                Err(e) if is_row_error(&e) => issues.push(malformed_row(name, &e)),
                Err(e) => return Err(e.into()),
            }
        }

        crate::metrics::normalize::rows_loaded(name, table.len());
        info!(table = name, rows = table.len(), "Loaded passthrough table");
        Ok(table)
    }
}

impl RawSource for CsvSource {
    fn load(&self) -> Result<RawDataset> {
        let _span = info_span!("load_sources").entered();
        let mut issues = Vec::new();

        let titles = self.read_titles(&mut issues)?;
        let credits = self.read_credits(&mut issues)?;

        let mut passthrough = Vec::with_capacity(self.passthrough.len());
        for (name, path) in &self.passthrough {
            passthrough.push(self.read_passthrough(name, path, &mut issues)?);
        }

        Ok(RawDataset {
            titles,
            credits,
            passthrough,
            issues,
        })
    }
}

fn read_rows<T: DeserializeOwned>(
    path: &Path,
    source: &'static str,
    required: &[&'static str],
    issues: &mut Vec<Issue>,
) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(NormalizeError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    if let Some(&column) = required.iter().find(|c| !headers.iter().any(|h| h == **c)) {
        return Err(NormalizeError::MissingColumn {
            table: source,
            column,
        });
    }

    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) if is_row_error(&e) => issues.push(malformed_row(source, &e)),
            Err(e) => return Err(e.into()),
        }
    }

    crate::metrics::normalize::rows_loaded(source, rows.len());
    info!(source, rows = rows.len(), path = %path.display(), "Loaded source rows");
    Ok(rows)
}

/// Errors confined to one record; the reader can continue past them
fn is_row_error(e: &csv::Error) -> bool {
    matches!(
        e.kind(),
        csv::ErrorKind::Deserialize { .. }
            | csv::ErrorKind::UnequalLengths { .. }
            | csv::ErrorKind::Utf8 { .. }
    )
}

fn malformed_row(source: &str, e: &csv::Error) -> Issue {
    let row = e
        .position()
        .map(|p| format!("line {}", p.line()))
        .unwrap_or_else(|| "line ?".to_string());
    Issue::new(IssueKind::MalformedRow, source, row, "*", e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const TITLES: &str = "\
id,title,type,release_year,genres,production_countries,seasons,imdb_score
tm1,Taxi Driver,MOVIE,1976,\"['drama', 'crime']\",\"['US']\",,8.2
tm2,Monty Python,SHOW,1969,\"['comedy']\",\"['GB']\",4.0,NaN
";

    const CREDITS: &str = "\
person_id,id,name,character,role
3748,tm1,Robert De Niro,Travis Bickle,ACTOR
14658,tm1,Jodie Foster,Iris Steensma,ACTOR
";

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_titles_and_credits() {
        let dir = TempDir::new().unwrap();
        let source = CsvSource::new(write(&dir, "titles.csv", TITLES), write(&dir, "credits.csv", CREDITS));

        let dataset = source.load().unwrap();

        assert_eq!(dataset.titles.len(), 2);
        let taxi = &dataset.titles[0];
        assert_eq!(taxi.show_type.as_deref(), Some("MOVIE"));
        assert_eq!(taxi.release_year, Some(1976));
        assert_eq!(taxi.seasons, None);
        assert_eq!(taxi.genres.as_deref(), Some("['drama', 'crime']"));
        // NaN is kept as a float and nulled at the storage boundary
        assert!(dataset.titles[1].imdb_score.map_or(true, f64::is_nan));

        assert_eq!(dataset.credits.len(), 2);
        assert_eq!(dataset.credits[1].person_id, 14658);
        assert_eq!(dataset.credits[1].character.as_deref(), Some("Iris Steensma"));
        assert!(dataset.issues.is_empty());
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let dir = TempDir::new().unwrap();
        let source = CsvSource::new(dir.path().join("nope.csv"), write(&dir, "credits.csv", CREDITS));

        match source.load() {
            Err(NormalizeError::SourceNotFound { path }) => assert!(path.ends_with("nope.csv")),
            other => panic!("expected SourceNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        let credits = write(&dir, "credits.csv", "person_id,id,name\n1,tm1,Someone\n");
        let source = CsvSource::new(write(&dir, "titles.csv", TITLES), credits);

        let err = source.load().unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::MissingColumn {
                table: "credits",
                column: "character"
            }
        ));
    }

    #[test]
    fn test_undeserializable_rows_are_skipped() {
        let dir = TempDir::new().unwrap();
        let credits = write(
            &dir,
            "credits.csv",
            "person_id,id,name,character,role\nnot-a-number,tm1,X,Ben,ACTOR\n7,tm1,Y,Ann,ACTOR\n",
        );
        let source = CsvSource::new(write(&dir, "titles.csv", TITLES), credits);

        let dataset = source.load().unwrap();

        assert_eq!(dataset.credits.len(), 1);
        assert_eq!(dataset.issues.len(), 1);
        assert_eq!(dataset.issues[0].kind, IssueKind::MalformedRow);
        assert_eq!(dataset.issues[0].table, CREDITS_SOURCE);
        assert_eq!(dataset.issues[0].row, "line 2");
    }

    #[test]
    fn test_passthrough_tables() {
        let dir = TempDir::new().unwrap();
        let best = write(&dir, "best.csv", "TITLE,SCORE\nHeat,8.3\nRonin,\n");
        let source = CsvSource::new(write(&dir, "titles.csv", TITLES), write(&dir, "credits.csv", CREDITS))
            .with_passthrough("best_movies", best)
            .with_passthrough("absent", dir.path().join("absent.csv"));

        let dataset = source.load().unwrap();

        assert_eq!(dataset.passthrough.len(), 2);
        let best = &dataset.passthrough[0];
        assert_eq!(best.column_names(), vec!["TITLE", "SCORE"]);
        assert_eq!(best.rows[1], vec![Value::from("Ronin"), Value::Null]);

        let absent = &dataset.passthrough[1];
        assert_eq!(absent.name, "absent");
        assert!(absent.columns.is_empty() && absent.is_empty());
    }

    #[test]
    fn test_from_config() {
        let mut config = SourceConfig::default();
        config.titles_path = PathBuf::from("t.csv");
        let source = CsvSource::from_config(&config);
        assert_eq!(source.titles_path, PathBuf::from("t.csv"));
        assert_eq!(source.passthrough.len(), config.passthrough.len());
    }
}
