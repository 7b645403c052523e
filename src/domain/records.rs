use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::table::{Column, ColumnKind, Record, Value};

/// One row of the raw titles CSV.
///
/// Numeric attributes that fail to parse (blank cells, `NaN`, `2016.0` in an
/// integer column) deserialize to `None` instead of rejecting the row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTitle {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub show_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub release_year: Option<i64>,
    #[serde(default)]
    pub age_certification: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub runtime: Option<i64>,
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub production_countries: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub seasons: Option<f64>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub imdb_score: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub imdb_votes: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub tmdb_popularity: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub tmdb_score: Option<f64>,
}

impl RawTitle {
    /// Title row carrying only an id and its two list fields
    pub fn with_lists(id: &str, genres: Option<&str>, production_countries: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            genres: genres.map(str::to_string),
            production_countries: production_countries.map(str::to_string),
            ..Self::default()
        }
    }
}

/// One row of the raw credits CSV
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCredit {
    pub person_id: i64,
    #[serde(rename = "id")]
    pub movie_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl RawCredit {
    pub fn new(movie_id: &str, person_id: i64, character: Option<&str>) -> Self {
        Self {
            person_id,
            movie_id: movie_id.to_string(),
            character: character.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Normalized movie: every scalar title attribute, list columns removed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub id: String,
    pub title: Option<String>,
    pub show_type: Option<String>,
    pub description: Option<String>,
    pub release_year: Option<i64>,
    pub age_certification: Option<String>,
    pub runtime: Option<i64>,
    pub seasons: Option<f64>,
    pub imdb_id: Option<String>,
    pub imdb_score: Option<f64>,
    pub imdb_votes: Option<f64>,
    pub tmdb_popularity: Option<f64>,
    pub tmdb_score: Option<f64>,
}

impl From<&RawTitle> for Movie {
    fn from(raw: &RawTitle) -> Self {
        Self {
            id: raw.id.clone(),
            title: raw.title.clone(),
            show_type: raw.show_type.clone(),
            description: raw.description.clone(),
            release_year: raw.release_year,
            age_certification: raw.age_certification.clone(),
            runtime: raw.runtime,
            seasons: raw.seasons,
            imdb_id: raw.imdb_id.clone(),
            imdb_score: raw.imdb_score,
            imdb_votes: raw.imdb_votes,
            tmdb_popularity: raw.tmdb_popularity,
            tmdb_score: raw.tmdb_score,
        }
    }
}

impl Record for Movie {
    fn columns() -> Vec<Column> {
        use ColumnKind::*;
        vec![
            Column::new("id", Text),
            Column::new("title", Text),
            Column::new("type", Text),
            Column::new("description", Text),
            Column::new("release_year", Integer),
            Column::new("age_certification", Text),
            Column::new("runtime", Integer),
            Column::new("seasons", Real),
            Column::new("imdb_id", Text),
            Column::new("imdb_score", Real),
            Column::new("imdb_votes", Real),
            Column::new("tmdb_popularity", Real),
            Column::new("tmdb_score", Real),
        ]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.id.as_str()),
            Value::text(self.title.as_deref()),
            Value::text(self.show_type.as_deref()),
            Value::text(self.description.as_deref()),
            Value::integer(self.release_year),
            Value::text(self.age_certification.as_deref()),
            Value::integer(self.runtime),
            Value::real(self.seasons),
            Value::text(self.imdb_id.as_deref()),
            Value::real(self.imdb_score),
            Value::real(self.imdb_votes),
            Value::real(self.tmdb_popularity),
            Value::real(self.tmdb_score),
        ]
    }
}

/// Row type of an entity table built from an [`EntityCatalog`](crate::pipeline::processing::entities::EntityCatalog)
pub trait EntityRow: Record {
    fn from_entry(id: i64, label: &str) -> Self;
    fn id(&self) -> i64;
    fn label(&self) -> &str;
}

macro_rules! entity_row {
    ($name:ident, $label:ident, $id:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        pub struct $name {
            pub $label: String,
            pub $id: i64,
        }

        impl Record for $name {
            fn columns() -> Vec<Column> {
                vec![
                    Column::new(stringify!($label), ColumnKind::Text),
                    Column::new(stringify!($id), ColumnKind::Integer),
                ]
            }

            fn values(&self) -> Vec<Value> {
                vec![Value::from(self.$label.as_str()), Value::Integer(self.$id)]
            }
        }

        impl EntityRow for $name {
            fn from_entry(id: i64, label: &str) -> Self {
                Self {
                    $label: label.to_string(),
                    $id: id,
                }
            }

            fn id(&self) -> i64 {
                self.$id
            }

            fn label(&self) -> &str {
                &self.$label
            }
        }
    };
}

entity_row!(Genre, genre, genre_id);
entity_row!(Country, country, country_id);
entity_row!(Character, character_name, character_id);

/// Junction: movie ↔ genre
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MovieGenre {
    pub movie_id: String,
    pub genre_id: i64,
}

impl Record for MovieGenre {
    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", ColumnKind::Text),
            Column::new("genre_id", ColumnKind::Integer),
        ]
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(self.movie_id.as_str()), Value::Integer(self.genre_id)]
    }
}

/// Junction: movie ↔ production country
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MovieCountry {
    pub movie_id: String,
    pub country_id: i64,
}

impl Record for MovieCountry {
    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", ColumnKind::Text),
            Column::new("country_id", ColumnKind::Integer),
        ]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.movie_id.as_str()),
            Value::Integer(self.country_id),
        ]
    }
}

/// Junction with role: a person playing one character in one movie
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Credit {
    pub person_id: i64,
    pub movie_id: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub character_id: i64,
}

impl Record for Credit {
    fn columns() -> Vec<Column> {
        use ColumnKind::*;
        vec![
            Column::new("person_id", Integer),
            Column::new("id", Text),
            Column::new("name", Text),
            Column::new("role", Text),
            Column::new("character_id", Integer),
        ]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.person_id),
            Value::from(self.movie_id.as_str()),
            Value::text(self.name.as_deref()),
            Value::text(self.role.as_deref()),
            Value::Integer(self.character_id),
        ]
    }
}

/// A recorded recommendation. Normalization only emits the empty table;
/// rows are added later by the recommender.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub recommendation_id: i64,
    pub title: String,
    pub datestamp: DateTime<Utc>,
}

impl Record for Recommendation {
    fn columns() -> Vec<Column> {
        vec![
            Column::new("recommendation_id", ColumnKind::Integer),
            Column::new("title", ColumnKind::Text),
            Column::new("datestamp", ColumnKind::Timestamp),
        ]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.recommendation_id),
            Value::from(self.title.as_str()),
            Value::Text(self.datestamp.to_rfc3339()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_drops_list_columns() {
        let raw = RawTitle::with_lists("tm1", Some("['drama']"), Some("['US']"));
        let movie = Movie::from(&raw);
        let names: Vec<String> = Movie::columns().into_iter().map(|c| c.name).collect();

        assert_eq!(movie.id, "tm1");
        assert!(!names.iter().any(|n| n == "genres" || n == "production_countries"));
        assert_eq!(movie.values().len(), names.len());
    }

    #[test]
    fn test_entity_rows_keep_source_column_order() {
        let names: Vec<String> = Character::columns().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["character_name", "character_id"]);

        let genre = Genre::from_entry(3, "comedy");
        assert_eq!(genre.values(), vec![Value::from("comedy"), Value::Integer(3)]);
        assert_eq!(genre.id(), 3);
        assert_eq!(genre.label(), "comedy");
    }

    #[test]
    fn test_recommendation_schema() {
        let names: Vec<String> = Recommendation::columns()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["recommendation_id", "title", "datestamp"]);
    }
}
