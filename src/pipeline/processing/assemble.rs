use tracing::debug;

use super::report::NormalizeReport;
use crate::domain::{
    Character, Country, Credit, Genre, Movie, MovieCountry, MovieGenre, Recommendation, Table,
    TableBundle, TableData,
};
use crate::error::Result;

/// Every table one normalization run produces, plus the run's report
#[derive(Debug, Clone)]
pub struct NormalizedCatalog {
    pub movies: Table<Movie>,
    pub genres: Table<Genre>,
    pub countries: Table<Country>,
    pub movie_genres: Table<MovieGenre>,
    pub movie_countries: Table<MovieCountry>,
    pub credits: Table<Credit>,
    pub characters: Table<Character>,
    /// Always empty after normalization; rows come from the recommender
    pub recommendations: Table<Recommendation>,
    /// Source tables carried through untransformed
    pub passthrough: Vec<TableData>,
    pub report: NormalizeReport,
}

impl NormalizedCatalog {
    /// Erase row types into the bundle handed to a sink.
    ///
    /// Normalized tables come first in their fixed order, followed by the
    /// passthrough tables in load order. A passthrough table reusing a
    /// normalized table name is an error.
    pub fn to_bundle(&self) -> Result<TableBundle> {
        let mut bundle = TableBundle::new();

        bundle.insert(self.movies.to_data())?;
        bundle.insert(self.genres.to_data())?;
        bundle.insert(self.countries.to_data())?;
        bundle.insert(self.movie_genres.to_data())?;
        bundle.insert(self.movie_countries.to_data())?;
        bundle.insert(self.credits.to_data())?;
        bundle.insert(self.characters.to_data())?;
        bundle.insert(self.recommendations.to_data())?;

        for table in &self.passthrough {
            bundle.insert(table.clone())?;
        }

        debug!(tables = bundle.len(), "Assembled output bundle");
        Ok(bundle)
    }

    pub fn report(&self) -> &NormalizeReport {
        &self.report
    }
}
