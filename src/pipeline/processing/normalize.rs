//! Normalization of raw titles and credits into entity and junction tables.

use std::collections::HashSet;
use tracing::{debug, info, info_span};

use super::assemble::NormalizedCatalog;
use super::entities::EntityCatalog;
use super::integrity::{dedup_rows, drop_unresolved, retain_known_movies};
use super::junction::{fan_out, resolve, CreditContext};
use super::list_field::ListFieldMode;
use super::report::{Issue, IssueKind, NormalizeReport};
use crate::constants::{
    CHARACTERS, COUNTRIES, CREDITS, GENRES, MOVIES, MOVIE_COUNTRIES, MOVIE_GENRES, RECOMMENDATIONS,
};
use crate::domain::{
    Character, Country, Credit, Genre, Movie, MovieCountry, MovieGenre, RawCredit, RawTitle,
    Table, TableData,
};

/// Everything the raw source hands to the normalizer
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    pub titles: Vec<RawTitle>,
    pub credits: Vec<RawCredit>,
    /// Tables copied into the bundle untransformed
    pub passthrough: Vec<TableData>,
    /// Problems met while reading the source files
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Drop junction rows whose movie id is not in `movies`
    pub enforce_movie_refs: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            enforce_movie_refs: true,
        }
    }
}

/// Tables derived from the titles source
#[derive(Debug, Clone)]
pub struct TitleTables {
    pub movies: Table<Movie>,
    pub genres: Table<Genre>,
    pub countries: Table<Country>,
    pub movie_genres: Table<MovieGenre>,
    pub movie_countries: Table<MovieCountry>,
}

/// Tables derived from the credits source
#[derive(Debug, Clone)]
pub struct CreditTables {
    pub credits: Table<Credit>,
    pub characters: Table<Character>,
}

/// A title with its list fields parsed once, shared by extraction and fan-out
struct ParsedTitle<'a> {
    raw: &'a RawTitle,
    genres: Vec<String>,
    countries: Vec<String>,
}

/// Single-pass, in-memory normalizer
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> NormalizeOptions {
        self.options
    }

    /// Run every stage over a loaded dataset
    pub fn normalize(&self, dataset: RawDataset) -> NormalizedCatalog {
        let mut report = NormalizeReport::new();
        for issue in dataset.issues {
            report.record(issue);
        }

        let titles = self.normalize_titles(&dataset.titles, &mut report);
        let mut credits = self.normalize_credits(&dataset.credits, &mut report);

        let mut movie_genres = titles.movie_genres;
        let mut movie_countries = titles.movie_countries;

        if self.options.enforce_movie_refs {
            let _span = info_span!("movie_refs").entered();
            let known: HashSet<String> = titles.movies.iter().map(|m| m.id.clone()).collect();

            movie_genres = Table::new(
                MOVIE_GENRES,
                retain_known_movies(
                    MOVIE_GENRES,
                    movie_genres.into_rows(),
                    &known,
                    |r| r.movie_id.as_str(),
                    &mut report,
                ),
            );
            movie_countries = Table::new(
                MOVIE_COUNTRIES,
                retain_known_movies(
                    MOVIE_COUNTRIES,
                    movie_countries.into_rows(),
                    &known,
                    |r| r.movie_id.as_str(),
                    &mut report,
                ),
            );
            credits.credits = Table::new(
                CREDITS,
                retain_known_movies(
                    CREDITS,
                    credits.credits.into_rows(),
                    &known,
                    |r| r.movie_id.as_str(),
                    &mut report,
                ),
            );
        }

        info!(
            movies = titles.movies.len(),
            genres = titles.genres.len(),
            countries = titles.countries.len(),
            characters = credits.characters.len(),
            credits = credits.credits.len(),
            issues = report.issues().len(),
            "Normalization finished"
        );

        NormalizedCatalog {
            movies: titles.movies,
            genres: titles.genres,
            countries: titles.countries,
            movie_genres,
            movie_countries,
            credits: credits.credits,
            characters: credits.characters,
            recommendations: Table::empty(RECOMMENDATIONS),
            passthrough: dataset.passthrough,
            report,
        }
    }

    /// Movies, genres, countries and their junctions
    pub fn normalize_titles(&self, titles: &[RawTitle], report: &mut NormalizeReport) -> TitleTables {
        let _span = info_span!("normalize_titles", rows = titles.len()).entered();

        let parsed: Vec<ParsedTitle<'_>> = titles
            .iter()
            .filter_map(|raw| {
                if raw.id.trim().is_empty() {
                    report.record(Issue::new(
                        IssueKind::MissingKey,
                        MOVIES,
                        raw.title.as_deref().unwrap_or("<untitled>"),
                        "id",
                        "title row has no id",
                    ));
                    return None;
                }
                Some(ParsedTitle {
                    raw,
                    genres: parse_list(ListFieldMode::BracketList, raw.genres.as_deref(), MOVIES, &raw.id, "genres", report),
                    countries: parse_list(
                        ListFieldMode::BracketList,
                        raw.production_countries.as_deref(),
                        MOVIES,
                        &raw.id,
                        "production_countries",
                        report,
                    ),
                })
            })
            .collect();

        let genres = EntityCatalog::extract(parsed.iter().flat_map(|t| t.genres.iter()));
        let countries = EntityCatalog::extract(parsed.iter().flat_map(|t| t.countries.iter()));
        debug!(genres = genres.len(), countries = countries.len(), "Extracted title entities");

        let genre_links = parsed
            .iter()
            .flat_map(|t| fan_out(t.raw.id.clone(), t.genres.iter().cloned()));
        let movie_genres = drop_unresolved(
            MOVIE_GENRES,
            "genres",
            resolve(genre_links, &genres),
            String::clone,
            |movie_id, genre_id| MovieGenre { movie_id, genre_id },
            report,
        );

        let country_links = parsed
            .iter()
            .flat_map(|t| fan_out(t.raw.id.clone(), t.countries.iter().cloned()));
        let movie_countries = drop_unresolved(
            MOVIE_COUNTRIES,
            "production_countries",
            resolve(country_links, &countries),
            String::clone,
            |movie_id, country_id| MovieCountry {
                movie_id,
                country_id,
            },
            report,
        );

        let movies: Vec<Movie> = parsed.iter().map(|t| Movie::from(t.raw)).collect();

        TitleTables {
            movies: Table::new(MOVIES, dedup_rows(MOVIES, movies, report)),
            genres: genres.to_table(GENRES),
            countries: countries.to_table(COUNTRIES),
            movie_genres: Table::new(MOVIE_GENRES, dedup_rows(MOVIE_GENRES, movie_genres, report)),
            movie_countries: Table::new(
                MOVIE_COUNTRIES,
                dedup_rows(MOVIE_COUNTRIES, movie_countries, report),
            ),
        }
    }

    /// Characters and the credit junction
    pub fn normalize_credits(&self, credits: &[RawCredit], report: &mut NormalizeReport) -> CreditTables {
        let _span = info_span!("normalize_credits", rows = credits.len()).entered();

        let parsed: Vec<(CreditContext, Vec<String>)> = credits
            .iter()
            .filter_map(|raw| {
                let context = CreditContext::from(raw);
                if raw.movie_id.trim().is_empty() {
                    report.record(Issue::new(
                        IssueKind::MissingKey,
                        CREDITS,
                        context.describe(),
                        "id",
                        "credit row has no movie id",
                    ));
                    return None;
                }
                let characters = parse_list(
                    ListFieldMode::Separator,
                    raw.character.as_deref(),
                    CREDITS,
                    &context.describe(),
                    "character",
                    report,
                );
                Some((context, characters))
            })
            .collect();

        let characters = EntityCatalog::extract(parsed.iter().flat_map(|(_, names)| names.iter()));
        debug!(characters = characters.len(), "Extracted characters");

        let links = parsed
            .into_iter()
            .flat_map(|(context, names)| fan_out(context, names));
        let rows = drop_unresolved(
            CREDITS,
            "character",
            resolve(links, &characters),
            CreditContext::describe,
            |context, character_id| Credit {
                person_id: context.person_id,
                movie_id: context.movie_id,
                name: context.name,
                role: context.role,
                character_id,
            },
            report,
        );

        CreditTables {
            credits: Table::new(CREDITS, dedup_rows(CREDITS, rows, report)),
            characters: characters.to_table(CHARACTERS),
        }
    }
}

/// Parse a list field, recovering from malformed input as an empty list.
/// Blank elements name no entity and are left out before extraction and
/// fan-out.
fn parse_list(
    mode: ListFieldMode,
    raw: Option<&str>,
    table: &str,
    row: &str,
    field: &str,
    report: &mut NormalizeReport,
) -> Vec<String> {
    match mode.parse(raw) {
        Ok(items) => items.into_iter().filter(|item| !item.is_empty()).collect(),
        Err(e) => {
            report.record(Issue::new(IssueKind::MalformedList, table, row, field, e.to_string()));
            Vec::new()
        }
    }
}
