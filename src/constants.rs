/// Table names shared by the assembler, the storage sinks and the
/// administrative commands. Downstream SQL depends on these exact names.

pub const MOVIES: &str = "movies";
pub const GENRES: &str = "genres";
pub const COUNTRIES: &str = "countries";
pub const MOVIE_GENRES: &str = "movie_genres";
pub const MOVIE_COUNTRIES: &str = "movie_countries";
pub const CREDITS: &str = "credits";
pub const CHARACTERS: &str = "characters";
pub const RECOMMENDATIONS: &str = "recommendations";

// Passthrough table the recommender draws from, and its title column
pub const BEST_MOVIES: &str = "best_movies";
pub const BEST_MOVIES_TITLE_COLUMN: &str = "TITLE";

// Source identities used in diagnostics
pub const TITLES_SOURCE: &str = "titles";
pub const CREDITS_SOURCE: &str = "credits";

/// Output order of the normalized tables in every bundle
pub fn core_tables() -> [&'static str; 8] {
    [
        MOVIES,
        GENRES,
        COUNTRIES,
        MOVIE_GENRES,
        MOVIE_COUNTRIES,
        CREDITS,
        CHARACTERS,
        RECOMMENDATIONS,
    ]
}

