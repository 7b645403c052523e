//! Typed rows and the table containers that carry them to storage.

pub mod records;
pub mod table;

pub use records::{
    Character, Country, Credit, EntityRow, Genre, Movie, MovieCountry, MovieGenre, RawCredit,
    RawTitle, Recommendation,
};
pub use table::{Column, ColumnKind, Record, Table, TableBundle, TableData, Value};
