// Pipeline processing: list parsing, entity extraction, junction building,
// integrity filtering and table assembly

pub mod assemble;
pub mod entities;
pub mod integrity;
pub mod junction;
pub mod list_field;
pub mod normalize;
pub mod report;

pub use assemble::NormalizedCatalog;
pub use normalize::{NormalizeOptions, Normalizer, RawDataset};
pub use report::{Issue, IssueCategory, IssueKind, NormalizeReport};
