pub mod errors;
pub mod model;
mod normalize;
pub mod schema;

pub use errors::NormalizeError;
pub use model::{CleanTable, GroupRecord, RawGrid, ViewKind};
pub use normalize::{normalize, normalize_with_key};
