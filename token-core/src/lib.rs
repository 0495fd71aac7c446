pub mod error;
pub mod types;

pub use error::SeriesError;
pub use types::*;
