pub mod types;
pub mod export;

pub use types::{Cell, Row, ResultsTable};
