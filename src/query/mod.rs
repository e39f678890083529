pub mod filter;
pub mod operations;

// Re-export main types and functions for easier access
pub use filter::{SelectionFilter, CompiledFilter};
pub use operations::{StatsQuery, FIXED_COLUMNS, column_name};
