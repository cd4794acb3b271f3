//! PDF output module

pub mod export;

// Re-export commonly used items
pub use export::{export_assembly, output_path_for};
