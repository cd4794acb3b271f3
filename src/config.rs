//! Run options for the report driver

use std::path::PathBuf;

/// Default name of the PDF output directory, created beside the inputs
pub const DEFAULT_PDF_DIR: &str = "PDF";

/// Options for one run over an input directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Directory whose regular files are processed (non-recursive)
    pub directory: PathBuf,
    /// Write each parsed assembly as a PDF
    pub convert: bool,
    /// Name of the output directory under `directory`
    pub pdf_dir_name: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            convert: false,
            pdf_dir_name: DEFAULT_PDF_DIR.to_string(),
        }
    }
}

impl RunOptions {
    /// Options for `directory` with everything else defaulted
    pub fn for_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }
}
