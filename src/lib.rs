//! PJL Ticket Report Library
//!
//! Reads print files wrapped in PJL job prologues and reports what each job
//! asks the printer to do. This library provides functionality to:
//! - Scan PJL prologues and collect their `@PJL` attributes
//! - Hand each job body to a PCL5, PCL/XL or PostScript parser
//! - Report the assembly, document and page print tickets of a job
//! - Export parsed jobs as PDF files
//!
//! # Example
//!
//! ```no_run
//! use pjl_ticket_report::config::RunOptions;
//! use pjl_ticket_report::driver::{process_directory, Engine};
//!
//! let mut engine = Engine::new();
//! engine.enable_all_features();
//!
//! let options = RunOptions::for_directory("jobs");
//! let mut out = std::io::stdout();
//! process_directory(&engine, &options, &mut out).expect("Failed to process jobs");
//! ```

pub mod assembly;
pub mod config;
pub mod driver;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod pdl;
pub mod pjl;
pub mod report;
pub mod stream;
pub mod ticket;

// Re-export commonly used items
pub use error::{Error, Result};
