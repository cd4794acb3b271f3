//! PJL prologue handling

pub mod attributes;
pub mod duplex;
pub mod scanner;

pub use attributes::{AttributeStore, PjlAttribute};
pub use duplex::{duplex_mode, DuplexMode};
pub use scanner::PjlScanner;

use crate::pdl::BodyLanguage;

/// What the scanner found at the end of a prologue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrologueEvent {
    EnterPcl5,
    EnterPclXl,
    EnterPostScript,
    /// End of stream reached inside a PJL prologue
    EndOfFile,
    /// No PJL remains in the stream (library code 124)
    Exhausted,
}

impl PrologueEvent {
    /// Body language entered by this event
    pub fn language(self) -> Option<BodyLanguage> {
        match self {
            PrologueEvent::EnterPcl5 => Some(BodyLanguage::Pcl5),
            PrologueEvent::EnterPclXl => Some(BodyLanguage::PclXl),
            PrologueEvent::EnterPostScript => Some(BodyLanguage::PostScript),
            PrologueEvent::EndOfFile | PrologueEvent::Exhausted => None,
        }
    }

    /// True when no further prologue can follow
    pub fn is_terminal(self) -> bool {
        matches!(self, PrologueEvent::EndOfFile | PrologueEvent::Exhausted)
    }
}
