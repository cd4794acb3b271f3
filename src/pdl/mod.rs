//! Body parsers and the selector that hands them the stream
//!
//! Every parser runs unencapsulated: it never reads PJL itself and never
//! opens the stream. It reads from the stream it is lent until the job body
//! ends, leaving any Universal Exit Language in place for the PJL scanner.

pub mod pcl5;
pub mod pclxl;
pub mod postscript;

use std::fmt;
use std::io;

use tracing::info;

use crate::assembly::DocumentAssembly;
use crate::error::{Error, Result};
use crate::pjl::PrologueEvent;
use crate::stream::PushbackStream;

pub use pcl5::Pcl5Parser;
pub use pclxl::PclXlParser;
pub use postscript::PostScriptParser;

/// Universal Exit Language
pub(crate) const UEL: &[u8] = b"\x1b%-12345X";

/// Page description languages a PJL prologue can enter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyLanguage {
    Pcl5,
    PclXl,
    PostScript,
}

impl fmt::Display for BodyLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyLanguage::Pcl5 => write!(f, "PCL5"),
            BodyLanguage::PclXl => write!(f, "PCL/XL"),
            BodyLanguage::PostScript => write!(f, "PostScript"),
        }
    }
}

/// A page description language parser
pub trait BodyParser {
    fn language(&self) -> BodyLanguage;

    /// Parse one job body starting at the stream head
    fn parse(&self, stream: &mut PushbackStream) -> Result<DocumentAssembly>;
}

/// Maps prologue events to body parsers
pub struct ParserSelector {
    parsers: Vec<Box<dyn BodyParser>>,
}

impl Default for ParserSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserSelector {
    /// Selector with no parsers registered
    pub fn new() -> Self {
        Self { parsers: Vec::new() }
    }

    /// Selector with the PCL5, PCL/XL and PostScript parsers
    pub fn with_builtin_parsers() -> Self {
        let mut selector = Self::new();
        selector.register(Box::new(Pcl5Parser::new()));
        selector.register(Box::new(PclXlParser::new()));
        selector.register(Box::new(PostScriptParser::new()));
        selector
    }

    /// Register a parser, replacing any parser for the same language
    pub fn register(&mut self, parser: Box<dyn BodyParser>) {
        let language = parser.language();
        self.parsers.retain(|p| p.language() != language);
        self.parsers.push(parser);
    }

    pub fn parser_for(&self, language: BodyLanguage) -> Option<&dyn BodyParser> {
        self.parsers
            .iter()
            .find(|p| p.language() == language)
            .map(|p| p.as_ref())
    }

    /// Dispatch an `Enter*` event to its parser on the same stream.
    ///
    /// An empty body yields `PrologueExhausted`, which ends the file cleanly.
    pub fn parse_body(
        &self,
        event: PrologueEvent,
        stream: &mut PushbackStream,
    ) -> Result<DocumentAssembly> {
        let parser = event
            .language()
            .and_then(|language| self.parser_for(language))
            .ok_or(Error::UnexpectedPrologueEvent(event))?;

        if stream.is_at_eof()? {
            return Err(Error::PrologueExhausted);
        }

        let start = stream.position();
        let assembly = parser.parse(stream)?;
        info!(
            language = %parser.language(),
            documents = assembly.document_count(),
            pages = assembly.page_count(),
            bytes = stream.position() - start,
            "parsed job body"
        );
        Ok(assembly)
    }
}

/// True if the stream head is a UEL; nothing is consumed
pub(crate) fn at_uel(stream: &mut PushbackStream) -> io::Result<bool> {
    let mut head = Vec::with_capacity(UEL.len());
    while head.len() < UEL.len() {
        match stream.read_byte()? {
            Some(b) => {
                head.push(b);
                if UEL[..head.len()] != head[..] {
                    break;
                }
            }
            None => break,
        }
    }
    stream.unread(&head);
    Ok(head == UEL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stream(bytes: &[u8]) -> PushbackStream {
        PushbackStream::new(Cursor::new(bytes.to_vec()))
    }

    struct FixedParser(BodyLanguage, usize);

    impl BodyParser for FixedParser {
        fn language(&self) -> BodyLanguage {
            self.0
        }

        fn parse(&self, stream: &mut PushbackStream) -> Result<DocumentAssembly> {
            stream.skip(self.1 as u64)?;
            Ok(DocumentAssembly::default())
        }
    }

    #[test]
    fn test_at_uel_does_not_consume() {
        let mut s = stream(b"\x1b%-12345X@PJL");
        assert!(at_uel(&mut s).unwrap());
        assert_eq!(s.read_vec(UEL.len()).unwrap(), UEL);

        let mut s = stream(b"\x1b%-1X");
        assert!(!at_uel(&mut s).unwrap());
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn test_dispatch_reads_same_stream() {
        let mut selector = ParserSelector::new();
        selector.register(Box::new(FixedParser(BodyLanguage::PostScript, 3)));
        let mut s = stream(b"abcdef");
        selector
            .parse_body(PrologueEvent::EnterPostScript, &mut s)
            .unwrap();
        assert_eq!(s.position(), 3);
    }

    #[test]
    fn test_register_replaces_language() {
        let mut selector = ParserSelector::with_builtin_parsers();
        selector.register(Box::new(FixedParser(BodyLanguage::Pcl5, 0)));
        assert_eq!(selector.parsers.len(), 3);
        assert!(selector.parser_for(BodyLanguage::Pcl5).is_some());
    }

    #[test]
    fn test_non_enter_event_is_rejected() {
        let selector = ParserSelector::with_builtin_parsers();
        let mut s = stream(b"x");
        let err = selector
            .parse_body(PrologueEvent::EndOfFile, &mut s)
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedPrologueEvent(PrologueEvent::EndOfFile)));
    }

    #[test]
    fn test_empty_body_is_prologue_exhausted() {
        let selector = ParserSelector::with_builtin_parsers();
        let mut s = stream(b"");
        let err = selector
            .parse_body(PrologueEvent::EnterPcl5, &mut s)
            .unwrap_err();
        assert!(err.is_prologue_exhausted());
    }
}
