//! PJL prologue scanner
//!
//! Reads `@PJL` command lines and Universal Exit Language separators from a
//! [`PushbackStream`] until the prologue hands over to a body language, runs
//! out, or turns out not to be PJL at all.

use tracing::{debug, warn};

use super::{AttributeStore, PjlAttribute, PrologueEvent};
use crate::error::Result;
use crate::stream::PushbackStream;

const ESC: u8 = 0x1b;

/// PostScript end-of-job, often left between jobs
const CTRL_D: u8 = 0x04;

/// Universal Exit Language tail, following ESC
const UEL_TAIL: &[u8] = b"%-12345X";

/// Longest PJL line kept; the rest of a longer line is read and dropped
const MAX_LINE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Start of a prologue, no PJL line seen yet
    Initial,
    /// At least one PJL line seen; body bytes may be sniffed
    InPrologue,
    /// Terminal; every further scan reports `Exhausted`
    Exhausted,
}

/// Result of classifying one PJL line
enum Line {
    Command,
    Enter(PrologueEvent),
    Malformed,
}

/// Scanner over one input stream's PJL prologues
#[derive(Debug)]
pub struct PjlScanner {
    state: ScanState,
    attributes: AttributeStore,
}

impl Default for PjlScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PjlScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Initial,
            attributes: AttributeStore::new(),
        }
    }

    /// Scan the next prologue.
    ///
    /// Attributes from the previous prologue are discarded first. On an
    /// `Enter*` event the stream is left at the first body byte.
    pub fn scan(&mut self, stream: &mut PushbackStream) -> Result<PrologueEvent> {
        self.attributes.clear();
        if self.state == ScanState::Exhausted {
            return Ok(PrologueEvent::Exhausted);
        }
        self.state = ScanState::Initial;

        let event = self.scan_prologue(stream)?;
        if event.is_terminal() {
            self.state = ScanState::Exhausted;
        } else {
            self.state = ScanState::Initial;
        }
        debug!(
            event = ?event,
            attributes = self.attributes.len(),
            position = stream.position(),
            "PJL scan finished"
        );
        Ok(event)
    }

    /// Attributes of the current prologue matching `(verb, key)`, in encounter order
    pub fn get_attributes(&self, verb: &str, key: &str) -> Vec<&PjlAttribute> {
        self.attributes.get(verb, key)
    }

    /// All attributes of the current prologue
    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    fn scan_prologue(&mut self, stream: &mut PushbackStream) -> Result<PrologueEvent> {
        loop {
            let byte = match stream.read_byte()? {
                Some(b) => b,
                None => {
                    return Ok(if self.state == ScanState::InPrologue {
                        PrologueEvent::EndOfFile
                    } else {
                        PrologueEvent::Exhausted
                    });
                }
            };

            match byte {
                b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0c | CTRL_D => continue,
                ESC => {
                    if self.match_uel(stream)? {
                        continue;
                    }
                    stream.unread(&[ESC]);
                    return self.body_or_exhausted(stream);
                }
                b'@' => {
                    let (line, complete) = read_line(stream)?;
                    let kind = if complete {
                        self.classify_line(&line)
                    } else if has_pjl_prefix(&line) {
                        warn!(kept = line.len(), "over-long PJL line ignored");
                        Line::Command
                    } else {
                        Line::Malformed
                    };
                    match kind {
                        Line::Command => self.state = ScanState::InPrologue,
                        Line::Enter(event) => {
                            self.state = ScanState::InPrologue;
                            return Ok(event);
                        }
                        Line::Malformed => {
                            warn!(line = %String::from_utf8_lossy(&line), "malformed PJL line");
                            return Ok(PrologueEvent::Exhausted);
                        }
                    }
                }
                other => {
                    stream.unread(&[other]);
                    return self.body_or_exhausted(stream);
                }
            }
        }
    }

    /// After ESC: consume the rest of a UEL, or push back what was read
    fn match_uel(&self, stream: &mut PushbackStream) -> Result<bool> {
        let mut read = Vec::with_capacity(UEL_TAIL.len());
        for &expected in UEL_TAIL {
            match stream.read_byte()? {
                Some(b) if b == expected => read.push(b),
                Some(b) => {
                    read.push(b);
                    stream.unread(&read);
                    return Ok(false);
                }
                None => {
                    stream.unread(&read);
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Non-PJL bytes: a body language if a prologue preceded them
    fn body_or_exhausted(&self, stream: &mut PushbackStream) -> Result<PrologueEvent> {
        if self.state != ScanState::InPrologue {
            return Ok(PrologueEvent::Exhausted);
        }
        let event = sniff_language(stream)?;
        if event == PrologueEvent::Exhausted {
            warn!(position = stream.position(), "unrecognised bytes in PJL prologue");
        }
        Ok(event)
    }

    fn classify_line(&mut self, line: &[u8]) -> Line {
        let text = String::from_utf8_lossy(line);
        let text = text.trim_end_matches(['\r', '\n']);
        if !has_pjl_prefix(text.as_bytes()) {
            return Line::Malformed;
        }
        let body = text[3..].trim();
        if body.is_empty() {
            return Line::Command;
        }

        let (verb, rest) = match body.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (body, ""),
        };

        // A verb glued to its key by '=' is not PJL
        if verb.contains('=') {
            return Line::Malformed;
        }

        let Some((key, value)) = rest.split_once('=') else {
            return Line::Command;
        };
        let key = key.split_whitespace().collect::<Vec<_>>().join(" ");
        let value = value.trim();

        if verb.eq_ignore_ascii_case("ENTER") {
            if !key.eq_ignore_ascii_case("LANGUAGE") {
                return Line::Malformed;
            }
            return match value.to_ascii_lowercase().as_str() {
                "pcl" => Line::Enter(PrologueEvent::EnterPcl5),
                "pclxl" => Line::Enter(PrologueEvent::EnterPclXl),
                "postscript" => Line::Enter(PrologueEvent::EnterPostScript),
                _ => Line::Malformed,
            };
        }

        self.attributes.push(verb, &key, value);
        Line::Command
    }
}

/// Read the rest of a line after '@', stopping before an ESC.
///
/// At most `MAX_LINE` bytes are kept; the flag is false when more were
/// read and dropped.
fn read_line(stream: &mut PushbackStream) -> Result<(Vec<u8>, bool)> {
    let mut line = Vec::new();
    let mut complete = true;
    while let Some(b) = stream.read_byte()? {
        match b {
            b'\n' => break,
            ESC => {
                stream.unread(&[ESC]);
                break;
            }
            _ if line.len() < MAX_LINE => line.push(b),
            _ => complete = false,
        }
    }
    Ok((line, complete))
}

/// `PJL` followed by whitespace or nothing
fn has_pjl_prefix(line: &[u8]) -> bool {
    match line.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case(b"PJL") => {
            matches!(line.get(3), None | Some(b' ' | b'\t' | b'\r'))
        }
        _ => false,
    }
}

/// Detect a body language from its first bytes without consuming them
fn sniff_language(stream: &mut PushbackStream) -> Result<PrologueEvent> {
    const XL_TAIL: &[u8] = b" HP-PCL XL";

    let mut head = Vec::with_capacity(1 + XL_TAIL.len());
    while head.len() < 1 + XL_TAIL.len() {
        match stream.read_byte()? {
            Some(b) => head.push(b),
            None => break,
        }
    }
    stream.unread(&head);

    let event = match head.as_slice() {
        [ESC, ..] => PrologueEvent::EnterPcl5,
        [b'(' | b')', tail @ ..] if tail == XL_TAIL => PrologueEvent::EnterPclXl,
        [b'%', b'!', ..] => PrologueEvent::EnterPostScript,
        _ => PrologueEvent::Exhausted,
    };
    Ok(event)
}
