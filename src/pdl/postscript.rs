//! PostScript job body parser
//!
//! Reads Document Structuring Convention comments line by line. Feature
//! requests in the setup section describe the whole document; those inside a
//! page describe that page.

use tracing::debug;

use super::{at_uel, BodyLanguage, BodyParser};
use crate::assembly::{non_empty, Document, DocumentAssembly, Page};
use crate::error::Result;
use crate::layout::{MediaSize, PageDimensions};
use crate::stream::PushbackStream;
use crate::ticket::{psk, PrintTicket, QName, TicketValue};

const ESC: u8 = 0x1b;
const CTRL_D: u8 = 0x04;

/// Parser for PostScript bodies
#[derive(Debug, Default)]
pub struct PostScriptParser;

impl PostScriptParser {
    pub fn new() -> Self {
        Self
    }
}

impl BodyParser for PostScriptParser {
    fn language(&self) -> BodyLanguage {
        BodyLanguage::PostScript
    }

    fn parse(&self, stream: &mut PushbackStream) -> Result<DocumentAssembly> {
        let mut job = PsJob::default();

        loop {
            if at_uel(stream)? {
                break;
            }
            let Some(line) = read_line(stream)? else {
                break;
            };
            let line = String::from_utf8_lossy(&line);
            if !job.line(line.trim_end()) {
                break;
            }
        }

        Ok(job.into_assembly())
    }
}

/// Read one line, ending at CR, LF, CR LF, a mid-line ESC or Ctrl-D.
///
/// A Ctrl-D ends the job: it is returned as a line of its own.
fn read_line(stream: &mut PushbackStream) -> Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    loop {
        match stream.read_byte()? {
            None if line.is_empty() => return Ok(None),
            None => break,
            Some(b'\n') => break,
            Some(b'\r') => {
                if let Some(next) = stream.read_byte()? {
                    if next != b'\n' {
                        stream.unread(&[next]);
                    }
                }
                break;
            }
            // A UEL is caught before the line starts; any other ESC is data
            Some(ESC) if line.is_empty() => line.push(ESC),
            Some(ESC) => {
                stream.unread(&[ESC]);
                break;
            }
            Some(CTRL_D) => {
                if line.is_empty() {
                    line.push(CTRL_D);
                } else {
                    stream.unread(&[CTRL_D]);
                }
                break;
            }
            Some(b) => line.push(b),
        }
    }
    Ok(Some(line))
}

#[derive(Debug, Default)]
struct PsJob {
    assembly_ticket: PrintTicket,
    document_ticket: PrintTicket,
    pages: Vec<Page>,
    page_comments: bool,
    showpages: usize,
    document_media: Option<MediaSize>,
}

impl PsJob {
    /// Handle one line; false ends the job
    fn line(&mut self, line: &str) -> bool {
        if line.as_bytes() == [CTRL_D] || line.starts_with("%%EOF") {
            return false;
        }

        if let Some(title) = line.strip_prefix("%%Title:") {
            let title = title.trim().trim_start_matches('(').trim_end_matches(')');
            self.assembly_ticket
                .set_parameter(psk::JOB_NAME, TicketValue::String(title.to_string()));
        } else if line.starts_with("%%Page:") {
            self.page_comments = true;
            let dimensions = self
                .document_media
                .map(MediaSize::dimensions)
                .unwrap_or_default();
            self.pages.push(Page {
                dimensions,
                ticket: None,
            });
            debug!(page = self.pages.len(), "PostScript page");
        } else if let Some(feature) = line
            .strip_prefix("%%BeginFeature:")
            .or_else(|| line.strip_prefix("%%IncludeFeature:"))
        {
            self.feature(feature.trim());
        } else if !line.starts_with('%') {
            self.showpages += line
                .split(|c: char| c.is_whitespace() || "{}[]()<>/".contains(c))
                .filter(|token| *token == "showpage")
                .count();
        }
        true
    }

    /// `*Key Option` from a feature comment
    fn feature(&mut self, request: &str) {
        let mut parts = request.split_whitespace();
        let Some(key) = parts.next().map(|k| k.trim_start_matches('*')) else {
            return;
        };
        let option = parts.next().unwrap_or_default();
        if key.is_empty() {
            return;
        }

        let (name, choice) = match key {
            "Duplex" => {
                let choice = match option {
                    "DuplexNoTumble" => psk::TWO_SIDED_LONG_EDGE,
                    "DuplexTumble" => psk::TWO_SIDED_SHORT_EDGE,
                    _ => psk::ONE_SIDED,
                };
                (psk::JOB_DUPLEX.to_string(), QName::psk(choice))
            }
            "PageSize" | "PageRegion" => {
                let media = MediaSize::from_name(option);
                if let Some(size) = media {
                    match self.pages.last_mut() {
                        Some(page) => page.dimensions = size.dimensions(),
                        None => self.document_media = Some(size),
                    }
                }
                let choice = media
                    .map(MediaSize::keyword)
                    .unwrap_or_else(|| QName::local(option));
                (psk::PAGE_MEDIA_SIZE.to_string(), choice)
            }
            "InputSlot" => (psk::PAGE_INPUT_BIN.to_string(), QName::local(option)),
            other => (other.to_string(), QName::local(option)),
        };

        let ticket = match self.pages.last_mut() {
            Some(page) => page.ticket.get_or_insert_with(PrintTicket::new),
            None => &mut self.document_ticket,
        };
        ticket.set_feature(&name, choice);
    }

    fn into_assembly(mut self) -> DocumentAssembly {
        if !self.page_comments {
            let dimensions = self
                .document_media
                .map(MediaSize::dimensions)
                .unwrap_or_else(PageDimensions::default);
            self.pages = (0..self.showpages)
                .map(|_| Page {
                    dimensions,
                    ticket: None,
                })
                .collect();
        }

        DocumentAssembly {
            documents: vec![Document {
                pages: self.pages,
                ticket: non_empty(self.document_ticket),
            }],
            ticket: non_empty(self.assembly_ticket),
        }
    }
}
