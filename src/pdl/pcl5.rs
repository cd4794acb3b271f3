//! PCL5 job body parser
//!
//! Walks escape sequences, skipping binary payloads, to find page ejects and
//! the job and page settings that belong in print tickets.

use tracing::{debug, trace};

use super::{at_uel, BodyLanguage, BodyParser};
use crate::assembly::{non_empty, Document, DocumentAssembly, Page};
use crate::error::Result;
use crate::layout::{MediaSize, Orientation};
use crate::stream::PushbackStream;
use crate::ticket::{psk, PrintTicket, QName, TicketValue};

const ESC: u8 = 0x1b;
const FORM_FEED: u8 = 0x0c;

/// Parser for PCL5 bodies
#[derive(Debug, Default)]
pub struct Pcl5Parser;

impl Pcl5Parser {
    pub fn new() -> Self {
        Self
    }
}

impl BodyParser for Pcl5Parser {
    fn language(&self) -> BodyLanguage {
        BodyLanguage::Pcl5
    }

    fn parse(&self, stream: &mut PushbackStream) -> Result<DocumentAssembly> {
        let mut job = Pcl5Job::default();

        while let Some(byte) = stream.read_byte()? {
            match byte {
                ESC => {
                    stream.unread(&[ESC]);
                    if at_uel(stream)? {
                        break;
                    }
                    stream.read_byte()?;
                    job.escape(stream)?;
                }
                FORM_FEED => job.eject(),
                0x00..=0x1f | 0x7f => {}
                _ => job.marked = true,
            }
        }
        job.finish();

        Ok(job.into_assembly())
    }
}

/// One parsed `ESC <param> <group> <value> <terminator>` command
#[derive(Debug, Clone, Copy)]
struct Command {
    family: u8,
    group: u8,
    value: f64,
    terminator: u8,
}

impl Command {
    fn int(&self) -> i64 {
        self.value as i64
    }

    fn is(&self, family: u8, group: u8, terminator: u8) -> bool {
        self.family == family && self.group == group && self.terminator == terminator
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PageState {
    size: Option<MediaSize>,
    orientation: Orientation,
    source: Option<i64>,
}

#[derive(Debug, Default)]
struct Pcl5Job {
    pages: Vec<Page>,
    state: PageState,
    marked: bool,
    duplex: Option<i64>,
    copies: Option<i64>,
}

impl Pcl5Job {
    /// Parse the escape sequence following an ESC
    fn escape(&mut self, stream: &mut PushbackStream) -> Result<()> {
        let Some(first) = stream.read_byte()? else {
            return Ok(());
        };

        match first {
            0x21..=0x2f => self.parameterized(stream, first),
            b'E' => {
                self.eject_if_marked();
                self.state = PageState::default();
                Ok(())
            }
            0x30..=0x7e => Ok(()),
            _ => {
                stream.unread(&[first]);
                Ok(())
            }
        }
    }

    fn parameterized(&mut self, stream: &mut PushbackStream, family: u8) -> Result<()> {
        // The '%' family has no group character
        let group = if family == b'%' {
            0
        } else {
            match stream.read_byte()? {
                Some(g @ 0x60..=0x7e) => g,
                Some(other) => {
                    stream.unread(&[other]);
                    return Ok(());
                }
                None => return Ok(()),
            }
        };

        loop {
            let value = read_value(stream)?;
            let Some(terminator) = stream.read_byte()? else {
                return Ok(());
            };
            let last = match terminator {
                0x40..=0x5e => true,
                0x60..=0x7e => false,
                _ => {
                    stream.unread(&[terminator]);
                    return Ok(());
                }
            };
            let command = Command {
                family,
                group,
                value,
                terminator: terminator.to_ascii_uppercase(),
            };
            self.command(stream, command)?;
            if last {
                return Ok(());
            }
        }
    }

    fn command(&mut self, stream: &mut PushbackStream, cmd: Command) -> Result<()> {
        trace!(
            family = %(cmd.family as char),
            group = %(cmd.group as char),
            value = cmd.value,
            terminator = %(cmd.terminator as char),
            "PCL command"
        );

        if carries_data(&cmd) {
            let len = cmd.int().max(0) as u64;
            stream.skip(len)?;
            if marks_page(&cmd) {
                self.marked = true;
            }
            return Ok(());
        }
        if marks_page(&cmd) {
            self.marked = true;
            return Ok(());
        }

        if cmd.family != b'&' || cmd.group != b'l' {
            return Ok(());
        }
        match cmd.terminator {
            b'A' => {
                if let Some(size) = pcl_page_size(cmd.int()) {
                    self.eject_if_marked();
                    self.state.size = Some(size);
                }
            }
            b'O' => {
                if let Some(orientation) = Orientation::from_code(cmd.int()) {
                    self.eject_if_marked();
                    self.state.orientation = orientation;
                }
            }
            b'H' => match cmd.int() {
                0 => self.eject_if_marked(),
                source if source > 0 => self.state.source = Some(source),
                _ => {}
            },
            b'S' => {
                if (0..=2).contains(&cmd.int()) {
                    self.eject_if_marked();
                    self.duplex = Some(cmd.int());
                }
            }
            b'X' => {
                if cmd.int() > 0 {
                    self.copies = Some(cmd.int());
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn eject_if_marked(&mut self) {
        if self.marked {
            self.eject();
        }
    }

    fn eject(&mut self) {
        let size = self.state.size.unwrap_or(MediaSize::Letter);
        let mut dimensions = size.dimensions();
        if self.state.orientation.is_landscape() {
            dimensions = dimensions.rotated();
        }

        let mut ticket = PrintTicket::new();
        ticket.set_feature(psk::PAGE_MEDIA_SIZE, size.keyword());
        ticket.set_feature(psk::PAGE_ORIENTATION, self.state.orientation.keyword());
        if let Some(source) = self.state.source {
            ticket.set_feature(psk::PAGE_INPUT_BIN, paper_source(source));
        }

        debug!(page = self.pages.len() + 1, "PCL5 page eject");
        self.pages.push(Page {
            dimensions,
            ticket: Some(ticket),
        });
        self.marked = false;
    }

    fn finish(&mut self) {
        self.eject_if_marked();
    }

    fn into_assembly(self) -> DocumentAssembly {
        let mut ticket = PrintTicket::new();
        if let Some(duplex) = self.duplex {
            let option = match duplex {
                1 => psk::TWO_SIDED_LONG_EDGE,
                2 => psk::TWO_SIDED_SHORT_EDGE,
                _ => psk::ONE_SIDED,
            };
            ticket.set_feature(psk::JOB_DUPLEX, QName::psk(option));
        }
        if let Some(copies) = self.copies {
            let copies = i32::try_from(copies).unwrap_or(i32::MAX);
            ticket.set_parameter(psk::JOB_COPIES, TicketValue::Int32(copies));
        }

        DocumentAssembly {
            documents: vec![Document {
                pages: self.pages,
                ticket: None,
            }],
            ticket: non_empty(ticket),
        }
    }
}

/// Read an optional signed decimal value; absent means 0
fn read_value(stream: &mut PushbackStream) -> Result<f64> {
    let mut text = String::new();
    while let Some(b) = stream.read_byte()? {
        let accept = match b {
            b'+' | b'-' => text.is_empty(),
            b'0'..=b'9' => true,
            b'.' => !text.contains('.'),
            _ => false,
        };
        if !accept || text.len() >= 32 {
            stream.unread(&[b]);
            break;
        }
        text.push(b as char);
    }
    Ok(text.parse::<f64>().unwrap_or(0.0))
}

/// Commands followed by `value` bytes of binary data
fn carries_data(cmd: &Command) -> bool {
    match cmd.terminator {
        b'W' => cmd.family != b'%',
        b'V' => cmd.is(b'*', b'b', b'V'),
        b'X' => cmd.is(b'&', b'p', b'X'),
        _ => false,
    }
}

/// Commands that put marks on the page
fn marks_page(cmd: &Command) -> bool {
    cmd.is(b'*', b'b', b'W')
        || cmd.is(b'*', b'b', b'V')
        || cmd.is(b'&', b'p', b'X')
        || cmd.is(b'*', b'c', b'P')
}

/// `ESC&l#A` page size codes
fn pcl_page_size(code: i64) -> Option<MediaSize> {
    let size = match code {
        1 => MediaSize::Executive,
        2 => MediaSize::Letter,
        3 => MediaSize::Legal,
        6 => MediaSize::Ledger,
        25 => MediaSize::A5,
        26 => MediaSize::A4,
        27 => MediaSize::A3,
        45 => MediaSize::B5,
        80 => MediaSize::MonarchEnvelope,
        81 => MediaSize::Com10Envelope,
        90 => MediaSize::DlEnvelope,
        91 => MediaSize::C5Envelope,
        _ => return None,
    };
    Some(size)
}

/// `ESC&l#H` paper source codes
fn paper_source(code: i64) -> QName {
    match code {
        1 => QName::local("Upper"),
        2 => QName::psk("Manual"),
        3 => QName::local("ManualEnvelope"),
        4 => QName::local("Lower"),
        5 => QName::local("LargeCapacity"),
        6 => QName::psk("EnvelopeFeed"),
        7 => QName::psk("AutoSelect"),
        n => QName::local(format!("Source{n}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::TicketNode;
    use std::io::{Cursor, Read};

    fn parse(bytes: &[u8]) -> (DocumentAssembly, Vec<u8>) {
        let mut stream = PushbackStream::new(Cursor::new(bytes.to_vec()));
        let assembly = Pcl5Parser::new().parse(&mut stream).unwrap();
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        (assembly, rest)
    }

    fn option_of(ticket: &PrintTicket, feature: &str) -> Option<String> {
        ticket.feature_option(feature).map(|q| q.name().to_string())
    }

    #[test]
    fn test_pages_and_page_settings() {
        let (assembly, rest) = parse(b"\x1bE\x1b&l26a1OHello\x0c\x1b&l2A\x1b&l0OPage two\x1bE");
        assert!(rest.is_empty());
        assert_eq!(assembly.document_count(), 1);

        let pages = &assembly.documents[0].pages;
        assert_eq!(pages.len(), 2);

        let first = pages[0].ticket.as_ref().unwrap();
        assert_eq!(option_of(first, psk::PAGE_MEDIA_SIZE).as_deref(), Some("ISOA4"));
        assert_eq!(option_of(first, psk::PAGE_ORIENTATION).as_deref(), Some("Landscape"));
        assert!(pages[0].dimensions.width.mm() > pages[0].dimensions.height.mm());

        let second = pages[1].ticket.as_ref().unwrap();
        assert_eq!(
            option_of(second, psk::PAGE_MEDIA_SIZE).as_deref(),
            Some("NorthAmericaLetter")
        );
        assert_eq!(option_of(second, psk::PAGE_ORIENTATION).as_deref(), Some("Portrait"));
    }

    #[test]
    fn test_job_settings_form_assembly_ticket() {
        let (assembly, _) = parse(b"\x1bE\x1b&l2s3X\x1b&l4HText\x1bE");
        let ticket = assembly.ticket.as_ref().unwrap();
        assert_eq!(
            option_of(ticket, psk::JOB_DUPLEX).as_deref(),
            Some("TwoSidedShortEdge")
        );
        assert!(ticket.nodes().contains(&TicketNode::parameter(
            QName::psk(psk::JOB_COPIES),
            TicketValue::Int32(3)
        )));
        let page = assembly.documents[0].pages[0].ticket.as_ref().unwrap();
        assert_eq!(option_of(page, psk::PAGE_INPUT_BIN).as_deref(), Some("Lower"));
        assert!(assembly.documents[0].ticket.is_none());
    }

    #[test]
    fn test_stops_at_uel() {
        let (assembly, rest) = parse(b"Text\x0c\x1b%-12345X@PJL EOJ\r\n");
        assert_eq!(assembly.page_count(), 1);
        assert_eq!(rest, b"\x1b%-12345X@PJL EOJ\r\n");
    }

    #[test]
    fn test_binary_payload_is_skipped() {
        // The raster row contains a form feed and an ESC that must not be parsed
        let (assembly, _) = parse(b"\x1b*r1A\x1b*b4W\x0c\x1bE\x0c\x1b*rB\x0c");
        assert_eq!(assembly.page_count(), 1);
    }

    #[test]
    fn test_blank_job_has_no_pages() {
        let (assembly, _) = parse(b"\x1bE\x1b&l1X\x1bE");
        assert_eq!(assembly.document_count(), 1);
        assert_eq!(assembly.page_count(), 0);
        assert!(assembly.ticket.is_some());
    }
}
