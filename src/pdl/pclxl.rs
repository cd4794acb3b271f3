//! PCL/XL job body parser
//!
//! PCL/XL is a binary stream of tagged values, attribute ids and operators.
//! Values precede the attribute id that names them; an operator consumes the
//! attribute list built since the previous operator. Only the session and
//! page operators matter for print tickets, everything else is skipped.

use std::collections::HashMap;
use std::io;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use tracing::{debug, trace};

use super::{at_uel, BodyLanguage, BodyParser};
use crate::assembly::{non_empty, Document, DocumentAssembly, Page};
use crate::error::{Error, Result};
use crate::layout::{MediaSize, Orientation, PageDimensions};
use crate::stream::PushbackStream;
use crate::ticket::{psk, PrintTicket, QName, TicketValue};

const ESC: u8 = 0x1b;
const MAX_HEADER: usize = 512;

// Operators
const BEGIN_SESSION: u8 = 0x41;
const END_SESSION: u8 = 0x42;
const BEGIN_PAGE: u8 = 0x43;
const END_PAGE: u8 = 0x44;

// Attribute ids
const MEDIA_SIZE: u16 = 37;
const MEDIA_SOURCE: u16 = 38;
const MEDIA_TYPE: u16 = 39;
const ORIENTATION: u16 = 40;
const PAGE_COPIES: u16 = 49;
const SIMPLEX_PAGE_MODE: u16 = 52;
const DUPLEX_PAGE_MODE: u16 = 53;

/// Parser for PCL/XL bodies
#[derive(Debug, Default)]
pub struct PclXlParser;

impl PclXlParser {
    pub fn new() -> Self {
        Self
    }
}

impl BodyParser for PclXlParser {
    fn language(&self) -> BodyLanguage {
        BodyLanguage::PclXl
    }

    fn parse(&self, stream: &mut PushbackStream) -> Result<DocumentAssembly> {
        let big_endian = read_stream_header(stream)?;
        let mut reader = XlReader { stream, big_endian };
        let mut job = XlJob::default();
        let mut attributes: HashMap<u16, XlValue> = HashMap::new();
        let mut pending: Option<XlValue> = None;

        while let Some(tag) = reader.stream.read_byte()? {
            match tag {
                0x00 | 0x09..=0x0d | 0x20 => {}
                ESC => {
                    reader.stream.unread(&[ESC]);
                    if at_uel(reader.stream)? {
                        break;
                    }
                    return Err(reader.undefined(ESC));
                }
                0xc0..=0xc5 => pending = Some(reader.scalar(tag)?),
                0xc8..=0xcd => pending = Some(reader.array(tag)?),
                0xd0..=0xd5 | 0xe0..=0xe5 => {
                    reader.stream.skip(point_or_box_len(tag))?;
                    pending = Some(XlValue::Other);
                }
                0xf8 => {
                    let id = u16::from(reader.stream.read_u8()?);
                    attributes.insert(id, pending.take().unwrap_or(XlValue::Other));
                }
                0xf9 => {
                    let id = reader.u16()?;
                    attributes.insert(id, pending.take().unwrap_or(XlValue::Other));
                }
                0xfa => {
                    let len = reader.u32()?;
                    reader.stream.skip(u64::from(len))?;
                }
                0xfb => {
                    let len = reader.stream.read_u8()?;
                    reader.stream.skip(u64::from(len))?;
                }
                0x41..=0xbf => {
                    trace!(operator = tag, attributes = attributes.len(), "PCL/XL operator");
                    job.operator(tag, &attributes);
                    attributes.clear();
                    pending = None;
                }
                other => return Err(reader.undefined(other)),
            }
        }

        Ok(job.into_assembly())
    }
}

/// Read the stream header line; returns true for big-endian binding
fn read_stream_header(stream: &mut PushbackStream) -> Result<bool> {
    let big_endian = match stream.read_byte()? {
        Some(b'(') => true,
        Some(b')') => false,
        Some(b'\'') => {
            return Err(Error::syntax(
                BodyLanguage::PclXl,
                "ASCII stream binding is not supported",
            ))
        }
        _ => return Err(Error::syntax(BodyLanguage::PclXl, "missing stream header")),
    };

    let mut header = Vec::new();
    loop {
        match stream.read_byte()? {
            Some(b'\n') => break,
            Some(b) if header.len() < MAX_HEADER => header.push(b),
            _ => return Err(Error::syntax(BodyLanguage::PclXl, "unterminated stream header")),
        }
    }
    let header = String::from_utf8_lossy(&header);
    if !header.contains("HP-PCL XL") {
        return Err(Error::syntax(
            BodyLanguage::PclXl,
            format!("bad stream header: {}", header.trim()),
        ));
    }
    debug!(header = %header.trim(), big_endian, "PCL/XL stream header");
    Ok(big_endian)
}

/// Size of the data following an xy or box tag
fn point_or_box_len(tag: u8) -> u64 {
    match tag {
        0xd0 => 2,
        0xd1 | 0xd3 => 4,
        0xd2 | 0xd4 | 0xd5 => 8,
        0xe0 => 4,
        0xe1 | 0xe3 => 8,
        _ => 16,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum XlValue {
    Int(i64),
    Real(f64),
    Bytes(Vec<u8>),
    Other,
}

impl XlValue {
    fn as_int(&self) -> Option<i64> {
        match self {
            XlValue::Int(n) => Some(*n),
            XlValue::Real(r) => Some(*r as i64),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            XlValue::Bytes(b) => Some(String::from_utf8_lossy(b).trim_end_matches('\0').to_string()),
            _ => None,
        }
    }
}

struct XlReader<'a> {
    stream: &'a mut PushbackStream,
    big_endian: bool,
}

impl XlReader<'_> {
    fn u16(&mut self) -> io::Result<u16> {
        if self.big_endian {
            self.stream.read_u16::<BigEndian>()
        } else {
            self.stream.read_u16::<LittleEndian>()
        }
    }

    fn u32(&mut self) -> io::Result<u32> {
        if self.big_endian {
            self.stream.read_u32::<BigEndian>()
        } else {
            self.stream.read_u32::<LittleEndian>()
        }
    }

    fn i16(&mut self) -> io::Result<i16> {
        if self.big_endian {
            self.stream.read_i16::<BigEndian>()
        } else {
            self.stream.read_i16::<LittleEndian>()
        }
    }

    fn i32(&mut self) -> io::Result<i32> {
        if self.big_endian {
            self.stream.read_i32::<BigEndian>()
        } else {
            self.stream.read_i32::<LittleEndian>()
        }
    }

    fn f32(&mut self) -> io::Result<f32> {
        if self.big_endian {
            self.stream.read_f32::<BigEndian>()
        } else {
            self.stream.read_f32::<LittleEndian>()
        }
    }

    fn scalar(&mut self, tag: u8) -> Result<XlValue> {
        let value = match tag {
            0xc0 => XlValue::Int(i64::from(self.stream.read_u8()?)),
            0xc1 => XlValue::Int(i64::from(self.u16()?)),
            0xc2 => XlValue::Int(i64::from(self.u32()?)),
            0xc3 => XlValue::Int(i64::from(self.i16()?)),
            0xc4 => XlValue::Int(i64::from(self.i32()?)),
            _ => XlValue::Real(f64::from(self.f32()?)),
        };
        Ok(value)
    }

    fn array(&mut self, tag: u8) -> Result<XlValue> {
        let len_tag = self.stream.read_u8()?;
        let len = match len_tag {
            0xc0 | 0xc1 => self.scalar(len_tag)?.as_int().unwrap_or(0) as u64,
            other => return Err(self.undefined(other)),
        };
        let element = match tag {
            0xc8 => 1,
            0xc9 | 0xcb => 2,
            _ => 4,
        };
        if tag == 0xc8 {
            return Ok(XlValue::Bytes(self.stream.read_vec(len as usize)?));
        }
        self.stream.skip(len * element)?;
        Ok(XlValue::Other)
    }

    fn undefined(&self, tag: u8) -> Error {
        Error::syntax(
            BodyLanguage::PclXl,
            format!("undefined tag 0x{tag:02x} at byte {}", self.stream.position()),
        )
    }
}

#[derive(Debug, Default)]
struct XlJob {
    documents: Vec<Document>,
    current: Option<Document>,
    page: Option<Page>,
}

impl XlJob {
    fn operator(&mut self, op: u8, attributes: &HashMap<u16, XlValue>) {
        match op {
            BEGIN_SESSION => {
                self.close_document();
                self.current = Some(Document::default());
            }
            END_SESSION => self.close_document(),
            BEGIN_PAGE => {
                self.close_page();
                self.page = Some(begin_page(attributes));
            }
            END_PAGE => {
                let mut page = self.page.take().unwrap_or_default();
                if let Some(copies) = attributes.get(&PAGE_COPIES).and_then(XlValue::as_int) {
                    let copies = i32::try_from(copies).unwrap_or(i32::MAX);
                    page.ticket
                        .get_or_insert_with(PrintTicket::new)
                        .set_parameter(psk::PAGE_COPIES, TicketValue::Int32(copies));
                }
                self.push_page(page);
            }
            _ => {}
        }
    }

    fn push_page(&mut self, page: Page) {
        let document = self.current.get_or_insert_with(Document::default);
        debug!(page = document.pages.len() + 1, "PCL/XL page end");
        document.pages.push(page);
    }

    fn close_page(&mut self) {
        if let Some(page) = self.page.take() {
            self.push_page(page);
        }
    }

    fn close_document(&mut self) {
        self.close_page();
        if let Some(document) = self.current.take() {
            self.documents.push(document);
        }
    }

    fn into_assembly(mut self) -> DocumentAssembly {
        self.close_document();
        DocumentAssembly {
            documents: self.documents,
            ticket: None,
        }
    }
}

/// Page ticket and dimensions from `BeginPage` attributes
fn begin_page(attributes: &HashMap<u16, XlValue>) -> Page {
    let mut ticket = PrintTicket::new();
    let mut dimensions = PageDimensions::default();

    match attributes.get(&MEDIA_SIZE) {
        Some(value @ XlValue::Bytes(_)) => {
            let name = value.as_text().unwrap_or_default();
            match MediaSize::from_name(&name) {
                Some(size) => {
                    dimensions = size.dimensions();
                    ticket.set_feature(psk::PAGE_MEDIA_SIZE, size.keyword());
                }
                None => ticket.set_feature(psk::PAGE_MEDIA_SIZE, QName::local(name)),
            }
        }
        Some(value) => {
            if let Some(size) = value.as_int().and_then(xl_media_size) {
                dimensions = size.dimensions();
                ticket.set_feature(psk::PAGE_MEDIA_SIZE, size.keyword());
            }
        }
        None => {}
    }

    if let Some(media_type) = attributes.get(&MEDIA_TYPE).and_then(XlValue::as_text) {
        ticket.set_parameter(psk::PAGE_MEDIA_TYPE, TicketValue::String(media_type));
    }

    let orientation = attributes
        .get(&ORIENTATION)
        .and_then(XlValue::as_int)
        .and_then(Orientation::from_code)
        .unwrap_or_default();
    if orientation.is_landscape() {
        dimensions = dimensions.rotated();
    }
    ticket.set_feature(psk::PAGE_ORIENTATION, orientation.keyword());

    if let Some(source) = attributes.get(&MEDIA_SOURCE).and_then(XlValue::as_int) {
        ticket.set_feature(psk::PAGE_INPUT_BIN, xl_media_source(source));
    }

    if let Some(mode) = attributes.get(&DUPLEX_PAGE_MODE).and_then(XlValue::as_int) {
        let option = if mode == 0 {
            psk::TWO_SIDED_SHORT_EDGE
        } else {
            psk::TWO_SIDED_LONG_EDGE
        };
        ticket.set_feature(psk::JOB_DUPLEX, QName::psk(option));
    } else if attributes.contains_key(&SIMPLEX_PAGE_MODE) {
        ticket.set_feature(psk::JOB_DUPLEX, QName::psk(psk::ONE_SIDED));
    }

    Page {
        dimensions,
        ticket: non_empty(ticket),
    }
}

/// `MediaSize` enumeration
fn xl_media_size(code: i64) -> Option<MediaSize> {
    let size = match code {
        0 => MediaSize::Letter,
        1 => MediaSize::Legal,
        2 => MediaSize::A4,
        3 => MediaSize::Executive,
        4 => MediaSize::Ledger,
        5 => MediaSize::A3,
        6 => MediaSize::Com10Envelope,
        7 => MediaSize::MonarchEnvelope,
        8 => MediaSize::C5Envelope,
        9 => MediaSize::DlEnvelope,
        12 => MediaSize::B5,
        16 => MediaSize::A5,
        _ => return None,
    };
    Some(size)
}

/// `MediaSource` enumeration
fn xl_media_source(code: i64) -> QName {
    match code {
        0 => QName::local("Default"),
        1 => QName::psk("AutoSelect"),
        2 => QName::psk("Manual"),
        3 => QName::local("MultiPurposeTray"),
        4 => QName::local("Upper"),
        5 => QName::local("Lower"),
        6 => QName::psk("EnvelopeFeed"),
        n => QName::local(format!("Tray{n}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::TicketNode;
    use std::io::{Cursor, Read};

    fn parse(bytes: &[u8]) -> Result<(DocumentAssembly, Vec<u8>)> {
        let mut stream = PushbackStream::new(Cursor::new(bytes.to_vec()));
        let assembly = PclXlParser::new().parse(&mut stream)?;
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest)?;
        Ok((assembly, rest))
    }

    fn option_of(page: &Page, feature: &str) -> Option<String> {
        page.ticket
            .as_ref()
            .and_then(|t| t.feature_option(feature))
            .map(|q| q.name().to_string())
    }

    fn little_endian_job() -> Vec<u8> {
        let mut job = b") HP-PCL XL;2;0;Comment\n".to_vec();
        // BeginSession with Measure
        job.extend_from_slice(&[0xc0, 0x00, 0xf8, 0x86, BEGIN_SESSION]);
        // Page 1: A4 landscape, upper cassette, long-edge duplex, plain paper
        job.extend_from_slice(&[0xc0, 0x02, 0xf8, 0x25]);
        job.extend_from_slice(&[0xc0, 0x01, 0xf8, 0x28]);
        job.extend_from_slice(&[0xc0, 0x04, 0xf8, 0x26]);
        job.extend_from_slice(&[0xc0, 0x01, 0xf8, 0x35]);
        job.extend_from_slice(&[0xc8, 0xc1, 0x05, 0x00]);
        job.extend_from_slice(b"Plain");
        job.extend_from_slice(&[0xf8, 0x27, BEGIN_PAGE]);
        // SetCursor with a point, then embedded data
        job.extend_from_slice(&[0xd1, 0x0a, 0x00, 0x14, 0x00, 0xf8, 0x4c, 0x6b]);
        job.extend_from_slice(&[0xfb, 0x03, 0x1b, 0x44, 0xf0]);
        job.extend_from_slice(&[0xc1, 0x02, 0x00, 0xf8, 0x31, END_PAGE]);
        // Page 2: media named LEGAL
        job.extend_from_slice(&[0xc8, 0xc0, 0x05]);
        job.extend_from_slice(b"LEGAL");
        job.extend_from_slice(&[0xf8, 0x25, BEGIN_PAGE, END_PAGE]);
        job.extend_from_slice(&[END_SESSION, b' ']);
        job.extend_from_slice(b"\x1b%-12345X@PJL EOJ\n");
        job
    }

    #[test]
    fn test_pages_and_attributes() {
        let (assembly, rest) = parse(&little_endian_job()).unwrap();
        assert_eq!(rest, b"\x1b%-12345X@PJL EOJ\n");
        assert_eq!(assembly.document_count(), 1);

        let pages = &assembly.documents[0].pages;
        assert_eq!(pages.len(), 2);

        let first = &pages[0];
        assert_eq!(option_of(first, psk::PAGE_MEDIA_SIZE).as_deref(), Some("ISOA4"));
        assert_eq!(option_of(first, psk::PAGE_ORIENTATION).as_deref(), Some("Landscape"));
        assert_eq!(option_of(first, psk::PAGE_INPUT_BIN).as_deref(), Some("Upper"));
        assert_eq!(option_of(first, psk::JOB_DUPLEX).as_deref(), Some("TwoSidedLongEdge"));
        let nodes = first.ticket.as_ref().unwrap().nodes();
        assert!(nodes.contains(&TicketNode::parameter(
            QName::psk(psk::PAGE_MEDIA_TYPE),
            TicketValue::String("Plain".to_string())
        )));
        assert!(nodes.contains(&TicketNode::parameter(
            QName::psk(psk::PAGE_COPIES),
            TicketValue::Int32(2)
        )));
        assert!(first.dimensions.width.mm() > first.dimensions.height.mm());

        let second = &pages[1];
        assert_eq!(
            option_of(second, psk::PAGE_MEDIA_SIZE).as_deref(),
            Some("NorthAmericaLegal")
        );
        assert_eq!(option_of(second, psk::PAGE_ORIENTATION).as_deref(), Some("Portrait"));
    }

    #[test]
    fn test_big_endian_binding() {
        let mut job = b"( HP-PCL XL;2;0\n".to_vec();
        job.extend_from_slice(&[BEGIN_SESSION, BEGIN_PAGE]);
        job.extend_from_slice(&[0xc1, 0x00, 0x03, 0xf8, 0x31, END_PAGE, END_SESSION]);
        let (assembly, rest) = parse(&job).unwrap();
        assert!(rest.is_empty());
        let ticket = assembly.documents[0].pages[0].ticket.as_ref().unwrap();
        assert!(ticket.nodes().contains(&TicketNode::parameter(
            QName::psk(psk::PAGE_COPIES),
            TicketValue::Int32(3)
        )));
    }

    #[test]
    fn test_sessions_become_documents() {
        let mut job = b") HP-PCL XL;2;0\n".to_vec();
        job.extend_from_slice(&[BEGIN_SESSION, BEGIN_PAGE, END_PAGE, END_SESSION]);
        job.extend_from_slice(&[BEGIN_SESSION, BEGIN_PAGE, END_PAGE, BEGIN_PAGE, END_PAGE, END_SESSION]);
        let (assembly, _) = parse(&job).unwrap();
        assert_eq!(assembly.document_count(), 2);
        assert_eq!(assembly.documents[1].page_count(), 2);
    }

    #[test]
    fn test_undefined_tag_is_parser_error() {
        let mut job = b") HP-PCL XL;2;0\n".to_vec();
        job.extend_from_slice(&[BEGIN_SESSION, 0xf0]);
        let err = parse(&job).unwrap_err();
        assert!(matches!(
            err,
            Error::Parser {
                language: BodyLanguage::PclXl,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_header_is_parser_error() {
        assert!(parse(b"@PJL hello\n").is_err());
        assert!(parse(b") HP-GL/2\n").is_err());
    }
}
