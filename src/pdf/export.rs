//! PDF export of parsed assemblies using lopdf
//!
//! Each assembly page becomes one PDF page of the same size, listing the
//! page's print ticket in Helvetica. The job's duplex setting is carried
//! into the catalog's viewer preferences.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::info;

use crate::assembly::{DocumentAssembly, Page};
use crate::error::Result;
use crate::report::node_line;
use crate::ticket::psk;

const FONT_SIZE: f64 = 10.0;
const LEADING: f64 = 14.0;
const MARGIN: f64 = 36.0;

/// Where the PDF for job `job_index` (1-based) of `source` is written.
///
/// `<dir>/<pdf_dir_name>/<stem>.pdf` for the first job,
/// `<stem>-<n>.pdf` for later jobs in the same file.
pub fn output_path_for(source: &Path, pdf_dir_name: &str, job_index: usize) -> PathBuf {
    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let file_name = if job_index <= 1 {
        format!("{stem}.pdf")
    } else {
        format!("{stem}-{job_index}.pdf")
    };
    dir.join(pdf_dir_name).join(file_name)
}

/// Write `assembly` as a PDF at `output_path`, creating its directory
pub fn export_assembly(
    assembly: &DocumentAssembly,
    source_path: &Path,
    output_path: &Path,
) -> Result<()> {
    if let Some(dir) = output_path.parent() {
        fs::create_dir_all(dir)?;
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources_id = add_font_resources(&mut doc);

    let page_total = assembly.page_count();
    let mut kids: Vec<Object> = Vec::with_capacity(page_total);
    for (d, document) in assembly.documents.iter().enumerate() {
        for (p, page) in document.pages.iter().enumerate() {
            let heading = format!(
                "Document {} of {}, page {} of {}",
                d + 1,
                assembly.document_count(),
                p + 1,
                document.page_count()
            );
            let page_id = add_page(&mut doc, pages_id, resources_id, page, &heading);
            kids.push(Object::Reference(page_id));
        }
    }

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    pages_object.set("Count", Object::Integer(count));
    pages_object.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages_object));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    if let Some(duplex) = viewer_duplex(assembly) {
        let mut preferences = Dictionary::new();
        preferences.set("Duplex", Object::Name(duplex.as_bytes().to_vec()));
        catalog.set("ViewerPreferences", Object::Dictionary(preferences));
    }
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let title = source_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut info_dict = Dictionary::new();
    info_dict.set("Title", Object::string_literal(title));
    info_dict.set("Producer", Object::string_literal(env!("CARGO_PKG_NAME")));
    info_dict.set(
        "CreationDate",
        Object::string_literal(Local::now().format("D:%Y%m%d%H%M%S").to_string()),
    );
    let info_id = doc.add_object(Object::Dictionary(info_dict));
    doc.trailer.set("Info", Object::Reference(info_id));

    doc.compress();
    doc.save(output_path)?;

    info!(
        output = %output_path.display(),
        pages = page_total,
        "wrote PDF"
    );
    Ok(())
}

/// Shared resources dictionary with Helvetica as /F1
fn add_font_resources(doc: &mut Document) -> ObjectId {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    let font_id = doc.add_object(Object::Dictionary(font));

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));
    doc.add_object(Object::Dictionary(resources))
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    page: &Page,
    heading: &str,
) -> ObjectId {
    let width = page.dimensions.width.pt();
    let height = page.dimensions.height.pt();

    let mut lines = vec![heading.to_string()];
    match &page.ticket {
        Some(ticket) => lines.extend(ticket.nodes().iter().map(node_line)),
        None => lines.push("** None found **".to_string()),
    }

    let content = page_content(&lines, height);
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(pages_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            pdf_real(width),
            pdf_real(height),
        ]),
    );
    page_dict.set("Contents", Object::Reference(content_id));
    page_dict.set("Resources", Object::Reference(resources_id));
    doc.add_object(Object::Dictionary(page_dict))
}

/// PDF reals are single precision; out-of-range values saturate
fn pdf_real(value: f64) -> Object {
    let value = if value.is_finite() {
        value.clamp(f64::from(f32::MIN), f64::from(f32::MAX))
    } else {
        0.0
    };
    Object::Real(value as f32)
}

/// Text content stream listing `lines` from the top-left margin
fn page_content(lines: &[String], page_height: f64) -> String {
    let mut content = String::from("BT\n");
    content.push_str(&format!("/F1 {FONT_SIZE} Tf\n{LEADING} TL\n"));
    content.push_str(&format!("{MARGIN} {:.2} Td\n", page_height - MARGIN - FONT_SIZE));
    for line in lines {
        content.push_str(&format!("({}) Tj\nT*\n", escape_pdf_string(line)));
    }
    content.push_str("ET\n");
    content
}

/// Escape a string for a PDF literal; tabs become spaces, non-ASCII becomes '?'
fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\t' => "    ".to_string(),
            '\\' | '(' | ')' => format!("\\{c}"),
            c if c.is_ascii() && !c.is_ascii_control() => c.to_string(),
            _ => "?".to_string(),
        })
        .collect()
}

/// PDF `/Duplex` viewer preference from the first duplex feature found
fn viewer_duplex(assembly: &DocumentAssembly) -> Option<&'static str> {
    let tickets = assembly
        .ticket
        .iter()
        .chain(assembly.documents.iter().filter_map(|d| d.ticket.as_ref()))
        .chain(assembly.pages().filter_map(|p| p.ticket.as_ref()));

    for ticket in tickets {
        if let Some(option) = ticket.feature_option(psk::JOB_DUPLEX) {
            return match option.name() {
                psk::TWO_SIDED_LONG_EDGE => Some("DuplexFlipLongEdge"),
                psk::TWO_SIDED_SHORT_EDGE => Some("DuplexFlipShortEdge"),
                _ => Some("Simplex"),
            };
        }
    }
    None
}
