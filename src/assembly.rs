//! Document assembly model produced by the body parsers

use crate::layout::PageDimensions;
use crate::ticket::PrintTicket;

/// One page and its optional print ticket
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub dimensions: PageDimensions,
    pub ticket: Option<PrintTicket>,
}

/// An ordered list of pages with an optional document-level ticket
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub pages: Vec<Page>,
    pub ticket: Option<PrintTicket>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Top-level result of parsing one job body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentAssembly {
    pub documents: Vec<Document>,
    pub ticket: Option<PrintTicket>,
}

impl DocumentAssembly {
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Total pages across all documents
    pub fn page_count(&self) -> usize {
        self.documents.iter().map(Document::page_count).sum()
    }

    /// Pages of every document, in document then page order
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.documents.iter().flat_map(|d| d.pages.iter())
    }
}

/// Wrap a non-empty ticket, `None` otherwise
pub(crate) fn non_empty(ticket: PrintTicket) -> Option<PrintTicket> {
    if ticket.is_empty() {
        None
    } else {
        Some(ticket)
    }
}
