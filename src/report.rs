//! Print ticket report
//!
//! Walks an assembly's documents and pages in index order and writes one
//! line per top-level print-ticket node:
//!
//! ```text
//! File jobs/a.pcl:
//!   Assembly-level print ticket:
//!     Parameter JobCopiesAllDocuments 	Value 2
//!   Document 1 of 1:
//!     Document-level print ticket:
//!       ** None found **
//!     Page-level print ticket for page 1 of 1:
//!       Parameter PageMediaSize 	Value ISOA4
//! ```

use std::io::{self, Write};
use std::path::Path;

use crate::assembly::DocumentAssembly;
use crate::ticket::{NodeType, PrintTicket, TicketNode, TicketValue};

const NOT_AVAILABLE: &str = "** not available **";
const VALUE_NOT_AVAILABLE: &str = "** value not available **";
const NONE_FOUND: &str = "** None found **";

/// Write the report for one parsed assembly
pub fn report_assembly<W: Write>(
    out: &mut W,
    source: &Path,
    assembly: &DocumentAssembly,
) -> io::Result<()> {
    writeln!(out, "File {}:", source.display())?;
    writeln!(out, "  Assembly-level print ticket:")?;
    report_ticket(out, assembly.ticket.as_ref(), 4)?;

    let document_count = assembly.document_count();
    for (d, document) in assembly.documents.iter().enumerate() {
        writeln!(out, "  Document {} of {}:", d + 1, document_count)?;
        writeln!(out, "    Document-level print ticket:")?;
        report_ticket(out, document.ticket.as_ref(), 6)?;

        let page_count = document.page_count();
        for (p, page) in document.pages.iter().enumerate() {
            writeln!(
                out,
                "    Page-level print ticket for page {} of {}:",
                p + 1,
                page_count
            )?;
            report_ticket(out, page.ticket.as_ref(), 6)?;
        }
    }
    Ok(())
}

/// Write a ticket's top-level nodes in sibling order, or `** None found **`
pub fn report_ticket<W: Write>(
    out: &mut W,
    ticket: Option<&PrintTicket>,
    indent: usize,
) -> io::Result<()> {
    let Some(ticket) = ticket else {
        return writeln!(out, "{:indent$}{NONE_FOUND}", "");
    };
    for node in ticket.nodes() {
        writeln!(out, "{:indent$}{}", "", node_line(node))?;
    }
    Ok(())
}

/// Report line for one node, without indentation
pub fn node_line(node: &TicketNode) -> String {
    format!("Parameter {} \tValue {}", node.name().name(), node_value(node))
}

fn node_value(node: &TicketNode) -> String {
    match node {
        TicketNode::ParameterInit { value, .. } => render_value(value.as_ref()),
        // Only the first child is inspected
        TicketNode::Feature { .. } => match node.first_child() {
            Some(child) if child.node_type() == NodeType::Option => child.name().name().to_string(),
            _ => NOT_AVAILABLE.to_string(),
        },
        other => format!("Node type {}", other.node_type().tag()),
    }
}

/// Render a parameter value
pub fn render_value(value: Option<&TicketValue>) -> String {
    match value {
        None | Some(TicketValue::Unassigned) => NOT_AVAILABLE.to_string(),
        Some(TicketValue::Int32(n)) => n.to_string(),
        Some(TicketValue::String(s)) => s.clone(),
        Some(TicketValue::QName(q)) => q.name().to_string(),
        Some(TicketValue::Real(_) | TicketValue::Boolean(_)) => VALUE_NOT_AVAILABLE.to_string(),
    }
}
