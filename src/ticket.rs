//! Print ticket model
//!
//! A print ticket is an ordered tree of nodes. Only the variants the report
//! needs carry structure; the rest are kept so they can be reported by type.

use std::fmt;

/// Print schema keywords namespace
pub const PSK_NAMESPACE: &str =
    "http://schemas.microsoft.com/windows/2003/08/printing/printschemakeywords";

/// Namespace for names this library invents (trays, unnamed media)
pub const LOCAL_NAMESPACE: &str = "urn:pjl-ticket-report:keywords";

/// Print schema keyword names used by the body parsers
pub mod psk {
    pub const JOB_DUPLEX: &str = "JobDuplexAllDocumentsContiguously";
    pub const JOB_COPIES: &str = "JobCopiesAllDocuments";
    pub const JOB_NAME: &str = "JobName";
    pub const PAGE_MEDIA_SIZE: &str = "PageMediaSize";
    pub const PAGE_MEDIA_TYPE: &str = "PageMediaType";
    pub const PAGE_ORIENTATION: &str = "PageOrientation";
    pub const PAGE_INPUT_BIN: &str = "PageInputBin";
    pub const PAGE_COPIES: &str = "PageCopies";

    pub const ONE_SIDED: &str = "OneSided";
    pub const TWO_SIDED_LONG_EDGE: &str = "TwoSidedLongEdge";
    pub const TWO_SIDED_SHORT_EDGE: &str = "TwoSidedShortEdge";
}

/// Namespace-qualified name; reports only surface the local part
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    namespace: String,
    name: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Name in the print schema keywords namespace
    pub fn psk(name: impl Into<String>) -> Self {
        Self::new(PSK_NAMESPACE, name)
    }

    /// Name in this library's own namespace
    pub fn local(name: impl Into<String>) -> Self {
        Self::new(LOCAL_NAMESPACE, name)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Local name, without namespace
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum TicketValue {
    Unassigned,
    Int32(i32),
    String(String),
    QName(QName),
    Real(f64),
    Boolean(bool),
}

/// Node type tags, numbered as reported by `Node type <n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum NodeType {
    Feature = 1,
    Option = 2,
    ParameterInit = 3,
    ParameterRef = 4,
    Property = 5,
    ScoredProperty = 6,
}

impl NodeType {
    pub fn tag(self) -> u32 {
        self as u32
    }
}

/// One node of a print ticket tree
#[derive(Debug, Clone, PartialEq)]
pub enum TicketNode {
    /// Named feature; the first child is normally the selected option
    Feature { name: QName, children: Vec<TicketNode> },
    Option { name: QName, children: Vec<TicketNode> },
    /// Named parameter with its single value; `None` when the ticket omits it
    ParameterInit { name: QName, value: Option<TicketValue> },
    ParameterRef { name: QName },
    Property { name: QName, children: Vec<TicketNode> },
    ScoredProperty { name: QName, children: Vec<TicketNode> },
}

impl TicketNode {
    /// Feature with a single selected option
    pub fn feature(name: QName, option: QName) -> Self {
        TicketNode::Feature {
            name,
            children: vec![TicketNode::Option {
                name: option,
                children: Vec::new(),
            }],
        }
    }

    pub fn parameter(name: QName, value: TicketValue) -> Self {
        TicketNode::ParameterInit {
            name,
            value: Some(value),
        }
    }

    pub fn name(&self) -> &QName {
        match self {
            TicketNode::Feature { name, .. }
            | TicketNode::Option { name, .. }
            | TicketNode::ParameterInit { name, .. }
            | TicketNode::ParameterRef { name }
            | TicketNode::Property { name, .. }
            | TicketNode::ScoredProperty { name, .. } => name,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            TicketNode::Feature { .. } => NodeType::Feature,
            TicketNode::Option { .. } => NodeType::Option,
            TicketNode::ParameterInit { .. } => NodeType::ParameterInit,
            TicketNode::ParameterRef { .. } => NodeType::ParameterRef,
            TicketNode::Property { .. } => NodeType::Property,
            TicketNode::ScoredProperty { .. } => NodeType::ScoredProperty,
        }
    }

    /// First child node, if this variant has children
    pub fn first_child(&self) -> Option<&TicketNode> {
        match self {
            TicketNode::Feature { children, .. }
            | TicketNode::Option { children, .. }
            | TicketNode::Property { children, .. }
            | TicketNode::ScoredProperty { children, .. } => children.first(),
            TicketNode::ParameterInit { .. } | TicketNode::ParameterRef { .. } => None,
        }
    }
}

/// Print ticket: the top-level nodes in sibling order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrintTicket {
    nodes: Vec<TicketNode>,
}

impl PrintTicket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level nodes in sibling order
    pub fn nodes(&self) -> &[TicketNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node, replacing an earlier top-level node of the same name
    pub fn set(&mut self, node: TicketNode) {
        match self.nodes.iter_mut().find(|n| n.name() == node.name()) {
            Some(existing) => *existing = node,
            None => self.nodes.push(node),
        }
    }

    /// Select `option` for the print schema feature `feature`
    pub fn set_feature(&mut self, feature: &str, option: QName) {
        self.set(TicketNode::feature(QName::psk(feature), option));
    }

    /// Initialise the print schema parameter `parameter`
    pub fn set_parameter(&mut self, parameter: &str, value: TicketValue) {
        self.set(TicketNode::parameter(QName::psk(parameter), value));
    }

    /// Selected option of a top-level feature, by local name
    pub fn feature_option(&self, feature: &str) -> Option<&QName> {
        self.nodes
            .iter()
            .find(|n| matches!(n, TicketNode::Feature { .. }) && n.name().name() == feature)
            .and_then(TicketNode::first_child)
            .filter(|child| child.node_type() == NodeType::Option)
            .map(TicketNode::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_same_name() {
        let mut ticket = PrintTicket::new();
        ticket.set_feature(psk::PAGE_ORIENTATION, QName::psk("Portrait"));
        ticket.set_parameter(psk::JOB_COPIES, TicketValue::Int32(1));
        ticket.set_feature(psk::PAGE_ORIENTATION, QName::psk("Landscape"));

        assert_eq!(ticket.nodes().len(), 2);
        assert_eq!(ticket.nodes()[0].name().name(), psk::PAGE_ORIENTATION);
        assert_eq!(
            ticket.feature_option(psk::PAGE_ORIENTATION).map(QName::name),
            Some("Landscape")
        );
    }

    #[test]
    fn test_feature_option_requires_option_child() {
        let mut ticket = PrintTicket::new();
        ticket.set(TicketNode::Feature {
            name: QName::psk(psk::JOB_DUPLEX),
            children: vec![TicketNode::ParameterRef {
                name: QName::psk("x"),
            }],
        });
        assert_eq!(ticket.feature_option(psk::JOB_DUPLEX), None);
    }

    #[test]
    fn test_node_type_tags() {
        let node = TicketNode::ScoredProperty {
            name: QName::psk("MediaSizeWidth"),
            children: Vec::new(),
        };
        assert_eq!(node.node_type().tag(), 6);
        assert_eq!(NodeType::Feature.tag(), 1);
    }
}
