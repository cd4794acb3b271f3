//! Duplex / binding interpretation of `@PJL SET` attributes

use std::fmt;

use super::AttributeStore;

/// Duplex mode requested by the PJL prologue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplexMode {
    Off,
    TwoSidedLongEdge,
    TwoSidedShortEdge,
}

impl fmt::Display for DuplexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplexMode::Off => write!(f, "OFF"),
            DuplexMode::TwoSidedLongEdge => write!(f, "TwoSidedLongEdge"),
            DuplexMode::TwoSidedShortEdge => write!(f, "TwoSidedShortEdge"),
        }
    }
}

/// Interpret `SET DUPLEX` and `SET BINDING`, last value wins.
///
/// Returns `None` when no `SET DUPLEX` was seen. Binding only matters when
/// duplex is on; absent or unrecognised binding means long edge.
pub fn duplex_mode(attributes: &AttributeStore) -> Option<DuplexMode> {
    let duplex = attributes.last_value("SET", "DUPLEX")?;
    if !duplex.eq_ignore_ascii_case("on") {
        return Some(DuplexMode::Off);
    }

    let binding = attributes
        .last_value("SET", "BINDING")
        .map(|b| b.to_ascii_lowercase());
    let mode = match binding.as_deref() {
        Some("shortedge") => DuplexMode::TwoSidedShortEdge,
        _ => DuplexMode::TwoSidedLongEdge,
    };
    Some(mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(pairs: &[(&str, &str)]) -> AttributeStore {
        let mut store = AttributeStore::new();
        for (key, value) in pairs {
            store.push("SET", key, value);
        }
        store
    }

    #[test]
    fn test_on_longedge() {
        let s = store(&[("DUPLEX", "ON"), ("BINDING", "LONGEDGE")]);
        assert_eq!(duplex_mode(&s), Some(DuplexMode::TwoSidedLongEdge));
    }

    #[test]
    fn test_on_shortedge() {
        let s = store(&[("DUPLEX", "on"), ("BINDING", "ShortEdge")]);
        assert_eq!(duplex_mode(&s), Some(DuplexMode::TwoSidedShortEdge));
    }

    #[test]
    fn test_on_without_binding_defaults_to_long_edge() {
        assert_eq!(duplex_mode(&store(&[("DUPLEX", "ON")])), Some(DuplexMode::TwoSidedLongEdge));
        let s = store(&[("DUPLEX", "ON"), ("BINDING", "sideways")]);
        assert_eq!(duplex_mode(&s), Some(DuplexMode::TwoSidedLongEdge));
    }

    #[test]
    fn test_off_ignores_binding() {
        let s = store(&[("DUPLEX", "off"), ("BINDING", "SHORTEDGE")]);
        assert_eq!(duplex_mode(&s), Some(DuplexMode::Off));
    }

    #[test]
    fn test_absent() {
        assert_eq!(duplex_mode(&store(&[("BINDING", "SHORTEDGE")])), None);
    }

    #[test]
    fn test_last_value_wins() {
        let s = store(&[("DUPLEX", "OFF"), ("DUPLEX", "ON"), ("BINDING", "LONGEDGE")]);
        assert_eq!(duplex_mode(&s), Some(DuplexMode::TwoSidedLongEdge));
        assert_eq!(DuplexMode::TwoSidedLongEdge.to_string(), "TwoSidedLongEdge");
    }
}
