//! PJL attribute store

/// One `@PJL <verb> <key> = <value>` binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PjlAttribute {
    pub verb: String,
    pub key: String,
    /// Value as written (case preserved, trimmed)
    pub value: String,
    /// Encounter order within the prologue
    pub seen_order: usize,
}

/// Multi-set of attributes in encounter order
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    attributes: Vec<PjlAttribute>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binding
    pub fn push(&mut self, verb: &str, key: &str, value: &str) {
        let seen_order = self.attributes.len();
        self.attributes.push(PjlAttribute {
            verb: verb.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            seen_order,
        });
    }

    /// All attributes matching `(verb, key)` case-insensitively, in encounter order
    pub fn get(&self, verb: &str, key: &str) -> Vec<&PjlAttribute> {
        self.attributes
            .iter()
            .filter(|a| a.verb.eq_ignore_ascii_case(verb) && a.key.eq_ignore_ascii_case(key))
            .collect()
    }

    /// The last value bound to `(verb, key)`, if any
    pub fn last_value(&self, verb: &str, key: &str) -> Option<&str> {
        self.get(verb, key).last().map(|a| a.value.as_str())
    }

    pub fn clear(&mut self) {
        self.attributes.clear();
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PjlAttribute> {
        self.attributes.iter()
    }
}
