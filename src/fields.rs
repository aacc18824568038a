//! HTTP-style name-value fields

/// Ordered sequence of HTTP header fields.
///
/// Duplicate names are permitted and kept as separate entries in insertion
/// order; nothing is ever merged or reordered. Name lookups are ASCII
/// case-insensitive and return the first match.
///
/// No validation is performed on whether the names or values are valid HTTP
/// tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: Vec<(String, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds a field to the end of the sequence.
    pub fn append<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.fields.push((name.into(), value.into()))
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|(n, _v)| n.eq_ignore_ascii_case(name))
    }

    /// Returns the value of the first field with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _v)| n.eq_ignore_ascii_case(name))
            .map(|(_n, v)| v.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, String)> {
        self.fields.iter()
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = &'a (String, String);
    type IntoIter = std::slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl FromIterator<(String, String)> for FieldMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order_and_duplicates() {
        let mut fields = FieldMap::new();
        fields.append("Set-Cookie", "a=1");
        fields.append("X-Test", "x");
        fields.append("Set-Cookie", "b=2");

        assert_eq!(fields.len(), 3);

        let entries: Vec<_> = fields
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![("Set-Cookie", "a=1"), ("X-Test", "x"), ("Set-Cookie", "b=2")]
        );
    }

    #[test]
    fn test_get_is_case_insensitive_first_match() {
        let mut fields = FieldMap::new();
        fields.append("Content-Length", "10");
        fields.append("content-length", "20");

        assert_eq!(fields.get("CONTENT-LENGTH"), Some("10"));
        assert!(fields.contains_name("content-LENGTH"));
        assert_eq!(fields.get("Host"), None);
    }
}
