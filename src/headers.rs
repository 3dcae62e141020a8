use std::iter::FromIterator;

use indexmap::IndexMap;

/// An ordered set of header fields with case-insensitive names.
///
/// Fields keep the position of their first insertion so that they are written
/// to the wire in a deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    /// Keyed by the lowercased name; the value holds the name as given and the field value.
    fields: IndexMap<String, (String, String)>,
}

impl Headers {
    /// Create an empty set of headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if the field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_ascii_lowercase())
    }

    /// Add a field. An existing value is combined with the new one as `old, new`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.get_mut(&name.to_ascii_lowercase()) {
            Some((_, existing)) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            None => {
                self.fields.insert(name.to_ascii_lowercase(), (name, value));
            }
        }
    }

    /// Set a field, discarding any existing value.
    ///
    /// A field that was already present keeps its position.
    pub fn replace(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.fields
            .insert(name.to_ascii_lowercase(), (name, value.into()));
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields
            .shift_remove(&name.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    /// The number of distinct fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.fields
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.set(name, value);
        }
        headers
    }
}

impl<N: Into<String>, V: Into<String>> Extend<(N, V)> for Headers {
    fn extend<I: IntoIterator<Item = (N, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.set(name, value);
        }
    }
}
