//! Case-insensitive header multi-map.
//!
//! Names are validated against the HTTP token grammar and stored lowercased.
//! Each name maps to an ordered list of values; names keep the order in which
//! they were first inserted so enumeration is deterministic.

use crate::error::FetchError;

/// Ordered, case-insensitive multi-map of header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a header set from `(name, value)` pairs, appending each in turn.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, FetchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: ToString,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.append(name, value)?;
        }
        Ok(headers)
    }

    /// Add `value` after any values already stored under `name`.
    pub fn append(&mut self, name: impl ToString, value: impl ToString) -> Result<(), FetchError> {
        let name = normalize_name(name)?;
        let value = value.to_string();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1.push(value),
            None => self.entries.push((name, vec![value])),
        }
        Ok(())
    }

    /// Remove every value stored under `name`.
    pub fn delete(&mut self, name: impl ToString) -> Result<(), FetchError> {
        let name = normalize_name(name)?;
        self.entries.retain(|(n, _)| *n != name);
        Ok(())
    }

    /// Replace all values stored under `name` with the single `value`.
    pub fn set(&mut self, name: impl ToString, value: impl ToString) -> Result<(), FetchError> {
        let name = normalize_name(name)?;
        let value = value.to_string();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = vec![value],
            None => self.entries.push((name, vec![value])),
        }
        Ok(())
    }

    /// First value stored under `name`.
    ///
    /// Lookups never fail: a name outside the token grammar cannot have been
    /// stored, so it is simply absent.
    pub fn get(&self, name: impl ToString) -> Option<&str> {
        self.values(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values stored under `name`, in insertion order.
    pub fn get_all(&self, name: impl ToString) -> Vec<&str> {
        self.values(name)
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn has(&self, name: impl ToString) -> bool {
        self.values(name).is_some()
    }

    /// Visit every `(value, name)` pair, names in insertion order, then values.
    pub fn for_each<F: FnMut(&str, &str)>(&self, mut f: F) {
        for (name, values) in &self.entries {
            for value in values {
                f(value, name);
            }
        }
    }

    /// Iterate `(name, value)` pairs in the same order as `for_each`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn values(&self, name: impl ToString) -> Option<&Vec<String>> {
        let name = normalize_name(name).ok()?;
        self.position(&name).map(|idx| &self.entries[idx].1)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }
}

/// Stringify, validate and lowercase a header field name.
fn normalize_name(name: impl ToString) -> Result<String, FetchError> {
    let name = name.to_string();
    if name.is_empty() || !name.chars().all(is_token_char) {
        return Err(FetchError::InvalidHeaderName(name));
    }
    Ok(name.to_ascii_lowercase())
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '-' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}
