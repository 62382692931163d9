//! Single-use payload shared by `Request` and `Response`.
//!
//! # Design
//! A `Body` stores what it was built from (`BodyInit`) and materializes it
//! lazily as text, a `Blob`, raw bytes or decoded `FormData`. Every
//! materializing read consumes the body; a second read returns
//! `FetchError::AlreadyRead`. `json()` hands back the stored value untouched
//! and does not consume.
//!
//! Which readers exist is fixed by `Capabilities` when the body is created:
//! a text-only body reads straight from its text buffer and refuses blob and
//! array-buffer reads.

use serde::Deserialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::error::FetchError;

/// Optional payload representations available to a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub blob: bool,
    pub form_data: bool,
}

impl Capabilities {
    /// Text and raw JSON access only.
    pub const TEXT_ONLY: Capabilities = Capabilities {
        blob: false,
        form_data: false,
    };
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            blob: true,
            form_data: true,
        }
    }
}

/// Immutable binary payload with a MIME type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    bytes: Vec<u8>,
    content_type: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: &str) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.to_ascii_lowercase(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Decode as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Ordered list of form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `application/x-www-form-urlencoded` string.
    ///
    /// Surrounding whitespace is trimmed and empty segments are skipped;
    /// `+` decodes to a space and `%XX` escapes are expanded.
    pub fn decode(body: &str) -> Self {
        let entries = form_urlencoded::parse(body.trim().as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { entries }
    }

    /// Encode back to the urlencoded form.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.entries.iter())
            .finish()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// What a body was constructed from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BodyInit {
    /// Nothing was supplied (or the script never called back).
    #[default]
    Empty,
    /// A value delivered by a JSONP callback.
    Json(Value),
    Text(String),
    Blob(Blob),
    FormData(FormData),
}

impl BodyInit {
    pub fn is_empty(&self) -> bool {
        match self {
            BodyInit::Empty => true,
            BodyInit::Text(s) => s.is_empty(),
            BodyInit::Blob(b) => b.size() == 0,
            BodyInit::FormData(f) => f.is_empty(),
            BodyInit::Json(_) => false,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            BodyInit::Empty => "empty",
            BodyInit::Json(_) => "json",
            BodyInit::Text(_) => "text",
            BodyInit::Blob(_) => "blob",
            BodyInit::FormData(_) => "form data",
        }
    }

    /// The text buffer backing text and blob reads.
    fn text_buffer(&self) -> String {
        match self {
            BodyInit::Empty => String::new(),
            BodyInit::Json(v) => v.to_string(),
            BodyInit::Text(s) => s.clone(),
            BodyInit::Blob(b) => b.text(),
            BodyInit::FormData(f) => f.encode(),
        }
    }

    fn content_type(&self) -> &str {
        match self {
            BodyInit::Json(_) => "application/json",
            BodyInit::Text(_) | BodyInit::Empty => "text/plain;charset=utf-8",
            BodyInit::Blob(b) => b.content_type(),
            BodyInit::FormData(_) => "application/x-www-form-urlencoded;charset=utf-8",
        }
    }
}

impl From<Value> for BodyInit {
    fn from(v: Value) -> Self {
        BodyInit::Json(v)
    }
}

impl From<String> for BodyInit {
    fn from(s: String) -> Self {
        BodyInit::Text(s)
    }
}

impl From<&str> for BodyInit {
    fn from(s: &str) -> Self {
        BodyInit::Text(s.to_string())
    }
}

/// Single-use payload with capability-gated readers.
#[derive(Debug, Clone, Default)]
pub struct Body {
    init: BodyInit,
    used: bool,
    capabilities: Capabilities,
}

impl Body {
    pub fn new(init: BodyInit, capabilities: Capabilities) -> Self {
        Self {
            init,
            used: false,
            capabilities,
        }
    }

    pub fn body_used(&self) -> bool {
        self.used
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// The stored value, whatever its kind.
    pub fn raw(&self) -> &BodyInit {
        &self.init
    }

    /// The value delivered by the callback, returned verbatim.
    ///
    /// `None` when the body holds no JSON value, including the case where the
    /// script loaded but never called back.
    pub fn json(&self) -> Option<&Value> {
        match &self.init {
            BodyInit::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn blob(&mut self) -> Result<Blob, FetchError> {
        if !self.capabilities.blob {
            return Err(FetchError::CapabilityUnavailable("blob"));
        }
        self.reject_form_data("blob")?;
        self.consume()?;
        Ok(match &self.init {
            BodyInit::Blob(b) => b.clone(),
            other => Blob::new(other.text_buffer(), other.content_type()),
        })
    }

    pub fn array_buffer(&mut self) -> Result<Vec<u8>, FetchError> {
        self.blob().map(Blob::into_bytes)
    }

    pub fn text(&mut self) -> Result<String, FetchError> {
        if self.capabilities.blob {
            self.reject_form_data("text")?;
        }
        self.consume()?;
        Ok(self.init.text_buffer())
    }

    pub fn form_data(&mut self) -> Result<FormData, FetchError> {
        if !self.capabilities.form_data {
            return Err(FetchError::CapabilityUnavailable("form data"));
        }
        if let BodyInit::FormData(f) = &self.init {
            let form = f.clone();
            self.consume()?;
            return Ok(form);
        }
        self.text().map(|t| FormData::decode(&t))
    }

    fn consume(&mut self) -> Result<(), FetchError> {
        if self.used {
            return Err(FetchError::AlreadyRead);
        }
        self.used = true;
        Ok(())
    }

    fn reject_form_data(&self, read: &'static str) -> Result<(), FetchError> {
        if let BodyInit::FormData(_) = self.init {
            return Err(FetchError::UnsupportedBodyRead {
                read,
                stored: self.init.kind(),
            });
        }
        Ok(())
    }
}

/// Readers shared by every type that carries a `Body`.
pub trait ReadBody {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;

    fn body_used(&self) -> bool {
        self.body().body_used()
    }

    fn json(&self) -> Option<&Value> {
        self.body().json()
    }

    fn text(&mut self) -> Result<String, FetchError> {
        self.body_mut().text()
    }

    fn blob(&mut self) -> Result<Blob, FetchError> {
        self.body_mut().blob()
    }

    fn array_buffer(&mut self) -> Result<Vec<u8>, FetchError> {
        self.body_mut().array_buffer()
    }

    fn form_data(&mut self) -> Result<FormData, FetchError> {
        self.body_mut().form_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(init: impl Into<BodyInit>) -> Body {
        Body::new(init.into(), Capabilities::default())
    }

    #[test]
    fn second_read_is_already_read() {
        let mut b = body("hello");
        assert_eq!(b.text().unwrap(), "hello");
        assert!(b.body_used());
        assert!(matches!(b.text(), Err(FetchError::AlreadyRead)));
        assert!(matches!(b.blob(), Err(FetchError::AlreadyRead)));
    }

    #[test]
    fn json_returns_stored_value_without_consuming() {
        let b = body(json!({"a": 1}));
        assert_eq!(b.json(), Some(&json!({"a": 1})));
        assert_eq!(b.json(), Some(&json!({"a": 1})));
        assert!(!b.body_used());
    }

    #[test]
    fn json_of_empty_body_is_none() {
        let b = Body::default();
        assert!(b.json().is_none());
    }

    #[test]
    fn text_of_json_body_is_serialized_value() {
        let mut b = body(json!({"a": 1}));
        assert_eq!(b.text().unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn blob_and_array_buffer_from_text() {
        let mut b = body("abc");
        let blob = b.blob().unwrap();
        assert_eq!(blob.bytes(), b"abc");
        assert_eq!(blob.content_type(), "text/plain;charset=utf-8");

        let mut b = body("abc");
        assert_eq!(b.array_buffer().unwrap(), b"abc".to_vec());
    }

    #[test]
    fn stored_blob_is_read_as_text() {
        let mut b = body(BodyInit::Blob(Blob::new("héllo".as_bytes(), "Text/Plain")));
        assert_eq!(b.text().unwrap(), "héllo");
    }

    #[test]
    fn form_data_body_cannot_be_read_as_blob_or_text() {
        let mut form = FormData::new();
        form.append("a", "1");
        let mut b = body(BodyInit::FormData(form.clone()));
        assert!(matches!(
            b.blob(),
            Err(FetchError::UnsupportedBodyRead { read: "blob", .. })
        ));
        assert!(matches!(
            b.text(),
            Err(FetchError::UnsupportedBodyRead { read: "text", .. })
        ));
        assert!(!b.body_used());
        assert_eq!(b.form_data().unwrap(), form);
    }

    #[test]
    fn form_data_decodes_text_body() {
        let mut b = body(" a=b+c&&d=%26x%3D&e \n");
        let form = b.form_data().unwrap();
        assert_eq!(form.get("a"), Some("b c"));
        assert_eq!(form.get("d"), Some("&x="));
        assert_eq!(form.get("e"), Some(""));
        assert_eq!(form.len(), 3);
    }

    #[test]
    fn form_decode_keeps_equals_in_value() {
        let form = FormData::decode("k=a=b&k=c");
        assert_eq!(form.get_all("k"), vec!["a=b", "c"]);
    }

    #[test]
    fn text_only_body_refuses_blob_reads() {
        let mut b = Body::new(BodyInit::from("x"), Capabilities::TEXT_ONLY);
        assert!(matches!(b.blob(), Err(FetchError::CapabilityUnavailable("blob"))));
        assert!(matches!(b.array_buffer(), Err(FetchError::CapabilityUnavailable(_))));
        assert!(matches!(b.form_data(), Err(FetchError::CapabilityUnavailable("form data"))));
        assert_eq!(b.text().unwrap(), "x");
    }

    #[test]
    fn empty_inits() {
        assert!(BodyInit::Empty.is_empty());
        assert!(BodyInit::from("").is_empty());
        assert!(!BodyInit::Json(Value::Null).is_empty());
    }
}
