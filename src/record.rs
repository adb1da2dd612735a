//! Generic log record shapes and the demapping of raw query rows.

use compact_str::{CompactString, ToCompactString};
use litemap::LiteMap;
use std::fmt;

pub(crate) type FieldMap<V> = LiteMap<CompactString, V>;

pub(crate) const TOPIC_FIELD: &str = "__topic__";
pub(crate) const SOURCE_FIELD: &str = "__source__";
pub(crate) const TIME_FIELD: &str = "__time__";

/// A log field value.
///
/// Values are transmitted as strings; [`FieldValue::Null`] marks a field that
/// is skipped entirely when the record is serialized.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent value, omitted from outgoing payloads.
    Null,
    /// Boolean, serialized as `true`/`false`.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// String value, passed through as-is.
    Str(CompactString),
}

impl FieldValue {
    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// String form of the value for transmission, `None` for null.
    pub(crate) fn coerce(&self) -> Option<CompactString> {
        match self {
            FieldValue::Null => None,
            _ => Some(self.to_compact_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::UInt(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::UInt(value.into())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::UInt(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value.into())
    }
}

impl From<CompactString> for FieldValue {
    fn from(value: CompactString) -> Self {
        FieldValue::Str(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// A generic log record: named fields plus the reserved `time`, `topic` and
/// `source` members.
///
/// On write, a missing `time` is filled in with the current wall clock
/// truncated to whole seconds, and every non-`time` member becomes one
/// key/value content pair. Null fields are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    time: Option<i64>,
    topic: Option<CompactString>,
    source: Option<CompactString>,
    fields: FieldMap<FieldValue>,
}

impl Default for LogRecord {
    fn default() -> Self {
        LogRecord {
            time: None,
            topic: None,
            source: None,
            fields: FieldMap::new(),
        }
    }
}

impl LogRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record time, in epoch seconds.
    pub fn with_time(mut self, epoch_seconds: i64) -> Self {
        self.time = Some(epoch_seconds);
        self
    }

    /// Set the record time from a timestamp, truncated to whole seconds.
    pub fn with_timestamp(mut self, timestamp: jiff::Timestamp) -> Self {
        self.time = Some(timestamp.as_second());
        self
    }

    /// Set the reserved `topic` member.
    pub fn with_topic(mut self, topic: impl Into<CompactString>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the reserved `source` member.
    pub fn with_source(mut self, source: impl Into<CompactString>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add a named field.
    pub fn with(mut self, key: impl Into<CompactString>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// The record time in epoch seconds, if set.
    pub fn time(&self) -> Option<i64> {
        self.time
    }

    /// The reserved `topic` member, if set.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// The reserved `source` member, if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Look up a named field.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Iterate the named fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of named fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no named fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A raw query result row as returned by the service, before any metadata
/// fields are stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRecord {
    fields: FieldMap<CompactString>,
}

impl Default for RemoteRecord {
    fn default() -> Self {
        RemoteRecord {
            fields: FieldMap::new(),
        }
    }
}

impl RemoteRecord {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw field.
    pub fn with(mut self, key: impl Into<CompactString>, value: impl Into<CompactString>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a raw field.
    pub fn insert(&mut self, key: impl Into<CompactString>, value: impl Into<CompactString>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Look up a raw field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(CompactString::as_str)
    }

    /// Iterate the raw fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of raw fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Strip the double-underscore metadata convention and turn the row into
    /// a [`LogRecord`].
    ///
    /// `__topic__` and `__source__` are re-attached as the reserved members
    /// only when non-empty, `__time__` only when it parses as a number. Any
    /// other `__x__` field is dropped.
    pub fn into_log_record(self) -> LogRecord {
        let mut record = LogRecord::new();
        for (name, value) in self.fields.into_iter() {
            match name.as_str() {
                TOPIC_FIELD => {
                    if !value.is_empty() {
                        record.topic = Some(value);
                    }
                }
                SOURCE_FIELD => {
                    if !value.is_empty() {
                        record.source = Some(value);
                    }
                }
                TIME_FIELD => {
                    if let Ok(time) = value.parse::<i64>() {
                        record.time = Some(time);
                    }
                }
                name if is_reserved(name) => {}
                _ => {
                    record.fields.insert(name, FieldValue::Str(value));
                }
            }
        }
        record
    }
}

fn is_reserved(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion() {
        assert_eq!(FieldValue::from(42i64).coerce().unwrap(), "42");
        assert_eq!(FieldValue::from(true).coerce().unwrap(), "true");
        assert_eq!(FieldValue::from(1.5f64).coerce().unwrap(), "1.5");
        assert_eq!(FieldValue::from("hi").coerce().unwrap(), "hi");
        assert_eq!(FieldValue::Null.coerce(), None);
        assert_eq!(FieldValue::from(None::<i64>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some("x")), FieldValue::from("x"));
    }

    #[test]
    fn demap_strips_metadata() {
        let record = RemoteRecord::new()
            .with(TOPIC_FIELD, "T")
            .with(SOURCE_FIELD, "S")
            .with(TIME_FIELD, "1700000000")
            .with("__tag__:__pack_id__", "ignored")
            .with("msg", "hello")
            .into_log_record();

        assert_eq!(record.topic(), Some("T"));
        assert_eq!(record.source(), Some("S"));
        assert_eq!(record.time(), Some(1700000000));
        assert_eq!(record.get("msg"), Some(&FieldValue::from("hello")));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn demap_skips_empty_metadata() {
        let record = RemoteRecord::new()
            .with(TOPIC_FIELD, "")
            .with(SOURCE_FIELD, "")
            .with("msg", "hello")
            .into_log_record();

        assert_eq!(record.topic(), None);
        assert_eq!(record.source(), None);
        assert_eq!(record.time(), None);
        assert_eq!(record.get("msg"), Some(&FieldValue::from("hello")));
    }

    #[test]
    fn demap_drops_unparseable_time() {
        let record = RemoteRecord::new()
            .with(TIME_FIELD, "not a number")
            .into_log_record();
        assert_eq!(record.time(), None);
    }

    #[test]
    fn demap_keeps_underscore_prefixed_user_fields() {
        // Only full __x__ wrappers are reserved.
        let record = RemoteRecord::new()
            .with("__partial", "a")
            .with("plain", "b")
            .into_log_record();
        assert_eq!(record.get("__partial"), Some(&FieldValue::from("a")));
        assert_eq!(record.get("plain"), Some(&FieldValue::from("b")));
    }
}
