//! Structured metric records produced by output parsers

use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;

/// A single field value on a metric
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Str(String),
}

impl FieldValue {
    /// The floating-point value, if this field holds one
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Float(value) => json!(value),
            FieldValue::Int(value) => json!(value),
            FieldValue::Bool(value) => json!(value),
            FieldValue::Str(value) => json!(value),
        }
    }
}

/// A named measurement with tags, fields, and a collection timestamp.
///
/// Fields keep insertion order; that order is observable wherever field
/// values are enumerated (notably dynamic command-set updates).
#[derive(Debug, Clone)]
pub struct Metric {
    name: String,
    tags: BTreeMap<String, String>,
    fields: Vec<(String, FieldValue)>,
    timestamp: DateTime<Utc>,
}

impl Metric {
    /// Create a metric stamped with the current time
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_timestamp(name, Utc::now())
    }

    /// Create a metric with an explicit timestamp
    pub fn with_timestamp(name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            fields: Vec::new(),
            timestamp,
        }
    }

    /// Metric name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Collection timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Add or overwrite a tag
    pub fn add_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Look up a tag value
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// All tags
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Add a field, replacing any existing field with the same key
    pub fn add_field(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        if let Some(existing) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    /// Chaining variant of [`add_field`](Self::add_field)
    pub fn with_field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.add_field(key, value);
        self
    }

    /// Look up a field value
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Fields in insertion order
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Convert the metric to a JSON-compatible format
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();

        json!({
            "name": self.name,
            "tags": self.tags,
            "fields": fields,
            "timestamp": self.timestamp.to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_keep_insertion_order() {
        let metric = Metric::new("ports")
            .with_field("b", FieldValue::Float(2.0))
            .with_field("a", FieldValue::Float(1.0));

        let keys: Vec<&str> = metric.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_add_field_replaces_existing() {
        let mut metric = Metric::new("m");
        metric.add_field("value", FieldValue::Int(1));
        metric.add_field("value", FieldValue::Int(2));

        assert_eq!(metric.fields().len(), 1);
        assert_eq!(metric.field("value"), Some(&FieldValue::Int(2)));
    }

    #[test]
    fn test_tags_and_json() {
        let mut metric = Metric::new("m").with_field("ok", FieldValue::Bool(true));
        metric.add_tag("port", "80");

        assert_eq!(metric.tag("port"), Some("80"));

        let value = metric.to_json();
        assert_eq!(value["name"], "m");
        assert_eq!(value["tags"]["port"], "80");
        assert_eq!(value["fields"]["ok"], true);
    }
}
