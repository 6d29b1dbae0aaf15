//! JSON conversion of semantic facts.
//!
//! Editor hosts usually sit across a serialization boundary from this crate;
//! the converters here produce `serde_json::Value`s spelled the way
//! Prometheus spells its own types (`"scalar"`, `"many-to-one"`, ...), so a
//! host can consume them without translation.

use serde_json::{Value, json};

use crate::lint::Diagnostic;
use crate::matching::VectorMatching;
use crate::types::ValueType;

/// The wire tag of a value type (`"vector"`, `"matrix"`, ...).
///
/// Deliberately shorter than [`ValueType::as_str`], which is the prose form
/// used in diagnostics ("instant vector").
pub fn value_type_to_json(value_type: ValueType) -> Value {
    let tag = match value_type {
        ValueType::None => "none",
        ValueType::Scalar => "scalar",
        ValueType::Vector => "vector",
        ValueType::Matrix => "matrix",
        ValueType::String => "string",
    };
    Value::String(tag.to_string())
}

pub fn matching_to_json(matching: &VectorMatching) -> Value {
    json!({
        "card": matching.card.as_str(),
        "matchingLabels": matching.matching_labels,
        "on": matching.on,
        "include": matching.include,
    })
}

pub fn diagnostic_to_json(diagnostic: &Diagnostic) -> Value {
    json!({
        "from": diagnostic.from,
        "to": diagnostic.to,
        "message": diagnostic.message,
    })
}

pub fn diagnostics_to_json(diagnostics: &[Diagnostic]) -> Value {
    Value::Array(diagnostics.iter().map(diagnostic_to_json).collect())
}
