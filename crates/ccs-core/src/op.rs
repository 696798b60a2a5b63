//! Type-erased operation values.
//!
//! An [`Op`] is the payload of an update record. The relay core never
//! interprets it; only the CCRDT type implementation registered for the
//! record's type tag gives it meaning. The representation is a small
//! self-describing value tree, so new CCRDT types can be registered at
//! runtime without touching this crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A self-describing operation value.
///
/// The `Tagged` variant carries the operation name (`"add"`, `"del"`,
/// `"inc"`, ...) alongside its payload, mirroring how update operations
/// arrive from the transaction log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Empty payload.
    Unit,
    /// Signed integer payload.
    Int(i64),
    /// Floating point payload.
    Float(f64),
    /// UTF-8 string payload.
    Str(String),
    /// Ordered list of values.
    List(Vec<Op>),
    /// String-keyed map of values.
    Map(BTreeMap<String, Op>),
    /// A named operation with its payload.
    Tagged(String, Box<Op>),
}

impl Op {
    /// Build a tagged operation.
    pub fn tagged(name: impl Into<String>, payload: Op) -> Self {
        Op::Tagged(name.into(), Box::new(payload))
    }

    /// Build a list value.
    pub fn list(items: impl IntoIterator<Item = Op>) -> Self {
        Op::List(items.into_iter().collect())
    }

    /// The tag and payload, if this is a tagged operation.
    pub fn tag(&self) -> Option<(&str, &Op)> {
        match self {
            Op::Tagged(name, payload) => Some((name.as_str(), payload)),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Op::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Op::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Op]> {
        match self {
            Op::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Op>> {
        match self {
            Op::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<i64> for Op {
    fn from(n: i64) -> Self {
        Op::Int(n)
    }
}

impl From<&str> for Op {
    fn from(s: &str) -> Self {
        Op::Str(s.to_string())
    }
}

impl From<String> for Op {
    fn from(s: String) -> Self {
        Op::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_accessors() {
        let op = Op::tagged("add", Op::list([Op::from("foo"), Op::from(5)]));

        let (name, payload) = op.tag().unwrap();
        assert_eq!(name, "add");

        let items = payload.as_list().unwrap();
        assert_eq!(items[0].as_str(), Some("foo"));
        assert_eq!(items[1].as_int(), Some(5));
    }

    #[test]
    fn test_accessor_mismatch_returns_none() {
        let op = Op::Int(7);
        assert!(op.tag().is_none());
        assert!(op.as_str().is_none());
        assert!(op.as_list().is_none());
        assert!(op.as_map().is_none());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut entries = BTreeMap::new();
        entries.insert("foo".to_string(), Op::Int(1));
        let op = Op::tagged("del", Op::Map(entries));

        let serialized = serde_json::to_string(&op).unwrap();
        let deserialized: Op = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, op);
    }
}
