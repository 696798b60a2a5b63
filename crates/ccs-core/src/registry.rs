//! CCRDT type registry - capability dispatch for compaction laws.
//!
//! A data type is a computational CRDT iff it is registered here. CCRDT
//! types expose two laws over their (type-erased) update operations:
//!
//! - `can_compact(older, newer)` - commutative-sound pairwise test
//! - `compact(older, newer)` - merges two compactable operations, or
//!   cancels the pair entirely
//!
//! Neither law is assumed symmetric, associative, or transitive; the
//! compaction engine treats them as given. The registry is a dispatch
//! table keyed by [`TypeTag`], so new types can be registered at runtime.

use crate::op::Op;
use crate::txn::TypeTag;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of merging two compactable operations.
#[derive(Clone, Debug, PartialEq)]
pub enum Compacted {
    /// The pair merges into a single operation.
    Merged(Op),
    /// The pair cancels; both operations are observationally empty.
    Noop,
}

/// Compaction capability of a computational CRDT type.
///
/// `compact` must be total on any `(older, newer)` pair for which
/// `can_compact` returned `true`. Calling it on any other pair is a
/// programming error and may panic; callers that cannot rule this out
/// run compaction under a panic guard.
pub trait CcrdtType: Send + Sync {
    /// Can `older` and `newer` (in that order) be merged?
    fn can_compact(&self, older: &Op, newer: &Op) -> bool;

    /// Merge `older` and `newer` into one operation, or cancel the pair.
    fn compact(&self, older: &Op, newer: &Op) -> Compacted;
}

/// Dispatch table from type tags to CCRDT capabilities.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<TypeTag, Arc<dyn CcrdtType>>,
}

impl TypeRegistry {
    /// Create an empty registry (no type is a CCRDT).
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Create a registry with the builtin CCRDT types registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(TypeTag::new("topk"), Arc::new(crate::topk::TopK));
        registry.register(
            TypeTag::new("topk_with_deletes"),
            Arc::new(crate::topk_deletes::TopKWithDeletes),
        );
        registry.register(TypeTag::new("average"), Arc::new(crate::average::Average));
        registry.register(TypeTag::new("counter"), Arc::new(crate::counter::Counter));
        registry
    }

    /// Register (or replace) the capability for a type tag.
    pub fn register(&mut self, tag: TypeTag, ccrdt: Arc<dyn CcrdtType>) {
        self.types.insert(tag, ccrdt);
    }

    /// Whether the tag names a computational CRDT.
    pub fn is_ccrdt(&self, tag: &TypeTag) -> bool {
        self.types.contains_key(tag)
    }

    /// The capability registered for a tag, if any.
    pub fn get(&self, tag: &TypeTag) -> Option<&Arc<dyn CcrdtType>> {
        self.types.get(tag)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
