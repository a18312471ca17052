use slotmap::new_key_type;
use std::sync::atomic::{AtomicU64, Ordering};

new_key_type! {
    pub(crate) struct VertexKey;
    pub struct EdgeId;
}

/// Marks every handle minted by one graph. Clones of a graph keep its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct GraphTag(u64);

impl GraphTag {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a vertex of one graph, valid in that graph and in all of its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId {
    graph: GraphTag,
    key: VertexKey,
}

impl VertexId {
    pub(crate) fn new(graph: GraphTag, key: VertexKey) -> Self {
        Self { graph, key }
    }

    pub(crate) fn graph(&self) -> GraphTag {
        self.graph
    }

    pub(crate) fn key(&self) -> VertexKey {
        self.key
    }

    /// A handle that no graph ever hands out.
    #[cfg(test)]
    pub(crate) fn dangling(n: u64) -> Self {
        Self {
            graph: GraphTag(u64::MAX),
            key: VertexKey::from(slotmap::KeyData::from_ffi(n)),
        }
    }
}
