use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::tree::NodeId;

/// Folders currently shown expanded in the tree view. This is view state:
/// it is kept apart from the nodes and is never persisted with them.  
/// 樹狀檢視中目前展開的資料夾集合。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpansionSet(BTreeSet<NodeId>);

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, folder: NodeId) -> bool {
        self.0.contains(&folder)
    }

    /// Flips membership of `folder`; returns whether it is now expanded.
    pub fn toggle(&mut self, folder: NodeId) -> bool {
        if self.0.remove(&folder) {
            false
        } else {
            self.0.insert(folder);
            true
        }
    }

    /// Value-returning form of [`ExpansionSet::toggle`].
    pub fn toggled(&self, folder: NodeId) -> Self {
        let mut next = self.clone();
        next.toggle(folder);
        next
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<NodeId> for ExpansionSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
