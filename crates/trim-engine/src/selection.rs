//! Edge selection set

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{EdgeKey, SelectedEdge};

/// How a batch of edges combines with the current selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    Replace,
    Add,
    Remove,
    Toggle,
}

/// Ordered set of selected edges. Identity is `(clip_id, edge_type)`; the first
/// entry is the lead edge of a drag.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeSelection {
    edges: Vec<SelectedEdge>,
}

impl EdgeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: impl IntoIterator<Item = SelectedEdge>) -> Self {
        let mut selection = Self::new();
        selection.apply(edges, SelectionMode::Replace);
        selection
    }

    pub fn apply(&mut self, edges: impl IntoIterator<Item = SelectedEdge>, mode: SelectionMode) {
        if mode == SelectionMode::Replace {
            self.edges.clear();
        }
        for edge in edges {
            match mode {
                SelectionMode::Replace | SelectionMode::Add => self.insert(edge),
                SelectionMode::Remove => {
                    self.remove(&edge.key());
                }
                SelectionMode::Toggle => {
                    if !self.remove(&edge.key()) {
                        self.insert(edge);
                    }
                }
            }
        }
        trace!(?mode, count = self.edges.len(), "edge selection updated");
    }

    /// Adds `edge`, or updates the trim type of an edge already selected in place.
    pub fn insert(&mut self, edge: SelectedEdge) {
        match self.edges.iter_mut().find(|e| e.same_edge(&edge)) {
            Some(existing) => existing.trim_type = edge.trim_type,
            None => self.edges.push(edge),
        }
    }

    /// Returns whether the edge was selected.
    pub fn remove(&mut self, key: &EdgeKey) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.key() != *key);
        self.edges.len() != before
    }

    pub fn contains(&self, key: &EdgeKey) -> bool {
        self.edges.iter().any(|e| e.key() == *key)
    }

    pub fn lead(&self) -> Option<&SelectedEdge> {
        self.edges.first()
    }

    pub fn edges(&self) -> &[SelectedEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }
}
