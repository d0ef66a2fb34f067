//! Shared-delta clamping for multi-edge drags, and the preview geometry each
//! affected clip is drawn with.
//!
//! Every edge's [`TrimConstraint`] is expressed in that edge's own delta frame.
//! When a lead edge is given, edges facing the other way that are not part of a
//! roll move opposite to it, so their range is mirrored into the lead frame
//! before the ranges are intersected. One shared delta is then clamped into the
//! intersection and handed back to each edge with its sign.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::{
    Clip, ClipId, EdgeColors, EdgeKey, EdgeType, RationalTime, SelectedEdge, TimeBound,
    TimelineError, TrimType,
};

/// Allowed delta range for one edge. Missing bounds mean unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConstraint {
    pub min_delta: TimeBound,
    pub max_delta: TimeBound,
}

impl Default for TrimConstraint {
    fn default() -> Self {
        Self::unconstrained()
    }
}

impl TrimConstraint {
    pub fn new(min_delta: TimeBound, max_delta: TimeBound) -> Self {
        Self {
            min_delta,
            max_delta,
        }
    }

    pub fn between(min_delta: RationalTime, max_delta: RationalTime) -> Self {
        Self::new(min_delta.into(), max_delta.into())
    }

    pub fn unconstrained() -> Self {
        Self::new(TimeBound::NegInfinity, TimeBound::PosInfinity)
    }

    /// No delta satisfies the range. A minimum of `+inf` or a maximum of `-inf`
    /// admits nothing either.
    pub fn is_empty(&self) -> bool {
        self.min_delta == TimeBound::PosInfinity
            || self.max_delta == TimeBound::NegInfinity
            || self.min_delta > self.max_delta
    }

    /// The same range seen from an edge moving the opposite way.
    pub fn negated(&self) -> Self {
        Self::new(-self.max_delta, -self.min_delta)
    }

    pub fn intersect(&self, other: &TrimConstraint) -> Self {
        Self::new(
            self.min_delta.max(other.min_delta),
            self.max_delta.min(other.max_delta),
        )
    }

    pub fn contains(&self, delta: RationalTime) -> bool {
        let delta = TimeBound::At(delta);
        self.min_delta <= delta && delta <= self.max_delta
    }

    /// The delta at `delta`'s rate closest to it inside the range. `None` when
    /// the range is empty or holds no frame at that rate.
    pub fn clamp(&self, delta: RationalTime) -> Option<RationalTime> {
        if self.is_empty() {
            return None;
        }
        let clamped = delta.clamp_to(self.min_delta, self.max_delta);
        self.contains(clamped).then_some(clamped)
    }

    fn overshoots(&self, delta: RationalTime) -> bool {
        !self.contains(delta)
    }
}

/// Source of per-edge constraints, normally a dry run of the trim command.
pub trait ConstraintProvider {
    fn constraint_for(&self, edge: &SelectedEdge) -> Option<TrimConstraint>;
}

impl<F> ConstraintProvider for F
where
    F: Fn(&SelectedEdge) -> Option<TrimConstraint>,
{
    fn constraint_for(&self, edge: &SelectedEdge) -> Option<TrimConstraint> {
        self(edge)
    }
}

/// Constraint table keyed by `clip_id:edge_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrimConstraints {
    entries: BTreeMap<EdgeKey, TrimConstraint>,
}

impl TrimConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: EdgeKey, constraint: TrimConstraint) -> Option<TrimConstraint> {
        self.entries.insert(key, constraint)
    }

    pub fn with(mut self, key: EdgeKey, constraint: TrimConstraint) -> Self {
        self.insert(key, constraint);
        self
    }

    pub fn get(&self, key: &EdgeKey) -> Option<&TrimConstraint> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_json_str(json: &str) -> Result<Self, TimelineError> {
        serde_json::from_str(json)
            .map_err(|e| TimelineError::Configuration(format!("malformed trim constraints: {e}")))
    }
}

impl ConstraintProvider for TrimConstraints {
    fn constraint_for(&self, edge: &SelectedEdge) -> Option<TrimConstraint> {
        self.get(&edge.key()).copied()
    }
}

/// Whether `edge` moves opposite to `lead`.
pub fn is_negated(edge: &SelectedEdge, lead: Option<&SelectedEdge>) -> bool {
    match lead {
        Some(lead) => {
            !edge.same_edge(lead)
                && edge.edge_type.bracket() != lead.edge_type.bracket()
                && edge.trim_type != TrimType::Roll
        }
        None => false,
    }
}

fn signed(delta: RationalTime, negated: bool) -> RationalTime {
    if negated {
        -delta
    } else {
        delta
    }
}

/// Outcome of intersecting every edge's range in the lead frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SharedDelta {
    pub range: TrimConstraint,
    /// Applied delta in the lead frame. Zero at the requested rate when `range`
    /// is empty or holds no frame at that rate.
    pub delta: RationalTime,
}

impl SharedDelta {
    pub fn is_empty_range(&self) -> bool {
        self.range.is_empty()
    }
}

pub fn compute_shared_delta(
    drag_edges: &[SelectedEdge],
    drag_delta: RationalTime,
    constraints: &dyn ConstraintProvider,
    lead_edge: Option<&SelectedEdge>,
) -> SharedDelta {
    let range = drag_edges
        .iter()
        .filter_map(|edge| {
            let own = constraints.constraint_for(edge)?;
            Some(if is_negated(edge, lead_edge) {
                own.negated()
            } else {
                own
            })
        })
        .fold(TrimConstraint::unconstrained(), |acc, c| acc.intersect(&c));

    let delta = range.clamp(drag_delta).unwrap_or_else(|| {
        debug!(
            min = %range.min_delta,
            max = %range.max_delta,
            "no delta fits the drag range, holding edges in place"
        );
        RationalTime::zero(drag_delta.fps)
    });
    SharedDelta { range, delta }
}

/// One dragged edge as the preview should draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewEdge {
    pub clip_id: ClipId,
    pub edge_type: EdgeType,
    pub trim_type: TrimType,
    /// Applied delta in this edge's own frame.
    pub delta: RationalTime,
    pub at_limit: bool,
    pub color: String,
}

pub fn build_preview_edges(
    drag_edges: &[SelectedEdge],
    drag_delta: RationalTime,
    constraints: &dyn ConstraintProvider,
    colors: &EdgeColors,
    lead_edge: Option<&SelectedEdge>,
) -> Vec<PreviewEdge> {
    let shared = compute_shared_delta(drag_edges, drag_delta, constraints, lead_edge);
    debug!(
        edges = drag_edges.len(),
        requested = %drag_delta,
        applied = %shared.delta,
        min = %shared.range.min_delta,
        max = %shared.range.max_delta,
        "drag delta clamped"
    );

    drag_edges
        .iter()
        .map(|edge| {
            let negated = is_negated(edge, lead_edge);
            let delta = signed(shared.delta, negated);
            let at_limit = constraints.constraint_for(edge).map_or(false, |own| {
                // Flagged when this edge's own range is what stopped the drag.
                let requested = signed(drag_delta, negated);
                own.overshoots(requested) && own.clamp(requested) == Some(delta)
            });
            PreviewEdge {
                clip_id: edge.clip_id.clone(),
                edge_type: edge.edge_type,
                trim_type: edge.trim_type,
                delta,
                at_limit,
                color: colors.for_limit(at_limit).to_string(),
            }
        })
        .collect()
}

/// Where a clip (or a gap handle) is drawn during the drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewGeometry {
    pub start: RationalTime,
    pub duration: RationalTime,
    /// `None` when the clip moves as a whole.
    pub edge_type: Option<EdgeType>,
}

/// Preview span for `clip` with `delta` applied at `edge_type`.
///
/// `raw_edge_type`, when given, overrides `edge_type`. Gap edges collapse to a
/// zero-length marker at the clip's current end (`gap_after`) or start
/// (`gap_before`).
pub fn compute_preview_geometry(
    clip: &Clip,
    edge_type: Option<EdgeType>,
    delta: RationalTime,
    raw_edge_type: Option<EdgeType>,
) -> PreviewGeometry {
    let edge_type = raw_edge_type.or(edge_type);
    let start = clip.timeline_start;
    let duration = clip.duration;
    let (start, duration) = match edge_type {
        Some(EdgeType::GapAfter) => (clip.end(), RationalTime::zero(duration.fps)),
        Some(EdgeType::GapBefore) => (start, RationalTime::zero(duration.fps)),
        Some(EdgeType::In) => (start, duration - delta),
        Some(EdgeType::Out) => (start, duration + delta),
        None => (start + delta, duration),
    };
    PreviewGeometry {
        start,
        duration,
        edge_type,
    }
}
