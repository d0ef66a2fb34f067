//! Roll-pair search over edges already gathered by cursor proximity.
//!
//! Unlike [`pick_edges`](crate::pick_edges) this does not pair edges through a
//! boundary model: it scores every out/in pair on a track, plus every gap edge
//! as a clip-against-empty-space roll, and keeps the best.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Clip, EdgeType, RationalTime, SelectedEdge, TimeToPixel, TrimType};

/// One edge near the cursor, with its pixel distance from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollCandidate {
    pub clip: Clip,
    pub edge: EdgeType,
    pub distance: f64,
}

impl RollCandidate {
    pub fn new(clip: Clip, edge: EdgeType, distance: f64) -> Self {
        Self {
            clip,
            edge,
            distance,
        }
    }

    /// Timeline position of this edge's handle.
    pub fn edge_time(&self) -> RationalTime {
        match self.edge {
            EdgeType::In | EdgeType::GapBefore => self.clip.timeline_start,
            EdgeType::Out | EdgeType::GapAfter => self.clip.end(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RollPairKind {
    ClipToClip,
    ClipToGap,
}

/// Which edge sits on which side of the roll point, kept for delta negation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollPair {
    pub kind: RollPairKind,
    pub edit_time: RationalTime,
    pub left: SelectedEdge,
    pub right: SelectedEdge,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollPairMatch {
    pub selection: Vec<SelectedEdge>,
    pub pair: RollPair,
    /// Lower is better. Clip pairs score by their worse distance, gap edges by their own.
    pub score: f64,
}

impl RollPairMatch {
    fn new(
        kind: RollPairKind,
        edit_time: RationalTime,
        left: SelectedEdge,
        right: SelectedEdge,
        score: f64,
    ) -> Self {
        Self {
            selection: vec![left.clone(), right.clone()],
            pair: RollPair {
                kind,
                edit_time,
                left,
                right,
            },
            score,
        }
    }
}

/// Best roll pair among `candidates`, or `None` (an infinite score) when nothing pairs.
///
/// `detect_roll_between_clips(left, right, cursor_x, viewport_width)` decides whether
/// two edges of different clips are close enough to act as one roll point.
pub fn find_best_roll_pair<F>(
    candidates: &[RollCandidate],
    cursor_x: f64,
    viewport_width: f64,
    mut detect_roll_between_clips: F,
) -> Option<RollPairMatch>
where
    F: FnMut(&RollCandidate, &RollCandidate, f64, f64) -> bool,
{
    let mut best: Option<RollPairMatch> = None;
    let mut consider = |found: RollPairMatch| {
        if best.as_ref().map_or(true, |b| found.score < b.score) {
            best = Some(found);
        }
    };

    for (i, a) in candidates.iter().enumerate() {
        for b in &candidates[i + 1..] {
            if a.clip.track_id != b.clip.track_id || a.clip.id == b.clip.id {
                continue;
            }
            let head = match (a.edge, b.edge) {
                (EdgeType::Out, EdgeType::In) => b,
                (EdgeType::In, EdgeType::Out) => a,
                _ => continue,
            };
            let a_first =
                (&a.clip.timeline_start, &a.clip.id) <= (&b.clip.timeline_start, &b.clip.id);
            let (left, right) = if a_first { (a, b) } else { (b, a) };
            if !detect_roll_between_clips(left, right, cursor_x, viewport_width) {
                continue;
            }
            consider(RollPairMatch::new(
                RollPairKind::ClipToClip,
                head.edge_time(),
                SelectedEdge::new(left.clip.id.clone(), left.edge, TrimType::Roll),
                SelectedEdge::new(right.clip.id.clone(), right.edge, TrimType::Roll),
                a.distance.max(b.distance),
            ));
        }
    }

    for gap in candidates.iter().filter(|c| c.edge.is_gap()) {
        let clip_id = gap.clip.id.clone();
        let (left, right) = match gap.edge {
            EdgeType::GapAfter => (EdgeType::Out, EdgeType::GapAfter),
            _ => (EdgeType::GapBefore, EdgeType::In),
        };
        consider(RollPairMatch::new(
            RollPairKind::ClipToGap,
            gap.edge_time(),
            SelectedEdge::new(clip_id.clone(), left, TrimType::Roll),
            SelectedEdge::new(clip_id, right, TrimType::Roll),
            gap.distance,
        ));
    }

    if let Some(found) = &best {
        debug!(
            kind = ?found.pair.kind,
            edit_time = %found.pair.edit_time,
            score = found.score,
            "roll pair found"
        );
    }
    best
}

/// Geometric roll test: the two handles project within `roll_zone_px` of each
/// other and the cursor is within `roll_zone_px` of their midpoint.
pub fn roll_zone_predicate<'a>(
    projector: &'a dyn TimeToPixel,
    roll_zone_px: f64,
) -> impl Fn(&RollCandidate, &RollCandidate, f64, f64) -> bool + 'a {
    move |left: &RollCandidate, right: &RollCandidate, cursor_x: f64, viewport_width: f64| {
        let left_x = projector.time_to_pixel(&left.edge_time(), viewport_width);
        let right_x = projector.time_to_pixel(&right.edge_time(), viewport_width);
        let midpoint = (left_x + right_x) / 2.0;
        (left_x - right_x).abs() <= roll_zone_px && (cursor_x - midpoint).abs() <= roll_zone_px
    }
}
