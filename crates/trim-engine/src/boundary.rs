//! Edit points of one track.
//!
//! A [`Boundary`] is a time where a left-facing edge (a clip's `out`, or the
//! `gap_before` of the clip that follows empty space) meets a right-facing edge
//! (a clip's `in`, or the `gap_after` of the clip that precedes empty space).
//! The model is rebuilt from the current clip snapshot for every query.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::trace;

use crate::{Clip, ClipId, EdgeType, RationalTime, SelectedEdge, TimeToPixel, TrimType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRef {
    pub clip_id: ClipId,
    pub edge_type: EdgeType,
    /// Far end of the empty span a gap edge borders. `None` on a gap edge means
    /// the span runs to infinity; always `None` on `in`/`out`.
    pub gap_other_end_time: Option<RationalTime>,
}

impl EdgeRef {
    pub fn clip_edge(clip_id: ClipId, edge_type: EdgeType) -> Self {
        Self {
            clip_id,
            edge_type,
            gap_other_end_time: None,
        }
    }

    pub fn gap_edge(clip_id: ClipId, edge_type: EdgeType, other_end: Option<RationalTime>) -> Self {
        Self {
            clip_id,
            edge_type,
            gap_other_end_time: other_end,
        }
    }

    pub fn is_gap(&self) -> bool {
        self.edge_type.is_gap()
    }

    /// A gap edge whose span has no far end.
    pub fn is_unbounded_gap(&self) -> bool {
        self.is_gap() && self.gap_other_end_time.is_none()
    }

    pub fn select(&self, trim_type: TrimType) -> SelectedEdge {
        SelectedEdge::new(self.clip_id.clone(), self.edge_type, trim_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Boundary {
    pub time: RationalTime,
    pub pixel_x: f64,
    pub left: Option<EdgeRef>,
    pub right: Option<EdgeRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoundaryModel {
    boundaries: Vec<Boundary>,
}

impl BoundaryModel {
    pub fn build(clips: &[Clip], projector: &dyn TimeToPixel, viewport_width: f64) -> Self {
        let mut sorted: Vec<&Clip> = clips.iter().collect();
        sorted.sort_by(|a, b| {
            a.timeline_start
                .cmp(&b.timeline_start)
                .then_with(|| a.id.cmp(&b.id))
        });

        // Keyed by exact time so a shared edit point collapses into one entry.
        // Where overlapping clips put two edges on one side, a clip edge wins
        // over a gap edge, otherwise the first one written stays.
        let mut points: BTreeMap<RationalTime, (Option<EdgeRef>, Option<EdgeRef>)> =
            BTreeMap::new();
        let mut insert = |time: RationalTime, left: EdgeRef, right: EdgeRef| {
            let entry = points.entry(time).or_insert((None, None));
            merge_side(&mut entry.0, left);
            merge_side(&mut entry.1, right);
        };

        for (index, clip) in sorted.iter().enumerate() {
            let start = clip.timeline_start;
            let end = clip.end();
            let prev = index.checked_sub(1).map(|i| sorted[i]);
            let next = sorted.get(index + 1).copied();

            let start_left = match prev {
                Some(p) if p.end() == start => EdgeRef::clip_edge(p.id.clone(), EdgeType::Out),
                Some(p) => EdgeRef::gap_edge(clip.id.clone(), EdgeType::GapBefore, Some(p.end())),
                None => EdgeRef::gap_edge(
                    clip.id.clone(),
                    EdgeType::GapBefore,
                    Some(RationalTime::zero(start.fps)),
                ),
            };
            insert(
                start,
                start_left,
                EdgeRef::clip_edge(clip.id.clone(), EdgeType::In),
            );

            let end_right = match next {
                Some(n) if n.timeline_start == end => {
                    EdgeRef::clip_edge(n.id.clone(), EdgeType::In)
                }
                Some(n) => {
                    EdgeRef::gap_edge(clip.id.clone(), EdgeType::GapAfter, Some(n.timeline_start))
                }
                None => EdgeRef::gap_edge(clip.id.clone(), EdgeType::GapAfter, None),
            };
            insert(
                end,
                EdgeRef::clip_edge(clip.id.clone(), EdgeType::Out),
                end_right,
            );
        }

        let boundaries: Vec<Boundary> = points
            .into_iter()
            .map(|(time, (left, right))| Boundary {
                time,
                pixel_x: projector.time_to_pixel(&time, viewport_width),
                left,
                right,
            })
            .collect();
        trace!(
            clips = clips.len(),
            boundaries = boundaries.len(),
            "built boundary model"
        );
        Self { boundaries }
    }

    /// Boundaries in ascending time order.
    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    pub fn into_boundaries(self) -> Vec<Boundary> {
        self.boundaries
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn at_time(&self, time: &RationalTime) -> Option<&Boundary> {
        self.boundaries.iter().find(|b| b.time == *time)
    }

    /// Closest boundary within `max_distance` pixels of `cursor_x`, with its distance.
    /// Equal distances resolve to the later boundary.
    pub fn nearest(&self, cursor_x: f64, max_distance: f64) -> Option<(&Boundary, f64)> {
        let mut best: Option<(&Boundary, f64)> = None;
        for boundary in &self.boundaries {
            let distance = (cursor_x - boundary.pixel_x).abs();
            if distance > max_distance {
                continue;
            }
            match best {
                Some((_, best_distance)) if distance > best_distance => {}
                _ => best = Some((boundary, distance)),
            }
        }
        best
    }
}

fn merge_side(slot: &mut Option<EdgeRef>, edge: EdgeRef) {
    match slot {
        Some(existing) if existing.is_gap() && !edge.is_gap() => *existing = edge,
        Some(_) => {}
        None => *slot = Some(edge),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fps, TrackId};

    fn frames(n: i64) -> RationalTime {
        RationalTime::new(n, Fps::FPS_30)
    }

    fn clip(id: &str, start: i64, duration: i64) -> Clip {
        Clip::new(id, TrackId::from("v1"), frames(start), frames(duration)).unwrap()
    }

    fn one_px_per_frame(t: &RationalTime, _width: f64) -> f64 {
        t.rescale_to(Fps::FPS_30).frames as f64
    }

    fn build(clips: &[Clip]) -> BoundaryModel {
        BoundaryModel::build(clips, &one_px_per_frame, 1000.0)
    }

    #[test]
    fn adjacent_clips_share_one_boundary() {
        let model = build(&[clip("B", 100, 50), clip("A", 0, 100)]);
        assert_eq!(model.len(), 3);

        let junction = model.at_time(&frames(100)).unwrap();
        let left = junction.left.as_ref().unwrap();
        let right = junction.right.as_ref().unwrap();
        assert_eq!((left.clip_id.as_str(), left.edge_type), ("A", EdgeType::Out));
        assert_eq!((right.clip_id.as_str(), right.edge_type), ("B", EdgeType::In));
        assert_eq!(junction.pixel_x, 100.0);
    }

    #[test]
    fn lone_clip_is_bracketed_by_gaps() {
        let model = build(&[clip("C", 20, 30)]);
        let start = model.at_time(&frames(20)).unwrap();
        let end = model.at_time(&frames(50)).unwrap();

        let gap_before = start.left.as_ref().unwrap();
        assert_eq!(gap_before.edge_type, EdgeType::GapBefore);
        assert_eq!(gap_before.gap_other_end_time, Some(frames(0)));
        assert_eq!(start.right.as_ref().unwrap().edge_type, EdgeType::In);

        let gap_after = end.right.as_ref().unwrap();
        assert_eq!(gap_after.edge_type, EdgeType::GapAfter);
        assert!(gap_after.is_unbounded_gap());
        assert_eq!(end.left.as_ref().unwrap().edge_type, EdgeType::Out);
    }

    #[test]
    fn gap_edges_carry_far_end() {
        let model = build(&[clip("A", 0, 50), clip("B", 80, 20)]);
        assert_eq!(model.len(), 4);

        let a_end = model.at_time(&frames(50)).unwrap();
        let gap_after = a_end.right.as_ref().unwrap();
        assert_eq!(gap_after.clip_id.as_str(), "A");
        assert_eq!(gap_after.gap_other_end_time, Some(frames(80)));

        let b_start = model.at_time(&frames(80)).unwrap();
        let gap_before = b_start.left.as_ref().unwrap();
        assert_eq!(gap_before.clip_id.as_str(), "B");
        assert_eq!(gap_before.gap_other_end_time, Some(frames(50)));
    }

    #[test]
    fn mixed_rates_collapse_on_exact_time() {
        let a = clip("A", 0, 30);
        let b = Clip::new(
            "B",
            TrackId::from("v1"),
            RationalTime::new(24, Fps::FPS_24),
            RationalTime::new(24, Fps::FPS_24),
        )
        .unwrap();
        let model = build(&[a, b]);
        let junction = model.at_time(&frames(30)).unwrap();
        assert_eq!(junction.left.as_ref().unwrap().edge_type, EdgeType::Out);
        assert_eq!(junction.right.as_ref().unwrap().clip_id.as_str(), "B");
    }

    #[test]
    fn overlap_keeps_clip_edges_over_gaps() {
        // B sits inside A, so C's start meets A's end after a gap_after(A) was written.
        let model = build(&[clip("A", 0, 100), clip("B", 50, 10), clip("C", 100, 50)]);
        let junction = model.at_time(&frames(100)).unwrap();
        let left = junction.left.as_ref().unwrap();
        let right = junction.right.as_ref().unwrap();
        assert_eq!((left.clip_id.as_str(), left.edge_type), ("A", EdgeType::Out));
        assert_eq!((right.clip_id.as_str(), right.edge_type), ("C", EdgeType::In));
    }

    #[test]
    fn nearest_prefers_closer_then_later() {
        let model = build(&[clip("A", 0, 10), clip("B", 20, 10)]);
        let (hit, distance) = model.nearest(12.0, 5.0).unwrap();
        assert_eq!(hit.time, frames(10));
        assert_eq!(distance, 2.0);

        let (tie, _) = model.nearest(15.0, 5.0).unwrap();
        assert_eq!(tie.time, frames(20));

        assert!(model.nearest(200.0, 5.0).is_none());
        assert!(build(&[]).is_empty());
    }
}
