//! Maps a cursor position on one track to the edge(s) a trim gesture grabs.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::{
    Boundary, BoundaryModel, Clip, ClipId, EdgeRef, EdgeType, PickOptions, RationalTime,
    SelectedEdge, TimeToPixel, TimelineError, TrimType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// Where the cursor sits relative to the hit boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickZone {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeCandidate {
    pub side: Side,
    pub edge: EdgeRef,
    /// On-screen width of the clip or gap this edge belongs to; `None` when unbounded.
    pub width_px: Option<f64>,
    pub selectable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PickResult {
    pub selection: Vec<SelectedEdge>,
    pub roll_used: bool,
    pub candidates: Vec<EdgeCandidate>,
    pub boundary: Option<Boundary>,
    pub boundaries: Vec<Boundary>,
    pub distance: Option<f64>,
    pub zone: Option<PickZone>,
    /// Lead edge for the drag's delta sign.
    pub dragged_edge: Option<SelectedEdge>,
}

impl PickResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// No edit affordance under the cursor.
    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }
}

/// Projection state for the current render frame.
#[derive(Clone, Copy)]
pub struct PickGeometry<'a> {
    pub projector: &'a dyn TimeToPixel,
    pub viewport_width: f64,
}

impl<'a> PickGeometry<'a> {
    pub fn new(projector: &'a dyn TimeToPixel, viewport_width: f64) -> Self {
        Self {
            projector,
            viewport_width,
        }
    }
}

/// Pick the edge or roll pair under `cursor_x`.
///
/// Zone options are validated first and fail with a configuration error.
/// A missing projector, a non-positive viewport width or an empty track is the
/// "not yet renderable" state and yields an empty result.
pub fn pick_edges(
    clips: &[Clip],
    cursor_x: f64,
    geometry: Option<PickGeometry<'_>>,
    options: &PickOptions,
) -> Result<PickResult, TimelineError> {
    let zones = options.validate()?;

    let Some(geometry) = geometry else {
        return Ok(PickResult::empty());
    };
    let width = geometry.viewport_width;
    if clips.is_empty() || !width.is_finite() || width <= 0.0 || !cursor_x.is_finite() {
        return Ok(PickResult::empty());
    }

    let model = BoundaryModel::build(clips, geometry.projector, width);
    let Some((hit, distance)) = model.nearest(cursor_x, zones.edge_zone_px) else {
        debug!(cursor_x, "no boundary within edge zone");
        return Ok(PickResult {
            boundaries: model.into_boundaries(),
            ..PickResult::empty()
        });
    };
    let boundary = hit.clone();

    let by_id: HashMap<&ClipId, &Clip> = clips.iter().map(|c| (&c.id, c)).collect();
    let candidate = |side: Side, edge: &Option<EdgeRef>| {
        edge.as_ref().map(|edge| {
            let width_px = element_width_px(edge, &boundary, &by_id, geometry);
            EdgeCandidate {
                side,
                edge: edge.clone(),
                width_px,
                selectable: width_px.map_or(true, |w| w >= zones.min_edge_selectable_width_px),
            }
        })
    };
    let left = candidate(Side::Left, &boundary.left);
    let right = candidate(Side::Right, &boundary.right);

    let roll_eligible = match (&left, &right) {
        (Some(l), Some(r)) => {
            l.selectable
                && r.selectable
                && !l.edge.is_unbounded_gap()
                && !r.edge.is_unbounded_gap()
                && (l.edge.clip_id != r.edge.clip_id || l.edge.is_gap() || r.edge.is_gap())
        }
        _ => false,
    };

    let offset = cursor_x - boundary.pixel_x;
    let zone = if offset.abs() <= zones.roll_half_width() {
        PickZone::Center
    } else if offset < 0.0 {
        PickZone::Left
    } else {
        PickZone::Right
    };
    // Exactly on the boundary counts as the right side.
    let cursor_side = if offset < 0.0 { Side::Left } else { Side::Right };

    let on_side = |side: Side| {
        let candidate = match side {
            Side::Left => &left,
            Side::Right => &right,
        };
        candidate
            .as_ref()
            .filter(|c| c.selectable)
            .map(|c| c.edge.clone())
    };
    let other = |side: Side| match side {
        Side::Left => Side::Right,
        Side::Right => Side::Left,
    };

    let mut roll_used = false;
    let (selection, dragged_edge) = match zone {
        PickZone::Center if roll_eligible => {
            roll_used = true;
            let pair: Vec<SelectedEdge> = [&left, &right]
                .into_iter()
                .flatten()
                .map(|c| c.edge.select(TrimType::Roll))
                .collect();
            let lead = match cursor_side {
                Side::Left => pair[0].clone(),
                Side::Right => pair[1].clone(),
            };
            (pair, Some(lead))
        }
        PickZone::Center => {
            // Clip handles win over gap handles; then the cursor's side.
            let picked = [cursor_side, other(cursor_side)]
                .into_iter()
                .filter_map(on_side)
                .min_by_key(|edge| edge.is_gap());
            ripple(picked)
        }
        PickZone::Left => ripple(on_side(Side::Left)),
        PickZone::Right => ripple(on_side(Side::Right)),
    };

    debug!(
        cursor_x,
        boundary = %boundary.time,
        ?zone,
        roll_used,
        picked = selection.len(),
        "picked edges"
    );

    Ok(PickResult {
        selection,
        roll_used,
        candidates: left.into_iter().chain(right).collect(),
        boundary: Some(boundary),
        boundaries: model.into_boundaries(),
        distance: Some(distance),
        zone: Some(zone),
        dragged_edge,
    })
}

fn ripple(edge: Option<EdgeRef>) -> (Vec<SelectedEdge>, Option<SelectedEdge>) {
    match edge {
        Some(edge) => {
            let selected = edge.select(TrimType::Ripple);
            (vec![selected.clone()], Some(selected))
        }
        None => (Vec::new(), None),
    }
}

/// Pixel width of the clip or gap `edge` belongs to. Unbounded gaps have none.
fn element_width_px(
    edge: &EdgeRef,
    boundary: &Boundary,
    clips: &HashMap<&ClipId, &Clip>,
    geometry: PickGeometry<'_>,
) -> Option<f64> {
    let px = |t: &RationalTime| geometry.projector.time_to_pixel(t, geometry.viewport_width);
    match edge.edge_type {
        EdgeType::In | EdgeType::Out => clips
            .get(&edge.clip_id)
            .map(|clip| px(&clip.end()) - px(&clip.timeline_start)),
        EdgeType::GapBefore => edge
            .gap_other_end_time
            .map(|other| boundary.pixel_x - px(&other)),
        EdgeType::GapAfter => edge
            .gap_other_end_time
            .map(|other| px(&other) - boundary.pixel_x),
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

    /// Two pixels per frame at 30fps.
    fn projector(t: &RationalTime, _width: f64) -> f64 {
        t.rescale_to(Fps::FPS_30).frames as f64 * 2.0
    }

    fn options() -> PickOptions {
        PickOptions::new(10.0, 8.0, 6.0)
    }

    fn pick(clips: &[Clip], cursor_x: f64) -> PickResult {
        pick_with(clips, cursor_x, &options())
    }

    fn pick_with(clips: &[Clip], cursor_x: f64, options: &PickOptions) -> PickResult {
        pick_edges(
            clips,
            cursor_x,
            Some(PickGeometry::new(&projector, 1000.0)),
            options,
        )
        .unwrap()
    }

    fn edges(result: &PickResult) -> Vec<(String, EdgeType, TrimType)> {
        result
            .selection
            .iter()
            .map(|e| (e.clip_id.to_string(), e.edge_type, e.trim_type))
            .collect()
    }

    #[test]
    fn roll_between_adjacent_clips() {
        let clips = [clip("A", 0, 100), clip("B", 100, 50)];
        let result = pick(&clips, 200.0);
        assert!(result.roll_used);
        assert_eq!(
            edges(&result),
            vec![
                ("A".to_string(), EdgeType::Out, TrimType::Roll),
                ("B".to_string(), EdgeType::In, TrimType::Roll),
            ]
        );
        assert_eq!(result.zone, Some(PickZone::Center));
        assert_eq!(result.distance, Some(0.0));
        // Exactly on the boundary leads with the right edge.
        assert_eq!(result.dragged_edge.as_ref().unwrap().clip_id.as_str(), "B");
        assert_eq!(result.candidates.len(), 2);
    }

    #[test]
    fn roll_lead_follows_cursor_side() {
        let clips = [clip("A", 0, 100), clip("B", 100, 50)];
        let result = pick(&clips, 197.0);
        assert!(result.roll_used);
        assert_eq!(result.dragged_edge.unwrap().edge_type, EdgeType::Out);
    }

    #[test]
    fn outside_center_picks_cursor_side_only() {
        let clips = [clip("A", 0, 100), clip("B", 100, 50)];
        let left = pick(&clips, 192.0);
        assert_eq!(
            edges(&left),
            vec![("A".to_string(), EdgeType::Out, TrimType::Ripple)]
        );
        assert_eq!(left.zone, Some(PickZone::Left));

        let right = pick(&clips, 207.0);
        assert_eq!(
            edges(&right),
            vec![("B".to_string(), EdgeType::In, TrimType::Ripple)]
        );
    }

    #[test]
    fn narrow_side_is_not_replaced_by_its_neighbour() {
        // A is two frames wide: four pixels, under the six pixel minimum.
        // A one pixel roll half-width lets the cursor sit left of A's tail
        // while still being nearer to it than to A's head.
        let clips = [clip("A", 0, 2), clip("B", 2, 100)];
        let result = pick_with(&clips, 2.5, &PickOptions::new(10.0, 2.0, 6.0));
        assert!(result.is_empty());
        assert_eq!(result.zone, Some(PickZone::Left));
        assert!(result.boundary.is_some());
    }

    #[test]
    fn center_hit_without_roll_degrades_to_selectable_side() {
        let clips = [clip("A", 0, 2), clip("B", 2, 100)];
        // Cursor slightly left of the 4px boundary, inside the roll zone.
        let result = pick(&clips, 2.0);
        assert!(!result.roll_used);
        assert_eq!(
            edges(&result),
            vec![("B".to_string(), EdgeType::In, TrimType::Ripple)]
        );
    }

    #[test]
    fn lone_clip_end_is_a_ripple() {
        let clips = [clip("C", 0, 50)];
        let result = pick(&clips, 100.0);
        assert!(!result.roll_used);
        assert_eq!(
            edges(&result),
            vec![("C".to_string(), EdgeType::Out, TrimType::Ripple)]
        );

        let past_end = pick(&clips, 106.0);
        assert_eq!(past_end.zone, Some(PickZone::Right));
        assert_eq!(
            edges(&past_end),
            vec![("C".to_string(), EdgeType::GapAfter, TrimType::Ripple)]
        );
    }

    #[test]
    fn bounded_gap_rolls_with_clip_head() {
        let clips = [clip("A", 0, 50), clip("B", 80, 20)];
        let result = pick(&clips, 160.0);
        assert!(result.roll_used);
        assert_eq!(
            edges(&result),
            vec![
                ("B".to_string(), EdgeType::GapBefore, TrimType::Roll),
                ("B".to_string(), EdgeType::In, TrimType::Roll),
            ]
        );
    }

    #[test]
    fn first_clip_at_zero_has_no_selectable_gap() {
        let clips = [clip("A", 0, 50)];
        let result = pick(&clips, 0.0);
        assert!(!result.roll_used);
        assert_eq!(
            edges(&result),
            vec![("A".to_string(), EdgeType::In, TrimType::Ripple)]
        );
        let gap = &result.candidates[0];
        assert_eq!(gap.edge.edge_type, EdgeType::GapBefore);
        assert!(!gap.selectable);
    }

    #[test]
    fn far_cursor_returns_boundaries_only() {
        let clips = [clip("A", 0, 100)];
        let result = pick(&clips, 600.0);
        assert!(result.is_empty());
        assert!(result.boundary.is_none());
        assert_eq!(result.boundaries.len(), 2);
    }

    #[test]
    fn missing_inputs_yield_empty_results() {
        let clips = [clip("A", 0, 100)];
        let none = pick_edges(&clips, 0.0, None, &options()).unwrap();
        assert!(none.is_empty() && none.boundaries.is_empty());

        let zero_width = pick_edges(
            &clips,
            0.0,
            Some(PickGeometry::new(&projector, 0.0)),
            &options(),
        )
        .unwrap();
        assert!(zero_width.is_empty());

        let no_clips = pick(&[], 0.0);
        assert!(no_clips.is_empty());
    }

    #[test]
    fn missing_zone_fails_even_without_geometry() {
        let options = PickOptions {
            edge_zone_px: None,
            ..PickOptions::new(10.0, 8.0, 6.0)
        };
        let err = pick_edges(&[], 0.0, None, &options).unwrap_err();
        assert!(matches!(err, TimelineError::Configuration(_)));
    }
}
