use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};
use uuid::Uuid;

use crate::{RationalTime, TimelineError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClipId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ClipId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Read-only projection of a clip as the timeline store last published it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawClip")]
pub struct Clip {
    pub id: ClipId,
    pub track_id: TrackId,
    pub timeline_start: RationalTime,
    pub duration: RationalTime,
}

#[derive(Deserialize)]
struct RawClip {
    #[serde(default)]
    id: ClipId,
    track_id: TrackId,
    timeline_start: RationalTime,
    duration: RationalTime,
}

impl TryFrom<RawClip> for Clip {
    type Error = TimelineError;

    fn try_from(raw: RawClip) -> Result<Self, Self::Error> {
        Clip::new(raw.id, raw.track_id, raw.timeline_start, raw.duration)
    }
}

impl Clip {
    pub fn new(
        id: impl Into<ClipId>,
        track_id: TrackId,
        timeline_start: RationalTime,
        duration: RationalTime,
    ) -> Result<Self, TimelineError> {
        let id = id.into();
        if duration.frames <= 0 {
            return Err(TimelineError::InvalidClip(format!(
                "clip {id} has non-positive duration {duration}"
            )));
        }
        Ok(Self {
            id,
            track_id,
            timeline_start,
            duration,
        })
    }

    pub fn end(&self) -> RationalTime {
        self.timeline_start + self.duration
    }
}

/// Maps a timeline time to a horizontal pixel for one render frame.
pub trait TimeToPixel {
    fn time_to_pixel(&self, time: &RationalTime, viewport_width: f64) -> f64;
}

impl<F> TimeToPixel for F
where
    F: Fn(&RationalTime, f64) -> f64,
{
    fn time_to_pixel(&self, time: &RationalTime, viewport_width: f64) -> f64 {
        self(time, viewport_width)
    }
}

/// The visible time window of a track; projects linearly onto the widget width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub start: RationalTime,
    pub duration: RationalTime,
}

impl Viewport {
    pub fn new(start: RationalTime, duration: RationalTime) -> Result<Self, TimelineError> {
        if duration.frames <= 0 {
            return Err(TimelineError::Configuration(format!(
                "viewport duration must be positive, got {duration}"
            )));
        }
        Ok(Self { start, duration })
    }

    pub fn pixel_to_time(&self, x: f64, viewport_width: f64, fps: crate::Fps) -> RationalTime {
        let seconds = if viewport_width > 0.0 {
            self.start.to_seconds_f64() + x / viewport_width * self.duration.to_seconds_f64()
        } else {
            self.start.to_seconds_f64()
        };
        RationalTime::from_seconds_f64(seconds, fps)
    }
}

impl TimeToPixel for Viewport {
    fn time_to_pixel(&self, time: &RationalTime, viewport_width: f64) -> f64 {
        let offset = (*time - self.start).to_seconds_f64();
        offset / self.duration.to_seconds_f64() * viewport_width
    }
}

/// Supplies the clip snapshot of one track. Implementations must not hand out
/// state the engine could mutate.
pub trait ClipSource {
    fn clips_for_track(&self, track_id: &TrackId) -> Vec<Clip>;
}

/// In-memory snapshot of every track, grouped from a flat clip list.
#[derive(Debug, Clone, Default)]
pub struct TrackSnapshot {
    tracks: HashMap<TrackId, Vec<Clip>>,
}

impl TrackSnapshot {
    pub fn from_clips(clips: impl IntoIterator<Item = Clip>) -> Self {
        let mut tracks: HashMap<TrackId, Vec<Clip>> = HashMap::new();
        for clip in clips {
            tracks.entry(clip.track_id.clone()).or_default().push(clip);
        }
        Self { tracks }
    }

    pub fn track_ids(&self) -> impl Iterator<Item = &TrackId> {
        self.tracks.keys()
    }
}

impl ClipSource for TrackSnapshot {
    fn clips_for_track(&self, track_id: &TrackId) -> Vec<Clip> {
        self.tracks.get(track_id).cloned().unwrap_or_default()
    }
}
