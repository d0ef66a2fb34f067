use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{ClipId, TimelineError};

/// Which handle of a clip an edit grabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// Head of the clip.
    In,
    /// Tail of the clip.
    Out,
    /// Handle between the clip's head and the empty span before it.
    GapBefore,
    /// Handle between the clip's tail and the empty span after it.
    GapAfter,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::GapBefore => "gap_before",
            Self::GapAfter => "gap_after",
        }
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, Self::GapBefore | Self::GapAfter)
    }

    pub fn bracket(&self) -> Bracket {
        match self {
            Self::In | Self::GapBefore => Bracket::Head,
            Self::Out | Self::GapAfter => Bracket::Tail,
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            "gap_before" => Ok(Self::GapBefore),
            "gap_after" => Ok(Self::GapAfter),
            other => Err(TimelineError::InvalidEdgeKey(format!(
                "unknown edge type '{other}'"
            ))),
        }
    }
}

/// Facing of an edge: heads (`[`) open a span, tails (`]`) close one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bracket {
    Head,
    Tail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimType {
    Ripple,
    Roll,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectedEdge {
    pub clip_id: ClipId,
    pub edge_type: EdgeType,
    pub trim_type: TrimType,
}

impl SelectedEdge {
    pub fn new(clip_id: impl Into<ClipId>, edge_type: EdgeType, trim_type: TrimType) -> Self {
        Self {
            clip_id: clip_id.into(),
            edge_type,
            trim_type,
        }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.clip_id.clone(), self.edge_type)
    }

    /// Same clip handle, whatever the trim type.
    pub fn same_edge(&self, other: &SelectedEdge) -> bool {
        self.clip_id == other.clip_id && self.edge_type == other.edge_type
    }
}

/// `clip_id:edge_type`, the key the command layer uses for per-edge constraints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EdgeKey {
    pub clip_id: ClipId,
    pub edge_type: EdgeType,
}

impl EdgeKey {
    pub fn new(clip_id: impl Into<ClipId>, edge_type: EdgeType) -> Self {
        Self {
            clip_id: clip_id.into(),
            edge_type,
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.clip_id, self.edge_type)
    }
}

impl FromStr for EdgeKey {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Clip ids may contain ':' themselves; the edge type never does.
        let (clip, edge) = s
            .rsplit_once(':')
            .ok_or_else(|| TimelineError::InvalidEdgeKey(format!("missing ':' in '{s}'")))?;
        if clip.is_empty() {
            return Err(TimelineError::InvalidEdgeKey(format!(
                "empty clip id in '{s}'"
            )));
        }
        Ok(Self::new(clip, edge.parse()?))
    }
}

impl TryFrom<String> for EdgeKey {
    type Error = TimelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EdgeKey> for String {
    fn from(key: EdgeKey) -> Self {
        key.to_string()
    }
}
