//! Edge selection and trim/roll constraint engine for the timeline.
//!
//! Pointer-down runs [`pick_edges`] (or [`find_best_roll_pair`]) against a fresh
//! [`BoundaryModel`] of one track. Every pointer-move during the drag runs
//! [`build_preview_edges`] with the constraints fetched from the command layer,
//! and the renderer draws [`compute_preview_geometry`] for each affected clip.
//! Nothing here mutates timeline state or keeps memory between calls.

use thiserror::Error;

mod boundary;
pub use boundary::*;
mod clip;
pub use clip::*;
mod config;
pub use config::*;
mod drag;
pub use drag::*;
mod edge;
pub use edge::*;
mod edge_picker;
pub use edge_picker::*;
mod rational;
pub use rational::*;
mod roll_pair;
pub use roll_pair::*;
mod selection;
pub use selection::*;
pub mod timecode;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("invalid frame rate {num}/{den}: both components must be positive")]
    InvalidRate { num: i64, den: i64 },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid clip: {0}")]
    InvalidClip(String),
    #[error("invalid edge key: {0}")]
    InvalidEdgeKey(String),
    #[error("invalid timecode: {0}")]
    InvalidTimecode(String),
}
