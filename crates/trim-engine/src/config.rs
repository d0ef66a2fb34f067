//! Pixel thresholds for edge picking and the edge colour table.
//!
//! The zone constants have no defaults: a picker with an undefined hit zone
//! fails with [`TimelineError::Configuration`] instead of silently using zero.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::TimelineError;

/// Raw pick thresholds as supplied by the host. Every field is required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PickOptions {
    pub edge_zone_px: Option<f64>,
    pub roll_zone_px: Option<f64>,
    pub min_edge_selectable_width_px: Option<f64>,
}

/// Validated pick thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeZones {
    /// Maximum cursor distance to a boundary for it to be hit.
    pub edge_zone_px: f64,
    /// Full width of the roll zone centred on a boundary.
    pub roll_zone_px: f64,
    /// Elements narrower than this on screen do not offer their edges.
    pub min_edge_selectable_width_px: f64,
}

impl PickOptions {
    pub fn new(edge_zone_px: f64, roll_zone_px: f64, min_edge_selectable_width_px: f64) -> Self {
        Self {
            edge_zone_px: Some(edge_zone_px),
            roll_zone_px: Some(roll_zone_px),
            min_edge_selectable_width_px: Some(min_edge_selectable_width_px),
        }
    }

    pub fn validate(&self) -> Result<EdgeZones, TimelineError> {
        Ok(EdgeZones {
            edge_zone_px: required("edge_zone_px", self.edge_zone_px)?,
            roll_zone_px: required("roll_zone_px", self.roll_zone_px)?,
            min_edge_selectable_width_px: required(
                "min_edge_selectable_width_px",
                self.min_edge_selectable_width_px,
            )?,
        })
    }
}

fn required(name: &str, value: Option<f64>) -> Result<f64, TimelineError> {
    match value {
        None => Err(TimelineError::Configuration(format!("{name} is required"))),
        Some(v) if !v.is_finite() || v <= 0.0 => Err(TimelineError::Configuration(format!(
            "{name} must be a positive pixel count, got {v}"
        ))),
        Some(v) => Ok(v),
    }
}

impl EdgeZones {
    /// Half-width of the roll zone: `max(1, floor(roll_zone_px / 2))`.
    pub fn roll_half_width(&self) -> f64 {
        (self.roll_zone_px / 2.0).floor().max(1.0)
    }
}

/// Colours for dragged edge handles, as `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeColors {
    pub available: String,
    pub limit: String,
}

impl Default for EdgeColors {
    fn default() -> Self {
        Self {
            available: "#4caf50".to_string(),
            limit: "#f44336".to_string(),
        }
    }
}

impl EdgeColors {
    pub fn for_limit(&self, at_limit: bool) -> &str {
        if at_limit {
            &self.limit
        } else {
            &self.available
        }
    }
}

/// Host configuration for the trim tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrimConfig {
    #[serde(flatten)]
    pub pick: PickOptions,
    #[serde(default)]
    pub colors: EdgeColors,
}

impl TrimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TimelineError> {
        serde_json::from_str(json)
            .map_err(|e| TimelineError::Configuration(format!("malformed trim config: {e}")))
    }

    pub fn from_path(path: &Path) -> Result<Self, TimelineError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TimelineError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// The pick zones, validated.
    pub fn zones(&self) -> Result<EdgeZones, TimelineError> {
        self.pick.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_zone_is_a_configuration_error() {
        let options = PickOptions {
            edge_zone_px: Some(8.0),
            roll_zone_px: None,
            min_edge_selectable_width_px: Some(4.0),
        };
        let err = options.validate().unwrap_err();
        assert!(matches!(
            err,
            TimelineError::Configuration(ref msg) if msg.contains("roll_zone_px")
        ));
    }

    #[test]
    fn non_positive_zone_is_rejected() {
        assert!(PickOptions::new(0.0, 6.0, 4.0).validate().is_err());
        assert!(PickOptions::new(8.0, f64::NAN, 4.0).validate().is_err());
        assert!(PickOptions::new(8.0, 6.0, 4.0).validate().is_ok());
    }

    #[test]
    fn roll_half_width_has_floor_of_one() {
        let zones = PickOptions::new(8.0, 7.0, 4.0).validate().unwrap();
        assert_eq!(zones.roll_half_width(), 3.0);
        let narrow = PickOptions::new(8.0, 1.0, 4.0).validate().unwrap();
        assert_eq!(narrow.roll_half_width(), 1.0);
    }

    #[test]
    fn config_parses_flat_json() {
        let config = TrimConfig::from_json_str(
            r##"{"edge_zone_px": 10, "roll_zone_px": 6, "min_edge_selectable_width_px": 3,
                "colors": {"limit": "#ff0000"}}"##,
        )
        .unwrap();
        let zones = config.zones().unwrap();
        assert_eq!(zones.edge_zone_px, 10.0);
        assert_eq!(config.colors.limit, "#ff0000");
        assert_eq!(config.colors.available, EdgeColors::default().available);

        let partial = TrimConfig::from_json_str(r#"{"edge_zone_px": 10}"#).unwrap();
        assert!(partial.zones().is_err());
        assert!(TrimConfig::from_json_str("{").is_err());
    }
}
