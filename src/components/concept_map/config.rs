use serde::{Deserialize, Serialize};

use super::geometry::GeometryConfig;
use super::interaction::ClickDelays;
use super::links::LinkUniqueness;
use super::persistence::PersistenceConfig;
use super::viewport::ZoomConfig;

/// Defaults for concepts placed by clicking the background.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewShapeConfig {
	pub width: f64,
	pub height: f64,
	pub text_scale: f64,
	/// Offset from the click point to the new concept's top-left corner.
	pub offset_x: f64,
	pub offset_y: f64,
}

impl Default for NewShapeConfig {
	fn default() -> Self {
		Self {
			width: 160.0,
			height: 120.0,
			text_scale: 12.0,
			offset_x: -100.0,
			offset_y: -50.0,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
	pub geometry: GeometryConfig,
	pub zoom: ZoomConfig,
	pub concept_click_delay_ms: f64,
	pub link_click_delay_ms: f64,
	pub link_uniqueness: LinkUniqueness,
	pub canvas_width: f64,
	pub canvas_height: f64,
	pub new_shape: NewShapeConfig,
	/// How close, in canvas units, a click must land to select a link.
	pub link_hit_tolerance: f64,
	/// Pointer travel, in screen pixels, that turns a press into a drag.
	pub drag_threshold: f64,
	/// Size of the corner handle that resizes a concept.
	pub resize_handle: f64,
	pub persistence: PersistenceConfig,
}

impl Default for EditorConfig {
	fn default() -> Self {
		Self {
			geometry: GeometryConfig::default(),
			zoom: ZoomConfig::default(),
			concept_click_delay_ms: 500.0,
			link_click_delay_ms: 200.0,
			link_uniqueness: LinkUniqueness::default(),
			canvas_width: 3000.0,
			canvas_height: 2000.0,
			new_shape: NewShapeConfig::default(),
			link_hit_tolerance: 8.0,
			drag_threshold: 3.0,
			resize_handle: 14.0,
			persistence: PersistenceConfig::default(),
		}
	}
}

impl EditorConfig {
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	pub fn click_delays(&self) -> ClickDelays {
		ClickDelays {
			shape_ms: self.concept_click_delay_ms,
			link_ms: self.link_click_delay_ms,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config = EditorConfig::from_json(
			r#"{"concept_click_delay_ms": 300, "link_uniqueness": "per-pair",
			    "geometry": {"render_bidirectional_arrows": true}}"#,
		)
		.unwrap();
		assert_eq!(config.concept_click_delay_ms, 300.0);
		assert_eq!(config.link_click_delay_ms, 200.0);
		assert_eq!(config.link_uniqueness, LinkUniqueness::PerPair);
		assert!(config.geometry.render_bidirectional_arrows);
		assert_eq!(config.geometry.arrow_inset, 100.0);
		assert_eq!(config.zoom, ZoomConfig::default());
	}
}
