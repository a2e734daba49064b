use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub u32);

impl fmt::Display for ShapeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "block_{}", self.0)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub u32);

impl fmt::Display for LinkId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "link_{}", self.0)
	}
}

/// Axis-aligned extent of a shape in untransformed canvas space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShapeRect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl ShapeRect {
	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	/// Copy with both extents raised to at least `min`. NaN extents become `min`.
	pub fn clamped(&self, min: f64) -> Self {
		Self {
			width: self.width.max(min),
			height: self.height.max(min),
			..*self
		}
	}

	pub fn center(&self) -> (f64, f64) {
		(self.x + 0.5 * self.width, self.y + 0.5 * self.height)
	}

	pub fn contains(&self, px: f64, py: f64) -> bool {
		px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Valence {
	#[default]
	Solid,
	Dashed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strength {
	#[default]
	Weak,
	Normal,
	Strong,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowMode {
	#[default]
	None,
	Uni,
	Bi,
}

impl ArrowMode {
	pub const ALL: [ArrowMode; 3] = [ArrowMode::None, ArrowMode::Uni, ArrowMode::Bi];

	pub fn name(self) -> &'static str {
		match self {
			ArrowMode::None => "none",
			ArrowMode::Uni => "uni",
			ArrowMode::Bi => "bi",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|mode| mode.name() == name)
	}
}

/// Visual class of a concept, one per position of the valence slider plus
/// the ambivalent hybrid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeClass {
	#[serde(rename = "negative strong")]
	HexagonNegStrong,
	#[serde(rename = "negative")]
	HexagonNeg,
	#[serde(rename = "negative weak")]
	HexagonNegWeak,
	#[default]
	#[serde(rename = "neutral")]
	Rectangle,
	#[serde(rename = "positive weak")]
	RoundedWeak,
	#[serde(rename = "positive")]
	RoundedNormal,
	#[serde(rename = "positive strong")]
	RoundedStrong,
	#[serde(rename = "ambivalent")]
	Ambivalent,
}

/// Persisted line style, encoded as `Solid`, `Solid-Strong`, `Dashed-Weak`, ...
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineStyle {
	pub valence: Valence,
	pub strength: Strength,
}

impl fmt::Display for LineStyle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let valence = match self.valence {
			Valence::Solid => "Solid",
			Valence::Dashed => "Dashed",
		};
		match self.strength {
			Strength::Weak => write!(f, "{valence}-Weak"),
			Strength::Normal => f.write_str(valence),
			Strength::Strong => write!(f, "{valence}-Strong"),
		}
	}
}

impl FromStr for LineStyle {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (valence, strength) = match s.split_once('-') {
			Some((valence, "Weak")) => (valence, Strength::Weak),
			Some((valence, "Strong")) => (valence, Strength::Strong),
			Some(_) => return Err(format!("unknown line style `{s}`")),
			None => (s, Strength::Normal),
		};
		let valence = match valence {
			"Solid" => Valence::Solid,
			"Dashed" => Valence::Dashed,
			_ => return Err(format!("unknown line style `{s}`")),
		};
		Ok(Self { valence, strength })
	}
}

impl TryFrom<String> for LineStyle {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<LineStyle> for String {
	fn from(style: LineStyle) -> Self {
		style.to_string()
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LinkStyle {
	pub valence: Valence,
	pub strength: Strength,
	pub arrow_mode: ArrowMode,
}

impl LinkStyle {
	pub fn line_style(&self) -> LineStyle {
		LineStyle {
			valence: self.valence,
			strength: self.strength,
		}
	}

	pub fn from_parts(line_style: LineStyle, arrow_mode: ArrowMode) -> Self {
		Self {
			valence: line_style.valence,
			strength: line_style.strength,
			arrow_mode,
		}
	}
}

/// Partial style update; `None` fields keep their current value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkRestyle {
	pub valence: Option<Valence>,
	pub strength: Option<Strength>,
	pub arrow_mode: Option<ArrowMode>,
}

impl LinkRestyle {
	pub fn apply(&self, style: &mut LinkStyle) {
		if let Some(valence) = self.valence {
			style.valence = valence;
		}
		if let Some(strength) = self.strength {
			style.strength = strength;
		}
		if let Some(arrow_mode) = self.arrow_mode {
			style.arrow_mode = arrow_mode;
		}
	}
}

fn default_text_scale() -> f64 {
	12.0
}

fn default_true() -> bool {
	true
}

/// A concept as the server stores it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
	pub id: ShapeId,
	#[serde(default)]
	pub title: String,
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
	#[serde(default = "default_text_scale")]
	pub text_scale: f64,
	#[serde(default)]
	pub shape: ShapeClass,
	#[serde(default = "default_true")]
	pub note_hidden: bool,
	#[serde(default)]
	pub note: String,
	#[serde(default = "default_true")]
	pub modifiable: bool,
}

/// A link as the server stores it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
	pub id: LinkId,
	pub start_id: ShapeId,
	pub end_id: ShapeId,
	#[serde(default)]
	pub line_style: LineStyle,
	#[serde(default)]
	pub arrow_type: ArrowMode,
}

/// Everything needed to rebuild an editor session on load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
	#[serde(default)]
	pub shapes: Vec<ShapeRecord>,
	#[serde(default)]
	pub links: Vec<LinkRecord>,
}

impl MapSnapshot {
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn line_style_names_round_trip() {
		for name in [
			"Solid",
			"Solid-Strong",
			"Solid-Weak",
			"Dashed",
			"Dashed-Strong",
			"Dashed-Weak",
		] {
			let style: LineStyle = name.parse().unwrap();
			assert_eq!(style.to_string(), name);
		}
		assert!("Dotted".parse::<LineStyle>().is_err());
		assert!("Solid-Heavy".parse::<LineStyle>().is_err());
	}

	#[test]
	fn snapshot_parses_persisted_records() {
		let json = r#"{
			"shapes": [
				{"id": 1, "title": "Stress", "x": 10, "y": 20, "width": 160, "height": 120,
				 "shape": "negative strong", "modifiable": false},
				{"id": 2, "x": 300, "y": 20, "width": 160, "height": 120, "shape": "ambivalent"}
			],
			"links": [
				{"id": 7, "start_id": 1, "end_id": 2, "line_style": "Dashed-Strong", "arrow_type": "uni"}
			]
		}"#;
		let snapshot = MapSnapshot::from_json(json).unwrap();
		assert_eq!(snapshot.shapes.len(), 2);
		assert_eq!(snapshot.shapes[0].shape, ShapeClass::HexagonNegStrong);
		assert!(!snapshot.shapes[0].modifiable);
		assert_eq!(snapshot.shapes[1].text_scale, 12.0);
		assert!(snapshot.shapes[1].modifiable);
		let link = &snapshot.links[0];
		assert_eq!(link.line_style.valence, Valence::Dashed);
		assert_eq!(link.line_style.strength, Strength::Strong);
		assert_eq!(link.arrow_type, ArrowMode::Uni);
	}

	#[test]
	fn clamped_rect_keeps_position() {
		let rect = ShapeRect::new(5.0, 6.0, 0.0, -3.0).clamped(1.0);
		assert_eq!(rect, ShapeRect::new(5.0, 6.0, 1.0, 1.0));
		assert_eq!(rect.center(), (5.5, 6.5));
	}

	#[test]
	fn arrow_mode_names() {
		for mode in ArrowMode::ALL {
			assert_eq!(ArrowMode::from_name(mode.name()), Some(mode));
		}
		assert_eq!(ArrowMode::from_name("both"), None);
	}
}
