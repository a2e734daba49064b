//! Slider positions to concept shapes and link strengths, and the
//! presentation attributes each shape class draws with.

use super::types::{ShapeClass, Strength};

pub const SLIDE_MIN: i32 = 0;
pub const SLIDE_MAX: i32 = 6;
pub const NEUTRAL_SLIDE_VALUE: u8 = 3;

/// Slider scale from negative-strong to positive-strong.
const SCALE: [ShapeClass; 7] = [
	ShapeClass::HexagonNegStrong,
	ShapeClass::HexagonNeg,
	ShapeClass::HexagonNegWeak,
	ShapeClass::Rectangle,
	ShapeClass::RoundedWeak,
	ShapeClass::RoundedNormal,
	ShapeClass::RoundedStrong,
];

const STRENGTHS: [Strength; 3] = [Strength::Weak, Strength::Normal, Strength::Strong];

/// Anything off the scale is ambivalent.
pub fn shape_class_for(slide: i32) -> ShapeClass {
	usize::try_from(slide)
		.ok()
		.and_then(|i| SCALE.get(i))
		.copied()
		.unwrap_or(ShapeClass::Ambivalent)
}

/// Ambivalent concepts open the slider at the neutral position; the
/// ambivalence toggle carries their state.
pub fn slide_value_for(class: ShapeClass) -> u8 {
	SCALE
		.iter()
		.position(|c| *c == class)
		.map_or(NEUTRAL_SLIDE_VALUE, |i| i as u8)
}

/// Link strength slider: 0 weak, 1 normal, 2 strong. Anything else is normal.
pub fn strength_for(slide: i32) -> Strength {
	usize::try_from(slide)
		.ok()
		.and_then(|i| STRENGTHS.get(i))
		.copied()
		.unwrap_or(Strength::Normal)
}

pub fn strength_slide_value(strength: Strength) -> u8 {
	match strength {
		Strength::Weak => 0,
		Strength::Normal => 1,
		Strength::Strong => 2,
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outline {
	Hexagon,
	Rectangle,
	Rounded,
	HexagonCircle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
	Negative,
	Neutral,
	Positive,
	Ambivalent,
}

impl ShapeClass {
	/// Class names used by the stylesheet of the classic editor.
	pub fn css_class(self) -> &'static str {
		match self {
			ShapeClass::HexagonNegStrong => "hexagonNegStrong",
			ShapeClass::HexagonNeg => "hexagonNeg",
			ShapeClass::HexagonNegWeak => "hexagonNegWeak",
			ShapeClass::Rectangle => "rectangle",
			ShapeClass::RoundedWeak => "rounded-circle-weak",
			ShapeClass::RoundedNormal => "rounded-circle-normal",
			ShapeClass::RoundedStrong => "rounded-circle-strong",
			ShapeClass::Ambivalent => "hexagonAmb hexagonAmbCircle",
		}
	}

	pub fn outline(self) -> Outline {
		match self {
			ShapeClass::HexagonNegStrong | ShapeClass::HexagonNeg | ShapeClass::HexagonNegWeak => {
				Outline::Hexagon
			}
			ShapeClass::Rectangle => Outline::Rectangle,
			ShapeClass::RoundedWeak | ShapeClass::RoundedNormal | ShapeClass::RoundedStrong => {
				Outline::Rounded
			}
			ShapeClass::Ambivalent => Outline::HexagonCircle,
		}
	}

	pub fn polarity(self) -> Polarity {
		match self.outline() {
			Outline::Hexagon => Polarity::Negative,
			Outline::Rectangle => Polarity::Neutral,
			Outline::Rounded => Polarity::Positive,
			Outline::HexagonCircle => Polarity::Ambivalent,
		}
	}

	pub fn border_width(self) -> f64 {
		match self {
			ShapeClass::HexagonNegStrong | ShapeClass::RoundedStrong => 4.0,
			ShapeClass::HexagonNeg | ShapeClass::RoundedNormal | ShapeClass::Ambivalent => 3.0,
			ShapeClass::HexagonNegWeak | ShapeClass::RoundedWeak | ShapeClass::Rectangle => 2.0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn slider_round_trips() {
		for v in SLIDE_MIN..=SLIDE_MAX {
			assert_eq!(slide_value_for(shape_class_for(v)) as i32, v);
		}
	}

	#[test]
	fn scale_order() {
		assert_eq!(shape_class_for(0), ShapeClass::HexagonNegStrong);
		assert_eq!(shape_class_for(3), ShapeClass::Rectangle);
		assert_eq!(shape_class_for(6), ShapeClass::RoundedStrong);
	}

	#[test]
	fn off_scale_is_ambivalent() {
		for v in [-1, 7, i32::MIN, i32::MAX] {
			assert_eq!(shape_class_for(v), ShapeClass::Ambivalent);
		}
		assert_eq!(slide_value_for(ShapeClass::Ambivalent), NEUTRAL_SLIDE_VALUE);
	}

	#[test]
	fn strength_slider() {
		assert_eq!(strength_for(0), Strength::Weak);
		assert_eq!(strength_for(1), Strength::Normal);
		assert_eq!(strength_for(2), Strength::Strong);
		assert_eq!(strength_for(9), Strength::Normal);
		for strength in STRENGTHS {
			assert_eq!(strength_for(strength_slide_value(strength) as i32), strength);
		}
	}

	#[test]
	fn presentation_follows_polarity() {
		assert_eq!(ShapeClass::HexagonNegWeak.polarity(), Polarity::Negative);
		assert_eq!(ShapeClass::RoundedNormal.outline(), Outline::Rounded);
		assert_eq!(ShapeClass::Ambivalent.outline(), Outline::HexagonCircle);
		assert!(ShapeClass::RoundedStrong.border_width() > ShapeClass::RoundedWeak.border_width());
	}
}
