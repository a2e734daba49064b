//! Link routing between two rectangular shapes.
//!
//! A link is drawn as a thin horizontal bar that is rotated about its own
//! center. [`compute_segment`] works out where that bar goes: its length,
//! rotation and the top-left corner of the unrotated bar, plus which end
//! carries an arrow glyph and how far each end is pulled back so the glyph
//! does not disappear under a shape.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::types::{ArrowMode, ShapeRect};

/// Extents below this are treated as this.
pub const MIN_EXTENT: f64 = 1.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
	/// Trim applied on the end that carries an arrow glyph.
	pub arrow_inset: f64,
	/// Trim applied opposite a single arrow glyph.
	pub tail_inset: f64,
	/// Draw glyphs on both ends of bidirectional links. Off by default:
	/// bidirectional links currently render as plain lines.
	pub render_bidirectional_arrows: bool,
}

impl Default for GeometryConfig {
	fn default() -> Self {
		Self {
			arrow_inset: 100.0,
			tail_inset: 60.0,
			render_bidirectional_arrows: false,
		}
	}
}

/// How far the bar is pulled back from each canonical end.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ArrowInsets {
	pub start: f64,
	pub end: f64,
}

/// Rendered geometry of a link.
///
/// "Start" and "end" here are the canonical (left, right) ends, which are not
/// necessarily the link's designated start and end shapes; `swapped` records
/// whether they were exchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Segment {
	pub length: f64,
	/// Rotation of the bar, always within `(-π/2, π/2]`.
	pub angle: f64,
	pub origin_x: f64,
	pub origin_y: f64,
	/// Direction from the designated start shape to the designated end
	/// shape, within `(-π, π]`.
	pub heading: f64,
	/// Center-to-center distance before trimming.
	pub untrimmed_length: f64,
	pub swapped: bool,
	pub arrow_at_start_visible: bool,
	pub arrow_at_end_visible: bool,
	pub insets: ArrowInsets,
}

impl Segment {
	/// Both ends of the rendered bar, canonical start first.
	pub fn endpoints(&self) -> ((f64, f64), (f64, f64)) {
		let half = 0.5 * self.length;
		let (cx, cy) = (self.origin_x + half, self.origin_y);
		let (hx, hy) = (half * self.angle.cos(), half * self.angle.sin());
		((cx - hx, cy - hy), (cx + hx, cy + hy))
	}

	/// Shortest distance from a point to the rendered bar.
	pub fn distance_to(&self, px: f64, py: f64) -> f64 {
		let ((x1, y1), (x2, y2)) = self.endpoints();
		let (dx, dy) = (x2 - x1, y2 - y1);
		let len_sq = dx * dx + dy * dy;
		let t = if len_sq > 0.0 {
			(((px - x1) * dx + (py - y1) * dy) / len_sq).clamp(0.0, 1.0)
		} else {
			0.0
		};
		(px - (x1 + t * dx)).hypot(py - (y1 + t * dy))
	}
}

fn glyphs(arrow_mode: ArrowMode, swapped: bool, config: &GeometryConfig) -> (bool, bool) {
	match arrow_mode {
		ArrowMode::None => (false, false),
		// The glyph sits next to the designated end shape.
		ArrowMode::Uni => (swapped, !swapped),
		ArrowMode::Bi => (
			config.render_bidirectional_arrows,
			config.render_bidirectional_arrows,
		),
	}
}

fn insets(arrow_mode: ArrowMode, swapped: bool, config: &GeometryConfig) -> ArrowInsets {
	match arrow_mode {
		ArrowMode::None => ArrowInsets::default(),
		ArrowMode::Uni if swapped => ArrowInsets {
			start: config.arrow_inset,
			end: config.tail_inset,
		},
		ArrowMode::Uni => ArrowInsets {
			start: config.tail_inset,
			end: config.arrow_inset,
		},
		ArrowMode::Bi if config.render_bidirectional_arrows => ArrowInsets {
			start: config.arrow_inset,
			end: config.arrow_inset,
		},
		ArrowMode::Bi => ArrowInsets::default(),
	}
}

/// Compute the bar connecting the centers of `start` and `end`.
///
/// The pair is canonicalized so the run always goes left to right (top to
/// bottom on a vertical tie). Comparing centers is the same test as
/// `x2 < x1 - (w2 - w1) / 2` on the top-left corners, so shapes of different
/// widths swap at the right place. The result depends on nothing but the
/// arguments.
pub fn compute_segment(
	start: &ShapeRect,
	end: &ShapeRect,
	arrow_mode: ArrowMode,
	config: &GeometryConfig,
) -> Segment {
	let (sx, sy) = start.clamped(MIN_EXTENT).center();
	let (ex, ey) = end.clamped(MIN_EXTENT).center();
	let swapped = ex < sx || (ex == sx && ey < sy);
	let ((x1, y1), (x2, y2)) = if swapped {
		((ex, ey), (sx, sy))
	} else {
		((sx, sy), (ex, ey))
	};
	let (arrow_at_start_visible, arrow_at_end_visible) = glyphs(arrow_mode, swapped, config);

	let (dx, dy) = (x2 - x1, y2 - y1);
	let run = dx.hypot(dy);
	if !(run >= f64::EPSILON) {
		return Segment {
			origin_x: x1,
			origin_y: y1,
			swapped,
			arrow_at_start_visible,
			arrow_at_end_visible,
			..Segment::default()
		};
	}

	let angle = dy.atan2(dx);
	let heading = match (swapped, angle > 0.0) {
		(false, _) => angle,
		(true, true) => angle - PI,
		(true, false) => angle + PI,
	};

	let mut insets = insets(arrow_mode, swapped, config);
	let trim = insets.start + insets.end;
	if trim > run {
		// Collapse onto the point that splits the run like the insets do.
		let scale = run / trim;
		insets.start *= scale;
		insets.end *= scale;
	}
	let length = (run - trim).max(0.0);

	// The bar is rotated about its center, so place the center on the
	// trimmed run's midpoint and back off half a length horizontally.
	let along = insets.start + 0.5 * length;
	let (ux, uy) = (dx / run, dy / run);
	Segment {
		length,
		angle,
		origin_x: x1 + along * ux - 0.5 * length,
		origin_y: y1 + along * uy,
		heading,
		untrimmed_length: run,
		swapped,
		arrow_at_start_visible,
		arrow_at_end_visible,
		insets,
	}
}

#[cfg(test)]
mod tests {
	use approx::assert_relative_eq;
	use proptest::prelude::*;

	use super::*;

	fn rect(x: f64, y: f64, width: f64, height: f64) -> ShapeRect {
		ShapeRect::new(x, y, width, height)
	}

	#[test]
	fn horizontal_pair_spans_center_to_center() {
		let config = GeometryConfig::default();
		let seg = compute_segment(
			&rect(0.0, 0.0, 100.0, 60.0),
			&rect(300.0, 0.0, 100.0, 60.0),
			ArrowMode::None,
			&config,
		);
		assert_eq!(seg.length, 300.0);
		assert_eq!(seg.angle, 0.0);
		assert_eq!(seg.origin_x, 50.0);
		assert_eq!(seg.origin_y, 30.0);
		assert!(!seg.arrow_at_start_visible && !seg.arrow_at_end_visible);
		let ((x1, y1), (x2, y2)) = seg.endpoints();
		assert_relative_eq!(x1, 50.0);
		assert_relative_eq!(y1, 30.0);
		assert_relative_eq!(x2, 350.0);
		assert_relative_eq!(y2, 30.0);
	}

	#[test]
	fn diagonal_uses_four_quadrant_angle() {
		let config = GeometryConfig::default();
		let seg = compute_segment(
			&rect(0.0, 0.0, 100.0, 60.0),
			&rect(300.0, 150.0, 100.0, 60.0),
			ArrowMode::None,
			&config,
		);
		let expected = 150f64.atan2(300.0);
		assert_eq!(seg.angle, expected);
		assert_relative_eq!(seg.length, (300f64 * 300.0 + 150.0 * 150.0).sqrt());
		// Untrimmed placement matches the closed form.
		assert_relative_eq!(
			seg.origin_x,
			50.0 - 0.5 * seg.length * (1.0 - expected.cos()),
			epsilon = 1e-9
		);
		assert_relative_eq!(
			seg.origin_y,
			30.0 + 0.5 * seg.length * expected.sin(),
			epsilon = 1e-9
		);
	}

	#[test]
	fn heading_points_from_designated_start() {
		let config = GeometryConfig::default();
		// Nearly vertical and reversed: the single-quadrant arctangent would
		// collapse this onto the wrong side.
		let start = rect(0.0, 0.0, 100.0, 60.0);
		let end = rect(-1.0, 300.0, 100.0, 60.0);
		let seg = compute_segment(&start, &end, ArrowMode::Uni, &config);
		assert!(seg.swapped);
		assert_relative_eq!(seg.heading, 300f64.atan2(-1.0), epsilon = 1e-12);
		assert!(seg.arrow_at_start_visible);
		assert!(!seg.arrow_at_end_visible);
	}

	#[test]
	fn vertical_tie_orders_top_to_bottom() {
		let config = GeometryConfig::default();
		let top = rect(0.0, 0.0, 100.0, 60.0);
		let bottom = rect(0.0, 200.0, 100.0, 60.0);
		let down = compute_segment(&top, &bottom, ArrowMode::None, &config);
		let up = compute_segment(&bottom, &top, ArrowMode::None, &config);
		assert_eq!(down.angle, PI / 2.0);
		assert_eq!(up.angle, PI / 2.0);
		assert_eq!(down.origin_x, up.origin_x);
		assert_eq!(down.heading, PI / 2.0);
		assert_relative_eq!(up.heading, -PI / 2.0);
	}

	#[test]
	fn swap_threshold_accounts_for_width() {
		let config = GeometryConfig::default();
		let narrow = rect(0.0, 0.0, 100.0, 60.0);
		// Left edge is further left, but the center (80) is to the right of 50.
		let wide = rect(-20.0, 0.0, 200.0, 60.0);
		let seg = compute_segment(&narrow, &wide, ArrowMode::None, &config);
		assert!(!seg.swapped);
		assert_eq!(seg.length, 30.0);
		let seg = compute_segment(&wide, &narrow, ArrowMode::None, &config);
		assert!(seg.swapped);
	}

	#[test]
	fn uni_trims_arrow_side() {
		let config = GeometryConfig::default();
		let a = rect(0.0, 0.0, 100.0, 60.0);
		let b = rect(300.0, 0.0, 100.0, 60.0);

		let forward = compute_segment(&a, &b, ArrowMode::Uni, &config);
		assert_eq!(forward.length, 300.0 - (config.arrow_inset + config.tail_inset));
		assert_eq!(forward.untrimmed_length, 300.0);
		assert!(forward.arrow_at_end_visible && !forward.arrow_at_start_visible);
		assert_eq!(
			forward.insets,
			ArrowInsets {
				start: 60.0,
				end: 100.0
			}
		);
		let ((x1, _), (x2, _)) = forward.endpoints();
		assert_relative_eq!(x1, 110.0);
		assert_relative_eq!(x2, 250.0);

		let backward = compute_segment(&b, &a, ArrowMode::Uni, &config);
		assert_eq!(backward.length, forward.length);
		assert!(backward.arrow_at_start_visible && !backward.arrow_at_end_visible);
		let ((x1, _), (x2, _)) = backward.endpoints();
		assert_relative_eq!(x1, 150.0);
		assert_relative_eq!(x2, 290.0);
	}

	#[test]
	fn bidirectional_has_no_glyphs_unless_enabled() {
		let a = rect(0.0, 0.0, 100.0, 60.0);
		let b = rect(400.0, 0.0, 100.0, 60.0);
		let plain = compute_segment(&a, &b, ArrowMode::Bi, &GeometryConfig::default());
		assert_eq!(plain.length, 400.0);
		assert!(!plain.arrow_at_start_visible && !plain.arrow_at_end_visible);

		let config = GeometryConfig {
			render_bidirectional_arrows: true,
			..GeometryConfig::default()
		};
		let arrows = compute_segment(&a, &b, ArrowMode::Bi, &config);
		assert_eq!(arrows.length, 200.0);
		assert!(arrows.arrow_at_start_visible && arrows.arrow_at_end_visible);
	}

	#[test]
	fn short_uni_link_collapses_instead_of_going_negative() {
		let config = GeometryConfig::default();
		let seg = compute_segment(
			&rect(0.0, 0.0, 100.0, 60.0),
			&rect(80.0, 0.0, 100.0, 60.0),
			ArrowMode::Uni,
			&config,
		);
		assert_eq!(seg.length, 0.0);
		assert_relative_eq!(seg.insets.start + seg.insets.end, 80.0);
		assert!(seg.origin_x.is_finite() && seg.origin_y.is_finite());
	}

	#[test]
	fn coincident_shapes_are_degenerate_not_nan() {
		let config = GeometryConfig::default();
		let a = rect(10.0, 10.0, 100.0, 60.0);
		for mode in ArrowMode::ALL {
			let seg = compute_segment(&a, &a, mode, &config);
			assert_eq!(seg.length, 0.0);
			assert_eq!(seg.angle, 0.0);
			assert_eq!(seg.heading, 0.0);
			assert_eq!((seg.origin_x, seg.origin_y), (60.0, 40.0));
			assert_eq!(seg.distance_to(60.0, 43.0), 3.0);
		}
	}

	#[test]
	fn zero_extents_are_clamped() {
		let config = GeometryConfig::default();
		let seg = compute_segment(
			&rect(0.0, 0.0, 0.0, 0.0),
			&rect(100.0, 0.0, 0.0, -5.0),
			ArrowMode::Uni,
			&config,
		);
		assert_eq!(seg.untrimmed_length, 100.0);
		assert!(seg.length.is_finite() && seg.angle.is_finite());
	}

	#[test]
	fn distance_to_bar() {
		let seg = compute_segment(
			&rect(0.0, 0.0, 100.0, 60.0),
			&rect(300.0, 0.0, 100.0, 60.0),
			ArrowMode::None,
			&GeometryConfig::default(),
		);
		assert_relative_eq!(seg.distance_to(200.0, 35.0), 5.0);
		assert_relative_eq!(seg.distance_to(20.0, 30.0), 30.0);
	}

	fn shape() -> impl Strategy<Value = ShapeRect> {
		(
			-2000.0..2000.0f64,
			-2000.0..2000.0f64,
			0.0..400.0f64,
			0.0..400.0f64,
		)
			.prop_map(|(x, y, w, h)| ShapeRect::new(x, y, w, h))
	}

	fn arrow_mode() -> impl Strategy<Value = ArrowMode> {
		prop_oneof![
			Just(ArrowMode::None),
			Just(ArrowMode::Uni),
			Just(ArrowMode::Bi)
		]
	}

	proptest! {
		#[test]
		fn order_does_not_change_canonical_bar(a in shape(), b in shape(), mode in arrow_mode()) {
			let config = GeometryConfig::default();
			let ab = compute_segment(&a, &b, mode, &config);
			let ba = compute_segment(&b, &a, mode, &config);
			prop_assert_eq!(ab.untrimmed_length.to_bits(), ba.untrimmed_length.to_bits());
			prop_assert_eq!(ab.length.to_bits(), ba.length.to_bits());
			prop_assert_eq!(ab.angle.to_bits(), ba.angle.to_bits());
			if mode != ArrowMode::Uni {
				prop_assert_eq!(ab.origin_x.to_bits(), ba.origin_x.to_bits());
				prop_assert_eq!(ab.origin_y.to_bits(), ba.origin_y.to_bits());
			}
			if ab.untrimmed_length > 0.0 {
				prop_assert_ne!(ab.swapped, ba.swapped);
				let turn = (ab.heading - ba.heading).abs();
				prop_assert!((turn - PI).abs() < 1e-9, "headings differ by {}", turn);
				if mode == ArrowMode::Uni {
					prop_assert_eq!(ab.arrow_at_start_visible, ba.arrow_at_end_visible);
					prop_assert_eq!(ab.arrow_at_end_visible, ba.arrow_at_start_visible);
				}
			}
		}

		#[test]
		fn equal_widths_swap_on_plain_x(
			x1 in -2000.0..2000.0f64,
			x2 in -2000.0..2000.0f64,
			y1 in -500.0..500.0f64,
			y2 in -500.0..500.0f64,
			w in 1.0..300.0f64
		) {
			prop_assume!((x1 - x2).abs() > 1e-6);
			let seg = compute_segment(
				&ShapeRect::new(x1, y1, w, 60.0),
				&ShapeRect::new(x2, y2, w, 60.0),
				ArrowMode::None,
				&GeometryConfig::default(),
			);
			prop_assert_eq!(seg.swapped, x2 < x1);
		}

		#[test]
		fn uni_removes_exactly_the_inset(a in shape(), b in shape()) {
			let config = GeometryConfig::default();
			let inset = config.arrow_inset + config.tail_inset;
			let seg = compute_segment(&a, &b, ArrowMode::Uni, &config);
			prop_assume!(seg.untrimmed_length > inset);
			prop_assert!((seg.untrimmed_length - seg.length - inset).abs() < 1e-9);
			prop_assert!(seg.length < seg.untrimmed_length);
			prop_assert!(seg.arrow_at_start_visible != seg.arrow_at_end_visible);
		}

		#[test]
		fn output_is_reproducible(a in shape(), b in shape(), mode in arrow_mode()) {
			let config = GeometryConfig::default();
			let first = compute_segment(&a, &b, mode, &config);
			let second = compute_segment(&a, &b, mode, &config);
			prop_assert_eq!(first, second);
			prop_assert!(first.length.is_finite() && first.angle.is_finite());
			prop_assert!(first.angle >= -PI / 2.0 && first.angle <= PI / 2.0);
		}
	}
}
