use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
	pub min: f64,
	pub max: f64,
	pub step: f64,
	pub initial: f64,
}

impl Default for ZoomConfig {
	fn default() -> Self {
		Self {
			min: 0.6,
			max: 1.5,
			step: 0.1,
			initial: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Visual transform of the canvas container. Shape and link coordinates are
/// never touched by it.
///
/// Zoom is kept as a whole number of steps so repeated zooming lands on the
/// same values.
#[derive(Clone, Debug)]
pub struct Viewport {
	pub x: f64,
	pub y: f64,
	pub pan: PanState,
	level: i32,
	min_level: i32,
	max_level: i32,
	step: f64,
	canvas_width: f64,
	canvas_height: f64,
	width: f64,
	height: f64,
}

impl Viewport {
	pub fn new(config: &ZoomConfig, canvas_width: f64, canvas_height: f64) -> Self {
		let step = if config.step > 0.0 { config.step } else { 0.1 };
		let min_level = (config.min / step).round() as i32;
		let max_level = ((config.max / step).round() as i32).max(min_level);
		Self {
			x: 0.0,
			y: 0.0,
			pan: PanState::default(),
			level: ((config.initial / step).round() as i32).clamp(min_level, max_level),
			min_level,
			max_level,
			step,
			canvas_width,
			canvas_height,
			width: canvas_width,
			height: canvas_height,
		}
	}

	pub fn zoom(&self) -> f64 {
		self.level as f64 * self.step
	}

	pub fn zoom_percent(&self) -> u32 {
		(self.zoom() * 100.0).round() as u32
	}

	pub fn zoom_in(&mut self) -> bool {
		self.set_level(self.level + 1)
	}

	pub fn zoom_out(&mut self) -> bool {
		self.set_level(self.level - 1)
	}

	fn set_level(&mut self, level: i32) -> bool {
		let level = level.clamp(self.min_level, self.max_level);
		if level == self.level {
			return false;
		}
		self.level = level;
		self.clamp_offset();
		true
	}

	/// Size of the element the canvas is shown in.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.clamp_offset();
	}

	pub fn view_size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	pub fn screen_to_canvas(&self, sx: f64, sy: f64) -> (f64, f64) {
		let k = self.zoom();
		((sx - self.x) / k, (sy - self.y) / k)
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.x,
			transform_start_y: self.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if !self.pan.active {
			return;
		}
		self.x = self.pan.transform_start_x + (sx - self.pan.start_x);
		self.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		self.clamp_offset();
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Keep the scaled canvas covering the view: never past its top-left
	/// corner, never past its far edge.
	fn clamp_offset(&mut self) {
		let k = self.zoom();
		let min_x = (self.width - self.canvas_width * k).min(0.0);
		let min_y = (self.height - self.canvas_height * k).min(0.0);
		self.x = self.x.clamp(min_x, 0.0);
		self.y = self.y.clamp(min_y, 0.0);
	}
}

#[cfg(test)]
mod tests {
	use approx::assert_relative_eq;

	use super::*;

	fn viewport() -> Viewport {
		let mut viewport = Viewport::new(&ZoomConfig::default(), 2000.0, 1500.0);
		viewport.resize(800.0, 600.0);
		viewport
	}

	#[test]
	fn zoom_steps_and_clamps() {
		let mut viewport = viewport();
		assert_eq!(viewport.zoom_percent(), 100);
		for _ in 0..10 {
			viewport.zoom_in();
		}
		assert_eq!(viewport.zoom_percent(), 150);
		assert!(!viewport.zoom_in());
		for _ in 0..20 {
			viewport.zoom_out();
		}
		assert_eq!(viewport.zoom_percent(), 60);
		assert_relative_eq!(viewport.zoom(), 0.6);
		assert!(!viewport.zoom_out());
	}

	#[test]
	fn pan_follows_cumulative_delta() {
		let mut viewport = viewport();
		viewport.begin_pan(500.0, 400.0);
		viewport.pan_to(450.0, 380.0);
		viewport.pan_to(400.0, 300.0);
		assert_eq!((viewport.x, viewport.y), (-100.0, -100.0));
		viewport.end_pan();
		viewport.pan_to(0.0, 0.0);
		assert_eq!((viewport.x, viewport.y), (-100.0, -100.0));
	}

	#[test]
	fn pan_stops_at_canvas_edges() {
		let mut viewport = viewport();
		viewport.begin_pan(0.0, 0.0);
		viewport.pan_to(300.0, 300.0);
		assert_eq!((viewport.x, viewport.y), (0.0, 0.0));
		viewport.pan_to(-5000.0, -5000.0);
		assert_eq!((viewport.x, viewport.y), (-1200.0, -900.0));
	}

	#[test]
	fn zooming_out_pulls_offset_back_inside() {
		let mut viewport = viewport();
		viewport.begin_pan(0.0, 0.0);
		viewport.pan_to(-5000.0, -5000.0);
		for _ in 0..4 {
			viewport.zoom_out();
		}
		assert_relative_eq!(viewport.x, 800.0 - 2000.0 * 0.6, epsilon = 1e-9);
	}

	#[test]
	fn screen_to_canvas_undoes_transform() {
		let mut viewport = viewport();
		viewport.zoom_in();
		viewport.x = -100.0;
		let (cx, cy) = viewport.screen_to_canvas(120.0, 55.0);
		assert_relative_eq!(cx, 200.0, epsilon = 1e-9);
		assert_relative_eq!(cy, 50.0, epsilon = 1e-9);
	}
}
