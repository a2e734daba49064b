use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::links::Link;
use super::node_style::{Outline, Polarity};
use super::registry::Shape;
use super::state::ConceptMapState;
use super::types::{ShapeRect, Strength, Valence};

const BACKGROUND: &str = "#fafafa";
const LINK_COLOR: &str = "#34495e";
const SELECTED: &str = "#2e86de";
const ARROW_SIZE: f64 = 14.0;
const TEXT_PADDING: f64 = 8.0;

fn colors(polarity: Polarity) -> (&'static str, &'static str) {
	match polarity {
		Polarity::Negative => ("#fbd3d0", "#c0392b"),
		Polarity::Neutral => ("#fdf6c9", "#b7950b"),
		Polarity::Positive => ("#d2f0d6", "#229954"),
		Polarity::Ambivalent => ("#e6dbf5", "#7d3c98"),
	}
}

fn line_width(strength: Strength) -> f64 {
	match strength {
		Strength::Weak => 1.5,
		Strength::Normal => 3.0,
		Strength::Strong => 5.0,
	}
}

pub fn render(state: &ConceptMapState, ctx: &CanvasRenderingContext2d) {
	let (width, height) = state.viewport.view_size();
	let k = state.viewport.zoom();
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);
	ctx.save();
	let _ = ctx.translate(state.viewport.x, state.viewport.y);
	let _ = ctx.scale(k, k);
	for link in state.links.iter() {
		let selected = state.interaction.selected_link() == Some(link.id);
		draw_link(ctx, link, selected);
	}
	for shape in state.shapes.iter() {
		draw_shape(state, ctx, shape);
	}
	ctx.restore();
}

fn draw_link(ctx: &CanvasRenderingContext2d, link: &Link, selected: bool) {
	let segment = &link.segment;
	if segment.untrimmed_length <= 0.0 {
		return;
	}
	let half = 0.5 * segment.length;
	let color = if selected { SELECTED } else { LINK_COLOR };

	// The bar is laid out horizontally from its origin, then turned about
	// its midpoint.
	ctx.save();
	let _ = ctx.translate(segment.origin_x + half, segment.origin_y);
	let _ = ctx.rotate(segment.angle);

	ctx.set_stroke_style_str(color);
	ctx.set_line_width(line_width(link.style.strength) + if selected { 2.0 } else { 0.0 });
	if link.style.valence == Valence::Dashed {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(10.0),
			&JsValue::from_f64(6.0),
		));
	}
	ctx.begin_path();
	ctx.move_to(-half, 0.0);
	ctx.line_to(half, 0.0);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	ctx.set_fill_style_str(color);
	if segment.arrow_at_end_visible {
		draw_arrow(ctx, half, 1.0);
	}
	if segment.arrow_at_start_visible {
		draw_arrow(ctx, -half, -1.0);
	}
	ctx.restore();
}

/// Triangle whose tip sits at `tip_x` on the bar, pointing along `dir`.
fn draw_arrow(ctx: &CanvasRenderingContext2d, tip_x: f64, dir: f64) {
	let back_x = tip_x - dir * ARROW_SIZE;
	ctx.begin_path();
	ctx.move_to(tip_x, 0.0);
	ctx.line_to(back_x, ARROW_SIZE * 0.5);
	ctx.line_to(back_x, -ARROW_SIZE * 0.5);
	ctx.close_path();
	ctx.fill();
}

pub fn hexagon_points(rect: &ShapeRect) -> [(f64, f64); 6] {
	let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
	let inset = (w * 0.25).min(h * 0.5);
	[
		(x + inset, y),
		(x + w - inset, y),
		(x + w, y + h * 0.5),
		(x + w - inset, y + h),
		(x + inset, y + h),
		(x, y + h * 0.5),
	]
}

fn trace_outline(ctx: &CanvasRenderingContext2d, outline: Outline, rect: &ShapeRect) {
	let (cx, cy) = rect.center();
	ctx.begin_path();
	match outline {
		Outline::Rectangle => ctx.rect(rect.x, rect.y, rect.width, rect.height),
		Outline::Rounded => {
			let _ = ctx.ellipse(cx, cy, rect.width * 0.5, rect.height * 0.5, 0.0, 0.0, 2.0 * PI);
		}
		Outline::Hexagon | Outline::HexagonCircle => {
			let points = hexagon_points(rect);
			ctx.move_to(points[0].0, points[0].1);
			for (px, py) in &points[1..] {
				ctx.line_to(*px, *py);
			}
			ctx.close_path();
		}
	}
}

fn draw_shape(state: &ConceptMapState, ctx: &CanvasRenderingContext2d, shape: &Shape) {
	let rect = &shape.rect;
	let outline = shape.class.outline();
	let (fill, stroke) = colors(shape.class.polarity());
	let selected = state.interaction.is_selected(shape.id);
	let editing = state.interaction.open_editor() == Some(shape.id);

	trace_outline(ctx, outline, rect);
	ctx.set_fill_style_str(fill);
	ctx.fill();
	ctx.set_stroke_style_str(if selected { SELECTED } else { stroke });
	ctx.set_line_width(shape.class.border_width() + if selected { 1.0 } else { 0.0 });
	if editing {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(6.0),
			&JsValue::from_f64(3.0),
		));
	}
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	if outline == Outline::HexagonCircle {
		let (cx, cy) = rect.center();
		ctx.begin_path();
		let _ = ctx.ellipse(cx, cy, rect.width * 0.3, rect.height * 0.35, 0.0, 0.0, 2.0 * PI);
		ctx.set_line_width(2.0);
		ctx.set_stroke_style_str(stroke);
		ctx.stroke();
	}

	draw_title(ctx, shape);

	if shape.note.is_some() {
		ctx.set_fill_style_str(stroke);
		ctx.begin_path();
		let _ = ctx.arc(rect.x + rect.width - 8.0, rect.y + 8.0, 4.0, 0.0, 2.0 * PI);
		ctx.fill();
	}

	let show_handle = shape.resizable && (selected || state.hover == Some(shape.id));
	if show_handle {
		let handle = state.config().resize_handle;
		let (right, bottom) = (rect.x + rect.width, rect.y + rect.height);
		ctx.set_fill_style_str(SELECTED);
		ctx.begin_path();
		ctx.move_to(right, bottom - handle);
		ctx.line_to(right, bottom);
		ctx.line_to(right - handle, bottom);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_title(ctx: &CanvasRenderingContext2d, shape: &Shape) {
	if shape.title.is_empty() {
		return;
	}
	let rect = &shape.rect;
	let line_height = shape.text_scale * 1.2;
	ctx.set_font(&format!("{}px sans-serif", shape.text_scale));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str("#222");

	let max_width = (rect.width - 2.0 * TEXT_PADDING).max(0.0);
	let measure = |text: &str| ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0);
	let max_lines = ((rect.height - TEXT_PADDING) / line_height).floor().max(1.0) as usize;
	let lines = wrap_lines(&shape.title, max_width, measure);
	let shown = &lines[..lines.len().min(max_lines)];

	let (cx, cy) = rect.center();
	let top = cy - 0.5 * line_height * (shown.len() as f64 - 1.0);
	for (i, line) in shown.iter().enumerate() {
		let _ = ctx.fill_text(line, cx, top + i as f64 * line_height);
	}
}

/// Greedy word wrap. A word wider than the box gets a line of its own.
pub fn wrap_lines(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
	let mut lines: Vec<String> = Vec::new();
	let mut current = String::new();
	for word in text.split_whitespace() {
		if current.is_empty() {
			current.push_str(word);
			continue;
		}
		let candidate = format!("{current} {word}");
		if measure(&candidate) <= max_width {
			current = candidate;
		} else {
			lines.push(std::mem::replace(&mut current, word.to_string()));
		}
	}
	if !current.is_empty() {
		lines.push(current);
	}
	lines
}
