use std::collections::HashMap;

use super::types::{ShapeClass, ShapeId, ShapeRecord, ShapeRect};

pub const TITLE_MAX_CHARS: usize = 50;

#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
	pub id: ShapeId,
	pub title: String,
	pub rect: ShapeRect,
	pub text_scale: f64,
	pub class: ShapeClass,
	pub note: Option<String>,
	pub modifiable: bool,
	pub resizable: bool,
}

impl Shape {
	pub fn from_record(record: &ShapeRecord) -> Self {
		let note = (!record.note_hidden && !record.note.trim().is_empty())
			.then(|| record.note.clone());
		Self {
			id: record.id,
			title: record.title.chars().take(TITLE_MAX_CHARS).collect(),
			rect: ShapeRect::new(record.x, record.y, record.width, record.height),
			text_scale: record.text_scale,
			class: record.shape,
			note,
			modifiable: record.modifiable,
			resizable: record.modifiable,
		}
	}

	pub fn to_record(&self) -> ShapeRecord {
		ShapeRecord {
			id: self.id,
			title: self.title.clone(),
			x: self.rect.x,
			y: self.rect.y,
			width: self.rect.width,
			height: self.rect.height,
			text_scale: self.text_scale,
			shape: self.class,
			note_hidden: self.note.is_none(),
			note: self.note.clone().unwrap_or_default(),
			modifiable: self.modifiable,
		}
	}
}

/// Every live concept on the canvas, in paint order (last is topmost).
#[derive(Clone, Debug, Default)]
pub struct ShapeRegistry {
	shapes: HashMap<ShapeId, Shape>,
	order: Vec<ShapeId>,
	next_id: u32,
}

impl ShapeRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Next unused id, wrapping past `u32::MAX`. `None` once every id is taken.
	pub fn allocate_id(&mut self) -> Option<ShapeId> {
		let free = (self.next_id..=u32::MAX)
			.chain(0..self.next_id)
			.find(|id| !self.shapes.contains_key(&ShapeId(*id)))?;
		self.next_id = free.wrapping_add(1);
		Some(ShapeId(free))
	}

	/// Insert or replace a shape. A new shape goes on top.
	pub fn insert(&mut self, shape: Shape) -> Option<Shape> {
		let id = shape.id;
		self.next_id = self.next_id.max(id.0.saturating_add(1));
		let previous = self.shapes.insert(id, shape);
		if previous.is_none() {
			self.order.push(id);
		}
		previous
	}

	pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
		let shape = self.shapes.remove(&id)?;
		self.order.retain(|other| *other != id);
		Some(shape)
	}

	pub fn get(&self, id: ShapeId) -> Option<&Shape> {
		self.shapes.get(&id)
	}

	pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
		self.shapes.get_mut(&id)
	}

	pub fn rect(&self, id: ShapeId) -> Option<ShapeRect> {
		self.shapes.get(&id).map(|shape| shape.rect)
	}

	pub fn len(&self) -> usize {
		self.shapes.len()
	}

	/// Shapes bottom to top.
	pub fn iter(&self) -> impl Iterator<Item = &Shape> {
		self.order.iter().filter_map(|id| self.shapes.get(id))
	}

	/// Move a shape to the top of the paint order.
	pub fn raise(&mut self, id: ShapeId) {
		if let Some(pos) = self.order.iter().position(|other| *other == id) {
			let id = self.order.remove(pos);
			self.order.push(id);
		}
	}

	/// Topmost shape containing the point.
	pub fn shape_at(&self, x: f64, y: f64) -> Option<ShapeId> {
		self.order
			.iter()
			.rev()
			.copied()
			.find(|id| self.shapes.get(id).is_some_and(|s| s.rect.contains(x, y)))
	}
}
