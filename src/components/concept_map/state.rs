use std::collections::HashSet;

use log::{debug, info, warn};
use thiserror::Error;

use super::config::EditorConfig;
use super::geometry::MIN_EXTENT;
use super::interaction::{Command, InteractionState, Mode};
use super::links::{LinkError, LinkManager};
use super::node_style::{shape_class_for, slide_value_for, strength_slide_value};
use super::persistence::PersistenceEvent;
use super::registry::{Shape, ShapeRegistry, TITLE_MAX_CHARS};
use super::types::{
	ArrowMode, LinkId, LinkRecord, LinkRestyle, LinkStyle, MapSnapshot, ShapeClass, ShapeId,
	ShapeRect, Valence,
};
use super::viewport::Viewport;

pub const TEXT_SCALE_RANGE: (f64, f64) = (6.0, 48.0);

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EditorError {
	#[error("{0} does not exist")]
	UnknownShape(ShapeId),
	#[error("{0} cannot be modified")]
	Locked(ShapeId),
	#[error("no free concept id")]
	NoFreeId,
	#[error(transparent)]
	Link(#[from] LinkError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressTarget {
	Shape(ShapeId),
	Link(LinkId),
	Background,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragKind {
	Move,
	Resize,
}

/// A pointer press that has not yet turned into a click or a drag.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub target: Option<PressTarget>,
	/// `None` when the pressed item cannot be dragged.
	pub kind: Option<DragKind>,
	pub modifier: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub shape_start: ShapeRect,
	pub moved: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShapeEdit {
	Title(String),
	Slide(i32),
	Ambivalent(bool),
	Note(String),
	TextScale(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShapePanel {
	pub id: ShapeId,
	pub title: String,
	pub slide_value: u8,
	pub ambivalent: bool,
	pub note: String,
	pub text_scale: f64,
	pub class_name: &'static str,
	pub modifiable: bool,
	pub editing: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkPanel {
	pub id: LinkId,
	pub start_title: String,
	pub end_title: String,
	pub valence: Valence,
	pub strength_slide: u8,
	pub arrow_mode: ArrowMode,
}

/// What the side panel shows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inspector {
	pub mode: Mode,
	pub zoom_percent: u32,
	pub shape: Option<ShapePanel>,
	pub link: Option<LinkPanel>,
	pub status: Option<String>,
}

pub struct ConceptMapState {
	pub shapes: ShapeRegistry,
	pub links: LinkManager,
	pub interaction: InteractionState,
	pub viewport: Viewport,
	pub drag: DragState,
	pub hover: Option<ShapeId>,
	status: Option<String>,
	/// Placed shapes the server has not heard of yet.
	unsaved: HashSet<ShapeId>,
	outbox: Vec<PersistenceEvent>,
	config: EditorConfig,
}

impl ConceptMapState {
	pub fn new(config: EditorConfig) -> Self {
		Self {
			shapes: ShapeRegistry::new(),
			links: LinkManager::new(config.geometry.clone(), config.link_uniqueness),
			interaction: InteractionState::new(config.click_delays()),
			viewport: Viewport::new(&config.zoom, config.canvas_width, config.canvas_height),
			drag: DragState::default(),
			hover: None,
			status: None,
			unsaved: HashSet::new(),
			outbox: Vec::new(),
			config,
		}
	}

	pub fn from_snapshot(snapshot: &MapSnapshot, config: EditorConfig) -> Self {
		let mut state = Self::new(config);
		for record in &snapshot.shapes {
			if state.shapes.insert(Shape::from_record(record)).is_some() {
				warn!("{} appears twice, keeping the last copy", record.id);
			}
		}
		for record in &snapshot.links {
			if let Err(e) = state.restore_link(record) {
				warn!("skipping persisted {}: {e}", record.id);
			}
		}
		info!(
			"restored {} concepts and {} links",
			state.shapes.len(),
			state.links.len()
		);
		state
	}

	fn restore_link(&mut self, record: &LinkRecord) -> Result<(), LinkError> {
		self.links.insert_link(
			&self.shapes,
			record.id,
			record.start_id,
			record.end_id,
			LinkStyle::default(),
		)?;
		let style = LinkStyle::from_parts(record.line_style, record.arrow_type);
		self.links.restyle_link(
			&self.shapes,
			record.id,
			LinkRestyle {
				valence: Some(style.valence),
				strength: Some(style.strength),
				arrow_mode: Some(style.arrow_mode),
			},
		)?;
		Ok(())
	}

	pub fn config(&self) -> &EditorConfig {
		&self.config
	}

	pub fn drain_outbox(&mut self) -> Vec<PersistenceEvent> {
		std::mem::take(&mut self.outbox)
	}

	fn report(&mut self, error: &EditorError) {
		match error {
			EditorError::Link(LinkError::DuplicateLink { .. }) => info!("{error}"),
			_ => warn!("{error}"),
		}
		self.status = Some(error.to_string());
	}

	fn editable_shape(&mut self, id: ShapeId) -> Result<&mut Shape, EditorError> {
		let shape = self
			.shapes
			.get_mut(id)
			.ok_or(EditorError::UnknownShape(id))?;
		if !shape.modifiable {
			return Err(EditorError::Locked(id));
		}
		Ok(shape)
	}

	/// Commit a new position, then bring attached links up to date.
	pub fn move_shape(&mut self, id: ShapeId, x: f64, y: f64) -> Result<Vec<LinkId>, EditorError> {
		let shape = self.editable_shape(id)?;
		shape.rect.x = x;
		shape.rect.y = y;
		Ok(self.links.reposition_attached(&self.shapes, id))
	}

	pub fn resize_shape(
		&mut self,
		id: ShapeId,
		width: f64,
		height: f64,
	) -> Result<Vec<LinkId>, EditorError> {
		let shape = self.editable_shape(id)?;
		if !shape.resizable {
			return Err(EditorError::Locked(id));
		}
		shape.rect.width = width.max(MIN_EXTENT);
		shape.rect.height = height.max(MIN_EXTENT);
		Ok(self.links.reposition_attached(&self.shapes, id))
	}

	/// Change a concept in its editor. Saved when the editor closes.
	pub fn edit_shape(&mut self, id: ShapeId, edit: ShapeEdit) -> Result<(), EditorError> {
		let shape = self.editable_shape(id)?;
		match edit {
			ShapeEdit::Title(title) => shape.title = title.chars().take(TITLE_MAX_CHARS).collect(),
			ShapeEdit::Slide(value) => shape.class = shape_class_for(value),
			ShapeEdit::Ambivalent(true) => shape.class = ShapeClass::Ambivalent,
			ShapeEdit::Ambivalent(false) if shape.class == ShapeClass::Ambivalent => {
				shape.class = shape_class_for(slide_value_for(ShapeClass::Ambivalent).into());
			}
			ShapeEdit::Ambivalent(false) => {}
			ShapeEdit::Note(note) => {
				shape.note = (!note.trim().is_empty()).then_some(note);
			}
			ShapeEdit::TextScale(scale) if scale.is_finite() => {
				shape.text_scale = scale.clamp(TEXT_SCALE_RANGE.0, TEXT_SCALE_RANGE.1);
			}
			ShapeEdit::TextScale(_) => {}
		}
		Ok(())
	}

	/// Queue the concept's current fields for the server.
	pub fn submit_shape(&mut self, id: ShapeId) {
		let Some(shape) = self.shapes.get(id) else {
			return;
		};
		let shape = shape.to_record();
		self.outbox.push(if self.unsaved.remove(&id) {
			PersistenceEvent::ShapeCreated { shape }
		} else {
			PersistenceEvent::ShapeUpdated { shape }
		});
	}

	/// Place a concept around a canvas point and open its editor.
	pub fn place_shape(&mut self, x: f64, y: f64) -> Result<ShapeId, EditorError> {
		let defaults = self.config.new_shape.clone();
		let id = self.shapes.allocate_id().ok_or(EditorError::NoFreeId)?;
		self.shapes.insert(Shape {
			id,
			title: String::new(),
			rect: ShapeRect::new(
				x + defaults.offset_x,
				y + defaults.offset_y,
				defaults.width,
				defaults.height,
			),
			text_scale: defaults.text_scale,
			class: ShapeClass::Rectangle,
			note: None,
			modifiable: true,
			resizable: true,
		});
		self.unsaved.insert(id);
		self.interaction.open_new(id);
		debug!("placed {id} at ({x}, {y})");
		Ok(id)
	}

	pub fn create_link(&mut self, start: ShapeId, end: ShapeId) -> Result<LinkId, EditorError> {
		let created = self
			.links
			.create_link(&self.shapes, start, end, LinkStyle::default())
			.map_err(EditorError::from);
		let id = match created {
			Ok(id) => id,
			Err(e) => {
				self.report(&e);
				return Err(e);
			}
		};
		// The server needs both concepts before it can store the link.
		for endpoint in [start, end] {
			if self.unsaved.contains(&endpoint) {
				self.submit_shape(endpoint);
			}
		}
		if let Some(link) = self.links.get(id) {
			self.outbox.push(PersistenceEvent::LinkCreated {
				link: link.to_record(),
			});
		}
		self.status = None;
		Ok(id)
	}

	pub fn restyle_link(&mut self, id: LinkId, restyle: LinkRestyle) -> Result<(), EditorError> {
		let link = self
			.links
			.restyle_link(&self.shapes, id, restyle)?
			.to_record();
		self.outbox.push(PersistenceEvent::LinkUpdated { link });
		Ok(())
	}

	pub fn delete_link(&mut self, id: LinkId) -> Result<(), EditorError> {
		self.links.delete_link(id)?;
		self.interaction.forget_link(id);
		self.outbox.push(PersistenceEvent::LinkDeleted { id });
		Ok(())
	}

	/// Delete a concept together with every link attached to it.
	pub fn delete_shape(&mut self, id: ShapeId) -> Result<Vec<LinkId>, EditorError> {
		self.editable_shape(id)?;
		let removed: Vec<LinkId> = self
			.links
			.remove_links_for_shape(id)
			.into_iter()
			.map(|link| link.id)
			.collect();
		for link in &removed {
			self.interaction.forget_link(*link);
			self.outbox.push(PersistenceEvent::LinkDeleted { id: *link });
		}
		self.shapes.remove(id);
		self.interaction.forget_shape(id);
		if self.hover == Some(id) {
			self.hover = None;
		}
		if self.drag.target == Some(PressTarget::Shape(id)) {
			self.drag = DragState::default();
		}
		if !self.unsaved.remove(&id) {
			self.outbox.push(PersistenceEvent::ShapeDeleted { id });
		}
		info!("deleted {id} and {} attached links", removed.len());
		Ok(removed)
	}

	/// Delete the selected link, or else the single selected concept.
	pub fn delete_selection(&mut self) {
		let result = match (
			self.interaction.selected_link(),
			self.interaction.selected_shapes(),
		) {
			(Some(link), _) => self.delete_link(link),
			(None, &[shape]) => self.delete_shape(shape).map(|_| ()),
			_ => Ok(()),
		};
		if let Err(e) = result {
			self.report(&e);
		}
	}

	pub fn request_undo(&mut self) {
		self.outbox.push(PersistenceEvent::Undo);
	}

	pub fn set_mode(&mut self, mode: Mode) {
		let commands = self.interaction.set_mode(mode);
		self.status = None;
		self.apply(commands);
	}

	pub fn close_editor(&mut self) {
		let commands = self.interaction.close_editor();
		self.apply(commands);
	}

	pub fn apply(&mut self, commands: Vec<Command>) {
		for command in commands {
			match command {
				Command::OpenEditor(id) => {
					debug!("editing {id}");
					self.shapes.raise(id);
				}
				Command::CloseEditor(id) => self.submit_shape(id),
				Command::CreateLink { start, end } => {
					// Failures are reported through the status line.
					let _ = self.create_link(start, end);
				}
				Command::PlaceShape { x, y } => {
					if let Err(err) = self.place_shape(x, y) {
						self.report(&err);
					}
				}
			}
		}
	}

	/// Advance the click clock. Returns true when a pending click resolved.
	pub fn tick(&mut self, now: f64) -> bool {
		if !self.interaction.click_pending() {
			return false;
		}
		let commands = self.interaction.tick(now);
		self.apply(commands);
		!self.interaction.click_pending()
	}

	fn on_resize_handle(&self, rect: &ShapeRect, x: f64, y: f64) -> bool {
		let handle = self.config.resize_handle;
		x >= rect.x + rect.width - handle && y >= rect.y + rect.height - handle
	}

	/// Screen coordinates relative to the canvas element.
	pub fn pointer_down(&mut self, sx: f64, sy: f64, modifier: bool) {
		let (x, y) = self.viewport.screen_to_canvas(sx, sy);
		let target = if let Some(id) = self.shapes.shape_at(x, y) {
			PressTarget::Shape(id)
		} else if let Some(id) = self.links.link_at(x, y, self.config.link_hit_tolerance) {
			PressTarget::Link(id)
		} else {
			PressTarget::Background
		};

		let mut drag = DragState {
			active: true,
			target: Some(target),
			modifier,
			start_x: sx,
			start_y: sy,
			..DragState::default()
		};
		match target {
			PressTarget::Shape(id) => {
				if let Some(shape) = self.shapes.get(id).filter(|s| s.modifiable) {
					drag.shape_start = shape.rect;
					drag.kind = Some(if shape.resizable && self.on_resize_handle(&shape.rect, x, y) {
						DragKind::Resize
					} else {
						DragKind::Move
					});
				}
			}
			PressTarget::Background => self.viewport.begin_pan(sx, sy),
			PressTarget::Link(_) => {}
		}
		self.drag = drag;
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if !self.drag.active {
			let (x, y) = self.viewport.screen_to_canvas(sx, sy);
			self.hover = self.shapes.shape_at(x, y);
			return;
		}
		let (dx, dy) = (sx - self.drag.start_x, sy - self.drag.start_y);
		if !self.drag.moved && dx.hypot(dy) < self.config.drag_threshold {
			return;
		}
		self.drag.moved = true;

		match (self.drag.target, self.drag.kind) {
			(Some(PressTarget::Shape(id)), Some(kind)) => {
				let k = self.viewport.zoom();
				let (dx, dy) = (dx / k, dy / k);
				let start = self.drag.shape_start;
				let result = match kind {
					DragKind::Move => self.move_shape(id, start.x + dx, start.y + dy),
					DragKind::Resize => self.resize_shape(id, start.width + dx, start.height + dy),
				};
				if let Err(e) = result {
					self.report(&e);
					self.drag = DragState::default();
				}
			}
			(Some(PressTarget::Background), _) => self.viewport.pan_to(sx, sy),
			_ => {}
		}
	}

	/// Finish a press: a drag is saved, anything else is a click.
	pub fn pointer_up(&mut self, now: f64) {
		let drag = std::mem::take(&mut self.drag);
		self.viewport.end_pan();
		let (true, Some(target)) = (drag.active, drag.target) else {
			return;
		};
		if drag.moved {
			if let (PressTarget::Shape(id), Some(_)) = (target, drag.kind) {
				self.submit_shape(id);
			}
			return;
		}
		let commands = match target {
			PressTarget::Shape(id) => self.interaction.click_shape(id, drag.modifier, now),
			PressTarget::Link(id) => self.interaction.click_link(id, now),
			PressTarget::Background => {
				let (x, y) = self.viewport.screen_to_canvas(drag.start_x, drag.start_y);
				self.interaction.click_background(x, y)
			}
		};
		self.apply(commands);
	}

	pub fn pointer_leave(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		if let (true, Some(PressTarget::Shape(id)), Some(_)) = (drag.moved, drag.target, drag.kind)
		{
			self.submit_shape(id);
		}
		self.viewport.end_pan();
		self.hover = None;
	}

	pub fn zoom_in(&mut self) {
		self.viewport.zoom_in();
	}

	pub fn zoom_out(&mut self) {
		self.viewport.zoom_out();
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport.resize(width, height);
	}

	pub fn inspector(&self) -> Inspector {
		let shape = match self.interaction.selected_shapes() {
			&[id] => self.shapes.get(id).map(|shape| ShapePanel {
				id,
				title: shape.title.clone(),
				slide_value: slide_value_for(shape.class),
				ambivalent: shape.class == ShapeClass::Ambivalent,
				note: shape.note.clone().unwrap_or_default(),
				text_scale: shape.text_scale,
				class_name: shape.class.css_class(),
				modifiable: shape.modifiable,
				editing: self.interaction.open_editor() == Some(id),
			}),
			_ => None,
		};
		let title = |id: ShapeId| {
			self.shapes
				.get(id)
				.map(|shape| shape.title.clone())
				.unwrap_or_default()
		};
		let link = self
			.interaction
			.selected_link()
			.and_then(|id| self.links.get(id))
			.map(|link| LinkPanel {
				id: link.id,
				start_title: title(link.start),
				end_title: title(link.end),
				valence: link.style.valence,
				strength_slide: strength_slide_value(link.style.strength),
				arrow_mode: link.style.arrow_mode,
			});
		Inspector {
			mode: self.interaction.mode(),
			zoom_percent: self.viewport.zoom_percent(),
			shape,
			link,
			status: self.status.clone(),
		}
	}
}
