//! Gesture disambiguation and selection.
//!
//! Nothing here reads a clock. Callers pass the current time in
//! milliseconds to every call and call [`InteractionState::tick`] often
//! enough (every animation frame) for pending single clicks to resolve.

use serde::{Deserialize, Serialize};

use super::types::{LinkId, ShapeId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
	/// Click to select, double click to edit, click the background to place.
	#[default]
	ConceptSelect,
	/// Click two concepts in turn to link them.
	LinkSelect,
	/// Click to select only.
	Cursor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
	Shape(ShapeId),
	Link(LinkId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
	Single(ClickTarget),
	Double(ClickTarget),
}

/// `Idle -> PendingSingle -> Idle` on timeout (single click) or on a second
/// press of the same target before the deadline (double click).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ClickState {
	#[default]
	Idle,
	PendingSingle { target: ClickTarget, deadline: f64 },
}

impl ClickState {
	/// Register a press. Returns the gesture this press commits, if any: a
	/// double click, or the single click still pending on another target.
	pub fn press(&mut self, target: ClickTarget, now: f64, delay: f64) -> Option<Gesture> {
		match *self {
			ClickState::PendingSingle {
				target: pending,
				deadline,
			} if pending == target && now < deadline => {
				*self = ClickState::Idle;
				Some(Gesture::Double(target))
			}
			ClickState::PendingSingle {
				target: pending, ..
			} => {
				*self = ClickState::PendingSingle {
					target,
					deadline: now + delay,
				};
				Some(Gesture::Single(pending))
			}
			ClickState::Idle => {
				*self = ClickState::PendingSingle {
					target,
					deadline: now + delay,
				};
				None
			}
		}
	}

	pub fn tick(&mut self, now: f64) -> Option<Gesture> {
		match *self {
			ClickState::PendingSingle { target, deadline } if now >= deadline => {
				*self = ClickState::Idle;
				Some(Gesture::Single(target))
			}
			_ => None,
		}
	}

	pub fn cancel(&mut self) {
		*self = ClickState::Idle;
	}

	pub fn is_pending(&self) -> bool {
		matches!(self, ClickState::PendingSingle { .. })
	}
}

/// Work the controller hands back to the editor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
	OpenEditor(ShapeId),
	/// Close the editor, which submits the concept.
	CloseEditor(ShapeId),
	CreateLink { start: ShapeId, end: ShapeId },
	/// Background click in concept mode, canvas coordinates.
	PlaceShape { x: f64, y: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickDelays {
	pub shape_ms: f64,
	pub link_ms: f64,
}

impl Default for ClickDelays {
	fn default() -> Self {
		Self {
			shape_ms: 500.0,
			link_ms: 200.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct InteractionState {
	mode: Mode,
	selected_shapes: Vec<ShapeId>,
	selected_link: Option<LinkId>,
	open_editor: Option<ShapeId>,
	click: ClickState,
	delays: ClickDelays,
}

impl InteractionState {
	pub fn new(delays: ClickDelays) -> Self {
		Self {
			delays,
			..Self::default()
		}
	}

	pub fn mode(&self) -> Mode {
		self.mode
	}

	/// Selected shapes in selection order.
	pub fn selected_shapes(&self) -> &[ShapeId] {
		&self.selected_shapes
	}

	pub fn is_selected(&self, id: ShapeId) -> bool {
		self.selected_shapes.contains(&id)
	}

	pub fn selected_link(&self) -> Option<LinkId> {
		self.selected_link
	}

	pub fn open_editor(&self) -> Option<ShapeId> {
		self.open_editor
	}

	pub fn click_pending(&self) -> bool {
		self.click.is_pending()
	}

	fn clear_selection(&mut self) {
		self.selected_shapes.clear();
		self.selected_link = None;
	}

	fn close_editor_command(&mut self) -> Option<Command> {
		self.open_editor.take().map(Command::CloseEditor)
	}

	pub fn set_mode(&mut self, mode: Mode) -> Vec<Command> {
		self.mode = mode;
		self.click.cancel();
		self.clear_selection();
		self.close_editor_command().into_iter().collect()
	}

	/// Close the open editor, if any, keeping the selection.
	pub fn close_editor(&mut self) -> Vec<Command> {
		self.close_editor_command().into_iter().collect()
	}

	/// Select a freshly placed shape and open its editor.
	pub fn open_new(&mut self, id: ShapeId) {
		self.selected_shapes = vec![id];
		self.selected_link = None;
		self.open_editor = Some(id);
	}

	pub fn click_shape(&mut self, id: ShapeId, modifier: bool, now: f64) -> Vec<Command> {
		if modifier || self.mode == Mode::LinkSelect {
			return self.toggle_member(id);
		}
		let mut commands = Vec::new();
		if let Some(gesture) = self.click.press(ClickTarget::Shape(id), now, self.delays.shape_ms) {
			commands.extend(self.resolve(gesture));
		}
		commands
	}

	pub fn click_link(&mut self, id: LinkId, now: f64) -> Vec<Command> {
		let mut commands: Vec<Command> = self.close_editor_command().into_iter().collect();
		if let Some(gesture) = self.click.press(ClickTarget::Link(id), now, self.delays.link_ms) {
			commands.extend(self.resolve(gesture));
		}
		commands
	}

	pub fn click_background(&mut self, x: f64, y: f64) -> Vec<Command> {
		self.click.cancel();
		self.clear_selection();
		match (self.mode, self.close_editor_command()) {
			(_, Some(close)) => vec![close],
			(Mode::ConceptSelect, None) => vec![Command::PlaceShape { x, y }],
			_ => Vec::new(),
		}
	}

	pub fn tick(&mut self, now: f64) -> Vec<Command> {
		match self.click.tick(now) {
			Some(gesture) => self.resolve(gesture),
			None => Vec::new(),
		}
	}

	/// Drop every reference to a deleted shape.
	pub fn forget_shape(&mut self, id: ShapeId) {
		self.selected_shapes.retain(|other| *other != id);
		if self.open_editor == Some(id) {
			self.open_editor = None;
		}
		if matches!(self.click, ClickState::PendingSingle { target, .. } if target == ClickTarget::Shape(id))
		{
			self.click.cancel();
		}
	}

	pub fn forget_link(&mut self, id: LinkId) {
		if self.selected_link == Some(id) {
			self.selected_link = None;
		}
		if matches!(self.click, ClickState::PendingSingle { target, .. } if target == ClickTarget::Link(id))
		{
			self.click.cancel();
		}
	}

	fn toggle_member(&mut self, id: ShapeId) -> Vec<Command> {
		self.click.cancel();
		self.selected_link = None;
		if let Some(pos) = self.selected_shapes.iter().position(|other| *other == id) {
			self.selected_shapes.remove(pos);
			return Vec::new();
		}
		self.selected_shapes.push(id);
		if self.selected_shapes.len() > 2 {
			self.selected_shapes.remove(0);
		}
		if self.mode != Mode::LinkSelect || self.selected_shapes.len() < 2 {
			return Vec::new();
		}
		let (start, end) = (self.selected_shapes[0], self.selected_shapes[1]);
		self.selected_shapes.clear();
		vec![Command::CreateLink { start, end }]
	}

	fn resolve(&mut self, gesture: Gesture) -> Vec<Command> {
		match gesture {
			Gesture::Single(ClickTarget::Link(id)) | Gesture::Double(ClickTarget::Link(id)) => {
				self.selected_shapes.clear();
				self.selected_link = Some(id);
				Vec::new()
			}
			Gesture::Single(ClickTarget::Shape(id)) => {
				self.selected_link = None;
				if self.open_editor == Some(id) {
					// Clicks inside an open editor only keep it selected.
					self.selected_shapes = vec![id];
				} else if self.selected_shapes == [id] {
					self.selected_shapes.clear();
				} else {
					self.selected_shapes = vec![id];
				}
				Vec::new()
			}
			Gesture::Double(ClickTarget::Shape(id)) => {
				self.selected_link = None;
				self.selected_shapes = vec![id];
				if self.mode != Mode::ConceptSelect || self.open_editor == Some(id) {
					return Vec::new();
				}
				let mut commands: Vec<Command> = self.close_editor_command().into_iter().collect();
				self.open_editor = Some(id);
				commands.push(Command::OpenEditor(id));
				commands
			}
		}
	}
}
