use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, Window};

use super::config::EditorConfig;
use super::interaction::Mode;
use super::node_style::{SLIDE_MAX, SLIDE_MIN, strength_for};
use super::persistence::PersistenceClient;
use super::render;
use super::state::{
	ConceptMapState, Inspector, LinkPanel, ShapeEdit, ShapePanel, TEXT_SCALE_RANGE,
};
use super::types::{ArrowMode, LinkRestyle, MapSnapshot, Valence};

const MODES: [(Mode, &str); 3] = [
	(Mode::ConceptSelect, "Concepts"),
	(Mode::LinkSelect, "Links"),
	(Mode::Cursor, "Select"),
];

/// Shared handle the event handlers and the frame loop go through. Every
/// update ends by sending queued changes and refreshing the side panel.
#[derive(Clone)]
struct Editor {
	state: Rc<RefCell<Option<ConceptMapState>>>,
	client: Rc<PersistenceClient>,
	inspector: RwSignal<Inspector>,
}

impl Editor {
	fn update(&self, f: impl FnOnce(&mut ConceptMapState)) {
		let synced = self.state.borrow_mut().as_mut().map(|s| {
			f(s);
			(s.drain_outbox(), s.inspector())
		});
		if let Some((events, inspector)) = synced {
			self.client.submit(events);
			if self.inspector.with_untracked(|current| *current != inspector) {
				self.inspector.set(inspector);
			}
		}
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

#[component]
pub fn ConceptMapCanvas(
	#[prop(into)] snapshot: Signal<MapSnapshot>,
	#[prop(optional)] config: EditorConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let inspector = RwSignal::new(Inspector::default());
	let editor = Editor {
		state: Rc::new(RefCell::new(None)),
		client: Rc::new(PersistenceClient::new(config.persistence.clone())),
		inspector,
	};
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (editor_init, animate_init, resize_cb_init) =
		(editor.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("concept map needs a browser window");
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			let parent = |f: fn(&web_sys::Element) -> i32, fallback| {
				canvas
					.parent_element()
					.map(|p| f(&p) as f64)
					.unwrap_or(fallback)
			};
			(
				width.unwrap_or_else(|| parent(web_sys::Element::client_width, 800.0)),
				height.unwrap_or_else(|| parent(web_sys::Element::client_height, 600.0)),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("canvas has no 2d context");
			return;
		};
		let mut state = ConceptMapState::from_snapshot(&snapshot.get(), config.clone());
		state.resize(w, h);
		*editor_init.state.borrow_mut() = Some(state);
		editor_init.update(|_| {});

		if fullscreen && resize_cb_init.borrow().is_none() {
			let (editor_resize, canvas_resize) = (editor_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				editor_resize.update(|s| s.resize(nw, nh));
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		// A new snapshot replaces the state; the running loop picks it up.
		if animate_init.borrow().is_some() {
			return;
		}
		let (editor_anim, animate_inner) = (editor_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let mut resolved = false;
			if let Some(ref mut s) = *editor_anim.state.borrow_mut() {
				resolved = s.tick(js_sys::Date::now());
				render::render(s, &ctx);
			}
			if resolved {
				editor_anim.update(|_| {});
			}
			if let (Some(window), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let editor_md = editor.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let modifier = ev.shift_key() || ev.ctrl_key() || ev.meta_key();
		editor_md.update(|s| s.pointer_down(x, y, modifier));
	};

	let editor_mm = editor.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		// Moves only change the picture; the panel refreshes on release.
		if let Some(ref mut s) = *editor_mm.state.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let editor_mu = editor.clone();
	let on_mouseup = move |_: MouseEvent| {
		editor_mu.update(|s| s.pointer_up(js_sys::Date::now()));
	};

	let editor_ml = editor.clone();
	let on_mouseleave = move |_: MouseEvent| {
		editor_ml.update(|s| s.pointer_leave());
	};

	let editor_kd = editor.clone();
	let on_keydown = move |ev: KeyboardEvent| match ev.key().as_str() {
		"Delete" | "Backspace" => {
			ev.prevent_default();
			editor_kd.update(|s| s.delete_selection());
		}
		"Escape" => editor_kd.update(|s| s.close_editor()),
		_ => {}
	};

	// Panel widgets are rebuilt inside reactive closures, which cannot hold
	// the `Rc` handle directly.
	let editor = StoredValue::new_local(editor);
	let run = move |f: Box<dyn FnOnce(&mut ConceptMapState)>| {
		editor.with_value(|e| e.update(f));
	};
	let edit = move |edit: ShapeEdit| {
		run(Box::new(move |s| {
			if let Some(id) = s.interaction.open_editor() {
				if let Err(e) = s.edit_shape(id, edit) {
					warn!("{e}");
				}
			}
		}));
	};
	let restyle = move |restyle: LinkRestyle| {
		run(Box::new(move |s| {
			if let Some(id) = s.interaction.selected_link() {
				if let Err(e) = s.restyle_link(id, restyle) {
					warn!("{e}");
				}
			}
		}));
	};

	let shape_key = Memo::new(move |_| {
		inspector.with(|i| i.shape.as_ref().map(|p| (p.id, p.editing, p.modifiable)))
	});
	let link_key = Memo::new(move |_| inspector.with(|i| i.link.as_ref().map(|p| p.id)));

	let shape_panel = move || {
		shape_key.get().map(|(id, editing, modifiable)| {
			let locked = !(editing && modifiable);
			let field = move |f: fn(&ShapePanel) -> String| {
				move || inspector.with(|i| i.shape.as_ref().map(f).unwrap_or_default())
			};
			view! {
				<section class="concept-panel">
					<h2>{if editing { "Edit concept" } else { "Concept" }}</h2>
					<p class="concept-id">
						{id.to_string()} " · " {field(|p| p.class_name.to_string())}
					</p>
					<label>
						"Title"
						<input
							type="text"
							maxlength="50"
							disabled=locked
							prop:value=field(|p| p.title.clone())
							on:input=move |ev| edit(ShapeEdit::Title(event_target_value(&ev)))
						/>
					</label>
					<label>
						"Negative / positive"
						<input
							type="range"
							min=SLIDE_MIN.to_string()
							max=SLIDE_MAX.to_string()
							step="1"
							disabled=locked
							prop:value=field(|p| p.slide_value.to_string())
							on:input=move |ev| {
								if let Ok(v) = event_target_value(&ev).parse::<i32>() {
									edit(ShapeEdit::Slide(v));
								}
							}
						/>
					</label>
					<label>
						<input
							type="checkbox"
							disabled=locked
							prop:checked=move || {
								inspector.with(|i| i.shape.as_ref().is_some_and(|p| p.ambivalent))
							}
							on:change=move |ev| edit(ShapeEdit::Ambivalent(event_target_checked(&ev)))
						/>
						"Ambivalent"
					</label>
					<label>
						"Text size"
						<input
							type="number"
							min=TEXT_SCALE_RANGE.0.to_string()
							max=TEXT_SCALE_RANGE.1.to_string()
							disabled=locked
							prop:value=field(|p| p.text_scale.to_string())
							on:change=move |ev| {
								if let Ok(v) = event_target_value(&ev).parse::<f64>() {
									edit(ShapeEdit::TextScale(v));
								}
							}
						/>
					</label>
					<label>
						"Note"
						<textarea
							disabled=locked
							prop:value=field(|p| p.note.clone())
							on:input=move |ev| edit(ShapeEdit::Note(event_target_value(&ev)))
						></textarea>
					</label>
					<Show when=move || editing>
						<button on:click=move |_| run(Box::new(|s| s.close_editor()))>"Done"</button>
					</Show>
				</section>
			}
		})
	};

	let link_panel = move || {
		link_key.get().map(|_| {
			let field = move |f: fn(&LinkPanel) -> String| {
				move || inspector.with(|i| i.link.as_ref().map(f).unwrap_or_default())
			};
			view! {
				<section class="link-panel">
					<h2>"Link"</h2>
					<p>{field(|p| format!("{} → {}", p.start_title, p.end_title))}</p>
					<label>
						"Line"
						<select
							prop:value=field(|p| format!("{:?}", p.valence))
							on:change=move |ev| {
								let valence = match event_target_value(&ev).as_str() {
									"Dashed" => Valence::Dashed,
									_ => Valence::Solid,
								};
								restyle(LinkRestyle {
									valence: Some(valence),
									..LinkRestyle::default()
								});
							}
						>
							<option value="Solid">"Solid"</option>
							<option value="Dashed">"Dashed"</option>
						</select>
					</label>
					<label>
						"Strength"
						<input
							type="range"
							min="0"
							max="2"
							step="1"
							prop:value=field(|p| p.strength_slide.to_string())
							on:input=move |ev| {
								if let Ok(v) = event_target_value(&ev).parse::<i32>() {
									restyle(LinkRestyle {
										strength: Some(strength_for(v)),
										..LinkRestyle::default()
									});
								}
							}
						/>
					</label>
					<label>
						"Arrows"
						<select
							prop:value=field(|p| p.arrow_mode.name().to_string())
							on:change=move |ev| {
								if let Some(mode) = ArrowMode::from_name(&event_target_value(&ev)) {
									restyle(LinkRestyle {
										arrow_mode: Some(mode),
										..LinkRestyle::default()
									});
								}
							}
						>
							{ArrowMode::ALL
								.into_iter()
								.map(|mode| view! { <option value=mode.name()>{mode.name()}</option> })
								.collect_view()}
						</select>
					</label>
					<button on:click=move |_| run(Box::new(|s| s.delete_selection()))>"Delete link"</button>
				</section>
			}
		})
	};

	view! {
		<div class="concept-map">
			<nav class="concept-map-toolbar">
				{MODES
					.into_iter()
					.map(|(mode, label)| {
						view! {
							<button
								class:active=move || inspector.with(|i| i.mode == mode)
								on:click=move |_| run(Box::new(move |s| s.set_mode(mode)))
							>
								{label}
							</button>
						}
					})
					.collect_view()}
				<button on:click=move |_| run(Box::new(|s| s.zoom_out()))>"−"</button>
				<span class="zoom">{move || format!("{}%", inspector.with(|i| i.zoom_percent))}</span>
				<button on:click=move |_| run(Box::new(|s| s.zoom_in()))>"+"</button>
				<button on:click=move |_| run(Box::new(|s| s.request_undo()))>"Undo"</button>
				<span class="status">{move || inspector.with(|i| i.status.clone())}</span>
			</nav>
			<canvas
				node_ref=canvas_ref
				class="concept-map-canvas"
				tabindex="0"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:keydown=on_keydown
				style=move || {
					let cursor = match inspector.with(|i| i.mode) {
						Mode::LinkSelect => "crosshair",
						Mode::ConceptSelect | Mode::Cursor => "default",
					};
					format!("display: block; cursor: {cursor};")
				}
			/>
			<aside class="concept-map-inspector">{shape_panel} {link_panel}</aside>
		</div>
	}
}
