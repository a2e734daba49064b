use leptos::prelude::*;
use log::{error, info};
use thiserror::Error;

use crate::components::concept_map::{ConceptMapCanvas, EditorConfig, MapSnapshot};

/// Shown when the page embeds no map of its own.
const DEMO_MAP: &str = r#"{
	"shapes": [
		{"id": 1, "title": "Sleep", "x": 120, "y": 160, "width": 160, "height": 120, "shape": "positive strong"},
		{"id": 2, "title": "Mood", "x": 520, "y": 140, "width": 160, "height": 120, "shape": "positive"},
		{"id": 3, "title": "Stress at work", "x": 340, "y": 420, "width": 180, "height": 120, "shape": "negative strong",
		 "note_hidden": false, "note": "Mostly deadlines"},
		{"id": 4, "title": "Coffee", "x": 760, "y": 400, "width": 140, "height": 100, "shape": "ambivalent"}
	],
	"links": [
		{"id": 1, "start_id": 1, "end_id": 2, "line_style": "Solid-Strong", "arrow_type": "uni"},
		{"id": 2, "start_id": 3, "end_id": 1, "line_style": "Dashed", "arrow_type": "uni"},
		{"id": 3, "start_id": 3, "end_id": 2, "line_style": "Dashed-Weak", "arrow_type": "none"},
		{"id": 4, "start_id": 4, "end_id": 1, "line_style": "Dashed-Weak", "arrow_type": "bi"}
	]
}"#;

#[derive(Debug, Error)]
pub enum LoadError {
	#[error("could not read #{id}: {source}")]
	Json {
		id: &'static str,
		source: serde_json::Error,
	},
}

/// Text of a `<script type="application/json">` element on the page.
fn embedded_json(id: &str) -> Option<String> {
	web_sys::window()?
		.document()?
		.get_element_by_id(id)?
		.text_content()
}

fn parse<T>(
	id: &'static str,
	json: &str,
	from_json: fn(&str) -> Result<T, serde_json::Error>,
) -> Result<T, LoadError> {
	from_json(json).map_err(|source| LoadError::Json { id, source })
}

/// Embedded map and config, falling back to the demo map and defaults when
/// either is missing or unreadable.
fn load_map() -> Result<(MapSnapshot, EditorConfig), LoadError> {
	let embedded = embedded_json("cam-data").and_then(|json| {
		parse("cam-data", &json, MapSnapshot::from_json)
			.inspect_err(|e| error!("{e}, showing the demo map"))
			.ok()
	});
	let snapshot = match embedded {
		Some(snapshot) => snapshot,
		None => {
			info!("no embedded map, showing the demo");
			parse("demo", DEMO_MAP, MapSnapshot::from_json)?
		}
	};
	let config = embedded_json("cam-config")
		.and_then(|json| {
			parse("cam-config", &json, EditorConfig::from_json)
				.inspect_err(|e| error!("{e}, using default settings"))
				.ok()
		})
		.unwrap_or_default();
	Ok((snapshot, config))
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			{move || {
				load_map()
					.map(|(snapshot, config)| {
						let snapshot = Signal::derive(move || snapshot.clone());
						view! {
							<div class="fullscreen-map">
								<ConceptMapCanvas snapshot=snapshot config=config fullscreen=true />
							</div>
						}
					})
			}}
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn demo_map_parses() {
		let snapshot = parse("demo", DEMO_MAP, MapSnapshot::from_json).unwrap();
		assert_eq!(snapshot.shapes.len(), 4);
		assert_eq!(snapshot.links.len(), 4);
		assert!(snapshot.shapes.iter().all(|shape| shape.modifiable));
	}

	#[test]
	fn bad_json_names_its_source() {
		let err = parse("cam-config", "{", EditorConfig::from_json).unwrap_err();
		assert!(err.to_string().starts_with("could not read #cam-config"));
	}
}
