//! Changes mirrored to the server. Requests are fire-and-forget: failures
//! are logged, never retried, and local state is not rolled back.

use log::{error, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use super::types::{LinkId, LinkRecord, ShapeId, ShapeRecord};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PersistenceEvent {
	ShapeCreated { shape: ShapeRecord },
	ShapeUpdated { shape: ShapeRecord },
	ShapeDeleted { id: ShapeId },
	LinkCreated { link: LinkRecord },
	LinkUpdated { link: LinkRecord },
	LinkDeleted { id: LinkId },
	Undo,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
	#[error("could not encode change: {0}")]
	Encode(#[from] serde_json::Error),
	#[error("no browser window")]
	NoWindow,
	#[error("request failed: {0}")]
	Request(String),
	#[error("server answered {0}")]
	Status(u16),
}

impl From<JsValue> for PersistenceError {
	fn from(value: JsValue) -> Self {
		PersistenceError::Request(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
	/// When off, changes are only logged.
	pub enabled: bool,
	pub change_url: String,
	pub undo_url: String,
}

impl Default for PersistenceConfig {
	fn default() -> Self {
		Self {
			enabled: false,
			change_url: "/api/cam/changes".into(),
			undo_url: "/api/cam/undo".into(),
		}
	}
}

#[derive(Clone, Debug)]
pub struct PersistenceClient {
	config: PersistenceConfig,
}

impl PersistenceClient {
	pub fn new(config: PersistenceConfig) -> Self {
		Self { config }
	}

	pub fn submit(&self, events: Vec<PersistenceEvent>) {
		for event in events {
			let body = match serde_json::to_string(&event) {
				Ok(body) => body,
				Err(e) => {
					error!("{}", PersistenceError::from(e));
					continue;
				}
			};
			if !self.config.enabled {
				info!("change (not sent): {body}");
				continue;
			}
			let undo = event == PersistenceEvent::Undo;
			let url = if undo {
				self.config.undo_url.clone()
			} else {
				self.config.change_url.clone()
			};
			wasm_bindgen_futures::spawn_local(async move {
				match post_json(&url, &body).await {
					Ok(()) if undo => reload(),
					Ok(()) => {}
					Err(e) => error!("could not save change to {url}: {e}"),
				}
			});
		}
	}
}

async fn post_json(url: &str, body: &str) -> Result<(), PersistenceError> {
	let window = web_sys::window().ok_or(PersistenceError::NoWindow)?;
	let init = RequestInit::new();
	init.set_method("POST");
	init.set_body(&JsValue::from_str(body));
	let request = Request::new_with_str_and_init(url, &init)?;
	request.headers().set("Content-Type", "application/json")?;
	let response: Response = JsFuture::from(window.fetch_with_request(&request))
		.await?
		.dyn_into()?;
	if !response.ok() {
		return Err(PersistenceError::Status(response.status()));
	}
	Ok(())
}

/// Undo happens on the server; the page is rebuilt from scratch.
fn reload() {
	if let Some(window) = web_sys::window() {
		if let Err(e) = window.location().reload() {
			error!("reload after undo failed: {e:?}");
		}
	}
}
