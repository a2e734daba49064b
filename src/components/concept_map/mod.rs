mod component;
mod config;
mod geometry;
mod interaction;
mod links;
mod node_style;
mod persistence;
mod registry;
mod render;
mod state;
mod types;
mod viewport;

pub use component::ConceptMapCanvas;
pub use config::EditorConfig;
pub use types::MapSnapshot;
