use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::{GeometryConfig, Segment, compute_segment};
use super::registry::ShapeRegistry;
use super::types::{LinkId, LinkRecord, LinkRestyle, LinkStyle, ShapeId};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LinkError {
	#[error("{0} does not exist")]
	InvalidEndpoint(ShapeId),
	#[error("a link cannot start and end at {0}")]
	SelfLink(ShapeId),
	#[error("a link between {start} and {end} already exists")]
	DuplicateLink { start: ShapeId, end: ShapeId },
	#[error("{0} does not exist")]
	UnknownLink(LinkId),
	#[error("{0} is already in use")]
	IdInUse(LinkId),
}

/// Which links count as duplicates of each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkUniqueness {
	/// One link per ordered (start, end) pair; A→B and B→A may coexist.
	#[default]
	PerDirection,
	/// One link per unordered pair.
	PerPair,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	pub id: LinkId,
	pub start: ShapeId,
	pub end: ShapeId,
	pub style: LinkStyle,
	pub segment: Segment,
}

impl Link {
	pub fn touches(&self, shape: ShapeId) -> bool {
		self.start == shape || self.end == shape
	}

	pub fn to_record(&self) -> LinkRecord {
		LinkRecord {
			id: self.id,
			start_id: self.start,
			end_id: self.end,
			line_style: self.style.line_style(),
			arrow_type: self.style.arrow_mode,
		}
	}
}

/// Owns every link and keeps its geometry in step with the endpoint shapes.
///
/// Links never observe shapes: whoever moves or resizes a shape calls
/// [`LinkManager::reposition_attached`] once the change is committed.
#[derive(Clone, Debug, Default)]
pub struct LinkManager {
	links: BTreeMap<LinkId, Link>,
	next_id: u32,
	uniqueness: LinkUniqueness,
	geometry: GeometryConfig,
}

impl LinkManager {
	pub fn new(geometry: GeometryConfig, uniqueness: LinkUniqueness) -> Self {
		Self {
			geometry,
			uniqueness,
			..Self::default()
		}
	}

	pub fn get(&self, id: LinkId) -> Option<&Link> {
		self.links.get(&id)
	}

	pub fn len(&self) -> usize {
		self.links.len()
	}

	/// Links in id order.
	pub fn iter(&self) -> impl Iterator<Item = &Link> {
		self.links.values()
	}

	pub fn links_for_shape(&self, shape: ShapeId) -> impl Iterator<Item = &Link> {
		self.links.values().filter(move |link| link.touches(shape))
	}

	/// The link that would clash with a new `start` → `end` link.
	pub fn find_conflict(&self, start: ShapeId, end: ShapeId) -> Option<&Link> {
		self.links.values().find(|link| {
			(link.start == start && link.end == end)
				|| (self.uniqueness == LinkUniqueness::PerPair
					&& link.start == end
					&& link.end == start)
		})
	}

	/// Closest link whose rendered bar passes within `tolerance` of the point.
	pub fn link_at(&self, x: f64, y: f64, tolerance: f64) -> Option<LinkId> {
		self.links
			.values()
			.map(|link| (link.id, link.segment.distance_to(x, y)))
			.filter(|(_, distance)| *distance <= tolerance)
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(id, _)| id)
	}

	pub fn create_link(
		&mut self,
		shapes: &ShapeRegistry,
		start: ShapeId,
		end: ShapeId,
		style: LinkStyle,
	) -> Result<LinkId, LinkError> {
		let id = LinkId(self.next_id);
		self.insert_link(shapes, id, start, end, style)?;
		Ok(id)
	}

	/// Create a link under a known id, as when restoring persisted links.
	pub fn insert_link(
		&mut self,
		shapes: &ShapeRegistry,
		id: LinkId,
		start: ShapeId,
		end: ShapeId,
		style: LinkStyle,
	) -> Result<(), LinkError> {
		if self.links.contains_key(&id) {
			return Err(LinkError::IdInUse(id));
		}
		if start == end {
			return Err(LinkError::SelfLink(start));
		}
		let start_rect = shapes.rect(start).ok_or(LinkError::InvalidEndpoint(start))?;
		let end_rect = shapes.rect(end).ok_or(LinkError::InvalidEndpoint(end))?;
		if self.find_conflict(start, end).is_some() {
			return Err(LinkError::DuplicateLink { start, end });
		}

		let segment = compute_segment(&start_rect, &end_rect, style.arrow_mode, &self.geometry);
		debug!(
			"routing {id}: heading {:.3} rad, swapped {}, insets {:?}",
			segment.heading, segment.swapped, segment.insets
		);
		self.links.insert(
			id,
			Link {
				id,
				start,
				end,
				style,
				segment,
			},
		);
		self.next_id = self.next_id.max(id.0.saturating_add(1));
		debug!("created {id}: {start} -> {end} ({:?})", style.arrow_mode);
		Ok(())
	}

	/// Recompute a link from its endpoints' current rects.
	pub fn reposition_link(
		&mut self,
		shapes: &ShapeRegistry,
		id: LinkId,
	) -> Result<&Segment, LinkError> {
		let link = self.links.get_mut(&id).ok_or(LinkError::UnknownLink(id))?;
		let start = shapes
			.rect(link.start)
			.ok_or(LinkError::InvalidEndpoint(link.start))?;
		let end = shapes
			.rect(link.end)
			.ok_or(LinkError::InvalidEndpoint(link.end))?;
		link.segment = compute_segment(&start, &end, link.style.arrow_mode, &self.geometry);
		Ok(&link.segment)
	}

	/// Reposition every link attached to `shape`.
	pub fn reposition_attached(&mut self, shapes: &ShapeRegistry, shape: ShapeId) -> Vec<LinkId> {
		let ids: Vec<LinkId> = self.links_for_shape(shape).map(|link| link.id).collect();
		ids.into_iter()
			.filter(|id| match self.reposition_link(shapes, *id) {
				Ok(_) => true,
				Err(e) => {
					warn!("could not reposition {id}: {e}");
					false
				}
			})
			.collect()
	}

	pub fn restyle_link(
		&mut self,
		shapes: &ShapeRegistry,
		id: LinkId,
		restyle: LinkRestyle,
	) -> Result<&Link, LinkError> {
		let link = self.links.get_mut(&id).ok_or(LinkError::UnknownLink(id))?;
		let start = shapes
			.rect(link.start)
			.ok_or(LinkError::InvalidEndpoint(link.start))?;
		let end = shapes
			.rect(link.end)
			.ok_or(LinkError::InvalidEndpoint(link.end))?;
		// Nothing is written until the new segment is known.
		let mut style = link.style;
		restyle.apply(&mut style);
		link.segment = compute_segment(&start, &end, style.arrow_mode, &self.geometry);
		link.style = style;
		Ok(&*link)
	}

	pub fn delete_link(&mut self, id: LinkId) -> Result<Link, LinkError> {
		self.links.remove(&id).ok_or(LinkError::UnknownLink(id))
	}

	/// Remove every link attached to `shape`.
	pub fn remove_links_for_shape(&mut self, shape: ShapeId) -> Vec<Link> {
		let ids: Vec<LinkId> = self.links_for_shape(shape).map(|link| link.id).collect();
		ids.into_iter()
			.filter_map(|id| self.links.remove(&id))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use approx::assert_relative_eq;

	use super::*;
	use crate::components::concept_map::registry::Shape;
	use crate::components::concept_map::types::{
		ArrowMode, ShapeClass, ShapeRect, Strength, Valence,
	};

	fn registry() -> ShapeRegistry {
		let mut shapes = ShapeRegistry::new();
		for (id, x) in [(1, 0.0), (2, 300.0), (3, 600.0)] {
			shapes.insert(Shape {
				id: ShapeId(id),
				title: String::new(),
				rect: ShapeRect::new(x, 0.0, 100.0, 60.0),
				text_scale: 12.0,
				class: ShapeClass::Rectangle,
				note: None,
				modifiable: true,
				resizable: true,
			});
		}
		shapes
	}

	const A: ShapeId = ShapeId(1);
	const B: ShapeId = ShapeId(2);
	const C: ShapeId = ShapeId(3);

	#[test]
	fn create_computes_geometry() {
		let shapes = registry();
		let mut links = LinkManager::default();
		let id = links
			.create_link(&shapes, A, B, LinkStyle::default())
			.unwrap();
		let link = links.get(id).unwrap();
		assert_eq!(link.segment.length, 300.0);
		assert_eq!(link.segment.angle, 0.0);
	}

	#[test]
	fn rejects_missing_and_self_endpoints() {
		let shapes = registry();
		let mut links = LinkManager::default();
		assert_eq!(
			links.create_link(&shapes, A, ShapeId(99), LinkStyle::default()),
			Err(LinkError::InvalidEndpoint(ShapeId(99)))
		);
		assert_eq!(
			links.create_link(&shapes, A, A, LinkStyle::default()),
			Err(LinkError::SelfLink(A))
		);
		assert_eq!(links.len(), 0);
	}

	#[test]
	fn duplicates_per_direction() {
		let shapes = registry();
		let mut links = LinkManager::default();
		links
			.create_link(&shapes, A, B, LinkStyle::default())
			.unwrap();
		assert_eq!(
			links.create_link(&shapes, A, B, LinkStyle::default()),
			Err(LinkError::DuplicateLink { start: A, end: B })
		);
		assert!(links.create_link(&shapes, B, A, LinkStyle::default()).is_ok());
	}

	#[test]
	fn duplicates_per_pair() {
		let shapes = registry();
		let mut links = LinkManager::new(GeometryConfig::default(), LinkUniqueness::PerPair);
		links
			.create_link(&shapes, A, B, LinkStyle::default())
			.unwrap();
		assert_eq!(
			links.create_link(&shapes, B, A, LinkStyle::default()),
			Err(LinkError::DuplicateLink { start: B, end: A })
		);
	}

	#[test]
	fn reposition_reads_current_position() {
		let mut shapes = registry();
		let mut links = LinkManager::default();
		let id = links
			.create_link(&shapes, A, B, LinkStyle::default())
			.unwrap();
		shapes.get_mut(B).unwrap().rect = ShapeRect::new(300.0, 150.0, 100.0, 60.0);
		let segment = *links.reposition_link(&shapes, id).unwrap();
		assert_eq!(segment.angle, 150f64.atan2(300.0));
		assert_relative_eq!(segment.length, 300f64.hypot(150.0));
	}

	#[test]
	fn reposition_is_idempotent() {
		let mut shapes = registry();
		let mut links = LinkManager::default();
		let style = LinkStyle {
			arrow_mode: ArrowMode::Uni,
			..LinkStyle::default()
		};
		let id = links.create_link(&shapes, B, A, style).unwrap();
		shapes.get_mut(A).unwrap().rect = ShapeRect::new(-37.5, 211.25, 140.0, 90.0);
		let first = *links.reposition_link(&shapes, id).unwrap();
		let second = *links.reposition_link(&shapes, id).unwrap();
		for (a, b) in [
			(first.length, second.length),
			(first.angle, second.angle),
			(first.origin_x, second.origin_x),
			(first.origin_y, second.origin_y),
			(first.heading, second.heading),
		] {
			assert_eq!(a.to_bits(), b.to_bits());
		}
		assert_eq!(first, second);
	}

	#[test]
	fn reposition_attached_touches_only_neighbours() {
		let mut shapes = registry();
		let mut links = LinkManager::default();
		let ab = links
			.create_link(&shapes, A, B, LinkStyle::default())
			.unwrap();
		let bc = links
			.create_link(&shapes, B, C, LinkStyle::default())
			.unwrap();
		shapes.get_mut(A).unwrap().rect.y = 400.0;
		assert_eq!(links.reposition_attached(&shapes, A), vec![ab]);
		assert!(links.get(ab).unwrap().segment.angle < 0.0);
		assert_eq!(links.get(bc).unwrap().segment.angle, 0.0);
	}

	#[test]
	fn restyle_to_uni_trims() {
		let shapes = registry();
		let mut links = LinkManager::default();
		let id = links
			.create_link(&shapes, A, B, LinkStyle::default())
			.unwrap();
		let link = links
			.restyle_link(
				&shapes,
				id,
				LinkRestyle {
					valence: Some(Valence::Dashed),
					arrow_mode: Some(ArrowMode::Uni),
					..LinkRestyle::default()
				},
			)
			.unwrap();
		assert_eq!(link.style.valence, Valence::Dashed);
		assert_eq!(link.style.strength, Strength::Weak);
		assert_eq!(link.segment.length, 140.0);
		assert!(link.segment.arrow_at_end_visible);
		assert_eq!(link.to_record().line_style.to_string(), "Dashed-Weak");
	}

	#[test]
	fn failed_restyle_keeps_the_old_style() {
		let mut shapes = registry();
		let mut links = LinkManager::default();
		let id = links
			.create_link(&shapes, A, B, LinkStyle::default())
			.unwrap();
		shapes.remove(B);
		let arrow = LinkRestyle {
			arrow_mode: Some(ArrowMode::Uni),
			..LinkRestyle::default()
		};
		assert_eq!(
			links.restyle_link(&shapes, id, arrow).map(|_| ()),
			Err(LinkError::InvalidEndpoint(B))
		);
		let link = links.get(id).unwrap();
		assert_eq!(link.style.arrow_mode, ArrowMode::None);
		assert_eq!(link.segment.length, 300.0);
	}

	#[test]
	fn inserted_ids_advance_the_counter() {
		let shapes = registry();
		let mut links = LinkManager::default();
		links
			.insert_link(&shapes, LinkId(10), A, B, LinkStyle::default())
			.unwrap();
		assert_eq!(
			links.insert_link(&shapes, LinkId(10), B, C, LinkStyle::default()),
			Err(LinkError::IdInUse(LinkId(10)))
		);
		let next = links
			.create_link(&shapes, B, C, LinkStyle::default())
			.unwrap();
		assert_eq!(next, LinkId(11));
	}

	#[test]
	fn delete_and_cascade() {
		let shapes = registry();
		let mut links = LinkManager::default();
		let ab = links
			.create_link(&shapes, A, B, LinkStyle::default())
			.unwrap();
		let bc = links
			.create_link(&shapes, B, C, LinkStyle::default())
			.unwrap();
		let ca = links
			.create_link(&shapes, C, A, LinkStyle::default())
			.unwrap();
		assert_eq!(links.delete_link(bc).unwrap().id, bc);
		assert_eq!(links.delete_link(bc), Err(LinkError::UnknownLink(bc)));
		let removed: Vec<_> = links
			.remove_links_for_shape(A)
			.into_iter()
			.map(|l| l.id)
			.collect();
		assert_eq!(removed, vec![ab, ca]);
		assert_eq!(links.len(), 0);
	}

	#[test]
	fn picks_nearest_link() {
		let shapes = registry();
		let mut links = LinkManager::default();
		let ab = links
			.create_link(&shapes, A, B, LinkStyle::default())
			.unwrap();
		assert_eq!(links.link_at(200.0, 34.0, 8.0), Some(ab));
		assert_eq!(links.link_at(200.0, 60.0, 8.0), None);
	}
}
