//! A small in-place tree merge.
//!
//! Live nodes are kept wherever the fetched tree has a node of the same kind and name at the same position,
//! so element identity (and with it focus, listeners and third-party state) survives.
//! Only mismatching nodes are recreated.

use crate::dom::{Dom, NodeKind};
use tracing::{error, instrument, trace, trace_span, warn};

/// Merges a fetched subtree into a live one.
pub trait Morph<D: Dom> {
	/// Makes `live` (including its own attributes) look like `fetched`, which belongs to another document.
	fn morph(&self, dom: &D, live: &D::Node, fetched: &D::Node);
}

/// The default [`Morph`]: positional child splicing with attribute patching.
#[derive(Debug, Clone, Copy)]
pub struct TreeMorph {
	depth_limit: usize,
}

impl Default for TreeMorph {
	fn default() -> Self {
		Self { depth_limit: 256 }
	}
}

impl TreeMorph {
	#[must_use]
	pub fn with_depth_limit(depth_limit: usize) -> Self {
		Self { depth_limit }
	}
}

impl<D: Dom> Morph<D> for TreeMorph {
	#[instrument(skip(self, dom))]
	fn morph(&self, dom: &D, live: &D::Node, fetched: &D::Node) {
		if dom.kind(live) != NodeKind::Element || dom.local_name(live) != dom.local_name(fetched) {
			return error!("Refusing to morph {:?} into mismatching {:?}.", live, fetched);
		}
		update_element(dom, live, fetched, self.depth_limit)
	}
}

fn update_element<D: Dom>(dom: &D, live: &D::Node, fetched: &D::Node, depth_limit: usize) {
	if depth_limit == 0 {
		return error!("Depth limit reached");
	}

	let before = dom.attributes(live);
	let after = dom.attributes(fetched);
	for (name, _) in before.iter().filter(|(name, _)| !after.iter().any(|(n, _)| n == name)) {
		dom.remove_attribute(live, name)
	}
	for (name, value) in &after {
		if before.iter().find(|(n, _)| n == name).map(|(_, v)| v) != Some(value) {
			dom.set_attribute(live, name, value)
		}
	}

	// Attributes only set defaults. Live form state has to follow explicitly.
	if dom.local_name(live).as_deref() == Some("input") {
		let checked = after.iter().any(|(name, _)| name == "checked");
		if dom.checked(live) != checked {
			dom.set_checked(live, checked)
		}
	}

	splice_children(dom, live, fetched, depth_limit - 1)
}

fn splice_children<D: Dom>(dom: &D, parent: &D::Node, fetched_parent: &D::Node, depth_limit: usize) {
	let live_children = dom.children(parent);
	let fetched_children = dom.children(fetched_parent);

	for (i, fetched) in fetched_children.iter().enumerate() {
		match live_children.get(i) {
			Some(live) if compatible(dom, live, fetched) => match dom.kind(fetched) {
				NodeKind::Element => {
					let span = trace_span!("Updating element", tag = ?dom.local_name(fetched));
					let _enter = span.enter();
					update_element(dom, live, fetched, depth_limit)
				}
				NodeKind::Text | NodeKind::Comment => {
					let data = dom.character_data(fetched).unwrap_or_default();
					if dom.character_data(live).as_deref() != Some(data.as_str()) {
						dom.set_character_data(live, &data)
					}
				}
				NodeKind::Document | NodeKind::Other => trace!("Nothing to update for {:?}.", fetched),
			},
			Some(live) => {
				trace!("Replacing mismatching {:?} with {:?}.", live, fetched);
				match dom.import(fetched) {
					Ok(replacement) => {
						dom.insert_before(parent, &replacement, Some(live));
						dom.remove(live);
					}
					Err(error) => error!("Failed to import node: {}", error),
				}
			}
			None => match dom.import(fetched) {
				Ok(created) => dom.append_child(parent, &created),
				Err(error) => error!("Failed to import node: {}", error),
			},
		}
	}

	if live_children.len() > fetched_children.len() {
		let removed = &live_children[fetched_children.len()..];
		trace!("Removing {} surplus node(s).", removed.len());
		for node in removed {
			dom.remove(node)
		}
	}
}

fn compatible<D: Dom>(dom: &D, live: &D::Node, fetched: &D::Node) -> bool {
	let kind = dom.kind(live);
	if kind != dom.kind(fetched) {
		return false;
	}
	if kind != NodeKind::Element {
		return true;
	}
	if dom.local_name(live) != dom.local_name(fetched) {
		return false;
	}

	let (live_id, fetched_id) = (dom.attribute(live, "id"), dom.attribute(fetched, "id"));
	if live_id.is_some() && fetched_id.is_some() && live_id != fetched_id {
		warn!("Recreating element due to a changed id: {:?} -> {:?}", live_id, fetched_id);
		return false;
	}
	true
}
