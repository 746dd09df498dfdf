//! The document seam.
//!
//! Everything the picker knows about the page is read from and written to a tree through [`Dom`].
//! There is no separate state store: selection, bound product and swatch visibility all live in the tree.

use crate::{selector::Selector, Result};
use core::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
	Document,
	Element,
	Text,
	Comment,
	Other,
}

/// A document tree the picker can read and patch.
///
/// Node handles are cheap to clone and compare by identity.
/// Mutations that can fail in a host are expected to log and carry on,
/// except where a value must be produced.
pub trait Dom {
	type Node: Clone + PartialEq + Debug;

	/// The live document.
	fn document(&self) -> Self::Node;

	/// Parses `markup` into a detached document.
	///
	/// # Errors
	///
	/// Iff the host parser rejects the markup outright.
	fn parse_document(&self, markup: &str) -> Result<Self::Node>;

	fn kind(&self, node: &Self::Node) -> NodeKind;

	/// Lowercase local name of an element, [`None`] for other nodes.
	fn local_name(&self, node: &Self::Node) -> Option<String>;

	fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
	/// All attributes in source order.
	fn attributes(&self, node: &Self::Node) -> Vec<(String, String)>;
	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
	fn remove_attribute(&self, node: &Self::Node, name: &str);

	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
	fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

	fn text_content(&self, node: &Self::Node) -> String;
	fn set_text_content(&self, node: &Self::Node, text: &str);

	/// Data of a text or comment node.
	fn character_data(&self, node: &Self::Node) -> Option<String>;
	fn set_character_data(&self, node: &Self::Node, data: &str);

	/// Creates a detached element owned by the live document.
	///
	/// # Errors
	///
	/// Iff the host refuses the name.
	fn create_element(&self, local_name: &str) -> Result<Self::Node>;

	/// Deep-copies a node from another document into the live one (detached).
	///
	/// # Errors
	///
	/// Iff the host can't adopt the node.
	fn import(&self, foreign: &Self::Node) -> Result<Self::Node>;

	/// Inserts `child` into `parent` before `reference`, or at the end.
	fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>);
	/// Detaches `node` from its parent, if any.
	fn remove(&self, node: &Self::Node);

	/// Live checkedness of an input. `false` for anything else.
	fn checked(&self, node: &Self::Node) -> bool;
	fn set_checked(&self, node: &Self::Node, checked: bool);

	/// Live value of a form control.
	fn value(&self, node: &Self::Node) -> Option<String>;

	/// Whether the element is hidden through its inline `display` style.
	fn hidden(&self, node: &Self::Node) -> bool;
	/// Sets (`true`) or clears (`false`) an inline `display: none`.
	fn set_hidden(&self, node: &Self::Node, hidden: bool);

	fn append_child(&self, parent: &Self::Node, child: &Self::Node) {
		self.insert_before(parent, child, None)
	}

	fn matches(&self, node: &Self::Node, selector: &Selector) -> bool {
		selector.matches(self, node)
	}

	/// All descendants of `scope` in document order, excluding `scope` itself.
	fn descendants(&self, scope: &Self::Node) -> Vec<Self::Node> {
		let mut found = Vec::new();
		let mut stack: Vec<Self::Node> = self.children(scope).into_iter().rev().collect();
		while let Some(node) = stack.pop() {
			stack.extend(self.children(&node).into_iter().rev());
			found.push(node);
		}
		found
	}

	/// First matching descendant of `scope` in document order.
	fn query(&self, scope: &Self::Node, selector: &Selector) -> Option<Self::Node> {
		self.descendants(scope).into_iter().find(|node| self.kind(node) == NodeKind::Element && self.matches(node, selector))
	}

	fn query_all(&self, scope: &Self::Node, selector: &Selector) -> Vec<Self::Node> {
		self.descendants(scope).into_iter().filter(|node| self.kind(node) == NodeKind::Element && self.matches(node, selector)).collect()
	}

	/// `node` or its nearest ancestor matching `selector`.
	fn closest(&self, node: &Self::Node, selector: &Selector) -> Option<Self::Node> {
		let mut current = Some(node.clone());
		while let Some(node) = current {
			if self.kind(&node) == NodeKind::Element && self.matches(&node, selector) {
				return Some(node);
			}
			current = self.parent(&node);
		}
		None
	}
}
