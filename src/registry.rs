//! Idempotent component registration by tag name.

use hashbrown::{hash_map::Entry, HashMap};
use tracing::{debug, trace};

/// Maps tag names to component definitions. Defining a tag twice keeps the first definition.
#[derive(Debug)]
pub struct Registry<C> {
	definitions: HashMap<String, C>,
}

impl<C> Default for Registry<C> {
	fn default() -> Self {
		Self::new()
	}
}

impl<C> Registry<C> {
	#[must_use]
	pub fn new() -> Self {
		Self { definitions: HashMap::new() }
	}

	/// Registers `definition` under `tag` unless the tag is already taken.
	///
	/// Returns whether `definition` was stored.
	pub fn define(&mut self, tag: &str, definition: C) -> bool {
		match self.definitions.entry(tag.to_owned()) {
			Entry::Occupied(_) => {
				debug!(tag, "Already defined. Ignoring the new definition.");
				false
			}
			Entry::Vacant(vacant) => {
				vacant.insert(definition);
				trace!(tag, "Defined.");
				true
			}
		}
	}

	#[must_use]
	pub fn get(&self, tag: &str) -> Option<&C> {
		self.definitions.get(tag)
	}

	#[must_use]
	pub fn is_defined(&self, tag: &str) -> bool {
		self.definitions.contains_key(tag)
	}
}
