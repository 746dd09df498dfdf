//! Selection state, derived from the option tree on every read.
//!
//! Nothing here is cached: a fetch that was in flight while the user changed the selection
//! must see the new tree, not a snapshot.

use crate::{dom::Dom, selector::Selector, Error, Result};
use tracing::{instrument, trace};

pub const OPTION_VALUE_ID: &str = "data-option-value-id";
pub const VARIANT_ID: &str = "data-variant-id";
pub const CONNECTED_PRODUCT_URL: &str = "data-connected-product-url";

/// `select option[selected], fieldset input:checked`
#[must_use]
pub fn selected_options() -> Selector {
	Selector::tag("option")
		.with_attribute("selected")
		.within(Selector::tag("select"))
		.or(Selector::tag("input").checked().within(Selector::tag("fieldset")))
}

/// Where a selection change is addressed: either an element in the option tree or an option value ID.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a, N> {
	Element(&'a N),
	OptionValueId(&'a str),
}

/// Reads (and, for the change handler, writes) the selection inside one picker.
pub struct SelectionReader<'a, D: Dom> {
	dom: &'a D,
	picker: &'a D::Node,
}

impl<'a, D: Dom> SelectionReader<'a, D> {
	pub fn new(dom: &'a D, picker: &'a D::Node) -> Self {
		Self { dom, picker }
	}

	/// The first selected option in document order, if any.
	#[must_use]
	pub fn selected_option(&self) -> Option<D::Node> {
		self.dom
			.query_all(self.picker, &selected_options())
			.into_iter()
			.find(|node| matches!(self.dom.local_name(node).as_deref(), Some("input") | Some("option")))
	}

	/// # Errors
	///
	/// [`Error::MissingOptionValueId`] iff the selected option carries no ID.
	pub fn selected_option_id(&self) -> Result<Option<String>> {
		match self.selected_option() {
			None => Ok(None),
			Some(option) => self.dom.attribute(&option, OPTION_VALUE_ID).filter(|id| !id.is_empty()).map(Some).ok_or(Error::MissingOptionValueId),
		}
	}

	/// IDs of every selected option across all axes, in document order.
	///
	/// # Errors
	///
	/// [`Error::MissingOptionValueId`] iff any selected option carries no ID.
	pub fn selected_option_ids(&self) -> Result<Vec<String>> {
		self.dom
			.query_all(self.picker, &selected_options())
			.iter()
			.map(|option| self.dom.attribute(option, OPTION_VALUE_ID).filter(|id| !id.is_empty()).ok_or(Error::MissingOptionValueId))
			.collect()
	}

	/// Marks `target` as selected.
	///
	/// Inputs become checked. For a `select`, the `selected` attribute moves to the option matching its current value.
	///
	/// # Errors
	///
	/// [`Error::TargetNotFound`] iff an option value ID matches nothing in this picker,
	/// [`Error::OptionNotFound`] iff a `select`'s value matches none of its options.
	#[instrument(skip(self, target))]
	pub fn update_selected_option(&self, target: Target<'_, D::Node>) -> Result<D::Node> {
		let target = match target {
			Target::Element(element) => element.clone(),
			Target::OptionValueId(id) => self.dom.query(self.picker, &Selector::attribute_equals(OPTION_VALUE_ID, id)).ok_or_else(|| Error::TargetNotFound(id.to_owned()))?,
		};

		match self.dom.local_name(&target).as_deref() {
			Some("input") => self.dom.set_checked(&target, true),
			Some("select") => {
				let value = self.dom.value(&target).unwrap_or_default();
				let options = self.dom.query_all(&target, &Selector::tag("option"));
				let chosen = options.iter().find(|option| self.dom.value(option).as_deref() == Some(value.as_str())).ok_or_else(|| Error::OptionNotFound(value.clone()))?;
				for option in &options {
					self.dom.remove_attribute(option, "selected")
				}
				self.dom.set_attribute(chosen, "selected", "selected");
			}
			other => trace!("Nothing to mark selected on {:?}.", other),
		}
		Ok(target)
	}

	/// The option element a change on `target` refers to: the input itself, or a `select`'s chosen option.
	#[must_use]
	pub fn changed_option(&self, target: &D::Node) -> D::Node {
		if self.dom.local_name(target).as_deref() != Some("select") {
			return target.clone();
		}
		let value = self.dom.value(target);
		let options = self.dom.query_all(target, &Selector::tag("option"));
		options
			.iter()
			.find(|option| self.dom.attribute(option, "selected").is_some())
			.or_else(|| options.iter().find(|option| self.dom.value(option) == value))
			.cloned()
			.unwrap_or_else(|| target.clone())
	}

	/// The concrete variant a change on `target` resolved to. Only radio inputs and `select`s carry one.
	#[must_use]
	pub fn variant_id(&self, target: &D::Node) -> Option<String> {
		let carrier = match self.dom.local_name(target).as_deref() {
			Some("input") if self.dom.attribute(target, "type").as_deref() == Some("radio") => target.clone(),
			Some("select") => self.changed_option(target),
			_ => return None,
		};
		self.dom.attribute(&carrier, VARIANT_ID).filter(|id| !id.is_empty())
	}
}

#[cfg(test)]
mod tests {
	use super::{SelectionReader, Target};
	use crate::{dom::Dom, selector::Selector, synthetic::SyntheticDom, Error};

	const PICKER: &str = r#"<variant-picker>
		<fieldset><legend>Color</legend>
			<input type="radio" name="color" data-option-value-id="red" data-variant-id="11">
			<input type="radio" name="color" data-option-value-id="blue" data-variant-id="12" checked>
		</fieldset>
		<select name="size">
			<option value="s" data-option-value-id="small" data-variant-id="">S</option>
			<option value="m" data-option-value-id="medium" data-variant-id="22" selected>M</option>
		</select>
	</variant-picker>"#;

	fn picker(dom: &SyntheticDom) -> <SyntheticDom as Dom>::Node {
		dom.query(&dom.document(), &Selector::tag("variant-picker")).unwrap()
	}

	#[test]
	fn reads_selection_in_document_order() {
		let dom = SyntheticDom::new(PICKER);
		let picker = picker(&dom);
		let reader = SelectionReader::new(&dom, &picker);
		assert_eq!(reader.selected_option_id().unwrap().as_deref(), Some("blue"));
		assert_eq!(reader.selected_option_ids().unwrap(), vec!["blue", "medium"]);
	}

	#[test]
	fn missing_ids_are_integrity_errors() {
		let dom = SyntheticDom::new(r#"<variant-picker><fieldset><input type="radio" checked></fieldset></variant-picker>"#);
		let picker = picker(&dom);
		let reader = SelectionReader::new(&dom, &picker);
		assert!(matches!(reader.selected_option_id(), Err(Error::MissingOptionValueId)));
		assert!(matches!(reader.selected_option_ids(), Err(Error::MissingOptionValueId)));
	}

	#[test]
	fn updates_radios_by_id() {
		let dom = SyntheticDom::new(PICKER);
		let picker = picker(&dom);
		let reader = SelectionReader::new(&dom, &picker);
		reader.update_selected_option(Target::OptionValueId("red")).unwrap();
		assert_eq!(reader.selected_option_ids().unwrap(), vec!["red", "medium"]);
		assert!(matches!(reader.update_selected_option(Target::OptionValueId("green")), Err(Error::TargetNotFound(_))));
	}

	#[test]
	fn updates_selects_by_value() {
		let dom = SyntheticDom::new(PICKER);
		let picker = picker(&dom);
		let select = dom.query(&picker, &Selector::tag("select")).unwrap();
		let reader = SelectionReader::new(&dom, &picker);

		dom.set_value(&select, "s");
		reader.update_selected_option(Target::Element(&select)).unwrap();
		assert_eq!(reader.selected_option_ids().unwrap(), vec!["blue", "small"]);
		assert_eq!(dom.attribute(&reader.changed_option(&select), "data-option-value-id").as_deref(), Some("small"));
		assert_eq!(reader.variant_id(&select), None);

		dom.set_value(&select, "xl");
		assert!(matches!(reader.update_selected_option(Target::Element(&select)), Err(Error::OptionNotFound(_))));
	}
}
