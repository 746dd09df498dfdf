//! Applying fetched markup to the live document.

use crate::{
	config::{ProductRef, PRODUCT_ID, PRODUCT_URL},
	dom::Dom,
	morph::Morph,
	selector::Selector,
	Error, Result,
};
use tracing::{instrument, trace};

pub const PROMOTION_CLASS: &str = "product-promotion-callout";

/// `<tag> script[type="application/json"]`
#[must_use]
pub fn payload_selector(tag: &str) -> Selector {
	Selector::tag("script").with_attribute_equals("type", "application/json").within(Selector::tag(tag))
}

/// The embedded variant payload's text, if the fetched document has a non-empty one.
pub fn payload_text<D: Dom>(dom: &D, fetched: &D::Node, tag: &str) -> Option<String> {
	dom.query(fetched, &payload_selector(tag)).map(|script| dom.text_content(&script)).filter(|text| !text.trim().is_empty())
}

/// Deferred overflow lists only matter for the initial render.
pub fn undefer<D: Dom>(dom: &D, fetched: &D::Node) {
	if let Some(list) = dom.query(fetched, &Selector::tag("overflow-list").with_attribute("defer")) {
		dom.remove_attribute(&list, "defer")
	}
}

pub struct FragmentMerger<'a, D: Dom> {
	dom: &'a D,
	morph: &'a dyn Morph<D>,
}

impl<'a, D: Dom> FragmentMerger<'a, D> {
	pub fn new(dom: &'a D, morph: &'a dyn Morph<D>) -> Self {
		Self { dom, morph }
	}

	/// Merges the fetched counterpart of `live` (matched by element name) into it.
	///
	/// Returns the newly bound product iff the fetched picker is bound to a different one.
	///
	/// # Errors
	///
	/// [`Error::MissingPickerSource`] iff `fetched` has no matching element.
	#[instrument(skip(self, live, fetched))]
	pub fn merge_scoped(&self, live: &D::Node, fetched: &D::Node) -> Result<Option<ProductRef>> {
		let dom = self.dom;
		let tag = dom.local_name(live).unwrap_or_default();
		let source = dom.query(fetched, &Selector::tag(&tag)).ok_or_else(|| Error::MissingPickerSource(tag.clone()))?;

		let new_id = dom.attribute(&source, PRODUCT_ID);
		let new_url = dom.attribute(&source, PRODUCT_URL);
		let new_product = match (&new_id, &new_url) {
			(Some(id), Some(url)) if dom.attribute(live, PRODUCT_ID).as_deref() != Some(id.as_str()) => Some(ProductRef { id: id.clone(), url: url.clone() }),
			_ => None,
		};

		for (name, value) in &[(PRODUCT_ID, new_id), (PRODUCT_URL, new_url)] {
			match value {
				Some(value) => dom.set_attribute(live, name, value),
				None => dom.remove_attribute(live, name),
			}
		}

		self.morph.morph(dom, live, &source);
		Ok(new_product)
	}

	/// Best-effort merge of the promotion callout around `picker`.
	///
	/// The live callout is hidden rather than removed when the fetched document has none, so showing it again stays cheap.
	#[instrument(skip(self, picker, fetched))]
	pub fn merge_promotion(&self, picker: &D::Node, fetched: &D::Node) {
		let dom = self.dom;
		let document = dom.document();
		let context = dom
			.query(&document, &Selector::class("quick-add-modal").with_attribute("open"))
			.or_else(|| dom.closest(picker, &Selector::class("product-card").or(Selector::tag("product-form")).or(Selector::tag("main"))));
		let current = match context.and_then(|context| dom.query(&context, &Selector::class(PROMOTION_CLASS))) {
			Some(current) => current,
			None => return trace!("No live promotion callout."),
		};

		match dom.query(fetched, &Selector::class(PROMOTION_CLASS)) {
			Some(fetched) => {
				self.morph.morph(dom, &current, &fetched);
				dom.set_hidden(&current, false)
			}
			None => dom.set_hidden(&current, true),
		}
	}

	/// Merges the whole main content region.
	///
	/// # Errors
	///
	/// [`Error::MissingMain`] iff either document lacks a `main`.
	#[instrument(skip(self, fetched))]
	pub fn merge_main(&self, fetched: &D::Node) -> Result<D::Node> {
		let dom = self.dom;
		let main = Selector::tag("main");
		let live = dom.query(&dom.document(), &main).ok_or(Error::MissingMain)?;
		let source = dom.query(fetched, &main).ok_or(Error::MissingMain)?;
		self.morph.morph(dom, &live, &source);
		Ok(live)
	}
}
