//! Bounded swatch lists.
//!
//! Server markup may render more swatches than fit. After every merge, each `.swatches-list` shows at most
//! the configured number of entries and a trailing "+N more" affordance for the rest.
//! The affordance is synthesized when the fetched markup didn't include one.

use crate::{
	config::{PickerConfig, PRODUCT_URL},
	dom::Dom,
	navigation::VARIANT_PARAM,
	selection::VARIANT_ID,
	selector::Selector,
	Result,
};
use tracing::{instrument, trace, trace_span, warn};
use url::Url;

pub const LIST_CLASS: &str = "swatches-list";
pub const SWATCH_CLASS: &str = "variant-option__swatch";
pub const MORE_CLASS: &str = "variant-option__button-label--more";
pub const COUNT_CLASS: &str = "more-swatches__count";
pub const MORE_LABEL: &str = "Show all options";
const DEFAULT_AXIS_NAME: &str = "options";

/// What one list should look like for a given limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwatchLayout {
	/// Entries before this index are visible.
	pub visible: usize,
	/// The count the affordance announces, [`None`] if it is hidden.
	pub more: Option<usize>,
}

impl SwatchLayout {
	#[must_use]
	pub fn for_limit(limit: u32, entries: usize) -> Self {
		let limit = limit as usize;
		if limit < entries {
			Self { visible: limit, more: Some(entries - limit) }
		} else {
			Self { visible: entries, more: None }
		}
	}
}

#[must_use]
pub fn more_label(count: usize, axis_name: &str) -> String {
	format!("+{} more {}", count, axis_name)
}

/// Applies the picker's swatch limit to every list inside it.
///
/// `origin` resolves relative product URLs for synthesized affordances.
#[instrument(skip(dom, picker))]
pub fn apply_swatch_limit<D: Dom>(dom: &D, picker: &D::Node, origin: Option<&Url>) {
	let limit = PickerConfig::read(dom, picker).swatch_limit;
	for list in dom.query_all(picker, &Selector::class(LIST_CLASS)) {
		apply_to_list(dom, picker, &list, limit, origin)
	}
}

fn apply_to_list<D: Dom>(dom: &D, picker: &D::Node, list: &D::Node, limit: u32, origin: Option<&Url>) {
	let more_selector = Selector::class(MORE_CLASS);
	let entries: Vec<D::Node> = dom.query_all(list, &Selector::class(SWATCH_CLASS)).into_iter().filter(|swatch| dom.query(swatch, &more_selector).is_none()).collect();
	let layout = SwatchLayout::for_limit(limit, entries.len());

	let span = trace_span!("Applying swatch layout", entries = entries.len(), limit, ?layout);
	let _enter = span.enter();

	for (i, entry) in entries.iter().enumerate() {
		let hidden = i >= layout.visible;
		if dom.hidden(entry) != hidden {
			dom.set_hidden(entry, hidden)
		}
	}

	let existing = dom.query(list, &more_selector);
	match layout.more {
		None => {
			if let Some(more) = existing {
				dom.set_hidden(&more, true)
			}
		}
		Some(count) => {
			let label = more_label(count, &axis_name(dom, picker, list));
			let more = match existing {
				Some(more) => Some(more),
				None => match synthesize_more(dom, picker, &label, origin) {
					Ok(Some((item, more))) => {
						dom.append_child(list, &item);
						Some(more)
					}
					Ok(None) => {
						trace!("No URL for a \"more\" affordance. Leaving it out.");
						None
					}
					Err(error) => {
						warn!("Could not create a \"more\" affordance: {}", error);
						None
					}
				},
			};
			if let Some(more) = more {
				if let Some(count_label) = dom.query(&more, &Selector::class(COUNT_CLASS)) {
					dom.set_text_content(&count_label, &label)
				}
				dom.set_hidden(&more, false)
			}
		}
	}
}

/// The caption of the axis `list` belongs to, falling back to the picker's first one.
fn axis_name<D: Dom>(dom: &D, picker: &D::Node, list: &D::Node) -> String {
	let legend = Selector::tag("legend");
	dom.closest(list, &Selector::tag("fieldset"))
		.and_then(|fieldset| dom.query(&fieldset, &legend))
		.or_else(|| dom.query(picker, &legend))
		.map(|legend| dom.text_content(&legend).trim().to_owned())
		.filter(|name| !name.is_empty())
		.unwrap_or_else(|| DEFAULT_AXIS_NAME.to_owned())
}

/// The URL of the currently selected variant, for the affordance link.
fn selected_variant_url<D: Dom>(dom: &D, picker: &D::Node, origin: Option<&Url>) -> Option<String> {
	let product_url = dom.attribute(picker, PRODUCT_URL);

	let mut url = dom
		.query(picker, &Selector::tag("script").with_attribute_equals("type", "application/json"))
		.map(|script| dom.text_content(&script))
		.filter(|text| !text.trim().is_empty())
		.and_then(|text| match serde_json::from_str::<serde_json::Value>(&text) {
			Ok(payload) => payload.get("url").and_then(serde_json::Value::as_str).map(str::to_owned),
			Err(error) => {
				warn!("Could not parse variant data: {}", error);
				None
			}
		})
		.or_else(|| product_url.clone());

	if url.is_none() || url == product_url {
		let variant_id = dom.query(picker, &Selector::tag("input").checked()).and_then(|input| dom.attribute(&input, VARIANT_ID)).filter(|id| !id.is_empty());
		if let (Some(variant_id), Some(base)) = (variant_id, product_url.as_deref()) {
			let resolved = match origin {
				Some(origin) => origin.join(base).ok(),
				None => Url::parse(base).ok(),
			};
			if let Some(mut resolved) = resolved {
				let pairs: Vec<(String, String)> = resolved.query_pairs().filter(|(name, _)| name != VARIANT_PARAM).map(|(n, v)| (n.into_owned(), v.into_owned())).collect();
				resolved.query_pairs_mut().clear().extend_pairs(pairs).append_pair(VARIANT_PARAM, &variant_id);
				url = Some(resolved.as_str().to_owned());
			}
		}
	}

	url.filter(|url| !url.is_empty())
}

/// Builds `li.variant-option__swatch > a.variant-option__button-label--more > span.more-swatches__count`.
///
/// Returns the list item and the link, or [`None`] if there is no URL to link to.
fn synthesize_more<D: Dom>(dom: &D, picker: &D::Node, label: &str, origin: Option<&Url>) -> Result<Option<(D::Node, D::Node)>> {
	let href = match selected_variant_url(dom, picker, origin) {
		Some(href) => href,
		None => return Ok(None),
	};

	let item = dom.create_element("li")?;
	dom.set_attribute(&item, "class", SWATCH_CLASS);

	let link = dom.create_element("a")?;
	dom.set_attribute(&link, "href", &href);
	dom.set_attribute(&link, "class", MORE_CLASS);
	dom.set_attribute(&link, "aria-label", MORE_LABEL);

	let count = dom.create_element("span")?;
	dom.set_attribute(&count, "class", COUNT_CLASS);
	dom.set_text_content(&count, label);

	dom.append_child(&link, &count);
	dom.append_child(&item, &link);
	Ok(Some((item, link)))
}
