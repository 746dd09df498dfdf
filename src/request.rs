//! Request URLs for selection changes.
//!
//! Building a URL is pure: the caller gathers the inputs from the tree and the coordinator
//! and stores [`Request::base`] as the new pending URL.

pub const CARD_SECTION_ID: &str = "section-rendering-product-card";

/// Where a selection change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSource<'a> {
	/// The picker's own option tree.
	Main,
	/// A compact product card preview driving this picker with its own (narrower) selection.
	ProductCard { selected_option_ids: &'a [String] },
}

impl Default for RequestSource<'_> {
	fn default() -> Self {
		Self::Main
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPlan<'a> {
	/// `data-option-value-id` of the option that was just selected.
	pub option_value_id: &'a str,
	/// `data-connected-product-url` of that option, for combined listings.
	pub connected_product_url: Option<&'a str>,
	/// Base URL of the request that is still pending, if any.
	pub pending_url: Option<&'a str>,
	/// The picker's bound product URL.
	pub product_url: Option<&'a str>,
	/// Selected option IDs across all axes of the picker's own tree.
	pub own_selected_option_ids: &'a [String],
	pub source: RequestSource<'a>,
	/// Whether the picker sits inside a quick-add or swatches presentation.
	pub card_context: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
	pub url: String,
	/// The base URL before card rewriting, to be remembered as pending.
	pub base: String,
}

impl RequestPlan<'_> {
	#[must_use]
	pub fn build(&self) -> Request {
		let base = self
			.connected_product_url
			.filter(|url| !url.is_empty())
			.or_else(|| self.pending_url.filter(|url| !url.is_empty()))
			.or(self.product_url)
			.unwrap_or_default()
			.to_owned();

		let mut params = Vec::new();
		match self.source {
			RequestSource::Main if !self.own_selected_option_ids.is_empty() => params.push(format!("option_values={}", self.own_selected_option_ids.join(","))),
			RequestSource::Main => (),
			// Checks the picker's own tree, not the card's.
			RequestSource::ProductCard { selected_option_ids } => {
				if self.own_selected_option_ids.is_empty() {
					params.push(format!("option_values={}", self.option_value_id))
				} else {
					params.push(format!("option_values={}", selected_option_ids.join(",")))
				}
			}
		}
		let params = params.join("&");

		let url = if self.card_context {
			let path = base.split('?').next().unwrap_or(&base);
			format!("{}?section_id={}&{}", path, CARD_SECTION_ID, params)
		} else if params.is_empty() {
			base.clone()
		} else if base.contains('?') {
			format!("{}&{}", base, params)
		} else {
			format!("{}?{}", base, params)
		};

		Request { url, base }
	}
}
