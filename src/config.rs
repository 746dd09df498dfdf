//! Per-instance configuration, read from the host element.

use crate::dom::Dom;
use core::convert::TryFrom;
use tracing::warn;

pub const PRODUCT_ID: &str = "data-product-id";
pub const PRODUCT_URL: &str = "data-product-url";
pub const SWATCH_LIMIT: &str = "data-limit-swatches-show";

pub const DEFAULT_SWATCH_LIMIT: u32 = 4;

/// The product whose data is currently bound to a picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRef {
	pub id: String,
	pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerConfig {
	pub product_id: Option<String>,
	pub product_url: Option<String>,
	/// How many swatches stay visible per option axis.
	pub swatch_limit: u32,
}

impl PickerConfig {
	/// Reads the configuration as it is right now. Merges may change it, so don't hold on to the result.
	pub fn read<D: Dom + ?Sized>(dom: &D, element: &D::Node) -> Self {
		Self {
			product_id: dom.attribute(element, PRODUCT_ID),
			product_url: dom.attribute(element, PRODUCT_URL),
			swatch_limit: parse_swatch_limit(dom.attribute(element, SWATCH_LIMIT).as_deref()),
		}
	}

	/// The bound product URL without its query.
	#[must_use]
	pub fn product_path(&self) -> Option<&str> {
		self.product_url.as_deref().map(|url| url.split('?').next().unwrap_or(url))
	}
}

/// Unparsable limits fall back to the default. Negative ones hide everything, same as `0`.
#[must_use]
pub fn parse_swatch_limit(value: Option<&str>) -> u32 {
	match value.map(str::trim) {
		None | Some("") => DEFAULT_SWATCH_LIMIT,
		Some(value) => match value.parse::<i64>() {
			Ok(limit) if limit <= 0 => 0,
			Ok(limit) => u32::try_from(limit).unwrap_or(u32::MAX),
			Err(_) => {
				warn!("Ignoring unparsable swatch limit {:?}.", value);
				DEFAULT_SWATCH_LIMIT
			}
		},
	}
}

/// Page-level facts the host knows and the tree doesn't.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
	/// The storefront template being rendered, e.g. `product` or `collection`.
	pub template: String,
}

impl PageContext {
	pub fn new(template: impl Into<String>) -> Self {
		Self { template: template.into() }
	}

	#[must_use]
	pub fn is_product_template(&self) -> bool {
		self.template == "product"
	}
}

#[cfg(test)]
mod tests {
	use super::{parse_swatch_limit, DEFAULT_SWATCH_LIMIT};

	#[test]
	fn swatch_limits() {
		assert_eq!(parse_swatch_limit(None), DEFAULT_SWATCH_LIMIT);
		assert_eq!(parse_swatch_limit(Some(" 7 ")), 7);
		assert_eq!(parse_swatch_limit(Some("0")), 0);
		assert_eq!(parse_swatch_limit(Some("-2")), 0);
		assert_eq!(parse_swatch_limit(Some("many")), DEFAULT_SWATCH_LIMIT);
	}
}
