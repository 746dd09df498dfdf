//! Address bar synchronisation.

use crate::Result;
use tracing::{debug, instrument};
use url::Url;

pub const VARIANT_PARAM: &str = "variant";

/// The address bar, without navigation.
pub trait Location {
	fn href(&self) -> String;

	/// Replaces the current history entry's URL. Must not add an entry or reload.
	///
	/// # Errors
	///
	/// Iff the host rejects the URL.
	fn replace_state(&self, url: &str) -> Result<()>;
}

/// What a selection change means for the address bar, captured when the change is handled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationIntent {
	/// Whether the picker is the product page's own (not inside a card or quick-add dialog).
	pub on_product_page: bool,
	/// The variant the selection resolved to.
	pub variant_id: Option<String>,
	/// The path of a newly connected product, for combined listings.
	pub product_path: Option<String>,
}

impl NavigationIntent {
	/// The URL the address bar should show, given the current one.
	#[must_use]
	pub fn apply_to(&self, current: &Url) -> Url {
		let mut next = current.clone();
		if self.on_product_page {
			let mut pairs: Vec<(String, String)> = current.query_pairs().filter(|(name, _)| name != VARIANT_PARAM).map(|(name, value)| (name.into_owned(), value.into_owned())).collect();
			if let Some(variant_id) = &self.variant_id {
				match current.query_pairs().position(|(name, _)| name == VARIANT_PARAM) {
					Some(index) => pairs.insert(index.min(pairs.len()), (VARIANT_PARAM.to_owned(), variant_id.clone())),
					None => pairs.push((VARIANT_PARAM.to_owned(), variant_id.clone())),
				}
			}
			if pairs.is_empty() {
				next.set_query(None);
			} else {
				next.query_pairs_mut().clear().extend_pairs(pairs);
			}
		}
		if let Some(path) = &self.product_path {
			next.set_path(path);
		}
		next
	}
}

/// Rewrites the address bar for `intent`, iff that changes it.
///
/// Returns whether the URL was replaced.
///
/// # Errors
///
/// Iff the current address can't be parsed or the host rejects the new one.
#[instrument(skip(location))]
pub fn synchronize<L: Location + ?Sized>(location: &L, intent: &NavigationIntent) -> Result<bool> {
	let href = location.href();
	let current = Url::parse(&href)?;
	let next = intent.apply_to(&current);
	if next.as_str() == href {
		debug!("Address bar already up to date.");
		return Ok(false);
	}
	location.replace_state(next.as_str())?;
	Ok(true)
}
