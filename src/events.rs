//! Outbound notifications.

use crate::config::ProductRef;

/// Fired synchronously when a change is handled, before any request goes out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSelected {
	pub option_value_id: String,
}

/// Fired after a fetched picker was merged into the live one.
#[derive(Debug, Clone)]
pub struct VariantUpdate<N> {
	/// The embedded variant payload of the fetched picker.
	pub resource: serde_json::Value,
	/// ID of the option that is selected after the merge.
	pub source_id: String,
	/// The fetched document.
	pub html: N,
	/// The bound product ID after the merge, empty if there is none.
	pub product_id: String,
	/// Set iff the merge switched to a different (combined listing) product.
	pub new_product: Option<ProductRef>,
}

/// Listeners outside the picker.
pub trait PickerEvents<N> {
	fn variant_selected(&self, event: &VariantSelected);
	fn variant_update(&self, event: &VariantUpdate<N>);
}
