#![doc(html_root_url = "https://docs.rs/variant-picker-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Keeps a storefront variant picker, its server-rendered markup and the address bar consistent after option changes.
//!
//! The pipeline lives in [`picker::VariantPicker`]. Everything it touches is reached through small traits:
//! [`dom::Dom`] for the document, [`coordinator::Fetch`] for the network, [`morph::Morph`] for merging markup,
//! [`events::PickerEvents`] for listeners and [`navigation::Location`] for the address bar.
//! [`synthetic::SyntheticDom`] runs the whole pipeline without a browser; the `web` feature adds `web-sys` bindings.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod config;
pub mod coordinator;
pub mod dom;
mod error;
pub mod events;
pub mod markup;
pub mod merge;
pub mod morph;
pub mod navigation;
pub mod picker;
pub mod registry;
pub mod request;
pub mod selection;
pub mod selector;
pub mod swatches;
pub mod synthetic;

#[cfg(feature = "web")]
pub mod web;

pub use error::{Error, FetchError, Result};
