//! The variant picker component.
//!
//! One change notification runs the pipeline
//! read selection → build request → coordinate fetch → merge → swatches → address bar → notify.
//! Everything after the fetch runs in a spawned task and re-reads the live tree.

use crate::{
	config::{PageContext, PickerConfig},
	coordinator::{Fetch, RequestCoordinator},
	dom::Dom,
	events::{PickerEvents, VariantSelected, VariantUpdate},
	merge::{self, FragmentMerger},
	morph::Morph,
	navigation::{self, Location, NavigationIntent},
	request::{Request, RequestPlan, RequestSource},
	selection::{SelectionReader, Target, CONNECTED_PRODUCT_URL, OPTION_VALUE_ID},
	selector::Selector,
	swatches, Result,
};
use core::cell::RefCell;
use futures::{
	future::Aborted,
	task::{LocalSpawn, LocalSpawnExt},
};
use std::rc::Rc;
use tracing::{debug, error, field, instrument, trace, Span};
use url::Url;

pub const TAG_NAME: &str = "variant-picker";

/// The host-provided collaborators of a picker.
pub struct Collaborators<D: Dom> {
	pub fetch: Rc<dyn Fetch>,
	pub morph: Rc<dyn Morph<D>>,
	pub events: Rc<dyn PickerEvents<D::Node>>,
	pub location: Rc<dyn Location>,
	pub spawner: Rc<dyn LocalSpawn>,
}

impl<D: Dom> Clone for Collaborators<D> {
	fn clone(&self) -> Self {
		Self {
			fetch: Rc::clone(&self.fetch),
			morph: Rc::clone(&self.morph),
			events: Rc::clone(&self.events),
			location: Rc::clone(&self.location),
			spawner: Rc::clone(&self.spawner),
		}
	}
}

pub struct VariantPicker<D: Dom> {
	dom: D,
	element: D::Node,
	page: PageContext,
	collaborators: Collaborators<D>,
	coordinator: RefCell<RequestCoordinator>,
}

impl<D: Dom + 'static> VariantPicker<D> {
	/// Binds a picker to its host `element`.
	pub fn new(dom: D, element: D::Node, page: PageContext, collaborators: Collaborators<D>) -> Rc<Self> {
		Rc::new(Self {
			dom,
			element,
			page,
			collaborators,
			coordinator: RefCell::new(RequestCoordinator::new()),
		})
	}

	#[must_use]
	pub fn element(&self) -> &D::Node {
		&self.element
	}

	#[must_use]
	pub fn dom(&self) -> &D {
		&self.dom
	}

	#[must_use]
	pub fn config(&self) -> PickerConfig {
		PickerConfig::read(&self.dom, &self.element)
	}

	#[must_use]
	pub fn selection(&self) -> SelectionReader<'_, D> {
		SelectionReader::new(&self.dom, &self.element)
	}

	/// Whether a request was issued and hasn't completed or been superseded.
	#[must_use]
	pub fn has_pending_request(&self) -> bool {
		self.coordinator.borrow().has_current_request()
	}

	/// Handles a change notification whose target is `target`.
	///
	/// # Errors
	///
	/// Data-integrity errors from reading the selection, and spawn failures.
	/// The picker stays usable either way.
	#[instrument(skip(self, target))]
	pub fn variant_changed(self: &Rc<Self>, target: &D::Node) -> Result<()> {
		let dom = &self.dom;
		let selection = self.selection();

		selection.update_selected_option(Target::Element(target))?;
		let option = selection.changed_option(target);

		self.collaborators.events.variant_selected(&VariantSelected {
			option_value_id: dom.attribute(&option, OPTION_VALUE_ID).unwrap_or_default(),
		});

		let on_product_page = self.page.is_product_template()
			&& dom.closest(target, &Selector::tag("product-card")).is_none()
			&& dom.closest(target, &Selector::tag("quick-add-dialog")).is_none();

		// Combined listing options that load another product replace all of `main`.
		let current_path = self.config().product_path().map(str::to_owned);
		let connected = dom.attribute(&option, CONNECTED_PRODUCT_URL).filter(|url| !url.is_empty());
		let loads_new_product = on_product_page && connected.is_some() && connected != current_path;

		let request = self.build_request_url(&option, RequestSource::Main)?;

		let intent = NavigationIntent {
			on_product_page,
			variant_id: selection.variant_id(target),
			product_path: if loads_new_product { connected } else { None },
		};
		self.fetch_update(&request.url, loads_new_product, intent)
	}

	/// Marks the option with `option_value_id` as selected, without fetching.
	///
	/// # Errors
	///
	/// [`Error::TargetNotFound`](`crate::Error::TargetNotFound`) iff there is no such option in this picker.
	pub fn update_selected_option(&self, option_value_id: &str) -> Result<D::Node> {
		self.selection().update_selected_option(Target::OptionValueId(option_value_id))
	}

	/// Computes the request URL for selecting `option` and remembers its base as pending.
	///
	/// # Errors
	///
	/// [`Error::MissingOptionValueId`](`crate::Error::MissingOptionValueId`) iff a selected option in this picker has no ID.
	#[instrument(skip(self, option))]
	pub fn build_request_url(&self, option: &D::Node, source: RequestSource<'_>) -> Result<Request> {
		let dom = &self.dom;
		let own_selected_option_ids = self.selection().selected_option_ids()?;
		let option_value_id = dom.attribute(option, OPTION_VALUE_ID).unwrap_or_default();
		let connected_product_url = dom.attribute(option, CONNECTED_PRODUCT_URL);
		let config = self.config();
		let card_context = dom.closest(&self.element, &Selector::tag("quick-add-component").or(Selector::tag("swatches-variant-picker-component"))).is_some();

		let mut coordinator = self.coordinator.borrow_mut();
		let request = RequestPlan {
			option_value_id: &option_value_id,
			connected_product_url: connected_product_url.as_deref(),
			pending_url: coordinator.pending_url(),
			product_url: config.product_url.as_deref(),
			own_selected_option_ids: &own_selected_option_ids,
			source,
			card_context,
		}
		.build();
		coordinator.remember_pending_url(request.base.clone());

		if cfg!(feature = "dangerous-logging") {
			debug!(url = %request.url, "Built request URL.");
		}
		Ok(request)
	}

	/// Cancels the current request, if any, and issues `url`.
	///
	/// `whole_page` merges `main` instead of just this picker.
	///
	/// # Errors
	///
	/// Iff the update task can't be spawned.
	#[instrument(skip(self, url, intent), fields(url = field::Empty))]
	pub fn fetch_update(self: &Rc<Self>, url: &str, whole_page: bool, intent: NavigationIntent) -> Result<()> {
		if cfg!(feature = "dangerous-logging") {
			Span::current().record("url", &url);
		}

		let (ticket, response) = self.coordinator.borrow_mut().issue(&*self.collaborators.fetch, url);
		let this = Rc::clone(self);
		self.collaborators.spawner.spawn_local(async move {
			let outcome = response.await;
			this.coordinator.borrow_mut().finish(ticket);
			match outcome {
				Err(Aborted) => debug!("Fetch aborted by a newer selection."),
				Ok(Err(error)) => error!("{}", error),
				Ok(Ok(body)) => {
					if let Err(error) = this.apply_response(&body, whole_page, &intent) {
						error!("Could not apply the variant update: {}", error)
					}
				}
			}
		})?;
		Ok(())
	}

	#[instrument(skip(self, body, intent))]
	fn apply_response(&self, body: &str, whole_page: bool, intent: &NavigationIntent) -> Result<()> {
		let dom = &self.dom;
		self.coordinator.borrow_mut().clear_pending_url();

		let fetched = dom.parse_document(body)?;
		merge::undefer(dom, &fetched);

		let tag = dom.local_name(&self.element).unwrap_or_else(|| TAG_NAME.to_owned());
		let payload = match merge::payload_text(dom, &fetched, &tag) {
			Some(payload) => payload,
			None => {
				debug!("Response has no variant payload. Nothing to apply.");
				return Ok(());
			}
		};

		let merger = FragmentMerger::new(dom, &*self.collaborators.morph);
		let origin = self.origin();

		if whole_page {
			merger.merge_main(&fetched)?;
			swatches::apply_swatch_limit(dom, &self.element, origin.as_ref());
			self.synchronize_location(intent);
			return Ok(());
		}

		let new_product = merger.merge_scoped(&self.element, &fetched)?;
		swatches::apply_swatch_limit(dom, &self.element, origin.as_ref());
		merger.merge_promotion(&self.element, &fetched);
		self.synchronize_location(intent);

		if let Some(source_id) = self.selection().selected_option_id()? {
			let resource = serde_json::from_str(&payload)?;
			self.collaborators.events.variant_update(&VariantUpdate {
				resource,
				source_id,
				html: fetched,
				product_id: self.config().product_id.unwrap_or_default(),
				new_product,
			});
		} else {
			trace!("No selected option after the merge. Not announcing the update.");
		}
		Ok(())
	}

	/// The merge already happened, so a rejected address bar update doesn't fail the response.
	fn synchronize_location(&self, intent: &NavigationIntent) {
		if let Err(error) = navigation::synchronize(&*self.collaborators.location, intent) {
			error!("Could not update the address bar: {}", error)
		}
	}

	/// Origin of the current page, for resolving relative product URLs.
	fn origin(&self) -> Option<Url> {
		Url::parse(&self.collaborators.location.href()).ok().map(|url| url.origin().ascii_serialization()).and_then(|origin| Url::parse(&origin).ok())
	}
}
