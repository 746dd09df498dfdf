//! Browser bindings through `web-sys`.
//!
//! [`connect_variant_pickers`] is the entry point for pages: it defines the `variant-picker` component once
//! and handles `change` events of every picker on the page through one delegated listener.

use crate::{
	config::PageContext,
	coordinator::Fetch,
	dom::{Dom, NodeKind},
	error::FetchError,
	events::{PickerEvents, VariantSelected, VariantUpdate},
	morph::TreeMorph,
	navigation::Location,
	picker::{Collaborators, VariantPicker, TAG_NAME},
	registry::Registry,
	selector::Selector,
	Error, Result,
};
use core::cell::RefCell;
use futures::{
	future::{FutureExt, LocalBoxFuture},
	task::{LocalFutureObj, LocalSpawn, SpawnError},
};
use js_sys::{Object, Reflect, JSON};
use std::rc::Rc;
use tracing::{error, trace, warn};
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
	AbortController, CharacterData, CustomEvent, CustomEventInit, Document, DomParser, Element, HtmlElement, HtmlInputElement, HtmlSelectElement, Node, RequestInit, Response, SupportedType,
};

/// The browser document.
#[derive(Debug, Clone)]
pub struct WebDom {
	document: Document,
}

impl WebDom {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self { document }
	}

	/// The current window's document, if there is one.
	#[must_use]
	pub fn current() -> Option<Self> {
		web_sys::window().and_then(|window| window.document()).map(Self::new)
	}
}

fn css(selector: &Selector) -> String {
	selector.to_string()
}

impl Dom for WebDom {
	type Node = Node;

	fn document(&self) -> Node {
		self.document.clone().into()
	}

	fn parse_document(&self, markup: &str) -> Result<Node> {
		let parser = DomParser::new().map_err(|error| Error::dom(format!("{:?}", error)))?;
		let document = parser.parse_from_string(markup, SupportedType::TextHtml).map_err(|error| Error::dom(format!("{:?}", error)))?;
		Ok(document.into())
	}

	fn kind(&self, node: &Node) -> NodeKind {
		match node.node_type() {
			Node::DOCUMENT_NODE => NodeKind::Document,
			Node::ELEMENT_NODE => NodeKind::Element,
			Node::TEXT_NODE => NodeKind::Text,
			Node::COMMENT_NODE => NodeKind::Comment,
			_ => NodeKind::Other,
		}
	}

	fn local_name(&self, node: &Node) -> Option<String> {
		node.dyn_ref::<Element>().map(Element::local_name)
	}

	fn attribute(&self, node: &Node, name: &str) -> Option<String> {
		node.dyn_ref::<Element>().and_then(|element| element.get_attribute(name))
	}

	fn attributes(&self, node: &Node) -> Vec<(String, String)> {
		let element = match node.dyn_ref::<Element>() {
			Some(element) => element,
			None => return Vec::new(),
		};
		let attributes = element.attributes();
		(0..attributes.length()).filter_map(|i| attributes.item(i)).map(|attribute| (attribute.name(), attribute.value())).collect()
	}

	fn set_attribute(&self, node: &Node, name: &str, value: &str) {
		match node.dyn_ref::<Element>() {
			Some(element) => {
				if let Err(error) = element.set_attribute(name, value) {
					error!("Could not set attribute {:?}: {:?}", name, error)
				}
			}
			None => error!("Expected an element to set attribute {:?} on but found {:?}.", name, node),
		}
	}

	fn remove_attribute(&self, node: &Node, name: &str) {
		if let Some(element) = node.dyn_ref::<Element>() {
			if let Err(error) = element.remove_attribute(name) {
				error!("Could not remove attribute {:?}: {:?}", name, error)
			}
		}
	}

	fn parent(&self, node: &Node) -> Option<Node> {
		node.parent_node()
	}

	fn children(&self, node: &Node) -> Vec<Node> {
		let child_nodes = node.child_nodes();
		(0..child_nodes.length()).filter_map(|i| child_nodes.item(i)).collect()
	}

	fn text_content(&self, node: &Node) -> String {
		node.text_content().unwrap_or_default()
	}

	fn set_text_content(&self, node: &Node, text: &str) {
		node.set_text_content(Some(text))
	}

	fn character_data(&self, node: &Node) -> Option<String> {
		node.dyn_ref::<CharacterData>().map(CharacterData::data)
	}

	fn set_character_data(&self, node: &Node, data: &str) {
		match node.dyn_ref::<CharacterData>() {
			Some(character_data) => character_data.set_data(data),
			None => error!("Expected character data but found {:?}.", node),
		}
	}

	fn create_element(&self, local_name: &str) -> Result<Node> {
		self.document.create_element(local_name).map(Into::into).map_err(|error| Error::dom(format!("Could not create <{}>: {:?}", local_name, error)))
	}

	fn import(&self, foreign: &Node) -> Result<Node> {
		self.document.import_node_with_deep(foreign, true).map_err(|error| Error::dom(format!("Could not import node: {:?}", error)))
	}

	fn insert_before(&self, parent: &Node, child: &Node, reference: Option<&Node>) {
		if let Err(error) = parent.insert_before(child, reference) {
			error!("Failed to insert the node: {:?}", error)
		}
	}

	fn remove(&self, node: &Node) {
		match node.parent_node() {
			Some(parent) => {
				if let Err(error) = parent.remove_child(node) {
					error!("Failed to remove the node: {:?}", error)
				}
			}
			None => trace!("Node to remove is already detached."),
		}
	}

	fn checked(&self, node: &Node) -> bool {
		node.dyn_ref::<HtmlInputElement>().map_or(false, HtmlInputElement::checked)
	}

	fn set_checked(&self, node: &Node, checked: bool) {
		match node.dyn_ref::<HtmlInputElement>() {
			Some(input) => input.set_checked(checked),
			None => error!("Expected an <input> to check but found {:?}.", node),
		}
	}

	fn value(&self, node: &Node) -> Option<String> {
		if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
			Some(input.value())
		} else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
			Some(select.value())
		} else {
			self.attribute(node, "value")
		}
	}

	fn hidden(&self, node: &Node) -> bool {
		node.dyn_ref::<HtmlElement>().map_or(false, |element| element.style().get_property_value("display").map_or(false, |display| display == "none"))
	}

	fn set_hidden(&self, node: &Node, hidden: bool) {
		let style = match node.dyn_ref::<HtmlElement>() {
			Some(element) => element.style(),
			None => return error!("Expected an HTML element to hide or show but found {:?}.", node),
		};
		let result = if hidden { style.set_property("display", "none") } else { style.remove_property("display").map(drop) };
		if let Err(error) = result {
			error!("Could not update the display property: {:?}", error)
		}
	}

	fn matches(&self, node: &Node, selector: &Selector) -> bool {
		node.dyn_ref::<Element>().map_or(false, |element| element.matches(&css(selector)).unwrap_or_else(|error| {
			error!("Invalid selector {}: {:?}", selector, error);
			false
		}))
	}

	fn query(&self, scope: &Node, selector: &Selector) -> Option<Node> {
		let found = if let Some(element) = scope.dyn_ref::<Element>() {
			element.query_selector(&css(selector))
		} else if let Some(document) = scope.dyn_ref::<Document>() {
			document.query_selector(&css(selector))
		} else {
			return None;
		};
		match found {
			Ok(found) => found.map(Into::into),
			Err(error) => {
				error!("Invalid selector {}: {:?}", selector, error);
				None
			}
		}
	}

	fn query_all(&self, scope: &Node, selector: &Selector) -> Vec<Node> {
		let found = if let Some(element) = scope.dyn_ref::<Element>() {
			element.query_selector_all(&css(selector))
		} else if let Some(document) = scope.dyn_ref::<Document>() {
			document.query_selector_all(&css(selector))
		} else {
			return Vec::new();
		};
		match found {
			Ok(list) => (0..list.length()).filter_map(|i| list.item(i)).collect(),
			Err(error) => {
				error!("Invalid selector {}: {:?}", selector, error);
				Vec::new()
			}
		}
	}

	fn closest(&self, node: &Node, selector: &Selector) -> Option<Node> {
		let element = match node.dyn_ref::<Element>() {
			Some(element) => element.clone(),
			None => node.parent_element()?,
		};
		match element.closest(&css(selector)) {
			Ok(found) => found.map(Into::into),
			Err(error) => {
				error!("Invalid selector {}: {:?}", selector, error);
				None
			}
		}
	}
}

/// `window.fetch`, aborted through an `AbortController` when the response future is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebFetch;

struct AbortOnDrop(AbortController);
impl Drop for AbortOnDrop {
	fn drop(&mut self) {
		self.0.abort()
	}
}

impl Fetch for WebFetch {
	fn get(&self, url: &str) -> LocalBoxFuture<'static, core::result::Result<String, FetchError>> {
		let url = url.to_owned();
		async move {
			let window = web_sys::window().ok_or_else(|| FetchError::new("no window"))?;
			let controller = AbortOnDrop(AbortController::new().map_err(|error| FetchError::new(format!("{:?}", error)))?);

			let init = RequestInit::new();
			init.set_method("GET");
			init.set_signal(Some(&controller.0.signal()));

			let response = JsFuture::from(window.fetch_with_str_and_init(&url, &init)).await.map_err(|error| FetchError::new(format!("{:?}", error)))?;
			let response: Response = response.dyn_into().map_err(|_| FetchError::new("response is not a Response"))?;
			if !response.ok() {
				return Err(FetchError::new(format!("HTTP {}", response.status())));
			}

			let text = response.text().map_err(|error| FetchError::new(format!("{:?}", error)))?;
			let text = JsFuture::from(text).await.map_err(|error| FetchError::new(format!("{:?}", error)))?;
			drop(controller);
			text.as_string().ok_or_else(|| FetchError::new("response body is not text"))
		}
		.boxed_local()
	}
}

/// `window.location` and `window.history`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebLocation;

impl Location for WebLocation {
	fn href(&self) -> String {
		match web_sys::window().map(|window| window.location().href()) {
			Some(Ok(href)) => href,
			Some(Err(error)) => {
				error!("Could not read the location: {:?}", error);
				String::new()
			}
			None => String::new(),
		}
	}

	fn replace_state(&self, url: &str) -> Result<()> {
		let window = web_sys::window().ok_or_else(|| Error::dom("no window"))?;
		let history = window.history().map_err(|error| Error::dom(format!("{:?}", error)))?;
		history.replace_state_with_url(&JsValue::NULL, "", Some(url)).map_err(|error| Error::dom(format!("Could not replace the history state: {:?}", error)))
	}
}

/// Dispatches `variant:selected` and `variant:update` as bubbling `CustomEvent`s from the picker element.
#[derive(Debug, Clone)]
pub struct WebEvents {
	target: Element,
}

impl WebEvents {
	#[must_use]
	pub fn new(target: Element) -> Self {
		Self { target }
	}

	fn dispatch(&self, name: &str, detail: &Object) {
		let init = CustomEventInit::new();
		init.set_bubbles(true);
		init.set_detail(detail);
		match CustomEvent::new_with_event_init_dict(name, &init) {
			Ok(event) => {
				if let Err(error) = self.target.dispatch_event(&event) {
					error!("Could not dispatch {}: {:?}", name, error)
				}
			}
			Err(error) => error!("Could not create {}: {:?}", name, error),
		}
	}
}

fn set(object: &Object, key: &str, value: &JsValue) {
	if let Err(error) = Reflect::set(object, &JsValue::from_str(key), value) {
		warn!("Could not set event detail {:?}: {:?}", key, error)
	}
}

impl PickerEvents<Node> for WebEvents {
	fn variant_selected(&self, event: &VariantSelected) {
		let detail = Object::new();
		set(&detail, "id", &JsValue::from_str(&event.option_value_id));
		self.dispatch("variant:selected", &detail)
	}

	fn variant_update(&self, event: &VariantUpdate<Node>) {
		let detail = Object::new();
		let data = Object::new();
		let resource = JSON::parse(&event.resource.to_string()).unwrap_or_else(|error| {
			warn!("Could not convert the variant payload: {:?}", error);
			JsValue::NULL
		});
		set(&detail, "resource", &resource);
		set(&detail, "sourceId", &JsValue::from_str(&event.source_id));
		set(&data, "html", event.html.as_ref());
		set(&data, "productId", &JsValue::from_str(&event.product_id));
		if let Some(product) = &event.new_product {
			let new_product = Object::new();
			set(&new_product, "id", &JsValue::from_str(&product.id));
			set(&new_product, "url", &JsValue::from_str(&product.url));
			set(&data, "newProduct", &new_product);
		}
		set(&detail, "data", &data);
		self.dispatch("variant:update", &detail)
	}
}

/// Runs tasks on the browser's microtask queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct WasmSpawner;

impl LocalSpawn for WasmSpawner {
	fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> core::result::Result<(), SpawnError> {
		wasm_bindgen_futures::spawn_local(future);
		Ok(())
	}
}

/// Reads `window.Theme.template.name`.
#[must_use]
pub fn page_context() -> PageContext {
	let template = web_sys::window()
		.and_then(|window| {
			["Theme", "template", "name"].iter().try_fold(JsValue::from(window), |value, key| match Reflect::get(&value, &JsValue::from_str(key)) {
				Ok(value) if !value.is_undefined() && !value.is_null() => Some(value),
				_ => None,
			})
		})
		.and_then(|name| name.as_string())
		.unwrap_or_default();
	PageContext::new(template)
}

/// Routes `tracing` output to the browser console. Repeated calls are ignored.
pub fn init_logging() {
	if tracing_wasm::try_set_as_global_default().is_err() {
		trace!("A global tracing subscriber is already set.")
	}
}

thread_local! {
	static REGISTRY: RefCell<Registry<Closure<dyn FnMut(web_sys::Event)>>> = RefCell::new(Registry::new());
	static PICKERS: RefCell<Vec<Rc<VariantPicker<WebDom>>>> = RefCell::new(Vec::new());
}

fn picker_for(dom: &WebDom, element: &Element) -> Rc<VariantPicker<WebDom>> {
	PICKERS.with(|pickers| {
		let mut pickers = pickers.borrow_mut();
		pickers.retain(|picker| picker.element().is_connected());
		let node: &Node = element.as_ref();
		if let Some(picker) = pickers.iter().find(|picker| picker.element() == node) {
			return Rc::clone(picker);
		}
		let collaborators = Collaborators {
			fetch: Rc::new(WebFetch),
			morph: Rc::new(TreeMorph::default()),
			events: Rc::new(WebEvents::new(element.clone())),
			location: Rc::new(WebLocation),
			spawner: Rc::new(WasmSpawner),
		};
		let picker = VariantPicker::new(dom.clone(), node.clone(), page_context(), collaborators);
		pickers.push(Rc::clone(&picker));
		picker
	})
}

fn on_change(dom: &WebDom, event: &web_sys::Event) {
	let target: Node = match event.target().and_then(|target| target.dyn_into().ok()) {
		Some(target) => target,
		None => return,
	};
	let element = match dom.closest(&target, &Selector::tag(TAG_NAME)).and_then(|node| node.dyn_into::<Element>().ok()) {
		Some(element) => element,
		None => return,
	};
	if let Err(error) = picker_for(dom, &element).variant_changed(&target) {
		error!("{}", error)
	}
}

/// Defines the `variant-picker` component for the current document.
///
/// Calling this more than once has no further effect.
#[wasm_bindgen(js_name = connectVariantPickers)]
pub fn connect_variant_pickers() {
	init_logging();
	let dom = match WebDom::current() {
		Some(dom) => dom,
		None => return error!("No document to connect variant pickers in."),
	};

	REGISTRY.with(|registry| {
		let mut registry = registry.borrow_mut();
		if registry.is_defined(TAG_NAME) {
			return trace!("Variant pickers are already connected.");
		}

		let listener_dom = dom.clone();
		let listener = Closure::wrap(Box::new(move |event: web_sys::Event| on_change(&listener_dom, &event)) as Box<dyn FnMut(web_sys::Event)>);
		if let Err(error) = dom.document.add_event_listener_with_callback("change", listener.as_ref().unchecked_ref()) {
			return error!("Could not listen for changes: {:?}", error);
		}
		registry.define(TAG_NAME, listener);
	})
}
