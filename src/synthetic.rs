//! An in-memory document for driving the picker without a browser.
//!
//! Nodes are reference-counted and compare by identity, like browser node handles.
//! Markup is read leniently by [`markup`](`crate::markup`); the tree can be written back out with [`SyntheticDom::outer_html`].

use crate::{
	dom::{Dom, NodeKind},
	markup, Result,
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use std::rc::{Rc, Weak};

#[derive(Clone)]
pub struct NodeRef(Rc<RefCell<NodeData>>);

struct NodeData {
	parent: Weak<RefCell<NodeData>>,
	children: Vec<NodeRef>,
	content: Content,
}

#[derive(Clone)]
enum Content {
	Document,
	Element(ElementData),
	Text(String),
	Comment(String),
}

#[derive(Clone)]
struct ElementData {
	local_name: String,
	attributes: Vec<(String, String)>,
	/// Set once script (rather than markup) touched checkedness.
	checked: Option<bool>,
	/// Set once a user (or test) picked a value.
	value: Option<String>,
}

impl PartialEq for NodeRef {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl Eq for NodeRef {}

impl Debug for NodeRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.0.borrow().content {
			Content::Document => f.write_str("#document"),
			Content::Element(element) => write!(f, "<{}>", element.local_name),
			Content::Text(text) => write!(f, "#text {:?}", text),
			Content::Comment(comment) => write!(f, "<!--{:?}-->", comment),
		}
	}
}

impl NodeRef {
	fn new(content: Content) -> Self {
		Self(Rc::new(RefCell::new(NodeData {
			parent: Weak::new(),
			children: Vec::new(),
			content,
		})))
	}

	pub(crate) fn new_document() -> Self {
		Self::new(Content::Document)
	}

	pub(crate) fn new_element(local_name: &str, attributes: Vec<(String, String)>) -> Self {
		Self::new(Content::Element(ElementData {
			local_name: local_name.to_ascii_lowercase(),
			attributes,
			checked: None,
			value: None,
		}))
	}

	pub(crate) fn new_text(text: &str) -> Self {
		Self::new(Content::Text(text.to_owned()))
	}

	pub(crate) fn new_comment(comment: &str) -> Self {
		Self::new(Content::Comment(comment.to_owned()))
	}

	pub(crate) fn local_name(&self) -> Option<String> {
		match &self.0.borrow().content {
			Content::Element(element) => Some(element.local_name.clone()),
			_ => None,
		}
	}

	pub(crate) fn parent(&self) -> Option<NodeRef> {
		self.0.borrow().parent.upgrade().map(NodeRef)
	}

	pub(crate) fn detach(&self) {
		if let Some(parent) = self.parent() {
			parent.0.borrow_mut().children.retain(|child| child != self);
		}
		self.0.borrow_mut().parent = Weak::new();
	}

	pub(crate) fn append(&self, child: &NodeRef) {
		self.insert_before(child, None)
	}

	fn insert_before(&self, child: &NodeRef, reference: Option<&NodeRef>) {
		child.detach();
		child.0.borrow_mut().parent = Rc::downgrade(&self.0);
		let mut data = self.0.borrow_mut();
		let index = reference.and_then(|reference| data.children.iter().position(|c| c == reference)).unwrap_or_else(|| data.children.len());
		data.children.insert(index, child.clone());
	}

	fn deep_clone(&self) -> NodeRef {
		let copy = NodeRef::new(self.0.borrow().content.clone());
		for child in &self.0.borrow().children {
			copy.append(&child.deep_clone());
		}
		copy
	}

	fn root(&self) -> NodeRef {
		let mut current = self.clone();
		while let Some(parent) = current.parent() {
			current = parent;
		}
		current
	}

	fn with_element<T>(&self, f: impl FnOnce(&mut ElementData) -> T) -> Option<T> {
		match &mut self.0.borrow_mut().content {
			Content::Element(element) => Some(f(element)),
			_ => None,
		}
	}

	fn attribute(&self, name: &str) -> Option<String> {
		match &self.0.borrow().content {
			Content::Element(element) => element.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone()),
			_ => None,
		}
	}

	fn children(&self) -> Vec<NodeRef> {
		self.0.borrow().children.clone()
	}
}

/// A [`Dom`] over [`NodeRef`]s.
#[derive(Debug, Clone)]
pub struct SyntheticDom {
	document: NodeRef,
}

impl SyntheticDom {
	/// Reads `markup` as the live document.
	#[must_use]
	pub fn new(markup: &str) -> Self {
		Self { document: markup::parse(markup) }
	}

	/// Simulates a user picking `value` in a form control, without firing anything.
	pub fn set_value(&self, node: &NodeRef, value: &str) {
		node.with_element(|element| element.value = Some(value.to_owned()));
	}

	#[must_use]
	pub fn outer_html(&self, node: &NodeRef) -> String {
		let mut out = String::new();
		serialize(node, &mut out);
		out
	}

	#[must_use]
	pub fn inner_html(&self, node: &NodeRef) -> String {
		let mut out = String::new();
		for child in node.children() {
			serialize(&child, &mut out);
		}
		out
	}

	fn style_declarations(&self, node: &NodeRef) -> Vec<(String, String)> {
		node.attribute("style")
			.unwrap_or_default()
			.split(';')
			.filter_map(|declaration| {
				let mut parts = declaration.splitn(2, ':');
				let property = parts.next()?.trim().to_ascii_lowercase();
				let value = parts.next()?.trim().to_owned();
				if property.is_empty() {
					None
				} else {
					Some((property, value))
				}
			})
			.collect()
	}
}

impl Dom for SyntheticDom {
	type Node = NodeRef;

	fn document(&self) -> NodeRef {
		self.document.clone()
	}

	fn parse_document(&self, markup: &str) -> Result<NodeRef> {
		Ok(markup::parse(markup))
	}

	fn kind(&self, node: &NodeRef) -> NodeKind {
		match node.0.borrow().content {
			Content::Document => NodeKind::Document,
			Content::Element(_) => NodeKind::Element,
			Content::Text(_) => NodeKind::Text,
			Content::Comment(_) => NodeKind::Comment,
		}
	}

	fn local_name(&self, node: &NodeRef) -> Option<String> {
		node.local_name()
	}

	fn attribute(&self, node: &NodeRef, name: &str) -> Option<String> {
		node.attribute(name)
	}

	fn attributes(&self, node: &NodeRef) -> Vec<(String, String)> {
		match &node.0.borrow().content {
			Content::Element(element) => element.attributes.clone(),
			_ => Vec::new(),
		}
	}

	fn set_attribute(&self, node: &NodeRef, name: &str, value: &str) {
		node.with_element(|element| match element.attributes.iter_mut().find(|(n, _)| n == name) {
			Some((_, v)) => *v = value.to_owned(),
			None => element.attributes.push((name.to_owned(), value.to_owned())),
		});
	}

	fn remove_attribute(&self, node: &NodeRef, name: &str) {
		node.with_element(|element| element.attributes.retain(|(n, _)| n != name));
	}

	fn parent(&self, node: &NodeRef) -> Option<NodeRef> {
		node.parent()
	}

	fn children(&self, node: &NodeRef) -> Vec<NodeRef> {
		node.children()
	}

	fn text_content(&self, node: &NodeRef) -> String {
		match &node.0.borrow().content {
			Content::Text(text) | Content::Comment(text) => return text.clone(),
			Content::Document | Content::Element(_) => (),
		}
		let mut text = String::new();
		for descendant in self.descendants(node) {
			if let Content::Text(data) = &descendant.0.borrow().content {
				text.push_str(data)
			}
		}
		text
	}

	fn set_text_content(&self, node: &NodeRef, text: &str) {
		if self.character_data(node).is_some() {
			return self.set_character_data(node, text);
		}
		for child in node.children() {
			child.detach();
		}
		if !text.is_empty() {
			node.append(&NodeRef::new_text(text));
		}
	}

	fn character_data(&self, node: &NodeRef) -> Option<String> {
		match &node.0.borrow().content {
			Content::Text(data) | Content::Comment(data) => Some(data.clone()),
			_ => None,
		}
	}

	fn set_character_data(&self, node: &NodeRef, data: &str) {
		if let Content::Text(current) | Content::Comment(current) = &mut node.0.borrow_mut().content {
			*current = data.to_owned();
		}
	}

	fn create_element(&self, local_name: &str) -> Result<NodeRef> {
		Ok(NodeRef::new_element(local_name, Vec::new()))
	}

	fn import(&self, foreign: &NodeRef) -> Result<NodeRef> {
		Ok(foreign.deep_clone())
	}

	fn insert_before(&self, parent: &NodeRef, child: &NodeRef, reference: Option<&NodeRef>) {
		parent.insert_before(child, reference)
	}

	fn remove(&self, node: &NodeRef) {
		node.detach()
	}

	fn checked(&self, node: &NodeRef) -> bool {
		match &node.0.borrow().content {
			Content::Element(element) if element.local_name == "input" => {
				element.checked.unwrap_or_else(|| element.attributes.iter().any(|(n, _)| n == "checked"))
			}
			_ => false,
		}
	}

	fn set_checked(&self, node: &NodeRef, checked: bool) {
		if node.local_name().as_deref() != Some("input") {
			return;
		}
		if checked && node.attribute("type").as_deref() == Some("radio") {
			if let Some(group) = node.attribute("name") {
				for other in self.descendants(&node.root()) {
					if other != *node && other.local_name().as_deref() == Some("input") && other.attribute("name").as_deref() == Some(group.as_str()) {
						other.with_element(|element| element.checked = Some(false));
					}
				}
			}
		}
		node.with_element(|element| element.checked = Some(checked));
	}

	fn value(&self, node: &NodeRef) -> Option<String> {
		let (local_name, value) = match &node.0.borrow().content {
			Content::Element(element) => (element.local_name.clone(), element.value.clone()),
			_ => return None,
		};
		if value.is_some() {
			return value;
		}
		match local_name.as_str() {
			"option" => Some(node.attribute("value").unwrap_or_else(|| self.text_content(node).trim().to_owned())),
			"select" => {
				let options: Vec<NodeRef> = self.descendants(node).into_iter().filter(|n| n.local_name().as_deref() == Some("option")).collect();
				let chosen = options.iter().find(|option| option.attribute("selected").is_some()).or_else(|| options.first());
				chosen.and_then(|option| self.value(option))
			}
			_ => node.attribute("value"),
		}
	}

	fn hidden(&self, node: &NodeRef) -> bool {
		self.style_declarations(node).iter().any(|(property, value)| property == "display" && value == "none")
	}

	fn set_hidden(&self, node: &NodeRef, hidden: bool) {
		let mut declarations: Vec<(String, String)> = self.style_declarations(node).into_iter().filter(|(property, _)| property != "display").collect();
		if hidden {
			declarations.push(("display".to_owned(), "none".to_owned()));
		}
		if declarations.is_empty() {
			self.remove_attribute(node, "style");
		} else {
			let style = declarations.iter().map(|(property, value)| format!("{}: {};", property, value)).collect::<Vec<_>>().join(" ");
			self.set_attribute(node, "style", &style);
		}
	}
}

const VOID_ELEMENTS: &[&str] = &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr"];

pub(crate) fn is_void(local_name: &str) -> bool {
	VOID_ELEMENTS.contains(&local_name)
}

fn serialize(node: &NodeRef, out: &mut String) {
	let data = node.0.borrow();
	match &data.content {
		Content::Document => {
			for child in &data.children {
				serialize(child, out)
			}
		}
		Content::Text(text) => {
			let raw = data.parent.upgrade().map(NodeRef).and_then(|parent| parent.local_name()).map_or(false, |name| markup::is_raw_text(&name));
			if raw {
				out.push_str(text)
			} else {
				out.push_str(&escape(text, false))
			}
		}
		Content::Comment(comment) => {
			out.push_str("<!--");
			out.push_str(comment);
			out.push_str("-->");
		}
		Content::Element(element) => {
			out.push('<');
			out.push_str(&element.local_name);
			for (name, value) in &element.attributes {
				out.push(' ');
				out.push_str(name);
				if !value.is_empty() {
					out.push_str("=\"");
					out.push_str(&escape(value, true));
					out.push('"');
				}
			}
			out.push('>');
			if is_void(&element.local_name) {
				return;
			}
			for child in &data.children {
				serialize(child, out)
			}
			out.push_str("</");
			out.push_str(&element.local_name);
			out.push('>');
		}
	}
}

fn escape(text: &str, attribute: bool) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' if !attribute => escaped.push_str("&lt;"),
			'>' if !attribute => escaped.push_str("&gt;"),
			'"' if attribute => escaped.push_str("&quot;"),
			c => escaped.push(c),
		}
	}
	escaped
}

#[cfg(test)]
mod tests {
	use super::SyntheticDom;
	use crate::{dom::Dom, selector::Selector};

	#[test]
	fn radio_groups_are_exclusive() {
		let dom = SyntheticDom::new(r#"<fieldset><input type="radio" name="color" id="a" checked><input type="radio" name="color" id="b"></fieldset>"#);
		let document = dom.document();
		let a = dom.query(&document, &Selector::attribute_equals("id", "a")).unwrap();
		let b = dom.query(&document, &Selector::attribute_equals("id", "b")).unwrap();
		assert!(dom.checked(&a));
		dom.set_checked(&b, true);
		assert!(!dom.checked(&a));
		assert!(dom.checked(&b));
	}

	#[test]
	fn hiding_keeps_other_styles() {
		let dom = SyntheticDom::new(r#"<li style="color: red">x</li>"#);
		let li = dom.query(&dom.document(), &Selector::tag("li")).unwrap();
		dom.set_hidden(&li, true);
		assert!(dom.hidden(&li));
		assert_eq!(dom.attribute(&li, "style").as_deref(), Some("color: red; display: none;"));
		dom.set_hidden(&li, false);
		assert!(!dom.hidden(&li));
		assert_eq!(dom.attribute(&li, "style").as_deref(), Some("color: red;"));
	}

	#[test]
	fn select_value_defaults_to_selected_option() {
		let dom = SyntheticDom::new(r#"<select><option value="s">S</option><option value="m" selected>M</option></select>"#);
		let select = dom.query(&dom.document(), &Selector::tag("select")).unwrap();
		assert_eq!(dom.value(&select).as_deref(), Some("m"));
		dom.set_value(&select, "s");
		assert_eq!(dom.value(&select).as_deref(), Some("s"));
	}
}
