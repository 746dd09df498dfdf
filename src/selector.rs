//! Typed selectors.
//!
//! Only the small subset of CSS the picker needs: type, class and attribute selectors, `:checked`,
//! the descendant combinator and selector lists.
//! [`Display`] renders valid CSS so hosts with a native `querySelector` can use it directly.

use crate::dom::{Dom, NodeKind};
use core::fmt::{self, Display, Formatter, Write as _};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
	Type(String),
	Class(String),
	Attribute(String),
	AttributeEquals(String, String),
	Checked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
	Compound(Vec<Simple>),
	Descendant { ancestor: Box<Selector>, subject: Box<Selector> },
	List(Vec<Selector>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector(Kind);

impl Selector {
	#[must_use]
	pub fn tag(name: &str) -> Self {
		Self(Kind::Compound(vec![Simple::Type(name.to_ascii_lowercase())]))
	}

	#[must_use]
	pub fn class(name: &str) -> Self {
		Self(Kind::Compound(vec![Simple::Class(name.to_owned())]))
	}

	#[must_use]
	pub fn attribute(name: &str) -> Self {
		Self(Kind::Compound(vec![Simple::Attribute(name.to_owned())]))
	}

	#[must_use]
	pub fn attribute_equals(name: &str, value: &str) -> Self {
		Self(Kind::Compound(vec![Simple::AttributeEquals(name.to_owned(), value.to_owned())]))
	}

	#[must_use]
	pub fn with_class(self, name: &str) -> Self {
		self.push(Simple::Class(name.to_owned()))
	}

	#[must_use]
	pub fn with_attribute(self, name: &str) -> Self {
		self.push(Simple::Attribute(name.to_owned()))
	}

	#[must_use]
	pub fn with_attribute_equals(self, name: &str, value: &str) -> Self {
		self.push(Simple::AttributeEquals(name.to_owned(), value.to_owned()))
	}

	#[must_use]
	pub fn checked(self) -> Self {
		self.push(Simple::Checked)
	}

	/// `ancestor self`
	#[must_use]
	pub fn within(self, ancestor: Selector) -> Self {
		Self(Kind::Descendant { ancestor: Box::new(ancestor), subject: Box::new(self) })
	}

	/// `self, other`
	#[must_use]
	pub fn or(self, other: Selector) -> Self {
		match self.0 {
			Kind::List(mut list) => {
				list.push(other);
				Self(Kind::List(list))
			}
			single => Self(Kind::List(vec![Self(single), other])),
		}
	}

	fn push(self, simple: Simple) -> Self {
		Self(match self.0 {
			Kind::Compound(mut parts) => {
				parts.push(simple);
				Kind::Compound(parts)
			}
			Kind::Descendant { ancestor, subject } => Kind::Descendant { ancestor, subject: Box::new(subject.push(simple)) },
			Kind::List(list) => Kind::List(list.into_iter().map(|s| s.push(simple.clone())).collect()),
		})
	}

	pub fn matches<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
		if dom.kind(node) != NodeKind::Element {
			return false;
		}
		match &self.0 {
			Kind::Compound(parts) => parts.iter().all(|part| part.matches(dom, node)),
			Kind::Descendant { ancestor, subject } => {
				if !subject.matches(dom, node) {
					return false;
				}
				let mut current = dom.parent(node);
				while let Some(candidate) = current {
					if ancestor.matches(dom, &candidate) {
						return true;
					}
					current = dom.parent(&candidate);
				}
				false
			}
			Kind::List(list) => list.iter().any(|selector| selector.matches(dom, node)),
		}
	}
}

impl Simple {
	fn matches<D: Dom + ?Sized>(&self, dom: &D, node: &D::Node) -> bool {
		match self {
			Self::Type(name) => dom.local_name(node).as_deref() == Some(name.as_str()),
			Self::Class(name) => dom.attribute(node, "class").map_or(false, |classes| classes.split_ascii_whitespace().any(|class| class == name)),
			Self::Attribute(name) => dom.attribute(node, name).is_some(),
			Self::AttributeEquals(name, value) => dom.attribute(node, name).as_deref() == Some(value.as_str()),
			Self::Checked => dom.checked(node),
		}
	}
}

impl Display for Simple {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Type(name) => f.write_str(name),
			Self::Class(name) => write!(f, ".{}", name),
			Self::Attribute(name) => write!(f, "[{}]", name),
			Self::AttributeEquals(name, value) => {
				write!(f, "[{}=\"", name)?;
				for c in value.chars() {
					if c == '"' || c == '\\' {
						f.write_char('\\')?;
					}
					f.write_char(c)?;
				}
				f.write_str("\"]")
			}
			Self::Checked => f.write_str(":checked"),
		}
	}
}

impl Display for Selector {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.0 {
			Kind::Compound(parts) => parts.iter().try_for_each(|part| part.fmt(f)),
			Kind::Descendant { ancestor, subject } => write!(f, "{} {}", ancestor, subject),
			Kind::List(list) => {
				for (i, selector) in list.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					selector.fmt(f)?;
				}
				Ok(())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::Selector;

	#[test]
	fn renders_css() {
		let selector = Selector::tag("option")
			.with_attribute("selected")
			.within(Selector::tag("select"))
			.or(Selector::tag("input").checked().within(Selector::tag("fieldset")));
		assert_eq!(selector.to_string(), "select option[selected], fieldset input:checked");
	}

	#[test]
	fn escapes_attribute_values() {
		assert_eq!(Selector::attribute_equals("data-option-value-id", r#"a"b"#).to_string(), r#"[data-option-value-id="a\"b"]"#);
	}

	#[test]
	fn compound_classes() {
		assert_eq!(Selector::class("quick-add-modal").with_attribute("open").to_string(), ".quick-add-modal[open]");
	}
}
