//! A forgiving reader for server-rendered section markup.
//!
//! This is not an HTML5 tree builder. It handles what section rendering emits:
//! nested elements, quoted/unquoted/boolean attributes, void and self-closed elements,
//! comments, doctypes, raw-text `<script>`/`<style>` bodies and the common character references.
//! Stray end tags are ignored and unclosed elements are closed at the end of input.

use crate::synthetic::{is_void, NodeRef};
use tracing::trace;

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

pub(crate) fn is_raw_text(local_name: &str) -> bool {
	RAW_TEXT_ELEMENTS.contains(&local_name)
}

/// Elements that implicitly close an open sibling of the same name.
fn closes_open_sibling(local_name: &str) -> bool {
	matches!(local_name, "li" | "option" | "p")
}

#[must_use]
pub fn parse(markup: &str) -> NodeRef {
	let document = NodeRef::new_document();
	let mut open = vec![document.clone()];
	let mut rest = markup;

	while !rest.is_empty() {
		let parent = open.last().cloned().unwrap_or_else(|| document.clone());

		if let Some(after) = rest.strip_prefix("<!--") {
			let (comment, remainder) = match after.find("-->") {
				Some(end) => (&after[..end], &after[end + 3..]),
				None => (after, ""),
			};
			parent.append(&NodeRef::new_comment(comment));
			rest = remainder;
		} else if rest.starts_with("<!") || rest.starts_with("<?") {
			rest = rest.find('>').map_or("", |end| &rest[end + 1..]);
		} else if let Some(after) = rest.strip_prefix("</") {
			let end = after.find('>').unwrap_or_else(|| after.len());
			let name = after[..end].trim().to_ascii_lowercase();
			rest = after.get(end + 1..).unwrap_or("");
			match open.iter().rposition(|node| node.local_name().as_deref() == Some(name.as_str())) {
				Some(index) if index > 0 => open.truncate(index),
				_ => trace!("Ignoring stray end tag </{}>.", name),
			}
		} else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
			let (tag, remainder) = read_start_tag(&rest[1..]);
			rest = remainder;

			if closes_open_sibling(&tag.name) && parent.local_name().as_deref() == Some(tag.name.as_str()) {
				open.pop();
			}
			let parent = open.last().cloned().unwrap_or_else(|| document.clone());
			let element = NodeRef::new_element(&tag.name, tag.attributes);
			parent.append(&element);

			if is_raw_text(&tag.name) && !tag.self_closing {
				let (body, remainder) = split_raw_text(rest, &tag.name);
				if !body.is_empty() {
					let body = if tag.name == "script" || tag.name == "style" { body.to_owned() } else { decode(body) };
					element.append(&NodeRef::new_text(&body));
				}
				rest = remainder;
			} else if !tag.self_closing && !is_void(&tag.name) {
				open.push(element);
			}
		} else {
			let first = rest.chars().next().map_or(1, char::len_utf8);
			let end = rest[first..].find('<').map_or(rest.len(), |i| i + first);
			parent.append(&NodeRef::new_text(&decode(&rest[..end])));
			rest = &rest[end..];
		}
	}

	document
}

struct StartTag {
	name: String,
	attributes: Vec<(String, String)>,
	self_closing: bool,
}

/// Reads a start tag after its `<`.
fn read_start_tag(input: &str) -> (StartTag, &str) {
	let name_end = input.find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/').unwrap_or_else(|| input.len());
	let mut tag = StartTag {
		name: input[..name_end].to_ascii_lowercase(),
		attributes: Vec::new(),
		self_closing: false,
	};
	let mut rest = &input[name_end..];

	loop {
		rest = rest.trim_start();
		if rest.is_empty() {
			return (tag, rest);
		}
		if let Some(after) = rest.strip_prefix("/>") {
			tag.self_closing = true;
			return (tag, after);
		}
		if let Some(after) = rest.strip_prefix('>') {
			return (tag, after);
		}
		if let Some(after) = rest.strip_prefix('/') {
			rest = after;
			continue;
		}

		let name_end = rest.find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '>' || c == '/').unwrap_or_else(|| rest.len());
		let name = rest[..name_end].to_ascii_lowercase();
		rest = rest[name_end..].trim_start();

		let value = if let Some(after) = rest.strip_prefix('=') {
			let after = after.trim_start();
			match after.chars().next() {
				Some(quote @ '"') | Some(quote @ '\'') => {
					let body = &after[1..];
					let end = body.find(quote).unwrap_or_else(|| body.len());
					rest = body.get(end + 1..).unwrap_or("");
					decode(&body[..end])
				}
				_ => {
					let end = after.find(|c: char| c.is_ascii_whitespace() || c == '>').unwrap_or_else(|| after.len());
					rest = &after[end..];
					decode(&after[..end])
				}
			}
		} else {
			String::new()
		};

		if !name.is_empty() && !tag.attributes.iter().any(|(n, _)| *n == name) {
			tag.attributes.push((name, value));
		}
	}
}

/// Splits off a raw text body up to its (case-insensitive) end tag.
fn split_raw_text<'a>(input: &'a str, name: &str) -> (&'a str, &'a str) {
	let needle = format!("</{}", name);
	let lowercase = input.to_ascii_lowercase();
	match lowercase.find(&needle) {
		Some(start) => {
			let after = &input[start..];
			let end = after.find('>').map_or(after.len(), |i| i + 1);
			(&input[..start], &after[end..])
		}
		None => (input, ""),
	}
}

fn decode(text: &str) -> String {
	if !text.contains('&') {
		return text.to_owned();
	}

	let mut decoded = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(start) = rest.find('&') {
		decoded.push_str(&rest[..start]);
		rest = &rest[start..];
		let end = match rest.find(';') {
			Some(end) if end <= 10 => end,
			_ => {
				decoded.push('&');
				rest = &rest[1..];
				continue;
			}
		};
		let reference = &rest[1..end];
		let c = match reference {
			"amp" => Some('&'),
			"lt" => Some('<'),
			"gt" => Some('>'),
			"quot" => Some('"'),
			"apos" => Some('\''),
			"nbsp" => Some('\u{a0}'),
			_ => reference
				.strip_prefix("#x")
				.or_else(|| reference.strip_prefix("#X"))
				.and_then(|hex| u32::from_str_radix(hex, 16).ok())
				.or_else(|| reference.strip_prefix('#').and_then(|decimal| decimal.parse().ok()))
				.and_then(core::char::from_u32),
		};
		match c {
			Some(c) => {
				decoded.push(c);
				rest = &rest[end + 1..];
			}
			None => {
				decoded.push('&');
				rest = &rest[1..];
			}
		}
	}
	decoded.push_str(rest);
	decoded
}

#[cfg(test)]
mod tests {
	use super::parse;
	use crate::{dom::Dom, selector::Selector, synthetic::SyntheticDom};

	#[test]
	fn reads_nested_markup() {
		let dom = SyntheticDom::new(
			r#"<!doctype html><main><variant-picker data-product-id="1"><script type="application/json">{"a": "<b>"}</script><input type=radio checked data-option-value-id='x'/></variant-picker></main>"#,
		);
		let document = dom.document();
		let picker = dom.query(&document, &Selector::tag("variant-picker")).unwrap();
		assert_eq!(dom.attribute(&picker, "data-product-id").as_deref(), Some("1"));

		let script = dom.query(&picker, &Selector::tag("script")).unwrap();
		assert_eq!(dom.text_content(&script), r#"{"a": "<b>"}"#);

		let input = dom.query(&picker, &Selector::tag("input").checked()).unwrap();
		assert_eq!(dom.attribute(&input, "data-option-value-id").as_deref(), Some("x"));
	}

	#[test]
	fn decodes_character_references() {
		let dom = SyntheticDom::new(r#"<p title="a &amp; b">1 &lt; 2 &#38; &#x41; &unknown; & done</p>"#);
		let p = dom.query(&dom.document(), &Selector::tag("p")).unwrap();
		assert_eq!(dom.attribute(&p, "title").as_deref(), Some("a & b"));
		assert_eq!(dom.text_content(&p), "1 < 2 & A &unknown; & done");
	}

	#[test]
	fn list_items_close_implicitly() {
		let dom = SyntheticDom::new("<ul><li>a<li>b</ul><p>after</p>");
		let document = dom.document();
		let ul = dom.query(&document, &Selector::tag("ul")).unwrap();
		assert_eq!(dom.children(&ul).len(), 2);
		assert_eq!(dom.inner_html(&document), "<ul><li>a</li><li>b</li></ul><p>after</p>");
	}

	#[test]
	fn stray_end_tags_are_ignored() {
		let document = parse("<div></span>text</div>");
		let dom = SyntheticDom::new("");
		assert_eq!(dom.inner_html(&document), "<div>text</div>");
	}
}
