//! HTML text helpers shared by string serialisers.

use crate::vnode::PropValue;

/// HTML elements serialised without a closing tag
const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

pub(crate) fn is_void_element(tag: &str) -> bool {
	VOID_ELEMENTS.contains(&tag)
}

/// Simple HTML escape function.
pub(crate) fn escape(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&#x27;")
}

/// Write `<tag attr="...">`
///
/// `true` booleans become bare attributes; `false` and handlers are skipped.
pub(crate) fn write_open_tag<'a>(
	out: &mut String,
	tag: &str,
	attributes: impl IntoIterator<Item = (&'a str, &'a PropValue)>,
) {
	out.push('<');
	out.push_str(tag);
	for (name, value) in attributes {
		match value {
			PropValue::Bool(true) => {
				out.push(' ');
				out.push_str(name);
			}
			PropValue::Bool(false) | PropValue::Handler(_) => {}
			other => {
				if let Some(text) = other.to_attribute_string() {
					out.push_str(&format!(" {}=\"{}\"", name, escape(&text)));
				}
			}
		}
	}
	out.push('>');
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::vnode::EventHandler;
	use rstest::rstest;

	#[rstest]
	#[case("plain", "plain")]
	#[case("<b>&</b>", "&lt;b&gt;&amp;&lt;/b&gt;")]
	#[case("\"quoted\" 'single'", "&quot;quoted&quot; &#x27;single&#x27;")]
	fn test_escape(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(escape(input), expected);
	}

	#[test]
	fn test_open_tag_attributes() {
		let handler = PropValue::Handler(EventHandler::new(|_| {}));
		let attributes = [
			("type", PropValue::from("checkbox")),
			("checked", PropValue::Bool(true)),
			("disabled", PropValue::Bool(false)),
			("onclick", handler),
			("tabindex", PropValue::from(2)),
		];

		let mut out = String::new();
		write_open_tag(&mut out, "input", attributes.iter().map(|(k, v)| (*k, v)));
		assert_eq!(out, "<input type=\"checkbox\" checked tabindex=\"2\">");
		assert!(is_void_element("input"));
		assert!(!is_void_element("div"));
	}
}
