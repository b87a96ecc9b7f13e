//! XML to tree mapping.
//!
//! The root element becomes the single key of the returned object. An element without attributes
//! or children is a text scalar. Otherwise it is an object holding `@name` entries for attributes,
//! one entry per child element (repeated siblings fold into an array), and its text under `value`.

// crates.io
use quick_xml::{
	Reader,
	events::{BytesStart, Event},
};
// self
use crate::{error::FormatError, value::Plain};

/// Key holding the text of an element that also has attributes or children.
pub const TEXT_KEY: &str = "value";

pub(super) fn parse(text: &str) -> Result<Plain, FormatError> {
	let mut reader = Reader::from_str(text);

	reader.config_mut().trim_text(true);

	let mut stack = Vec::<Element>::new();
	let mut root = None::<(String, Plain)>;

	loop {
		match reader.read_event().map_err(invalid)? {
			Event::Start(start) => {
				if root.is_some() {
					return Err(invalid("content after the root element"));
				}

				stack.push(Element::open(&start)?);
			},
			Event::Empty(start) => {
				if root.is_some() {
					return Err(invalid("content after the root element"));
				}

				close(&mut stack, &mut root, Element::open(&start)?)?;
			},
			Event::End(_) => {
				let element = stack.pop().ok_or_else(|| invalid("unbalanced closing tag"))?;

				close(&mut stack, &mut root, element)?;
			},
			Event::Text(content) => {
				let content = content.unescape().map_err(invalid)?;

				match stack.last_mut() {
					Some(element) => element.text.push_str(&content),
					None if content.trim().is_empty() => {},
					None => return Err(invalid("text outside the root element")),
				}
			},
			Event::CData(content) => {
				let content =
					String::from_utf8(content.into_inner().into_owned()).map_err(invalid)?;

				match stack.last_mut() {
					Some(element) => element.text.push_str(&content),
					None => return Err(invalid("CDATA outside the root element")),
				}
			},
			Event::Eof => break,
			_ => {},
		}
	}

	if !stack.is_empty() {
		return Err(invalid("unclosed element"));
	}

	root.map(|entry| Plain::Object(vec![entry])).ok_or_else(|| invalid("no root element"))
}

struct Element {
	name: String,
	entries: Vec<(String, Plain)>,
	text: String,
}
impl Element {
	fn open(start: &BytesStart) -> Result<Self, FormatError> {
		let name = std::str::from_utf8(start.name().as_ref()).map_err(invalid)?.to_owned();
		let mut entries = Vec::new();

		for attribute in start.attributes() {
			let attribute = attribute.map_err(invalid)?;
			let key = std::str::from_utf8(attribute.key.as_ref()).map_err(invalid)?;
			let value = attribute.unescape_value().map_err(invalid)?;

			entries.push((format!("@{key}"), Plain::text(value.into_owned())));
		}

		Ok(Self { name, entries, text: String::new() })
	}

	fn finish(self) -> (String, Plain) {
		let Self { name, mut entries, text } = self;

		if entries.is_empty() {
			return (name, Plain::text(text));
		}
		if !text.is_empty() {
			entries.push((TEXT_KEY.into(), Plain::text(text)));
		}

		(name, Plain::Object(entries))
	}
}

fn close(
	stack: &mut [Element],
	root: &mut Option<(String, Plain)>,
	element: Element,
) -> Result<(), FormatError> {
	let (name, value) = element.finish();

	match stack.last_mut() {
		Some(parent) => Plain::push_grouped(&mut parent.entries, name, value),
		None if root.is_none() => *root = Some((name, value)),
		None => return Err(invalid("multiple root elements")),
	}

	Ok(())
}

fn invalid(message: impl std::fmt::Display) -> FormatError {
	FormatError::InvalidXml { message: message.to_string() }
}
