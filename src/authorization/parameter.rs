// self
use crate::{_prelude::*, value::UniValue};

/// Where a request parameter travels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParameterKind {
	/// URL query string.
	Url,
	/// `application/x-www-form-urlencoded` body (or a multipart text part).
	Form,
	/// Multipart file part.
	File {
		/// File name announced in the part's `Content-Disposition`.
		file_name: String,
	},
	/// Extra HTTP header.
	Header,
	/// Entire request body, sent verbatim.
	RawBody,
}

/// One request parameter.
#[derive(Clone, Debug)]
pub struct HttpParameter {
	/// Where the parameter travels.
	pub kind: ParameterKind,
	/// Parameter (or header) name; ignored for [`ParameterKind::RawBody`].
	pub name: String,
	/// Parameter value.
	pub value: UniValue,
}
impl HttpParameter {
	/// Query-string parameter.
	pub fn url(name: impl Into<String>, value: impl Into<UniValue>) -> Self {
		Self { kind: ParameterKind::Url, name: name.into(), value: value.into() }
	}

	/// Form-body parameter.
	pub fn form(name: impl Into<String>, value: impl Into<UniValue>) -> Self {
		Self { kind: ParameterKind::Form, name: name.into(), value: value.into() }
	}

	/// Multipart file upload.
	pub fn file(name: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
		Self {
			kind: ParameterKind::File { file_name: file_name.into() },
			name: name.into(),
			value: crate::value::Scalar::Bytes(bytes).into(),
		}
	}

	/// Extra HTTP header.
	pub fn header(name: impl Into<String>, value: impl Into<UniValue>) -> Self {
		Self { kind: ParameterKind::Header, name: name.into(), value: value.into() }
	}

	/// Verbatim request body.
	pub fn raw_body(body: impl Into<String>) -> Self {
		let body: String = body.into();

		Self { kind: ParameterKind::RawBody, name: String::new(), value: body.into() }
	}

	/// Returns `true` when the parameter takes part in the OAuth 1.0 signature base string.
	///
	/// Query parameters always do; form parameters only outside multipart bodies.
	pub fn is_signed(&self, multipart: bool) -> bool {
		match self.kind {
			ParameterKind::Url => true,
			ParameterKind::Form => !multipart,
			_ => false,
		}
	}

	/// Parameter value as it appears on the wire.
	pub fn text(&self) -> String {
		self.value.to_string()
	}
}
