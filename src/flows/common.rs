//! Shared helpers for both protocol clients (request assembly, body encoding, dispatch).

// crates.io
use oauth2::http::Request;
use rand::{Rng, distr::Alphanumeric};
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	authorization::{HttpAuthorization, HttpParameter, ParameterKind},
	error::RequestError,
	flows::ApiResponse,
	http::{AsyncHttpClient, HttpRequest, HttpTransport, Method, header},
	oauth::TransportErrorMapper,
};

/// `application/x-www-form-urlencoded`.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
/// `multipart/form-data`.
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

const BOUNDARY_LEN: usize = 32;

/// HTTP transport paired with the mapper applied to its failures.
pub(crate) struct Dispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
}
impl<C, M> Dispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(http_client: Arc<C>, transport_mapper: Arc<M>) -> Self {
		Self { http_client, transport_mapper }
	}

	/// Executes `request`; non-2xx answers become [`RequestError::Status`].
	pub(crate) async fn send(&self, request: HttpRequest) -> Result<ApiResponse> {
		let handle = self.http_client.handle();
		let response = handle
			.call(request)
			.await
			.map_err(|e| self.transport_mapper.map_transport_error(e))?;
		let response = ApiResponse::from(response);

		if !response.is_success() {
			return Err(RequestError::Status {
				status: response.status,
				content_type: response.content_type.clone(),
				body: response.text(),
			}
			.into());
		}

		Ok(response)
	}
}
impl<C, M> Clone for Dispatcher<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: Arc::clone(&self.http_client),
			transport_mapper: Arc::clone(&self.transport_mapper),
		}
	}
}

/// Body content type implied by `parameters`, as seen by the OAuth 1.0 signature.
///
/// File parts force multipart, an explicit `Content-Type` header wins next, and form parameters
/// travel form-encoded on methods that carry a body.
pub fn body_content_type(method: &Method, parameters: &[HttpParameter]) -> Option<String> {
	if parameters.iter().any(|parameter| matches!(parameter.kind, ParameterKind::File { .. })) {
		return Some(MULTIPART_CONTENT_TYPE.into());
	}
	if let Some(explicit) = explicit_content_type(parameters) {
		return Some(explicit);
	}
	if carries_body(method)
		&& parameters.iter().any(|parameter| parameter.kind == ParameterKind::Form)
	{
		return Some(FORM_CONTENT_TYPE.into());
	}

	None
}

/// Assembles the outgoing request.
///
/// URL parameters (and form parameters on body-less methods) extend the query string, header
/// parameters become headers, and the body is the raw-body parameter, a multipart document, or
/// the form-encoded parameters, in that order of precedence.
pub(crate) fn build_request(
	method: Method,
	url: &Url,
	authorization: Option<&HttpAuthorization>,
	accept: Option<&str>,
	parameters: &[HttpParameter],
) -> Result<HttpRequest> {
	let body_allowed = carries_body(&method);
	let mut target = url.clone();
	let query = parameters
		.iter()
		.filter(|parameter| match parameter.kind {
			ParameterKind::Url => true,
			ParameterKind::Form => !body_allowed,
			_ => false,
		})
		.collect::<Vec<_>>();

	if !query.is_empty() {
		let mut pairs = target.query_pairs_mut();

		for parameter in query {
			pairs.append_pair(&parameter.name, &parameter.text());
		}
	}

	let mut builder = Request::builder().method(method).uri(target.as_str());

	if let Some(authorization) = authorization {
		builder = builder.header(header::AUTHORIZATION, authorization.header_value());
	}
	if let Some(accept) = accept {
		builder = builder.header(header::ACCEPT, accept);
	}

	let (content_type, body) =
		if body_allowed { encode_body(parameters)? } else { (None, Vec::new()) };

	for parameter in parameters.iter().filter(|parameter| parameter.kind == ParameterKind::Header) {
		// The encoded body owns the content type whenever it produced one.
		if content_type.is_some()
			&& parameter.name.eq_ignore_ascii_case(header::CONTENT_TYPE.as_str())
		{
			continue;
		}

		builder = builder.header(parameter.name.as_str(), parameter.text());
	}

	if let Some(content_type) = content_type {
		builder = builder.header(header::CONTENT_TYPE, content_type);
	}

	builder.body(body).map_err(|e| RequestError::from(e).into())
}

fn encode_body(parameters: &[HttpParameter]) -> Result<(Option<String>, Vec<u8>)> {
	let raw = parameters.iter().find(|parameter| parameter.kind == ParameterKind::RawBody);

	if let Some(raw) = raw {
		return Ok((None, raw.text().into_bytes()));
	}
	if parameters.iter().any(|parameter| matches!(parameter.kind, ParameterKind::File { .. })) {
		let boundary = rand::rng()
			.sample_iter(Alphanumeric)
			.take(BOUNDARY_LEN)
			.map(char::from)
			.collect::<String>();
		let body = multipart_body(&boundary, parameters)?;

		return Ok((Some(format!("{MULTIPART_CONTENT_TYPE}; boundary={boundary}")), body));
	}

	let forms = parameters.iter().filter(|parameter| parameter.kind == ParameterKind::Form);
	let mut serializer = Serializer::new(String::new());
	let mut any = false;

	for parameter in forms {
		serializer.append_pair(&parameter.name, &parameter.text());

		any = true;
	}

	if !any {
		return Ok((None, Vec::new()));
	}

	let content_type =
		explicit_content_type(parameters).unwrap_or_else(|| FORM_CONTENT_TYPE.into());

	Ok((Some(content_type), serializer.finish().into_bytes()))
}

/// Multipart document: form parameters as text parts, files as `application/octet-stream`.
pub(crate) fn multipart_body(boundary: &str, parameters: &[HttpParameter]) -> Result<Vec<u8>> {
	let mut body = Vec::new();

	for parameter in parameters {
		match &parameter.kind {
			ParameterKind::Form => {
				body.extend_from_slice(
					format!(
						"--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n",
						parameter.name
					)
					.as_bytes(),
				);
				body.extend_from_slice(parameter.text().as_bytes());
				body.extend_from_slice(b"\r\n");
			},
			ParameterKind::File { file_name } => {
				body.extend_from_slice(
					format!(
						"--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"; \
						 filename=\"{file_name}\"\r\n\
						 Content-Type: application/octet-stream\r\n\r\n",
						parameter.name
					)
					.as_bytes(),
				);
				body.extend_from_slice(&parameter.value.to_bytes()?);
				body.extend_from_slice(b"\r\n");
			},
			_ => {},
		}
	}

	body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

	Ok(body)
}

fn explicit_content_type(parameters: &[HttpParameter]) -> Option<String> {
	parameters
		.iter()
		.find(|parameter| {
			parameter.kind == ParameterKind::Header
				&& parameter.name.eq_ignore_ascii_case(header::CONTENT_TYPE.as_str())
		})
		.map(HttpParameter::text)
}

fn carries_body(method: &Method) -> bool {
	![Method::GET, Method::HEAD, Method::DELETE].contains(method)
}
