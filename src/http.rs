//! Transport primitives for gateway calls.
//!
//! The module exposes [`HttpTransport`] and [`TransportErrorMapper`] so host applications can
//! plug in any HTTP stack (or a scripted fake in tests) without touching the gateway's
//! credential and refresh logic. The transport only moves bytes: it never inspects status
//! codes, never retries, and never touches the session store. Timeouts are carried on each
//! [`HttpRequest`] and must be honored by the implementation.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::{config::GatewayConfig, error::ConfigError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

/// HTTP methods used by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}

/// Case-insensitive header map; names are stored lowercase.
///
/// `Debug` output redacts the `authorization` value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);
impl Headers {
	/// Creates an empty header map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces a header, returning the previous value.
	pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
		self.0.insert(name.as_ref().to_ascii_lowercase(), value.into())
	}

	/// Returns the value of a header.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Removes a header, returning its value.
	pub fn remove(&mut self, name: &str) -> Option<String> {
		self.0.remove(&name.to_ascii_lowercase())
	}

	/// Returns `true` when the header is present.
	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Copies every header from `other`, replacing duplicates.
	pub fn extend_from(&mut self, other: &Headers) {
		for (name, value) in other.iter() {
			self.set(name, value);
		}
	}

	/// Iterates over `(name, value)` pairs in name order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Number of headers.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no headers are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for Headers {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_map()
			.entries(self.iter().map(|(name, value)| {
				(name, if name == "authorization" { "<redacted>" } else { value })
			}))
			.finish()
	}
}

/// Fully resolved outbound request handed to a transport.
#[derive(Clone, Debug)]
pub struct HttpRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL including query parameters.
	pub url: Url,
	/// Headers to send.
	pub headers: Headers,
	/// Serialized body, if any.
	pub body: Option<Vec<u8>>,
	/// Timeout the transport must enforce.
	pub timeout: Option<std::time::Duration>,
}
impl HttpRequest {
	/// Creates a bodiless request without headers.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Headers::new(), body: None, timeout: None }
	}

	/// Returns the bearer token carried by the request, if any.
	pub fn bearer(&self) -> Option<&str> {
		self.headers.get("authorization")?.strip_prefix("Bearer ")
	}
}

/// Raw response returned by a transport.
#[derive(Clone, Debug)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: Headers,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates a response with the provided status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: Headers::new(), body: body.into() }
	}

	/// Returns `true` for any 2xx status.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP stacks capable of executing gateway calls.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// clone of a gateway, and the returned futures must be `Send` so gateway calls can hop
/// executors.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted when no response was received.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and resolves with whatever response arrived, success or not.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Maps transport-specific failures into gateway [`TransportError`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Classifies the failure; timeouts must map to [`TransportError::Timeout`].
	fn map_transport_error(&self, error: E) -> TransportError;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose connection-level timeout matches the gateway configuration.
	pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(config.request_timeout()).build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let HttpRequest { method, url, headers, body, timeout } = request;
			let mut builder = client.request(method.into(), url);

			for (name, value) in headers.iter() {
				builder = builder.header(name, value);
			}
			if let Some(timeout) = timeout {
				builder = builder.timeout(timeout);
			}
			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let mut response_headers = Headers::new();

			for (name, value) in response.headers() {
				if let Ok(value) = value.to_str() {
					response_headers.set(name.as_str(), value);
				}
			}

			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { status, headers: response_headers, body })
		})
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, error: ReqwestError) -> TransportError {
		if error.is_timeout() { TransportError::timeout(error) } else { TransportError::network(error) }
	}
}
