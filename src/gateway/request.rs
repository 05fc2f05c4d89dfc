//! Caller-facing request description.

// self
use crate::{_prelude::*, http::{Headers, Method}};

/// Outbound call relative to the configured base URL.
///
/// The request is immutable data: retry state lives in the gateway's attempt loop, never on the
/// request, so the same value can be sent any number of times.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the base URL.
	pub path: String,
	/// Query parameters appended in order.
	pub query: Vec<(String, String)>,
	/// Extra headers; `authorization` and the bypass header are overwritten by the gateway.
	pub headers: Headers,
	/// JSON body.
	pub body: Option<Value>,
}
impl ApiRequest {
	/// Creates a request without query, headers, or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), query: Vec::new(), headers: Headers::new(), body: None }
	}

	/// `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::Patch, path)
	}

	/// `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Appends several query parameters.
	pub fn queries<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: ToString,
	{
		self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.to_string())));

		self
	}

	/// Adds or replaces a header.
	pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.set(name, value);

		self
	}

	/// Sets a JSON body.
	pub fn body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `body` as the JSON body.
	pub fn json<T>(self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let value = serde_json::to_value(body).map_err(|source| Error::Encode { source })?;

		Ok(self.body(value))
	}
}
