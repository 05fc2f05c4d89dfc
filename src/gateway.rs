//! Authenticated request gateway.
//!
//! [`Gateway::send`] reads the current access token from the injected [`SessionStore`],
//! attaches it as a bearer credential, re-applies the fixed bypass header, and dispatches the
//! call through the configured [`HttpTransport`]. A `401` answer triggers exactly one
//! refresh-and-retry cycle; a second `401`, or any other status, is handed back unchanged.
//! Refreshes are single-flight across every clone of a gateway, so concurrent `401`s share one
//! refresh call and retry with the token it produced. When the session cannot be recovered the
//! store is cleared and the [`SessionObserver`] hears about it.

mod auth;
mod observer;
mod refresh;
mod request;

pub use observer::*;
pub use refresh::RefreshMetrics;
pub use request::*;

// self
use crate::{
	_prelude::*,
	config::{self, GatewayConfig},
	error::{ConfigError, DecodeError, HttpError, TransportError},
	gateway::refresh::RefreshGate,
	http::{HttpRequest, HttpResponse, HttpTransport, Method, TransportErrorMapper},
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::TokenSecret,
	store::SessionStore,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

/// Gateway specialized for the crate's default reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ReqwestGateway = Gateway<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Issues authenticated calls against a single backend.
///
/// Cloning is cheap: clones share the transport, the store, the observer and the refresh guard.
pub struct Gateway<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP transport used for every outbound call.
	pub http_client: Arc<C>,
	/// Mapper applied to transport failures before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Session store holding the credential pair.
	pub store: Arc<dyn SessionStore>,
	/// Immutable process-wide configuration.
	pub config: Arc<GatewayConfig>,
	/// Receiver for session-terminated signals.
	pub observer: Arc<dyn SessionObserver>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_gate: Arc<RefreshGate>,
}
impl<C, M> Gateway<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a gateway that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn SessionStore>,
		config: GatewayConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			config: Arc::new(config),
			observer: Arc::new(|_: TerminationReason| {}),
			refresh_metrics: Default::default(),
			refresh_gate: Arc::new(RefreshGate::new()),
		}
	}

	/// Replaces the session-terminated observer.
	pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
		self.observer = observer;

		self
	}

	/// Sends `request` and returns the JSON body of the final 2xx response (`null` when empty).
	pub async fn send(&self, request: ApiRequest) -> Result<Value> {
		let response = self.execute(&request).await?;

		Ok(decode_json(&response)?)
	}

	/// Sends `request` and decodes the final 2xx body into `T`.
	pub async fn send_json<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.execute(&request).await?;

		Ok(decode_json(&response)?)
	}

	/// Sends `request` and returns the raw body bytes (report exports, backups).
	pub async fn download(&self, request: ApiRequest) -> Result<Vec<u8>> {
		Ok(self.execute(&request).await?.body)
	}

	/// Shorthand for `send(ApiRequest::get(path))`.
	pub async fn get(&self, path: impl Into<String>) -> Result<Value> {
		self.send(ApiRequest::get(path)).await
	}

	/// Shorthand for `send(ApiRequest::post(path).body(body))`.
	pub async fn post(&self, path: impl Into<String>, body: Value) -> Result<Value> {
		self.send(ApiRequest::post(path).body(body)).await
	}

	/// Shorthand for `send(ApiRequest::put(path).body(body))`.
	pub async fn put(&self, path: impl Into<String>, body: Value) -> Result<Value> {
		self.send(ApiRequest::put(path).body(body)).await
	}

	/// Shorthand for `send(ApiRequest::patch(path).body(body))`.
	pub async fn patch(&self, path: impl Into<String>, body: Value) -> Result<Value> {
		self.send(ApiRequest::patch(path).body(body)).await
	}

	/// Shorthand for `send(ApiRequest::delete(path))`.
	pub async fn delete(&self, path: impl Into<String>) -> Result<Value> {
		self.send(ApiRequest::delete(path)).await
	}

	/// Runs the attempt loop: one initial call plus at most one refresh-triggered retry.
	async fn execute(&self, request: &ApiRequest) -> Result<HttpResponse> {
		const KIND: CallKind = CallKind::Request;

		let span = CallSpan::new(KIND, "execute");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut bearer = self.store.access_token().await?;
				let observed = self.refresh_gate.generation();
				let mut has_retried = false;

				loop {
					match self.attempt(request, bearer.as_ref()).await {
						Err(err) if err.is_unauthorized() && !has_retried => {
							has_retried = true;

							match self.recover_session(bearer.as_ref(), observed).await? {
								Some(fresh) => bearer = Some(fresh),
								None => return Err(err),
							}
						},
						result => return result,
					}
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Sends one attempt with the given bearer; non-2xx statuses become [`HttpError`].
	async fn attempt(
		&self,
		request: &ApiRequest,
		bearer: Option<&TokenSecret>,
	) -> Result<HttpResponse> {
		let outbound = self.build_request(request, bearer)?;
		let response = self.dispatch(outbound).await?;

		if response.is_success() {
			Ok(response)
		} else {
			Err(HttpError::from_body(response.status, &response.body).into())
		}
	}

	/// Resolves an [`ApiRequest`] into a transport request carrying `bearer`.
	///
	/// Header precedence, lowest first: defaults, caller headers, bearer, bypass header. Caller
	/// headers that no HTTP client could send are rejected here, before anything is dispatched.
	pub fn build_request(
		&self,
		request: &ApiRequest,
		bearer: Option<&TokenSecret>,
	) -> Result<HttpRequest> {
		let mut url = self.config.endpoint(&request.path)?;

		for (name, value) in request.headers.iter() {
			config::builder::validate_header(name, value).map_err(ConfigError::from)?;
		}
		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(request.query.iter());
		}

		let body = request
			.body
			.as_ref()
			.map(serde_json::to_vec)
			.transpose()
			.map_err(|source| Error::Encode { source })?;
		let mut outbound = HttpRequest {
			method: request.method,
			url,
			headers: self.config.default_headers.clone(),
			body,
			timeout: Some(self.config.request_timeout()),
		};

		outbound.headers.extend_from(&request.headers);

		if let Some(token) = bearer {
			outbound.headers.set("authorization", token.bearer());
		}

		self.config.apply_bypass_header(&mut outbound.headers);

		Ok(outbound)
	}

	/// Builds a credential-less JSON `POST` used by login and refresh.
	pub(crate) fn plain_post<B>(&self, path: &str, body: &B) -> Result<HttpRequest>
	where
		B: ?Sized + Serialize,
	{
		let url = self.config.endpoint(path)?;
		let body = serde_json::to_vec(body).map_err(|source| Error::Encode { source })?;

		Ok(HttpRequest {
			method: Method::Post,
			url,
			headers: self.config.base_headers(),
			body: Some(body),
			timeout: Some(self.config.request_timeout()),
		})
	}

	/// Hands a request to the transport and maps any transport failure.
	pub(crate) async fn dispatch(
		&self,
		request: HttpRequest,
	) -> Result<HttpResponse, TransportError> {
		self.http_client
			.execute(request)
			.await
			.map_err(|err| self.transport_mapper.map_transport_error(err))
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a gateway backed by its own reqwest client configured from `config`.
	pub fn new(store: Arc<dyn SessionStore>, config: GatewayConfig) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::from_config(&config)?;

		Ok(Self::with_http_client(
			store,
			config,
			http_client,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Clone for Gateway<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			observer: self.observer.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh_gate: self.refresh_gate.clone(),
		}
	}
}
impl<C, M> Debug for Gateway<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("base_url", &self.config.base_url.as_str())
			.field("timeout", &self.config.timeout)
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}

/// Decodes a 2xx body, treating an empty body as JSON `null`.
pub(crate) fn decode_json<T>(response: &HttpResponse) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
		b"null"
	} else {
		&response.body
	};
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| DecodeError { source, status: response.status })
}
