//! Shared fixtures for the integration tests: a scripted transport, an observer recorder, and
//! store seeding helpers.

#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use parking_lot::Mutex;
use pos_gateway::{
	config::GatewayConfig,
	error::TransportError,
	gateway::{Gateway, SessionObserver, TerminationReason},
	http::{HttpRequest, HttpResponse, HttpTransport, TransportErrorMapper, TransportFuture},
	session::TokenSecret,
	store::{MemoryStore, SessionSnapshot},
	url::Url,
};
use serde_json::Value;
use tokio::sync::Barrier;

/// Base URL used by every fake-transport gateway.
pub const BASE_URL: &str = "https://pos.example.com/api/";

/// Gateway wired to the scripted transport.
pub type FakeGateway = Gateway<FakeTransport, FakeMapper>;

/// Scripted answer for one request.
pub enum Reply {
	/// Status plus JSON body.
	Json(u16, Value),
	/// Status plus raw bytes.
	Bytes(u16, Vec<u8>),
	/// No response; the transport reports a timeout.
	Timeout,
	/// Waits on the barrier before answering, so concurrent callers see their replies together.
	Gated(Arc<Barrier>, u16, Value),
}

type Responder = dyn Fn(&HttpRequest) -> Reply + Send + Sync;

/// Transport that answers from a closure and records every request it sees.
pub struct FakeTransport {
	responder: Box<Responder>,
	requests: Mutex<Vec<HttpRequest>>,
}
impl FakeTransport {
	pub fn new<F>(responder: F) -> Self
	where
		F: 'static + Fn(&HttpRequest) -> Reply + Send + Sync,
	{
		Self { responder: Box::new(responder), requests: Mutex::new(Vec::new()) }
	}

	/// Every request seen so far, in dispatch order.
	pub fn requests(&self) -> Vec<HttpRequest> {
		self.requests.lock().clone()
	}

	/// Requests sent to `path` (relative to [`BASE_URL`]).
	pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
		let url = format!("{BASE_URL}{path}");

		self.requests
			.lock()
			.iter()
			.filter(|request| request.url.as_str().split('?').next() == Some(url.as_str()))
			.cloned()
			.collect()
	}
}
impl HttpTransport for FakeTransport {
	type TransportError = FakeTransportError;

	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		let reply = (self.responder)(&request);

		self.requests.lock().push(request);

		Box::pin(async move {
			match reply {
				Reply::Json(status, body) => Ok(HttpResponse::new(status, json_bytes(&body))),
				Reply::Bytes(status, body) => Ok(HttpResponse::new(status, body)),
				Reply::Timeout => Err(FakeTransportError::TimedOut),
				Reply::Gated(barrier, status, body) => {
					barrier.wait().await;

					Ok(HttpResponse::new(status, json_bytes(&body)))
				},
			}
		})
	}
}

#[derive(Debug, thiserror::Error)]
pub enum FakeTransportError {
	#[error("Scripted timeout.")]
	TimedOut,
}

/// Maps scripted failures onto gateway transport errors.
pub struct FakeMapper;
impl TransportErrorMapper<FakeTransportError> for FakeMapper {
	fn map_transport_error(&self, error: FakeTransportError) -> TransportError {
		match error {
			FakeTransportError::TimedOut => TransportError::timeout(error),
		}
	}
}

/// Counts calls made through a responder closure.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);
impl Counter {
	pub fn bump(&self) -> usize {
		self.0.fetch_add(1, Ordering::SeqCst) + 1
	}

	pub fn get(&self) -> usize {
		self.0.load(Ordering::SeqCst)
	}
}

/// Collects session-terminated signals.
#[derive(Clone, Default)]
pub struct Terminations(Arc<Mutex<Vec<TerminationReason>>>);
impl Terminations {
	pub fn observer(&self) -> Arc<dyn SessionObserver> {
		let sink = self.0.clone();

		Arc::new(move |reason: TerminationReason| sink.lock().push(reason))
	}

	pub fn seen(&self) -> Vec<TerminationReason> {
		self.0.lock().clone()
	}
}

pub fn config(base_url: &str) -> GatewayConfig {
	GatewayConfig::builder()
		.base_url(Url::parse(base_url).expect("Base URL fixture should parse."))
		.build()
		.expect("Gateway config fixture should build.")
}

/// Builds a memory store holding the given tokens.
pub fn seeded_store(access: Option<&str>, refresh: Option<&str>) -> MemoryStore {
	MemoryStore::with_snapshot(SessionSnapshot {
		access_token: access.map(TokenSecret::new),
		refresh_token: refresh.map(TokenSecret::new),
		..Default::default()
	})
}

/// Builds a gateway over `transport`, returning handles for assertions.
pub fn fake_gateway(
	store: MemoryStore,
	transport: FakeTransport,
) -> (FakeGateway, Arc<FakeTransport>, Terminations) {
	let transport = Arc::new(transport);
	let terminations = Terminations::default();
	let gateway: FakeGateway =
		Gateway::with_http_client(Arc::new(store), config(BASE_URL), transport.clone(), FakeMapper);
	let gateway = gateway.with_observer(terminations.observer());

	(gateway, transport, terminations)
}

pub fn body_json(request: &HttpRequest) -> Value {
	let body = request.body.as_deref().expect("Request should carry a body.");

	serde_json::from_slice(body).expect("Request body should be JSON.")
}

pub fn access(store: &MemoryStore) -> Option<String> {
	store.snapshot().access_token.map(|token| token.expose().to_owned())
}

pub fn refresh(store: &MemoryStore) -> Option<String> {
	store.snapshot().refresh_token.map(|token| token.expose().to_owned())
}

fn json_bytes(body: &Value) -> Vec<u8> {
	serde_json::to_vec(body).expect("Scripted body should serialize.")
}

#[cfg(feature = "reqwest")]
pub mod live {
	//! Helpers for tests that run against an `httpmock` server.

	// crates.io
	use httpmock::MockServer;
	use pos_gateway::{
		gateway::ReqwestGateway,
		http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
		reqwest::Client,
	};
	// self
	use super::*;

	/// Reqwest client that trusts the mock server's self-signed certificate.
	pub fn mock_server_client() -> ReqwestHttpClient {
		let client = Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Mock server client should build.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a reqwest-backed gateway pointed at `server`'s `/api/` prefix.
	pub fn gateway(server: &MockServer, store: MemoryStore) -> (ReqwestGateway, Terminations) {
		let terminations = Terminations::default();
		let gateway: ReqwestGateway = Gateway::with_http_client(
			Arc::new(store),
			config(&server.url("/api/")),
			mock_server_client(),
			ReqwestTransportErrorMapper,
		);
		let gateway = gateway.with_observer(terminations.observer());

		(gateway, terminations)
	}
}
