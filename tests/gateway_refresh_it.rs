mod common;

// crates.io
use pos_gateway::{
	api::ApiFailure,
	error::RefreshError,
	gateway::TerminationReason,
	http::HttpRequest,
	session::Theme,
	store::SessionStore,
};
use serde_json::json;
// self
use common::*;

const PRODUCTS: &str = "products/";
const REFRESH: &str = "auth/refresh/";

fn is_refresh(request: &HttpRequest) -> bool {
	request.url.path().ends_with("/auth/refresh/")
}

/// Products answer `401` to `stale` and `200` to anything else.
fn products_reject(request: &HttpRequest, stale: &str) -> Reply {
	if request.bearer() == Some(stale) {
		Reply::Json(401, json!({ "detail": "Given token not valid for any token type" }))
	} else {
		Reply::Json(200, json!({ "results": [{ "id": 1 }] }))
	}
}

#[tokio::test]
async fn expired_access_token_is_refreshed_and_retried_once() {
	let store = seeded_store(Some("access-1"), Some("refresh-1"));
	let (gateway, transport, terminations) = fake_gateway(
		store.clone(),
		FakeTransport::new(|request| {
			if is_refresh(request) {
				Reply::Json(200, json!({ "access": "access-2" }))
			} else {
				products_reject(request, "access-1")
			}
		}),
	);
	let body = gateway.get(PRODUCTS).await.expect("Request should succeed after refresh.");

	assert_eq!(body, json!({ "results": [{ "id": 1 }] }));

	let requests = transport.requests();

	assert_eq!(requests.len(), 3);
	assert_eq!(requests[0].bearer(), Some("access-1"));
	assert!(is_refresh(&requests[1]));
	assert_eq!(requests[2].bearer(), Some("access-2"));
	assert_eq!(requests[2].url, requests[0].url);

	for request in &requests {
		assert_eq!(request.headers.get("ngrok-skip-browser-warning"), Some("true"));
	}

	let refresh_call = &requests[1];

	assert!(!refresh_call.headers.contains("authorization"));
	assert_eq!(refresh_call.headers.get("ngrok-skip-browser-warning"), Some("true"));
	assert_eq!(body_json(refresh_call), json!({ "refresh": "refresh-1" }));
	assert_eq!(access(&store).as_deref(), Some("access-2"));
	assert_eq!(refresh(&store).as_deref(), Some("refresh-1"));
	assert!(terminations.seen().is_empty());
	assert_eq!(gateway.refresh_metrics.attempts(), 1);
	assert_eq!(gateway.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn later_calls_reuse_the_refreshed_token() {
	let store = seeded_store(Some("access-1"), Some("refresh-1"));
	let (gateway, transport, _) = fake_gateway(
		store.clone(),
		FakeTransport::new(|request| {
			if is_refresh(request) {
				Reply::Json(200, json!({ "access": "access-2" }))
			} else {
				products_reject(request, "access-1")
			}
		}),
	);

	gateway.get(PRODUCTS).await.expect("First call should recover through a refresh.");
	gateway.get("sales/").await.expect("Follow-up call should succeed directly.");

	let follow_up = transport.requests_to("sales/");

	assert_eq!(follow_up.len(), 1);
	assert_eq!(follow_up[0].bearer(), Some("access-2"));
	assert_eq!(follow_up[0].headers.get("ngrok-skip-browser-warning"), Some("true"));
	assert_eq!(transport.requests_to(REFRESH).len(), 1);
	assert_eq!(transport.requests().len(), 4);
	assert_eq!(gateway.refresh_metrics.attempts(), 1);
}

#[tokio::test]
async fn rotated_refresh_token_is_persisted() {
	let store = seeded_store(Some("access-1"), Some("refresh-1"));
	let (gateway, _, _) = fake_gateway(
		store.clone(),
		FakeTransport::new(|request| {
			if is_refresh(request) {
				Reply::Json(200, json!({ "access": "access-2", "refresh": "refresh-2" }))
			} else {
				products_reject(request, "access-1")
			}
		}),
	);

	gateway.get(PRODUCTS).await.expect("Request should succeed after rotation.");

	assert_eq!(access(&store).as_deref(), Some("access-2"));
	assert_eq!(refresh(&store).as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn second_401_is_returned_without_another_refresh() {
	let store = seeded_store(Some("access-1"), Some("refresh-1"));
	let (gateway, transport, terminations) = fake_gateway(
		store.clone(),
		FakeTransport::new(|request| {
			if is_refresh(request) {
				Reply::Json(200, json!({ "access": "access-2" }))
			} else {
				Reply::Json(401, json!({ "detail": "Not allowed for this role" }))
			}
		}),
	);
	let err = gateway.get(PRODUCTS).await.expect_err("Retried 401 should be returned.");

	assert!(err.is_unauthorized());
	assert_eq!(transport.requests_to(PRODUCTS).len(), 2);
	assert_eq!(transport.requests_to(REFRESH).len(), 1);
	assert_eq!(access(&store).as_deref(), Some("access-2"));
	assert!(terminations.seen().is_empty());
	assert_eq!(ApiFailure::from(&err).error, "Not allowed for this role");
}

#[tokio::test]
async fn rejected_refresh_clears_store_and_signals_once() {
	let store = seeded_store(Some("access-1"), Some("refresh-1"));

	store.set_theme(Theme::Dark).await.expect("Theme should persist.");

	let (gateway, transport, terminations) = fake_gateway(
		store.clone(),
		FakeTransport::new(|request| {
			if is_refresh(request) {
				Reply::Json(401, json!({ "detail": "Token is invalid or expired" }))
			} else {
				products_reject(request, "access-1")
			}
		}),
	);
	let err = gateway.get(PRODUCTS).await.expect_err("Failed refresh should fail the call.");

	assert!(matches!(err.refresh_failure(), Some(RefreshError::Rejected(_))));
	assert!(!err.is_unauthorized());
	assert_eq!(transport.requests_to(PRODUCTS).len(), 1);
	assert_eq!(transport.requests_to(REFRESH).len(), 1);
	assert!(store.snapshot().is_empty());
	assert_eq!(terminations.seen(), vec![TerminationReason::RefreshRejected { status: 401 }]);
	assert_eq!(gateway.refresh_metrics.failures(), 1);
	assert_eq!(
		ApiFailure::from(&err).error,
		"Your session has expired. Please sign in again."
	);
}

#[tokio::test]
async fn unreachable_refresh_endpoint_ends_the_session() {
	let store = seeded_store(Some("access-1"), Some("refresh-1"));
	let (gateway, _, terminations) = fake_gateway(
		store.clone(),
		FakeTransport::new(|request| {
			if is_refresh(request) { Reply::Timeout } else { products_reject(request, "access-1") }
		}),
	);
	let err = gateway.get(PRODUCTS).await.expect_err("Refresh timeout should fail the call.");

	assert!(matches!(err.refresh_failure(), Some(RefreshError::Transport(_))));
	assert!(err.is_timeout());
	assert!(store.snapshot().is_empty());
	assert_eq!(terminations.seen(), vec![TerminationReason::RefreshUnreachable]);
}

#[tokio::test]
async fn refresh_without_access_token_is_malformed() {
	for grant in [json!({ "access": "" }), json!({ "token": "access-2" })] {
		let store = seeded_store(Some("access-1"), Some("refresh-1"));
		let (gateway, transport, terminations) = fake_gateway(
			store.clone(),
			FakeTransport::new(move |request| {
				if is_refresh(request) {
					Reply::Json(200, grant.clone())
				} else {
					products_reject(request, "access-1")
				}
			}),
		);
		let err = gateway.get(PRODUCTS).await.expect_err("Malformed grant should fail.");

		assert!(matches!(err.refresh_failure(), Some(RefreshError::Malformed(_))));
		assert_eq!(transport.requests_to(PRODUCTS).len(), 1);
		assert!(store.snapshot().is_empty());
		assert_eq!(terminations.seen(), vec![TerminationReason::RefreshMalformed]);
	}
}

#[tokio::test]
async fn missing_refresh_token_ends_the_session_without_calling_refresh() {
	let store = seeded_store(Some("access-1"), None);
	let (gateway, transport, terminations) = fake_gateway(
		store.clone(),
		FakeTransport::new(|request| products_reject(request, "access-1")),
	);
	let err = gateway.get(PRODUCTS).await.expect_err("Unrecoverable 401 should fail.");

	assert!(err.is_unauthorized());
	assert!(transport.requests_to(REFRESH).is_empty());
	assert_eq!(transport.requests().len(), 1);
	assert!(store.snapshot().is_empty());
	assert_eq!(terminations.seen(), vec![TerminationReason::MissingRefreshToken]);
}

#[tokio::test]
async fn anonymous_401_with_refresh_token_still_refreshes() {
	let store = seeded_store(None, Some("refresh-1"));
	let (gateway, transport, terminations) = fake_gateway(
		store.clone(),
		FakeTransport::new(|request| {
			if is_refresh(request) {
				Reply::Json(200, json!({ "access": "access-2" }))
			} else if request.bearer().is_none() {
				Reply::Json(401, json!({ "detail": "Authentication credentials were not provided." }))
			} else {
				Reply::Json(200, json!({ "ok": true }))
			}
		}),
	);

	gateway.get("dashboard/").await.expect("Anonymous call should recover via refresh.");

	let requests = transport.requests();

	assert_eq!(requests.len(), 3);
	assert_eq!(requests[2].bearer(), Some("access-2"));
	assert!(terminations.seen().is_empty());
}

#[tokio::test]
async fn each_call_gets_its_own_retry_budget() {
	let store = seeded_store(Some("access-1"), Some("refresh-1"));
	let refreshes = Counter::default();
	let counter = refreshes.clone();
	let (gateway, transport, _) = fake_gateway(
		store.clone(),
		FakeTransport::new(move |request| {
			if is_refresh(request) {
				let n = counter.bump();

				Reply::Json(200, json!({ "access": format!("access-{}", n + 1) }))
			} else {
				// Only the latest issued token is accepted.
				let current = format!("access-{}", counter.get() + 1);

				if request.bearer() == Some(current.as_str()) {
					Reply::Json(200, json!({ "ok": true }))
				} else {
					Reply::Json(401, json!({}))
				}
			}
		}),
	);

	// The first call succeeds with the seeded token; revoke it between calls.
	gateway.get(PRODUCTS).await.expect("Fresh token should be accepted.");
	refreshes.bump();
	gateway.get(PRODUCTS).await.expect("Second call should refresh and retry.");

	assert_eq!(access(&store).as_deref(), Some("access-3"));
	assert_eq!(transport.requests_to(REFRESH).len(), 1);
	assert_eq!(transport.requests_to(PRODUCTS).len(), 3);
}
