//! Walks an admin session against a mocked backend: login, a call that hits an expired access
//! token and recovers through one refresh, then logout.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use pos_gateway::{
	api::{Resource, normalize},
	config::GatewayConfig,
	gateway::{Gateway, ReqwestGateway, TerminationReason},
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
	reqwest::Client,
	store::{MemoryStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login/");
			then.status(200).header("content-type", "application/json").body(
				r#"{"access":"demo-access-1","refresh":"demo-refresh","user":{"id":1,"username":"admin","role":{"name":"admin"}}}"#,
			);
		})
		.await;
	let expired_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/dashboard/")
				.header("authorization", "Bearer demo-access-1");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"detail":"Given token not valid for any token type"}"#);
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access":"demo-access-2"}"#);
		})
		.await;
	let dashboard_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/dashboard/")
				.header("authorization", "Bearer demo-access-2");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"sales_today":"1520.00","low_stock":3}"#);
		})
		.await;
	let store = Arc::new(MemoryStore::default());
	let config = GatewayConfig::builder().base_url(Url::parse(&server.url("/api/"))?).build()?;
	// The mock server speaks https with a self-signed certificate.
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()?;
	let gateway: ReqwestGateway = Gateway::with_http_client(
		store.clone(),
		config,
		ReqwestHttpClient::with_client(client),
		ReqwestTransportErrorMapper,
	);
	let gateway = gateway.with_observer(Arc::new(|reason: TerminationReason| {
		println!("Session ended ({reason}); showing the login page.")
	}));
	let user = gateway.login("admin", "admin").await?;

	println!("Signed in as {} ({:?}).", user.display_name(), user.role_name());

	let filters: [(&str, &str); 0] = [];
	let dashboard = normalize(gateway.resource(Resource::Dashboard).list(filters).await)?;

	println!("Dashboard: {dashboard}");
	println!(
		"Refreshes: attempts={} coalesced={}",
		gateway.refresh_metrics.attempts(),
		gateway.refresh_metrics.coalesced()
	);

	gateway.logout().await?;

	println!("Signed out; store empty: {}.", store.load().await?.is_empty());

	login_mock.assert_async().await;
	expired_mock.assert_async().await;
	refresh_mock.assert_async().await;
	dashboard_mock.assert_async().await;

	Ok(())
}
