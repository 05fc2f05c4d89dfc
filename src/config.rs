//! Process-wide gateway configuration: base endpoint, timeout, and fixed headers.
//!
//! A [`GatewayConfig`] is built once at startup, either through [`GatewayConfig::builder`] or
//! from the environment via [`GatewayConfig::from_env`], and is immutable afterwards. Every
//! outbound call (resource calls, login, and token refresh) derives its URL, timeout, and
//! default headers from it.

/// Fluent builder for [`GatewayConfig`].
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError, http::Headers};

/// Local development endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/";
/// Timeout applied to every request unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(10);
/// Header name the tunnel in front of the backend checks before serving its interstitial page.
pub const DEFAULT_BYPASS_HEADER_NAME: &str = "ngrok-skip-browser-warning";
/// Value paired with [`DEFAULT_BYPASS_HEADER_NAME`].
pub const DEFAULT_BYPASS_HEADER_VALUE: &str = "true";
/// Login endpoint, relative to the base URL.
pub const DEFAULT_LOGIN_PATH: &str = "auth/login/";
/// Token refresh endpoint, relative to the base URL.
pub const DEFAULT_REFRESH_PATH: &str = "auth/refresh/";
/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "POS_GATEWAY_BASE_URL";
/// Environment variable overriding the timeout, in whole seconds.
pub const TIMEOUT_ENV: &str = "POS_GATEWAY_TIMEOUT_SECS";

/// Static header attached to every outbound call so intermediary infrastructure lets it through.
///
/// This is not a credential and is never rotated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BypassHeader {
	/// Lowercase header name.
	pub name: String,
	/// Header value.
	pub value: String,
}
impl Default for BypassHeader {
	fn default() -> Self {
		Self { name: DEFAULT_BYPASS_HEADER_NAME.into(), value: DEFAULT_BYPASS_HEADER_VALUE.into() }
	}
}

/// Validated, immutable gateway configuration.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
	/// Base URL; always ends with `/` so relative paths extend it.
	pub base_url: Url,
	/// Timeout applied to every request, including refresh and login.
	pub timeout: Duration,
	/// Headers sent with every request (content negotiation).
	pub default_headers: Headers,
	/// Bypass header re-applied after all other headers.
	pub bypass_header: BypassHeader,
	/// Login endpoint path relative to [`GatewayConfig::base_url`].
	pub login_path: String,
	/// Refresh endpoint path relative to [`GatewayConfig::base_url`].
	pub refresh_path: String,
}
impl GatewayConfig {
	/// Returns a builder seeded with the development defaults.
	pub fn builder() -> GatewayConfigBuilder {
		GatewayConfigBuilder::new()
	}

	/// Builds a configuration from `POS_GATEWAY_*` environment variables, falling back to the
	/// defaults for anything unset.
	pub fn from_env() -> Result<Self, GatewayConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds a configuration from an arbitrary key lookup (environment, dotenv map, etc.).
	pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut builder = Self::builder();

		if let Some(raw) = lookup(BASE_URL_ENV).filter(|raw| !raw.trim().is_empty()) {
			let url = Url::parse(raw.trim())
				.map_err(|source| GatewayConfigError::InvalidBaseUrl { source })?;

			builder = builder.base_url(url);
		}
		if let Some(raw) = lookup(TIMEOUT_ENV).filter(|raw| !raw.trim().is_empty()) {
			let secs = raw
				.trim()
				.parse::<u32>()
				.map_err(|_| GatewayConfigError::InvalidTimeoutValue { value: raw.clone() })?;

			builder = builder.timeout(Duration::seconds(i64::from(secs)));
		}

		builder.build()
	}

	/// Resolves `path` against the base URL.
	///
	/// Leading slashes are ignored so `"/products/"` and `"products/"` are equivalent; paths
	/// that would escape the base URL are rejected.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let relative = path.trim_start_matches('/');
		let url = self
			.base_url
			.join(relative)
			.map_err(|source| ConfigError::InvalidPath { path: path.into(), source })?;

		if !url.as_str().starts_with(self.base_url.as_str()) {
			return Err(ConfigError::PathOutsideBase { path: path.into() });
		}

		Ok(url)
	}

	/// Timeout converted for HTTP clients that use [`std::time::Duration`].
	pub fn request_timeout(&self) -> std::time::Duration {
		self.timeout.unsigned_abs()
	}

	/// Default headers followed by the bypass header.
	pub fn base_headers(&self) -> Headers {
		let mut headers = self.default_headers.clone();

		self.apply_bypass_header(&mut headers);

		headers
	}

	/// Writes the bypass header into `headers`, replacing any value already present.
	pub fn apply_bypass_header(&self, headers: &mut Headers) {
		headers.set(&self.bypass_header.name, self.bypass_header.value.clone());
	}
}
