// self
use crate::{
	_prelude::*,
	config::{
		BypassHeader, DEFAULT_BASE_URL, DEFAULT_LOGIN_PATH, DEFAULT_REFRESH_PATH,
		DEFAULT_TIMEOUT, GatewayConfig,
	},
	http::Headers,
};

const HEADER_NAME_SYMBOLS: &[u8] = b"!#$%&'*+-.^_`|~";

/// Errors raised while constructing or validating a [`GatewayConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum GatewayConfigError {
	/// Base URL string could not be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL must be an `http` or `https` URL.
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// URL that failed validation.
		url: String,
	},
	/// Timeout must be strictly positive.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
	/// Timeout override could not be parsed as whole seconds.
	#[error("Request timeout `{value}` is not a whole number of seconds.")]
	InvalidTimeoutValue {
		/// Raw value that failed parsing.
		value: String,
	},
	/// Header name is empty or contains characters outside the HTTP token set.
	#[error("Header name `{name}` is invalid.")]
	InvalidHeaderName {
		/// Offending header name.
		name: String,
	},
	/// Header value contains control characters.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeaderValue {
		/// Header whose value failed validation.
		name: String,
	},
	/// Endpoint path is blank.
	#[error("The {endpoint} path must not be empty.")]
	EmptyPath {
		/// Which endpoint failed validation.
		endpoint: &'static str,
	},
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	/// Base URL; the development default is used when unset.
	pub base_url: Option<Url>,
	/// Timeout applied to every request.
	pub timeout: Duration,
	/// Headers sent with every request.
	pub default_headers: Headers,
	/// Bypass header re-applied last on every request.
	pub bypass_header: BypassHeader,
	/// Login endpoint path.
	pub login_path: String,
	/// Refresh endpoint path.
	pub refresh_path: String,
}
impl GatewayConfigBuilder {
	/// Creates a builder seeded with JSON content negotiation and the default endpoints.
	pub fn new() -> Self {
		let mut default_headers = Headers::new();

		default_headers.set("content-type", "application/json");
		default_headers.set("accept", "application/json");

		Self {
			base_url: None,
			timeout: DEFAULT_TIMEOUT,
			default_headers,
			bypass_header: BypassHeader::default(),
			login_path: DEFAULT_LOGIN_PATH.into(),
			refresh_path: DEFAULT_REFRESH_PATH.into(),
		}
	}

	/// Sets the base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Sets the request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Adds or replaces a default header.
	pub fn default_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.default_headers.set(name, value);

		self
	}

	/// Overrides the bypass header pair.
	pub fn bypass_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.bypass_header =
			BypassHeader { name: name.as_ref().to_ascii_lowercase(), value: value.into() };

		self
	}

	/// Overrides the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GatewayConfig, GatewayConfigError> {
		let base_url = match self.base_url {
			Some(url) => url,
			None => Url::parse(DEFAULT_BASE_URL)
				.map_err(|source| GatewayConfigError::InvalidBaseUrl { source })?,
		};
		let config = GatewayConfig {
			base_url: normalize_base_url(base_url)?,
			timeout: self.timeout,
			default_headers: self.default_headers,
			bypass_header: self.bypass_header,
			login_path: self.login_path,
			refresh_path: self.refresh_path,
		};

		config.validate()?;

		Ok(config)
	}
}
impl Default for GatewayConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl GatewayConfig {
	fn validate(&self) -> Result<(), GatewayConfigError> {
		if !self.timeout.is_positive() {
			return Err(GatewayConfigError::NonPositiveTimeout);
		}

		for (name, value) in self.default_headers.iter() {
			validate_header(name, value)?;
		}

		validate_header(&self.bypass_header.name, &self.bypass_header.value)?;
		validate_path("login", &self.login_path)?;
		validate_path("refresh", &self.refresh_path)?;

		Ok(())
	}
}

fn normalize_base_url(mut url: Url) -> Result<Url, GatewayConfigError> {
	if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
		return Err(GatewayConfigError::UnsupportedScheme { url: url.to_string() });
	}

	url.set_query(None);
	url.set_fragment(None);

	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	Ok(url)
}

/// Checks that a header would be accepted by any HTTP client before it reaches one.
pub(crate) fn validate_header(name: &str, value: &str) -> Result<(), GatewayConfigError> {
	let valid_name = !name.is_empty()
		&& name.bytes().all(|b| b.is_ascii_alphanumeric() || HEADER_NAME_SYMBOLS.contains(&b));

	if !valid_name {
		return Err(GatewayConfigError::InvalidHeaderName { name: name.into() });
	}
	if value.chars().any(|c| c.is_control() && c != '\t') {
		return Err(GatewayConfigError::InvalidHeaderValue { name: name.into() });
	}

	Ok(())
}

fn validate_path(endpoint: &'static str, path: &str) -> Result<(), GatewayConfigError> {
	if path.trim_matches(|c: char| c == '/' || c.is_whitespace()).is_empty() {
		Err(GatewayConfigError::EmptyPath { endpoint })
	} else {
		Ok(())
	}
}
