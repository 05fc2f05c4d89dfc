//! Gateway-level error types shared across transports, stores, and the refresh path.

// self
use crate::{_prelude::*, config::GatewayConfigError};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// No response was received (timeout, DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Backend answered with a non-success status.
	#[error(transparent)]
	Http(#[from] HttpError),
	/// Token refresh failed; the local session has been cleared.
	///
	/// Shared, because every call that waited on the same refresh receives this failure.
	#[error("Token refresh failed and the session was cleared: {0}")]
	Refresh(#[source] Arc<RefreshError>),
	/// Backend answered with a success status but a body that could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized to JSON.")]
	Encode {
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
}
impl Error {
	/// Returns the HTTP status carried by the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Http(e) => Some(e.status),
			Self::Decode(e) => Some(e.status),
			Self::Refresh(e) => match &**e {
				RefreshError::Rejected(e) => Some(e.status),
				RefreshError::Malformed(e) => Some(e.status),
				RefreshError::Transport(_) => None,
			},
			_ => None,
		}
	}

	/// Returns the refresh failure behind this error, if the session ended on one.
	pub fn refresh_failure(&self) -> Option<&RefreshError> {
		match self {
			Self::Refresh(e) => Some(e.as_ref()),
			_ => None,
		}
	}

	/// Returns `true` for a `401 Unauthorized` answer to a resource call.
	///
	/// Refresh failures never count, even when the refresh endpoint itself answered `401`.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Http(e) if e.is_unauthorized())
	}

	/// Returns `true` when the request never produced a response because it timed out.
	pub fn is_timeout(&self) -> bool {
		let transport = match self {
			Self::Transport(e) => e,
			Self::Refresh(e) => match &**e {
				RefreshError::Transport(e) => e,
				_ => return false,
			},
			_ => return false,
		};

		matches!(transport, TransportError::Timeout { .. })
	}
}

/// Configuration and request-construction failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Gateway configuration failed validation.
	#[error(transparent)]
	Invalid(#[from] GatewayConfigError),
	/// Request path cannot be joined onto the base URL.
	#[error("Request path `{path}` cannot be joined onto the base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request path resolves outside the configured base URL.
	#[error("Request path `{path}` resolves outside the base URL.")]
	PathOutsideBase {
		/// Offending path.
		path: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures: no HTTP response was received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The configured request timeout elapsed.
	#[error("Request timed out before the backend responded.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}

/// Non-success HTTP answer, with the structured error payload when the body was JSON.
#[derive(Clone, Debug, ThisError)]
#[error("Backend responded with HTTP {status}.")]
pub struct HttpError {
	/// HTTP status code.
	pub status: u16,
	/// Parsed JSON body, if the backend sent one.
	pub payload: Option<Value>,
}
impl HttpError {
	/// Builds an error from a status code and raw response body.
	pub fn from_body(status: u16, body: &[u8]) -> Self {
		Self { status, payload: serde_json::from_slice(body).ok() }
	}

	/// Returns `true` for `401 Unauthorized`.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Returns the server-provided message from the `error` or `detail` field.
	pub fn message(&self) -> Option<&str> {
		let payload = self.payload.as_ref()?;

		["error", "detail"].into_iter().find_map(|key| payload.get(key)?.as_str())
	}
}

/// Success response whose JSON body did not match the expected shape.
#[derive(Debug, ThisError)]
#[error("Backend returned malformed JSON.")]
pub struct DecodeError {
	/// Structured parsing failure, including the JSON path.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
	/// HTTP status code of the response.
	pub status: u16,
}

/// Causes of a failed token refresh.
///
/// Every variant ends the session; the split only tells an unreachable refresh endpoint apart
/// from an authoritative rejection.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// Refresh endpoint answered with a non-success status.
	#[error(transparent)]
	Rejected(HttpError),
	/// Refresh endpoint could not be reached.
	#[error(transparent)]
	Transport(TransportError),
	/// Refresh endpoint answered success without a usable `access` token.
	#[error(transparent)]
	Malformed(DecodeError),
}
impl From<RefreshError> for Error {
	fn from(e: RefreshError) -> Self {
		Self::Refresh(Arc::new(e))
	}
}
