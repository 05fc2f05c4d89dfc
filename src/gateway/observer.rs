//! Session-terminated signal delivered to the hosting application.

// self
use crate::{_prelude::*, error::RefreshError};

/// Why the gateway tore down the local session.
///
/// Storage is cleared identically for every reason; the distinction lets hosts word the login
/// prompt differently for an unreachable backend and a revoked session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerminationReason {
	/// A `401` arrived while no refresh token was stored.
	MissingRefreshToken,
	/// The refresh endpoint rejected the refresh token.
	RefreshRejected {
		/// Status returned by the refresh endpoint.
		status: u16,
	},
	/// The refresh endpoint could not be reached.
	RefreshUnreachable,
	/// The refresh endpoint answered success without a usable access token.
	RefreshMalformed,
}
impl TerminationReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TerminationReason::MissingRefreshToken => "missing_refresh_token",
			TerminationReason::RefreshRejected { .. } => "refresh_rejected",
			TerminationReason::RefreshUnreachable => "refresh_unreachable",
			TerminationReason::RefreshMalformed => "refresh_malformed",
		}
	}
}
impl Display for TerminationReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl From<&RefreshError> for TerminationReason {
	fn from(err: &RefreshError) -> Self {
		match err {
			RefreshError::Rejected(e) => Self::RefreshRejected { status: e.status },
			RefreshError::Transport(_) => Self::RefreshUnreachable,
			RefreshError::Malformed(_) => Self::RefreshMalformed,
		}
	}
}

/// Receives the session-terminated signal, typically to navigate to the login screen.
///
/// Called after the store has been cleared and before the failing call returns. Closures of
/// type `Fn(TerminationReason)` implement this trait.
pub trait SessionObserver
where
	Self: Send + Sync,
{
	/// Invoked once per termination.
	fn session_terminated(&self, reason: TerminationReason);
}
impl<F> SessionObserver for F
where
	F: Fn(TerminationReason) + Send + Sync,
{
	fn session_terminated(&self, reason: TerminationReason) {
		self(reason)
	}
}
