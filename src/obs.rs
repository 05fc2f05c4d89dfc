//! Optional observability helpers for gateway calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `pos_gateway.call` with the `kind` and
//!   `stage` (call site) fields, plus `warn` events when a session is terminated or a store
//!   write is dropped.
//! - Enable `metrics` to increment the `pos_gateway_call_total` counter for every
//!   attempt/success/failure, labeled by `kind` + `outcome`, and
//!   `pos_gateway_session_terminated_total` labeled by `reason`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, gateway::TerminationReason, store::StoreError};

/// Call kinds observed by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Authenticated resource call.
	Request,
	/// Token refresh triggered by a `401`.
	Refresh,
	/// Credential exchange at login.
	Login,
	/// Local sign-out.
	Logout,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Request => "request",
			CallKind::Refresh => "refresh",
			CallKind::Login => "login",
			CallKind::Logout => "logout",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a gateway helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records a terminated session through every enabled backend.
pub fn record_session_terminated(reason: TerminationReason) {
	count_session_terminated(reason);
	warn_session_terminated(reason);
}

/// Records a store failure that could not be propagated to the caller.
pub fn record_store_failure(stage: &'static str, error: &StoreError) {
	warn_store_failure(stage, error);
}
