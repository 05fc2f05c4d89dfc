//! Single-flight token refresh triggered by `401` answers.
//!
//! Every `401` handler funnels through [`Gateway::recover_session`], which holds the
//! gateway-wide `RefreshGate` while it decides what to do. Each finished refresh round bumps a
//! generation counter and records its outcome. A caller whose request started before the
//! current generation adopts that outcome: it retries with the refreshed token, returns the same
//! refresh failure, or returns its own `401` when the session already ended. Only a caller that
//! finds no newer round talks to the refresh endpoint, so N concurrent `401`s for the same stale
//! token produce one refresh call and at most one session-terminated signal.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	error::{HttpError, RefreshError},
	gateway::{Gateway, TerminationReason, decode_json},
	http::{HttpRequest, HttpTransport, TransportErrorMapper},
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::TokenSecret,
};

#[derive(Serialize)]
struct RefreshRequest<'a> {
	refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshGrant {
	#[serde(deserialize_with = "non_empty")]
	access: String,
	#[serde(default)]
	refresh: Option<String>,
}

/// Refresh guard shared by every clone of a gateway.
pub(crate) struct RefreshGate {
	generation: AtomicU64,
	round: AsyncMutex<RefreshRound>,
}
impl RefreshGate {
	pub(crate) fn new() -> Self {
		Self {
			generation: AtomicU64::new(0),
			round: AsyncMutex::new(RefreshRound { generation: 0, outcome: None }),
		}
	}

	/// Number of finished refresh rounds; read before a request picks its bearer.
	pub(crate) fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}
}

struct RefreshRound {
	generation: u64,
	outcome: Option<RoundOutcome>,
}
impl RefreshRound {
	fn finish(&mut self, gate: &RefreshGate, outcome: RoundOutcome) {
		self.generation += 1;
		self.outcome = Some(outcome);

		gate.generation.store(self.generation, Ordering::Release);
	}
}

enum RoundOutcome {
	Refreshed,
	Terminated,
	Failed(Arc<RefreshError>),
}

impl<C, M> Gateway<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Recovers from a `401` that was answered to a request carrying `stale`.
	///
	/// `observed` is the gate generation read when the request picked its bearer. Returns
	/// `Ok(Some(token))` when the caller should retry with `token`, `Ok(None)` when the session is
	/// gone and the caller should surface its original `401`, and `Err` when the refresh call
	/// failed, whether this caller or a peer made it.
	pub(crate) async fn recover_session(
		&self,
		stale: Option<&TokenSecret>,
		observed: u64,
	) -> Result<Option<TokenSecret>> {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "recover_session");

		span.instrument(async move {
			let mut round = self.refresh_gate.round.lock().await;

			if round.generation != observed {
				match &round.outcome {
					Some(RoundOutcome::Failed(err)) => {
						self.refresh_metrics.record_coalesced();

						return Err(Error::Refresh(err.clone()));
					},
					Some(RoundOutcome::Terminated) => {
						self.refresh_metrics.record_coalesced();

						return Ok(None);
					},
					Some(RoundOutcome::Refreshed) | None => (),
				}
			}

			match self.store.access_token().await? {
				Some(current) if stale != Some(&current) => {
					self.refresh_metrics.record_coalesced();

					return Ok(Some(current));
				},
				// Signed out while the request was in flight.
				None if stale.is_some() => return Ok(None),
				_ => (),
			}

			let Some(refresh_token) = self.store.refresh_token().await? else {
				self.terminate_session(TerminationReason::MissingRefreshToken).await;
				round.finish(&self.refresh_gate, RoundOutcome::Terminated);

				return Ok(None);
			};
			let body = RefreshRequest { refresh: refresh_token.expose() };
			let request = self.plain_post(&self.config.refresh_path, &body)?;

			obs::record_call_outcome(KIND, CallOutcome::Attempt);
			self.refresh_metrics.record_attempt();

			let grant = match self.request_refresh(request).await {
				Ok(grant) => grant,
				Err(err) => {
					obs::record_call_outcome(KIND, CallOutcome::Failure);
					self.refresh_metrics.record_failure();
					self.terminate_session(TerminationReason::from(&err)).await;

					let err = Arc::new(err);

					round.finish(&self.refresh_gate, RoundOutcome::Failed(err.clone()));

					return Err(Error::Refresh(err));
				},
			};
			let access = TokenSecret::new(grant.access);

			self.store.set_access_token(access.clone()).await?;

			if let Some(rotated) = grant.refresh {
				self.store.set_refresh_token(TokenSecret::new(rotated)).await?;
			}

			round.finish(&self.refresh_gate, RoundOutcome::Refreshed);
			obs::record_call_outcome(KIND, CallOutcome::Success);
			self.refresh_metrics.record_success();

			Ok(Some(access))
		})
		.await
	}

	async fn request_refresh(&self, request: HttpRequest) -> Result<RefreshGrant, RefreshError> {
		let response = self.dispatch(request).await.map_err(RefreshError::Transport)?;

		if !response.is_success() {
			return Err(RefreshError::Rejected(HttpError::from_body(
				response.status,
				&response.body,
			)));
		}

		decode_json(&response).map_err(RefreshError::Malformed)
	}

	/// Clears the store and emits the session-terminated signal.
	pub(crate) async fn terminate_session(&self, reason: TerminationReason) {
		if let Err(err) = self.store.clear().await {
			obs::record_store_failure("terminate_session", &err);
		}

		obs::record_session_terminated(reason);
		self.observer.session_terminated(reason);
	}
}

fn non_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let value = String::deserialize(deserializer)?;

	if value.trim().is_empty() {
		Err(serde::de::Error::custom("access token must not be empty"))
	} else {
		Ok(value)
	}
}
