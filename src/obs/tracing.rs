// self
use crate::{_prelude::*, gateway::TerminationReason, obs::CallKind, store::StoreError};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span wrapping one gateway call; a zero-sized no-op without the `tracing` feature.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("pos_gateway.call", kind = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `warn` event for a terminated session (when enabled).
pub fn warn_session_terminated(reason: TerminationReason) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(reason = reason.as_str(), "session terminated; credentials cleared");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}

/// Emits a `warn` event for a store failure that was not propagated (when enabled).
pub fn warn_store_failure(stage: &'static str, error: &StoreError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(stage, error = %error, "session store operation failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, error);
	}
}
