// self
use crate::{_prelude::*, error::SessionExpired, obs::CallKind};

/// Future returned by [`CallSpan::instrument`]; the bare future when tracing is off.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`CallSpan::instrument`]; the bare future when tracing is off.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span attached to one client operation.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Opens an `admin_api_client.call` span for `kind` at call site `stage`.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("admin_api_client.call", call = kind.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Attaches the span to `fut` so no guard is held across `.await`.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event for a backend response.
pub fn record_response(route: &str, status: u16, with_credential: bool) {
	#[cfg(feature = "tracing")]
	tracing::debug!(route, status, with_credential, "backend responded");
	#[cfg(not(feature = "tracing"))]
	let _ = (route, status, with_credential);
}

/// Emits a debug event for a refresh gate transition.
pub fn record_transition(transition: &'static str, epoch: u64, queued: usize) {
	#[cfg(feature = "tracing")]
	tracing::debug!(transition, epoch, queued, "refresh gate transition");
	#[cfg(not(feature = "tracing"))]
	let _ = (transition, epoch, queued);
}

/// Emits a warning when local session state could not be purged after a failed refresh.
pub fn record_purge_failure(error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(%error, "failed to purge local session after refresh failure");
	#[cfg(not(feature = "tracing"))]
	let _ = error;
}
