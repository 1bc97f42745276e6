//! Single-flight refresh gate: the `Idle`/`Refreshing` phase, the FIFO waiter queue, and the
//! refresh epoch, all behind one lock.
//!
//! The lock is a plain `parking_lot` mutex and is never held across `.await`; every transition
//! (admit, settle, install) is one critical section, so concurrent 401 handlers cannot both
//! become the refresh leader.

// crates.io
use tokio::sync::oneshot;
// self
use crate::{_prelude::*, auth::Credential, error::SessionExpired, obs};

/// Result every waiter receives when a refresh settles.
pub(crate) type RefreshOutcome = Result<Credential, SessionExpired>;

enum Phase {
	Idle,
	Refreshing { waiters: Vec<oneshot::Sender<RefreshOutcome>> },
}

struct GateState {
	phase: Phase,
	epoch: u64,
	last: Option<RefreshOutcome>,
}

/// What a request that hit an eligible 401 has to do next.
pub(crate) enum Admission {
	/// Caller owns the refresh and must settle the lease.
	Lead(RefreshLease),
	/// A refresh is in flight; await its outcome.
	Wait(oneshot::Receiver<RefreshOutcome>),
	/// The credential changed after the request was sent; reuse that outcome.
	Settled(RefreshOutcome),
}

pub(crate) struct RefreshGate(Mutex<GateState>);
impl RefreshGate {
	pub(crate) fn new() -> Self {
		Self(Mutex::new(GateState { phase: Phase::Idle, epoch: 0, last: None }))
	}

	/// Epoch to remember before dispatching a request.
	pub(crate) fn epoch(&self) -> u64 {
		self.0.lock().epoch
	}

	pub(crate) fn is_refreshing(&self) -> bool {
		matches!(self.0.lock().phase, Phase::Refreshing { .. })
	}

	pub(crate) fn queued(&self) -> usize {
		match &self.0.lock().phase {
			Phase::Idle => 0,
			Phase::Refreshing { waiters } => waiters.len(),
		}
	}

	/// Decides how a request sent under `seen_epoch` recovers from an eligible 401.
	pub(crate) fn admit(self: &Arc<Self>, seen_epoch: u64) -> Admission {
		let mut state = self.0.lock();
		let epoch = state.epoch;

		if let Phase::Refreshing { waiters } = &mut state.phase {
			let (tx, rx) = oneshot::channel();

			waiters.push(tx);
			obs::record_transition("queued", epoch, waiters.len());
			obs::record_refresh_waiters(waiters.len());

			return Admission::Wait(rx);
		}
		if let Some(outcome) = state.last.clone().filter(|_| epoch != seen_epoch) {
			return Admission::Settled(outcome);
		}

		state.phase = Phase::Refreshing { waiters: Vec::new() };
		obs::record_transition("refreshing", epoch, 0);

		Admission::Lead(RefreshLease { gate: Arc::clone(self), settled: false })
	}

	/// Records a credential change made outside a refresh (login, logout).
	pub(crate) fn install(&self, outcome: Option<RefreshOutcome>) {
		let mut state = self.0.lock();

		state.epoch += 1;
		state.last = outcome;
	}

	fn settle(&self, outcome: RefreshOutcome, remember: bool) -> usize {
		let waiters = {
			let mut state = self.0.lock();
			let waiters = match std::mem::replace(&mut state.phase, Phase::Idle) {
				Phase::Refreshing { waiters } => waiters,
				Phase::Idle => Vec::new(),
			};

			state.epoch += 1;
			state.last = remember.then(|| outcome.clone());
			obs::record_transition("idle", state.epoch, waiters.len());
			obs::record_refresh_waiters(0);

			waiters
		};
		let count = waiters.len();

		for waiter in waiters {
			// A waiter whose caller was dropped simply misses the outcome.
			let _ = waiter.send(outcome.clone());
		}

		count
	}
}

/// Ownership of an in-flight refresh.
///
/// Dropping an unsettled lease (the leader's future was cancelled) rejects every waiter so none
/// of them hangs, and leaves no outcome behind so the next 401 starts a fresh refresh.
pub(crate) struct RefreshLease {
	gate: Arc<RefreshGate>,
	settled: bool,
}
impl RefreshLease {
	/// Publishes the outcome, returns the gate to `Idle`, and wakes waiters in FIFO order.
	pub(crate) fn settle(mut self, outcome: RefreshOutcome) -> usize {
		self.settled = true;

		self.gate.settle(outcome, true)
	}
}
impl Drop for RefreshLease {
	fn drop(&mut self) {
		if !self.settled {
			self.gate.settle(Err(SessionExpired::new("refresh was abandoned")), false);
		}
	}
}
