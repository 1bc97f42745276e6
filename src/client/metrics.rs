// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`RefreshMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshSnapshot {
	/// Refresh calls issued.
	pub attempts: u64,
	/// Refresh calls that produced and stored a new credential.
	pub successes: u64,
	/// Refresh calls that ended the session.
	pub failures: u64,
	/// Callers that waited on someone else's refresh instead of issuing their own.
	pub queued: u64,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum RefreshEvent {
	Attempt,
	Success,
	Failure,
	Queued,
}

/// Always-on refresh counters shared by every clone of a client.
#[derive(Debug, Default)]
pub struct RefreshMetrics([AtomicU64; 4]);
impl RefreshMetrics {
	/// Reads all counters.
	pub fn snapshot(&self) -> RefreshSnapshot {
		let [attempts, successes, failures, queued] =
			self.0.each_ref().map(|counter| counter.load(Ordering::Relaxed));

		RefreshSnapshot { attempts, successes, failures, queued }
	}

	/// Refresh calls issued.
	pub fn attempts(&self) -> u64 {
		self.snapshot().attempts
	}

	/// Refresh calls that produced and stored a new credential.
	pub fn successes(&self) -> u64 {
		self.snapshot().successes
	}

	/// Refresh calls that ended the session.
	pub fn failures(&self) -> u64 {
		self.snapshot().failures
	}

	/// Callers that waited on someone else's refresh.
	pub fn queued(&self) -> u64 {
		self.snapshot().queued
	}

	pub(crate) fn record(&self, event: RefreshEvent) {
		self.0[event as usize].fetch_add(1, Ordering::Relaxed);
	}
}
