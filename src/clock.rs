use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub trait Clock {
	fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
	fn now(&self) -> Instant {
		Instant::now()
	}
}

#[derive(Debug, Clone)]
pub struct ManualClock {
	origin: Instant,
	offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
	fn default() -> Self {
		Self::new()
	}
}

impl ManualClock {
	pub fn new() -> Self {
		Self {
			origin: Instant::now(),
			offset: Arc::new(Mutex::new(Duration::ZERO)),
		}
	}

	pub fn advance(&self, d: Duration) {
		if let Ok(mut off) = self.offset.lock() {
			*off = off.saturating_add(d);
		}
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Instant {
		let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
		self.origin + off
	}
}
