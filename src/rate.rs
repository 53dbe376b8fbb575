use std::collections::VecDeque;
use std::time::Instant;

use crossbeam_channel::Receiver;
use tracing::trace;

use crate::clock::Clock;
use crate::consts::{RATE_INTERVAL, RATE_WEIGHTS};
use crate::events::Broadcaster;
use crate::types::RateEvent;

const HISTORY_LEN: usize = RATE_WEIGHTS.len();

pub struct RateTracker<C: Clock> {
	clock: C,
	interval_start: Option<Instant>,
	current: u64,
	history: VecDeque<u64>,
	rate: f64,
	events: Broadcaster<RateEvent>,
}

impl<C: Clock> RateTracker<C> {
	pub fn new(clock: C) -> Self {
		Self {
			clock,
			interval_start: None,
			current: 0,
			history: VecDeque::with_capacity(HISTORY_LEN + 1),
			rate: 0.0,
			events: Broadcaster::new(),
		}
	}

	pub fn subscribe(&mut self) -> Receiver<RateEvent> {
		self.events.subscribe()
	}

	pub fn bytes_received(&mut self, count: u64) {
		let now = self.clock.now();
		let Some(start) = self.interval_start else {
			self.interval_start = Some(now);
			self.current += count;
			return;
		};

		if now.saturating_duration_since(start) <= RATE_INTERVAL {
			self.current += count;
			return;
		}

		self.history.push_back(self.current);
		if self.history.len() > HISTORY_LEN {
			self.history.pop_front();
		}
		self.interval_start = Some(now);
		self.current = count;
		self.recompute();
	}

	pub fn rate(&self) -> f64 {
		self.rate
	}

	pub fn history(&self) -> impl Iterator<Item = u64> + '_ {
		self.history.iter().copied()
	}

	fn recompute(&mut self) {
		let rate = if self.history.len() < HISTORY_LEN {
			0.0
		} else {
			let weighted: u64 = self
				.history
				.iter()
				.zip(RATE_WEIGHTS)
				.map(|(h, w)| h * w)
				.sum();
			let total: u64 = RATE_WEIGHTS.iter().sum();
			weighted as f64 / total as f64
		};
		trace!(rate, history = ?self.history, "rate recomputed");
		if rate != self.rate {
			self.rate = rate;
			self.events.emit(RateEvent::Changed(rate));
		}
	}
}
