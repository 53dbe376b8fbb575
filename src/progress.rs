use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::consts::ERASE_TICK;
use crate::events::Broadcaster;
use crate::types::{ImagePayload, ProgressAxis, ProgressEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Idle,
	Uploading,
	Engraving,
	Erasing,
}

#[derive(Debug, Clone, Copy)]
pub struct RepeatingTick {
	delay: Duration,
	last: Instant,
}

impl RepeatingTick {
	pub fn new(delay: Duration, now: Instant) -> Self {
		Self { delay, last: now }
	}

	pub fn delay(&self) -> Duration {
		self.delay
	}

	/// Number of ticks that became due since the previous call.
	pub fn due(&mut self, now: Instant) -> u32 {
		if self.delay.is_zero() {
			return 0;
		}
		let elapsed = now.saturating_duration_since(self.last);
		let n = (elapsed.as_nanos() / self.delay.as_nanos()) as u32;
		self.last += self.delay * n;
		n
	}
}

pub struct ProgressTracker<C: Clock> {
	clock: C,
	phase: Phase,
	upload: ProgressAxis,
	engrave: ProgressAxis,
	erase: ProgressAxis,
	erase_tick: Option<RepeatingTick>,
	events: Broadcaster<ProgressEvent>,
}

impl<C: Clock> ProgressTracker<C> {
	pub fn new(clock: C) -> Self {
		Self {
			clock,
			phase: Phase::Idle,
			upload: ProgressAxis::default(),
			engrave: ProgressAxis::default(),
			erase: ProgressAxis::default(),
			erase_tick: None,
			events: Broadcaster::new(),
		}
	}

	pub fn subscribe(&mut self) -> Receiver<ProgressEvent> {
		self.events.subscribe()
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn upload(&self) -> ProgressAxis {
		self.upload
	}

	pub fn engrave(&self) -> ProgressAxis {
		self.engrave
	}

	pub fn erase(&self) -> ProgressAxis {
		self.erase
	}

	pub fn erase_running(&self) -> bool {
		self.erase_tick.is_some()
	}

	pub fn image_upload_started(&mut self, payload: &ImagePayload, total_bytes: u64) {
		self.phase = Phase::Uploading;
		self.upload = ProgressAxis {
			progress: 0,
			maximum: total_bytes,
		};
		self.set_upload_progress(0);

		let maximum = payload.expected_status_bytes();
		self.engrave = ProgressAxis {
			progress: self.engrave.progress.min(maximum),
			maximum,
		};
		info!(bytes = total_bytes, to_engrave = maximum, "image upload started");
	}

	pub fn bytes_written(&mut self, n: u64) {
		if self.phase != Phase::Uploading {
			return;
		}
		self.set_upload_progress(self.upload.progress.saturating_add(n));
		if self.upload.is_done() {
			info!("image upload completed");
			self.phase = Phase::Idle;
		}
	}

	pub fn upload_aborted(&mut self) {
		if self.phase == Phase::Uploading {
			warn!(sent = self.upload.progress, total = self.upload.maximum, "image upload aborted");
			self.phase = Phase::Idle;
		}
	}

	pub fn engraving_started(&mut self) {
		debug!("routing status bytes to engrave progress");
		self.phase = Phase::Engraving;
	}

	pub fn status_bytes_received(&mut self, bytes: &[u8]) {
		if self.phase != Phase::Engraving {
			return;
		}
		self.set_engrave_progress(self.engrave.progress.saturating_add(bytes.len() as u64));
		if self.engrave.is_done() {
			self.phase = Phase::Idle;
		}
	}

	/// Engrave progress is reset before the new erase maximum is set.
	pub fn erase_eeprom_started(&mut self, total_ms: u64) {
		self.engraving_resetted();

		self.erase = ProgressAxis {
			progress: 0,
			maximum: total_ms,
		};
		self.erase_tick = Some(RepeatingTick::new(ERASE_TICK, self.clock.now()));
		self.phase = Phase::Erasing;
		self.set_erase_progress(0);
	}

	pub fn engraving_resetted(&mut self) {
		self.set_engrave_progress(0);
		if self.phase == Phase::Engraving {
			self.phase = Phase::Idle;
		}
	}

	pub fn tick(&mut self) -> bool {
		let Some(timer) = self.erase_tick else {
			return false;
		};
		let candidate = self.erase.progress + timer.delay().as_millis() as u64;
		self.set_erase_progress(candidate);
		if candidate >= self.erase.maximum {
			self.erase_tick = None;
			if self.phase == Phase::Erasing {
				self.phase = Phase::Idle;
			}
			info!("erase completed");
			self.events.emit(ProgressEvent::EraseComplete);
			return false;
		}
		true
	}

	pub fn poll_timers(&mut self) {
		let now = self.clock.now();
		let due = match self.erase_tick.as_mut() {
			Some(timer) => timer.due(now),
			None => return,
		};
		for _ in 0..due {
			if !self.tick() {
				break;
			}
		}
	}

	fn set_upload_progress(&mut self, progress: u64) {
		if self.upload.update(progress) {
			self.events.emit(ProgressEvent::UploadProgress {
				progress: self.upload.progress,
				maximum: self.upload.maximum,
			});
		}
	}

	fn set_engrave_progress(&mut self, progress: u64) {
		if self.engrave.update(progress) {
			self.events.emit(ProgressEvent::EngraveProgress {
				progress: self.engrave.progress,
				maximum: self.engrave.maximum,
			});
		}
	}

	fn set_erase_progress(&mut self, progress: u64) {
		if self.erase.update(progress) {
			self.events.emit(ProgressEvent::EraseProgress {
				progress: self.erase.progress,
				maximum: self.erase.maximum,
			});
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::ManualClock;
	use crate::types::ProgressEvent::*;

	fn tracker() -> (ProgressTracker<ManualClock>, ManualClock) {
		let clock = ManualClock::new();
		(ProgressTracker::new(clock.clone()), clock)
	}

	// 4 black pixels -> 20 status bytes to engrave
	fn payload(len: usize) -> ImagePayload {
		ImagePayload::with_source(vec![0u8; len], &[0u8; 12])
	}

	#[test]
	fn upload_progress_is_clamped_and_routing_stops() {
		let (mut t, _) = tracker();
		let rx = t.subscribe();
		t.image_upload_started(&payload(10), 10);
		assert_eq!(t.phase(), Phase::Uploading);
		t.bytes_written(6);
		t.bytes_written(6);
		t.bytes_written(6);
		assert_eq!(t.upload(), ProgressAxis { progress: 10, maximum: 10 });
		assert_eq!(t.phase(), Phase::Idle);
		assert_eq!(
			rx.try_iter().collect::<Vec<_>>(),
			vec![
				UploadProgress { progress: 0, maximum: 10 },
				UploadProgress { progress: 6, maximum: 10 },
				UploadProgress { progress: 10, maximum: 10 },
			]
		);
	}

	#[test]
	fn aborted_upload_stops_counting_written_bytes() {
		let (mut t, _) = tracker();
		t.image_upload_started(&payload(20), 20);
		t.bytes_written(8);
		t.upload_aborted();
		assert_eq!(t.phase(), Phase::Idle);

		let rx = t.subscribe();
		t.bytes_written(5);
		assert_eq!(t.upload(), ProgressAxis { progress: 8, maximum: 20 });
		assert!(rx.try_iter().next().is_none());
	}

	#[test]
	fn upload_aborted_leaves_other_phases_alone() {
		let (mut t, _) = tracker();
		t.engraving_started();
		t.upload_aborted();
		assert_eq!(t.phase(), Phase::Engraving);
	}

	#[test]
	fn engrave_maximum_comes_from_black_pixels() {
		let (mut t, _) = tracker();
		t.image_upload_started(&payload(10), 10);
		assert_eq!(t.engrave().maximum, 20);
	}

	#[test]
	fn status_bytes_ignored_until_engraving_started() {
		let (mut t, _) = tracker();
		t.image_upload_started(&payload(4), 4);
		t.bytes_written(4);
		t.status_bytes_received(&[0xFF; 5]);
		assert_eq!(t.engrave().progress, 0);

		t.engraving_started();
		t.status_bytes_received(&[0xFF; 5]);
		assert_eq!(t.engrave().progress, 5);
		t.status_bytes_received(&[0u8; 40]);
		assert_eq!(t.engrave().progress, 20);
		assert_eq!(t.phase(), Phase::Idle);
	}

	#[test]
	fn reset_clears_engrave_and_stops_routing() {
		let (mut t, _) = tracker();
		t.image_upload_started(&payload(4), 4);
		t.engraving_started();
		t.status_bytes_received(&[1, 2, 3]);
		t.engraving_resetted();
		assert_eq!(t.engrave().progress, 0);

		t.status_bytes_received(&[1, 2, 3]);
		assert_eq!(t.engrave().progress, 0);

		t.engraving_started();
		t.status_bytes_received(&[1, 2, 3]);
		assert_eq!(t.engrave().progress, 3);
	}

	#[test]
	fn updates_without_maximum_emit_nothing() {
		let (mut t, _) = tracker();
		let rx = t.subscribe();
		t.engraving_started();
		t.status_bytes_received(&[1, 2, 3]);
		t.engraving_resetted();
		assert_eq!(t.engrave(), ProgressAxis::default());
		assert!(rx.try_iter().next().is_none());
	}

	#[test]
	fn erase_completes_after_exact_number_of_ticks() {
		let (mut t, _) = tracker();
		let rx = t.subscribe();
		t.erase_eeprom_started(2000);
		assert!(t.tick());
		assert!(t.tick());
		assert!(t.tick());
		assert_eq!(t.erase().progress, 1500);
		assert!(!rx.try_iter().any(|e| e == EraseComplete));

		assert!(!t.tick());
		assert_eq!(t.erase().progress, 2000);
		assert!(!t.erase_running());
		assert!(!t.tick());
		assert_eq!(rx.try_iter().filter(|e| *e == EraseComplete).count(), 1);
	}

	#[test]
	fn erase_resets_engrave_before_setting_its_maximum() {
		let (mut t, _) = tracker();
		t.image_upload_started(&payload(4), 4);
		t.engraving_started();
		t.status_bytes_received(&[1, 2, 3, 4]);
		let rx = t.subscribe();

		t.erase_eeprom_started(1000);
		assert_eq!(
			rx.try_iter().collect::<Vec<_>>(),
			vec![
				EngraveProgress { progress: 0, maximum: 20 },
				EraseProgress { progress: 0, maximum: 1000 },
			]
		);
		assert_eq!(t.phase(), Phase::Erasing);
	}

	#[test]
	fn poll_timers_follows_the_clock() {
		let (mut t, clock) = tracker();
		let rx = t.subscribe();
		t.erase_eeprom_started(2000);
		clock.advance(Duration::from_millis(499));
		t.poll_timers();
		assert_eq!(t.erase().progress, 0);

		clock.advance(Duration::from_millis(1001));
		t.poll_timers();
		assert_eq!(t.erase().progress, 1500);

		clock.advance(Duration::from_secs(10));
		t.poll_timers();
		assert_eq!(t.erase().progress, 2000);
		assert_eq!(rx.try_iter().filter(|e| *e == EraseComplete).count(), 1);
		assert_eq!(t.phase(), Phase::Idle);
	}
}
