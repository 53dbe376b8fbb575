use std::time::Duration;

use crossbeam_channel::Receiver;
use tracing::{debug, info};

use crate::clock::{Clock, MonotonicClock};
use crate::consts::ERASE_TIME_MS;
use crate::error::Result;
use crate::events::Broadcaster;
use crate::progress::ProgressTracker;
use crate::protocol::chunked::transmit_chunked;
use crate::protocol::commands::{self, Opcode};
use crate::protocol::decoder::StatusDecoder;
use crate::rate::RateTracker;
use crate::transport::{SerialTransport, Transport};
use crate::types::{ImagePayload, ProgressEvent, RateEvent, StatusEvent};

pub struct Engraver<T: Transport, C: Clock = MonotonicClock> {
	transport: T,
	decoder: StatusDecoder,
	progress: ProgressTracker<C>,
	rate: RateTracker<C>,
	status: Broadcaster<StatusEvent>,
}

impl Engraver<SerialTransport> {
	pub fn create(port: &str) -> Result<Self> {
		info!(port, "connecting to engraver");
		let transport = SerialTransport::open(port)?;
		Ok(Self::new(transport, MonotonicClock))
	}
}

impl<T: Transport, C: Clock + Clone> Engraver<T, C> {
	pub fn new(transport: T, clock: C) -> Self {
		Self {
			transport,
			decoder: StatusDecoder::new(),
			progress: ProgressTracker::new(clock.clone()),
			rate: RateTracker::new(clock),
			status: Broadcaster::new(),
		}
	}
}

impl<T: Transport, C: Clock> Engraver<T, C> {
	pub fn transport(&self) -> &T {
		&self.transport
	}

	pub fn transport_mut(&mut self) -> &mut T {
		&mut self.transport
	}

	pub fn progress(&self) -> &ProgressTracker<C> {
		&self.progress
	}

	pub fn rate(&self) -> f64 {
		self.rate.rate()
	}

	pub fn subscribe_progress(&mut self) -> Receiver<ProgressEvent> {
		self.progress.subscribe()
	}

	pub fn subscribe_rate(&mut self) -> Receiver<RateEvent> {
		self.rate.subscribe()
	}

	pub fn subscribe_status(&mut self) -> Receiver<StatusEvent> {
		self.status.subscribe()
	}

	pub fn start(&mut self, burn_time: u8) -> Result<()> {
		self.set_burn_time(burn_time)?;
		info!(burn_time, "starting engrave process");
		self.send(Opcode::Start)?;
		self.progress.engraving_started();
		Ok(())
	}

	pub fn set_burn_time(&mut self, value: u8) -> Result<()> {
		debug!(value, "setting burn time");
		let n = commands::set_burn_time(&mut self.transport, value)?;
		self.bytes_written(n as u64);
		Ok(())
	}

	pub fn pause(&mut self) -> Result<()> {
		info!("pausing engrave process");
		self.send(Opcode::Pause)
	}

	pub fn reset(&mut self) -> Result<()> {
		info!("resetting");
		self.send(Opcode::Reset)?;
		self.progress.engraving_resetted();
		Ok(())
	}

	pub fn home(&mut self) -> Result<()> {
		debug!("moving to home");
		self.send(Opcode::Home)
	}

	pub fn center(&mut self) -> Result<()> {
		debug!("moving to center");
		self.send(Opcode::Center)
	}

	pub fn preview(&mut self) -> Result<()> {
		debug!("drawing image preview");
		self.send(Opcode::Preview)
	}

	pub fn up(&mut self) -> Result<()> {
		self.send(Opcode::Up)
	}

	pub fn down(&mut self) -> Result<()> {
		self.send(Opcode::Down)
	}

	pub fn left(&mut self) -> Result<()> {
		self.send(Opcode::Left)
	}

	pub fn right(&mut self) -> Result<()> {
		self.send(Opcode::Right)
	}

	pub fn erase(&mut self) -> Result<()> {
		self.erase_eeprom(ERASE_TIME_MS)
	}

	pub fn erase_eeprom(&mut self, total_ms: u64) -> Result<()> {
		info!(total_ms, "erasing EEPROM");
		let n = commands::erase_eeprom(&mut self.transport)?;
		self.bytes_written(n as u64);
		self.progress.erase_eeprom_started(total_ms);
		Ok(())
	}

	pub fn upload_image(&mut self, payload: &ImagePayload, chunk_size: u32) -> Result<u64> {
		info!(bytes = payload.len(), chunk_size, "uploading image");
		self.progress.image_upload_started(payload, payload.len());

		let rate = &mut self.rate;
		let progress = &mut self.progress;
		let sent = transmit_chunked(&mut self.transport, payload.bytes(), chunk_size, |n| {
			rate.bytes_received(n);
			progress.bytes_written(n);
		})
		.inspect_err(|_| self.progress.upload_aborted())?;

		self.progress.engraving_resetted();
		Ok(sent)
	}

	pub fn await_transmission(&mut self, timeout: Duration) -> Result<bool> {
		Ok(self.transport.wait_for_written(timeout)?)
	}

	pub fn poll(&mut self) -> Result<Vec<StatusEvent>> {
		let bytes = self.transport.read_available()?;
		let mut events = Vec::new();
		if !bytes.is_empty() {
			self.progress.status_bytes_received(&bytes);
			events.extend(self.decoder.feed(&bytes));
			for event in &events {
				match event {
					StatusEvent::BatchComplete => info!("status: complete"),
					StatusEvent::DeviceReady => info!("status: ready"),
					_ => {}
				}
				self.status.emit(*event);
			}
		}
		self.progress.poll_timers();
		Ok(events)
	}

	fn send(&mut self, op: Opcode) -> Result<()> {
		let n = commands::send_opcode(&mut self.transport, op)?;
		self.bytes_written(n as u64);
		Ok(())
	}

	fn bytes_written(&mut self, n: u64) {
		self.rate.bytes_received(n);
		self.progress.bytes_written(n);
	}
}

impl<T: Transport, C: Clock> Drop for Engraver<T, C> {
	fn drop(&mut self) {
		info!("engraver is being dropped, closing transport");
		self.transport.close();
	}
}
