use tracing::{debug, warn};

use crate::consts::{PIXEL_FRAME_SIZE, STATUS_BATCH_COMPLETE, STATUS_PIXEL, STATUS_READY};
use crate::types::StatusEvent;

#[derive(Debug, Default)]
pub struct InboundBuffer {
	bytes: Vec<u8>,
	start: usize,
}

impl InboundBuffer {
	pub fn append(&mut self, data: &[u8]) {
		if self.start > 0 {
			self.bytes.drain(..self.start);
			self.start = 0;
		}
		self.bytes.extend_from_slice(data);
	}

	pub fn consume(&mut self, n: usize) {
		self.start = (self.start + n).min(self.bytes.len());
	}

	pub fn as_slice(&self) -> &[u8] {
		&self.bytes[self.start..]
	}

	pub fn len(&self) -> usize {
		self.bytes.len() - self.start
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Tries to decode one frame from the front of `buf`. Returns the event and the
/// number of bytes it occupied, or `None` when more bytes are needed.
pub fn extract_frame(buf: &[u8]) -> Option<(StatusEvent, usize)> {
	let &lead = buf.first()?;
	match lead {
		STATUS_PIXEL => {
			if buf.len() < PIXEL_FRAME_SIZE {
				return None;
			}
			let x = buf[1] as u32 * 100 + buf[2] as u32;
			let y = buf[3] as u32 * 100 + buf[4] as u32;
			Some((StatusEvent::PixelBurned { x, y }, PIXEL_FRAME_SIZE))
		}
		STATUS_BATCH_COMPLETE => Some((StatusEvent::BatchComplete, 1)),
		STATUS_READY => Some((StatusEvent::DeviceReady, 1)),
		other => Some((StatusEvent::Unknown(other), 1)),
	}
}

#[derive(Debug, Default)]
pub struct StatusDecoder {
	buffer: InboundBuffer,
}

impl StatusDecoder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a fragment and returns the frames it completes. The iterator is
	/// lazy; frames it does not yield stay buffered for the next call.
	pub fn feed(&mut self, fragment: &[u8]) -> Frames<'_> {
		debug!(len = fragment.len(), "status bytes received");
		self.buffer.append(fragment);
		Frames {
			buffer: &mut self.buffer,
		}
	}

	pub fn pending(&self) -> &[u8] {
		self.buffer.as_slice()
	}
}

#[must_use = "undrained frames stay buffered"]
pub struct Frames<'a> {
	buffer: &'a mut InboundBuffer,
}

impl Iterator for Frames<'_> {
	type Item = StatusEvent;

	fn next(&mut self) -> Option<StatusEvent> {
		let (event, used) = extract_frame(self.buffer.as_slice())?;
		self.buffer.consume(used);
		if let StatusEvent::Unknown(byte) = event {
			warn!("discarding unknown status byte {byte:#04x}");
		}
		Some(event)
	}
}
