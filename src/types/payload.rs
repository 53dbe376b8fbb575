use crate::consts::{IMAGE_BYTES_PER_PIXEL, STATUS_BYTES_PER_PIXEL};

#[derive(Debug, Clone)]
pub struct ImagePayload {
	bitmap: Vec<u8>,
	black_samples: u64,
}

impl ImagePayload {
	pub fn new(bitmap: Vec<u8>, black_samples: u64) -> Self {
		Self {
			bitmap,
			black_samples,
		}
	}

	pub fn with_source(bitmap: Vec<u8>, source: &[u8]) -> Self {
		let black_samples = source.iter().filter(|&&b| b == 0x00).count() as u64;
		Self::new(bitmap, black_samples)
	}

	pub fn bytes(&self) -> &[u8] {
		&self.bitmap
	}

	pub fn len(&self) -> u64 {
		self.bitmap.len() as u64
	}

	pub fn is_empty(&self) -> bool {
		self.bitmap.is_empty()
	}

	pub fn expected_status_bytes(&self) -> u64 {
		self.black_samples / IMAGE_BYTES_PER_PIXEL * STATUS_BYTES_PER_PIXEL
	}
}
