#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressAxis {
	pub progress: u64,
	pub maximum: u64,
}

impl ProgressAxis {
	/// Sets `progress` to `candidate` clamped to `maximum`. Returns false, leaving
	/// the axis untouched, when there is no maximum.
	pub fn update(&mut self, candidate: u64) -> bool {
		if self.maximum == 0 {
			return false;
		}
		self.progress = candidate.min(self.maximum);
		true
	}

	pub fn is_done(&self) -> bool {
		self.progress >= self.maximum
	}
}
