#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
	UploadProgress { progress: u64, maximum: u64 },
	EngraveProgress { progress: u64, maximum: u64 },
	EraseProgress { progress: u64, maximum: u64 },
	EraseComplete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateEvent {
	Changed(f64),
}
