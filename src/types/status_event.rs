#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
	PixelBurned { x: u32, y: u32 },
	BatchComplete,
	DeviceReady,
	Unknown(u8),
}
