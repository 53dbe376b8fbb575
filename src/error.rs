use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngraverError {
	#[error("burn time {value} out of range (1-240)")]
	OutOfRange { value: u8 },
	#[error("failed to connect to port {port}: {source}")]
	Connection {
		port: String,
		#[source]
		source: serialport::Error,
	},
	#[error("serial error: {0}")]
	Serial(#[from] serialport::Error),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("image error: {0}")]
	Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, EngraverError>;
