use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::consts::{NORMAL_TIMEOUT, SERIAL_BAUD_RATE};
use crate::error::{EngraverError, Result};

pub trait Transport {
	fn write(&mut self, data: &[u8]) -> io::Result<usize>;
	fn flush(&mut self) -> io::Result<()>;
	fn read_available(&mut self) -> io::Result<Vec<u8>>;
	/// Blocks until every queued byte left the host or `timeout` passes.
	/// Returns true if the output queue drained.
	fn wait_for_written(&mut self, timeout: Duration) -> io::Result<bool>;
	fn close(&mut self);
}

pub struct SerialTransport {
	name: String,
	port: Option<Box<dyn serialport::SerialPort>>,
}

pub fn available_ports() -> Result<Vec<String>> {
	let ports = serialport::available_ports()?;
	Ok(ports.into_iter().map(|p| p.port_name).collect())
}

impl SerialTransport {
	pub fn open(path: &str) -> Result<Self> {
		let port = serialport::new(path, SERIAL_BAUD_RATE)
			.data_bits(serialport::DataBits::Eight)
			.stop_bits(serialport::StopBits::One)
			.parity(serialport::Parity::None)
			.flow_control(serialport::FlowControl::None)
			.timeout(NORMAL_TIMEOUT)
			.open()
			.map_err(|source| EngraverError::Connection {
				port: path.to_string(),
				source,
			})?;
		info!(port = path, baud = SERIAL_BAUD_RATE, "serial port opened");
		Ok(Self {
			name: path.to_string(),
			port: Some(port),
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	fn port(&mut self) -> io::Result<&mut Box<dyn serialport::SerialPort>> {
		self.port
			.as_mut()
			.ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port closed"))
	}
}

impl Transport for SerialTransport {
	fn write(&mut self, data: &[u8]) -> io::Result<usize> {
		self.port()?.write_all(data)?;
		Ok(data.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		self.port()?.flush()
	}

	fn read_available(&mut self) -> io::Result<Vec<u8>> {
		let port = self.port()?;
		let pending = port.bytes_to_read().map_err(io::Error::from)? as usize;
		let mut buf = vec![0u8; pending];
		if pending > 0 {
			port.read_exact(&mut buf)?;
		}
		Ok(buf)
	}

	fn wait_for_written(&mut self, timeout: Duration) -> io::Result<bool> {
		let port = self.port()?;
		let deadline = Instant::now() + timeout;
		loop {
			if port.bytes_to_write().map_err(io::Error::from)? == 0 {
				return Ok(true);
			}
			if Instant::now() >= deadline {
				return Ok(false);
			}
			std::thread::sleep(Duration::from_millis(5));
		}
	}

	fn close(&mut self) {
		if self.port.take().is_some() {
			debug!(port = %self.name, "serial port closed");
		}
	}
}

pub mod mock {
	use super::*;
	use std::collections::VecDeque;

	#[derive(Debug, Default)]
	pub struct MockTransport {
		pub writes: Vec<Vec<u8>>,
		pub flushes: usize,
		pub inbound: VecDeque<Vec<u8>>,
		pub closed: bool,
		pub fail_writes: bool,
	}

	impl MockTransport {
		pub fn new() -> Self {
			Self::default()
		}

		pub fn push_inbound(&mut self, bytes: &[u8]) {
			self.inbound.push_back(bytes.to_vec());
		}

		pub fn wire(&self) -> Vec<u8> {
			self.writes.concat()
		}
	}

	impl Transport for MockTransport {
		fn write(&mut self, data: &[u8]) -> io::Result<usize> {
			if self.closed {
				return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
			}
			if self.fail_writes {
				return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write failed"));
			}
			self.writes.push(data.to_vec());
			Ok(data.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			self.flushes += 1;
			Ok(())
		}

		fn read_available(&mut self) -> io::Result<Vec<u8>> {
			Ok(self.inbound.pop_front().unwrap_or_default())
		}

		fn wait_for_written(&mut self, _timeout: Duration) -> io::Result<bool> {
			Ok(true)
		}

		fn close(&mut self) {
			self.closed = true;
		}
	}
}
