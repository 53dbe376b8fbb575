use tracing::debug;

use crate::consts::*;
use crate::error::{EngraverError, Result};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnTime(u8);

impl BurnTime {
	pub fn new(value: u8) -> Result<Self> {
		if !(BURN_TIME_MIN..=BURN_TIME_MAX).contains(&value) {
			return Err(EngraverError::OutOfRange { value });
		}
		Ok(Self(value))
	}

	pub fn get(self) -> u8 {
		self.0
	}
}

impl TryFrom<u8> for BurnTime {
	type Error = EngraverError;

	fn try_from(value: u8) -> Result<Self> {
		Self::new(value)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
	SetBurnTime(BurnTime),
	Start,
	Pause,
	Home,
	Preview,
	Up,
	Down,
	Left,
	Right,
	Reset,
	Center,
}

impl Opcode {
	pub fn byte(self) -> u8 {
		match self {
			Opcode::SetBurnTime(t) => t.get(),
			Opcode::Start => OP_START,
			Opcode::Pause => OP_PAUSE,
			Opcode::Home => OP_HOME,
			Opcode::Preview => OP_PREVIEW,
			Opcode::Up => OP_UP,
			Opcode::Down => OP_DOWN,
			Opcode::Left => OP_LEFT,
			Opcode::Right => OP_RIGHT,
			Opcode::Reset => OP_RESET,
			Opcode::Center => OP_CENTER,
		}
	}
}

pub fn transmit<T: Transport + ?Sized>(transport: &mut T, data: &[u8]) -> Result<usize> {
	debug!(len = data.len(), bytes = %hex(data), "transmitting");
	let n = transport.write(data)?;
	transport.flush()?;
	Ok(n)
}

pub fn send_opcode<T: Transport + ?Sized>(transport: &mut T, op: Opcode) -> Result<usize> {
	transmit(transport, &[op.byte()])
}

pub fn set_burn_time<T: Transport + ?Sized>(transport: &mut T, value: u8) -> Result<usize> {
	let burn_time = BurnTime::new(value)?;
	send_opcode(transport, Opcode::SetBurnTime(burn_time))
}

pub fn erase_eeprom<T: Transport + ?Sized>(transport: &mut T) -> Result<usize> {
	transmit(transport, &ERASE_SEQUENCE)
}

fn hex(data: &[u8]) -> String {
	const MAX_SHOWN: usize = 32;
	let mut s: String = data
		.iter()
		.take(MAX_SHOWN)
		.map(|b| format!("{b:02x}"))
		.collect();
	if data.len() > MAX_SHOWN {
		s.push_str("..");
	}
	s
}
