use tracing::debug;

use crate::error::Result;
use crate::transport::Transport;

pub fn transmit_chunked<T, F>(
	transport: &mut T,
	data: &[u8],
	chunk_size: u32,
	mut on_written: F,
) -> Result<u64>
where
	T: Transport + ?Sized,
	F: FnMut(u64),
{
	let chunk_size = (chunk_size as usize).max(1);
	debug!(
		len = data.len(),
		chunk_size,
		chunks = data.len().div_ceil(chunk_size),
		"transmitting in chunks"
	);

	let mut sent = 0u64;
	for chunk in data.chunks(chunk_size) {
		let n = transport.write(chunk)? as u64;
		transport.flush()?;
		sent += n;
		on_written(n);
	}
	Ok(sent)
}
