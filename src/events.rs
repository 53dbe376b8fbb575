use crossbeam_channel::{unbounded, Receiver, Sender};

pub struct Broadcaster<E> {
	subscribers: Vec<Sender<E>>,
}

impl<E: Clone> Broadcaster<E> {
	pub fn new() -> Self {
		Self {
			subscribers: Vec::new(),
		}
	}

	pub fn subscribe(&mut self) -> Receiver<E> {
		let (tx, rx) = unbounded();
		self.subscribers.push(tx);
		rx
	}

	pub fn emit(&mut self, event: E) {
		// A failed send means the receiver is gone; forget that subscriber.
		self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
	}
}

impl<E: Clone> Default for Broadcaster<E> {
	fn default() -> Self {
		Self::new()
	}
}
