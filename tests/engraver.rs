use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use ezgraver::clock::ManualClock;
use ezgraver::progress::Phase;
use ezgraver::transport::mock::MockTransport;
use ezgraver::transport::Transport;
use ezgraver::{Engraver, EngraverError, ImagePayload, ProgressEvent, RateEvent, StatusEvent};

fn engraver() -> (Engraver<MockTransport, ManualClock>, ManualClock) {
	let clock = ManualClock::new();
	(Engraver::new(MockTransport::new(), clock.clone()), clock)
}

// 2 black pixels -> 10 status bytes expected while engraving
fn payload(len: usize) -> ImagePayload {
	ImagePayload::with_source((0..len).map(|i| i as u8).collect(), &[0u8; 6])
}

type Command = fn(&mut Engraver<MockTransport, ManualClock>) -> ezgraver::Result<()>;

#[test]
fn single_byte_commands() {
	let table: [(Command, u8); 9] = [
		(Engraver::home, 0xF3),
		(Engraver::center, 0xFB),
		(Engraver::preview, 0xF4),
		(Engraver::pause, 0xF2),
		(Engraver::up, 0xF5),
		(Engraver::down, 0xF6),
		(Engraver::left, 0xF7),
		(Engraver::right, 0xF8),
		(Engraver::reset, 0xF9),
	];
	for (command, byte) in table {
		let (mut dev, _) = engraver();
		command(&mut dev).unwrap();
		assert_eq!(dev.transport().writes, vec![vec![byte]], "opcode {byte:#04x}");
	}
}

#[test]
fn start_sends_burn_time_then_start() {
	let (mut dev, _) = engraver();
	dev.start(60).unwrap();
	assert_eq!(dev.transport().wire(), vec![60, 0xF1]);
	assert_eq!(dev.progress().phase(), Phase::Engraving);
}

#[test]
fn start_with_bad_burn_time_sends_nothing() {
	let (mut dev, _) = engraver();
	let err = dev.start(241).unwrap_err();
	assert!(matches!(err, EngraverError::OutOfRange { value: 241 }));
	assert!(dev.transport().writes.is_empty());
	assert_eq!(dev.progress().phase(), Phase::Idle);
}

#[test]
fn upload_is_chunked_and_tracked() {
	let (mut dev, _) = engraver();
	let events = dev.subscribe_progress();
	let image = payload(20);

	let sent = dev.upload_image(&image, 8).unwrap();

	assert_eq!(sent, 20);
	let writes = &dev.transport().writes;
	assert_eq!(writes.iter().map(Vec::len).collect::<Vec<_>>(), vec![8, 8, 4]);
	assert_eq!(dev.transport().wire(), image.bytes());
	assert_eq!(dev.transport().flushes, 3);

	let upload: Vec<_> = events
		.try_iter()
		.filter_map(|e| match e {
			ProgressEvent::UploadProgress { progress, .. } => Some(progress),
			_ => None,
		})
		.collect();
	assert_eq!(upload, vec![0, 8, 16, 20]);
	assert_eq!(dev.progress().engrave().maximum, 10);
	assert_eq!(dev.progress().phase(), Phase::Idle);
}

#[test]
fn commands_after_upload_do_not_move_upload_progress() {
	let (mut dev, _) = engraver();
	dev.upload_image(&payload(4), 8).unwrap();
	dev.home().unwrap();
	assert_eq!(dev.progress().upload().progress, 4);
}

#[test]
fn poll_decodes_fragments_and_tracks_engraving() {
	let (mut dev, _) = engraver();
	let status = dev.subscribe_status();
	dev.upload_image(&payload(4), 8).unwrap();
	dev.start(10).unwrap();

	dev.transport_mut().push_inbound(&[0xFF, 0x00]);
	dev.transport_mut().push_inbound(&[0x05, 0x00, 0x0A, 0x65]);
	assert!(dev.poll().unwrap().is_empty());
	assert_eq!(
		dev.poll().unwrap(),
		vec![StatusEvent::PixelBurned { x: 5, y: 10 }, StatusEvent::DeviceReady]
	);
	assert_eq!(
		status.try_iter().collect::<Vec<_>>(),
		vec![StatusEvent::PixelBurned { x: 5, y: 10 }, StatusEvent::DeviceReady]
	);
	assert_eq!(dev.progress().engrave().progress, 6);
}

#[test]
fn reset_stops_engrave_tracking_until_restarted() {
	let (mut dev, _) = engraver();
	dev.upload_image(&payload(4), 8).unwrap();
	dev.start(10).unwrap();
	dev.transport_mut().push_inbound(&[0xFF, 0, 1, 0, 1]);
	dev.poll().unwrap();
	assert_eq!(dev.progress().engrave().progress, 5);

	dev.reset().unwrap();
	assert_eq!(dev.progress().engrave().progress, 0);
	dev.transport_mut().push_inbound(&[0xFF, 0, 1, 0, 2]);
	dev.poll().unwrap();
	assert_eq!(dev.progress().engrave().progress, 0);

	dev.start(10).unwrap();
	dev.transport_mut().push_inbound(&[0xFF, 0, 1, 0, 3]);
	dev.poll().unwrap();
	assert_eq!(dev.progress().engrave().progress, 5);
}

#[test]
fn erase_sends_sequence_and_completes_by_time() {
	let (mut dev, clock) = engraver();
	let events = dev.subscribe_progress();
	dev.erase_eeprom(2000).unwrap();
	assert_eq!(dev.transport().writes, vec![vec![0xFE; 8]]);

	for _ in 0..3 {
		clock.advance(Duration::from_millis(500));
		dev.poll().unwrap();
	}
	assert_eq!(dev.progress().erase().progress, 1500);
	assert!(dev.progress().erase_running());

	clock.advance(Duration::from_millis(500));
	dev.poll().unwrap();
	clock.advance(Duration::from_millis(5000));
	dev.poll().unwrap();

	let erase: Vec<_> = events
		.try_iter()
		.filter(|e| matches!(e, ProgressEvent::EraseProgress { .. } | ProgressEvent::EraseComplete))
		.collect();
	assert_eq!(
		erase,
		vec![
			ProgressEvent::EraseProgress { progress: 0, maximum: 2000 },
			ProgressEvent::EraseProgress { progress: 500, maximum: 2000 },
			ProgressEvent::EraseProgress { progress: 1000, maximum: 2000 },
			ProgressEvent::EraseProgress { progress: 1500, maximum: 2000 },
			ProgressEvent::EraseProgress { progress: 2000, maximum: 2000 },
			ProgressEvent::EraseComplete,
		]
	);
	assert!(!dev.progress().erase_running());
}

#[test]
fn rate_follows_written_bytes() {
	let (mut dev, clock) = engraver();
	let rate = dev.subscribe_rate();
	for total in [10usize, 20, 30] {
		dev.upload_image(&payload(total), 64).unwrap();
		clock.advance(Duration::from_millis(1001));
	}
	assert_eq!(dev.rate(), 0.0);
	dev.home().unwrap();
	assert_eq!(dev.rate(), 20.0);
	assert_eq!(rate.try_iter().collect::<Vec<_>>(), vec![RateEvent::Changed(20.0)]);
}

#[test]
fn write_failures_surface_immediately() {
	let (mut dev, _) = engraver();
	dev.transport_mut().fail_writes = true;
	assert!(matches!(dev.pause(), Err(EngraverError::Io(_))));
	assert!(matches!(dev.upload_image(&payload(4), 2), Err(EngraverError::Io(_))));
}

// Accepts the first write, then fails every following one.
#[derive(Default)]
struct FailAfterFirst {
	writes: usize,
}

impl Transport for FailAfterFirst {
	fn write(&mut self, data: &[u8]) -> io::Result<usize> {
		self.writes += 1;
		if self.writes > 1 {
			return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
		}
		Ok(data.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}

	fn read_available(&mut self) -> io::Result<Vec<u8>> {
		Ok(Vec::new())
	}

	fn wait_for_written(&mut self, _timeout: Duration) -> io::Result<bool> {
		Ok(true)
	}

	fn close(&mut self) {}
}

#[test]
fn failed_upload_stops_counting_later_commands() {
	let mut dev = Engraver::new(FailAfterFirst::default(), ManualClock::new());
	assert!(matches!(dev.upload_image(&payload(20), 8), Err(EngraverError::Io(_))));
	assert_eq!(dev.progress().phase(), Phase::Idle);
	assert_eq!(dev.progress().upload().progress, 8);

	let events = dev.subscribe_progress();
	for _ in 0..5 {
		dev.transport_mut().writes = 0;
		dev.home().unwrap();
	}
	assert_eq!(dev.progress().upload().progress, 8);
	assert!(!events.try_iter().any(|e| matches!(e, ProgressEvent::UploadProgress { .. })));
}

struct FlagTransport(Rc<Cell<bool>>);

impl Transport for FlagTransport {
	fn write(&mut self, data: &[u8]) -> io::Result<usize> {
		Ok(data.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}

	fn read_available(&mut self) -> io::Result<Vec<u8>> {
		Ok(Vec::new())
	}

	fn wait_for_written(&mut self, _timeout: Duration) -> io::Result<bool> {
		Ok(true)
	}

	fn close(&mut self) {
		self.0.set(true);
	}
}

#[test]
fn dropping_closes_the_transport() {
	let closed = Rc::new(Cell::new(false));
	let dev = Engraver::new(FlagTransport(closed.clone()), ManualClock::new());
	assert!(!closed.get());
	drop(dev);
	assert!(closed.get());
}
