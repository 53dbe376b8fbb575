mod cli;

use anyhow::{bail, Result};
use clap::Parser;
use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use ezgraver::consts::*;
use ezgraver::transport::{available_ports, SerialTransport};
use ezgraver::{Engraver, ImagePayload, ProgressEvent, RateEvent, StatusEvent};

type Device = Engraver<SerialTransport>;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const UPLOAD_FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	let port = match &cli.port {
		Some(p) => p.clone(),
		None if matches!(cli.command, Commands::Ports) => String::new(),
		None => detect_port()?,
	};

	match cli.command {
		Commands::Ports => cmd_ports(),
		Commands::Home => cmd_simple(&port, |d| d.home()),
		Commands::Center => cmd_simple(&port, |d| d.center()),
		Commands::Preview => cmd_simple(&port, |d| d.preview()),
		Commands::Up => cmd_simple(&port, |d| d.up()),
		Commands::Down => cmd_simple(&port, |d| d.down()),
		Commands::Left => cmd_simple(&port, |d| d.left()),
		Commands::Right => cmd_simple(&port, |d| d.right()),
		Commands::Pause => cmd_simple(&port, |d| d.pause()),
		Commands::Reset => cmd_simple(&port, |d| d.reset()),
		Commands::Start { burn_time } => cmd_simple(&port, |d| d.start(burn_time)),
		Commands::Erase { duration } => cmd_erase(&port, duration),
		Commands::Upload {
			image,
			keep_aspect,
			no_erase,
			chunk_size,
		} => cmd_upload(&port, &image, keep_aspect, !no_erase, chunk_size),
		Commands::Monitor => cmd_monitor(&port),
		Commands::Engrave {
			image,
			burn_time,
			keep_aspect,
		} => cmd_engrave(&port, &image, burn_time, keep_aspect),
	}
}

fn init_tracing(verbose: u8) {
	let level = match verbose {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

fn detect_port() -> Result<String> {
	match available_ports()?.into_iter().next() {
		Some(p) => Ok(p),
		None => bail!("no serial port found. Is the engraver plugged in?"),
	}
}

fn cmd_ports() -> Result<()> {
	let ports = available_ports()?;
	if ports.is_empty() {
		println!("No serial ports found.");
	}
	for p in ports {
		println!("{p}");
	}
	Ok(())
}

fn cmd_simple<F>(port: &str, action: F) -> Result<()>
where
	F: FnOnce(&mut Device) -> ezgraver::Result<()>,
{
	let mut dev = Engraver::create(port)?;
	action(&mut dev)?;
	if !dev.await_transmission(NORMAL_TIMEOUT)? {
		bail!("timeout waiting for the command to be sent");
	}
	Ok(())
}

fn cmd_erase(port: &str, duration: u64) -> Result<()> {
	let mut dev = Engraver::create(port)?;
	erase_with_bar(&mut dev, duration)?;
	println!("EEPROM erased.");
	Ok(())
}

fn cmd_upload(port: &str, image: &Path, keep_aspect: bool, erase: bool, chunk_size: u32) -> Result<()> {
	eprintln!("Loading {}...", image.display());
	let payload = ezgraver::image::load_image(image, keep_aspect)?;

	let mut dev = Engraver::create(port)?;
	if erase {
		erase_with_bar(&mut dev, ERASE_TIME_MS)?;
	}
	upload_with_bar(&mut dev, &payload, chunk_size)?;
	println!("Upload complete ({} bytes).", payload.len());
	Ok(())
}

fn cmd_monitor(port: &str) -> Result<()> {
	let mut dev = Engraver::create(port)?;
	eprintln!("Monitoring engraver (Ctrl+C to stop)...");
	loop {
		for event in dev.poll()? {
			match event {
				StatusEvent::PixelBurned { x, y } => println!("burned ({x}, {y})"),
				StatusEvent::BatchComplete => println!("status: complete"),
				StatusEvent::DeviceReady => println!("status: ready"),
				StatusEvent::Unknown(b) => println!("unknown byte {b:#04x}"),
			}
		}
		std::thread::sleep(POLL_INTERVAL);
	}
}

fn cmd_engrave(port: &str, image: &Path, burn_time: u8, keep_aspect: bool) -> Result<()> {
	eprintln!("Loading {}...", image.display());
	let payload = ezgraver::image::load_image(image, keep_aspect)?;

	let mut dev = Engraver::create(port)?;
	erase_with_bar(&mut dev, ERASE_TIME_MS)?;
	upload_with_bar(&mut dev, &payload, UPLOAD_CHUNK_SIZE)?;

	let progress = dev.subscribe_progress();
	let status = dev.subscribe_status();
	dev.start(burn_time)?;

	let pb = ProgressBar::new(dev.progress().engrave().maximum);
	pb.set_style(
		ProgressStyle::default_bar()
			.template("{spinner:.cyan} [{bar:40.cyan/dim}] {pos}/{len} status bytes ({eta})")?
			.progress_chars("=> "),
	);

	loop {
		dev.poll()?;
		for event in progress.try_iter() {
			if let ProgressEvent::EngraveProgress { progress, maximum } = event {
				pb.set_length(maximum);
				pb.set_position(progress);
			}
		}
		for event in status.try_iter() {
			match event {
				StatusEvent::BatchComplete => {
					pb.finish_with_message("Engraving complete!");
					println!("Engraving complete.");
					return Ok(());
				}
				StatusEvent::Unknown(b) => pb.println(format!("[device] unknown byte {b:#04x}")),
				_ => {}
			}
		}
		std::thread::sleep(POLL_INTERVAL);
	}
}

fn erase_with_bar(dev: &mut Device, duration: u64) -> Result<()> {
	let events = dev.subscribe_progress();
	dev.erase_eeprom(duration)?;

	let pb = ProgressBar::new(duration);
	pb.set_style(
		ProgressStyle::default_bar()
			.template("{spinner:.cyan} Erasing [{bar:40.cyan/dim}] {pos}/{len} ms")?
			.progress_chars("=> "),
	);

	loop {
		dev.poll()?;
		for event in events.try_iter() {
			match event {
				ProgressEvent::EraseProgress { progress, maximum } => {
					pb.set_length(maximum);
					pb.set_position(progress);
				}
				ProgressEvent::EraseComplete => {
					pb.finish_with_message("Erase complete.");
					return Ok(());
				}
				_ => {}
			}
		}
		std::thread::sleep(POLL_INTERVAL);
	}
}

fn upload_with_bar(dev: &mut Device, payload: &ImagePayload, chunk_size: u32) -> Result<()> {
	let progress = dev.subscribe_progress();
	let rate = dev.subscribe_rate();

	let pb = ProgressBar::new(payload.len());
	pb.set_style(
		ProgressStyle::default_bar()
			.template("{spinner:.cyan} [{bar:40.cyan/dim}] {bytes}/{total_bytes} {msg} ({eta})")?
			.progress_chars("=> "),
	);

	let done = AtomicBool::new(false);
	let sent = std::thread::scope(|s| {
		s.spawn(|| {
			while !done.load(Ordering::Relaxed) {
				show_upload_events(&pb, &progress, &rate);
				std::thread::sleep(POLL_INTERVAL);
			}
		});
		let result = dev.upload_image(payload, chunk_size);
		done.store(true, Ordering::Relaxed);
		result
	})?;
	show_upload_events(&pb, &progress, &rate);

	if !dev.await_transmission(UPLOAD_FLUSH_TIMEOUT)? {
		pb.abandon_with_message("timed out");
		bail!("timeout waiting for the image to be transmitted");
	}
	pb.finish_with_message(format!("{sent} bytes sent"));
	Ok(())
}

fn show_upload_events(pb: &ProgressBar, events: &Receiver<ProgressEvent>, rate: &Receiver<RateEvent>) {
	for event in events.try_iter() {
		if let ProgressEvent::UploadProgress { progress, .. } = event {
			pb.set_position(progress);
		}
	}
	for RateEvent::Changed(r) in rate.try_iter() {
		pb.set_message(format!("{:.0} B/s", r));
	}
}
