use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ezgraver::consts::{ERASE_TIME_MS, UPLOAD_CHUNK_SIZE};

#[derive(Parser)]
#[command(name = "ezgraver", about = "CLI for serial EzGraver laser engravers")]
pub struct Cli {
	#[arg(short, long, help = "Serial port path (uses the first available port if not specified)")]
	pub port: Option<String>,

	#[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity (-v, -vv, -vvv)")]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
	#[command(about = "List available serial ports")]
	Ports,
	#[command(about = "Move the laser to its home position")]
	Home,
	#[command(about = "Move the laser to the center")]
	Center,
	#[command(about = "Draw the outline of the uploaded image")]
	Preview,
	#[command(about = "Jog the laser up")]
	Up,
	#[command(about = "Jog the laser down")]
	Down,
	#[command(about = "Jog the laser left")]
	Left,
	#[command(about = "Jog the laser right")]
	Right,
	#[command(about = "Pause the engrave process")]
	Pause,
	#[command(about = "Reset the engraver")]
	Reset,
	#[command(about = "Start engraving the uploaded image")]
	Start {
		#[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=240), help = "Burn time (1-240)")]
		burn_time: u8,
	},
	#[command(about = "Erase the image stored on the engraver")]
	Erase {
		#[arg(long, default_value_t = ERASE_TIME_MS, help = "Time the device needs to erase, in ms")]
		duration: u64,
	},
	#[command(about = "Upload an image to the engraver")]
	Upload {
		image: PathBuf,

		#[arg(long, help = "Keep the aspect ratio instead of stretching")]
		keep_aspect: bool,

		#[arg(long, help = "Skip erasing the EEPROM before uploading")]
		no_erase: bool,

		#[arg(long, default_value_t = UPLOAD_CHUNK_SIZE, value_parser = clap::value_parser!(u32).range(1..), help = "Upload chunk size in bytes")]
		chunk_size: u32,
	},
	#[command(about = "Print status reports from the engraver")]
	Monitor,
	#[command(about = "Erase, upload, start and follow an engraving job")]
	Engrave {
		image: PathBuf,

		#[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=240), help = "Burn time (1-240)")]
		burn_time: u8,

		#[arg(long, help = "Keep the aspect ratio instead of stretching")]
		keep_aspect: bool,
	},
}
