use std::time::Duration;

pub const SERIAL_BAUD_RATE: u32 = 57600;
pub const NORMAL_TIMEOUT: Duration = Duration::from_millis(2000);

pub const OP_START: u8 = 0xF1;
pub const OP_PAUSE: u8 = 0xF2;
pub const OP_HOME: u8 = 0xF3;
pub const OP_PREVIEW: u8 = 0xF4;
pub const OP_UP: u8 = 0xF5;
pub const OP_DOWN: u8 = 0xF6;
pub const OP_LEFT: u8 = 0xF7;
pub const OP_RIGHT: u8 = 0xF8;
pub const OP_RESET: u8 = 0xF9;
pub const OP_CENTER: u8 = 0xFB;

pub const ERASE_BYTE: u8 = 0xFE;
pub const ERASE_SEQUENCE: [u8; 8] = [ERASE_BYTE; 8];

pub const BURN_TIME_MIN: u8 = 1;
pub const BURN_TIME_MAX: u8 = 240;

pub const STATUS_PIXEL: u8 = 0xFF;
pub const STATUS_BATCH_COMPLETE: u8 = 0x66;
pub const STATUS_READY: u8 = 0x65;
pub const PIXEL_FRAME_SIZE: usize = 5;

pub const IMAGE_WIDTH: u32 = 512;
pub const IMAGE_HEIGHT: u32 = 512;
pub const UPLOAD_CHUNK_SIZE: u32 = 8192;

pub const ERASE_TIME_MS: u64 = 6000;
pub const ERASE_TICK: Duration = Duration::from_millis(500);

pub const IMAGE_BYTES_PER_PIXEL: u64 = 3;
pub const STATUS_BYTES_PER_PIXEL: u64 = PIXEL_FRAME_SIZE as u64;

pub const RATE_INTERVAL: Duration = Duration::from_millis(1000);
pub const RATE_WEIGHTS: [u64; 3] = [1, 2, 1];
