use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::debug;

use crate::consts::{IMAGE_HEIGHT, IMAGE_WIDTH};
use crate::error::Result;
use crate::types::ImagePayload;

const LUMA_THRESHOLD: u8 = 128;
const BMP_HEADER_SIZE: u32 = 14 + 40 + 8;

pub fn load_image(path: &Path, keep_aspect: bool) -> Result<ImagePayload> {
	let img = image::open(path)?;
	debug!(
		path = %path.display(),
		width = img.width(),
		height = img.height(),
		"image loaded"
	);
	Ok(prepare_image(&img, keep_aspect))
}

pub fn prepare_image(img: &DynamicImage, keep_aspect: bool) -> ImagePayload {
	let canvas = resize_image(img, IMAGE_WIDTH, IMAGE_HEIGHT, keep_aspect);
	let dark: Vec<bool> = canvas
		.pixels()
		.map(|p| luma(p) < LUMA_THRESHOLD)
		.collect();

	let source: Vec<u8> = dark
		.iter()
		.flat_map(|&d| if d { [0u8; 3] } else { [0xFFu8; 3] })
		.collect();
	let bitmap = encode_mono_bmp(&dark, IMAGE_WIDTH, IMAGE_HEIGHT);
	ImagePayload::with_source(bitmap, &source)
}

fn luma(p: &Rgba<u8>) -> u8 {
	let [r, g, b, _] = p.0;
	((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

fn resize_image(img: &DynamicImage, target_w: u32, target_h: u32, keep_aspect: bool) -> RgbaImage {
	let fitted = if keep_aspect {
		img.resize(target_w, target_h, FilterType::Lanczos3)
	} else {
		img.resize_exact(target_w, target_h, FilterType::Lanczos3)
	};
	let mut canvas = RgbaImage::from_pixel(target_w, target_h, Rgba([255, 255, 255, 255]));
	let offset_x = (target_w - fitted.width()) / 2;
	let offset_y = (target_h - fitted.height()) / 2;
	image::imageops::overlay(
		&mut canvas,
		&fitted.to_rgba8(),
		offset_x as i64,
		offset_y as i64,
	);
	canvas
}

/// 1 bit per pixel BMP. Rows are written top row first into a bottom-up
/// bitmap, i.e. the picture is stored vertically mirrored. Dark pixels are
/// cleared bits and the palette maps index 0 to white.
pub fn encode_mono_bmp(dark: &[bool], width: u32, height: u32) -> Vec<u8> {
	let row_bytes = (width as usize).div_ceil(32) * 4;
	let image_size = (row_bytes * height as usize) as u32;
	let file_size = BMP_HEADER_SIZE + image_size;

	let mut buf = Vec::with_capacity(file_size as usize);
	buf.extend_from_slice(b"BM");
	buf.extend_from_slice(&file_size.to_le_bytes());
	buf.extend_from_slice(&0u32.to_le_bytes());
	buf.extend_from_slice(&BMP_HEADER_SIZE.to_le_bytes());

	buf.extend_from_slice(&40u32.to_le_bytes());
	buf.extend_from_slice(&(width as i32).to_le_bytes());
	buf.extend_from_slice(&(height as i32).to_le_bytes());
	buf.extend_from_slice(&1u16.to_le_bytes());
	buf.extend_from_slice(&1u16.to_le_bytes());
	buf.extend_from_slice(&0u32.to_le_bytes());
	buf.extend_from_slice(&image_size.to_le_bytes());
	buf.extend_from_slice(&0u32.to_le_bytes());
	buf.extend_from_slice(&0u32.to_le_bytes());
	buf.extend_from_slice(&2u32.to_le_bytes());
	buf.extend_from_slice(&2u32.to_le_bytes());

	buf.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0x00]);
	buf.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

	for y in 0..height as usize {
		let mut row = vec![0u8; row_bytes];
		for x in 0..width as usize {
			if !dark[y * width as usize + x] {
				row[x / 8] |= 0x80 >> (x % 8);
			}
		}
		buf.extend_from_slice(&row);
	}
	buf
}
