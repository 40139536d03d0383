//! Luminance conversion
//!
//! Y = 0.299*R + 0.587*G + 0.114*B in integer form: Y = (76*R + 150*G + 29*B) >> 8.
//! Rows are converted in parallel with rayon once the image is large enough to pay for it.

use rayon::prelude::*;

const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

// Below this many pixels the rayon split costs more than it saves
const PARALLEL_MIN_PIXELS: usize = 256 * 256;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

/// Convert packed RGB to grayscale
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    to_grayscale(rgb, width, height, 3)
}

/// Convert packed RGBA to grayscale (alpha ignored)
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    to_grayscale(rgba, width, height, 4)
}

fn to_grayscale(pixels: &[u8], width: usize, height: usize, channels: usize) -> Vec<u8> {
    let mut gray = vec![0u8; width * height];
    if width == 0 || pixels.len() < width * height * channels {
        return gray;
    }
    let convert_row = |(y, row): (usize, &mut [u8])| {
        let src = &pixels[y * width * channels..(y + 1) * width * channels];
        for (out, px) in row.iter_mut().zip(src.chunks_exact(channels)) {
            *out = luma(px[0], px[1], px[2]);
        }
    };
    if width * height >= PARALLEL_MIN_PIXELS {
        gray.par_chunks_mut(width).enumerate().for_each(convert_row);
    } else {
        gray.chunks_mut(width).enumerate().for_each(convert_row);
    }
    gray
}
