use rayon::prelude::*;

use crate::accumulator::{Accumulator, Channel};
use crate::buffer::RenderBuffer;

const BUCKETS: usize = 256;

/// Perceptual luma weights for R, G, B.
const LUMA: [f64; 3] = [0.299, 0.587, 0.114];

/// Turns accumulated counts into a displayable image.
///
/// 1. Each channel is saturated at `color_cap` and scaled to `0..=255`
///    against its (equally saturated) maximum.
/// 2. The luma of every pixel is bucketed into a 256-entry histogram whose
///    prefix sum drives histogram equalization.
/// 3. Every channel is multiplied by `brightness · cdf[luma] / pixels`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneMapper {
    pub brightness: f64,
    pub color_cap: u32,
}

impl ToneMapper {
    pub fn new(brightness: f64, color_cap: u32) -> Self {
        Self {
            brightness,
            color_cap,
        }
    }

    /// `floor(255 · min(cap, count) / min(cap, max))`, with an all-zero
    /// channel's denominator treated as 1.
    #[inline]
    pub fn normalize(&self, count: u32, max: u32) -> u8 {
        let cap = self.color_cap;
        let denom = max.min(cap).max(1) as u64;
        (255 * count.min(cap) as u64 / denom).min(255) as u8
    }

    pub fn render(&self, acc: &Accumulator) -> RenderBuffer {
        let len = acc.pixel_count();
        let maxima = Channel::ALL.map(|ch| acc.max(ch));
        let [red, green, blue] = Channel::ALL.map(|ch| acc.channel(ch));

        // Pass 1: normalized channels and luma.
        let mut pixels = vec![0u8; len * 4];
        let mut gray = vec![0u8; len];
        pixels
            .par_chunks_mut(4)
            .zip(gray.par_iter_mut())
            .enumerate()
            .for_each(|(i, (pixel, luma))| {
                let rgb = [
                    self.normalize(red[i], maxima[0]),
                    self.normalize(green[i], maxima[1]),
                    self.normalize(blue[i], maxima[2]),
                ];
                *luma = luma_bucket(rgb);
                pixel[..3].copy_from_slice(&rgb);
                pixel[3] = 255;
            });

        // Pass 2: equalize and apply brightness.
        let cdf = cumulative_histogram(&gray);
        let total = len.max(1) as f64;
        let brightness = self.brightness;
        pixels
            .par_chunks_mut(4)
            .zip(gray.par_iter())
            .for_each(|(pixel, &luma)| {
                let factor = brightness * cdf[luma as usize] as f64 / total;
                for ch in &mut pixel[..3] {
                    *ch = (factor * *ch as f64).round().clamp(0.0, 255.0) as u8;
                }
            });

        RenderBuffer {
            width: acc.width,
            height: acc.height,
            pixels,
        }
    }
}

#[inline]
fn luma_bucket(rgb: [u8; 3]) -> u8 {
    let y = rgb[0] as f64 * LUMA[0] + rgb[1] as f64 * LUMA[1] + rgb[2] as f64 * LUMA[2];
    y.round().clamp(0.0, 255.0) as u8
}

/// Prefix-summed 256-bucket histogram of `gray`. Non-decreasing; the last
/// entry equals `gray.len()`.
pub fn cumulative_histogram(gray: &[u8]) -> [u64; BUCKETS] {
    let mut hist = [0u64; BUCKETS];
    for &g in gray {
        hist[g as usize] += 1;
    }
    for i in 1..BUCKETS {
        hist[i] += hist[i - 1];
    }
    hist
}
