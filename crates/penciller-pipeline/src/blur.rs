//! Gaussian blur and inversion of the grayscale image.
//!
//! The blur uses a square, odd-sized kernel whose sigma is derived from
//! the kernel size (the "sigma = 0" convention): for sizes up to 7 the
//! fixed binomial kernels are used, larger sizes sample a Gaussian with
//! `sigma = 0.3 * ((size - 1) * 0.5 - 1) + 0.8`. The filter is separable,
//! accumulates in `f32` and rounds once at the end. Borders are extended
//! by reflection without repeating the edge sample (`cba|abcd|dcb`).
//!
//! The blurred image is then inverted (`255 - v`) to produce the
//! "blend" layer for the color dodge.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::sample::saturate;

/// Kernel size used by the classic sketch filter.
pub const CLASSIC_KERNEL_SIZE: u32 = 21;

/// Smallest kernel size [`BlurKernel::from_size`] will produce.
pub const MIN_KERNEL_SIZE: u32 = 3;

/// Fixed binomial kernels used for small sizes.
const SMALL_KERNELS: [&[f32]; 3] = [
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[
        0.031_25, 0.109_375, 0.218_75, 0.281_25, 0.218_75, 0.109_375, 0.031_25,
    ],
];

/// A square Gaussian kernel: odd size and the sigma derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurKernel {
    size: u32,
    sigma: f64,
}

impl BlurKernel {
    /// Kernel for `size`, forced odd and at least [`MIN_KERNEL_SIZE`].
    ///
    /// Even sizes are rounded up to the next odd size.
    #[must_use]
    pub fn from_size(size: u32) -> Self {
        let size = size.max(MIN_KERNEL_SIZE) | 1;
        Self {
            size,
            sigma: sigma_for_size(size),
        }
    }

    /// The classic 21x21 kernel (sigma 3.5).
    #[must_use]
    pub fn classic() -> Self {
        Self::from_size(CLASSIC_KERNEL_SIZE)
    }

    /// Side length of the square kernel.
    #[must_use]
    pub const fn size(self) -> u32 {
        self.size
    }

    /// Standard deviation derived from the size.
    #[must_use]
    pub const fn sigma(self) -> f64 {
        self.sigma
    }

    /// Normalized one-dimensional weights (length [`size`](Self::size)).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn weights(self) -> Vec<f32> {
        let index = (self.size as usize) / 2;
        if let Some(fixed) = index.checked_sub(1).and_then(|i| SMALL_KERNELS.get(i)) {
            return fixed.to_vec();
        }

        let radius = f64::from(self.size / 2);
        let scale = -0.5 / (self.sigma * self.sigma);
        let raw: Vec<f64> = (0..self.size)
            .map(|i| {
                let d = f64::from(i) - radius;
                (scale * d * d).exp()
            })
            .collect();
        let sum: f64 = raw.iter().sum();
        raw.iter().map(|w| (w / sum) as f32).collect()
    }
}

impl Default for BlurKernel {
    fn default() -> Self {
        Self::classic()
    }
}

/// Sigma implied by an odd kernel size under the "derive from size"
/// convention.
#[must_use]
pub fn sigma_for_size(size: u32) -> f64 {
    0.3f64.mul_add(f64::from(size - 1).mul_add(0.5, -1.0), 0.8)
}

/// Index into `0..len` for a possibly out-of-range position, reflecting
/// about the edges without repeating the edge sample.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn reflect_101(position: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let len = len as isize;
    let period = 2 * (len - 1);
    let wrapped = position.rem_euclid(period);
    (if wrapped < len { wrapped } else { period - wrapped }) as usize
}

/// Apply a Gaussian blur with the given kernel to a grayscale image.
///
/// Images with zero area are returned unchanged.
#[must_use = "returns the blurred image"]
#[allow(clippy::cast_possible_wrap)]
pub fn gaussian_blur(image: &GrayImage, kernel: BlurKernel) -> GrayImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }

    let weights = kernel.weights();
    let radius = (weights.len() / 2) as isize;
    let width = w as usize;
    let height = h as usize;
    let source = image.as_raw();

    // Horizontal pass, kept in f32 so rounding happens once.
    let mut horizontal = vec![0.0f32; width * height];
    for (row_in, row_out) in source
        .chunks_exact(width)
        .zip(horizontal.chunks_exact_mut(width))
    {
        for (x, out) in row_out.iter_mut().enumerate() {
            *out = weights
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    let sx = reflect_101(x as isize + k as isize - radius, width);
                    weight * f32::from(row_in[sx])
                })
                .sum();
        }
    }

    // Vertical pass.
    GrayImage::from_fn(w, h, |x, y| {
        let x = x as usize;
        let y = y as isize;
        let value: f32 = weights
            .iter()
            .enumerate()
            .map(|(k, weight)| {
                let sy = reflect_101(y + k as isize - radius, height);
                weight * horizontal[sy * width + x]
            })
            .sum();
        Luma([saturate(value)])
    })
}

/// Invert every sample: `255 - v`.
#[must_use = "returns the inverted image"]
pub fn invert(image: &GrayImage) -> GrayImage {
    let mut inverted = image.clone();
    image::imageops::invert(&mut inverted);
    inverted
}

/// Blur with `kernel`, then invert. Returns `(blurred, inverted)`.
#[must_use = "returns the blurred and inverted images"]
pub fn blur_and_invert(image: &GrayImage, kernel: BlurKernel) -> (GrayImage, GrayImage) {
    let blurred = gaussian_blur(image, kernel);
    let inverted = invert(&blurred);
    (blurred, inverted)
}
