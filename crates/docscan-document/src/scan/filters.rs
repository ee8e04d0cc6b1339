// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Smoothing helpers shared by detection and enhancement.

use image::GrayImage;
use imageproc::filter::separable_filter_equal;

/// Gaussian sigma conventionally paired with a `kernel × kernel` window:
/// `0.3·((k−1)·0.5 − 1) + 0.8`. A 5×5 kernel gives 1.1.
pub fn sigma_for_kernel(kernel: u32) -> f32 {
    let k = kernel.max(1) as f32;
    (0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8).max(0.1)
}

/// Normalised 1-D Gaussian taps for an odd window of `kernel` samples.
pub fn gaussian_taps(kernel: u32) -> Vec<f32> {
    let size = kernel.max(1) | 1;
    let centre = (size / 2) as f32;
    let sigma = sigma_for_kernel(size);
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - centre;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Gaussian blur over exactly a `kernel × kernel` window, applied separably.
/// Samples past the border repeat the edge pixel.
pub fn gaussian_blur_kernel(image: &GrayImage, kernel: u32) -> GrayImage {
    separable_filter_equal(image, &gaussian_taps(kernel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn five_by_five_sigma() {
        assert!((sigma_for_kernel(5) - 1.1).abs() < 1e-6);
        assert!((sigma_for_kernel(3) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn taps_span_exactly_the_window() {
        let taps = gaussian_taps(5);
        assert_eq!(taps.len(), 5);
        assert!((taps.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((taps[0] - taps[4]).abs() < 1e-7);
        assert!(taps[2] > taps[1] && taps[1] > taps[0]);
        assert_eq!(gaussian_taps(4).len(), 5);
    }

    #[test]
    fn blur_support_is_limited_to_the_window() {
        // A single bright pixel spreads at most two pixels under a 5x5 kernel.
        let mut img = GrayImage::new(15, 15);
        img.put_pixel(7, 7, Luma([255u8]));
        let out = gaussian_blur_kernel(&img, 5);
        assert!(out.get_pixel(5, 7).0[0] > 0);
        for x in [0, 1, 2, 3, 4, 10, 11, 12, 13, 14] {
            assert_eq!(out.get_pixel(x, 7).0[0], 0, "x = {x}");
        }
    }

    #[test]
    fn flat_image_stays_flat() {
        // Accumulated taps may fall just short of 1.0 before truncation.
        let img = GrayImage::from_pixel(9, 9, Luma([120u8]));
        assert!(gaussian_blur_kernel(&img, 5).pixels().all(|p| p.0[0].abs_diff(120) <= 1));
    }

    #[test]
    fn blur_keeps_dimensions() {
        let img = GrayImage::from_fn(17, 9, |x, _| Luma([if x < 8 { 0 } else { 255 }]));
        assert_eq!(gaussian_blur_kernel(&img, 5).dimensions(), (17, 9));
    }
}
