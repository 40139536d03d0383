use crate::models::BitMatrix;

/// Convert grayscale image to binary using Otsu's thresholding method.
/// Returns a BitMatrix where true = black, false = white
pub fn otsu_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    threshold_binarize(gray, width, height, calculate_otsu_threshold(gray))
}

/// Otsu's optimal global threshold; pixels below it are dark
pub fn calculate_otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total = gray.len() as f64;
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut max_variance = 0.0;
    let mut optimal_threshold = 128u8;
    let mut below_count = 0.0;
    let mut below_sum = 0.0;

    // Class 1 is [0, t), class 2 is [t, 255]
    for t in 1..=255usize {
        below_count += histogram[t - 1] as f64;
        below_sum += (t - 1) as f64 * histogram[t - 1] as f64;
        let above_count = total - below_count;
        if below_count == 0.0 || above_count == 0.0 {
            continue;
        }
        let mean_below = below_sum / below_count;
        let mean_above = (total_sum - below_sum) / above_count;
        let variance = below_count * above_count * (mean_below - mean_above).powi(2);
        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = t as u8;
        }
    }

    optimal_threshold
}

/// Simple global threshold binarization
pub fn threshold_binarize(gray: &[u8], width: usize, height: usize, threshold: u8) -> BitMatrix {
    let mut binary = BitMatrix::new(width, height);
    for y in 0..height {
        for x in 0..width {
            binary.set(x, y, gray[y * width + x] < threshold);
        }
    }
    binary
}

/// Local mean threshold over a `window`-pixel square (odd, clamped to at least 3).
///
/// A pixel is dark when it sits more than `offset` below the mean of its window.
/// Box sums come from an integral image so the cost is independent of the window.
pub fn adaptive_binarize(
    gray: &[u8],
    width: usize,
    height: usize,
    window: usize,
    offset: u8,
) -> BitMatrix {
    let mut binary = BitMatrix::new(width, height);
    if width == 0 || height == 0 {
        return binary;
    }
    let stride = width + 1;
    let mut integral = vec![0u64; stride * (height + 1)];
    for y in 0..height {
        let mut row_sum = 0u64;
        for x in 0..width {
            row_sum += gray[y * width + x] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    let half = window.max(3) / 2;
    for y in 0..height {
        let y0 = y.saturating_sub(half);
        let y1 = (y + half + 1).min(height);
        for x in 0..width {
            let x0 = x.saturating_sub(half);
            let x1 = (x + half + 1).min(width);
            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let count = ((y1 - y0) * (x1 - x0)) as u64;
            let pixel = gray[y * width + x] as u64;
            binary.set(x, y, (pixel + offset as u64) * count < sum);
        }
    }
    binary
}

/// Window for [`adaptive_binarize`] scaled to the image: an eighth of the short side,
/// never below 31 pixels
pub fn adaptive_window(width: usize, height: usize) -> usize {
    (width.min(height) / 8).max(31) | 1
}
