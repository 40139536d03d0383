/// Module grid sampling through a perspective transform
use crate::models::{BitMatrix, Point};
use crate::utils::geometry::PerspectiveTransform;

/// Sample a `dimension`-square module grid from the binary image.
///
/// Each module is read at its mapped centre. When modules span at least three pixels
/// the 3x3 neighbourhood votes, which absorbs single-pixel binarization noise.
pub fn sample_grid(
    binary: &BitMatrix,
    transform: &PerspectiveTransform,
    dimension: usize,
    module_size: f32,
) -> BitMatrix {
    let radius: isize = if module_size >= 3.0 { 1 } else { 0 };
    BitMatrix::from_fn(dimension, |x, y| {
        sample_module(binary, transform, x, y, radius)
    })
}

/// Read one module; out-of-image samples count as light
pub fn sample_module(
    binary: &BitMatrix,
    transform: &PerspectiveTransform,
    x: usize,
    y: usize,
    radius: isize,
) -> bool {
    let p = transform.transform(&Point::new(x as f32 + 0.5, y as f32 + 0.5));
    if !p.x.is_finite() || !p.y.is_finite() {
        return false;
    }
    let (cx, cy) = (p.x.floor() as isize, p.y.floor() as isize);
    let mut dark = 0usize;
    let mut total = 0usize;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if let Some(bit) = binary.get_checked(cx + dx, cy + dy) {
                total += 1;
                if bit {
                    dark += 1;
                }
            }
        }
    }
    total > 0 && dark * 2 > total
}
