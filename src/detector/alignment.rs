/// Alignment pattern search, used to correct the bottom-right corner on versions 2+
use crate::common::function_mask::alignment_centers;
use crate::models::{BitMatrix, Point, Version};
use crate::utils::geometry::PerspectiveTransform;

// Most module mismatches tolerated in the 5x5 template
const MAX_MISMATCHES: usize = 5;

/// Module-grid centre of the alignment pattern nearest the bottom-right corner
pub fn bottom_right_alignment(version: Version) -> Option<Point> {
    let (ax, ay) = alignment_centers(version)
        .into_iter()
        .max_by_key(|(x, y)| x + y)?;
    Some(Point::new(ax as f32 + 0.5, ay as f32 + 0.5))
}

/// Search around the predicted position of `module_point` for the best matching
/// alignment template. Offsets follow the local module axes so rotated symbols work.
pub fn find_alignment_center(
    binary: &BitMatrix,
    transform: &PerspectiveTransform,
    module_point: Point,
    module_size: f32,
) -> Option<Point> {
    let predicted = transform.transform(&module_point);
    if !predicted.x.is_finite() || !predicted.y.is_finite() {
        return None;
    }
    let right = transform.transform(&module_point.translate(1.0, 0.0));
    let down = transform.transform(&module_point.translate(0.0, 1.0));
    let ex = (right.x - predicted.x, right.y - predicted.y);
    let ey = (down.x - predicted.x, down.y - predicted.y);

    let radius = (module_size * 4.0).max(4.0) as isize;
    let mut best: Option<(Point, usize, f32)> = None;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let center = predicted.translate(dx as f32, dy as f32);
            let Some(mismatch) = template_mismatch(binary, &center, ex, ey) else {
                continue;
            };
            let drift = (dx * dx + dy * dy) as f32;
            let better = match best {
                None => true,
                Some((_, m, d)) => mismatch < m || (mismatch == m && drift < d),
            };
            if better {
                best = Some((center, mismatch, drift));
            }
        }
    }

    match best {
        Some((center, mismatch, _)) if mismatch <= MAX_MISMATCHES => Some(center),
        _ => None,
    }
}

fn template_mismatch(
    binary: &BitMatrix,
    center: &Point,
    ex: (f32, f32),
    ey: (f32, f32),
) -> Option<usize> {
    let mut mismatches = 0usize;
    for my in -2i32..=2 {
        for mx in -2i32..=2 {
            let expected_dark = mx.abs().max(my.abs()) != 1;
            let sx = center.x + mx as f32 * ex.0 + my as f32 * ey.0;
            let sy = center.y + mx as f32 * ex.1 + my as f32 * ey.1;
            let actual = binary.get_checked(sx.floor() as isize, sy.floor() as isize)?;
            if actual != expected_dark {
                mismatches += 1;
            }
        }
    }
    Some(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottom_right_alignment() {
        assert_eq!(bottom_right_alignment(Version::MIN), None);
        let v2 = Version::new(2).and_then(bottom_right_alignment);
        assert_eq!(v2, Some(Point::new(18.5, 18.5)));
    }

    #[test]
    fn test_finds_shifted_pattern() {
        // 5x5 alignment pattern at 4 px/module centred on pixel-edge (42, 42)
        let mut binary = BitMatrix::new(80, 80);
        for my in -2i32..=2 {
            for mx in -2i32..=2 {
                if mx.abs().max(my.abs()) != 1 {
                    let x0 = (40 + mx * 4) as usize;
                    let y0 = (40 + my * 4) as usize;
                    for py in 0..4 {
                        for px in 0..4 {
                            binary.set(x0 + px, y0 + py, true);
                        }
                    }
                }
            }
        }
        // Grid at 4 px/module predicting the centre 4 px off
        let src = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let dst = [
            Point::new(-4.0, -4.0),
            Point::new(36.0, -4.0),
            Point::new(36.0, 36.0),
            Point::new(-4.0, 36.0),
        ];
        let transform = PerspectiveTransform::from_points(&src, &dst).unwrap();
        let found = find_alignment_center(&binary, &transform, Point::new(10.5, 10.5), 4.0)
            .unwrap();
        assert!((found.x - 42.0).abs() <= 2.0, "x = {}", found.x);
        assert!((found.y - 42.0).abs() <= 2.0, "y = {}", found.y);
    }
}
