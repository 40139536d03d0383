/// Grouping of finder patterns into ordered top-left / top-right / bottom-left triads
use super::finder::{FinderPattern, module_size_along};
use crate::models::{BitMatrix, Point};
use std::cmp::Ordering;

// Candidates considered for triads, strongest first
const MAX_CANDIDATES: usize = 30;

/// Three finder centres in symbol order plus the derived grid size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triad {
    /// Top-left finder centre
    pub top_left: Point,
    /// Top-right finder centre
    pub top_right: Point,
    /// Bottom-left finder centre
    pub bottom_left: Point,
    /// Module size measured along the symbol axes
    pub module_size: f32,
    /// Estimated side in modules (a valid 4v+17)
    pub dimension: usize,
}

/// Plausible triples of finder indices, best scoring first, at most `max_triads`
pub fn candidate_triads(patterns: &[FinderPattern], max_triads: usize) -> Vec<[usize; 3]> {
    let n = patterns.len().min(MAX_CANDIDATES);
    let mut groups: Vec<([usize; 3], f32)> = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let group = [i, j, k];
                if is_plausible(patterns, &group) {
                    groups.push((group, group_score(patterns, &group)));
                }
            }
        }
    }
    groups.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    groups.truncate(max_triads);
    groups.into_iter().map(|(g, _)| g).collect()
}

fn is_plausible(patterns: &[FinderPattern], group: &[usize; 3]) -> bool {
    let [pi, pj, pk] = group.map(|i| &patterns[i]);

    let sizes = [pi.module_size, pj.module_size, pk.module_size];
    let min_size = sizes.iter().fold(f32::INFINITY, |a, &b| a.min(b));
    let max_size = sizes.iter().fold(0.0f32, |a, &b| a.max(b));
    if min_size <= 0.0 || max_size / min_size > 1.5 {
        return false;
    }

    let d_ij = pi.center.distance(&pj.center);
    let d_ik = pi.center.distance(&pk.center);
    let d_jk = pj.center.distance(&pk.center);
    let distances = [d_ij, d_ik, d_jk];
    let min_d = distances.iter().fold(f32::INFINITY, |a, &b| a.min(b));
    let max_d = distances.iter().fold(0.0f32, |a, &b| a.max(b));

    let avg_module = (pi.module_size + pj.module_size + pk.module_size) / 3.0;
    // Finder centres of the smallest symbol are 14 modules apart
    if min_d < avg_module * 10.0 {
        return false;
    }
    if max_d / min_d > 2.5 {
        return false;
    }
    best_cosine(d_ij, d_ik, d_jk) < 0.3
}

fn best_cosine(d01: f32, d02: f32, d12: f32) -> f32 {
    let a2 = d01 * d01;
    let b2 = d02 * d02;
    let c2 = d12 * d12;
    let cos_0 = ((a2 + b2 - c2) / (2.0 * d01 * d02)).abs();
    let cos_1 = ((a2 + c2 - b2) / (2.0 * d01 * d12)).abs();
    let cos_2 = ((b2 + c2 - a2) / (2.0 * d02 * d12)).abs();
    cos_0.min(cos_1).min(cos_2)
}

fn group_score(patterns: &[FinderPattern], group: &[usize; 3]) -> f32 {
    let [p0, p1, p2] = group.map(|i| &patterns[i]);

    let sizes = [p0.module_size, p1.module_size, p2.module_size];
    let min_size = sizes.iter().fold(f32::INFINITY, |a, &b| a.min(b));
    let max_size = sizes.iter().fold(0.0f32, |a, &b| a.max(b));
    let size_ratio = max_size / min_size;

    let d01 = p0.center.distance(&p1.center);
    let d02 = p0.center.distance(&p2.center);
    let d12 = p1.center.distance(&p2.center);

    // The two legs at the right angle should match
    let mut legs = [d01, d02, d12];
    legs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let leg_ratio = legs[1] / legs[0];

    size_ratio * 2.0 + leg_ratio + best_cosine(d01, d02, d12) * 2.0
}

/// Order a triple as TL, TR, BL and estimate module size and dimension
pub fn order_triad(matrix: &BitMatrix, patterns: [&FinderPattern; 3]) -> Option<Triad> {
    // The right-angle corner is top-left
    let mut best_idx = 0usize;
    let mut best_cos = f32::INFINITY;
    for i in 0..3 {
        let p = &patterns[i].center;
        let p1 = &patterns[(i + 1) % 3].center;
        let p2 = &patterns[(i + 2) % 3].center;
        let (v1x, v1y) = (p1.x - p.x, p1.y - p.y);
        let (v2x, v2y) = (p2.x - p.x, p2.y - p.y);
        let denom = (v1x * v1x + v1y * v1y).sqrt() * (v2x * v2x + v2y * v2y).sqrt();
        if denom == 0.0 {
            continue;
        }
        let cos = ((v1x * v2x + v1y * v2y) / denom).abs();
        if cos < best_cos {
            best_cos = cos;
            best_idx = i;
        }
    }

    let tl = patterns[best_idx];
    let p1 = patterns[(best_idx + 1) % 3];
    let p2 = patterns[(best_idx + 2) % 3];

    // Clockwise in image coordinates (y down) runs TL -> TR -> BL
    let cross = tl.center.cross(&p1.center, &p2.center);
    let (tr, bl) = if cross > 0.0 { (p1, p2) } else { (p2, p1) };

    let d_tr = tl.center.distance(&tr.center);
    let d_bl = tl.center.distance(&bl.center);
    let module_size = axis_module_size(matrix, tl, tr, bl)?;

    let dimension = estimate_dimension((d_tr + d_bl) / 2.0, module_size)?;
    Some(Triad {
        top_left: tl.center,
        top_right: tr.center,
        bottom_left: bl.center,
        module_size,
        dimension,
    })
}

// Module size measured along the TL->TR and TL->BL axes; row-scan estimates are
// inflated on rotated symbols
fn axis_module_size(
    matrix: &BitMatrix,
    tl: &FinderPattern,
    tr: &FinderPattern,
    bl: &FinderPattern,
) -> Option<f32> {
    let unit = |from: &Point, to: &Point| {
        let d = from.distance(to);
        ((to.x - from.x) / d, (to.y - from.y) / d)
    };
    let across = unit(&tl.center, &tr.center);
    let down = unit(&tl.center, &bl.center);
    let samples: Vec<f32> = [
        module_size_along(matrix, &tl.center, across),
        module_size_along(matrix, &tr.center, across),
        module_size_along(matrix, &tl.center, down),
        module_size_along(matrix, &bl.center, down),
    ]
    .into_iter()
    .flatten()
    .collect();
    if samples.is_empty() {
        return None;
    }
    let size = samples.iter().sum::<f32>() / samples.len() as f32;
    (size >= 1.0).then_some(size)
}

/// Nearest valid side length for a finder-centre distance
pub fn estimate_dimension(distance: f32, module_size: f32) -> Option<usize> {
    if module_size <= 0.0 {
        return None;
    }
    let raw_dim = distance / module_size + 7.0;
    let version = ((raw_dim - 17.0) / 4.0).round() as i32;
    // One step past either end is module size error, not a different symbol
    if !(0..=41).contains(&version) {
        return None;
    }
    Some(17 + 4 * version.clamp(1, 40) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(x: f32, y: f32, m: f32) -> FinderPattern {
        FinderPattern::new(x, y, m)
    }

    #[test]
    fn test_estimate_dimension() {
        // Version 1: finder centres 14 modules apart
        assert_eq!(estimate_dimension(140.0, 10.0), Some(21));
        assert_eq!(estimate_dimension(150.0, 10.0), Some(21));
        assert_eq!(estimate_dimension(180.0, 10.0), Some(25));
        assert_eq!(estimate_dimension(20.0, 10.0), None);
    }

    #[test]
    fn test_candidate_triads_prefers_right_angle() {
        let patterns = vec![
            fp(100.0, 100.0, 5.0),
            fp(300.0, 100.0, 5.0),
            fp(100.0, 300.0, 5.0),
            // Off to the side, makes skinny triangles only
            fp(700.0, 120.0, 5.0),
        ];
        let triads = candidate_triads(&patterns, 10);
        assert!(!triads.is_empty());
        assert_eq!(triads[0], [0, 1, 2]);
    }

    #[test]
    fn test_rejects_mismatched_sizes() {
        let patterns = vec![
            fp(100.0, 100.0, 5.0),
            fp(300.0, 100.0, 12.0),
            fp(100.0, 300.0, 5.0),
        ];
        assert!(candidate_triads(&patterns, 10).is_empty());
    }
}
