/// Finder pattern detection using 1:1:3:1:1 ratio scanning, confirmed by cross-checks
use crate::models::{BitMatrix, Point};

// Smallest module the row scan accepts, in pixels
const MIN_MODULE_PX: usize = 2;

// Early stop for rows dense with finder-like runs
const MAX_PATTERNS_PER_ROW: usize = 8;

/// A confirmed finder pattern centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderPattern {
    /// Centre in image coordinates (pixel edges at integers)
    pub center: Point,
    /// Estimated module size in pixels
    pub module_size: f32,
    /// Number of row detections merged into this pattern
    pub count: usize,
}

impl FinderPattern {
    /// Single detection
    pub fn new(x: f32, y: f32, module_size: f32) -> Self {
        Self {
            center: Point::new(x, y),
            module_size,
            count: 1,
        }
    }

    fn absorb(&mut self, other: &FinderPattern) {
        let total = (self.count + other.count) as f32;
        let (a, b) = (self.count as f32 / total, other.count as f32 / total);
        self.center = Point::new(
            self.center.x * a + other.center.x * b,
            self.center.y * a + other.center.y * b,
        );
        self.module_size = self.module_size * a + other.module_size * b;
        self.count += other.count;
    }

    fn is_near(&self, other: &FinderPattern) -> bool {
        let size = self.module_size.max(other.module_size);
        let ratio = self.module_size.max(other.module_size)
            / self.module_size.min(other.module_size).max(f32::EPSILON);
        self.center.distance(&other.center) < size * 2.0 && ratio < 1.6
    }
}

/// Scanner for finder patterns in a binary image
pub struct FinderDetector;

impl FinderDetector {
    /// All confirmed finder pattern centres, most strongly supported first
    pub fn detect(matrix: &BitMatrix) -> Vec<FinderPattern> {
        let width = matrix.width();
        let height = matrix.height();
        let mut candidates = Vec::new();

        for y in 0..height {
            if !Self::has_significant_edges(matrix, y, width) {
                continue;
            }
            for row_hit in Self::scan_row(matrix, y, width) {
                if let Some(confirmed) = Self::cross_check(matrix, &row_hit) {
                    candidates.push(confirmed);
                }
            }
        }

        let mut merged = Self::merge_candidates(candidates);
        // Lone hits are almost always noise in data regions
        merged.retain(|p| p.count >= 2);
        merged.sort_by(|a, b| b.count.cmp(&a.count));
        merged
    }

    /// Check if row has enough edge transitions to potentially contain patterns
    fn has_significant_edges(matrix: &BitMatrix, y: usize, width: usize) -> bool {
        let mut transitions = 0;
        let mut prev_color = matrix.get(0, y);
        for x in 1..width {
            let color = matrix.get(x, y);
            if color != prev_color {
                transitions += 1;
                prev_color = color;
                if transitions >= 4 {
                    return true;
                }
            }
        }
        false
    }

    fn scan_row(matrix: &BitMatrix, y: usize, width: usize) -> Vec<FinderPattern> {
        let mut candidates = Vec::new();
        let mut run_lengths: Vec<usize> = Vec::new();
        let mut run_colors: Vec<bool> = Vec::new();
        let mut run_start = 0usize;
        let mut current_color = matrix.get(0, y);

        for x in 1..=width {
            let color = if x < width {
                matrix.get(x, y)
            } else {
                !current_color
            };
            if color == current_color {
                continue;
            }
            run_lengths.push(x - run_start);
            run_colors.push(current_color);
            run_start = x;
            current_color = color;

            if run_colors.len() < 5 {
                continue;
            }
            let end = run_colors.len();
            let colors = &run_colors[end - 5..end];
            let lengths = &run_lengths[end - 5..end];

            // black-white-black-white-black
            if colors[0] && !colors[1] && colors[2] && !colors[3] && colors[4] {
                if let Some(unit) = check_ratio(lengths) {
                    let center_x = x as f32 - lengths[4] as f32 - lengths[3] as f32
                        - lengths[2] as f32 / 2.0;
                    candidates.push(FinderPattern::new(center_x, y as f32 + 0.5, unit));
                    if candidates.len() >= MAX_PATTERNS_PER_ROW {
                        break;
                    }
                }
            }
        }

        candidates
    }

    // Confirm a row hit vertically, then re-centre horizontally on the refined row
    fn cross_check(matrix: &BitMatrix, hit: &FinderPattern) -> Option<FinderPattern> {
        let max_run = (hit.module_size * 4.0).ceil() as usize + 2;
        let (cy, v_unit) = cross_check_axis(matrix, hit.center, (0, 1), max_run)?;
        let refined = Point::new(hit.center.x, cy);
        let (cx, h_unit) = cross_check_axis(matrix, refined, (1, 0), max_run)?;
        let module_size = (hit.module_size + v_unit + h_unit) / 3.0;
        Some(FinderPattern::new(cx, cy, module_size))
    }

    fn merge_candidates(candidates: Vec<FinderPattern>) -> Vec<FinderPattern> {
        let mut merged: Vec<FinderPattern> = Vec::new();
        for candidate in candidates {
            match merged.iter_mut().find(|existing| existing.is_near(&candidate)) {
                Some(existing) => existing.absorb(&candidate),
                None => merged.push(candidate),
            }
        }
        merged
    }
}

/// Module size from a 1:1:3:1:1 run set, `None` if the ratios are off
pub(crate) fn check_ratio(lengths: &[usize]) -> Option<f32> {
    if lengths.len() != 5 {
        return None;
    }
    let total: usize = lengths.iter().sum();
    if total < 7 * MIN_MODULE_PX {
        return None;
    }
    let unit = total as f32 / 7.0;
    let tolerance = unit / 2.0;
    let ok = (lengths[0] as f32 - unit).abs() <= tolerance
        && (lengths[1] as f32 - unit).abs() <= tolerance
        && (lengths[2] as f32 - 3.0 * unit).abs() <= unit
        && (lengths[3] as f32 - unit).abs() <= tolerance
        && (lengths[4] as f32 - unit).abs() <= tolerance;
    ok.then_some(unit)
}

// Measure the 1:1:3:1:1 runs through `center` along an axis; returns the refined centre
// coordinate on that axis and the module size
fn cross_check_axis(
    matrix: &BitMatrix,
    center: Point,
    axis: (isize, isize),
    max_run: usize,
) -> Option<(f32, f32)> {
    let x0 = center.x.floor() as isize;
    let y0 = center.y.floor() as isize;
    let at = |i: isize| matrix.get_checked(x0 + axis.0 * i, y0 + axis.1 * i);

    let mut counts = [0usize; 5];
    let mut i = 0isize;
    while at(i) == Some(true) && counts[2] <= max_run * 3 {
        counts[2] += 1;
        i -= 1;
    }
    if counts[2] == 0 {
        return None;
    }
    while at(i) == Some(false) && counts[1] <= max_run {
        counts[1] += 1;
        i -= 1;
    }
    while at(i) == Some(true) && counts[0] <= max_run {
        counts[0] += 1;
        i -= 1;
    }

    let mut j = 1isize;
    while at(j) == Some(true) && counts[2] <= max_run * 3 {
        counts[2] += 1;
        j += 1;
    }
    while at(j) == Some(false) && counts[3] <= max_run {
        counts[3] += 1;
        j += 1;
    }
    while at(j) == Some(true) && counts[4] <= max_run {
        counts[4] += 1;
        j += 1;
    }

    let unit = check_ratio(&counts)?;
    let start = if axis.0 != 0 { x0 } else { y0 };
    let center_end = start + j - counts[4] as isize - counts[3] as isize;
    Some((center_end as f32 - counts[2] as f32 / 2.0, unit))
}

/// Width of the pattern at `center` measured along `direction` (unit vector), divided
/// by seven: dark core, light ring and dark ring on both sides
pub fn module_size_along(matrix: &BitMatrix, center: &Point, direction: (f32, f32)) -> Option<f32> {
    let one_way = |sign: f32| -> Option<f32> {
        let mut state = 0;
        let mut step = 0.0f32;
        let limit = (matrix.width().max(matrix.height())) as f32;
        while step < limit {
            let x = center.x + sign * direction.0 * step;
            let y = center.y + sign * direction.1 * step;
            let dark = matrix.get_checked(x.floor() as isize, y.floor() as isize)?;
            // states: 0 core (dark), 1 ring (light), 2 outer ring (dark)
            let expected_dark = state != 1;
            if dark != expected_dark {
                state += 1;
                if state == 3 {
                    return Some(step);
                }
            }
            step += 1.0;
        }
        None
    };
    let total = one_way(1.0)? + one_way(-1.0)?;
    (total > 0.0).then_some(total / 7.0)
}
