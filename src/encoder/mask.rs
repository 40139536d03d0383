use super::placement::write_format;
use crate::common::FunctionMask;
use crate::models::{MaskPattern, QrSymbol};
use tracing::debug;

const PENALTY_N1: u32 = 3;
const PENALTY_N2: u32 = 3;
const PENALTY_N3: u32 = 40;
const PENALTY_N4: u32 = 10;

/// XOR the mask over every data module; applying it twice restores the symbol
pub fn apply_mask(symbol: &mut QrSymbol, func: &FunctionMask, mask: MaskPattern) {
    let size = symbol.size();
    for y in 0..size {
        for x in 0..size {
            if !func.is_function(x, y) && mask.is_masked(y, x) {
                symbol.flip(x, y);
            }
        }
    }
}

/// Lowest-penalty mask; ties go to the lower index
pub fn choose_mask(symbol: &QrSymbol, func: &FunctionMask) -> MaskPattern {
    let mut best = (u32::MAX, MaskPattern::Pattern0);
    for mask in MaskPattern::ALL {
        let mut trial = symbol.clone();
        trial.set_mask(mask);
        apply_mask(&mut trial, func, mask);
        write_format(&mut trial);
        let score = penalty_score(&trial);
        debug!(mask = mask.index(), score, "mask penalty");
        if score < best.0 {
            best = (score, mask);
        }
    }
    best.1
}

/// Total of the four penalty rules
pub fn penalty_score(symbol: &QrSymbol) -> u32 {
    let size = symbol.size();
    let mut result = 0;

    for y in 0..size {
        result += line_penalty(size, |i| symbol.is_dark(i, y));
    }
    for x in 0..size {
        result += line_penalty(size, |i| symbol.is_dark(x, i));
    }

    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let color = symbol.is_dark(x, y);
            if color == symbol.is_dark(x + 1, y)
                && color == symbol.is_dark(x, y + 1)
                && color == symbol.is_dark(x + 1, y + 1)
            {
                result += PENALTY_N2;
            }
        }
    }

    let dark = symbol.rows().flatten().filter(|m| m.is_dark()).count() as i64;
    let total = (size * size) as i64;
    // Smallest k with (45 - 5k)% <= dark <= (55 + 5k)%
    let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
    result + k.max(0) as u32 * PENALTY_N4
}

// Rules N1 (runs of five or more) and N3 (finder-like 1:1:3:1:1 with light margin)
fn line_penalty(size: usize, dark_at: impl Fn(usize) -> bool) -> u32 {
    let mut result = 0;
    let mut run_color = false;
    let mut run_len = 0u32;
    let mut history = RunHistory::new(size as u32);
    for i in 0..size {
        let color = dark_at(i);
        if color == run_color {
            run_len += 1;
            if run_len == 5 {
                result += PENALTY_N1;
            } else if run_len > 5 {
                result += 1;
            }
        } else {
            history.push(run_len);
            if !run_color {
                result += history.count_patterns() * PENALTY_N3;
            }
            run_color = color;
            run_len = 1;
        }
    }
    result + history.terminate_and_count(run_color, run_len) * PENALTY_N3
}

// Last seven run lengths along a line; the light border outside the symbol counts as
// one extra-long light run at each end
struct RunHistory {
    size: u32,
    runs: [u32; 7],
}

impl RunHistory {
    fn new(size: u32) -> Self {
        Self { size, runs: [0; 7] }
    }

    fn push(&mut self, mut run: u32) {
        if self.runs[0] == 0 {
            run += self.size;
        }
        self.runs.copy_within(0..6, 1);
        self.runs[0] = run;
    }

    fn count_patterns(&self) -> u32 {
        let rh = &self.runs;
        let n = rh[1];
        let core = n > 0 && rh[2] == n && rh[3] == n * 3 && rh[4] == n && rh[5] == n;
        u32::from(core && rh[0] >= n * 4 && rh[6] >= n)
            + u32::from(core && rh[6] >= n * 4 && rh[0] >= n)
    }

    fn terminate_and_count(mut self, color: bool, mut run: u32) -> u32 {
        if color {
            self.push(run);
            run = 0;
        }
        self.push(run + self.size);
        self.count_patterns()
    }
}
