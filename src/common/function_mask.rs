use super::tables::alignment_pattern_positions;
use crate::models::{BitMatrix, Version};

/// Function module map for a specific QR version.
/// true = function module (finder, timing, alignment, format/version area), false = data module.
#[derive(Debug, Clone)]
pub struct FunctionMask {
    mask: BitMatrix,
    version: Version,
}

impl FunctionMask {
    /// Build the map for `version`
    pub fn new(version: Version) -> Self {
        let size = version.size();
        let mut mask = BitMatrix::new(size, size);

        // Finder patterns + separators, widened by one row/column for the format
        // info copies and the dark module
        Self::mark_rect(&mut mask, 0, 0, 9, 9);
        Self::mark_rect(&mut mask, size - 8, 0, 8, 9);
        Self::mark_rect(&mut mask, 0, size - 8, 9, 8);

        // Timing patterns (row 6 and column 6)
        for i in 0..size {
            mask.set(6, i, true);
            mask.set(i, 6, true);
        }

        for (cx, cy) in alignment_centers(version) {
            Self::mark_rect(&mut mask, cx - 2, cy - 2, 5, 5);
        }

        if version.number() >= 7 {
            Self::mark_rect(&mut mask, size - 11, 0, 3, 6);
            Self::mark_rect(&mut mask, 0, size - 11, 6, 3);
        }

        Self { mask, version }
    }

    /// Side length in modules
    pub fn size(&self) -> usize {
        self.mask.width()
    }

    /// Version the map was built for
    pub fn version(&self) -> Version {
        self.version
    }

    /// True if (x, y) is not a data module
    pub fn is_function(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y)
    }

    /// Number of data modules
    pub fn data_modules_count(&self) -> usize {
        let size = self.size();
        size * size - self.mask.count_set()
    }

    /// Data module coordinates in placement order: two-column strips from the right
    /// edge, alternating upward and downward, skipping the vertical timing column.
    pub fn zigzag(&self) -> Vec<(usize, usize)> {
        let size = self.size();
        let mut order = Vec::with_capacity(self.data_modules_count());
        let mut right = size as isize - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            let upward = ((right + 1) & 2) == 0;
            for vert in 0..size {
                let y = if upward { size - 1 - vert } else { vert };
                for dx in 0..2 {
                    let x = (right - dx) as usize;
                    if !self.is_function(x, y) {
                        order.push((x, y));
                    }
                }
            }
            right -= 2;
        }
        order
    }

    fn mark_rect(mask: &mut BitMatrix, x: usize, y: usize, w: usize, h: usize) {
        for yy in y..y + h {
            for xx in x..x + w {
                mask.set(xx, yy, true);
            }
        }
    }
}

/// Alignment pattern centres as (x, y), excluding the three that would overlap finders
pub fn alignment_centers(version: Version) -> Vec<(usize, usize)> {
    let positions = alignment_pattern_positions(version);
    let last = positions.len().saturating_sub(1);
    let mut centers = Vec::new();
    for (i, &cy) in positions.iter().enumerate() {
        for (j, &cx) in positions.iter().enumerate() {
            let corner = (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0);
            if !corner {
                centers.push((cx, cy));
            }
        }
    }
    centers
}

/// Module coordinates (x, y) of format bit `i` (bit 0 = least significant) for both
/// copies: the first wraps the top-left finder, the second is split between the
/// top-right and bottom-left finders
pub fn format_positions(size: usize) -> [[(usize, usize); 15]; 2] {
    let mut first = [(0, 0); 15];
    let mut second = [(0, 0); 15];
    for i in 0..15 {
        first[i] = match i {
            0..=5 => (8, i),
            6 => (8, 7),
            7 => (8, 8),
            8 => (7, 8),
            _ => (14 - i, 8),
        };
        second[i] = if i < 8 {
            (size - 1 - i, 8)
        } else {
            (8, size - 15 + i)
        };
    }
    [first, second]
}

/// Module coordinates (x, y) of version bit `i` for the top-right and bottom-left
/// 6x3 blocks (versions 7 and up)
pub fn version_positions(size: usize) -> [[(usize, usize); 18]; 2] {
    let mut top_right = [(0, 0); 18];
    let mut bottom_left = [(0, 0); 18];
    for i in 0..18 {
        let a = size - 11 + i % 3;
        let b = i / 3;
        top_right[i] = (a, b);
        bottom_left[i] = (b, a);
    }
    [top_right, bottom_left]
}
