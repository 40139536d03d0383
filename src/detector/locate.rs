//! Candidate region search: prepared image in, lazily produced symbol regions out

use super::alignment::{bottom_right_alignment, find_alignment_center};
use super::finder::{FinderDetector, FinderPattern};
use super::grouping::{Triad, candidate_triads, order_triad};
use super::timing::timing_is_valid;
use super::transform::sample_grid;
use crate::models::{BitMatrix, Point, Version};
use crate::utils::binarization::{adaptive_binarize, adaptive_window, otsu_binarize};
use crate::utils::geometry::PerspectiveTransform;
use crate::utils::grayscale::{rgb_to_grayscale, rgba_to_grayscale};
use std::sync::OnceLock;
use tracing::debug;

/// Images with a side at least this long use the adaptive threshold first
pub const ADAPTIVE_MIN_SIDE: usize = 800;

/// Default cap on triads tried per image
pub const DEFAULT_MAX_REGIONS: usize = 40;

const ADAPTIVE_OFFSET: u8 = 10;

/// A grayscale image with its binarization, ready for region search
#[derive(Debug)]
pub struct PreparedImage {
    width: usize,
    height: usize,
    gray: Vec<u8>,
    binary: BitMatrix,
    fallback: OnceLock<BitMatrix>,
}

impl PreparedImage {
    /// From 8-bit luma, row-major. Missing pixels read as white.
    pub fn from_luma(mut gray: Vec<u8>, width: usize, height: usize) -> Self {
        gray.resize(width * height, 255);
        let binary = if uses_adaptive(width, height) {
            adaptive_binarize(&gray, width, height, adaptive_window(width, height), ADAPTIVE_OFFSET)
        } else {
            otsu_binarize(&gray, width, height)
        };
        Self {
            width,
            height,
            gray,
            binary,
            fallback: OnceLock::new(),
        }
    }

    /// From packed RGBA bytes
    pub fn from_rgba(rgba: &[u8], width: usize, height: usize) -> Self {
        Self::from_luma(rgba_to_grayscale(rgba, width, height), width, height)
    }

    /// From packed RGB bytes
    pub fn from_rgb(rgb: &[u8], width: usize, height: usize) -> Self {
        Self::from_luma(rgb_to_grayscale(rgb, width, height), width, height)
    }

    /// From any decoded `image` buffer
    pub fn from_dynamic(image: &image::DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (w, h) = rgba.dimensions();
        Self::from_rgba(rgba.as_raw(), w as usize, h as usize)
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Grayscale pixels
    pub fn gray(&self) -> &[u8] {
        &self.gray
    }

    /// Primary binarization (true = dark)
    pub fn binary(&self) -> &BitMatrix {
        &self.binary
    }

    /// The other thresholding method, computed on first use
    pub fn fallback_binary(&self) -> &BitMatrix {
        self.fallback.get_or_init(|| {
            if uses_adaptive(self.width, self.height) {
                otsu_binarize(&self.gray, self.width, self.height)
            } else {
                adaptive_binarize(
                    &self.gray,
                    self.width,
                    self.height,
                    adaptive_window(self.width, self.height),
                    ADAPTIVE_OFFSET,
                )
            }
        })
    }
}

fn uses_adaptive(width: usize, height: usize) -> bool {
    width >= ADAPTIVE_MIN_SIDE || height >= ADAPTIVE_MIN_SIDE
}

/// Finds candidate symbol regions in prepared images
#[derive(Debug, Clone, Copy)]
pub struct Locator {
    max_regions: usize,
}

impl Default for Locator {
    fn default() -> Self {
        Self {
            max_regions: DEFAULT_MAX_REGIONS,
        }
    }
}

impl Locator {
    /// Locator trying at most `max_regions` finder triads per image
    pub fn new(max_regions: usize) -> Self {
        Self {
            max_regions: max_regions.max(1),
        }
    }

    /// Lazy sequence of candidate regions. Nothing is computed until the first `next()`.
    pub fn locate<'a>(&self, image: &'a PreparedImage) -> Regions<'a> {
        Regions {
            image,
            max_regions: self.max_regions,
            search: None,
        }
    }
}

struct Search<'a> {
    binary: &'a BitMatrix,
    patterns: Vec<FinderPattern>,
    triads: std::vec::IntoIter<[usize; 3]>,
}

/// Iterator over the regions of one image
pub struct Regions<'a> {
    image: &'a PreparedImage,
    max_regions: usize,
    search: Option<Search<'a>>,
}

impl<'a> Regions<'a> {
    fn start(&self) -> Search<'a> {
        let mut binary = self.image.binary();
        let mut patterns = FinderDetector::detect(binary);
        if patterns.len() < 3 {
            let fallback = self.image.fallback_binary();
            let fallback_patterns = FinderDetector::detect(fallback);
            debug!(
                primary = patterns.len(),
                fallback = fallback_patterns.len(),
                "few finder patterns, trying fallback binarization"
            );
            if fallback_patterns.len() > patterns.len() {
                binary = fallback;
                patterns = fallback_patterns;
            }
        }
        let triads = candidate_triads(&patterns, self.max_regions);
        debug!(
            finders = patterns.len(),
            triads = triads.len(),
            "finder search complete"
        );
        Search {
            binary,
            patterns,
            triads: triads.into_iter(),
        }
    }
}

impl<'a> Iterator for Regions<'a> {
    type Item = Region<'a>;

    fn next(&mut self) -> Option<Region<'a>> {
        if self.search.is_none() {
            self.search = Some(self.start());
        }
        let search = self.search.as_mut()?;
        for group in search.triads.by_ref() {
            let [a, b, c] = group;
            let ps = &search.patterns;
            let Some(triad) = order_triad(search.binary, [&ps[a], &ps[b], &ps[c]]) else {
                continue;
            };
            if let Some(region) = Region::from_triad(search.binary, &triad) {
                return Some(region);
            }
        }
        None
    }
}

/// A located symbol: finder geometry plus the module-to-image transform
#[derive(Debug, Clone)]
pub struct Region<'a> {
    binary: &'a BitMatrix,
    /// Top-left finder centre
    pub top_left: Point,
    /// Top-right finder centre
    pub top_right: Point,
    /// Bottom-left finder centre
    pub bottom_left: Point,
    /// Bottom-right reference point (alignment-corrected when available)
    pub bottom_right: Point,
    /// Module size in pixels
    pub module_size: f32,
    /// Side length in modules
    pub dimension: usize,
    transform: PerspectiveTransform,
}

impl<'a> Region<'a> {
    fn from_triad(binary: &'a BitMatrix, triad: &Triad) -> Option<Self> {
        let estimated = triad.dimension;
        // Module size error on skewed symbols can push the estimate one version off
        let tries = [estimated, estimated + 4, estimated.saturating_sub(4)];
        tries.into_iter().find_map(|dimension| {
            let region = Self::build(binary, triad, dimension)?;
            timing_is_valid(binary, &region.transform, dimension).then_some(region)
        })
    }

    fn build(binary: &'a BitMatrix, triad: &Triad, dimension: usize) -> Option<Self> {
        let version = Version::from_size(dimension)?;
        let (tl, tr, bl) = (triad.top_left, triad.top_right, triad.bottom_left);
        let estimate = Point::new(tr.x + bl.x - tl.x, tr.y + bl.y - tl.y);
        let mut transform = PerspectiveTransform::module_to_image(dimension, tl, tr, estimate, bl)?;

        if let Some(module_point) = bottom_right_alignment(version) {
            if let Some(found) =
                find_alignment_center(binary, &transform, module_point, triad.module_size)
            {
                let far = dimension as f32 - 3.5;
                let src = [
                    Point::new(3.5, 3.5),
                    Point::new(far, 3.5),
                    module_point,
                    Point::new(3.5, far),
                ];
                if let Some(refined) = PerspectiveTransform::from_points(&src, &[tl, tr, found, bl])
                {
                    transform = refined;
                }
            }
        }

        let far = dimension as f32 - 3.5;
        let bottom_right = transform.transform(&Point::new(far, far));
        if !bottom_right.x.is_finite() || !bottom_right.y.is_finite() {
            return None;
        }
        Some(Self {
            binary,
            top_left: tl,
            top_right: tr,
            bottom_left: bl,
            bottom_right,
            module_size: triad.module_size,
            dimension,
            transform,
        })
    }

    /// The same finders re-gridded at another side length
    pub fn with_dimension(&self, dimension: usize) -> Option<Self> {
        let triad = Triad {
            top_left: self.top_left,
            top_right: self.top_right,
            bottom_left: self.bottom_left,
            module_size: self.module_size,
            dimension,
        };
        Self::build(self.binary, &triad, dimension)
    }

    /// Module grid sampled from the binary image (true = dark)
    pub fn sample(&self) -> BitMatrix {
        sample_grid(self.binary, &self.transform, self.dimension, self.module_size)
    }

    /// Outer corners of the symbol in image coordinates (TL, TR, BR, BL)
    pub fn bounds(&self) -> [Point; 4] {
        let d = self.dimension as f32;
        [
            Point::new(0.0, 0.0),
            Point::new(d, 0.0),
            Point::new(d, d),
            Point::new(0.0, d),
        ]
        .map(|p| self.transform.transform(&p))
    }

    /// Module-to-image mapping
    pub fn transform(&self) -> &PerspectiveTransform {
        &self.transform
    }
}
