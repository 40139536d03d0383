//! Continuous scanning over a pulled sequence of frames
//!
//! One frame is in flight at a time. Every `frame_stride`-th frame is scanned, frames
//! wider than `max_frame_width` are downscaled first, and a payload already emitted
//! within the suppression window is not emitted again. The loop ends when the source
//! runs dry or the session timeout passes.

use super::{ScanOptions, scan_image};
use crate::config::ToolkitConfig;
use crate::detector::PreparedImage;
use crate::models::ScanResult;
use image::DynamicImage;
use image::imageops::FilterType;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Produces frames on demand; `None` ends the stream
pub trait FrameSource {
    /// Block until the next frame is available
    fn next_frame(&mut self) -> Option<DynamicImage>;
}

/// Adapts any iterator of frames
pub struct IterSource<I>(pub I);

impl<I: Iterator<Item = DynamicImage>> FrameSource for IterSource<I> {
    fn next_frame(&mut self) -> Option<DynamicImage> {
        self.0.next()
    }
}

/// Monotonic time source
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Wall clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Camera loop settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOptions {
    /// Scan every Nth frame
    pub frame_stride: usize,
    /// Same payload is not re-emitted within this window
    pub suppression_window: Duration,
    /// The loop stops after this long
    pub session_timeout: Duration,
    /// Frames wider than this are downscaled
    pub max_frame_width: u32,
    /// Per-frame scan limits
    pub scan: ScanOptions,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self::from(&ToolkitConfig::default())
    }
}

impl From<&ToolkitConfig> for CameraOptions {
    fn from(config: &ToolkitConfig) -> Self {
        Self {
            frame_stride: config.camera.frame_stride.max(1),
            suppression_window: Duration::from_millis(config.camera.suppression_window_ms),
            session_timeout: Duration::from_secs(config.camera.session_timeout_secs),
            max_frame_width: config.camera.max_frame_width,
            scan: ScanOptions::from(&config.scan),
        }
    }
}

/// Lazy sequence of de-duplicated results from a frame source
pub struct CameraScanner<S, C = SystemClock> {
    source: S,
    clock: C,
    options: CameraOptions,
    started: Option<Duration>,
    frames_seen: usize,
    last_emitted: HashMap<Vec<u8>, Duration>,
    pending: VecDeque<ScanResult>,
    finished: bool,
}

impl<S: FrameSource> CameraScanner<S, SystemClock> {
    /// Scanner on the wall clock
    pub fn new(source: S, options: CameraOptions) -> Self {
        Self::with_clock(source, SystemClock::default(), options)
    }
}

impl<S: FrameSource, C: Clock> CameraScanner<S, C> {
    /// Scanner on an injected clock
    pub fn with_clock(source: S, clock: C, options: CameraOptions) -> Self {
        Self {
            source,
            clock,
            options,
            started: None,
            frames_seen: 0,
            last_emitted: HashMap::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Frames pulled from the source so far
    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    fn is_suppressed(&self, payload: &[u8], now: Duration) -> bool {
        self.last_emitted
            .get(payload)
            .is_some_and(|&at| now.saturating_sub(at) < self.options.suppression_window)
    }

    fn scan_frame(&mut self, frame: &DynamicImage) {
        let prepared = prepare_frame(frame, self.options.max_frame_width);
        let results = match scan_image(&prepared, &self.options.scan) {
            Ok(results) => results,
            Err(err) => {
                debug!(frame = self.frames_seen, %err, "nothing decoded");
                return;
            }
        };
        let now = self.clock.now();
        for result in results {
            if self.is_suppressed(&result.payload, now) {
                continue;
            }
            self.last_emitted.insert(result.payload.clone(), now);
            self.pending.push_back(result);
        }
    }
}

impl<S: FrameSource, C: Clock> Iterator for CameraScanner<S, C> {
    type Item = ScanResult;

    fn next(&mut self) -> Option<ScanResult> {
        loop {
            if let Some(result) = self.pending.pop_front() {
                return Some(result);
            }
            if self.finished {
                return None;
            }
            let now = self.clock.now();
            let started = *self.started.get_or_insert(now);
            if now.saturating_sub(started) >= self.options.session_timeout {
                info!(frames = self.frames_seen, "camera session timed out");
                self.finished = true;
                continue;
            }
            let Some(frame) = self.source.next_frame() else {
                self.finished = true;
                continue;
            };
            self.frames_seen += 1;
            if self.frames_seen % self.options.frame_stride != 0 {
                continue;
            }
            self.scan_frame(&frame);
        }
    }
}

/// Grayscale frame, downscaled to `max_width` when wider
pub(crate) fn prepare_frame(frame: &DynamicImage, max_width: u32) -> PreparedImage {
    if max_width > 0 && frame.width() > max_width {
        let height = (frame.height() as u64 * max_width as u64 / frame.width() as u64).max(1);
        let scaled = frame.resize_exact(max_width, height as u32, FilterType::Triangle);
        PreparedImage::from_dynamic(&scaled)
    } else {
        PreparedImage::from_dynamic(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use crate::models::{EncodingRequest, StyleSpec};
    use crate::render::render;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct ManualClock(Rc<Cell<Duration>>);

    impl ManualClock {
        fn advance(&self, by: Duration) {
            self.0.set(self.0.get() + by);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Duration {
            self.0.get()
        }
    }

    // Hands out `remaining` copies of a frame, advancing the clock by `step` on each
    struct RepeatSource {
        frame: DynamicImage,
        remaining: usize,
        clock: ManualClock,
        step: Duration,
    }

    impl FrameSource for RepeatSource {
        fn next_frame(&mut self) -> Option<DynamicImage> {
            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;
            self.clock.advance(self.step);
            Some(self.frame.clone())
        }
    }

    fn qr_frame(text: &str) -> DynamicImage {
        let symbol = encode(&EncodingRequest::new(text)).unwrap();
        let out = render(&symbol, &StyleSpec::default(), 4, 4).unwrap();
        DynamicImage::ImageRgba8(out.image)
    }

    fn scanner(
        frame: DynamicImage,
        frames: usize,
        step_ms: u64,
        options: CameraOptions,
    ) -> CameraScanner<RepeatSource, ManualClock> {
        let clock = ManualClock::default();
        let source = RepeatSource {
            frame,
            remaining: frames,
            clock: clock.clone(),
            step: Duration::from_millis(step_ms),
        };
        CameraScanner::with_clock(source, clock, options)
    }

    fn every_frame() -> CameraOptions {
        CameraOptions {
            frame_stride: 1,
            ..CameraOptions::default()
        }
    }

    #[test]
    fn test_repeated_payload_is_emitted_once_within_window() {
        let results: Vec<_> = scanner(qr_frame("same code"), 20, 100, every_frame()).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].payload, b"same code");
    }

    #[test]
    fn test_payload_is_emitted_again_after_window() {
        // Scans at 0.5 s steps; emissions at 0.5, 2.5 and 4.5 s
        let results: Vec<_> = scanner(qr_frame("again"), 10, 500, every_frame()).collect();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_stride_skips_frames() {
        let options = CameraOptions {
            frame_stride: 5,
            ..CameraOptions::default()
        };
        let mut cam = scanner(qr_frame("stride"), 4, 10, options);
        assert!(cam.next().is_none());
        assert_eq!(cam.frames_seen(), 4);
    }

    #[test]
    fn test_session_timeout_ends_loop() {
        let blank = DynamicImage::new_luma8(32, 32);
        let options = CameraOptions {
            frame_stride: 1,
            session_timeout: Duration::from_secs(1),
            ..CameraOptions::default()
        };
        let mut cam = scanner(blank, usize::MAX, 500, options);
        assert!(cam.next().is_none());
        assert_eq!(cam.frames_seen(), 2);
    }

    #[test]
    fn test_wide_frames_are_downscaled() {
        let prepared = prepare_frame(&DynamicImage::new_luma8(1600, 1200), 800);
        assert_eq!((prepared.width(), prepared.height()), (800, 600));
        let prepared = prepare_frame(&DynamicImage::new_luma8(640, 480), 800);
        assert_eq!(prepared.width(), 640);
    }
}
