//! Work items, per-item results and the built-in processors

use crate::error::{BatchError, ItemError};
use crate::models::{EncodingRequest, QrSymbol, ScanResult, StyleSpec};
use crate::render::{RenderWarning, render};
use crate::scanner::{ScanOptions, scan_image, scan_path};
use crate::detector::PreparedImage;
use crate::encoder::encode;
use image::{DynamicImage, RgbaImage};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Identifies a submitted job
pub type JobId = u64;

/// Lifecycle of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Submitted; no item has started yet
    Pending,
    /// At least one item has started and some are not finished
    Running,
    /// Every item reached a terminal state without a cancel
    Completed,
    /// Cancelled; every item is terminal
    Cancelled,
}

/// One unit of batch work
#[derive(Debug, Clone)]
pub enum WorkItem {
    /// Encode and render
    Encode {
        /// What to encode
        request: EncodingRequest,
        /// How to render it
        style: StyleSpec,
    },
    /// Scan an image file
    DecodePath(PathBuf),
    /// Scan an in-memory image
    DecodeImage(DynamicImage),
}

/// Output of an encode item
#[derive(Debug, Clone)]
pub struct EncodeOutput {
    /// The symbol
    pub symbol: QrSymbol,
    /// Rendered raster
    pub image: RgbaImage,
    /// Non-fatal render problems
    pub warnings: Vec<RenderWarning>,
}

/// Output of a successful item
#[derive(Debug, Clone)]
pub enum ItemOutput {
    /// From [`EncodeProcessor`]
    Encoded(Box<EncodeOutput>),
    /// From [`DecodeProcessor`]
    Scanned(Vec<ScanResult>),
    /// From custom processors
    Custom(String),
}

/// Terminal result held in an item slot
pub type ItemResult = Result<ItemOutput, BatchError>;

/// Cooperative stop point handed to processors
#[derive(Debug, Clone)]
pub struct Checkpoint {
    cancel: Arc<AtomicBool>,
    deadline: Instant,
}

impl Checkpoint {
    /// Checkpoint observing `cancel` and expiring at `deadline`
    pub fn new(cancel: Arc<AtomicBool>, deadline: Instant) -> Self {
        Self { cancel, deadline }
    }

    /// `Err(Cancelled)` once the job is cancelled, `Err(Timeout)` past the deadline
    pub fn check(&self) -> Result<(), ItemError> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(ItemError::Cancelled);
        }
        if Instant::now() > self.deadline {
            return Err(ItemError::Timeout);
        }
        Ok(())
    }
}

/// A job function applied to each item
pub trait ItemProcessor: Send + Sync {
    /// Process item `index`, calling `checkpoint.check()` between stages
    fn process(
        &self,
        index: usize,
        item: &WorkItem,
        checkpoint: &Checkpoint,
    ) -> Result<ItemOutput, ItemError>;
}

/// Encodes and renders `WorkItem::Encode` items
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeProcessor;

impl ItemProcessor for EncodeProcessor {
    fn process(
        &self,
        _index: usize,
        item: &WorkItem,
        checkpoint: &Checkpoint,
    ) -> Result<ItemOutput, ItemError> {
        let WorkItem::Encode { request, style } = item else {
            return Err(ItemError::Unsupported("encode processor needs an encode item"));
        };
        checkpoint.check()?;
        let symbol = encode(request)?;
        checkpoint.check()?;
        let rendered = render(&symbol, style, request.module_size, request.border)?;
        Ok(ItemOutput::Encoded(Box::new(EncodeOutput {
            symbol,
            image: rendered.image,
            warnings: rendered.warnings,
        })))
    }
}

/// Scans image items; an image with no symbol is `NotFound`
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeProcessor {
    /// Per-image scan limits
    pub options: ScanOptions,
}

impl ItemProcessor for DecodeProcessor {
    fn process(
        &self,
        _index: usize,
        item: &WorkItem,
        checkpoint: &Checkpoint,
    ) -> Result<ItemOutput, ItemError> {
        checkpoint.check()?;
        let results = match item {
            WorkItem::DecodePath(path) => scan_path(path, &self.options)?,
            WorkItem::DecodeImage(image) => {
                let prepared = PreparedImage::from_dynamic(image);
                checkpoint.check()?;
                scan_image(&prepared, &self.options)?
            }
            WorkItem::Encode { .. } => {
                return Err(ItemError::Unsupported("decode processor needs an image item"));
            }
        };
        Ok(ItemOutput::Scanned(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use std::time::Duration;

    fn open_checkpoint() -> Checkpoint {
        Checkpoint::new(
            Arc::new(AtomicBool::new(false)),
            Instant::now() + Duration::from_secs(60),
        )
    }

    #[test]
    fn test_checkpoint_states() {
        let flag = Arc::new(AtomicBool::new(false));
        let cp = Checkpoint::new(flag.clone(), Instant::now() + Duration::from_secs(60));
        assert_eq!(cp.check(), Ok(()));
        flag.store(true, Ordering::SeqCst);
        assert_eq!(cp.check(), Err(ItemError::Cancelled));

        let expired = Checkpoint::new(Arc::new(AtomicBool::new(false)), Instant::now());
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(expired.check(), Err(ItemError::Timeout));
    }

    #[test]
    fn test_encode_processor() {
        let item = WorkItem::Encode {
            request: EncodingRequest::new("batch item").with_module_size(3),
            style: StyleSpec::default(),
        };
        let out = EncodeProcessor.process(0, &item, &open_checkpoint()).unwrap();
        let ItemOutput::Encoded(encoded) = out else {
            panic!("expected encoded output");
        };
        let side = (encoded.symbol.size() as u32 + 8) * 3;
        assert_eq!(encoded.image.dimensions(), (side, side));
    }

    #[test]
    fn test_processor_rejects_wrong_item() {
        let item = WorkItem::DecodePath(PathBuf::from("x.png"));
        assert!(matches!(
            EncodeProcessor.process(0, &item, &open_checkpoint()),
            Err(ItemError::Unsupported(_))
        ));
    }

    #[test]
    fn test_decode_processor_blank_image() {
        let item = WorkItem::DecodeImage(DynamicImage::new_luma8(40, 40));
        let err = DecodeProcessor::default().process(0, &item, &open_checkpoint());
        assert_eq!(err.unwrap_err(), ItemError::Decode(DecodeError::NotFound));
    }
}
