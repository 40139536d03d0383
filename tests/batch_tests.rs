use image::DynamicImage;
use qr_toolkit::batch::{
    BatchCoordinator, BatchMode, Checkpoint, ItemOutput, ItemProcessor, JobStatus, WorkItem,
};
use qr_toolkit::config::BatchConfig;
use qr_toolkit::models::{EncodingRequest, StyleSpec};
use qr_toolkit::{BatchError, DecodeError, EncodeError, ItemError, ScanOptions, encode, render};
use std::sync::mpsc::{Sender, channel};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

fn encode_item(request: EncodingRequest) -> WorkItem {
    WorkItem::Encode {
        request,
        style: StyleSpec::default(),
    }
}

#[test]
fn malformed_items_fail_alone() {
    let items: Vec<WorkItem> = (0..8)
        .map(|i| match i {
            2 => encode_item(EncodingRequest::new(vec![b'x'; 4000])),
            5 => encode_item(EncodingRequest::new("zero module").with_module_size(0)),
            _ => encode_item(EncodingRequest::new(format!("item {i}")).with_module_size(2)),
        })
        .collect();

    let coordinator = BatchCoordinator::default();
    let job = coordinator.submit(items, BatchMode::Encode, Some(3)).unwrap();
    let report = coordinator.await_completion(job).unwrap();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.success_count(), 6);
    let failed: Vec<usize> = report.failures().map(|(i, _)| i).collect();
    assert_eq!(failed, [2, 5]);
    assert!(matches!(
        &report.results[2],
        Err(BatchError::ItemFailed(
            2,
            ItemError::Encode(EncodeError::PayloadTooLarge { .. })
        ))
    ));
    assert!(matches!(
        &report.results[5],
        Err(BatchError::ItemFailed(5, ItemError::Encode(EncodeError::InvalidRequest(_))))
    ));
    for (index, output) in report.successes() {
        let ItemOutput::Encoded(encoded) = output else {
            panic!("item {index} is not an encode output");
        };
        let side = (encoded.symbol.size() as u32 + 8) * 2;
        assert_eq!(encoded.image.dimensions(), (side, side), "item {index}");
    }
}

#[test]
fn decode_batch_isolates_unreadable_images() {
    let readable = |text: &str| {
        let symbol = encode(&EncodingRequest::new(text)).unwrap();
        let out = render(&symbol, &StyleSpec::default(), 4, 4).unwrap();
        WorkItem::DecodeImage(DynamicImage::ImageRgba8(out.image))
    };
    let items = vec![
        readable("first"),
        WorkItem::DecodeImage(DynamicImage::new_luma8(64, 64)),
        readable("third"),
        WorkItem::DecodePath("/nonexistent/qr_toolkit/missing.png".into()),
    ];

    let coordinator = BatchCoordinator::default();
    let mode = BatchMode::Decode(ScanOptions::default());
    let job = coordinator.submit(items, mode, Some(2)).unwrap();
    let report = coordinator.await_completion(job).unwrap();

    assert_eq!(report.success_count(), 2);
    match &report.results[2] {
        Ok(ItemOutput::Scanned(results)) => assert_eq!(results[0].payload, b"third"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        report.results[1].as_ref().err(),
        Some(&BatchError::ItemFailed(1, ItemError::Decode(DecodeError::NotFound)))
    );
    assert!(matches!(
        &report.results[3],
        Err(BatchError::ItemFailed(3, ItemError::Image(_)))
    ));
}

/// Reports each start, then holds until the gate opens
struct Gated {
    started: Mutex<Sender<usize>>,
    gate: Arc<(Mutex<bool>, Condvar)>,
}

impl ItemProcessor for Gated {
    fn process(
        &self,
        index: usize,
        _item: &WorkItem,
        checkpoint: &Checkpoint,
    ) -> Result<ItemOutput, ItemError> {
        checkpoint.check()?;
        let _ = self.started.lock().unwrap().send(index);
        let (open, cvar) = &*self.gate;
        let mut open = open.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
        Ok(ItemOutput::Custom(format!("done {index}")))
    }
}

#[test]
fn cancel_keeps_started_results() {
    let (tx, rx) = channel();
    let gate = Arc::new((Mutex::new(false), Condvar::new()));
    let processor = Arc::new(Gated {
        started: Mutex::new(tx),
        gate: Arc::clone(&gate),
    });
    let items: Vec<WorkItem> = (0..10)
        .map(|i| WorkItem::DecodePath(format!("frame-{i}.png").into()))
        .collect();

    let coordinator = BatchCoordinator::default();
    let job = coordinator.submit_with(items, processor, Some(2)).unwrap();

    let mut started = Vec::new();
    for _ in 0..2 {
        started.push(rx.recv_timeout(Duration::from_secs(10)).unwrap());
    }
    let snapshot = coordinator.poll(job).unwrap();
    assert_eq!(snapshot.status, JobStatus::Running);
    assert_eq!(snapshot.running, 2);

    coordinator.cancel(job).unwrap();
    {
        let (open, cvar) = &*gate;
        *open.lock().unwrap() = true;
        cvar.notify_all();
    }
    let report = coordinator.await_completion(job).unwrap();

    assert_eq!(report.status, JobStatus::Cancelled);
    assert_eq!(report.success_count(), 2);
    for index in &started {
        assert!(report.results[*index].is_ok(), "item {index}");
    }
    let cancelled = report
        .failures()
        .filter(|(i, err)| **err == BatchError::ItemFailed(*i, ItemError::Cancelled))
        .count();
    assert_eq!(cancelled, 8);
}

#[test]
fn item_timeout_is_reported_per_item() {
    struct Slow;
    impl ItemProcessor for Slow {
        fn process(
            &self,
            index: usize,
            _item: &WorkItem,
            checkpoint: &Checkpoint,
        ) -> Result<ItemOutput, ItemError> {
            if index == 0 {
                std::thread::sleep(Duration::from_millis(60));
            }
            checkpoint.check()?;
            Ok(ItemOutput::Custom(String::new()))
        }
    }

    let config = BatchConfig {
        concurrency: Some(2),
        item_timeout_ms: 20,
    };
    let coordinator = BatchCoordinator::new(config);
    let items = vec![WorkItem::DecodePath("a.png".into()), WorkItem::DecodePath("b.png".into())];
    let job = coordinator.submit_with(items, Arc::new(Slow), None).unwrap();
    let report = coordinator.await_completion(job).unwrap();
    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(
        report.results[0].as_ref().err(),
        Some(&BatchError::ItemFailed(0, ItemError::Timeout))
    );
    assert!(report.results[1].is_ok());
}
