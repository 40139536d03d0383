//! CSV export of collected scan results
use crate::models::ScanResult;
use serde::Serialize;
use std::io::Write;

/// One exported row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRecord {
    /// Where the result came from (file path, camera label)
    pub source: String,
    /// Payload text (lossy for binary payloads)
    pub data: String,
    /// Inferred content type
    pub content_type: String,
    /// Symbol version
    pub version: u8,
    /// Error correction level
    pub ec_level: String,
    /// Read quality in 0..=1
    pub quality: f32,
    /// Orientation in the source image
    pub orientation: String,
    /// Top-left x
    pub x0: f32,
    /// Top-left y
    pub y0: f32,
    /// Top-right x
    pub x1: f32,
    /// Top-right y
    pub y1: f32,
    /// Bottom-right x
    pub x2: f32,
    /// Bottom-right y
    pub y2: f32,
    /// Bottom-left x
    pub x3: f32,
    /// Bottom-left y
    pub y3: f32,
}

impl ScanRecord {
    /// Flatten a result for export
    pub fn new(source: impl Into<String>, result: &ScanResult) -> Self {
        let [p0, p1, p2, p3] = result.bounds;
        Self {
            source: source.into(),
            data: result.content(),
            content_type: result.content_type.to_string(),
            version: result.version.number(),
            ec_level: result.ec_level.to_string(),
            quality: result.quality,
            orientation: result.orientation.to_string(),
            x0: p0.x,
            y0: p0.y,
            x1: p1.x,
            y1: p1.y,
            x2: p2.x,
            y2: p2.y,
            x3: p3.x,
            y3: p3.y,
        }
    }
}

/// Write records with a header row
pub fn write_csv<W: Write>(records: &[ScanRecord], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ECLevel, MaskPattern, Point, Version};

    #[test]
    fn test_csv_output() {
        let bounds = [
            Point::new(10.0, 10.0),
            Point::new(50.0, 10.0),
            Point::new(50.0, 50.0),
            Point::new(10.0, 50.0),
        ];
        let result = ScanResult::new(
            b"https://example.com, with comma".to_vec(),
            Version::MIN,
            ECLevel::M,
            MaskPattern::Pattern2,
            bounds,
            1,
            4,
        );
        let records = vec![ScanRecord::new("photo.png", &result)];
        let mut out = Vec::new();
        write_csv(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("source,data,content_type,version,ec_level,quality,orientation,x0,y0,x1,y1,x2,y2,x3,y3")
        );
        assert_eq!(
            lines.next(),
            Some("photo.png,\"https://example.com, with comma\",url,1,M,0.75,upright,10.0,10.0,50.0,10.0,50.0,50.0,10.0,50.0")
        );
    }
}
