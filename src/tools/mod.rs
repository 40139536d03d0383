//! Helpers for the command-line tool: batch input files and image discovery

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// One payload read from a batch input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// 1-based line number in the source file
    pub line: usize,
    /// Text to encode
    pub payload: String,
    /// Free-form labels from the optional tags column
    pub tags: Vec<String>,
}

/// Read a text or CSV batch file.
///
/// Text files hold one payload per line. CSV files (`.csv` extension) hold the payload in
/// the first column and an optional tags column split on `;` or `,`. Blank lines and lines
/// starting with `#` or `//` are skipped in both.
pub fn read_batch_file(path: &Path) -> io::Result<Vec<BatchEntry>> {
    let content = fs::read_to_string(path)?;
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        parse_csv_batch(&content)
    } else {
        Ok(parse_text_batch(&content))
    }
}

fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') || trimmed.starts_with("//")
}

/// One payload per non-blank, non-comment line
pub fn parse_text_batch(content: &str) -> Vec<BatchEntry> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !is_comment(line))
        .map(|(i, line)| BatchEntry {
            line: i + 1,
            payload: line.trim().to_string(),
            tags: Vec::new(),
        })
        .collect()
}

/// Payload in column one, optional tags in column two
pub fn parse_csv_batch(content: &str) -> io::Result<Vec<BatchEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(io::Error::other)?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let Some(payload) = record.get(0) else {
            continue;
        };
        if payload.trim().is_empty() || is_comment(payload) {
            continue;
        }
        let tags = record
            .get(1)
            .map(|column| {
                column
                    .split([';', ','])
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        entries.push(BatchEntry {
            line,
            payload: payload.trim().to_string(),
            tags,
        });
    }
    Ok(entries)
}

/// Image files at `root`, or under it when it is a directory, sorted by path
pub fn collect_images(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if has_image_extension(&path) {
                images.push(path);
            }
        }
    }

    images.sort();
    images
}

fn has_image_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        let ext = ext.to_string_lossy().to_lowercase();
        IMAGE_EXTENSIONS.contains(&ext.as_str())
    })
}

/// File name for batch item `index`, e.g. `qr_0007.png`
pub fn output_name(index: usize) -> String {
    format!("qr_{index:04}.png")
}
