use clap::{Parser, Subcommand};
use qr_toolkit::batch::{BatchCoordinator, BatchMode, ItemOutput, WorkItem};
use qr_toolkit::config::ToolkitConfig;
use qr_toolkit::models::{
    Color, ECLevel, EncodingRequest, Logo, StyleSpec, Version,
};
use qr_toolkit::scanner::export::{ScanRecord, write_csv};
use qr_toolkit::scanner::{ScanOptions, scan_path};
use qr_toolkit::tools::{collect_images, output_name, read_batch_file};
use std::error::Error;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "qrtool", version, about = "QR code generation and scanning")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode one payload into a PNG
    Encode {
        /// Text to encode
        text: String,
        #[arg(long, short)]
        out: PathBuf,
        /// Error correction level (L, M, Q, H)
        #[arg(long)]
        ec: Option<String>,
        /// Fixed version 1-40
        #[arg(long)]
        version: Option<u8>,
        #[arg(long)]
        module_size: Option<u32>,
        #[arg(long)]
        border: Option<u32>,
        /// Foreground colour, #RGB or #RRGGBB
        #[arg(long)]
        fg: Option<String>,
        /// Background colour, #RGB or #RRGGBB
        #[arg(long)]
        bg: Option<String>,
        /// Image placed over the symbol centre
        #[arg(long)]
        logo: Option<PathBuf>,
    },
    /// Scan an image, or every image under a directory
    Scan {
        path: PathBuf,
        /// Write results as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Encode every payload of a text or CSV file
    BatchEncode {
        input: PathBuf,
        #[arg(long, short)]
        out_dir: PathBuf,
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Scan every image under a directory concurrently
    BatchScan {
        root: PathBuf,
        #[arg(long)]
        concurrency: Option<usize>,
        /// Write results as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

fn init_logger() {
    let filter = std::env::var("QR_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter_layer)
        .init();
}

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult {
    let config = ToolkitConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Encode {
            text,
            out,
            ec,
            version,
            module_size,
            border,
            fg,
            bg,
            logo,
        } => {
            let mut request = base_request(&config, text);
            if let Some(ec) = ec {
                let level = ECLevel::parse(&ec).ok_or_else(|| format!("unknown EC level '{ec}'"))?;
                request = request.with_ec_level(level);
            }
            if let Some(v) = version {
                let v = Version::new(v).ok_or_else(|| format!("version {v} outside 1-40"))?;
                request = request.with_fixed_version(v);
            }
            if let Some(size) = module_size {
                request = request.with_module_size(size);
            }
            if let Some(border) = border {
                request = request.with_border(border);
            }
            let mut style = config.style()?;
            if let Some(fg) = fg {
                style.foreground = Color::from_hex(&fg)?;
            }
            if let Some(bg) = bg {
                style.background = Color::from_hex(&bg)?;
            }
            if let Some(path) = logo {
                style = style.with_logo(Logo::new(image::open(path)?.to_rgba8()));
            }
            encode_cmd(&request, &style, &out)
        }
        Command::Scan { path, csv } => scan_cmd(&config, &path, csv.as_deref()),
        Command::BatchEncode {
            input,
            out_dir,
            concurrency,
        } => batch_encode_cmd(&config, &input, &out_dir, concurrency),
        Command::BatchScan {
            root,
            concurrency,
            csv,
        } => batch_scan_cmd(&config, &root, concurrency, csv.as_deref()),
    }
}

fn base_request(config: &ToolkitConfig, text: String) -> EncodingRequest {
    EncodingRequest::new(text)
        .with_ec_level(config.encode.ec_level)
        .with_module_size(config.encode.module_size)
        .with_border(config.encode.border)
}

fn encode_cmd(
    request: &EncodingRequest,
    style: &StyleSpec,
    out: &Path,
) -> CliResult {
    let symbol = qr_toolkit::encode(request)?;
    let rendered = qr_toolkit::render(&symbol, style, request.module_size, request.border)?;
    for warning in &rendered.warnings {
        warn!(%warning, "render warning");
    }
    rendered.image.save(out)?;
    println!(
        "{}: version {} level {} mask {} ({}x{} px)",
        out.display(),
        symbol.version(),
        symbol.ec_level(),
        symbol.mask().index(),
        rendered.image.width(),
        rendered.image.height()
    );
    Ok(())
}

fn scan_cmd(config: &ToolkitConfig, path: &Path, csv: Option<&Path>) -> CliResult {
    let options = ScanOptions::from(&config.scan);
    let images = collect_images(path);
    if images.is_empty() {
        return Err(format!("no images found at {}", path.display()).into());
    }
    let mut records = Vec::new();
    for image in &images {
        let start = Instant::now();
        match scan_path(image, &options) {
            Ok(results) => {
                println!(
                    "{}: {} code(s) in {:.1} ms",
                    image.display(),
                    results.len(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                for result in &results {
                    println!(
                        "  [{}] v{} {} {}",
                        result.content_type,
                        result.version,
                        result.ec_level,
                        result.content()
                    );
                    records.push(ScanRecord::new(image.display().to_string(), result));
                }
            }
            Err(err) => println!("{}: {}", image.display(), err),
        }
    }
    if let Some(csv) = csv {
        write_csv(&records, File::create(csv)?)?;
        info!(rows = records.len(), path = %csv.display(), "csv written");
    }
    Ok(())
}

fn batch_encode_cmd(
    config: &ToolkitConfig,
    input: &Path,
    out_dir: &Path,
    concurrency: Option<usize>,
) -> CliResult {
    let entries = read_batch_file(input)?;
    fs::create_dir_all(out_dir)?;
    let style = config.style()?;
    let items = entries
        .iter()
        .map(|entry| WorkItem::Encode {
            request: base_request(config, entry.payload.clone()),
            style: style.clone(),
        })
        .collect();

    let coordinator = BatchCoordinator::new(config.batch.clone());
    let job = coordinator.submit(items, BatchMode::Encode, concurrency)?;
    let report = coordinator.await_completion(job)?;

    for (index, output) in report.successes() {
        if let ItemOutput::Encoded(encoded) = output {
            let path = out_dir.join(output_name(index));
            encoded.image.save(&path)?;
        }
    }
    for (index, err) in report.failures() {
        println!("line {}: {}", entries[index].line, err);
    }
    println!(
        "{} of {} encoded into {}",
        report.success_count(),
        report.results.len(),
        out_dir.display()
    );
    Ok(())
}

fn batch_scan_cmd(
    config: &ToolkitConfig,
    root: &Path,
    concurrency: Option<usize>,
    csv: Option<&Path>,
) -> CliResult {
    let images = collect_images(root);
    let items = images.iter().cloned().map(WorkItem::DecodePath).collect();
    let coordinator = BatchCoordinator::new(config.batch.clone());
    let mode = BatchMode::Decode(ScanOptions::from(&config.scan));
    let start = Instant::now();
    let job = coordinator.submit(items, mode, concurrency)?;
    let report = coordinator.await_completion(job)?;

    let mut records = Vec::new();
    for (index, output) in report.successes() {
        if let ItemOutput::Scanned(results) = output {
            let source = images[index].display().to_string();
            records.extend(results.iter().map(|r| ScanRecord::new(source.clone(), r)));
        }
    }
    for (index, err) in report.failures() {
        println!("{}: {}", images[index].display(), err);
    }
    println!(
        "{} of {} images decoded ({} codes) in {:.2} s",
        report.success_count(),
        images.len(),
        records.len(),
        start.elapsed().as_secs_f64()
    );
    if let Some(csv) = csv {
        write_csv(&records, File::create(csv)?)?;
    }
    Ok(())
}
