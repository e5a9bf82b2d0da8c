//! CLI binary for pdf-darkmode.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_darkmode::{
    convert, inspect, ConversionConfig, ConversionProgressCallback, ImageFileFormat,
    InversionMode, OutputFormat, PageSelection, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Wrap `s` in an ANSI SGR sequence (`"32"` green, `"31"` red, `"2"` dim,
/// `"1"` bold, `"36"` cyan).
fn paint(sgr: &str, s: &str) -> String {
    format!("\x1b[{sgr}m{s}\x1b[0m")
}

const SPINNER: &[&str] = &["◐", "◓", "◑", "◒", "●"];

// ── Terminal progress ────────────────────────────────────────────────────────

/// Drives an indicatif bar from pipeline events.
///
/// Pages arrive strictly one after another, so only the page in flight is
/// timed.
struct CliProgressCallback {
    bar: ProgressBar,
    current: Mutex<Option<(usize, Instant)>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(SPINNER),
        );
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(100));
        Arc::new(Self {
            bar,
            current: Mutex::new(None),
        })
    }

    /// Seconds spent on `page_num`, if it is the page in flight.
    fn finish_page(&self, page_num: usize) -> f64 {
        match self.current.lock().ok().and_then(|mut c| c.take()) {
            Some((n, started)) if n == page_num => started.elapsed().as_secs_f64(),
            _ => 0.0,
        }
    }

    fn page_line(&self, mark: String, page_num: usize, total: usize, detail: String, secs: f64) {
        self.bar.println(format!(
            "  {mark} page {page_num}/{total}  {detail}  {}",
            paint("2", &format!("{secs:.1}s"))
        ));
        self.bar.inc(1);
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{bar:40.green/238}] {pos}/{len}  {msg}  ETA {eta}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸ ")
            .tick_strings(SPINNER),
        );
        self.bar.reset_eta();
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut c) = self.current.lock() {
            *c = Some((page_num, Instant::now()));
        }
        self.bar.set_message(format!("inverting page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, width: u32, height: u32) {
        let secs = self.finish_page(page_num);
        let size = paint("2", &format!("{width}x{height} px"));
        self.page_line(paint("32", "✓"), page_num, total, size, secs);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let secs = self.finish_page(page_num);
        let mut detail: String = error.chars().take(80).collect();
        if detail.len() < error.len() {
            detail.push('…');
        }
        self.page_line(paint("31", "✗"), page_num, total, paint("31", &detail), secs);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let skipped = total_pages - success_count.min(total_pages);
        let mark = match skipped {
            0 => paint("32", "✔"),
            n if n == total_pages => paint("31", "✘"),
            _ => paint("36", "⚠"),
        };
        eprintln!(
            "{mark} {}/{total_pages} pages inverted{}",
            paint("1", &success_count.to_string()),
            if skipped > 0 {
                format!(" ({} skipped)", paint("31", &skipped.to_string()))
            } else {
                String::new()
            }
        );
    }

    fn on_conversion_failed(&self, _error: &str) {
        self.bar.abandon_with_message(paint("31", "conversion aborted"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Writes paper_darkmode.pdf next to paper.pdf
  pdf-darkmode paper.pdf

  # Explicit output and resolution
  pdf-darkmode paper.pdf -o dark.pdf --dpi 150

  # Keep hues (red stays red), only swap light and dark
  pdf-darkmode --mode lightness slides.pdf

  # One PNG per page into slides_darkmode/
  pdf-darkmode --format png slides.pdf

  # Selected pages only
  pdf-darkmode --pages 3-10 book.pdf

  # Inspect PDF metadata
  pdf-darkmode --inspect-only paper.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         pdfium library file or directory
  PDF_DARKMODE_*          fallback for every flag, e.g. PDF_DARKMODE_DPI=150
"#;

/// Convert PDF files to dark mode.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-darkmode",
    version,
    about = "Convert PDF files to dark mode by inverting every page",
    long_about = "Render each page of a PDF with pdfium, invert its colours and write the \
result as a new image-only PDF or as one image per page.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input PDF file.
    input: PathBuf,

    /// Output file (PDF) or directory (png/jpeg). Default: <input>_darkmode.
    #[arg(short, long, env = "PDF_DARKMODE_OUTPUT")]
    output: Option<PathBuf>,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDF_DARKMODE_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Inversion policy.
    #[arg(long, env = "PDF_DARKMODE_MODE", value_enum, default_value = "negate")]
    mode: ModeArg,

    /// Output format.
    #[arg(long, env = "PDF_DARKMODE_FORMAT", value_enum, default_value = "pdf")]
    format: FormatArg,

    /// JPEG quality (1–100) for --format jpeg.
    #[arg(long, env = "PDF_DARKMODE_JPEG_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF_DARKMODE_PAGES", default_value = "all")]
    pages: PageSelection,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_DARKMODE_PASSWORD")]
    password: Option<String>,

    /// Abort on the first page that fails instead of skipping it.
    #[arg(long, env = "PDF_DARKMODE_STRICT")]
    strict: bool,

    /// pdfium library file or directory.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print a JSON report (ConversionOutput) to stdout.
    #[arg(long, env = "PDF_DARKMODE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_DARKMODE_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_DARKMODE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_DARKMODE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Negate,
    Lightness,
}

impl From<ModeArg> for InversionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Negate => InversionMode::Negate,
            ModeArg::Lightness => InversionMode::Lightness,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Pdf,
    Png,
    Jpeg,
}

impl FormatArg {
    fn into_output_format(self, jpeg_quality: u8) -> OutputFormat {
        match self {
            FormatArg::Pdf => OutputFormat::Pdf,
            FormatArg::Png => OutputFormat::Images {
                format: ImageFileFormat::Png,
            },
            FormatArg::Jpeg => OutputFormat::Images {
                format: ImageFileFormat::Jpeg {
                    quality: jpeg_quality,
                },
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None)?;
        let meta = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let progress_cb = progress
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);

    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert(&cli.input, cli.output.as_deref(), &config).await;
    if let (Err(_), Some(p)) = (&result, &progress) {
        // errors before the first page leave the opening spinner running
        if !p.bar.is_finished() {
            p.bar.finish_and_clear();
        }
    }
    let output = match result {
        Ok(output) => output,
        Err(e) if e.is_unreadable_file() => {
            anyhow::bail!("Cannot open '{}': {e}", cli.input.display())
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Conversion of '{}' failed", cli.input.display()))
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        let stats = &output.stats;
        let selected = stats.processed_pages + stats.failed_pages;
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if stats.failed_pages == 0 {
                paint("32", "✔")
            } else {
                paint("36", "⚠")
            },
            stats.processed_pages,
            selected,
            stats.total_duration_ms,
            paint("1", &output.output_path.display().to_string()),
        );
        for e in output.page_errors() {
            eprintln!("   {} {}", paint("31", "✗"), e);
        }
        eprintln!(
            "   {}",
            paint(
                "2",
                &format!(
                    "render {}ms  /  invert {}ms  /  write {}ms",
                    stats.render_duration_ms, stats.invert_duration_ms, stats.write_duration_ms
                )
            ),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .mode(cli.mode.into())
        .output_format(cli.format.into_output_format(cli.jpeg_quality))
        .pages(cli.pages.clone())
        .skip_failed_pages(!cli.strict);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
