//! CLI binary for lecture-a11y.
//!
//! A thin shim over the library crate: maps flags to `ConversionConfig`,
//! runs one conversion or the HTTP server, and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use lecture_a11y::api::{self, ServerOptions};
use lecture_a11y::{
    convert_text, convert_to_braille, convert_with_captions, BrailleEncoding, ConversionConfig,
    ConversionOutput, ConversionProgressCallback, ProgressCallback, VlmCaptioner,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live caption progress: one bar over all images plus a log line per image.
struct CliProgressCallback {
    bar: ProgressBar,
    caption_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Extracting text and images…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            caption_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total_images: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_images as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Captioning");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.caption_started
            .lock()
            .ok()
            .and_then(|mut g| g.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_units: usize, total_images: usize) {
        self.activate_bar(total_images);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "{total_units} pages/slides, {total_images} images to caption…"
            ))
        ));
    }

    fn on_caption_start(&self, unit_index: usize, image_index: usize) {
        if let Ok(mut g) = self.caption_started.lock() {
            *g = Some(Instant::now());
        }
        self.bar
            .set_message(format!("unit {unit_index} image {image_index}"));
    }

    fn on_caption_complete(&self, unit_index: usize, image_index: usize, caption_len: usize) {
        self.bar.println(format!(
            "  {} {:>3}:{:<3}  {:<8}  {}",
            green("✓"),
            unit_index,
            image_index,
            dim(&format!("{caption_len:>5} bytes")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_caption_error(&self, unit_index: usize, image_index: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}:{:<3}  {}  {}",
            red("✗"),
            unit_index,
            image_index,
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_units: usize, captioned: usize) {
        self.bar.finish_and_clear();
        if self.errors.load(Ordering::SeqCst) == 0 {
            eprintln!(
                "{} {} images captioned across {} pages/slides",
                green("✔"),
                bold(&captioned.to_string()),
                total_units
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP API on port 8000
  lecture2a11y serve --host 0.0.0.0 --port 8000

  # Captioned Word + text output for a slide deck
  lecture2a11y convert week1.pptx --output-dir out

  # Text only, no vision model needed
  lecture2a11y text week1.pdf

  # Braille for an embosser (ASCII BRF)
  lecture2a11y braille handout.docx --encoding ascii

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY             OpenAI API key
  ANTHROPIC_API_KEY          Anthropic API key
  EDGEQUAKE_LLM_PROVIDER     Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL            Override model ID
  PDFIUM_LIB_PATH            Directory or file of the pdfium shared library
  LECTURE_A11Y_*             Fallback for every flag (e.g. LECTURE_A11Y_PORT)
  RUST_LOG                   Log filter (overrides --verbose/--quiet)
"#;

/// Convert lecture materials into accessible formats.
#[derive(Parser, Debug)]
#[command(
    name = "lecture2a11y",
    version,
    about = "Convert lecture PDFs and slides into captioned text, Word documents and Braille",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory outputs are written to (and served under /static).
    #[arg(long, global = true, env = "LECTURE_A11Y_OUTPUT_DIR", default_value = "static")]
    output_dir: PathBuf,

    /// Vision model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, llava).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Vision provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Path to a text file with a custom caption instruction.
    #[arg(long, global = true, env = "LECTURE_A11Y_CAPTION_PROMPT")]
    caption_prompt: Option<PathBuf>,

    /// Max tokens per caption.
    #[arg(long, global = true, env = "LECTURE_A11Y_MAX_TOKENS", default_value_t = 120)]
    max_tokens: usize,

    /// Caption temperature (0.0–2.0).
    #[arg(long, global = true, env = "LECTURE_A11Y_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Retries per caption before the document fails.
    #[arg(long, global = true, env = "LECTURE_A11Y_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Per-caption call timeout in seconds.
    #[arg(long, global = true, env = "LECTURE_A11Y_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, global = true, env = "LECTURE_A11Y_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Braille cell encoding of .brf output.
    #[arg(long, global = true, env = "LECTURE_A11Y_BRAILLE_ENCODING", value_enum, default_value = "unicode")]
    encoding: EncodingArg,

    /// Print the result as JSON.
    #[arg(long, global = true, env = "LECTURE_A11Y_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "LECTURE_A11Y_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "LECTURE_A11Y_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "LECTURE_A11Y_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, env = "LECTURE_A11Y_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(long, env = "LECTURE_A11Y_PORT", default_value_t = 8000)]
        port: u16,

        /// SQLite URL of the job status table.
        #[arg(long, env = "LECTURE_A11Y_DATABASE_URL", default_value = "sqlite:lecture-a11y.db")]
        database_url: String,

        /// Comma-separated allowed CORS origins (default: any).
        #[arg(long, env = "LECTURE_A11Y_CORS_ORIGINS")]
        cors_origins: Option<String>,

        /// Upload size limit in MiB.
        #[arg(long, env = "LECTURE_A11Y_MAX_UPLOAD_MB", default_value_t = 100)]
        max_upload_mb: usize,

        /// Resolve the vision provider at startup instead of on first use.
        #[arg(long, env = "LECTURE_A11Y_EAGER_MODEL")]
        eager_model: bool,
    },

    /// PDF/PPTX → captioned `<stem>_vlm.txt` and `<stem>_vlm.docx`.
    Convert {
        /// Local file path or HTTP/HTTPS URL.
        input: String,
        /// Output stem (defaults to the input file name).
        #[arg(long)]
        name: Option<String>,
    },

    /// PDF/PPTX → `<stem>.txt` and `<stem>.docx`, no captions.
    Text {
        input: String,
        #[arg(long)]
        name: Option<String>,
    },

    /// DOCX → `<stem>.brf`.
    Braille {
        input: String,
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EncodingArg {
    Unicode,
    Ascii,
}

impl From<EncodingArg> for BrailleEncoding {
    fn from(v: EncodingArg) -> Self {
        match v {
            EncodingArg::Unicode => BrailleEncoding::Unicode,
            EncodingArg::Ascii => BrailleEncoding::Ascii,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let captioning = matches!(cli.command, Command::Convert { .. });
    let show_progress = captioning && !cli.quiet && !cli.no_progress && !cli.json;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    match cli.command {
        Command::Serve {
            ref host,
            port,
            ref database_url,
            ref cors_origins,
            max_upload_mb,
            eager_model,
        } => {
            let options = ServerOptions {
                host: host.clone(),
                port,
                database_url: database_url.clone(),
                cors_origins: cors_origins.clone(),
                max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
                eager_model,
            };
            api::serve(options, config).await.context("Server failed")?;
        }
        Command::Convert { ref input, ref name } => {
            let captioner = VlmCaptioner::new(&config);
            let output = convert_with_captions(input, name.as_deref(), &captioner, &config)
                .await
                .context("Caption conversion failed")?;
            report_document(&cli, &output)?;
        }
        Command::Text { ref input, ref name } => {
            let output = convert_text(input, name.as_deref(), &config)
                .await
                .context("Text conversion failed")?;
            report_document(&cli, &output)?;
        }
        Command::Braille { ref input, ref name } => {
            let output = convert_to_braille(input, name.as_deref(), &config)
                .await
                .context("Braille conversion failed")?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output).context("Failed to serialise output")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{}  {} paragraphs  {} cells  →  {}",
                    green("✔"),
                    output.paragraphs,
                    output.cells,
                    bold(&output.brf_path.display().to_string()),
                );
            }
        }
    }

    Ok(())
}

fn report_document(cli: &Cli, output: &ConversionOutput) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(output).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {} pages/slides  {}/{} images captioned  {}ms",
            green("✔"),
            stats.total_units,
            stats.captioned_images,
            stats.total_images,
            stats.total_duration_ms,
        );
        eprintln!("   {}", bold(&output.docx_path.display().to_string()));
        eprintln!("   {}", dim(&output.text_path.display().to_string()));
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let caption_prompt = if let Some(ref path) = cli.caption_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read caption prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ConversionConfig::builder()
        .output_dir(&cli.output_dir)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .braille_encoding(cli.encoding.into());

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(prompt) = caption_prompt {
        builder = builder.caption_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
