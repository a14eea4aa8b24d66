//! CLI binary for doc2fields.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and renders the extracted fields.

use anyhow::{Context, Result};
use clap::Parser;
use doc2fields::{
    extract, extract_from_text, extract_text_only, extract_to_file, inspect, DocumentKind,
    ExtractionConfig, ExtractionOutput,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract Aadhaar card fields from a photo
  doc2fields scan.jpg --kind aadhaar

  # Extract invoice fields from a PDF, write JSON to a file
  doc2fields invoice.pdf --kind invoice -o invoice.json

  # Let the model detect the document type
  doc2fields unknown_scan.png --kind other

  # OCR only, no API key needed
  doc2fields scan.png --text-only

  # Already have the text? Skip OCR entirely
  doc2fields --text "$(cat letter.txt)" --kind income-certificate

  # PDF metadata only
  doc2fields document.pdf --inspect-only

  # Hindi + English document
  doc2fields pan.jpg --kind pan --lang eng+hin

SUPPORTED DOCUMENT KINDS:
  aadhaar, pan, passport, driving-license, marksheet, invoice, contract,
  voter-id, birth-certificate, property-registration, tax-return,
  income-certificate, other

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  DOC2FIELDS_LLM_PROVIDER Override provider (gemini, openai, anthropic, ollama)
  DOC2FIELDS_MODEL        Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium

SETUP:
  1. Install tesseract:   apt install tesseract-ocr  (or brew install tesseract)
  2. Set API key:         export GEMINI_API_KEY=...
  3. Extract:             doc2fields scan.jpg --kind aadhaar
"#;

/// Extract structured fields from scanned government documents.
#[derive(Parser, Debug)]
#[command(
    name = "doc2fields",
    version,
    about = "Extract structured fields from scanned government documents using OCR and LLMs",
    long_about = "Extract structured fields (name, numbers, dates, …) from scans of government \
documents — Aadhaar cards, PAN cards, passports, marksheets, invoices and more. Text is read \
with Tesseract OCR and fields are extracted by an LLM using a fixed per-document-type prompt.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path or HTTP/HTTPS URL (.pdf, .png, .jpg, .jpeg).
    /// Omit when supplying raw text with --text.
    input: Option<String>,

    /// Extract fields from this raw text instead of a file (skips OCR).
    #[arg(long, conflicts_with = "input")]
    text: Option<String>,

    /// Declared document kind.
    #[arg(short, long, value_enum, default_value = "other")]
    kind: KindArg,

    /// Write full extraction output as JSON to this file instead of stdout.
    #[arg(short, long, env = "DOC2FIELDS_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (e.g. gemini-1.5-flash, gpt-4.1-nano).
    #[arg(long, env = "DOC2FIELDS_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(
        long,
        env = "DOC2FIELDS_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          The default deployment is Gemini-backed (GEMINI_API_KEY)."
    )]
    provider: Option<String>,

    /// Tesseract language code(s), e.g. eng or eng+hin.
    #[arg(long, env = "DOC2FIELDS_LANG", default_value = "eng")]
    lang: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOC2FIELDS_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "DOC2FIELDS_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "DOC2FIELDS_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DOC2FIELDS_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Retries on LLM failure.
    #[arg(long, env = "DOC2FIELDS_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Output structured JSON (ExtractionOutput) instead of the field table.
    #[arg(long, env = "DOC2FIELDS_JSON")]
    json: bool,

    /// Print the raw OCR text alongside the extracted fields.
    #[arg(long)]
    show_text: bool,

    /// Run OCR only and print the raw text; no API key needed.
    #[arg(long)]
    text_only: bool,

    /// Print PDF metadata only, no OCR or extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOC2FIELDS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2FIELDS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "DOC2FIELDS_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOC2FIELDS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// LLM call timeout in seconds.
    #[arg(long, env = "DOC2FIELDS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Aadhaar,
    Pan,
    Passport,
    DrivingLicense,
    Marksheet,
    Invoice,
    Contract,
    VoterId,
    BirthCertificate,
    PropertyRegistration,
    TaxReturn,
    IncomeCertificate,
    Other,
}

impl From<KindArg> for DocumentKind {
    fn from(v: KindArg) -> Self {
        match v {
            KindArg::Aadhaar => DocumentKind::Aadhaar,
            KindArg::Pan => DocumentKind::Pan,
            KindArg::Passport => DocumentKind::Passport,
            KindArg::DrivingLicense => DocumentKind::DrivingLicense,
            KindArg::Marksheet => DocumentKind::Marksheet,
            KindArg::Invoice => DocumentKind::Invoice,
            KindArg::Contract => DocumentKind::Contract,
            KindArg::VoterId => DocumentKind::VoterId,
            KindArg::BirthCertificate => DocumentKind::BirthCertificate,
            KindArg::PropertyRegistration => DocumentKind::PropertyRegistration,
            KindArg::TaxReturn => DocumentKind::TaxReturn,
            KindArg::IncomeCertificate => DocumentKind::IncomeCertificate,
            KindArg::Other => DocumentKind::Other,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides the feedback that matters.
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
        let input = require_input(&cli)?;
        let meta = inspect(input).await.context("Failed to inspect document")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?
            );
        } else {
            println!("File:         {}", input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            if !meta.pdf_version.is_empty() {
                println!("PDF Version:  {}", meta.pdf_version);
            }
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
        }
        return Ok(());
    }

    let config = build_config(&cli).await?;
    let kind: DocumentKind = cli.kind.into();

    // ── OCR-only mode ────────────────────────────────────────────────────
    if cli.text_only {
        let input = require_input(&cli)?;
        let spinner = spinner_if(show_progress, "Running OCR…");
        let text = extract_text_only(input, &config).await.context("OCR failed")?;
        finish(spinner);

        if text.is_empty() {
            eprintln!("No text found in the document.");
            return Ok(());
        }
        println!("{}", text.text);
        if !cli.quiet {
            eprintln!(
                "{}",
                dim(&format!("{} page(s), {} chars", text.pages, text.text.len()))
            );
        }
        return Ok(());
    }

    // ── Full extraction ──────────────────────────────────────────────────
    let spinner = spinner_if(
        show_progress,
        &format!("Extracting {} fields…", kind.label()),
    );

    if let Some(ref output_path) = cli.output {
        let stats = match cli.text {
            Some(ref raw_text) => {
                let output = extract_from_text(raw_text, kind, &config)
                    .await
                    .context("Extraction failed")?;
                let json = serde_json::to_string_pretty(&output)
                    .context("Failed to serialise output")?;
                tokio::fs::write(output_path, json)
                    .await
                    .with_context(|| format!("Failed to write {}", output_path.display()))?;
                output.stats
            }
            None => extract_to_file(require_input(&cli)?, kind, output_path, &config)
                .await
                .context("Extraction failed")?,
        };
        finish(spinner);

        if !cli.quiet {
            eprintln!(
                "{}  {} page(s)  {}ms  →  {}",
                green("✔"),
                stats.pages,
                stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
            eprintln!(
                "   {} tokens in  /  {} tokens out",
                dim(&stats.input_tokens.to_string()),
                dim(&stats.output_tokens.to_string()),
            );
        }
        return Ok(());
    }

    let output = match cli.text {
        Some(ref raw_text) => extract_from_text(raw_text, kind, &config).await,
        None => extract(require_input(&cli)?, kind, &config).await,
    }
    .context("Extraction failed")?;
    finish(spinner);

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        render_output(&cli, &output)?;
    }

    Ok(())
}

/// Human-readable field rendering.
fn render_output(cli: &Cli, output: &ExtractionOutput) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.show_text {
        writeln!(out, "{}", bold("── Extracted text ──────────────────────"))?;
        writeln!(out, "{}", output.text.text)?;
        writeln!(out)?;
    }

    writeln!(
        out,
        "{} {}",
        cyan("◆"),
        bold(&format!("Document type: {}", output.result.document_type))
    )?;

    if output.result.fields.is_empty() {
        // The model reply was not parseable JSON; show it verbatim.
        writeln!(out, "{}", output.result.raw)?;
    } else {
        for (name, value) in &output.result.fields {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => serde_json::to_string(other)?,
            };
            writeln!(out, "  {:<24} {}", format!("{name}:"), rendered)?;
        }
    }

    if let Some(ref status) = output.result.compliance_status {
        writeln!(out, "{} Status: {}", cyan("◆"), status)?;
    }

    if !cli.quiet {
        eprintln!(
            "{}",
            dim(&format!(
                "{} page(s)  {} tokens in / {} tokens out  {}ms total",
                output.stats.pages,
                output.stats.input_tokens,
                output.stats.output_tokens,
                output.stats.total_duration_ms
            ))
        );
    }

    Ok(())
}

/// The positional input, or an error when only `--text` would apply.
fn require_input(cli: &Cli) -> Result<&str> {
    cli.input
        .as_deref()
        .context("No input file given. Pass a file path or URL, or use --text for raw text.")
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ExtractionConfig::builder()
        .ocr_language(cli.lang.clone())
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

/// Start a spinner unless progress display is disabled.
fn spinner_if(show: bool, msg: &str) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

fn finish(spinner: Option<ProgressBar>) {
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
}
