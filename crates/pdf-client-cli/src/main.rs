//! PDF Client CLI - Command line front end for a PDF translation service.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_client_core::service::HttpTranslateService;
use pdf_client_core::{
    ClientApp, ClientConfig, CredentialKind, ListView, Notification, SubmissionOptions,
    TranslationMode, format_file_size,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::broadcast;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pdf-client")]
#[command(author, version, about = "Translate PDF documents with a remote service", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Translate endpoint of the service
    #[arg(long, env = "PDF_CLIENT_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Keep credentials in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage document parsing API keys
    ParseApi {
        #[command(subcommand)]
        action: CredentialAction,
    },
    /// Manage translation API endpoints
    TranslateApi {
        #[command(subcommand)]
        action: CredentialAction,
    },
    /// Translate a PDF
    Translate(TranslateArgs),
    /// Check that the service is up
    Health,
}

#[derive(Subcommand, Debug)]
enum CredentialAction {
    /// Show configured entries
    List,
    /// Add an empty entry
    Add,
    /// Set one field of an entry
    Update {
        id: i64,
        /// Field name (name, token / name, url, apiKey, model)
        field: String,
        value: String,
    },
    /// Delete an entry
    Remove {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct TranslateArgs {
    /// Input PDF file
    input: PathBuf,

    /// Directory for the translated file (default: current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Parse API entry to use (default: first)
    #[arg(long)]
    parse_api: Option<i64>,

    /// Translate API entry to use (default: first)
    #[arg(long)]
    translate_api: Option<i64>,

    /// Disable OCR
    #[arg(long)]
    no_ocr: bool,

    /// Do not embed images
    #[arg(long)]
    no_images: bool,

    /// Disable formula extraction
    #[arg(long)]
    no_formula: bool,

    /// Disable table extraction
    #[arg(long)]
    no_table: bool,

    /// Layout model used by the parser
    #[arg(long)]
    layout_model: Option<String>,

    /// Translation mode: hybrid, fast or deeplx
    #[arg(long)]
    mode: Option<TranslationMode>,

    /// Page range passed to the parser
    #[arg(long)]
    end_pages: Option<String>,
}

impl TranslateArgs {
    fn options(&self, defaults: &SubmissionOptions) -> SubmissionOptions {
        let mut options = defaults.clone();
        options.is_ocr &= !self.no_ocr;
        options.include_image_base64 &= !self.no_images;
        options.formula_enable &= !self.no_formula;
        options.table_enable &= !self.no_table;
        if let Some(ref model) = self.layout_model {
            options.layout_model.clone_from(model);
        }
        if let Some(mode) = self.mode {
            options.translation_mode = mode;
        }
        if self.end_pages.is_some() {
            options.end_pages.clone_from(&self.end_pages);
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        ClientConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        ClientConfig::load()
    };

    // Override config with CLI arguments
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if args.ephemeral {
        config.storage.persistent = false;
    }

    match args.command {
        Command::ParseApi { action } => manage(config, CredentialKind::Parse, action),
        Command::TranslateApi { action } => manage(config, CredentialKind::Translate, action),
        Command::Translate(translate) => run_translate(config, translate).await,
        Command::Health => health(&config).await,
    }
}

fn manage(config: ClientConfig, kind: CredentialKind, action: CredentialAction) -> Result<ExitCode> {
    let mut app = ClientApp::init(config).context("Failed to initialize client")?;
    let mut notices = app.notifications().subscribe();

    let view = match action {
        CredentialAction::List => app.render_credentials(kind),
        CredentialAction::Add => app.add_credential(kind)?,
        CredentialAction::Update { id, field, value } => {
            ensure_exists(&app, kind, id)?;
            app.update_credential(kind, id, &field, value)?;
            app.render_credentials(kind)
        }
        CredentialAction::Remove { id, yes } => {
            ensure_exists(&app, kind, id)?;
            let confirm = |prompt: &str| {
                yes || dialoguer::Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .unwrap_or(false)
            };
            app.remove_credential(kind, id, &confirm)?
        }
    };

    print_list(kind, &view);
    print_notifications(&mut notices);
    Ok(ExitCode::SUCCESS)
}

async fn run_translate(mut config: ClientConfig, args: TranslateArgs) -> Result<ExitCode> {
    if let Some(ref output) = args.output {
        config.download_dir = Some(output.clone());
    }
    let options = args.options(&config.options);

    let mut app = ClientApp::init(config).context("Failed to initialize client")?;
    let mut notices = app.notifications().subscribe();

    if let Some(id) = args.parse_api {
        ensure_exists(&app, CredentialKind::Parse, id)?;
        app.select_credential(CredentialKind::Parse, id);
    }
    if let Some(id) = args.translate_api {
        ensure_exists(&app, CredentialKind::Translate, id)?;
        app.select_credential(CredentialKind::Translate, id);
    }

    let selected = app.select_path(&args.input).map(|f| (f.name.clone(), f.size));
    let Ok((name, size)) = selected else {
        print_notifications(&mut notices);
        return Ok(ExitCode::FAILURE);
    };
    info!("Selected {} ({})", name, format_file_size(size));
    print_notifications(&mut notices);

    let bar = ProgressBar::new(100);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut progress = app.subscribe_progress();
    let bar_task = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                let snapshot = *progress.borrow_and_update();
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                bar.set_position(snapshot.percent as u64);
                bar.set_message(snapshot.phase.label());
            }
        })
    };

    let result = app.submit(&options).await;
    bar_task.abort();

    match result {
        Ok(Some(outcome)) => {
            bar.finish_with_message("Done");
            print_notifications(&mut notices);
            // CLI output is intentional
            #[allow(clippy::print_stdout)]
            {
                println!(
                    "Translated PDF saved to: {} ({})",
                    outcome.saved_to.display(),
                    format_file_size(outcome.bytes as u64)
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => {
            bar.abandon();
            Ok(ExitCode::FAILURE)
        }
        Err(_) => {
            bar.abandon();
            print_notifications(&mut notices);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn health(config: &ClientConfig) -> Result<ExitCode> {
    let service = HttpTranslateService::new(&config.endpoint, config.request_timeout())
        .context("Failed to create HTTP client")?;
    let status = service
        .health()
        .await
        .context(format!("Health check failed for {}", service.endpoint()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!(
            "{}: {}{}",
            service.endpoint(),
            status.status,
            status.message.map(|m| format!(" ({m})")).unwrap_or_default()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn ensure_exists(app: &ClientApp, kind: CredentialKind, id: i64) -> Result<()> {
    let exists = match kind {
        CredentialKind::Parse => app.credentials().parse().items().iter().any(|c| c.id == id),
        CredentialKind::Translate => {
            app.credentials().translate().items().iter().any(|c| c.id == id)
        }
    };
    if !exists {
        anyhow::bail!("No {kind} entry with id {id}");
    }
    Ok(())
}

fn mask(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        "*".repeat(value.chars().count().min(8))
    }
}

#[allow(clippy::print_stdout)]
fn print_list(kind: CredentialKind, view: &ListView) {
    match view {
        ListView::Empty { placeholder } => println!("{placeholder}"),
        ListView::Items(items) => {
            println!("{} entries:", kind.label());
            for item in items {
                let marker = if item.selected { "*" } else { " " };
                println!("[{marker}] {}  {}", item.id, item.name);
                for field in item.fields.iter().filter(|f| f.name != "name") {
                    let value = if field.secret {
                        mask(&field.value)
                    } else if field.value.is_empty() {
                        "-".to_string()
                    } else {
                        field.value.clone()
                    };
                    println!("      {}: {}", field.name, value);
                }
            }
        }
    }
}

#[allow(clippy::print_stderr)]
fn print_notifications(rx: &mut broadcast::Receiver<Notification>) {
    while let Ok(notice) = rx.try_recv() {
        eprintln!("{} {}", notice.severity.icon(), notice.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate_args(extra: &[&str]) -> TranslateArgs {
        let mut argv = vec!["pdf-client", "translate", "in.pdf"];
        argv.extend_from_slice(extra);
        match Args::parse_from(argv).command {
            Command::Translate(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = translate_args(&["--no-ocr", "--mode", "fast", "--end-pages", "5"]);
        let options = args.options(&SubmissionOptions::default());

        assert!(!options.is_ocr);
        assert!(options.table_enable);
        assert_eq!(options.translation_mode, TranslationMode::Fast);
        assert_eq!(options.end_pages.as_deref(), Some("5"));
    }

    #[test]
    fn test_config_defaults_are_kept_without_flags() {
        let defaults = SubmissionOptions {
            formula_enable: false,
            layout_model: "custom".into(),
            ..Default::default()
        };
        let options = translate_args(&[]).options(&defaults);
        assert_eq!(options, defaults);
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(""), "-");
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask("a-very-long-secret"), "********");
    }
}
