mod cli;
mod gui;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use construction_estimator::config::{self, AppSettings};
use construction_estimator::controller::Controller;
use construction_estimator::error::{AppError, PersistenceError};
use construction_estimator::notify::SmtpMailer;
use construction_estimator::render::PdfRenderer;
use construction_estimator::store::{MongoQuotationStore, QuotationStore, UnavailableQuotationStore};
use construction_estimator::telemetry;
use construction_estimator::templates::Templates;

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(name = "construction-estimator", version, about = "Draft, store and send construction quotations")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the quotation window (default)
    Gui,
    /// Draft a quotation in the terminal
    New,
    /// List stored quotations for a customer email
    Fetch {
        email: String,
        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-scan a saved ledger text file and show what it contains
    Ledger { file: PathBuf },
    /// Configure data directory, database and mail settings
    Config,
}

// ==========================================
// Main Function
// ==========================================

fn main() -> ExitCode {
    telemetry::init();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Gui);

    let mut settings = match &command {
        Commands::Config => {
            return match cli::setup_config_wizard() {
                Ok(Some(_)) => ExitCode::SUCCESS,
                Ok(None) => {
                    println!("🚪 Configuration cancelled, nothing was saved.");
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e),
            };
        }
        Commands::Ledger { file } => {
            return match cli::inspect_ledger(file) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("Failed to read {}: {}", file.display(), e);
                    println!("❌ Failed to read {}: {}", file.display(), e);
                    ExitCode::FAILURE
                }
            };
        }
        _ => match config::load_settings() {
            Ok(settings) => settings,
            Err(e) => return fail(&AppError::from(e)),
        },
    };
    settings.apply_env_overrides();

    let store = open_store(&settings);

    match command {
        Commands::Fetch { email, json } => match cli::fetch(store.as_ref(), &email, json) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(&e),
        },
        Commands::New => {
            let mut controller = match build_controller(&settings, store) {
                Ok(c) => c,
                Err(e) => return fail(&e),
            };
            match cli::new_quotation(&mut controller) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    println!("Cancelled: {}", e);
                    ExitCode::SUCCESS
                }
            }
        }
        _ => {
            let controller = match build_controller(&settings, store) {
                Ok(c) => c,
                Err(e) => return fail(&e),
            };
            match gui::run(controller) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("Window closed with error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn fail(err: &AppError) -> ExitCode {
    error!(error = %err, "Command failed");
    println!("❌ {}: {}", err.title(), err);
    ExitCode::FAILURE
}

/// A failed connection is reported on every save or fetch rather than
/// keeping the window from opening.
fn open_store(settings: &AppSettings) -> Box<dyn QuotationStore> {
    match MongoQuotationStore::connect(&settings.mongo) {
        Ok(store) => Box::new(store),
        Err(e) => {
            error!(error = %e, "MongoDB unavailable, saving and fetching will fail");
            let reason = match e {
                PersistenceError::Connection(msg) => msg,
                other => other.to_string(),
            };
            Box::new(UnavailableQuotationStore::new(reason))
        }
    }
}

fn build_controller(settings: &AppSettings, store: Box<dyn QuotationStore>) -> Result<Controller, AppError> {
    let root = settings.root();
    info!(root = %root.display(), "Using data directory");

    let sender = config::load_sender_config(&root)?;
    let templates = Templates::load(&root)?;
    let mailer = SmtpMailer::new(settings.smtp.clone());

    Ok(Controller::new(
        store,
        Box::new(mailer),
        PdfRenderer::new(sender),
        templates,
        settings.mail.clone(),
    ))
}
