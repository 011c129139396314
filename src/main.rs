use std::path::PathBuf;
use std::process::ExitCode;

use clap::builder::TypedValueParser;
use clap::{Parser, Subcommand};
use tracing::info;

mod controller;
mod domain;
mod format;
mod inputter;
mod logging;
mod model;
mod record;
mod statistics;
mod store;
mod table;
mod ui;
mod upload;
mod worker;

use controller::Controller;
use domain::{DEFAULT_API_URL, DEFAULT_PAGE_SIZE, XVConfig, XVError};
use model::{Model, Status};
use record::ColumnInference;
use statistics::Statistics;
use store::{DataStore, HttpStore};
use ui::TableUI;
use upload::SpreadsheetFile;

#[derive(Parser)]
#[command(name = "xv")]
#[command(about = "View, search and summarise spreadsheet data held by an xv data store")]
#[command(version)]
struct Cli {
    #[arg(long, env = "XV_API_URL", default_value = DEFAULT_API_URL, help = "Base URL of the data store")]
    api_url: String,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u16).range(1..).map(|v| v as usize), help = "Rows per table page")]
    page_size: usize,

    #[arg(long, value_enum, default_value = "first-record", help = "How column types are inferred")]
    inference: ColumnInference,

    #[arg(long, default_value_t = 30, help = "Request timeout in seconds")]
    timeout: u64,

    #[arg(long, default_value_t = 100, help = "Terminal event poll interval in milliseconds")]
    poll_ms: u64,

    #[arg(long, help = "Keep the server session when quitting")]
    keep_session: bool,

    #[arg(long, default_value = "xv.log", help = "Log file")]
    log_file: PathBuf,

    #[arg(long, default_value = "info", help = "Log level, overridden by RUST_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print statistics of the stored dataset as JSON
    Stats,
    /// Upload an .xlsx / .xls file
    Upload { file: String },
    /// Delete all stored data
    Clear,
}

impl Cli {
    fn config(&self) -> XVConfig {
        XVConfig::default()
            .with_api_url(self.api_url.clone())
            .with_page_size(self.page_size)
            .with_inference(self.inference)
            .with_request_timeout(self.timeout)
            .with_event_poll_time(self.poll_ms)
            .with_clear_session_on_exit(!self.keep_session)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(cli: Cli) -> Result<(), XVError> {
    logging::init(&cli.log_file, &cli.log_level)?;
    let cfg = cli.config();
    info!("Starting xv against {} ...", cfg.api_url);

    let store = HttpStore::new(&cfg.api_url, cfg.request_timeout)?;
    match cli.command {
        Some(Command::Stats) => {
            let records = store.fetch_all()?;
            let stats = Statistics::compute(&records, cfg.inference);
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Some(Command::Upload { file }) => {
            let file = SpreadsheetFile::open(&file)?;
            let receipt = store.upload_file(&file)?;
            println!("{}: {} rows processed", file.file_name, receipt.rows_processed);
            Ok(())
        }
        Some(Command::Clear) => {
            store.clear_all()?;
            println!("All data cleared successfully.");
            Ok(())
        }
        None => run_tui(&cfg, Box::new(store)),
    }
}

fn run_tui(cfg: &XVConfig, store: Box<dyn DataStore>) -> Result<(), XVError> {
    let mut model = Model::init(cfg, store)?;
    let mut ui = TableUI::new(cfg);
    let controller = Controller::new(cfg);

    let mut terminal = ratatui::init();
    let result = (|| -> Result<(), XVError> {
        while model.status != Status::QUITTING {
            // Render the current view
            terminal.draw(|f| ui.draw(&model, f))?;

            // Handle events and map to a Message
            let message = controller.handle_event(&model)?;
            model.update(message)?;
        }
        Ok(())
    })();
    ratatui::restore();

    model.shutdown();
    info!("Bye!");
    result
}
