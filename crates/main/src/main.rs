use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use log::info;

use patrimonio_report::model::PatrimonioSnapshot;
use patrimonio_report::{
    fonts, generate_patrimonio_report, LocalObjectStore, RenderError, ReportComposer,
    ReportConfig, ReportError, ReportPublisher, ReportRequest,
};

/// Generates patrimônio reports from the command line.
///
/// Settings start from the `PATRIMONIO_*` environment variables; flags override them. Fonts are
/// searched under `assets/fonts` or in `PATRIMONIO_FONTS_DIR`, falling back to the system
/// Liberation Sans family.
#[derive(Parser)]
#[command(author, version, about = "Patrimônio PDF report generator")]
struct Cli {
    #[command(flatten)]
    assets: AssetArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AssetArgs {
    /// URL of the logo drawn in the report header.
    #[arg(long, global = true)]
    logo_url: Option<String>,

    /// Timeout, in seconds, for every asset request.
    #[arg(long, global = true)]
    fetch_timeout: Option<u64>,
}

impl AssetArgs {
    fn apply(self, mut config: ReportConfig) -> ReportConfig {
        if let Some(logo_url) = self.logo_url {
            config.logo_url = Some(logo_url);
        }
        if let Some(secs) = self.fetch_timeout {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render a report request read from a JSON file.
    #[command(name = "render")]
    Render {
        /// JSON file with the title, record, attachments and report URL.
        #[arg(long)]
        request: PathBuf,

        /// Destination of the PDF.
        #[arg(long, default_value = "report.pdf")]
        output: PathBuf,
    },

    /// Render and publish the report for an asset snapshot.
    #[command(name = "patrimonio", aliases = ["publish"])]
    Patrimonio {
        /// JSON snapshot of the asset and its files.
        #[arg(long)]
        snapshot: PathBuf,

        /// Asset identifier; defaults to `ID_PATRIMONIO` from the snapshot.
        #[arg(long)]
        id: Option<u64>,

        /// Root directory of the object store.
        #[arg(long)]
        storage_dir: Option<PathBuf>,

        /// Base URL under which stored objects are served.
        #[arg(long)]
        public_base_url: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.assets.apply(ReportConfig::from_env());

    let result = match cli.command {
        Commands::Render { request, output } => render(&config, request, output),
        Commands::Patrimonio {
            snapshot,
            id,
            storage_dir,
            public_base_url,
        } => {
            let config = ReportConfig {
                storage_dir: storage_dir.unwrap_or(config.storage_dir),
                public_base_url: public_base_url.unwrap_or(config.public_base_url),
                ..config
            };
            publish(config, snapshot, id)
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        if let Some(ReportError::Render(RenderError::Font(font_err))) =
            err.downcast_ref::<ReportError>()
        {
            if fonts::fonts_missing(font_err) {
                eprintln!(
                    "  hint: set {} to a directory with the Roboto fonts",
                    fonts::FONTS_DIR_VAR
                );
            }
        }
        std::process::exit(1);
    }
}

fn render(config: &ReportConfig, request: PathBuf, output: PathBuf) -> Result<(), Box<dyn Error>> {
    let request: ReportRequest =
        serde_json::from_slice(&fs::read(&request)?).map_err(ReportError::from)?;
    let composer = ReportComposer::from_config(config)?;
    let rendered = composer.compose(&request).map_err(ReportError::from)?;
    fs::write(&output, &rendered.bytes)?;
    info!(
        "Wrote {} ({} page(s))",
        output.display(),
        rendered.page_count
    );
    Ok(())
}

fn publish(config: ReportConfig, snapshot: PathBuf, id: Option<u64>) -> Result<(), Box<dyn Error>> {
    let snapshot: PatrimonioSnapshot =
        serde_json::from_slice(&fs::read(&snapshot)?).map_err(ReportError::from)?;
    let id = id
        .or(snapshot.patrimonio.id_patrimonio)
        .ok_or("the snapshot has no ID_PATRIMONIO; pass --id")?;

    let composer = ReportComposer::from_config(&config)?;
    let publisher = ReportPublisher::new(LocalObjectStore::new(
        &config.storage_dir,
        config.public_base_url.clone(),
    ));
    let url = generate_patrimonio_report(
        &composer,
        &publisher,
        id,
        &snapshot.patrimonio,
        &snapshot.arquivos,
    )?;
    println!("{}", url);
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
