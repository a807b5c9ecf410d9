use anyhow::{Context, Result};
use clap::Parser;
use tracing::Instrument;

use invoice_review::cli::commands::{
    download::DownloadCommand, highlights::HighlightsCommand, init::InitCommand,
    list::ListCommand, review::ReviewCommand, show::ShowCommand, show_how_to_get_started,
    upload::UploadCommand,
};
use invoice_review::cli::{Cli, Commands};
use invoice_review::config::InvoiceReviewConfig;
use invoice_review::telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _ = InvoiceReviewConfig::load_env_file();
    let config = match &cli.config {
        Some(path) => InvoiceReviewConfig::load_from(&[path.as_path()])
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => InvoiceReviewConfig::load().context("Failed to load configuration")?,
    };

    if let Err(e) = init_telemetry(&config.observability) {
        eprintln!("Warning: Failed to initialize telemetry: {e}");
    }

    let correlation_id = generate_correlation_id();

    match cli.command {
        None => show_how_to_get_started().await,
        Some(Commands::List) => {
            let span = create_workflow_span("list", None, &correlation_id);
            ListCommand::new(config).execute().instrument(span).await
        }
        Some(Commands::Show { id }) => {
            let span = create_workflow_span("show", Some(id.as_str()), &correlation_id);
            ShowCommand::new(id, config)
                .execute()
                .instrument(span)
                .await
        }
        Some(Commands::Upload { file }) => {
            let span = create_workflow_span("upload", None, &correlation_id);
            UploadCommand::new(file, config).execute().instrument(span).await
        }
        Some(Commands::Review {
            id,
            set,
            confirm,
            map_all,
            through,
        }) => {
            let span = create_workflow_span("review", Some(id.as_str()), &correlation_id);
            ReviewCommand::new(id, config)
                .with_edits(set, confirm, map_all)
                .with_through(through.map(Into::into))
                .execute()
                .instrument(span)
                .await
        }
        Some(Commands::Download { id, out }) => {
            let span = create_workflow_span("download", Some(id.as_str()), &correlation_id);
            DownloadCommand::new(id, out, config)
                .execute()
                .instrument(span)
                .await
        }
        Some(Commands::Highlights { id, page, svg }) => {
            let span = create_workflow_span("highlights", Some(id.as_str()), &correlation_id);
            HighlightsCommand::new(id, page, svg, config)
                .execute()
                .instrument(span)
                .await
        }
        Some(Commands::Init { force }) => {
            let span = create_workflow_span("init", None, &correlation_id);
            InitCommand::new(force).execute().instrument(span).await
        }
    }
}
