use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use papertrail_core::{
    Config, ConfirmPolicy, CrossrefSource, FetchPacer, HttpFetcher, IngestEvent, NotionBackend,
    Pipeline, Source, run_ingest,
};
use papertrail_crossref::CrossrefClient;
use papertrail_ingest::Pdf2Bib;
use papertrail_notion::NotionClient;

mod output;

use output::ColorMode;

/// Add a scholarly PDF to a Notion paper database, optionally following its
/// citations recursively.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(group(clap::ArgGroup::new("input").required(true).args(["path", "url"])))]
struct Cli {
    /// Path to a local PDF file
    #[arg(long, value_name = "FILE")]
    path: Option<PathBuf>,

    /// URL of a PDF to download
    #[arg(long)]
    url: Option<String>,

    /// Notion API token (defaults to DEDAULT_NOTION_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Notion database ID (defaults to DEDAULT_DATABASE_ID)
    #[arg(long)]
    db: Option<String>,

    /// Write even when a duplicate entry already exists
    #[arg(long)]
    force: bool,

    /// Recursively ingest the works cited by each added paper
    #[arg(short, long)]
    recursive: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Resolve configuration: CLI flags > env vars
    let token = cli
        .token
        .or_else(|| std::env::var("DEDAULT_NOTION_TOKEN").ok())
        .filter(|t| !t.is_empty());
    let Some(token) = token else {
        anyhow::bail!("no Notion token given (pass --token or set DEDAULT_NOTION_TOKEN)");
    };

    let database_id = cli
        .db
        .or_else(|| std::env::var("DEDAULT_DATABASE_ID").ok())
        .filter(|d| !d.is_empty());
    let Some(database_id) = database_id else {
        anyhow::bail!("no database ID given (pass --db or set DEDAULT_DATABASE_ID)");
    };

    let source = if let Some(path) = cli.path {
        Source::Path(path)
    } else if let Some(url) = cli.url {
        Source::Url(url)
    } else {
        anyhow::bail!("either --path or --url is required");
    };

    let config = Config {
        force: cli.force,
        recursive: cli.recursive,
        ..Config::default()
    };
    let color = ColorMode(!cli.no_color);

    let fetcher = HttpFetcher::new(reqwest::Client::new(), config.http_timeout());
    let extractor = Pdf2Bib::default();
    let catalog = NotionBackend::new(
        NotionClient::new(token, config.http_timeout()),
        database_id,
    );
    let crossref_mailto = std::env::var("CROSSREF_MAILTO").ok().filter(|m| !m.is_empty());
    let refs = CrossrefSource::new(CrossrefClient::new(crossref_mailto, config.http_timeout()));
    let pacer = FetchPacer::default();
    let confirm = StdinConfirm;

    let on_event = move |event: IngestEvent| {
        let mut out = std::io::stdout();
        let _ = output::print_event(&mut out, &event, color);
        let _ = out.flush();
    };

    let pipeline = Pipeline {
        fetcher: &fetcher,
        extractor: &extractor,
        catalog: &catalog,
        confirm: &confirm,
        config: &config,
        on_event: &on_event,
    };

    let summary = run_ingest(&pipeline, &refs, &pacer, &source)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    output::print_summary(&mut std::io::stdout(), &summary, color)?;
    Ok(())
}

/// Blocking yes/no prompt on stdin, repeated until an answer is recognized.
struct StdinConfirm;

impl ConfirmPolicy for StdinConfirm {
    fn confirm(&self, question: &str) -> bool {
        loop {
            print!("{} [y/n]: ", question);
            let _ = std::io::stdout().flush();

            let mut line = String::new();
            match std::io::stdin().read_line(&mut line) {
                // EOF or a read error counts as a decline.
                Ok(0) | Err(_) => return false,
                Ok(_) => {}
            }

            match line.trim().to_ascii_lowercase().as_str() {
                "yes" | "y" => return true,
                "no" | "n" => return false,
                _ => println!("Please answer yes or no."),
            }
        }
    }
}
