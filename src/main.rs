use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use devnexus::ai::AiClient;
use devnexus::controller::Controller;
use devnexus::github::IssueClient;
use devnexus::http::{HttpTransport, ReqwestTransport};
use devnexus::store::FileStorage;
use devnexus::{config, launch, report};

/// DevNexus: monitor and triage a GitHub repository's issues from the
/// terminal, with AI-assisted analysis, research notes and PR drafting.
#[derive(Parser, Debug)]
#[command(name = "devnexus", version, about)]
struct Cli {
    /// Settings file (defaults to .devnexus.toml in the current directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Launch link or query string carrying owner, repo and token
    /// (e.g., "?owner=rust-lang&repo=rust")
    #[arg(long, global = true)]
    launch: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show issue statistics, label distribution and recent activity
    Dashboard {
        /// Optional output file path for a markdown report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List issues (open only unless --all)
    Issues {
        #[arg(long)]
        all: bool,
    },

    /// Create an issue in the configured repository (requires a token)
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        body: String,
    },

    /// Summarize an issue, rate its priority and suggest a fix
    Analyze {
        /// Issue number
        number: u64,
    },

    /// Draft a pull request that resolves an issue
    DraftPr {
        /// Issue number
        number: u64,
    },

    /// Start a research note on a topic and expand it with AI
    Research {
        topic: String,
        /// Extra tags for the note
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show or update the saved repository configuration
    Config {
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        repo: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading settings");
    let settings = config::Settings::load(cli.settings.as_deref())?;
    let launch = cli.launch.as_deref().map(launch::parse_launch).transpose()?;
    if let Some(params) = &launch {
        debug!(owner = ?params.owner, repo = ?params.repo, "parsed launch parameters");
    }

    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());
    let storage = Arc::new(FileStorage::new(&settings.storage.path));
    let issue_client = IssueClient::new(transport.clone(), &settings.github.api_base);
    let ai_client = AiClient::new(
        transport,
        settings.ai_api_key(),
        &settings.ai.model,
        &settings.ai.api_base,
    );
    let mut dashboard = Controller::new(storage, settings.github.clone(), issue_client, ai_client);

    if matches!(cli.command, Command::Config { .. }) {
        dashboard.load_config(launch.as_ref());
    } else {
        dashboard.init(launch.as_ref()).await;
    }
    let repository = match dashboard.config().repository() {
        Some((owner, repo)) => format!("{owner}/{repo}"),
        None => String::new(),
    };
    let _span = info_span!("command", repository = %repository).entered();
    run(&mut dashboard, cli.command, &repository).await?;

    dashboard.shutdown();
    Ok(())
}

async fn run(
    dashboard: &mut Controller,
    command: Command,
    repository: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Dashboard { output } => {
            let built = report::build(
                repository,
                dashboard.issues(),
                dashboard.notes().notes(),
                dashboard.error(),
            );
            report::output(&built, output.as_deref())?;
        }
        Command::Issues { all } => {
            if all {
                report::print_issues(dashboard.issues(), dashboard.error());
            } else {
                report::print_issues(dashboard.open_issues(), dashboard.error());
            }
        }
        Command::Create { title, body } => {
            dashboard.open_new_issue_form();
            let created = dashboard.create_issue(&title, &body).await?;
            println!("Created issue #{}: {}", created.number, created.url);
        }
        Command::Analyze { number } => {
            let analysis = dashboard.analyze_issue(number).await?;
            report::print_analysis(number, &analysis);
        }
        Command::DraftPr { number } => {
            dashboard.analyze_issue(number).await?;
            let draft = dashboard.draft_pull_request(number).await?;
            report::print_pr_draft(draft);
        }
        Command::Research { topic, tags } => {
            let notes = dashboard.notes_mut();
            let id = notes.create();
            notes.set_title(id, &topic);
            for tag in &tags {
                notes.add_tag(id, tag);
            }
            dashboard.expand_selected_note().await?;
            if let Some(note) = dashboard.notes().selected() {
                report::print_note(note);
            }
        }
        Command::Config { owner, repo, token } => {
            if owner.is_none() && repo.is_none() && token.is_none() {
                let current = dashboard.config();
                println!("owner: {}", current.owner);
                println!("repo:  {}", current.repo);
                println!("token: {}", if current.credential().is_some() { "set" } else { "not set" });
                return Ok(());
            }
            if let Some(token) = token {
                dashboard.set_credential(&token);
            }
            let owner = owner.unwrap_or_else(|| dashboard.config().owner.clone());
            let repo = repo.unwrap_or_else(|| dashboard.config().repo.clone());
            dashboard.stage_repository(&owner, &repo);
            dashboard.save_config().await?;
            println!("Saved configuration for {owner}/{repo}.");
            report::print_issues(dashboard.open_issues(), dashboard.error());
        }
    }
    Ok(())
}
