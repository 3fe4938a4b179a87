use abstract_sdk::{
    BranchDescriptor, Client, CommentQuery, CommitQuery, Config, Credential, FileDescriptor,
    OrganizationDescriptor, ProjectDescriptor, Revision, TransportId,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::TryStreamExt;
use serde::Serialize;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Command line access to Abstract projects
#[derive(Parser, Debug)]
#[command(name = "abstract-sdk", version, about, long_about = None)]
struct Args {
    /// Access token
    #[arg(long, env = "ABSTRACT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Share link or share id to authenticate with instead of a token
    #[arg(long, conflicts_with = "token")]
    share: Option<String>,

    /// Transport to try, in order; repeat for fallback
    #[arg(long = "transport")]
    transports: Vec<TransportId>,

    /// Base address of the HTTP API
    #[arg(long)]
    api_url: Option<String>,

    /// Path of the abstract-cli executable
    #[arg(long)]
    cli_path: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Projects
    #[command(subcommand)]
    Projects(ProjectsCommand),
    /// Branches of a project
    Branches {
        project_id: String,
        /// Only branches matching this filter (e.g. "active")
        #[arg(long)]
        filter: Option<String>,
    },
    /// Commits of a branch
    Commits {
        project_id: String,
        branch_id: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Files at a commit
    Files {
        project_id: String,
        branch_id: String,
        #[arg(long, default_value = "latest")]
        sha: String,
    },
    /// Rendered data of one layer
    LayerData {
        project_id: String,
        branch_id: String,
        file_id: String,
        page_id: String,
        layer_id: String,
        #[arg(long, default_value = "latest")]
        sha: String,
    },
    /// Every comment on a branch, all pages
    Comments {
        project_id: String,
        branch_id: String,
        /// Page size
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectsCommand {
    List {
        #[arg(long)]
        organization_id: Option<String>,
    },
    Info {
        project_id: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(tracing_level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    tracing::info!("abstract-sdk {} started with log level: {:?}", abstract_sdk::VERSION, level);

    Some(guard)
}

fn build_client(args: &Args) -> Result<Client> {
    let mut builder = Client::builder().config(Config::load());

    if let Some(token) = &args.token {
        builder = builder.credential(Credential::token(token.as_str()));
    }
    if let Some(share) = &args.share {
        let credential = if share.contains("://") {
            Credential::share_url(share.as_str())
        } else {
            Credential::share_id(share.as_str())
        };
        builder = builder.credential(credential);
    }
    if !args.transports.is_empty() {
        builder = builder.transports(args.transports.iter().copied());
    }
    if let Some(api_url) = &args.api_url {
        builder = builder.api_url(api_url.as_str());
    }
    if let Some(cli_path) = &args.cli_path {
        builder = builder.cli_path(cli_path.clone());
    }

    builder.build().context("invalid client configuration")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(client: &Client, command: Command) -> Result<()> {
    match command {
        Command::Projects(ProjectsCommand::List { organization_id }) => {
            let organization = organization_id.map(OrganizationDescriptor::new);
            let projects = client.projects().list(organization.as_ref()).await?;
            print_json(&*projects)
        },
        Command::Projects(ProjectsCommand::Info { project_id }) => {
            let project = client.projects().info(&ProjectDescriptor::new(project_id)).await?;
            print_json(&project)
        },
        Command::Branches { project_id, filter } => {
            let branches = client
                .branches()
                .list(&ProjectDescriptor::new(project_id), filter.as_deref())
                .await?;
            print_json(&*branches)
        },
        Command::Commits {
            project_id,
            branch_id,
            limit,
        } => {
            let mut query = CommitQuery::from(&BranchDescriptor::new(project_id, branch_id));
            if let Some(limit) = limit {
                query = query.limit(limit);
            }
            let commits = client.commits().list(&query).await?;
            print_json(&*commits)
        },
        Command::Files {
            project_id,
            branch_id,
            sha,
        } => {
            let commit = BranchDescriptor::new(project_id, branch_id).commit(Revision::from(sha));
            let files = client.files().list(&commit).await?;
            print_json(&*files)
        },
        Command::LayerData {
            project_id,
            branch_id,
            file_id,
            page_id,
            layer_id,
            sha,
        } => {
            let layer = FileDescriptor::new(project_id, branch_id, file_id)
                .at(Revision::from(sha))
                .page(page_id)
                .layer(layer_id);
            let data = client.layers().data(&layer).await?;
            print_json(&data)
        },
        Command::Comments {
            project_id,
            branch_id,
            limit,
        } => {
            let mut query = CommentQuery::from(&BranchDescriptor::new(project_id, branch_id));
            query.limit = limit;

            let mut pages = Box::pin(client.comments().list(query).into_stream());
            while let Some(comments) = pages.try_next().await? {
                for comment in &comments {
                    print_json(comment)?;
                }
            }
            Ok(())
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let client = build_client(&args)?;
    let Args { command, .. } = args;

    run(&client, command).await
}
