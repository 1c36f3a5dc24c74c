//! BK21 Records - Entry Point
//!
//! One subcommand per batch job. Settings come from `.env` and the
//! environment; see [`Config::from_env`].

use std::path::PathBuf;

use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bk21_records::config::{Config, matching, sheets};
use bk21_records::error::{TaskError, TaskResult};
use bk21_records::google::{GoogleClient, SheetsClient};
use bk21_records::mail::{DryRunMailer, GmailMailer, MailCredentials, MailTemplate, Mailer, SmtpMailer};
use bk21_records::search::{LinkFinder, Thresholds};
use bk21_records::tasks::{self, Campaign, CollectOptions, MailOptions, TaskContext};
use bk21_records::{RissClient, SerperClient};

#[derive(Parser, Debug)]
#[command(name = "bk21")]
#[command(about = "RISS enrichment, review sheets and status mail for BK21 research records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one RISS-restricted query against the search API
    Probe {
        /// Query text; `site:riss.kr` is added when absent
        query: String,

        /// Number of results
        #[arg(long, default_value = "10")]
        num: u32,
    },

    /// Save the full text of a RISS detail page
    Dump {
        /// Detail page URL
        url: String,

        /// Output directory
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Find RISS links, abstracts and keywords for the paper tab
    Collect {
        /// Tab holding the papers
        #[arg(long, default_value = sheets::PAPER)]
        tab: String,

        /// Stop after this many searched rows
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Copy the source dataset into the project folder
    CloneDataset {
        /// Name of the copy
        #[arg(long, default_value = sheets::DATASET_NAME)]
        name: String,
    },

    /// Create missing personal folders and review sheets
    Provision,

    /// Rewrite existing review sheets from the master data
    Refresh,

    /// Delete the campaign folder and clear the personal links
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Send a status mail campaign
    Mail(MailArgs),

    /// Append a submission JSON file to the intake sheet
    Submit {
        /// Submission file
        file: PathBuf,

        /// Intake spreadsheet (id or URL)
        #[arg(long, env = "INTAKE_SHEET_ID")]
        sheet: String,

        /// Tab to append to; the first tab when omitted
        #[arg(long)]
        tab: Option<String>,
    },
}

#[derive(Args, Debug)]
struct MailArgs {
    /// Campaign to run
    campaign: CampaignArg,

    /// Render and log without sending or writing
    #[arg(long)]
    dry_run: bool,

    /// Delivery backend
    #[arg(long, value_enum, default_value = "smtp")]
    backend: Backend,

    /// SMTP login file `{"id": ..., "password": ...}`
    #[arg(long, env = "MAIL_CREDENTIALS", default_value = "naver_credentials.json")]
    credentials: PathBuf,

    /// Markdown body for invite and remind
    #[arg(long, env = "MAIL_TEMPLATE", default_value = "email_content.md")]
    template: PathBuf,

    /// Subject override; `{{이름}}` and `{{마감}}` are substituted
    #[arg(long)]
    subject: Option<String>,

    /// Sender address for the Gmail backend
    #[arg(long, env = "MAIL_SENDER")]
    sender: Option<String>,

    /// Deadline text placed in the mail
    #[arg(long, env = "MAIL_DEADLINE", default_value = "1월 24일(토) 오전")]
    deadline: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CampaignArg {
    /// Ask everyone to enter their results
    Invite,
    /// Ask students to review their personal sheet
    Check,
    /// Remind students who have not submitted
    Remind,
}

impl From<CampaignArg> for Campaign {
    fn from(arg: CampaignArg) -> Self {
        match arg {
            CampaignArg::Invite => Self::Invite,
            CampaignArg::Check => Self::Check,
            CampaignArg::Remind => Self::Remind,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Backend {
    /// Implicit-TLS SMTP relay
    #[default]
    Smtp,
    /// Gmail API as the authorized user
    Gmail,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), command = ?cli.command, "Starting bk21");

    let config = Config::from_env()?;

    if let Err(e) = run(cli.command, config).await {
        tracing::error!(error = %e, "Command failed");
        eprintln!("{}", e.to_user_message());
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Command, config: Config) -> TaskResult<()> {
    match command {
        Command::Probe { query, num } => {
            let serper = SerperClient::new(&config)?;
            let results = tasks::probe(&serper, &query, num).await?;
            if results.is_empty() {
                println!("no results");
            } else {
                print!("{}", tasks::probe::format_results(&results));
            }
        }

        Command::Dump { url, out_dir } => {
            let riss = RissClient::new(&config)?;
            let path = tasks::dump(&riss, &url, &out_dir).await?;
            println!("saved {}", path.display());
        }

        Command::Collect { tab, limit } => {
            let serper = SerperClient::new(&config)?;
            let riss = RissClient::new(&config)?;
            let finder = LinkFinder {
                search: &serper,
                source: &riss,
                results_per_query: matching::RESULTS_PER_QUERY,
                delay: config.search_delay,
                thresholds: Thresholds {
                    min_score: config.min_score,
                    accept_score: config.accept_score,
                },
            };
            let options = CollectOptions { tab, row_delay: config.row_delay, limit };

            let ctx = TaskContext::from_config(config)?;
            let target = ctx.target()?;
            let summary = tasks::collect(&target, &finder, &options).await?;
            println!("{summary}");
        }

        Command::CloneDataset { name } => {
            let ctx = TaskContext::from_config(config)?;
            let summary = tasks::clone_dataset(&ctx, &name).await?;
            println!("{summary}");
        }

        Command::Provision => {
            let ctx = TaskContext::from_config(config)?;
            let summary = tasks::provision(&ctx).await?;
            println!("{summary}");
        }

        Command::Refresh => {
            let ctx = TaskContext::from_config(config)?;
            let summary = tasks::refresh(&ctx).await?;
            println!("{summary}");
        }

        Command::Reset { yes } => {
            if !yes {
                return Err(TaskError::config(format!(
                    "reset deletes '{}' and every personal link; rerun with --yes",
                    sheets::CAMPAIGN_FOLDER
                )));
            }
            let ctx = TaskContext::from_config(config)?;
            let summary = tasks::reset(&ctx).await?;
            println!("{summary}");
        }

        Command::Mail(args) => run_mail(args, config).await?,

        Command::Submit { file, sheet, tab } => {
            let submission = tasks::submit::load_submission(&file).await?;
            let google = GoogleClient::from_config(&config)?;
            let intake = SheetsClient::new(&config, google).open(&sheet);

            let tab = match tab {
                Some(tab) => tab,
                None => intake.first_tab().await?,
            };
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            let rows = tasks::submit(&intake, &tab, &submission, &timestamp).await?;
            println!("appended {rows} rows to '{tab}'");
        }
    }

    Ok(())
}

/// Delivery backend for a campaign; a dry run needs no mail secrets.
fn build_mailer(args: &MailArgs, config: &Config, google: &GoogleClient) -> TaskResult<Box<dyn Mailer>> {
    if args.dry_run {
        return Ok(Box::new(DryRunMailer));
    }
    let mailer: Box<dyn Mailer> = match args.backend {
        Backend::Smtp => Box::new(SmtpMailer::naver(&MailCredentials::load(&args.credentials)?)?),
        Backend::Gmail => {
            let sender = args
                .sender
                .as_deref()
                .ok_or_else(|| TaskError::config("the Gmail backend needs --sender or MAIL_SENDER"))?;
            Box::new(GmailMailer::new(config, google.clone(), sender)?)
        }
    };
    Ok(mailer)
}

async fn run_mail(args: MailArgs, config: Config) -> TaskResult<()> {
    let campaign = Campaign::from(args.campaign);

    let template = if campaign.needs_template() {
        let template = MailTemplate::load(&args.template, campaign.strips_heading()).map_err(|e| {
            TaskError::config(format!("cannot read template {}: {e}", args.template.display()))
        })?;
        Some(template)
    } else {
        None
    };

    let google = GoogleClient::from_config(&config)?;
    let mailer = build_mailer(&args, &config, &google)?;

    let ctx = TaskContext::new(config, google);
    let master = ctx.master()?;

    let options = MailOptions {
        template,
        subject: args.subject,
        deadline: args.deadline,
        dry_run: args.dry_run,
    };

    let summary = tasks::run_campaign(&master, mailer.as_ref(), campaign, &options).await?;
    for preview in &summary.previews {
        println!("[dry run] {} <{}>", preview.subject, preview.to);
    }
    println!("{summary}");
    Ok(())
}
