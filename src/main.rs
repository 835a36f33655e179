// webshell-bridge command line
// Drives the calendar importer and the pull notifier against the local store

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use webshell_bridge::calendar::{fields, import_calendar, to_ical_date, CalendarStore, ImportOptions, ZoneAnchor};
use webshell_bridge::notify::{
    FeedFetcher, IcsPullSource, LogNotifier, PullWorker, WorkOutcome, WorkParams,
};
use webshell_bridge::notify::feed::{CREDENTIALS_PARAMETER_KEY, URLS_PARAMETER_KEY};
use webshell_bridge::utils::logging;
use webshell_bridge::{BridgeConfig, Database};

const DEFAULT_ACCOUNT_TYPE: &str = "local";

#[derive(Parser)]
#[command(name = "webshell-bridge")]
#[command(about = "Import iCalendar files into the local calendar store and pull feed notifications")]
#[command(after_help = "The configuration file is read from WEBSHELL_CONFIG when set.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Create a calendar and print its id
    AddCalendar {
        name: String,
        #[arg(default_value = DEFAULT_ACCOUNT_TYPE)]
        account_type: String,
    },
    /// List calendars of an account type
    Calendars {
        #[arg(default_value = DEFAULT_ACCOUNT_TYPE)]
        account_type: String,
    },
    /// Replace the events under a uid suffix with those of an .ics file
    Import {
        calendar_id: i64,
        file: PathBuf,
        uid_suffix: Option<String>,
    },
    /// Print the active events of a calendar
    Events {
        calendar_id: i64,
        uid_suffix: Option<String>,
    },
    /// Flag one event as deleted
    DeleteEvent { event_id: i64 },
    /// Run one pull cycle for a feed (credentials as user:password)
    Pull {
        scope: String,
        feed_url: String,
        credentials: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli.command).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config() -> Result<BridgeConfig> {
    let config = match env::var("WEBSHELL_CONFIG") {
        Ok(path) => BridgeConfig::from_file(Path::new(&path))
            .with_context(|| format!("Failed to read configuration from {}", path))?,
        Err(_) => BridgeConfig::default(),
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

async fn run(command: Command) -> Result<()> {
    let config = load_config()?;
    let db_path: PathBuf = config.database_path();
    info!("Using calendar store at {:?}", db_path);
    let db = Database::open(&db_path).await?;

    match command {
        Command::AddCalendar { name, account_type } => {
            let id = db.add_calendar(&name, &account_type).await?;
            println!("{}", id);
        }
        Command::Calendars { account_type } => {
            for calendar in db.list_calendars(&account_type).await? {
                println!("{}\t{}", calendar.id, calendar.display_name);
            }
        }
        Command::Import {
            calendar_id,
            file,
            uid_suffix,
        } => {
            let ical_data = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let options = ImportOptions::from_config(&config)?;
            let result =
                import_calendar(&db, calendar_id, &ical_data, uid_suffix.as_deref(), &options)
                    .await?;
            println!(
                "imported {} events ({} reminders), replaced {}, skipped {}",
                result.events_imported,
                result.reminders_created,
                result.events_deleted,
                result.events_skipped
            );
        }
        Command::Events {
            calendar_id,
            uid_suffix,
        } => {
            for record in db.query_events(calendar_id, uid_suffix).await? {
                let start = record
                    .integer(fields::DTSTART)
                    .and_then(to_ical_date)
                    .unwrap_or_default();
                println!(
                    "{}\t{}\t{}\t{}",
                    record.integer(fields::EVENT_ID).unwrap_or_default(),
                    record.text(fields::UID).unwrap_or_default(),
                    start,
                    record.text(fields::TITLE).unwrap_or_default()
                );
            }
        }
        Command::DeleteEvent { event_id } => {
            if db.soft_delete_event(event_id).await? == 0 {
                bail!("No event with id {}", event_id);
            }
        }
        Command::Pull {
            scope,
            feed_url,
            credentials,
        } => {
            let mut params = WorkParams::new().with(URLS_PARAMETER_KEY, feed_url);
            if let Some(credentials) = credentials {
                params = params.with(CREDENTIALS_PARAMETER_KEY, credentials);
            }

            let anchor = ZoneAnchor::from_config(config.date_anchor_zone.as_deref())?;
            let source = IcsPullSource::new(Arc::new(FeedFetcher::new()?), anchor);
            let worker = PullWorker::new(&scope, Arc::new(source), Arc::new(db.clone()), Arc::new(LogNotifier))
                .with_max_notifications(config.max_notifications);
            if worker.run(&params).await == WorkOutcome::Failure {
                bail!("Pull for '{}' failed", scope);
            }
        }
    }

    Ok(())
}
