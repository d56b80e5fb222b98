//! Command-line maintenance tool for the lab website store.
//!
//! # Responsibility
//! - Expose reorder, compact, density check and listing over a configured
//!   SQLite database.
//! - Keep output deterministic: one line per fact, JSON for listings.

use clap::{Parser, Subcommand};
use labsite_core::{
    init_logging_from, open_db_with_timeout, Collection, CollectionRepository,
    FeaturePublication, Job, JobStatus, LabsiteConfig, ListQuery, News, OrderRepository, OrderedRecord,
    Paper, RecordId, SqliteCollectionRepository, SqliteOrderRepository, TeamMember,
};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_CONFIG_PATH: &str = "labsite.toml";

/// Lab website content maintenance
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file; missing default file means built-in defaults
    #[arg(short, long, env = "LABSITE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check core linkage
    Ping,
    /// Print core version
    Version,
    /// Move one item to a new 1-based position
    Reorder {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
        id: RecordId,
        order: i64,
    },
    /// Renumber live items to 1..N
    Compact {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
    },
    /// Report whether live items hold exactly 1..N
    Check {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
    },
    /// Print one page of items as JSON
    List {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Page size; defaults to `pagination.default_size`
        #[arg(long)]
        size: Option<u32>,
        #[arg(long)]
        search: Option<String>,
        /// Job posting status: open, closed or draft (jobs only)
        #[arg(long, value_parser = parse_status)]
        status: Option<JobStatus>,
    },
}

fn parse_collection(value: &str) -> Result<Collection, String> {
    Collection::parse(value).ok_or_else(|| {
        let known = Collection::ALL
            .iter()
            .map(|collection| collection.table_name())
            .collect::<Vec<_>>()
            .join(", ");
        format!("unknown collection `{value}`; expected one of: {known}")
    })
}

fn parse_status(value: &str) -> Result<JobStatus, String> {
    JobStatus::parse(value)
        .ok_or_else(|| format!("unknown job status `{value}`; expected open, closed or draft"))
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command {
        Command::Ping => {
            println!("labsite_core ping={}", labsite_core::ping());
            return Ok(());
        }
        Command::Version => {
            println!("labsite_core version={}", labsite_core::core_version());
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(args.config)?;
    init_logging_from(&config.logging, &std::env::current_dir()?)?;
    let conn = open_db_with_timeout(&config.database.path, config.database.busy_timeout())?;
    info!(
        "event=cli_start module=cli status=ok db_path={}",
        config.database.path.display()
    );

    match args.command {
        Command::Reorder {
            collection,
            id,
            order,
        } => {
            SqliteOrderRepository::new(&conn).reorder(collection, id, order)?;
            println!("{collection} id={id} order={order}");
        }
        Command::Compact { collection } => {
            let moved = SqliteOrderRepository::new(&conn).compact(collection)?;
            println!("{collection} moved={moved}");
        }
        Command::Check { collection } => {
            let dense = SqliteOrderRepository::new(&conn).check_dense(collection)?;
            println!("{collection} dense={dense}");
            if !dense {
                return Err(format!("{collection} ordering has gaps or duplicates").into());
            }
        }
        Command::List {
            collection,
            page,
            size,
            search,
            status,
        } => {
            let query = ListQuery {
                page,
                size: size.unwrap_or(config.pagination.default_size),
                search,
                status,
                include_deleted: false,
            };
            let json = match collection {
                Collection::Jobs => list_json::<Job>(&conn, &query)?,
                Collection::News => list_json::<News>(&conn, &query)?,
                Collection::Papers => list_json::<Paper>(&conn, &query)?,
                Collection::TeamMembers => list_json::<TeamMember>(&conn, &query)?,
                Collection::FeaturePublications => {
                    list_json::<FeaturePublication>(&conn, &query)?
                }
            };
            println!("{json}");
        }
        Command::Ping | Command::Version => {}
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<LabsiteConfig, Box<dyn Error>> {
    let mut config = match path {
        Some(path) => LabsiteConfig::load(path)?,
        None if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
            LabsiteConfig::load(DEFAULT_CONFIG_PATH)?
        }
        None => LabsiteConfig::default(),
    };
    config.apply_env_overrides()?;
    Ok(config)
}

fn list_json<T>(conn: &Connection, query: &ListQuery) -> Result<String, Box<dyn Error>>
where
    T: OrderedRecord + Serialize,
{
    let repo = SqliteCollectionRepository::<T>::try_new(conn)?;
    let page = repo.list(query)?;
    Ok(serde_json::to_string_pretty(&page)?)
}
