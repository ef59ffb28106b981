use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{value_parser, Arg, ArgMatches, Command};
use shlok_server::{init_tracing, start_server, state::service_for, AppState, ServerConfig};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("shlok")
        .version(shlok_server::VERSION)
        .about("Daily Bhagavad Gita verse service")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(Command::new("serve").about("Run the HTTP server and notification ticker"))
        .subcommand(
            Command::new("daily")
                .about("Print the verse for a UTC date")
                .arg(
                    Arg::new("date")
                        .long("date")
                        .value_parser(value_parser!(NaiveDate))
                        .help("Date as YYYY-MM-DD, defaults to today (UTC)"),
                ),
        )
        .subcommand(Command::new("random").about("Print a random verse"))
        .subcommand(
            Command::new("verse")
                .about("Print a verse by chapter and verse number")
                .arg(Arg::new("chapter").required(true).help("Chapter"))
                .arg(Arg::new("verse").required(true).help("Verse within the chapter")),
        )
        .subcommand(Command::new("check").about("Run one notification pass now"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let config = ServerConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("loading configuration")?;
    init_tracing(config.log_json);

    match matches.subcommand() {
        Some(("daily", args)) => daily(&config, args).await,
        Some(("random", _)) => {
            let verse = service_for(&config).random_verse().await?;
            print_json(&verse)
        }
        Some(("verse", args)) => {
            let chapter = string_arg(args, "chapter");
            let verse = string_arg(args, "verse");
            match service_for(&config).verse(&chapter, &verse).await? {
                Some(record) => print_json(&record),
                None => anyhow::bail!("Shlok not found for chapter {chapter}, verse {verse}"),
            }
        }
        Some(("check", _)) => {
            let state = AppState::from_config(config).await?;
            let report = state.dispatcher.check_and_send(Utc::now()).await?;
            print_json(&report)
        }
        _ => start_server(config).await,
    }
}

async fn daily(config: &ServerConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let service = service_for(config);
    let verse = match args.get_one::<NaiveDate>("date") {
        Some(date) => service.daily_verse_on(*date).await?,
        None => service.daily_verse().await?,
    };
    print_json(&verse)
}

fn string_arg(args: &ArgMatches, name: &str) -> String {
    args.get_one::<String>(name).cloned().unwrap_or_default()
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
