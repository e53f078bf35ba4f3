//! usage - command-line front end for the usage analytics client
//!
//! This tool provides commands for:
//! - Sending events, screen views and exceptions to the collection endpoint
//! - Inspecting and editing the persisted analytics properties
//! - Turning analytics on or off for the configured application
//! - Showing the locale and User-Agent derived from the host
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/usage/config.toml (~/.config/usage/config.toml)
//! - Logs: $XDG_STATE_HOME/usage/ (~/.local/state/usage/)
//!
//! Properties live in the home directory as `.<application_name>`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use usage_core::env::{platform_locale, user_home_dir, SystemEnvironment};
use usage_core::post::user_agent;
use usage_core::properties::FileProperties;
use usage_core::session::{CLIENT_ID_KEY, ENABLED_KEY};
use usage_core::{
    Analytics, AnalyticsOptions, Config, Event, PersistentProperties, ProcessOptions,
};

#[derive(Parser)]
#[command(name = "usage")]
#[command(about = "Send usage analytics and manage their local settings")]
#[command(version)]
struct Args {
    /// Verbose output (writes a log file)
    #[arg(short, long)]
    verbose: bool,

    /// Tracking id (overrides analytics.tracking_id)
    #[arg(long, global = true)]
    tracking_id: Option<String>,

    /// Collection endpoint (overrides analytics.collection_url)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Directory holding the properties file (overrides analytics.properties_dir)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show configuration and analytics state
    Status,

    /// Send an event hit
    Event {
        category: String,
        action: String,
        #[arg(short, long)]
        label: Option<String>,
        #[arg(short = 'n', long)]
        value: Option<i64>,
    },

    /// Send a screen view hit
    Screen { name: String },

    /// Send an exception hit
    Exception {
        description: String,
        #[arg(long)]
        fatal: bool,
    },

    /// Read or edit persisted properties
    Props {
        #[command(subcommand)]
        action: PropsAction,
    },

    /// Print the locale derived from LANG
    Locale,

    /// Print the User-Agent sent with hits
    UserAgent,

    /// Turn analytics on
    Enable,

    /// Turn analytics off
    Disable,
}

#[derive(Subcommand)]
enum PropsAction {
    /// Print a property as JSON
    Get { key: String },

    /// Set a property; VALUE is parsed as JSON, falling back to a string
    Set { key: String, value: String },

    /// Remove a property
    Unset { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().context("failed to load configuration")?;
    apply_overrides(&mut config, &args);

    // Initialize logging if verbose
    let _log_guard = if args.verbose {
        Some(usage_core::logging::init(&config.logging).context("failed to initialize logging")?)
    } else {
        None
    };

    match args.command {
        Command::Status => cmd_status(&config),
        Command::Event {
            category,
            action,
            label,
            value,
        } => {
            let mut event = Event::new(category, action);
            if let Some(label) = label {
                event = event.label(label);
            }
            if let Some(value) = value {
                event = event.value(value);
            }
            let analytics = open_session(&config, true)?;
            analytics.send_event(event).await;
            report_sent(&analytics, "event");
            Ok(())
        }
        Command::Screen { name } => {
            let analytics = open_session(&config, true)?;
            analytics.send_screen_view(&name).await;
            report_sent(&analytics, "screenview");
            Ok(())
        }
        Command::Exception { description, fatal } => {
            let analytics = open_session(&config, true)?;
            analytics.send_exception(&description, fatal).await;
            report_sent(&analytics, "exception");
            Ok(())
        }
        Command::Props { action } => cmd_props(&config, action),
        Command::Locale => {
            match platform_locale(&SystemEnvironment) {
                Some(locale) => println!("{}", locale),
                None => println!("(none)"),
            }
            Ok(())
        }
        Command::UserAgent => {
            println!("{}", user_agent(&SystemEnvironment));
            Ok(())
        }
        Command::Enable => set_enabled(&config, true),
        Command::Disable => set_enabled(&config, false),
    }
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(tracking_id) = &args.tracking_id {
        config.analytics.tracking_id = Some(tracking_id.clone());
    }
    if let Some(url) = &args.url {
        config.analytics.collection_url = Some(url.clone());
    }
    if let Some(dir) = &args.dir {
        config.analytics.properties_dir = Some(dir.clone());
    }
}

/// Build a process session; sending commands need a valid tracking id
fn open_session(config: &Config, for_sending: bool) -> Result<Analytics> {
    let options = if for_sending {
        config
            .analytics
            .to_options()
            .context("analytics is not configured for sending (see 'usage status')")?
    } else {
        AnalyticsOptions::new(
            config.analytics.tracking_id.clone().unwrap_or_default(),
            config.analytics.application_name.clone(),
        )
        .with_opt(config.analytics.opt)
    };

    let process = ProcessOptions {
        properties_dir: config.analytics.properties_dir.clone(),
        ..Default::default()
    };
    Analytics::for_process(options, process).context("failed to start analytics session")
}

/// Open the properties dotfile without creating it
fn open_properties(config: &Config) -> FileProperties {
    let name = &config.analytics.application_name;
    let dir = config
        .analytics
        .properties_dir
        .clone()
        .unwrap_or_else(|| user_home_dir(&SystemEnvironment));
    FileProperties::load(name, dir.join(FileProperties::file_name(name)))
}

fn report_sent(analytics: &Analytics, hit_type: &str) {
    if analytics.enabled() {
        println!(
            "Dispatched {} hit to {}",
            hit_type,
            analytics.collection_url()
        );
    } else {
        println!("Analytics is disabled; {} hit not sent", hit_type);
    }
}

fn cmd_status(config: &Config) -> Result<()> {
    let analytics = &config.analytics;
    let properties = open_properties(config);

    println!("Usage Analytics Configuration");
    println!("=============================");
    println!();
    println!("Config File:     {}", Config::config_path().display());
    println!(
        "Tracking ID:     {}",
        analytics.tracking_id.as_deref().unwrap_or("<not set>")
    );
    println!("Application:     {}", analytics.application_name);
    println!(
        "Version:         {}",
        analytics.application_version.as_deref().unwrap_or("<not set>")
    );
    println!(
        "Collection URL:  {}",
        analytics
            .collection_url
            .as_deref()
            .unwrap_or(usage_core::DEFAULT_COLLECTION_URL)
    );
    println!("Opt Mode:        {:?}", analytics.opt);
    println!("Properties File: {}", properties.path().display());
    let log_dir = usage_core::logging::log_dir();
    println!("Log Directory:   {}", log_dir.display());
    println!("Log Files:       {}", count_log_files(&log_dir));

    println!();
    println!(
        "Enabled:         {}",
        analytics.opt.is_enabled(properties.get(ENABLED_KEY).as_ref())
    );
    println!(
        "Client ID:       {}",
        match properties.get(CLIENT_ID_KEY) {
            Some(Value::String(id)) => id,
            _ => "<not yet assigned>".to_string(),
        }
    );

    println!();
    match analytics.validate() {
        Ok(()) => println!("Status: Ready to send"),
        Err(e) => println!("Status: Not ready ({})", e),
    }

    Ok(())
}

fn count_log_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| {
                    usage_core::logging::is_log_file_name(&entry.file_name().to_string_lossy())
                })
                .count()
        })
        .unwrap_or(0)
}

fn cmd_props(config: &Config, action: PropsAction) -> Result<()> {
    let mut properties = open_properties(config);

    match action {
        PropsAction::Get { key } => match properties.get(&key) {
            Some(value) => println!("{}", value),
            None => bail!("property '{}' is not set", key),
        },
        PropsAction::Set { key, value } => {
            let value =
                serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            properties.set(&key, Some(value));
        }
        PropsAction::Unset { key } => properties.set(&key, None),
    }

    Ok(())
}

fn set_enabled(config: &Config, enabled: bool) -> Result<()> {
    let analytics = open_session(config, false)?;
    analytics.set_enabled(enabled);
    println!(
        "Analytics {} for {}",
        if enabled { "enabled" } else { "disabled" },
        analytics.application_name()
    );
    Ok(())
}
