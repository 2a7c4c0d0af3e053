use std::fmt;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{CustomType, InquireError, Password, PasswordDisplayMode, Select, Text};
use weather_core::{
    Config, FileStorage, HistoryEntry, HistoryStore, ProxyClient, SearchController, SearchOutcome,
};

use crate::view::TerminalView;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the upstream API key and connection settings.
    Configure,

    /// Show current weather and forecast for a city.
    Show {
        /// City name, e.g. "Tokyo" or "New York".
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },

    /// List previously searched cities, oldest first.
    History,

    /// Search interactively, picking from history.
    Browse,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?.with_env(|key| std::env::var(key).ok())?;

        match self.command {
            Command::Configure => configure()?,
            Command::Show { city } => {
                let city = city.join(" ");
                let controller = controller(&config)?;
                let mut view = TerminalView::stdout();

                if controller.search(&city, &mut view).await == SearchOutcome::Failed {
                    bail!("Search for '{}' failed", city.trim());
                }
            }
            Command::History => {
                let controller = controller(&config)?;
                controller.init(&mut TerminalView::stdout());
            }
            Command::Browse => browse(&config).await?,
        }

        Ok(())
    }
}

fn controller(config: &Config) -> anyhow::Result<SearchController<FileStorage>> {
    let storage = FileStorage::new(Config::data_dir()?);
    Ok(SearchController::new(ProxyClient::new(config.proxy_url()), HistoryStore::new(storage)))
}

/// Interactive setup, written back to the config file (environment values are not persisted).
fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        cfg.api_key = Some(api_key.trim().to_string());
    }

    let port = CustomType::<u16>::new("Proxy port:")
        .with_default(cfg.port())
        .with_error_message("Please enter a valid port number")
        .prompt()?;
    cfg.port = Some(port);

    let lang = Text::new("Response language:").with_default(cfg.lang()).prompt()?;
    cfg.lang = Some(lang);

    let default_proxy = cfg.proxy_url();
    let proxy_url = Text::new("Proxy URL used by this CLI:").with_default(&default_proxy).prompt()?;
    cfg.proxy_url = Some(proxy_url);

    cfg.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());

    Ok(())
}

enum Choice {
    Search,
    Recent(HistoryEntry),
    Quit,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Search => f.write_str("Search a city"),
            Choice::Recent(entry) => write!(f, "↺ {}", entry.city),
            Choice::Quit => f.write_str("Quit"),
        }
    }
}

async fn browse(config: &Config) -> anyhow::Result<()> {
    let controller = controller(config)?;
    let mut view = TerminalView::stdout();
    controller.init(&mut view);

    loop {
        let mut options = vec![Choice::Search];
        options.extend(controller.history().entries().into_iter().map(Choice::Recent));
        options.push(Choice::Quit);

        let choice = match Select::new("What next?", options).prompt() {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        match choice {
            Choice::Search => {
                let input = match Text::new("City:").prompt() {
                    Ok(input) => input,
                    Err(InquireError::OperationCanceled) => continue,
                    Err(InquireError::OperationInterrupted) => break,
                    Err(err) => return Err(err.into()),
                };
                controller.search(&input, &mut view).await;
            }
            Choice::Recent(entry) => {
                controller.activate_history(entry.position, &mut view).await;
            }
            Choice::Quit => break,
        }
    }

    Ok(())
}
