use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};

use ciel_core::OpenWeatherClient;
use ciel_core::config::Config;
use ciel_core::location::geoip::GeoIpLocator;
use ciel_core::screen::{ScreenOptions, WeatherScreen};
use ciel_core::theme::Palette;

use crate::term;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "ciel", version, about = "Terminal weather card")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and defaults.
    Configure,

    /// Show the weather card (the default when no command is given).
    Watch {
        /// City to show, skipping geolocation.
        #[arg(long)]
        city: Option<String>,

        /// Render one fetch cycle to stdout and exit.
        #[arg(long)]
        once: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Watch { city: None, once: false }) {
            Command::Configure => configure(),
            Command::Watch { city, once } => watch(city, once).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read the API key")?;

    let default_city = inquire::Text::new("Default city:")
        .with_default(&config.default_city)
        .prompt()
        .context("Failed to read the default city")?;

    let use_location = inquire::Confirm::new("Use IP-based geolocation?")
        .with_default(config.location.enabled)
        .prompt()
        .context("Failed to read the geolocation choice")?;

    if !api_key.trim().is_empty() {
        config.api_key = Some(api_key.trim().to_string());
    }
    if !default_city.trim().is_empty() {
        config.default_city = default_city.trim().to_string();
    }
    config.location.enabled = use_location;

    config.save()?;
    println!("Saved {}", Config::config_file_path()?.display());

    Ok(())
}

async fn watch(city: Option<String>, once: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let api_key = config.require_api_key()?.to_string();

    // An explicit city pins the fallback target and opts out of geolocation.
    let consent = config.location.enabled && city.is_none();
    let default_city = city.unwrap_or_else(|| config.default_city.clone());

    let fetcher = Arc::new(OpenWeatherClient::new(api_key));
    let locator = Arc::new(GeoIpLocator::new(consent));
    let options = ScreenOptions {
        default_city,
        palette: Palette::with_overrides(&config.theme),
        once,
        ..ScreenOptions::default()
    };

    let screen = WeatherScreen::new(fetcher, locator, options);

    if once {
        let mut frontend = term::PlainFrontend::default();
        let card = screen.run(&mut frontend).await;

        // Scripted callers rely on the exit status.
        return match card.error {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        };
    }

    let mut frontend = term::TermFrontend::new().context("Failed to initialize the terminal")?;
    let keys = tokio::spawn(term::forward_keys(screen.sender()));

    screen.run(&mut frontend).await;

    keys.abort();
    drop(frontend);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;

        Cli::command().debug_assert();
    }

    #[test]
    fn watch_flags_parse() {
        let cli = Cli::parse_from(["ciel", "watch", "--city", "Lyon", "--once"]);

        match cli.command {
            Some(Command::Watch { city, once }) => {
                assert_eq!(city.as_deref(), Some("Lyon"));
                assert!(once);
            }
            other => panic!("expected watch, got {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::parse_from(["ciel"]);
        assert!(cli.command.is_none());
    }
}
