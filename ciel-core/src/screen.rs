use std::sync::Arc;

use chrono::Timelike;
use tokio::sync::mpsc;

use crate::client::{FetchTarget, WeatherFetcher, fetch_current};
use crate::config::DEFAULT_CITY;
use crate::error::WeatherError;
use crate::location::{FallbackReason, LocationOutcome, LocationProvider};
use crate::model::{ConditionIcon, Coordinate, CurrentWeather};
use crate::theme::{Gradient, Palette};

/// Placeholder shown in every card field until the first render.
pub const PLACEHOLDER: &str = "--";

/// Presentation lifecycle of the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Locating,
    Fetching,
    Rendering,
    ErrorShown,
}

/// Everything a frontend needs to draw: the card fields, the gradient, the
/// lifecycle phase, and the modal error text if one is up.
#[derive(Debug, Clone, PartialEq)]
pub struct CardState {
    pub city: String,
    pub temperature: String,
    pub description: String,
    pub icon: ConditionIcon,
    pub gradient: Gradient,
    pub phase: Phase,
    pub error: Option<String>,
}

/// User intents, produced by whichever frontend is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Dismiss,
    Quit,
}

/// Everything the screen loop consumes: user commands and completions of
/// the background work it spawned. A single queue keeps all card mutation
/// on one task and makes overlap resolution arrival-ordered.
#[derive(Debug)]
pub enum ScreenEvent {
    Command(Command),
    Located(LocationOutcome),
    Fetched(Result<CurrentWeather, WeatherError>),
}

/// Rendering seam. Implementations draw the card somewhere.
pub trait Frontend {
    fn render(&mut self, card: &CardState);
}

/// Knobs for a screen, split out so the CLI can map configuration onto
/// them.
pub struct ScreenOptions {
    pub default_city: String,
    pub palette: Palette,
    /// Exit after the first completed fetch cycle.
    pub once: bool,
    /// Clock behind the gradient; swapped out in tests.
    pub hour_source: fn() -> u32,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            default_city: DEFAULT_CITY.to_string(),
            palette: Palette::default(),
            once: false,
            hour_source: local_hour,
        }
    }
}

fn local_hour() -> u32 {
    chrono::Local::now().hour()
}

enum Flow {
    Continue,
    Quit,
}

/// Orchestrates one fetch cycle at a time: location, fetch, decode, render.
/// Owns all presentation state.
///
/// Cycle work runs in spawned tasks that report back over the event
/// channel; only the loop task ever touches the card. In-flight cycles are
/// never cancelled, so a refresh during a pending fetch races the old reply
/// against the new one and the last arrival wins.
pub struct WeatherScreen {
    fetcher: Arc<dyn WeatherFetcher>,
    locator: Arc<dyn LocationProvider>,
    options: ScreenOptions,
    card: CardState,
    last_fix: Option<Coordinate>,
    tx: mpsc::UnboundedSender<ScreenEvent>,
    rx: mpsc::UnboundedReceiver<ScreenEvent>,
}

impl WeatherScreen {
    pub fn new(
        fetcher: Arc<dyn WeatherFetcher>,
        locator: Arc<dyn LocationProvider>,
        options: ScreenOptions,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let card = CardState {
            city: PLACEHOLDER.to_string(),
            temperature: PLACEHOLDER.to_string(),
            description: PLACEHOLDER.to_string(),
            icon: ConditionIcon::default(),
            gradient: Gradient::for_hour((options.hour_source)(), &options.palette),
            phase: Phase::Idle,
            error: None,
        };

        Self {
            fetcher,
            locator,
            options,
            card,
            last_fix: None,
            tx,
            rx,
        }
    }

    /// Sender half of the event queue, for input tasks.
    pub fn sender(&self) -> mpsc::UnboundedSender<ScreenEvent> {
        self.tx.clone()
    }

    /// Drive the screen until quit. Starts one cycle immediately; returns
    /// the final card so the caller can tell how the last cycle ended.
    pub async fn run(mut self, frontend: &mut dyn Frontend) -> CardState {
        self.start_cycle();
        frontend.render(&self.card);

        while let Some(event) = self.rx.recv().await {
            let flow = self.apply(event);
            frontend.render(&self.card);

            if let Flow::Quit = flow {
                break;
            }
        }

        self.card
    }

    fn apply(&mut self, event: ScreenEvent) -> Flow {
        match event {
            ScreenEvent::Command(Command::Refresh) => {
                if self.card.phase == Phase::ErrorShown {
                    return Flow::Continue;
                }
                self.start_cycle();
            }
            ScreenEvent::Command(Command::Dismiss) => {
                if self.card.phase == Phase::ErrorShown {
                    self.card.error = None;
                    self.set_phase(Phase::Idle);
                }
            }
            ScreenEvent::Command(Command::Quit) => return Flow::Quit,
            ScreenEvent::Located(LocationOutcome::Fix(coordinate)) => {
                self.last_fix = Some(coordinate);
                self.start_fetch(FetchTarget::Coordinate(coordinate));
            }
            ScreenEvent::Located(LocationOutcome::Fallback(reason)) => {
                let cause = match reason {
                    FallbackReason::PermissionDenied => WeatherError::PermissionDenied,
                    FallbackReason::Failed(detail) => WeatherError::Location(detail),
                };
                let target = self.fallback_target();
                tracing::info!("No fix ({cause}), fetching {target:?} instead");
                self.start_fetch(target);
            }
            ScreenEvent::Fetched(Ok(weather)) => {
                self.set_phase(Phase::Rendering);
                self.show(weather);
                self.set_phase(Phase::Idle);

                if self.options.once {
                    return Flow::Quit;
                }
            }
            ScreenEvent::Fetched(Err(error)) => {
                tracing::warn!("Fetch cycle failed: {error}");
                self.card.error = Some(error.user_message().to_string());
                self.set_phase(Phase::ErrorShown);

                if self.options.once {
                    return Flow::Quit;
                }
            }
        }

        Flow::Continue
    }

    /// Begin a cycle: recompute the gradient for the current hour and kick
    /// off location acquisition.
    fn start_cycle(&mut self) {
        self.card.gradient =
            Gradient::for_hour((self.options.hour_source)(), &self.options.palette);
        self.set_phase(Phase::Locating);

        let locator = Arc::clone(&self.locator);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = locator.locate().await;
            let _ = tx.send(ScreenEvent::Located(outcome));
        });
    }

    /// Last-known coordinate if any, else the default city.
    fn fallback_target(&self) -> FetchTarget {
        match self.last_fix {
            Some(coordinate) => FetchTarget::Coordinate(coordinate),
            None => FetchTarget::City(self.options.default_city.clone()),
        }
    }

    fn start_fetch(&mut self, target: FetchTarget) {
        self.set_phase(Phase::Fetching);

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = fetch_current(fetcher.as_ref(), &target).await;
            let _ = tx.send(ScreenEvent::Fetched(result));
        });
    }

    /// Apply a validated model to the card. All visible fields change
    /// together, and the gradient follows the current hour.
    fn show(&mut self, weather: CurrentWeather) {
        tracing::info!(
            "Rendering {}: {}°C, {}",
            weather.city,
            weather.temperature_celsius,
            weather.description
        );

        self.card.icon = weather.icon();
        self.card.temperature = temperature_text(weather.temperature_celsius);
        self.card.description = capitalize_first(&weather.description);
        self.card.city = weather.city;
        self.card.gradient =
            Gradient::for_hour((self.options.hour_source)(), &self.options.palette);
        self.card.error = None;
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.card.phase != phase {
            tracing::debug!("Screen phase {:?} -> {:?}", self.card.phase, phase);
            self.card.phase = phase;
        }
    }
}

/// Integer-rounded Celsius, e.g. `"21°C"`. Halves round away from zero.
pub fn temperature_text(celsius: f64) -> String {
    format!("{}°C", celsius.round() as i64)
}

/// Uppercase the first letter, leave the rest untouched.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
