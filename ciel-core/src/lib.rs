//! Core library for the `ciel` weather card.
//!
//! This crate defines:
//! - The validated current-conditions model and its decoding pipeline
//! - The OpenWeather client and the location subsystem
//! - The screen state machine that drives one fetch cycle at a time
//! - Theme, configuration and the shared error taxonomy
//!
//! It is used by `ciel-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod screen;
pub mod theme;

pub use client::{FetchTarget, OpenWeatherClient, WeatherFetcher, fetch_current};
pub use config::{Config, DEFAULT_CITY};
pub use error::WeatherError;
pub use location::{FixTracker, LocationOutcome, LocationProvider, LocationSource};
pub use model::{ConditionIcon, Coordinate, CurrentWeather, parse_current};
pub use screen::{CardState, Command, Frontend, Phase, ScreenEvent, ScreenOptions, WeatherScreen};
pub use theme::{DayPhase, Gradient, Palette, Rgba};
