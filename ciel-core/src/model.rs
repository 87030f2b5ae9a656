use serde_json::Value;

use crate::error::WeatherError;

/// Latitude/longitude pair for one location fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Validated current-conditions snapshot built from one response body.
///
/// Construction is all-or-nothing: every field must be present with the
/// right type in the source JSON, otherwise no value is produced. The
/// temperature is kept exactly as received; rounding is a presentation
/// concern.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub city: String,
    pub temperature_celsius: f64,
    pub description: String,
    pub icon_code: String,
}

impl CurrentWeather {
    /// Extract the four required fields from a decoded response.
    ///
    /// The error names the first field path that is missing or mistyped.
    /// Extra fields in the source are ignored.
    pub fn from_value(value: &Value) -> Result<Self, WeatherError> {
        let city = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or(WeatherError::Validation("name"))?;

        let temperature_celsius = value
            .pointer("/main/temp")
            .and_then(Value::as_f64)
            .ok_or(WeatherError::Validation("main.temp"))?;

        let conditions = value
            .pointer("/weather/0")
            .ok_or(WeatherError::Validation("weather[0]"))?;

        let description = conditions
            .get("description")
            .and_then(Value::as_str)
            .ok_or(WeatherError::Validation("weather[0].description"))?;

        let icon_code = conditions
            .get("icon")
            .and_then(Value::as_str)
            .ok_or(WeatherError::Validation("weather[0].icon"))?;

        Ok(Self {
            city: city.to_string(),
            temperature_celsius,
            description: description.to_string(),
            icon_code: icon_code.to_string(),
        })
    }

    pub fn icon(&self) -> ConditionIcon {
        ConditionIcon::from_code(&self.icon_code)
    }
}

/// Decode one response body into a model.
///
/// The failure stages stay distinct: an empty body, a body that is not JSON
/// at all, and JSON that does not match the expected shape.
pub fn parse_current(body: &[u8]) -> Result<CurrentWeather, WeatherError> {
    if body.is_empty() {
        return Err(WeatherError::EmptyResponse);
    }

    let value: Value = serde_json::from_slice(body).map_err(WeatherError::MalformedJson)?;

    CurrentWeather::from_value(&value)
}

/// Presentation icon for a provider icon code.
///
/// Day/night code pairs collapse to one identifier; every code outside the
/// table falls back to the generic cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionIcon {
    Sun,
    FewClouds,
    ScatteredClouds,
    BrokenClouds,
    ShowerRain,
    Rain,
    Thunderstorm,
    Snow,
    Mist,
    #[default]
    Cloud,
}

impl ConditionIcon {
    pub fn from_code(code: &str) -> Self {
        match code {
            "01d" | "01n" => Self::Sun,
            "02d" | "02n" => Self::FewClouds,
            "03d" | "03n" => Self::ScatteredClouds,
            "04d" | "04n" => Self::BrokenClouds,
            "09d" | "09n" => Self::ShowerRain,
            "10d" | "10n" => Self::Rain,
            "11d" | "11n" => Self::Thunderstorm,
            "13d" | "13n" => Self::Snow,
            "50d" | "50n" => Self::Mist,
            _ => Self::Cloud,
        }
    }

    /// Stable short name, used in logs and plain output.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sun => "sun",
            Self::FewClouds => "few_clouds",
            Self::ScatteredClouds => "scattered_clouds",
            Self::BrokenClouds => "broken_clouds",
            Self::ShowerRain => "shower_rain",
            Self::Rain => "rain",
            Self::Thunderstorm => "thunderstorm",
            Self::Snow => "snow",
            Self::Mist => "mist",
            Self::Cloud => "cloud",
        }
    }

    /// Glyph for terminal rendering.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Sun => "☀",
            Self::FewClouds => "⛅",
            Self::ScatteredClouds => "☁",
            Self::BrokenClouds => "🌥",
            Self::ShowerRain => "🌦",
            Self::Rain => "🌧",
            Self::Thunderstorm => "⛈",
            Self::Snow => "❄",
            Self::Mist => "🌫",
            Self::Cloud => "☁",
        }
    }
}
