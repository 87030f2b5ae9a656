use thiserror::Error;

/// Failure kinds for one fetch cycle.
///
/// Every kind is terminal for the cycle that produced it; nothing is retried
/// automatically. `PermissionDenied` and `Location` are recovered by
/// substituting the default city, the rest surface as a dismissible
/// notification.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location lookup failed: {0}")]
    Location(String),

    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("response body was empty")]
    EmptyResponse,

    #[error("response body is not valid JSON: {0}")]
    MalformedJson(serde_json::Error),

    #[error("response field `{0}` is missing or has the wrong type")]
    Validation(&'static str),
}

impl WeatherError {
    /// Short text for the notification shown to the user. Technical detail
    /// goes to the log instead.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Location permission denied. Showing the default city.",
            Self::Location(_) => "Could not determine your location. Showing the default city.",
            Self::Network(_) => "Network error. Check your connection and try again.",
            Self::EmptyResponse => "The weather service sent an empty reply.",
            Self::MalformedJson(_) => "The weather service sent an unreadable reply.",
            Self::Validation(_) => "The weather service reply was missing expected data.",
        }
    }
}
