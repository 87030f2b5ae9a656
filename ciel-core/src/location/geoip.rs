use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{
    Authorization, FixTracker, LocationOutcome, LocationProvider, LocationSource, SourceEvent,
};
use crate::model::Coordinate;

const GEOIP_ENDPOINT: &str = "http://ip-api.com/json";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Fields of interest in an ip-api.com reply.
#[derive(Debug, Deserialize)]
struct GeoIpPayload {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// IP-based geolocation backend.
///
/// The process has no OS permission prompt, so consent comes from
/// configuration: disabled reads as denied, enabled starts out undetermined
/// and resolves to granted once requested. Each lookup is a single GET with
/// a short timeout, run in its own task and reported back as a source event.
#[derive(Debug)]
pub struct GeoIpSource {
    consent: bool,
    authorization: Authorization,
    endpoint: String,
    http: Client,
    tx: mpsc::UnboundedSender<SourceEvent>,
    rx: mpsc::UnboundedReceiver<SourceEvent>,
    lookup: Option<JoinHandle<()>>,
}

impl GeoIpSource {
    pub fn new(consent: bool) -> Self {
        Self::with_endpoint(consent, GEOIP_ENDPOINT.to_string())
    }

    pub fn with_endpoint(consent: bool, endpoint: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let authorization = if consent {
            Authorization::NotDetermined
        } else {
            Authorization::Denied
        };

        Self {
            consent,
            authorization,
            endpoint,
            http: Client::new(),
            tx,
            rx,
            lookup: None,
        }
    }
}

#[async_trait]
impl LocationSource for GeoIpSource {
    fn authorization(&self) -> Authorization {
        self.authorization
    }

    fn request_authorization(&mut self) {
        self.authorization = if self.consent {
            Authorization::Granted
        } else {
            Authorization::Denied
        };

        tracing::info!("Geolocation consent resolved to {:?}", self.authorization);
        let _ = self.tx.send(SourceEvent::AuthorizationChanged(self.authorization));
    }

    fn start_updates(&mut self) {
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let tx = self.tx.clone();

        self.lookup = Some(tokio::spawn(async move {
            let event = match lookup(&http, &endpoint).await {
                Ok(coordinate) => SourceEvent::Position(coordinate),
                Err(reason) => SourceEvent::Failed(reason),
            };

            let _ = tx.send(event);
        }));
    }

    fn stop_updates(&mut self) {
        if let Some(handle) = self.lookup.take() {
            handle.abort();
        }
    }

    async fn next_event(&mut self) -> Option<SourceEvent> {
        self.rx.recv().await
    }
}

async fn lookup(http: &Client, endpoint: &str) -> Result<Coordinate, String> {
    let res = http
        .get(endpoint)
        .timeout(LOOKUP_TIMEOUT)
        .send()
        .await
        .map_err(|e| format!("geoip request failed: {e}"))?;

    let payload: GeoIpPayload = res
        .json()
        .await
        .map_err(|e| format!("geoip payload unreadable: {e}"))?;

    if payload.status != "success" {
        return Err(format!(
            "geoip lookup refused: {}",
            payload.message.unwrap_or(payload.status)
        ));
    }

    match (payload.lat, payload.lon) {
        (Some(lat), Some(lon)) => Ok(Coordinate { latitude: lat, longitude: lon }),
        _ => Err("geoip reply carried no coordinates".to_string()),
    }
}

/// Production locator: one fresh acquisition over a geoip backend per call.
#[derive(Debug, Clone)]
pub struct GeoIpLocator {
    consent: bool,
    endpoint: String,
}

impl GeoIpLocator {
    pub fn new(consent: bool) -> Self {
        Self {
            consent,
            endpoint: GEOIP_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl LocationProvider for GeoIpLocator {
    async fn locate(&self) -> LocationOutcome {
        let source = GeoIpSource::with_endpoint(self.consent, self.endpoint.clone());
        FixTracker::new(source).acquire().await
    }
}
