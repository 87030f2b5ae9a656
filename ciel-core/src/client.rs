use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::WeatherError;
use crate::model::{Coordinate, CurrentWeather, parse_current};

const OPENWEATHER_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

/// One current-conditions request, addressed either way the endpoint
/// accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchTarget {
    City(String),
    Coordinate(Coordinate),
}

/// Transport seam for current-conditions requests.
///
/// Implementations return the raw body; decoding happens in the model
/// layer, so transport failures stay distinct from parse failures.
#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    async fn fetch_city(&self, city: &str) -> Result<Vec<u8>, WeatherError>;
    async fn fetch_coordinate(&self, coordinate: Coordinate) -> Result<Vec<u8>, WeatherError>;
}

/// OpenWeather current-conditions client.
///
/// One GET per call, no retries, no timeout beyond the transport defaults,
/// unit system fixed to metric. The key is injected at construction. The
/// response status is logged but not branched on: error documents flow into
/// the decoding pipeline and fail schema validation there.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    endpoint: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, OPENWEATHER_ENDPOINT.to_string())
    }

    /// Point the client at a different endpoint, e.g. a local mock.
    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        Self {
            api_key,
            endpoint,
            http: Client::new(),
        }
    }

    async fn fetch(&self, query: &[(&str, &str)]) -> Result<Vec<u8>, WeatherError> {
        let res = self
            .http
            .get(&self.endpoint)
            .query(query)
            .query(&[("units", "metric"), ("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.bytes().await?;

        tracing::debug!("OpenWeather answered {status} with {} bytes", body.len());

        Ok(body.to_vec())
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherClient {
    async fn fetch_city(&self, city: &str) -> Result<Vec<u8>, WeatherError> {
        self.fetch(&[("q", city)]).await
    }

    async fn fetch_coordinate(&self, coordinate: Coordinate) -> Result<Vec<u8>, WeatherError> {
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();

        self.fetch(&[("lat", lat.as_str()), ("lon", lon.as_str())]).await
    }
}

/// One fetch-and-decode step of a cycle.
pub async fn fetch_current(
    fetcher: &dyn WeatherFetcher,
    target: &FetchTarget,
) -> Result<CurrentWeather, WeatherError> {
    let body = match target {
        FetchTarget::City(city) => fetcher.fetch_city(city).await?,
        FetchTarget::Coordinate(coordinate) => fetcher.fetch_coordinate(*coordinate).await?,
    };

    parse_current(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &str =
        r#"{"main":{"temp":21.4},"weather":[{"description":"clear sky","icon":"01d"}],"name":"Paris"}"#;

    fn mock_client(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::with_endpoint(
            "KEY".to_string(),
            format!("{}/data/2.5/weather", server.uri()),
        )
    }

    async fn mount_weather(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn sends_city_query_with_metric_units_and_key() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Paris"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
            .expect(1)
            .mount(&server)
            .await;

        let body = mock_client(&server)
            .fetch_city("Paris")
            .await
            .expect("fetch must succeed");

        assert_eq!(body, BODY.as_bytes());
    }

    #[tokio::test]
    async fn city_names_survive_query_encoding() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "São Paulo"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
            .expect(1)
            .mount(&server)
            .await;

        mock_client(&server)
            .fetch_city("São Paulo")
            .await
            .expect("encoded fetch must succeed");
    }

    #[tokio::test]
    async fn sends_coordinates_as_lat_lon() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "48.85"))
            .and(query_param("lon", "2.35"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
            .expect(1)
            .mount(&server)
            .await;

        mock_client(&server)
            .fetch_coordinate(Coordinate { latitude: 48.85, longitude: 2.35 })
            .await
            .expect("coordinate fetch must succeed");
    }

    #[tokio::test]
    async fn connection_failures_surface_as_network_errors() {
        // Bind then drop to get a port with nothing listening on it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind an ephemeral port");
        let addr = listener.local_addr().expect("listener has a local address");
        drop(listener);

        let client = OpenWeatherClient::with_endpoint(
            "KEY".to_string(),
            format!("http://{addr}/data/2.5/weather"),
        );
        let err = client.fetch_city("Paris").await.unwrap_err();

        assert!(matches!(err, WeatherError::Network(_)));
    }

    #[tokio::test]
    async fn fetch_current_decodes_a_city_cycle() {
        let server = MockServer::start().await;
        mount_weather(&server, ResponseTemplate::new(200).set_body_string(BODY)).await;

        let client = mock_client(&server);
        let target = FetchTarget::City("Paris".to_string());
        let weather = fetch_current(&client, &target).await.expect("cycle must decode");

        assert_eq!(weather.city, "Paris");
        assert_eq!(weather.temperature_celsius, 21.4);
        assert_eq!(weather.icon_code, "01d");
    }

    #[tokio::test]
    async fn empty_bodies_are_reported_as_empty() {
        let server = MockServer::start().await;
        mount_weather(&server, ResponseTemplate::new(200)).await;

        let client = mock_client(&server);
        let target = FetchTarget::City("Paris".to_string());
        let err = fetch_current(&client, &target).await.unwrap_err();

        assert!(matches!(err, WeatherError::EmptyResponse));
    }

    #[tokio::test]
    async fn error_documents_fail_schema_validation() {
        let server = MockServer::start().await;
        mount_weather(
            &server,
            ResponseTemplate::new(404)
                .set_body_string(r#"{"cod":"404","message":"city not found"}"#),
        )
        .await;

        let client = mock_client(&server);
        let target = FetchTarget::City("Nowhere".to_string());
        let err = fetch_current(&client, &target).await.unwrap_err();

        assert!(matches!(err, WeatherError::Validation(_)));
    }

    #[tokio::test]
    async fn garbage_bodies_are_malformed() {
        let server = MockServer::start().await;
        mount_weather(&server, ResponseTemplate::new(200).set_body_string("not json at all")).await;

        let client = mock_client(&server);
        let target = FetchTarget::City("Paris".to_string());
        let err = fetch_current(&client, &target).await.unwrap_err();

        assert!(matches!(err, WeatherError::MalformedJson(_)));
    }
}
