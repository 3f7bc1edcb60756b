//! Adapter tests against a mock HTTP server.

use chrono::NaiveDate;
use weather_core::{
    Coordinate, FetchError,
    provider::{
        CurrentProvider, ForecastProvider, Geocoder, HistoricalProvider, opencage::OpenCageGeocoder,
        openmeteo::OpenMeteoArchive, openweather::OpenWeatherProvider,
    },
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn nyc() -> Coordinate {
    Coordinate::new(40.71, -74.0)
}

#[tokio::test]
async fn openweather_current_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("appid", "KEY"))
        .and(query_param("units", "metric"))
        .and(query_param("lang", "fr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "New York",
            "main": { "temp": 21.3, "humidity": 64 },
            "weather": [{ "description": "ciel dégagé" }],
            "wind": { "speed": 5.0 }
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("KEY".into()).with_base_url(&mock_server.uri());
    let raw = provider.fetch_current(nyc(), "fr").await.unwrap();

    assert_eq!(raw.location_name.as_deref(), Some("New York"));
    assert_eq!(raw.description.as_deref(), Some("ciel dégagé"));
    assert_eq!(raw.temperature_c, Some(21.3));
    assert_eq!(raw.humidity_pct, Some(64.0));
    assert_eq!(raw.wind_speed_kmh, Some(18.0));
}

#[tokio::test]
async fn openweather_error_status_carries_upstream_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("BAD".into()).with_base_url(&mock_server.uri());
    let err = provider.fetch_current(nyc(), "en").await.unwrap_err();

    match &err {
        FetchError::Status { status, body, .. } => {
            assert_eq!(*status, 401);
            assert!(body.contains("Invalid API key"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn openweather_malformed_body_is_a_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("KEY".into()).with_base_url(&mock_server.uri());
    let err = provider.fetch_forecast(nyc(), "en").await.unwrap_err();

    assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn openweather_forecast_samples_keep_local_time() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [
                {
                    "dt_txt": "2024-05-02 09:00:00",
                    "main": { "temp": 15.0, "humidity": 70 },
                    "weather": [{ "description": "overcast clouds" }],
                    "wind": { "speed": 2.0 }
                },
                {
                    "dt_txt": "2024-05-02 12:00:00",
                    "main": { "temp": 19.0 },
                    "weather": []
                }
            ]
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::new("KEY".into()).with_base_url(&mock_server.uri());
    let raw = provider.fetch_forecast(nyc(), "en").await.unwrap();

    assert_eq!(raw.samples.len(), 2);
    assert_eq!(raw.samples[0].wind_speed_kmh, Some(7.2));
    assert_eq!(raw.samples[1].local_time, "2024-05-02 12:00:00");
    assert_eq!(raw.samples[1].description, None);
    assert_eq!(raw.samples[1].humidity_pct, None);
}

#[tokio::test]
async fn open_meteo_window_requests_requested_dates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .and(query_param("start_date", "2024-05-04"))
        .and(query_param("end_date", "2024-05-07"))
        .and(query_param("timezone", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "daily": {
                "time": ["2024-05-04", "2024-05-05", "2024-05-06", "2024-05-07"],
                "temperature_2m_max": [20.1, 21.4, null, null],
                "temperature_2m_min": [11.0, 12.2, 10.5, null],
                "precipitation_sum": [0.0, null, 2.3, null],
                "weathercode": [1, 3, 61, null]
            }
        })))
        .mount(&mock_server)
        .await;

    let archive = OpenMeteoArchive::new().with_base_url(&mock_server.uri());
    let raw = archive
        .fetch_historical_window(
            nyc(),
            NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(raw.days.len(), 4);
    assert_eq!(raw.days[1].precipitation, None);
    assert_eq!(raw.days[2].temperature_max, None);
    assert_eq!(raw.days[2].weather_code, Some(61));
}

#[tokio::test]
async fn opencage_returns_first_match_or_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .and(query_param("q", "Paris"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{ "geometry": { "lat": 48.8566, "lng": 2.3522 } }]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/geocode/v1/json"))
        .and(query_param("q", "Atlantis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": [] })))
        .mount(&mock_server)
        .await;

    let geocoder = OpenCageGeocoder::new("KEY".into()).with_base_url(&mock_server.uri());

    assert_eq!(geocoder.geocode("Paris").await.unwrap(), Some(Coordinate::new(48.8566, 2.3522)));
    assert_eq!(geocoder.geocode("Atlantis").await.unwrap(), None);
}
