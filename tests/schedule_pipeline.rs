//! Integration tests for the scheduling pipeline using wiremock.
//!
//! The Weather Underground API is replaced by a mock server serving the
//! sample astronomy and hourly forecast feeds; templates live in a temporary
//! directory.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tempfile::TempDir;
use weather_scheduler::config::WeatherConfig;
use weather_scheduler::{
    Context, ContextBuilder, FileTemplateStore, PaceTable, ScheduleRequest, Scheduler,
    SchedulerError, WundergroundClient,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ASTRONOMY: &str = include_str!("fixtures/astronomy.json");
const HOURLY: &str = include_str!("fixtures/hourly10day.json");

const ASTRONOMY_PATH: &str = "/abc123/astronomy/q/MN/Rochester.json";
const HOURLY_PATH: &str = "/abc123/hourly10day/q/MN/Rochester.json";

/// Monday morning, two days before the forecast entry for Wednesday 7 PM
fn monday_morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 3, 20)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn request(day: &str) -> ScheduleRequest {
    ScheduleRequest {
        context: Context::new()
            .with("footer", "See you there")
            .with("condition", "Sunny"),
        day: day.to_string(),
        key: "abc123".to_string(),
        location: "MN/Rochester".to_string(),
        time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
    }
}

async fn mount(server: &MockServer, feed_path: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(feed_path))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn serve_both_feeds(server: &MockServer) {
    mount(server, ASTRONOMY_PATH, ResponseTemplate::new(200).set_body_string(ASTRONOMY)).await;
    mount(server, HOURLY_PATH, ResponseTemplate::new(200).set_body_string(HOURLY)).await;
}

fn client(server: &MockServer) -> WundergroundClient {
    let config = WeatherConfig {
        base_url: server.uri(),
        ..WeatherConfig::default()
    };
    WundergroundClient::new(&config).unwrap()
}

fn templates(day: &str, template: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(day), template).unwrap();
    dir
}

const WEDNESDAY: &str = "{{ event_day }}{{ event_time }}, {{ event_date }}: {{ condition }}, \
{{ temperature_english }}F, wind {{ wind_direction }} {{ wind_speed_english }} mph, \
sunset{{ sunset_time }}, {{ daylight_in_minutes }} min of light. {{ footer }} @ {{ location }}\n";

#[tokio::test]
async fn test_schedule_renders_forecast_for_next_wednesday() {
    let server = MockServer::start().await;
    serve_both_feeds(&server).await;
    let dir = templates("wednesday", WEDNESDAY);

    let scheduler = Scheduler::new(client(&server), FileTemplateStore::new(dir.path()));
    let text = scheduler
        .schedule(&request("Wednesday"), monday_morning())
        .await
        .unwrap();

    assert_eq!(
        text,
        "Wednesday 7:00 PM, March 22, 2017: Chance of Rain, 40F, wind SE 8 mph, \
sunset 7:12 PM, 12.0 min of light. See you there @ MN/Rochester\n"
    );
}

#[tokio::test]
async fn test_failed_astronomy_feed_leaves_sun_fields_out() {
    let server = MockServer::start().await;
    mount(&server, ASTRONOMY_PATH, ResponseTemplate::new(500)).await;
    mount(&server, HOURLY_PATH, ResponseTemplate::new(200).set_body_string(HOURLY)).await;
    let dir = templates("wednesday", "[{{ sunset_time }}][{{ daylight_in_minutes }}][{{ probability_of_precipitation }}]");

    let text = Scheduler::new(client(&server), FileTemplateStore::new(dir.path()))
        .schedule(&request("wednesday"), monday_morning())
        .await
        .unwrap();

    assert_eq!(text, "[][][39]");
}

#[tokio::test]
async fn test_hourly_feed_without_forecast_key_leaves_forecast_fields_out() {
    let server = MockServer::start().await;
    mount(&server, ASTRONOMY_PATH, ResponseTemplate::new(200).set_body_string(ASTRONOMY)).await;
    mount(
        &server,
        HOURLY_PATH,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": {"error": {"type": "keynotfound"}}
        })),
    )
    .await;
    let dir = templates("wednesday", "{{ condition }}|{{ temperature_english }}|{{ sunset_time }}");

    let text = Scheduler::new(client(&server), FileTemplateStore::new(dir.path()))
        .schedule(&request("wednesday"), monday_morning())
        .await
        .unwrap();

    // The caller's own condition survives when no forecast entry is merged
    assert_eq!(text, "Sunny|| 7:12 PM");
}

#[tokio::test]
async fn test_unmatched_hour_renders_without_forecast() {
    let server = MockServer::start().await;
    serve_both_feeds(&server).await;
    let dir = templates("wednesday", "{{ event_time }}|{{ temperature_english }}");

    let mut request = request("wednesday");
    request.time = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
    let text = Scheduler::new(client(&server), FileTemplateStore::new(dir.path()))
        .schedule(&request, monday_morning())
        .await
        .unwrap();

    assert_eq!(text, " 6:00 PM|");
}

#[tokio::test]
async fn test_missing_template_aborts() {
    let server = MockServer::start().await;
    serve_both_feeds(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let err = Scheduler::new(client(&server), FileTemplateStore::new(dir.path()))
        .schedule(&request("wednesday"), monday_morning())
        .await
        .unwrap_err();

    assert!(matches!(err, SchedulerError::TemplateNotFound { ref day, .. } if day == "wednesday"));
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_pace_projection_uses_compact_names() {
    let server = MockServer::start().await;
    serve_both_feeds(&server).await;
    let dir = templates(
        "wednesday",
        "{{ temperature }}F {{ wind_speed }} mph, A+ {{ a_plus }} mph for {{ a_plus_distance }} mi, {{ daylight_in_hours }} h",
    );

    let text = Scheduler::new(client(&server), FileTemplateStore::new(dir.path()))
        .with_builder(ContextBuilder::pace(PaceTable::default()))
        .schedule(&request("wednesday"), monday_morning())
        .await
        .unwrap();

    assert_eq!(text, "40F 8 mph, A+ 20.0 mph for 4.00 mi, 0.2 h");
}

#[tokio::test]
async fn test_raw_feeds_are_dumped() {
    let server = MockServer::start().await;
    serve_both_feeds(&server).await;
    let dir = templates("wednesday", "ok");
    let dump = tempfile::tempdir().unwrap();

    let client = client(&server)
        .with_dump_directory(dump.path().to_path_buf(), monday_morning().date());
    Scheduler::new(client, FileTemplateStore::new(dir.path()))
        .schedule(&request("wednesday"), monday_morning())
        .await
        .unwrap();

    let astronomy = std::fs::read_to_string(dump.path().join("2017-03-20-astronomy.json")).unwrap();
    let hourly = std::fs::read_to_string(dump.path().join("2017-03-20-hourly10day.json")).unwrap();
    assert_eq!(astronomy, ASTRONOMY);
    assert_eq!(hourly, HOURLY);
}
