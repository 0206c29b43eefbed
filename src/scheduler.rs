//! Event scheduling pipeline
//!
//! resolve target date-time → fetch weather feeds → load the day's template
//! → match the forecast entry → build the context → render.

use chrono::{Datelike, NaiveDateTime, Timelike};
use tracing::{info, instrument, warn};

use crate::context::{Context, ContextBuilder};
use crate::matcher::match_forecast;
use crate::template::{JinjaRenderer, TemplateRenderer, TemplateStore};
use crate::weather::{WeatherSource, fetch_feeds};
use crate::weekday::{WallTime, resolve_target};
use crate::Result;

/// Inputs of one scheduling call
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    /// Caller supplied context, merged first
    pub context: Context,
    /// Weekday name of the event
    pub day: String,
    /// Weather API key
    pub key: String,
    /// Location query, e.g. "MN/Rochester"
    pub location: String,
    /// Event wall time
    pub time: WallTime,
}

/// Renders event templates from weather data
pub struct Scheduler {
    source: Box<dyn WeatherSource>,
    templates: Box<dyn TemplateStore>,
    renderer: Box<dyn TemplateRenderer>,
    builder: ContextBuilder,
}

impl Scheduler {
    pub fn new(
        source: impl WeatherSource + 'static,
        templates: impl TemplateStore + 'static,
    ) -> Self {
        Self {
            source: Box::new(source),
            templates: Box::new(templates),
            renderer: Box::new(JinjaRenderer::new()),
            builder: ContextBuilder::full(),
        }
    }

    #[must_use]
    pub fn with_builder(mut self, builder: ContextBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Render the template for `request.day` with the weather at the next
    /// occurrence of that day and time after `now`.
    ///
    /// Weather feed failures and a missing forecast entry only reduce the
    /// context; an invalid day or a missing template fail the call.
    #[instrument(skip(self, request), fields(day = %request.day, location = %request.location))]
    pub async fn schedule(&self, request: &ScheduleRequest, now: NaiveDateTime) -> Result<String> {
        let target = resolve_target(&request.day, request.time, now)?;
        info!(%target, "Scheduling event");

        let feeds = fetch_feeds(self.source.as_ref(), &request.key, &request.location).await;
        let template = self.templates.load(&request.day)?;

        let forecast = feeds
            .hourly
            .as_ref()
            .and_then(|series| match_forecast(series.entries(), target));
        if forecast.is_none() {
            warn!(
                day = target.day(),
                hour = target.hour(),
                "No forecast entry matches the event, rendering without forecast fields"
            );
        }

        let context = self
            .builder
            .build(&request.context, target, feeds.astronomy.as_ref(), forecast)
            .with("location", request.location.as_str());
        self.renderer.render(&template, &context)
    }
}
