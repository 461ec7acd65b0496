//! HTTP front end serving the feed.
//!
//! Every request to `/` runs fetch → parse → build against the upstream
//! listing. Nothing is cached between requests.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{Config, ConfigError};
use crate::feed::{FeedBuilder, FeedMeta, ATOM_CONTENT_TYPE};
use crate::fetch::{fetch_listing, FetchError, Source};
use crate::listing::{ExtractionPipeline, ListingError};

/// Errors surfaced to feed clients.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to fetch listing: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to read listing: {0}")]
    Listing(#[from] ListingError),
    #[error("Failed to write feed: {0:#}")]
    Feed(anyhow::Error),
}

impl ServiceError {
    fn status(&self) -> StatusCode {
        match self {
            // The upstream page was unusable either way.
            ServiceError::Fetch(_) | ServiceError::Listing(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Feed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = %status, error = %self, "Feed request failed");
        (status, self.to_string()).into_response()
    }
}

/// Everything a request needs; shared read-only across requests.
#[derive(Debug)]
pub struct AppState {
    client: reqwest::Client,
    source: Source,
    pipeline: ExtractionPipeline,
    builder: FeedBuilder,
}

impl AppState {
    pub fn new(
        client: reqwest::Client,
        source: Source,
        pipeline: ExtractionPipeline,
        builder: FeedBuilder,
    ) -> Self {
        Self {
            client,
            source,
            pipeline,
            builder,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let source = Source::from_config(config)?;
        let pipeline = ExtractionPipeline::new(source.url.clone())
            .with_zone(config.zone()?)
            .with_policy(config.on_malformed_row);
        let builder = FeedBuilder::new(FeedMeta::for_source(source.url.as_str()));
        Ok(Self::new(reqwest::Client::new(), source, pipeline, builder))
    }

    pub fn pipeline(&self) -> &ExtractionPipeline {
        &self.pipeline
    }

    pub fn builder(&self) -> &FeedBuilder {
        &self.builder
    }

    /// Fetches the listing and renders it as an Atom document.
    pub async fn render(&self) -> Result<String, ServiceError> {
        let html = fetch_listing(&self.client, &self.source).await?;
        let records = self.pipeline.parse(&html)?;
        let xml = self.builder.build(&records).map_err(ServiceError::Feed)?;
        tracing::info!(entries = records.len(), "Rendered feed");
        Ok(xml)
    }
}

/// Build the axum Router serving the feed at `/`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/", get(feed_handler)).with_state(state)
}

/// Serve on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Feed available at http://{addr}/");
    }
    axum::serve(listener, router(state)).await
}

async fn feed_handler(State(state): State<Arc<AppState>>) -> Result<Response, ServiceError> {
    let xml = state.render().await?;
    Ok(([(header::CONTENT_TYPE, ATOM_CONTENT_TYPE)], xml).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ServiceError::Fetch(FetchError::HttpStatus(500)).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::Listing(ListingError::UnknownLayout(None)).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::Feed(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_state_from_default_config() {
        let state = AppState::from_config(&Config::default()).unwrap();
        assert_eq!(
            state.pipeline().base().as_str(),
            "https://exhentai.org/watched"
        );
        assert_eq!(state.builder().meta(), &FeedMeta::default());
    }

    #[test]
    fn test_state_rejects_bad_timezone() {
        let config = Config {
            timezone: "somewhere".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            AppState::from_config(&config),
            Err(ConfigError::InvalidTimezone(_))
        ));
    }
}
