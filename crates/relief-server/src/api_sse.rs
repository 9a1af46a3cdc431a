//! SSE observer stream.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    extract::{Extension, Query},
    response::{sse::Event, Sse},
};
use futures_util::Stream;
use relief_types::Topic;
use serde::Deserialize;
use std::collections::HashSet;
use std::{convert::Infallible, sync::Arc};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

#[derive(Debug, Deserialize)]
pub struct EventStreamQuery {
    /// Comma-separated topic names. Absent or empty means every topic.
    pub topics: Option<String>,
}

/// Parses a `topics` query value.
pub fn parse_topics(raw: Option<&str>) -> Result<HashSet<Topic>, ApiError> {
    let requested: Vec<&str> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    if requested.is_empty() {
        return Ok(Topic::ALL.into_iter().collect());
    }
    requested
        .into_iter()
        .map(|t| t.parse::<Topic>().map_err(|e| ApiError::BadRequest(e.to_string())))
        .collect()
}

/// Handler for `GET /events/stream`.
///
/// Each SSE event is named after its topic, uses the hub sequence number as
/// its id, and carries the JSON envelope as data.
pub async fn event_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<EventStreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let topics = parse_topics(query.topics.as_deref())?;
    let stream = BroadcastStream::new(state.hub.receiver());

    let mapped_stream = stream.filter_map(move |result| match result {
        Ok(envelope) if topics.contains(&envelope.topic) => {
            match serde_json::to_string(&envelope) {
                Ok(data) => Some(Ok(Event::default()
                    .id(envelope.seq.to_string())
                    .event(envelope.topic.as_str())
                    .data(data))),
                Err(e) => {
                    tracing::error!("failed to serialize change event: {}", e);
                    None
                }
            }
        }
        Ok(_) => None,
        Err(broadcast_error) => {
            tracing::warn!(
                error = %broadcast_error,
                "SSE observer lagged; events were dropped for this subscriber"
            );
            None
        }
    });

    Ok(Sse::new(mapped_stream).keep_alive(axum::response::sse::KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_means_all_topics() {
        assert_eq!(parse_topics(None).unwrap().len(), 3);
        assert_eq!(parse_topics(Some(" , ")).unwrap().len(), 3);
    }

    #[test]
    fn parses_listed_topics() {
        let topics = parse_topics(Some("report_updated, resource_updated")).unwrap();
        assert_eq!(
            topics,
            HashSet::from([Topic::ReportUpdated, Topic::ResourceUpdated])
        );
        assert!(matches!(
            parse_topics(Some("disaster_updated,weather")),
            Err(ApiError::BadRequest(_))
        ));
    }
}
