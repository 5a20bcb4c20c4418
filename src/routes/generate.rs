//! Generation routes
//!
//! Curriculum generation, one-shot content generation and streamed content
//! over Server-Sent Events.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::stream::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::models::curriculum::Curriculum;
use crate::models::response::{
    required_field, ContentResponse, GenerateContentRequest, GenerateCurriculumRequest,
};
use crate::routes::json_body;
use crate::services::{ContentStreamEvent, ContentTarget};
use crate::state::AppState;
use crate::utils::error::AppResult;

const SSE_BUFFER: usize = 32;

/// `(topic, curriculum title, persistence target)` of a content request
fn content_args(req: GenerateContentRequest) -> AppResult<(String, String, Option<ContentTarget>)> {
    let topic = required_field(req.topic, "Topic is required")?;
    let title = req.curriculum_title.unwrap_or_default();
    let target = match (req.curriculum_id, req.topic_id) {
        (Some(curriculum_id), Some(topic_id)) if !curriculum_id.is_empty() && !topic_id.is_empty() => {
            Some(ContentTarget {
                curriculum_id,
                topic_id,
            })
        }
        _ => None,
    };
    Ok((topic, title, target))
}

pub async fn generate_curriculum(
    State(state): State<AppState>,
    payload: Result<Json<GenerateCurriculumRequest>, JsonRejection>,
) -> AppResult<Json<Curriculum>> {
    let req = json_body(payload)?;
    let input = required_field(req.input, "Invalid input provided")?;
    let curriculum = state.generation().create_curriculum(&input).await?;
    Ok(Json(curriculum))
}

pub async fn generate_content(
    State(state): State<AppState>,
    payload: Result<Json<GenerateContentRequest>, JsonRejection>,
) -> AppResult<Json<ContentResponse>> {
    let (topic, title, target) = content_args(json_body(payload)?)?;
    let content = state
        .generation()
        .generate_content(&topic, &title, target.as_ref())
        .await?;
    Ok(Json(ContentResponse { content }))
}

fn sse_event(event: &ContentStreamEvent) -> Result<Event, axum::Error> {
    let name = match event {
        ContentStreamEvent::Partial { .. } => "partial",
        ContentStreamEvent::Error { .. } => "error",
        ContentStreamEvent::Complete { .. } => "complete",
    };
    Event::default().event(name).json_data(event)
}

/// Stream content snapshots as `partial` events, ending with `complete`.
///
/// Dropping the response (client disconnect) cancels the generation.
pub async fn stream_content(
    State(state): State<AppState>,
    payload: Result<Json<GenerateContentRequest>, JsonRejection>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let (topic, title, target) = content_args(json_body(payload)?)?;

    let (tx, rx) = mpsc::channel(SSE_BUFFER);
    let cancel = state.request_token();
    let guard = cancel.clone().drop_guard();

    tokio::spawn(async move {
        let result = state
            .generation()
            .stream_content(&topic, &title, target, tx.clone(), cancel)
            .await;
        if let Err(e) = result {
            tracing::warn!(topic = %topic, error = %e, "content stream failed");
            let _ = tx
                .send(ContentStreamEvent::Error {
                    message: e.public_message(),
                })
                .await;
        }
    });

    let stream = ReceiverStream::new(rx).map(move |event| {
        let _alive = &guard;
        sse_event(&event)
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
