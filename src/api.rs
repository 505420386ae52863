//! HTTP control surface: status, reload, and out-of-band message sending.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use poise::serenity_prelude::{ChannelId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::queue::{OutboundTask, TaskSender};
use crate::settings::{Settings, SettingsStore};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<SettingsStore>,
    pub tasks: TaskSender,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: String,
    message: String,
    config: Settings,
}

#[derive(Debug, Serialize)]
struct ApiResponse {
    status: String,
    message: String,
}

impl ApiResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendChannelMessageBody {
    channel_id: Option<String>,
    message_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendDmBody {
    user_id: Option<String>,
    message_content: Option<String>,
}

async fn status_handler(State(state): State<ApiState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        message: "Discord bot and control API are running.".to_string(),
        config: state.store.settings(),
    })
}

async fn reload_handler(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    let store = Arc::clone(&state.store);
    let report = match tokio::task::spawn_blocking(move || store.load()).await {
        Ok(report) => report,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Reload task failed: {e}"))),
            );
        }
    };

    if report.is_success() {
        info!("Configuration reload triggered via control surface");
        (
            StatusCode::OK,
            Json(ApiResponse::success("Configurations reloaded.")),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(report.errors.join("; "))),
        )
    }
}

async fn send_channel_message_handler(
    State(state): State<ApiState>,
    Json(body): Json<SendChannelMessageBody>,
) -> (StatusCode, Json<ApiResponse>) {
    let (Some(channel_id), Some(content)) = (body.channel_id, body.message_content) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Missing channel_id or message_content")),
        );
    };

    let Some(channel_id) = parse_snowflake(&channel_id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("channel_id must be a numeric Discord id")),
        );
    };

    enqueue(
        &state,
        OutboundTask::ChannelMessage {
            channel_id: ChannelId::new(channel_id),
            content,
        },
        "Channel message task queued.",
    )
}

async fn send_dm_handler(
    State(state): State<ApiState>,
    Json(body): Json<SendDmBody>,
) -> (StatusCode, Json<ApiResponse>) {
    let (Some(user_id), Some(content)) = (body.user_id, body.message_content) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Missing user_id or message_content")),
        );
    };

    let Some(user_id) = parse_snowflake(&user_id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("user_id must be a numeric Discord id")),
        );
    };

    enqueue(
        &state,
        OutboundTask::DirectMessage {
            user_id: UserId::new(user_id),
            content,
        },
        "Direct message task queued.",
    )
}

fn enqueue(
    state: &ApiState,
    task: OutboundTask,
    success_message: &str,
) -> (StatusCode, Json<ApiResponse>) {
    match state.tasks.push(task) {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(success_message)),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Message queue is unavailable.")),
        ),
    }
}

/// Discord snowflakes arrive as JSON strings; they must parse to a
/// non-zero u64.
fn parse_snowflake(value: &str) -> Option<u64> {
    value.parse().ok().filter(|&id| id != 0)
}

/// Create the control-surface router
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/reload", post(reload_handler))
        .route("/send_channel_message", post(send_channel_message_handler))
        .route("/send_dm", post(send_dm_handler))
        .with_state(state)
}

/// Bind and run the control surface.
pub async fn serve(state: ApiState, host: &str, port: u16) -> Result<()> {
    let app = router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Control surface listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{TaskReceiver, task_queue};

    fn state() -> (ApiState, TaskReceiver) {
        let (tx, rx) = task_queue();
        let dir = std::env::temp_dir().join("faqbot-api-tests-missing");
        let state = ApiState {
            store: Arc::new(SettingsStore::new(dir.join("config.toml"))),
            tasks: tx,
        };
        (state, rx)
    }

    #[tokio::test]
    async fn send_dm_without_content_is_rejected_and_queue_untouched() {
        let (state, mut rx) = state();
        let body = SendDmBody {
            user_id: Some("123".to_string()),
            message_content: None,
        };

        let (status, _) = send_dm_handler(State(state), Json(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(rx.try_pop(), None);
    }

    #[tokio::test]
    async fn send_dm_enqueues_a_direct_message_task() {
        let (state, mut rx) = state();
        let body = SendDmBody {
            user_id: Some("123".to_string()),
            message_content: Some("hello".to_string()),
        };

        let (status, response) = send_dm_handler(State(state), Json(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.status, "success");
        assert_eq!(
            rx.try_pop(),
            Some(OutboundTask::DirectMessage {
                user_id: UserId::new(123),
                content: "hello".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn send_channel_message_rejects_a_non_numeric_id() {
        let (state, mut rx) = state();
        let body = SendChannelMessageBody {
            channel_id: Some("general".to_string()),
            message_content: Some("hello".to_string()),
        };

        let (status, _) = send_channel_message_handler(State(state), Json(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(rx.try_pop(), None);
    }

    #[tokio::test]
    async fn send_channel_message_reports_a_closed_queue() {
        let (state, rx) = state();
        drop(rx);
        let body = SendChannelMessageBody {
            channel_id: Some("100".to_string()),
            message_content: Some("hello".to_string()),
        };

        let (status, response) = send_channel_message_handler(State(state), Json(body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.status, "error");
    }

    #[tokio::test]
    async fn status_reflects_the_current_settings() {
        let (state, _rx) = state();
        let response = status_handler(State(state)).await;
        assert_eq!(response.status, "ok");
        assert_eq!(response.config, Settings::default());
    }

    #[tokio::test]
    async fn reload_against_missing_files_reports_an_error() {
        let (state, _rx) = state();
        let (status, response) = reload_handler(State(state)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.status, "error");
    }

    #[test]
    fn snowflake_parsing_rejects_zero_and_garbage() {
        assert_eq!(parse_snowflake("123"), Some(123));
        assert_eq!(parse_snowflake("0"), None);
        assert_eq!(parse_snowflake("abc"), None);
        assert_eq!(parse_snowflake(""), None);
    }
}
