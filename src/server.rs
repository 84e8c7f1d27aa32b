// HTTP surface: stats for the two site sections, booking relay, chat and shows

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::booking::{BookingError, BookingRelay, BookingSubmission, SUCCESS_MESSAGE};
use crate::catalog::{ShowCatalog, ShowVideos};
use crate::chat::ChatResponder;
use crate::config::HighlightFigures;
use crate::error::AppError;
use crate::mailer::ConnectivityFailure;
use crate::stats::{NumberFormat, StatsService};

pub struct StatsSurface {
    pub service: StatsService,
    pub number_format: NumberFormat,
}

impl StatsSurface {
    pub fn new(service: StatsService, number_format: NumberFormat) -> Self {
        Self {
            service,
            number_format,
        }
    }

    fn display(&self, value: u64) -> String {
        self.number_format.format(value)
    }
}

pub struct AppState {
    pub hero: StatsSurface,
    pub highlights: StatsSurface,
    pub highlight_figures: HighlightFigures,
    // None when SMTP is not configured
    pub relay: Option<BookingRelay>,
    pub chat: ChatResponder,
    pub catalog: ShowCatalog,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeroDisplay {
    pub subscribers: String,
    pub videos: String,
    pub views: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeroStatsResponse {
    pub subscribers: u64,
    pub videos: u64,
    pub views: u64,
    pub categories: u32,
    pub display: HeroDisplay,
    pub degraded: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HighlightsDisplay {
    pub subscribers: String,
    pub followers: String,
    pub events: String,
    pub years: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HighlightsResponse {
    pub subscribers: u64,
    pub followers: u64,
    pub events: u64,
    pub years: u64,
    pub display: HighlightsDisplay,
    pub degraded: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let public = Router::new()
        .route("/api/stats/hero", get(hero_stats_handler))
        .route("/api/stats/highlights", get(highlights_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/shows", get(shows_handler))
        .layer(cors);

    // Booking answers its own OPTIONS, so it stays outside the CORS layer
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/booking", post(booking_handler).options(booking_options_handler))
        .merge(public)
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

pub async fn hero_stats_handler(State(state): State<Arc<AppState>>) -> Json<HeroStatsResponse> {
    let surface = &state.hero;
    let report = surface.service.refresh().await;
    let stats = report.stats;

    Json(HeroStatsResponse {
        subscribers: stats.subscribers,
        videos: stats.videos,
        views: stats.views,
        categories: stats.categories,
        display: HeroDisplay {
            subscribers: surface.display(stats.subscribers),
            videos: surface.display(stats.videos),
            views: surface.display(stats.views),
        },
        degraded: report.degraded,
    })
}

pub async fn highlights_handler(State(state): State<Arc<AppState>>) -> Json<HighlightsResponse> {
    let surface = &state.highlights;
    let report = surface.service.refresh().await;
    let figures = state.highlight_figures;

    Json(HighlightsResponse {
        subscribers: report.stats.subscribers,
        followers: figures.followers,
        events: figures.events,
        years: figures.years,
        display: HighlightsDisplay {
            subscribers: surface.display(report.stats.subscribers),
            followers: surface.display(figures.followers),
            events: surface.display(figures.events),
            years: surface.display(figures.years),
        },
        degraded: report.degraded,
    })
}

pub async fn booking_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookingSubmission>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(submission) = payload?;

    let Some(relay) = state.relay.as_ref() else {
        submission.validate()?;
        return Err(BookingError::TransportUnavailable(ConnectivityFailure::Other(
            "SMTP is not configured".to_string(),
        ))
        .into());
    };

    let receipt = relay.submit(submission).await?;
    info!(request_id = %receipt.request_id, "booking request accepted");
    Ok(Json(json!({ "message": SUCCESS_MESSAGE })))
}

pub async fn booking_options_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload?;
    let reply = state
        .chat
        .respond(&request.message)
        .ok_or_else(|| AppError::BadRequest("Message must not be empty".to_string()))?;

    Ok(Json(ChatResponse {
        reply: reply.to_string(),
    }))
}

pub async fn shows_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ShowVideos>> {
    Json(state.catalog.latest().await)
}
