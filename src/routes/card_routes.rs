use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tracing::info;

use crate::controllers::card_controller::CardReply;
use crate::dto::card_dto::{CardQuery, GalleryQuery, GalleryResponse, GeneratingResponse};
use crate::state::AppState;
use crate::utils::dates::{today_jst, yesterday_jst};
use crate::utils::errors::AppResult;

pub fn create_card_router() -> Router<AppState> {
    Router::new()
        .route("/api/card", get(get_card))
        .route("/api/card/today", get(get_today_card))
        .route("/api/card/yesterday", get(get_yesterday_card))
        .route("/api/gallery", get(get_gallery))
        .route("/health", get(health))
}

fn reply_to_response(reply: CardReply) -> Response {
    match reply {
        CardReply::Ready(card) => (StatusCode::OK, Json(card)).into_response(),
        CardReply::Generating => {
            (StatusCode::ACCEPTED, Json(GeneratingResponse::new())).into_response()
        }
    }
}

/// Carta de una fecha, generándola si hace falta
async fn get_card(
    State(state): State<AppState>,
    Query(query): Query<CardQuery>,
) -> AppResult<Response> {
    info!("🃏 Solicitud de carta para: {:?}", query.date);
    let reply = state.card_controller().get_card(query.date.as_deref()).await?;
    Ok(reply_to_response(reply))
}

/// Carta de hoy (JST)
async fn get_today_card(State(state): State<AppState>) -> AppResult<Response> {
    let today = today_jst();
    info!("🃏 Solicitud de la carta de hoy: {}", today);
    let reply = state.card_controller().get_card_for(today).await?;
    Ok(reply_to_response(reply))
}

/// Carta de ayer (JST), la que se muestra antes de revelar la de hoy
async fn get_yesterday_card(State(state): State<AppState>) -> AppResult<Response> {
    let yesterday = yesterday_jst();
    info!("🃏 Solicitud de la carta de ayer: {}", yesterday);
    let reply = state.card_controller().get_card_for(yesterday).await?;
    Ok(reply_to_response(reply))
}

/// Calendario mensual de cartas existentes
async fn get_gallery(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> AppResult<Json<GalleryResponse>> {
    let gallery = state
        .card_controller()
        .gallery(query.month.as_deref(), today_jst())
        .await?;
    Ok(Json(gallery))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
