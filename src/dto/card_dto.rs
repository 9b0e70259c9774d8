use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::card::CardRecord;

// Query de GET /api/card
#[derive(Debug, Default, Deserialize)]
pub struct CardQuery {
    pub date: Option<String>,
}

// Query de GET /api/gallery
#[derive(Debug, Default, Deserialize)]
pub struct GalleryQuery {
    pub month: Option<String>,
}

// Carta completa con la URL pública de su imagen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardResponse {
    #[serde(flatten)]
    pub record: CardRecord,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

// 202 mientras la carta se genera
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratingResponse {
    pub status: String,
}

impl GeneratingResponse {
    pub fn new() -> Self {
        Self {
            status: "generating".to_string(),
        }
    }
}

impl Default for GeneratingResponse {
    fn default() -> Self {
        Self::new()
    }
}

// Resumen de carta para la galería
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardSummary {
    pub maker: String,
    pub model: String,
    pub is_holo: bool,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryCell {
    pub date: NaiveDate,
    pub card: Option<CardSummary>,
}

// Calendario del mes: `None` son las celdas de relleno antes del día 1
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryResponse {
    pub month: String,
    pub prev_month: String,
    pub next_month: String,
    pub today: NaiveDate,
    pub cells: Vec<Option<GalleryCell>>,
}
