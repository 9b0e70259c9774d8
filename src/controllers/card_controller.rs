use chrono::{Datelike, Duration, NaiveDate};

use crate::dto::card_dto::{CardResponse, CardSummary, GalleryCell, GalleryResponse};
use crate::models::card::{CardMap, CardRecord};
use crate::services::card_service::{image_file_name, CardOutcome, CardService};
use crate::utils::dates::{
    days_in_month, first_of_month, format_month, next_month, previous_month, require_date,
    validate_month,
};
use crate::utils::errors::AppError;

/// Respuesta del endpoint de carta
#[derive(Debug, Clone, PartialEq)]
pub enum CardReply {
    Ready(CardResponse),
    Generating,
}

pub struct CardController {
    service: CardService,
    images_url_prefix: String,
}

impl CardController {
    pub fn new(service: CardService, images_url_prefix: impl Into<String>) -> Self {
        Self {
            service,
            images_url_prefix: images_url_prefix.into(),
        }
    }

    /// URL pública del PNG de una fecha
    pub fn image_url(&self, date: NaiveDate) -> String {
        format!("{}/{}", self.images_url_prefix, image_file_name(date))
    }

    fn to_response(&self, record: CardRecord) -> CardResponse {
        CardResponse {
            image_url: self.image_url(record.date),
            record,
        }
    }

    /// Carta de una fecha recibida como query string
    pub async fn get_card(&self, date: Option<&str>) -> Result<CardReply, AppError> {
        let date = require_date(date)?;
        self.get_card_for(date).await
    }

    pub async fn get_card_for(&self, date: NaiveDate) -> Result<CardReply, AppError> {
        match self.service.get_or_generate(date).await? {
            CardOutcome::Ready(record) => Ok(CardReply::Ready(self.to_response(record))),
            CardOutcome::Generating => Ok(CardReply::Generating),
        }
    }

    /// Calendario del mes con las cartas existentes. No genera nada.
    pub async fn gallery(
        &self,
        month: Option<&str>,
        today: NaiveDate,
    ) -> Result<GalleryResponse, AppError> {
        let first = match month {
            Some(m) if !m.trim().is_empty() => validate_month(m)?,
            _ => first_of_month(today),
        };

        let cards = self.service.list_all().await?;
        let cells = self.month_cells(first, &cards);

        Ok(GalleryResponse {
            month: format_month(first),
            prev_month: format_month(previous_month(first)),
            next_month: format_month(next_month(first)),
            today,
            cells,
        })
    }

    fn month_cells(&self, first: NaiveDate, cards: &CardMap) -> Vec<Option<GalleryCell>> {
        let padding = first.weekday().num_days_from_sunday() as usize;
        let days = days_in_month(first);

        let mut cells: Vec<Option<GalleryCell>> = vec![None; padding];
        cells.extend((0..days).map(|offset| {
            let date = first + Duration::days(offset as i64);
            let card = cards.get(&date).map(|record| CardSummary {
                maker: record.car.maker.clone(),
                model: record.car.model.clone(),
                is_holo: record.is_holo,
                image_url: self.image_url(date),
            });
            Some(GalleryCell { date, card })
        }));
        cells
    }
}
