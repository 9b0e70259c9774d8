//! Modelo de CardRecord
//!
//! Una carta por fecha de calendario. Una vez creada no se modifica: la
//! única escritura posible es sobrescribirla completa por su fecha.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::car::Car;

/// Carta diaria persistida en el store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardRecord {
    /// Todos los campos del coche seleccionado
    #[serde(flatten)]
    pub car: Car,
    /// Fecha de la carta (clave única, YYYY-MM-DD)
    pub date: NaiveDate,
    pub selected_color: String,
    pub is_holo: bool,
    /// Ruta en disco del PNG compuesto
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}

impl CardRecord {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Mapa fecha -> carta tal y como se guarda en meta.json
pub type CardMap = HashMap<NaiveDate, CardRecord>;
