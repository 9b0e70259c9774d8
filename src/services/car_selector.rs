//! Selector del coche del día
//!
//! Funciones puras: reciben el catálogo, el histórico del store y una fuente
//! de aleatoriedad explícita, así los tests pueden fijar la semilla.
//!
//! Política de repetición: un coche no se repite dentro del mismo año salvo
//! que su categoría esté agotada.

use chrono::{Datelike, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::models::car::{Car, CarCategory};
use crate::models::card::CardMap;

/// Probabilidad acumulada de sacar lujo
const LUXURY_CUTOFF: f64 = 0.10;
/// Probabilidad acumulada de sacar lujo o especial (0.10 + 0.30)
const SPECIAL_CUTOFF: f64 = 0.40;

/// Resultado de la selección diaria
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub car: Car,
    pub color: String,
    pub is_holo: bool,
}

/// Categoría correspondiente a una tirada uniforme en [0, 1)
pub fn category_for_roll(roll: f64) -> CarCategory {
    if roll < LUXURY_CUTOFF {
        CarCategory::Luxury
    } else if roll < SPECIAL_CUTOFF {
        CarCategory::Special
    } else {
        CarCategory::JpPassenger
    }
}

/// Ids de coches ya usados en el año de `date`
pub fn used_car_ids_in_year(history: &CardMap, date: NaiveDate) -> HashSet<String> {
    let year = date.year();
    history
        .values()
        .filter(|record| record.year() == year)
        .map(|record| record.car.id.clone())
        .collect()
}

/// Candidatos de una categoría, excluyendo los ya usados si queda alguno
pub fn candidates_for_category<'a>(
    catalog: &'a Catalog,
    category: CarCategory,
    used_ids: &HashSet<String>,
    year: i32,
) -> Vec<&'a Car> {
    let in_category = catalog.by_category(category);

    if in_category.is_empty() {
        warn!("⚠️ Categoría {} sin coches en el catálogo, usando catálogo completo", category);
        return catalog.all().iter().collect();
    }

    let unused: Vec<&Car> = in_category
        .iter()
        .copied()
        .filter(|car| !used_ids.contains(&car.id))
        .collect();

    if unused.is_empty() {
        warn!(
            "⚠️ Categoría {} agotada en {}, se reutilizan coches",
            category, year
        );
        in_category
    } else {
        unused
    }
}

/// Elegir coche, color y holo para una fecha.
///
/// El catálogo nunca está vacío (lo garantiza `Catalog::new`), así que la
/// selección siempre tiene al menos un candidato.
pub fn select_car_for_date<R: Rng>(
    catalog: &Catalog,
    history: &CardMap,
    date: NaiveDate,
    rng: &mut R,
) -> Selection {
    let used_ids = used_car_ids_in_year(history, date);
    let category = category_for_roll(rng.gen::<f64>());
    let candidates = candidates_for_category(catalog, category, &used_ids, date.year());

    let car = candidates
        .choose(rng)
        .copied()
        .unwrap_or(&catalog.all()[0])
        .clone();

    let color = car
        .allowed_colors
        .choose(rng)
        .cloned()
        .unwrap_or_default();

    let is_holo = car.is_high_value();

    debug!(
        "🎲 {} -> {} ({}, {}, holo={}) entre {} candidatos",
        date,
        car.id,
        category,
        color,
        is_holo,
        candidates.len()
    );

    Selection { car, color, is_holo }
}
