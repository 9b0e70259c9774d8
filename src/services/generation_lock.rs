//! Locks de generación por fecha
//!
//! Conjunto en memoria de las fechas que se están generando. Solo protege
//! dentro de un mismo proceso: con varias instancias del servidor no hay
//! ninguna garantía.
//!
//! La entrada se libera al soltar el `GenerationGuard`, en cualquier salida
//! (éxito, error, timeout o cancelación del future de la request).

use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct GenerationLocks {
    in_flight: Arc<Mutex<HashSet<NaiveDate>>>,
}

fn lock_set(set: &Mutex<HashSet<NaiveDate>>) -> MutexGuard<'_, HashSet<NaiveDate>> {
    // El set no queda inconsistente aunque otro hilo haya hecho panic
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl GenerationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tomar el lock de una fecha sin bloquear. `None` si ya está tomado.
    pub fn try_acquire(&self, date: NaiveDate) -> Option<GenerationGuard> {
        if !lock_set(&self.in_flight).insert(date) {
            return None;
        }
        debug!("🔒 Lock de generación tomado para {}", date);
        Some(GenerationGuard {
            in_flight: Arc::clone(&self.in_flight),
            date,
        })
    }

    pub fn is_locked(&self, date: NaiveDate) -> bool {
        lock_set(&self.in_flight).contains(&date)
    }

    /// Número de generaciones en curso
    pub fn in_flight(&self) -> usize {
        lock_set(&self.in_flight).len()
    }
}

/// Guard RAII: libera la fecha al hacer drop
#[derive(Debug)]
pub struct GenerationGuard {
    in_flight: Arc<Mutex<HashSet<NaiveDate>>>,
    date: NaiveDate,
}

impl GenerationGuard {
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        lock_set(&self.in_flight).remove(&self.date);
        debug!("🔓 Lock de generación liberado para {}", self.date);
    }
}
