//! Services module
//! 
//! Este módulo contiene la lógica de negocio: selección del coche del día,
//! composición de la carta y coordinación de la generación por fecha.

pub mod car_selector;
pub mod card_compositor;
pub mod card_service;
pub mod generation_lock;

pub use card_service::{CardOutcome, CardService, CardServiceError};
pub use generation_lock::{GenerationGuard, GenerationLocks};
