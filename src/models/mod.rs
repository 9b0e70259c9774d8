//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos del catálogo de coches
//! y de las cartas diarias persistidas.

pub mod car;
pub mod card;

pub use car::*;
pub use card::*;
