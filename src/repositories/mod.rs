//! Repositorios
//!
//! Este módulo contiene la capa de persistencia de las cartas diarias.

pub mod card_store;

pub use card_store::{CardStore, JsonFileCardStore, StoreError};
