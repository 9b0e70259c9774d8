pub mod card_dto;

pub use card_dto::*;
