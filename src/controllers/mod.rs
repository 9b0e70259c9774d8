pub mod card_controller;

pub use card_controller::{CardController, CardReply};
