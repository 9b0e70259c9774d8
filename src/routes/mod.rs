pub mod card_routes;

pub use card_routes::create_card_router;
