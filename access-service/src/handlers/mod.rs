pub mod access_pins;
pub mod actions;
pub mod auth;
pub mod devices;
pub mod logs;
pub mod metrics;
pub mod nfc_cards;
pub mod users;
