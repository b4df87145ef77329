mod access_pin;
mod action;
mod device;
mod log;
mod nfc_card;
mod token;
mod user;

pub use access_pin::AccessPin;
pub use action::DeviceAction;
pub use device::Device;
pub use log::{AccessLog, AccessType, NewLog};
pub use nfc_card::NfcCard;
pub use token::SessionToken;
pub use user::{SanitizedUser, User};
