mod handler;

pub use handler::{client_channel, device_channel};
