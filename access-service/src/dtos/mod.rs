pub mod actions;
pub mod auth;
pub mod credentials;
pub mod devices;
pub mod logs;
pub mod users;
