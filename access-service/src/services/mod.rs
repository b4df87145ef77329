pub mod database;
pub mod jwt;
pub mod messages;
pub mod metrics;
pub mod registry;
pub mod validation;
pub mod whatsapp;

pub use database::Database;
pub use jwt::{AccessTokenClaims, JwtService};
pub use messages::{ActionStatus, InboundMessage, OutboundMessage};
pub use registry::{ChannelHandle, ConnectionRegistry, DeviceId, OutboundFrame};
pub use whatsapp::WhatsAppNotifier;
