pub mod avatars;
pub mod connections;
pub mod engagement;
pub mod messages;

pub use avatars::AvatarService;
pub use connections::{ConnectionService, Connections};
pub use engagement::EngagementService;
pub use messages::{ConversationMessage, MessageService, NewMessage};
