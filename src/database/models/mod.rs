pub mod message;
pub mod trip;
pub mod user;

pub use message::Message;
pub use trip::{ConnectionTrip, Trip};
pub use user::{PublicProfile, UserProfile};
