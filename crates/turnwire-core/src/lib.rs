pub mod activity;
pub mod config;
pub mod error;

pub use activity::{
    Activity, ActivityType, ChannelAccount, ConversationAccount, ConversationReference,
    ResourceResponse,
};
pub use config::TurnwireConfig;
pub use error::{BotError, Result};
