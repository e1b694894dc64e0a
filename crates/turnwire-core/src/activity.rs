//! Activity schema shared by adapters, turn contexts and bots.
//!
//! Field names follow the Bot Framework wire format (camelCase, optional
//! fields omitted when absent) so activities can be handed to a connector
//! service unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of activity exchanged between a bot and its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    #[default]
    Message,
    Typing,
    Event,
    /// Diagnostic output. Never counts as a response to the user.
    Trace,
    ConversationUpdate,
    EndOfConversation,
}

/// A user or bot identity on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self { id: id.into(), name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
}

impl ConversationAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: None, is_group: None }
    }
}

/// A message or event travelling between a bot and a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Trace/event name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl Activity {
    /// Outbound text message with no routing information yet.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Message,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn trace(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            activity_type: ActivityType::Trace,
            name: Some(name.into()),
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn is_trace(&self) -> bool {
        self.activity_type == ActivityType::Trace
    }

    /// Routing fields needed to reply to (or proactively continue) this
    /// conversation. `user` is the sender, `bot` the recipient.
    pub fn conversation_reference(&self) -> ConversationReference {
        ConversationReference {
            activity_id: self.id.clone(),
            user: self.from.clone(),
            bot: self.recipient.clone(),
            conversation: self.conversation.clone(),
            channel_id: self.channel_id.clone(),
            service_url: self.service_url.clone(),
        }
    }

    /// Stamp routing fields from `reference` onto this activity.
    ///
    /// Outbound (`is_incoming == false`): sent from the bot to the user as a
    /// reply to `reference.activity_id`. Incoming: from the user to the bot,
    /// taking the reference's activity id as its own.
    pub fn apply_conversation_reference(
        &mut self,
        reference: &ConversationReference,
        is_incoming: bool,
    ) {
        self.channel_id = reference.channel_id.clone();
        self.service_url = reference.service_url.clone();
        self.conversation = reference.conversation.clone();

        if is_incoming {
            self.from = reference.user.clone();
            self.recipient = reference.bot.clone();
            if reference.activity_id.is_some() {
                self.id = reference.activity_id.clone();
            }
        } else {
            self.from = reference.bot.clone();
            self.recipient = reference.user.clone();
            if reference.activity_id.is_some() {
                self.reply_to_id = reference.activity_id.clone();
            }
        }
    }
}

/// Everything needed to address an activity within an existing conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
}

/// Acknowledgment returned by the transport for a sent or updated activity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceResponse {
    pub id: String,
}

impl ResourceResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
