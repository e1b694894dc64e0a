//! Console channel adapter.
//!
//! Each stdin line becomes an inbound message activity; outbound messages are
//! printed as `<bot name>: <text>`. The most recent printed activities are
//! remembered so the bot can edit or retract them, which shows up as a
//! follow-up line.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use turnwire_context::BotAdapter;
use turnwire_core::config::ConsoleConfig;
use turnwire_core::{
    Activity, ActivityType, BotError, ChannelAccount, ConversationAccount, ConversationReference,
    ResourceResponse, Result,
};

pub struct ConsoleAdapter {
    config: ConsoleConfig,
    output: Mutex<Box<dyn Write + Send>>,
    printed: DashMap<String, Activity>,
    /// Ids in `printed`, oldest first. Capped at `config.history_limit`.
    order: Mutex<VecDeque<String>>,
}

impl ConsoleAdapter {
    pub fn new(config: ConsoleConfig) -> Self {
        Self::with_output(config, Box::new(std::io::stdout()))
    }

    pub fn with_output(config: ConsoleConfig, output: Box<dyn Write + Send>) -> Self {
        Self {
            config,
            output: Mutex::new(output),
            printed: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
        }
    }

    /// Wrap a line typed by the user as an inbound message activity.
    pub fn inbound(&self, text: &str) -> Activity {
        Activity {
            // v7 ids sort by time, which keeps log correlation simple
            id: Some(Uuid::now_v7().to_string()),
            timestamp: Some(Utc::now()),
            channel_id: Some(self.config.channel_id.clone()),
            from: Some(ChannelAccount::new(
                self.config.user_id.clone(),
                Some(self.config.user_name.clone()),
            )),
            recipient: Some(ChannelAccount::new(
                self.config.bot_id.clone(),
                Some(self.config.bot_name.clone()),
            )),
            conversation: Some(ConversationAccount::new(self.config.conversation_id.clone())),
            ..Activity::message(text)
        }
    }

    /// Print the input prompt without a trailing newline.
    pub fn prompt(&self) -> Result<()> {
        if self.config.prompt.is_empty() {
            return Ok(());
        }
        self.write(&self.config.prompt, false)
    }

    fn write(&self, text: &str, newline: bool) -> Result<()> {
        let mut out = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        let written = if newline {
            writeln!(out, "{}", text)
        } else {
            write!(out, "{}", text)
        };
        written
            .and_then(|()| out.flush())
            .map_err(|e| BotError::transport(format!("console write failed: {}", e)))
    }

    fn history(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.order.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Index a printed activity, forgetting the oldest past the history limit.
    fn remember(&self, id: String, activity: Activity) {
        let mut order = self.history();
        self.printed.insert(id.clone(), activity);
        order.push_back(id);
        while order.len() > self.config.history_limit {
            let Some(oldest) = order.pop_front() else {
                break;
            };
            self.printed.remove(&oldest);
            debug!(activity_id = %oldest, "console forgot oldest printed activity");
        }
    }

    fn render(&self, activity: &Activity) -> Option<String> {
        match activity.activity_type {
            ActivityType::Message => Some(format!(
                "{}: {}",
                self.config.bot_name,
                activity.text.as_deref().unwrap_or_default()
            )),
            ActivityType::Typing => Some(format!("{} is typing...", self.config.bot_name)),
            _ => None,
        }
    }
}

#[async_trait]
impl BotAdapter for ConsoleAdapter {
    fn name(&self) -> &str {
        "console"
    }

    async fn send_activities(&self, activities: &[Activity]) -> Result<Vec<ResourceResponse>> {
        let mut responses = Vec::with_capacity(activities.len());
        for activity in activities {
            match self.render(activity) {
                Some(line) => self.write(&line, true)?,
                None => debug!(
                    activity_type = ?activity.activity_type,
                    name = activity.name.as_deref().unwrap_or_default(),
                    "console skipped non-printable activity"
                ),
            }

            let id = Uuid::new_v4().to_string();
            let mut stored = activity.clone();
            stored.id = Some(id.clone());
            self.remember(id.clone(), stored);
            responses.push(ResourceResponse::new(id));
        }
        Ok(responses)
    }

    async fn update_activity(&self, activity: &Activity) -> Result<ResourceResponse> {
        let id = activity
            .id
            .clone()
            .ok_or_else(|| BotError::invalid_argument("update without activity id"))?;

        let _order = self.history();
        if !self.printed.contains_key(&id) {
            return Err(BotError::not_found(id));
        }

        if let Some(line) = self.render(activity) {
            self.write(&format!("{} (edited)", line), true)?;
        }
        self.printed.insert(id.clone(), activity.clone());
        Ok(ResourceResponse::new(id))
    }

    async fn delete_activity(&self, reference: &ConversationReference) -> Result<()> {
        let id = reference
            .activity_id
            .clone()
            .ok_or_else(|| BotError::invalid_argument("delete without activity id"))?;

        let mut order = self.history();
        if self.printed.remove(&id).is_none() {
            return Err(BotError::not_found(id));
        }
        order.retain(|known| *known != id);
        drop(order);
        self.write(&format!("{} deleted a message", self.config.bot_name), true)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    /// Clonable in-memory sink so tests can read what the adapter printed.
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    pub(crate) fn console() -> (SharedBuf, ConsoleAdapter) {
        let buf = SharedBuf::default();
        let config = ConsoleConfig {
            bot_name: "Echo".to_string(),
            ..ConsoleConfig::default()
        };
        let adapter = ConsoleAdapter::with_output(config, Box::new(buf.clone()));
        (buf, adapter)
    }

    #[tokio::test]
    async fn prints_messages_and_skips_traces() {
        let (buf, adapter) = console();
        let responses = adapter
            .send_activities(&[
                Activity::message("hello"),
                Activity {
                    activity_type: ActivityType::Trace,
                    name: Some("debug".to_string()),
                    ..Default::default()
                },
            ])
            .await
            .unwrap();

        assert_eq!(responses.len(), 2);
        assert_eq!(buf.contents(), "Echo: hello\n");
    }

    #[tokio::test]
    async fn update_and_delete_known_activity() {
        let (buf, adapter) = console();
        let sent = adapter
            .send_activities(&[Activity::message("v1")])
            .await
            .unwrap();
        let id = sent[0].id.clone();

        let mut edit = Activity::message("v2");
        edit.id = Some(id.clone());
        adapter.update_activity(&edit).await.unwrap();

        let reference = ConversationReference {
            activity_id: Some(id),
            ..Default::default()
        };
        adapter.delete_activity(&reference).await.unwrap();

        assert_eq!(
            buf.contents(),
            "Echo: v1\nEcho: v2 (edited)\nEcho deleted a message\n"
        );
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (_buf, adapter) = console();
        let mut edit = Activity::message("v2");
        edit.id = Some("ghost".to_string());
        let err = adapter.update_activity(&edit).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        let reference = ConversationReference {
            activity_id: Some("ghost".to_string()),
            ..Default::default()
        };
        let err = adapter.delete_activity(&reference).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn printed_history_is_capped_and_forgets_oldest() {
        let config = ConsoleConfig {
            history_limit: 3,
            ..ConsoleConfig::default()
        };
        let adapter = ConsoleAdapter::with_output(config, Box::new(SharedBuf::default()));

        let mut ids = Vec::new();
        for n in 0..10 {
            let sent = adapter
                .send_activities(&[Activity::message(format!("line {}", n))])
                .await
                .unwrap();
            ids.push(sent[0].id.clone());
        }
        assert_eq!(adapter.printed.len(), 3);
        assert_eq!(adapter.history().len(), 3);

        let mut stale = Activity::message("too late");
        stale.id = Some(ids[0].clone());
        let err = adapter.update_activity(&stale).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        let mut recent = Activity::message("still editable");
        recent.id = Some(ids[9].clone());
        adapter.update_activity(&recent).await.unwrap();
        assert_eq!(adapter.printed.len(), 3);
    }

    #[tokio::test]
    async fn deleted_activity_frees_its_history_slot() {
        let config = ConsoleConfig {
            history_limit: 2,
            ..ConsoleConfig::default()
        };
        let adapter = ConsoleAdapter::with_output(config, Box::new(SharedBuf::default()));
        let first = adapter
            .send_activities(&[Activity::message("a"), Activity::message("b")])
            .await
            .unwrap();

        let reference = ConversationReference {
            activity_id: Some(first[1].id.clone()),
            ..Default::default()
        };
        adapter.delete_activity(&reference).await.unwrap();
        adapter
            .send_activities(&[Activity::message("c")])
            .await
            .unwrap();

        // "a" survives because the deleted "b" no longer counts against the limit
        assert_eq!(adapter.printed.len(), 2);
        assert!(adapter.printed.contains_key(&first[0].id));
    }

    #[test]
    fn inbound_carries_configured_identities() {
        let (_buf, adapter) = console();
        let activity = adapter.inbound("hi");
        assert_eq!(activity.text.as_deref(), Some("hi"));
        assert_eq!(activity.from.unwrap().id, "user");
        assert_eq!(activity.recipient.unwrap().name.as_deref(), Some("Echo"));
        assert_eq!(activity.channel_id.as_deref(), Some("console"));
        assert!(activity.id.is_some());
    }
}
