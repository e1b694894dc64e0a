//! In-memory adapter for exercising bots and decorators without a channel.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use turnwire_core::{
    Activity, BotError, ChannelAccount, ConversationAccount, ConversationReference,
    ResourceResponse, Result,
};
use uuid::Uuid;

use crate::adapter::BotAdapter;

pub const TEST_CHANNEL: &str = "test";

/// Records what a turn sends and lets tests script transport failures.
///
/// Sent activities get a fresh id and keep send order. Updates replace the
/// stored activity in place; deletes remove it. Unknown ids fail with
/// `NotFound`, like a real connector would.
#[derive(Default)]
pub struct TestAdapter {
    sent: Mutex<Vec<Activity>>,
    deleted: Mutex<Vec<String>>,
    fail_next: Mutex<Option<String>>,
    send_calls: AtomicUsize,
}

impl TestAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A user message addressed to this adapter's bot, ready for `run_turn`.
    pub fn inbound(&self, text: &str) -> Activity {
        Activity {
            id: Some(Uuid::new_v4().to_string()),
            timestamp: Some(Utc::now()),
            channel_id: Some(TEST_CHANNEL.to_string()),
            service_url: Some("https://test.invalid/".to_string()),
            from: Some(ChannelAccount::new("user1", Some("User1".to_string()))),
            recipient: Some(ChannelAccount::new("bot", Some("Bot".to_string()))),
            conversation: Some(ConversationAccount::new("conversation1")),
            ..Activity::message(text)
        }
    }

    /// Activities currently held, in send order.
    pub fn sent(&self) -> Vec<Activity> {
        lock(&self.sent).clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }

    /// Number of `send_activities` calls received, batched or not.
    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    /// Make the next adapter call fail with `TransportFailure(reason)`.
    pub fn fail_next(&self, reason: impl Into<String>) {
        *lock(&self.fail_next) = Some(reason.into());
    }

    fn take_failure(&self) -> Result<()> {
        match lock(&self.fail_next).take() {
            Some(reason) => Err(BotError::transport(reason)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BotAdapter for TestAdapter {
    fn name(&self) -> &str {
        TEST_CHANNEL
    }

    async fn send_activities(&self, activities: &[Activity]) -> Result<Vec<ResourceResponse>> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let mut sent = lock(&self.sent);
        let mut responses = Vec::with_capacity(activities.len());
        for activity in activities {
            let id = Uuid::new_v4().to_string();
            let mut stored = activity.clone();
            stored.id = Some(id.clone());
            stored.timestamp = Some(Utc::now());
            sent.push(stored);
            responses.push(ResourceResponse::new(id));
        }
        debug!(count = responses.len(), "test adapter recorded activities");
        Ok(responses)
    }

    async fn update_activity(&self, activity: &Activity) -> Result<ResourceResponse> {
        self.take_failure()?;
        let id = activity
            .id
            .clone()
            .ok_or_else(|| BotError::invalid_argument("update without activity id"))?;

        let mut sent = lock(&self.sent);
        let slot = sent
            .iter_mut()
            .find(|a| a.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| BotError::not_found(id.clone()))?;
        *slot = activity.clone();
        Ok(ResourceResponse::new(id))
    }

    async fn delete_activity(&self, reference: &ConversationReference) -> Result<()> {
        self.take_failure()?;
        let id = reference
            .activity_id
            .clone()
            .ok_or_else(|| BotError::invalid_argument("delete without activity id"))?;

        let mut sent = lock(&self.sent);
        let before = sent.len();
        sent.retain(|a| a.id.as_deref() != Some(id.as_str()));
        if sent.len() == before {
            return Err(BotError::not_found(id));
        }
        lock(&self.deleted).push(id);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
