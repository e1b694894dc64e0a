//! The base turn context an adapter builds for each inbound activity.
//!
//! Owns the turn state, the responded flag and the hook lists. Outbound
//! operations stamp routing from the inbound activity, run the matching
//! hooks in registration order and then hand off to the adapter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use turnwire_core::{Activity, BotError, ResourceResponse, Result};

use crate::adapter::BotAdapter;
use crate::context::{TurnContext, TurnValue};
use crate::hooks::{
    DeleteActivityHandler, HookRegistry, SendActivitiesHandler, UpdateActivityHandler,
};

pub struct BotTurnContext {
    adapter: Arc<dyn BotAdapter>,
    activity: Activity,
    responded: AtomicBool,
    state: DashMap<String, TurnValue>,
    hooks: HookRegistry,
}

impl BotTurnContext {
    pub fn new(adapter: Arc<dyn BotAdapter>, activity: Activity) -> Self {
        Self {
            adapter,
            activity,
            responded: AtomicBool::new(false),
            state: DashMap::new(),
            hooks: HookRegistry::default(),
        }
    }
}

#[async_trait]
impl TurnContext for BotTurnContext {
    fn adapter(&self) -> Arc<dyn BotAdapter> {
        Arc::clone(&self.adapter)
    }

    fn activity(&self) -> &Activity {
        &self.activity
    }

    fn responded(&self) -> bool {
        self.responded.load(Ordering::SeqCst)
    }

    fn set_responded(&self, responded: bool) {
        self.responded.store(responded, Ordering::SeqCst);
    }

    fn get_value(&self, key: &str) -> Option<TurnValue> {
        self.state.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn set_value(&self, key: &str, value: TurnValue) {
        debug!(key, "turn state set");
        self.state.insert(key.to_string(), value);
    }

    fn has(&self, key: &str) -> bool {
        self.state.contains_key(key)
    }

    async fn send_text(&self, text: &str) -> Result<ResourceResponse> {
        self.send_activity(Activity::message(text)).await
    }

    async fn send_activity(&self, activity: Activity) -> Result<ResourceResponse> {
        let responses = self.send_activities(vec![activity]).await?;
        // Hooks may append activities after the caller's; the caller's ack is
        // first. An empty list means a send hook dropped the activity.
        responses.into_iter().next().ok_or_else(|| BotError::Blocked {
            reason: "activity dropped by send hook".to_string(),
        })
    }

    async fn send_activities(
        &self,
        mut activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>> {
        if activities.is_empty() {
            return Err(BotError::invalid_argument("expecting one or more activities"));
        }

        let reference = self.activity.conversation_reference();
        for activity in activities.iter_mut() {
            activity.apply_conversation_reference(&reference, false);
        }

        self.hooks.run_send(self, &mut activities)?;
        if activities.is_empty() {
            debug!("send hooks dropped every activity; nothing to deliver");
            return Ok(Vec::new());
        }

        let responses = self.adapter.send_activities(&activities).await?;
        if responses.len() != activities.len() {
            return Err(BotError::transport(format!(
                "adapter {} returned {} responses for {} activities",
                self.adapter.name(),
                responses.len(),
                activities.len()
            )));
        }

        if activities.iter().any(|a| !a.is_trace()) {
            self.set_responded(true);
        }

        debug!(count = responses.len(), "activities sent");
        Ok(responses)
    }

    async fn update_activity(&self, mut activity: Activity) -> Result<ResourceResponse> {
        let activity_id = match activity.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                return Err(BotError::invalid_argument(
                    "activity to update must carry the id of a sent activity",
                ))
            }
        };

        let reference = self.activity.conversation_reference();
        activity.apply_conversation_reference(&reference, false);

        self.hooks.run_update(self, &mut activity)?;
        let response = self.adapter.update_activity(&activity).await?;

        debug!(activity_id = %activity_id, "activity updated");
        Ok(response)
    }

    async fn delete_activity(&self, activity_id: &str) -> Result<()> {
        if activity_id.is_empty() {
            return Err(BotError::invalid_argument("activity id to delete is empty"));
        }

        let mut reference = self.activity.conversation_reference();
        reference.activity_id = Some(activity_id.to_string());

        self.hooks.run_delete(self, &reference)?;
        self.adapter.delete_activity(&reference).await?;

        debug!(activity_id, "activity deleted");
        Ok(())
    }

    fn on_send_activities(&self, handler: SendActivitiesHandler) -> &dyn TurnContext {
        self.hooks.add_send(handler);
        self
    }

    fn on_update_activity(&self, handler: UpdateActivityHandler) -> &dyn TurnContext {
        self.hooks.add_update(handler);
        self
    }

    fn on_delete_activity(&self, handler: DeleteActivityHandler) -> &dyn TurnContext {
        self.hooks.add_delete(handler);
        self
    }
}
