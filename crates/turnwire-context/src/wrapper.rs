//! Decorator base for turn contexts.
//!
//! Adapters build the [`TurnContext`] that reaches the bot. To add behaviour
//! on top of a context you did not create, wrap it: `TurnContextWrapper`
//! forwards every call to the inner context unchanged, and custom decorators
//! embed one and override only what they need.
//!
//! The wrapper owns nothing but the inner reference. Turn state, the
//! responded flag and hook lists all stay on the inner context, so any number
//! of wrappers around the same context observe each other's writes.

use std::sync::Arc;

use async_trait::async_trait;
use turnwire_core::{Activity, BotError, ResourceResponse, Result};

use crate::adapter::BotAdapter;
use crate::context::{TurnContext, TurnValue};
use crate::hooks::{DeleteActivityHandler, SendActivitiesHandler, UpdateActivityHandler};

pub struct TurnContextWrapper {
    inner: Arc<dyn TurnContext>,
}

impl TurnContextWrapper {
    pub fn new(inner: Arc<dyn TurnContext>) -> Self {
        Self { inner }
    }

    /// Wrap a context that may be absent, e.g. one pulled from an optional
    /// slot. Fails with `InvalidArgument` instead of producing a wrapper with
    /// nothing to forward to.
    pub fn try_new(inner: Option<Arc<dyn TurnContext>>) -> Result<Self> {
        inner
            .map(Self::new)
            .ok_or_else(|| BotError::invalid_argument("inner turn context is required"))
    }

    /// The context this wrapper forwards to.
    pub fn inner(&self) -> &Arc<dyn TurnContext> {
        &self.inner
    }
}

#[async_trait]
impl TurnContext for TurnContextWrapper {
    fn adapter(&self) -> Arc<dyn BotAdapter> {
        self.inner.adapter()
    }

    fn activity(&self) -> &Activity {
        self.inner.activity()
    }

    fn responded(&self) -> bool {
        self.inner.responded()
    }

    fn set_responded(&self, responded: bool) {
        self.inner.set_responded(responded);
    }

    fn get_value(&self, key: &str) -> Option<TurnValue> {
        self.inner.get_value(key)
    }

    fn set_value(&self, key: &str, value: TurnValue) {
        self.inner.set_value(key, value);
    }

    fn has(&self, key: &str) -> bool {
        self.inner.has(key)
    }

    async fn send_text(&self, text: &str) -> Result<ResourceResponse> {
        self.inner.send_text(text).await
    }

    async fn send_activity(&self, activity: Activity) -> Result<ResourceResponse> {
        self.inner.send_activity(activity).await
    }

    async fn send_activities(&self, activities: Vec<Activity>) -> Result<Vec<ResourceResponse>> {
        self.inner.send_activities(activities).await
    }

    async fn update_activity(&self, activity: Activity) -> Result<ResourceResponse> {
        self.inner.update_activity(activity).await
    }

    async fn delete_activity(&self, activity_id: &str) -> Result<()> {
        self.inner.delete_activity(activity_id).await
    }

    fn on_send_activities(&self, handler: SendActivitiesHandler) -> &dyn TurnContext {
        self.inner.on_send_activities(handler);
        self
    }

    fn on_update_activity(&self, handler: UpdateActivityHandler) -> &dyn TurnContext {
        self.inner.on_update_activity(handler);
        self
    }

    fn on_delete_activity(&self, handler: DeleteActivityHandler) -> &dyn TurnContext {
        self.inner.on_delete_activity(handler);
        self
    }
}
