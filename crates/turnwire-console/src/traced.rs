use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use turnwire_context::{
    BotAdapter, DeleteActivityHandler, SendActivitiesHandler, TurnContext, TurnContextWrapper,
    TurnValue, UpdateActivityHandler,
};
use turnwire_core::{Activity, ResourceResponse, Result};

/// Decorator that logs every outbound operation and state write, then
/// forwards through a [`TurnContextWrapper`].
pub struct TracedTurnContext {
    inner: TurnContextWrapper,
}

impl TracedTurnContext {
    pub fn new(ctx: Arc<dyn TurnContext>) -> Self {
        Self {
            inner: TurnContextWrapper::new(ctx),
        }
    }
}

fn traced<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => debug!(operation, "turn operation succeeded"),
        Err(e) => warn!(operation, code = e.code(), error = %e, "turn operation failed"),
    }
    result
}

#[async_trait]
impl TurnContext for TracedTurnContext {
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
        debug!(responded, "responded flag set");
        self.inner.set_responded(responded);
    }

    fn get_value(&self, key: &str) -> Option<TurnValue> {
        self.inner.get_value(key)
    }

    fn set_value(&self, key: &str, value: TurnValue) {
        debug!(key, "turn state write");
        self.inner.set_value(key, value);
    }

    fn has(&self, key: &str) -> bool {
        self.inner.has(key)
    }

    async fn send_text(&self, text: &str) -> Result<ResourceResponse> {
        debug!(len = text.len(), "send_text");
        traced("send_text", self.inner.send_text(text).await)
    }

    async fn send_activity(&self, activity: Activity) -> Result<ResourceResponse> {
        debug!(activity_type = ?activity.activity_type, "send_activity");
        traced("send_activity", self.inner.send_activity(activity).await)
    }

    async fn send_activities(&self, activities: Vec<Activity>) -> Result<Vec<ResourceResponse>> {
        debug!(count = activities.len(), "send_activities");
        traced("send_activities", self.inner.send_activities(activities).await)
    }

    async fn update_activity(&self, activity: Activity) -> Result<ResourceResponse> {
        debug!(activity_id = ?activity.id, "update_activity");
        traced("update_activity", self.inner.update_activity(activity).await)
    }

    async fn delete_activity(&self, activity_id: &str) -> Result<()> {
        debug!(activity_id, "delete_activity");
        traced("delete_activity", self.inner.delete_activity(activity_id).await)
    }

    fn on_send_activities(&self, handler: SendActivitiesHandler) -> &dyn TurnContext {
        debug!("send hook registered through tracer");
        self.inner.on_send_activities(handler);
        self
    }

    fn on_update_activity(&self, handler: UpdateActivityHandler) -> &dyn TurnContext {
        debug!("update hook registered through tracer");
        self.inner.on_update_activity(handler);
        self
    }

    fn on_delete_activity(&self, handler: DeleteActivityHandler) -> &dyn TurnContext {
        debug!("delete hook registered through tracer");
        self.inner.on_delete_activity(handler);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnwire_context::testing::TestAdapter;
    use turnwire_context::{delete_hook, update_hook, BotTurnContext, HookAction};

    #[tokio::test]
    async fn update_and_delete_hooks_register_through_tracer() {
        let adapter = Arc::new(TestAdapter::new());
        let base: Arc<dyn TurnContext> =
            Arc::new(BotTurnContext::new(adapter.clone(), adapter.inbound("hi")));
        let ctx = TracedTurnContext::new(base);

        ctx.on_update_activity(update_hook(|_, activity| {
            activity.text = activity.text.take().map(|t| format!("{}!", t));
            HookAction::Allow
        }))
        .on_delete_activity(delete_hook(|_, _| HookAction::block("keep it")));

        let ack = ctx.send_text("draft").await.unwrap();
        let mut edit = Activity::message("final");
        edit.id = Some(ack.id.clone());
        ctx.update_activity(edit).await.unwrap();
        assert_eq!(adapter.sent()[0].text.as_deref(), Some("final!"));

        let err = ctx.delete_activity(&ack.id).await.unwrap_err();
        assert_eq!(err.code(), "BLOCKED");
        assert!(adapter.deleted().is_empty());
    }
}
