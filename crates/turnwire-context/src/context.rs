use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use turnwire_core::{Activity, ResourceResponse, Result};

use crate::adapter::BotAdapter;
use crate::hooks::{DeleteActivityHandler, SendActivitiesHandler, UpdateActivityHandler};

/// A value stored in turn state. Shared, so readers on either side of a
/// decorator see the same allocation.
pub type TurnValue = Arc<dyn Any + Send + Sync>;

/// Everything a bot can do while handling one inbound activity.
///
/// Implemented by [`BotTurnContext`](crate::turn::BotTurnContext), which an
/// adapter builds per turn, and by decorators such as
/// [`TurnContextWrapper`](crate::wrapper::TurnContextWrapper) that forward to
/// an inner context. All mutation goes through `&self` so a context can be
/// shared behind an `Arc` by every layer that wraps it.
#[async_trait]
pub trait TurnContext: Send + Sync {
    /// The adapter that created this turn and delivers its activities.
    fn adapter(&self) -> Arc<dyn BotAdapter>;

    /// The inbound activity being processed.
    fn activity(&self) -> &Activity;

    /// Whether a non-trace activity has been sent this turn.
    fn responded(&self) -> bool;

    fn set_responded(&self, responded: bool);

    /// Raw turn-state read. Prefer [`TurnStateExt::get`] for typed access.
    fn get_value(&self, key: &str) -> Option<TurnValue>;

    /// Raw turn-state write; replaces any existing value for `key`.
    fn set_value(&self, key: &str, value: TurnValue);

    fn has(&self, key: &str) -> bool;

    /// Send `text` as a message activity.
    async fn send_text(&self, text: &str) -> Result<ResourceResponse>;

    async fn send_activity(&self, activity: Activity) -> Result<ResourceResponse>;

    /// Send a batch. Responses come back in the same order as `activities`.
    async fn send_activities(&self, activities: Vec<Activity>) -> Result<Vec<ResourceResponse>>;

    /// Replace a previously sent activity. `activity.id` names the target.
    async fn update_activity(&self, activity: Activity) -> Result<ResourceResponse>;

    async fn delete_activity(&self, activity_id: &str) -> Result<()>;

    /// Register a before-send hook and return the receiver for chaining.
    ///
    /// Decorators forward the registration inward and return themselves, so
    /// hooks always live on the base context while callers keep a handle on
    /// the outermost layer.
    fn on_send_activities(&self, handler: SendActivitiesHandler) -> &dyn TurnContext;

    fn on_update_activity(&self, handler: UpdateActivityHandler) -> &dyn TurnContext;

    fn on_delete_activity(&self, handler: DeleteActivityHandler) -> &dyn TurnContext;
}

/// Typed access to turn state on any [`TurnContext`].
///
/// A value stored under a different type reads as absent.
pub trait TurnStateExt {
    fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>>;
    fn set<T: Any + Send + Sync>(&self, key: &str, value: T);
}

impl<C: TurnContext + ?Sized> TurnStateExt for C {
    fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get_value(key)?.downcast::<T>().ok()
    }

    fn set<T: Any + Send + Sync>(&self, key: &str, value: T) {
        self.set_value(key, Arc::new(value));
    }
}
