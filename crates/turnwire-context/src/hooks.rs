use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};
use turnwire_core::{Activity, BotError, ConversationReference, Result};

use crate::context::TurnContext;

/// The decision a before-hook returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Continue to the next hook, then to the adapter.
    Allow,
    /// Stop here. The operation fails with [`BotError::Blocked`].
    Block { reason: String },
}

impl HookAction {
    pub fn block(reason: impl Into<String>) -> Self {
        HookAction::Block { reason: reason.into() }
    }
}

/// Runs before a batch goes to the adapter. May edit, reorder or drop
/// activities in place.
pub type SendActivitiesHandler =
    Arc<dyn Fn(&dyn TurnContext, &mut Vec<Activity>) -> HookAction + Send + Sync>;

/// Runs before an update goes to the adapter. May edit the activity.
pub type UpdateActivityHandler =
    Arc<dyn Fn(&dyn TurnContext, &mut Activity) -> HookAction + Send + Sync>;

/// Runs before a delete goes to the adapter. Sees the reference of the
/// activity about to be removed.
pub type DeleteActivityHandler =
    Arc<dyn Fn(&dyn TurnContext, &ConversationReference) -> HookAction + Send + Sync>;

pub fn send_hook<F>(f: F) -> SendActivitiesHandler
where
    F: Fn(&dyn TurnContext, &mut Vec<Activity>) -> HookAction + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn update_hook<F>(f: F) -> UpdateActivityHandler
where
    F: Fn(&dyn TurnContext, &mut Activity) -> HookAction + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn delete_hook<F>(f: F) -> DeleteActivityHandler
where
    F: Fn(&dyn TurnContext, &ConversationReference) -> HookAction + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Hook lists owned by a base turn context.
///
/// Hooks run in registration order. Each run works on a snapshot of the list,
/// so a hook may register further hooks without deadlocking; those apply to
/// the next operation.
#[derive(Default)]
pub(crate) struct HookRegistry {
    send: RwLock<Vec<SendActivitiesHandler>>,
    update: RwLock<Vec<UpdateActivityHandler>>,
    delete: RwLock<Vec<DeleteActivityHandler>>,
}

impl HookRegistry {
    pub(crate) fn add_send(&self, handler: SendActivitiesHandler) {
        let mut hooks = self.send.write().unwrap_or_else(PoisonError::into_inner);
        hooks.push(handler);
        debug!(count = hooks.len(), "send hook registered");
    }

    pub(crate) fn add_update(&self, handler: UpdateActivityHandler) {
        let mut hooks = self.update.write().unwrap_or_else(PoisonError::into_inner);
        hooks.push(handler);
        debug!(count = hooks.len(), "update hook registered");
    }

    pub(crate) fn add_delete(&self, handler: DeleteActivityHandler) {
        let mut hooks = self.delete.write().unwrap_or_else(PoisonError::into_inner);
        hooks.push(handler);
        debug!(count = hooks.len(), "delete hook registered");
    }

    pub(crate) fn run_send(
        &self,
        ctx: &dyn TurnContext,
        activities: &mut Vec<Activity>,
    ) -> Result<()> {
        let hooks = snapshot(&self.send);
        for (index, hook) in hooks.iter().enumerate() {
            check(index, "send", hook(ctx, &mut *activities))?;
        }
        Ok(())
    }

    pub(crate) fn run_update(
        &self,
        ctx: &dyn TurnContext,
        activity: &mut Activity,
    ) -> Result<()> {
        let hooks = snapshot(&self.update);
        for (index, hook) in hooks.iter().enumerate() {
            check(index, "update", hook(ctx, &mut *activity))?;
        }
        Ok(())
    }

    pub(crate) fn run_delete(
        &self,
        ctx: &dyn TurnContext,
        reference: &ConversationReference,
    ) -> Result<()> {
        let hooks = snapshot(&self.delete);
        for (index, hook) in hooks.iter().enumerate() {
            check(index, "delete", hook(ctx, reference))?;
        }
        Ok(())
    }
}

fn snapshot<T: Clone>(list: &RwLock<Vec<T>>) -> Vec<T> {
    list.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn check(index: usize, operation: &'static str, action: HookAction) -> Result<()> {
    match action {
        HookAction::Allow => Ok(()),
        HookAction::Block { reason } => {
            warn!(operation, hook = index, reason = %reason, "hook blocked activity operation");
            Err(BotError::Blocked { reason })
        }
    }
}
