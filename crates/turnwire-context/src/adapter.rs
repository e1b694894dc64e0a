use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use turnwire_core::{Activity, ActivityType, ConversationReference, ResourceResponse, Result};

use crate::context::TurnContext;
use crate::turn::BotTurnContext;

/// Name of the event activity synthesised for proactive turns.
pub const CONTINUE_CONVERSATION_EVENT: &str = "ContinueConversation";

/// Transport seam implemented by every channel (connector service, console,
/// in-memory test double, …).
///
/// Turn contexts never talk to the network themselves; they run their hooks
/// and hand the result to the adapter that created them.
#[async_trait]
pub trait BotAdapter: Send + Sync {
    /// Stable identifier used in logs (e.g. `"console"`).
    fn name(&self) -> &str;

    /// Deliver `activities` in order and return one response per activity,
    /// in the same order.
    async fn send_activities(&self, activities: &[Activity]) -> Result<Vec<ResourceResponse>>;

    /// Replace the activity identified by `activity.id`.
    ///
    /// Fails with `NotFound` when the id is unknown to the transport.
    async fn update_activity(&self, activity: &Activity) -> Result<ResourceResponse>;

    /// Remove the activity identified by `reference.activity_id`.
    async fn delete_activity(&self, reference: &ConversationReference) -> Result<()>;
}

/// Bot logic invoked once per turn.
#[async_trait]
pub trait TurnHandler: Send + Sync {
    async fn on_turn(&self, ctx: Arc<dyn TurnContext>) -> Result<()>;
}

/// Build a base context for `activity`, run `handler` against it and drop it.
///
/// Turn state and hooks live exactly as long as this call.
pub async fn run_turn(
    adapter: Arc<dyn BotAdapter>,
    activity: Activity,
    handler: &dyn TurnHandler,
) -> Result<()> {
    let activity_id = activity.id.clone().unwrap_or_default();
    debug!(adapter = adapter.name(), activity_id = %activity_id, "turn started");

    let ctx: Arc<dyn TurnContext> = Arc::new(BotTurnContext::new(adapter, activity));
    let result = handler.on_turn(Arc::clone(&ctx)).await;

    match &result {
        Ok(()) => {
            debug!(activity_id = %activity_id, responded = ctx.responded(), "turn completed");
        }
        Err(e) => {
            warn!(activity_id = %activity_id, code = e.code(), error = %e, "turn failed");
        }
    }
    result
}

/// Run a proactive turn in an existing conversation.
///
/// The handler sees a `ContinueConversation` event addressed from the
/// reference's user to its bot, so replies route back into that conversation.
pub async fn continue_conversation(
    adapter: Arc<dyn BotAdapter>,
    reference: &ConversationReference,
    handler: &dyn TurnHandler,
) -> Result<()> {
    let mut activity = Activity {
        activity_type: ActivityType::Event,
        name: Some(CONTINUE_CONVERSATION_EVENT.to_string()),
        ..Default::default()
    };
    activity.apply_conversation_reference(reference, true);
    run_turn(adapter, activity, handler).await
}
