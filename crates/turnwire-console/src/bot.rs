use std::sync::Arc;

use async_trait::async_trait;

use turnwire_context::{send_hook, HookAction, TurnContext, TurnHandler, TurnStateExt};
use turnwire_core::{Activity, ActivityType, Result};

use crate::traced::TracedTurnContext;

/// Turn-state key holding the trimmed inbound text.
const INPUT_KEY: &str = "echo.input";

/// Repeats what the user typed.
///
/// `/edit <text>` sends a placeholder first and then rewrites it in place.
/// With `shout` set, a send hook upper-cases every outgoing message.
pub struct EchoBot {
    shout: bool,
}

impl EchoBot {
    pub fn new(shout: bool) -> Self {
        Self { shout }
    }
}

#[async_trait]
impl TurnHandler for EchoBot {
    async fn on_turn(&self, ctx: Arc<dyn TurnContext>) -> Result<()> {
        let ctx = TracedTurnContext::new(ctx);

        let activity = ctx.activity();
        if activity.activity_type != ActivityType::Message {
            return Ok(());
        }
        let text = activity.text.as_deref().unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Ok(());
        }
        ctx.set(INPUT_KEY, text.clone());

        if self.shout {
            ctx.on_send_activities(send_hook(|_ctx, activities| {
                for a in activities.iter_mut() {
                    a.text = a.text.take().map(|t| t.to_uppercase());
                }
                HookAction::Allow
            }));
        }

        if let Some(rest) = text.strip_prefix("/edit ") {
            let draft = ctx.send_text("...").await?;
            let mut edit = Activity::message(format!("You said: {}", rest.trim()));
            edit.id = Some(draft.id);
            ctx.update_activity(edit).await?;
            return Ok(());
        }

        let input = ctx.get::<String>(INPUT_KEY).unwrap_or_default();
        ctx.send_text(&format!("You said: {}", input)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::tests::console;
    use turnwire_context::run_turn;
    use turnwire_context::testing::TestAdapter;

    #[tokio::test]
    async fn echoes_message_text() {
        let adapter = Arc::new(TestAdapter::new());
        run_turn(adapter.clone(), adapter.inbound("  hi there "), &EchoBot::new(false))
            .await
            .unwrap();

        let sent = adapter.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text.as_deref(), Some("You said: hi there"));
    }

    #[tokio::test]
    async fn shout_hook_applies_through_decorator() {
        let adapter = Arc::new(TestAdapter::new());
        run_turn(adapter.clone(), adapter.inbound("quiet"), &EchoBot::new(true))
            .await
            .unwrap();

        assert_eq!(adapter.sent()[0].text.as_deref(), Some("YOU SAID: QUIET"));
    }

    #[tokio::test]
    async fn edit_command_rewrites_placeholder() {
        let adapter = Arc::new(TestAdapter::new());
        run_turn(adapter.clone(), adapter.inbound("/edit done"), &EchoBot::new(false))
            .await
            .unwrap();

        let sent = adapter.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text.as_deref(), Some("You said: done"));
    }

    #[tokio::test]
    async fn non_message_activities_are_ignored() {
        let adapter = Arc::new(TestAdapter::new());
        let mut typing = adapter.inbound("");
        typing.activity_type = ActivityType::Typing;

        run_turn(adapter.clone(), typing, &EchoBot::new(false))
            .await
            .unwrap();

        assert!(adapter.sent().is_empty());
    }

    #[tokio::test]
    async fn console_shows_edit_as_follow_up_line() {
        let (buf, console) = console();
        let console = Arc::new(console);
        run_turn(console.clone(), console.inbound("/edit ok"), &EchoBot::new(false))
            .await
            .unwrap();

        assert_eq!(buf.contents(), "Echo: ...\nEcho: You said: ok (edited)\n");
    }
}
