//! Per-turn context for bots: activity I/O, scoped turn state and
//! before-send/update/delete hooks, plus a decorator for stacking
//! behaviour on top of a context someone else constructed.

pub mod adapter;
pub mod context;
pub mod hooks;
pub mod testing;
pub mod turn;
pub mod wrapper;

pub use adapter::{continue_conversation, run_turn, BotAdapter, TurnHandler};
pub use context::{TurnContext, TurnStateExt, TurnValue};
pub use hooks::{
    delete_hook, send_hook, update_hook, DeleteActivityHandler, HookAction,
    SendActivitiesHandler, UpdateActivityHandler,
};
pub use turn::BotTurnContext;
pub use wrapper::TurnContextWrapper;
