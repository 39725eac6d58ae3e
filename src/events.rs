use crate::message::TranslatedMessage;
use crate::tools::ToolInvocation;

/// Events emitted while a reply is produced, for UI streaming.
///
/// Every tool call shows up twice as [`ChatEvent::ToolInvocation`]: first
/// pending, then resolved. Results of concurrent calls arrive in completion
/// order.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    TurnStart { turn: usize },
    Text { content: String },
    ToolInvocation(ToolInvocation),
    Translation(TranslatedMessage),
    Finished { turns: usize },
    Error { message: String },
}
