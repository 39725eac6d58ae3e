use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::outcome::ToolOutcome;
use crate::error::ToolError;

/// A tool call as requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvocationState {
    Pending,
    Result(ToolOutcome),
}

/// One tool call's lifecycle within a turn: created pending, resolved once.
///
/// On the wire this is the `tool-invocation` message part:
/// `{toolName, toolCallId, args, state: "call" | "result", result?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireInvocation", try_from = "WireInvocation")]
pub struct ToolInvocation {
    pub tool_name: String,
    pub call_id: String,
    pub args: Value,
    pub state: InvocationState,
}

impl ToolInvocation {
    pub fn pending(call: ToolCall) -> Self {
        Self {
            tool_name: call.name,
            call_id: call.id,
            args: call.input,
            state: InvocationState::Pending,
        }
    }

    /// Attach the outcome. Consumes the pending invocation; a resolved one
    /// cannot be resolved again.
    pub fn resolve(self, outcome: ToolOutcome) -> Result<Self, ToolError> {
        match self.state {
            InvocationState::Pending => Ok(Self {
                state: InvocationState::Result(outcome),
                ..self
            }),
            InvocationState::Result(_) => Err(ToolError::AlreadyResolved(self.call_id)),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, InvocationState::Pending)
    }

    pub fn outcome(&self) -> Option<&ToolOutcome> {
        match &self.state {
            InvocationState::Pending => None,
            InvocationState::Result(outcome) => Some(outcome),
        }
    }

    /// String argument by key, if present.
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireState {
    Call,
    Result,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInvocation {
    tool_name: String,
    tool_call_id: String,
    #[serde(default)]
    args: Value,
    state: WireState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
}

impl From<ToolInvocation> for WireInvocation {
    fn from(inv: ToolInvocation) -> Self {
        let (state, result) = match inv.state {
            InvocationState::Pending => (WireState::Call, None),
            InvocationState::Result(outcome) => (WireState::Result, Some(outcome.to_value())),
        };
        Self {
            tool_name: inv.tool_name,
            tool_call_id: inv.call_id,
            args: inv.args,
            state,
            result,
        }
    }
}

impl TryFrom<WireInvocation> for ToolInvocation {
    type Error = String;

    fn try_from(wire: WireInvocation) -> Result<Self, Self::Error> {
        let state = match (wire.state, wire.result) {
            (WireState::Call, None) => InvocationState::Pending,
            (WireState::Call, Some(_)) => {
                return Err(format!("tool call {} is pending but has a result", wire.tool_call_id))
            }
            (WireState::Result, Some(result)) => {
                InvocationState::Result(ToolOutcome::from_wire(&wire.tool_name, &result)?)
            }
            (WireState::Result, None) => {
                return Err(format!("tool call {} has no result", wire.tool_call_id))
            }
        };
        Ok(Self {
            tool_name: wire.tool_name,
            call_id: wire.tool_call_id,
            args: wire.args,
            state,
        })
    }
}
