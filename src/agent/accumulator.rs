//! Reassembly of streamed tool-call fragments.
//!
//! Streaming backends deliver tool calls as indexed deltas: the first
//! fragment for a slot carries the function name, later fragments append
//! pieces of the JSON argument string. The accumulator collects them per
//! slot so the loop can parse complete calls once the stream ends.

use serde_json::{Map, Value};

use crate::gateways::ToolCallFragment;
use crate::message::ToolInvocation;

/// A fully reassembled call, arguments still in raw JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToolCall {
    pub name: String,
    pub raw_arguments: String,
}

impl PendingToolCall {
    /// Parse the raw argument text into a JSON object. An empty string
    /// means a call with no arguments.
    pub fn parse_arguments(&self) -> Result<Map<String, Value>, serde_json::Error> {
        if self.raw_arguments.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&self.raw_arguments)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::de::Error::custom(format!(
                "tool arguments must be a JSON object, got {other}"
            ))),
        }
    }

    /// Best-effort invocation for history bookkeeping; unparseable
    /// arguments become an empty object.
    pub fn to_invocation(&self) -> ToolInvocation {
        let arguments = self.parse_arguments().unwrap_or_default();
        ToolInvocation::new(&self.name, arguments)
    }
}

#[derive(Debug, Default)]
struct Slot {
    name: Option<String>,
    arguments: String,
}

/// Indexed fragment collector for one streamed model turn.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    slots: Vec<Slot>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, fragment: &ToolCallFragment) {
        while self.slots.len() <= fragment.index {
            self.slots.push(Slot::default());
        }
        let slot = &mut self.slots[fragment.index];
        if let Some(name) = &fragment.name {
            slot.name = Some(name.clone());
        }
        slot.arguments.push_str(&fragment.arguments);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.name.is_none())
    }

    /// Emit completed calls in slot order. Slots that never received a
    /// name are dropped; a backend that fragments names across deltas is
    /// out of contract.
    pub fn finish(self) -> Vec<PendingToolCall> {
        self.slots
            .into_iter()
            .filter_map(|slot| {
                slot.name.map(|name| PendingToolCall {
                    name,
                    raw_arguments: slot.arguments,
                })
            })
            .collect()
    }
}
