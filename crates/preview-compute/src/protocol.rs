//! Request payloads and fail-closed response parsing for the compute service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use preview_core::{
    ContextSnapshot, Message, PresetDocument, PreviewError, RawResult, Result, VariableBag,
    Variables, View, ViewResult,
};

/// Body of an `assemble` call.
///
/// `character` and `persona` are left out entirely when unset; the service
/// reads absence, not `null`, as "not set".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssembleRequest {
    #[serde(default)]
    pub presets: PresetDocument,
    #[serde(default)]
    pub world_books: Vec<Value>,
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<Map<String, Value>>,
}

impl AssembleRequest {
    pub fn from_snapshot(snapshot: &ContextSnapshot) -> Self {
        Self {
            presets: snapshot.presets.clone(),
            world_books: snapshot.world_book_entries.clone(),
            history: snapshot.history.clone(),
            character: snapshot.character.clone(),
            persona: snapshot.persona.clone(),
        }
    }

    /// Replace the history wholesale. No merging with what was there.
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

/// Rules travel wrapped so the service accepts a bare list or an object the same way.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RulesEnvelope {
    pub rules: Vec<Value>,
}

/// Body of a `postprocess` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostprocessRequest {
    pub messages: Vec<Message>,
    pub rules: RulesEnvelope,
    pub view: View,
    pub variables: VariableBag,
}

fn expect_object(value: Value, operation: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(PreviewError::malformed(format!(
            "{} response is not an object (got {})",
            operation,
            json_kind(&other)
        ))),
    }
}

fn take_messages(map: &mut Map<String, Value>, field: &str, operation: &str) -> Result<Vec<Message>> {
    let items = match map.remove(field) {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(PreviewError::malformed(format!(
                "{} response field '{}' is not an array (got {})",
                operation,
                field,
                json_kind(&other)
            )))
        }
        None => {
            return Err(PreviewError::malformed(format!(
                "{} response is missing '{}'",
                operation, field
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Message>(item).map_err(|e| {
                PreviewError::malformed(format!(
                    "{} response {}[{}] is not a message: {}",
                    operation, field, index, e
                ))
            })
        })
        .collect()
}

fn take_bag(map: &mut Map<String, Value>, field: &str) -> Result<VariableBag> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(VariableBag::new()),
        Some(Value::Object(bag)) => Ok(bag),
        Some(other) => Err(PreviewError::malformed(format!(
            "postprocess variables.{} is not an object (got {})",
            field,
            json_kind(&other)
        ))),
    }
}

pub fn parse_assemble_response(value: Value) -> Result<RawResult> {
    let mut map = expect_object(value, "assemble")?;
    let messages = take_messages(&mut map, "messages", "assemble")?;
    Ok(RawResult { messages })
}

pub fn parse_postprocess_response(value: Value) -> Result<ViewResult> {
    let mut map = expect_object(value, "postprocess")?;
    let messages = take_messages(&mut map, "message", "postprocess")?;

    let variables = match map.remove("variables") {
        None | Some(Value::Null) => Variables::default(),
        Some(Value::Object(mut vars)) => Variables {
            initial: take_bag(&mut vars, "initial")?,
            r#final: take_bag(&mut vars, "final")?,
        },
        Some(other) => {
            return Err(PreviewError::malformed(format!(
                "postprocess variables is not an object (got {})",
                json_kind(&other)
            )))
        }
    };

    Ok(ViewResult {
        messages,
        variables,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
