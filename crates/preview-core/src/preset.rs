use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::message::Role;

/// A slot that carries its own text.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContentPrompt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// `None` when the slot has no role or one outside [`Role`]; an
    /// unrecognized value stays in `extra`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A slot the compute service fills in (chat history, world-book position, character card).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarkerPrompt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A prompt slot in a preset. Anything without string `content` is a marker.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum PromptItem {
    Content(ContentPrompt),
    Marker(MarkerPrompt),
}

/// Removes `key` only when `convert` accepts its value, so anything
/// unexpected is kept verbatim in the remaining fields.
fn take_field<T>(
    fields: &mut Map<String, Value>,
    key: &str,
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let converted = fields.get(key).and_then(convert)?;
    fields.remove(key);
    Some(converted)
}

impl<'de> Deserialize<'de> for PromptItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;

        let identifier = take_field(&mut fields, "identifier", |v| {
            v.as_str().map(str::to_string)
        });
        let enabled = take_field(&mut fields, "enabled", Value::as_bool);
        let content = take_field(&mut fields, "content", |v| v.as_str().map(str::to_string));

        Ok(match content {
            Some(content) => {
                let role = take_field(&mut fields, "role", |v| {
                    Role::deserialize(v).ok()
                });
                PromptItem::Content(ContentPrompt {
                    identifier,
                    role,
                    content,
                    enabled,
                    extra: fields,
                })
            }
            None => PromptItem::Marker(MarkerPrompt {
                identifier,
                enabled,
                extra: fields,
            }),
        })
    }
}

impl PromptItem {
    pub fn identifier(&self) -> Option<&str> {
        match self {
            PromptItem::Content(prompt) => prompt.identifier.as_deref(),
            PromptItem::Marker(marker) => marker.identifier.as_deref(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            PromptItem::Content(prompt) => Some(&prompt.content),
            PromptItem::Marker(_) => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, PromptItem::Marker(_))
    }

    /// Slots without an explicit flag are on.
    pub fn is_enabled(&self) -> bool {
        let enabled = match self {
            PromptItem::Content(prompt) => prompt.enabled,
            PromptItem::Marker(marker) => marker.enabled,
        };
        enabled.unwrap_or(true)
    }
}

/// How the `prompts` key appeared in the source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum PromptsKey {
    #[default]
    Missing,
    Null,
    List,
}

/// Preset document: ordered prompt slots plus sampler and formatting settings
/// the pipeline does not interpret.
///
/// Serializes back to the shape it was read from; the compute service gets
/// exactly what the workspace holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetDocument {
    pub prompts: Vec<PromptItem>,
    pub settings: Map<String, Value>,
    prompts_key: PromptsKey,
}

impl PresetDocument {
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty() && self.settings.is_empty()
    }

    pub fn enabled_prompts(&self) -> impl Iterator<Item = &PromptItem> {
        self.prompts.iter().filter(|item| item.is_enabled())
    }
}

impl Serialize for PresetDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.settings {
            map.serialize_entry(key, value)?;
        }
        match (self.prompts.is_empty(), self.prompts_key) {
            (true, PromptsKey::Missing) => {}
            (true, PromptsKey::Null) => map.serialize_entry("prompts", &Value::Null)?,
            _ => map.serialize_entry("prompts", &self.prompts)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PresetDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut settings = Map::<String, Value>::deserialize(deserializer)?;
        let (prompts, prompts_key) = match settings.remove("prompts") {
            None => (Vec::new(), PromptsKey::Missing),
            Some(Value::Null) => (Vec::new(), PromptsKey::Null),
            Some(value) => (
                Vec::<PromptItem>::deserialize(value).map_err(D::Error::custom)?,
                PromptsKey::List,
            ),
        };
        Ok(Self {
            prompts,
            settings,
            prompts_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_trip(value: Value) -> Value {
        let preset: PresetDocument = serde_json::from_value(value).unwrap();
        serde_json::to_value(&preset).unwrap()
    }

    #[test]
    fn empty_preset_serializes_as_empty_object() {
        let value = serde_json::to_value(PresetDocument::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn distinguishes_content_and_marker_slots() {
        let preset: PresetDocument = serde_json::from_value(json!({
            "temperature": 0.8,
            "prompts": [
                {"identifier": "main", "role": "system", "content": "Write the next reply."},
                {"identifier": "chatHistory", "marker": true},
                {"identifier": "jailbreak", "content": "Stay in character.", "enabled": false}
            ]
        }))
        .unwrap();

        assert_eq!(preset.prompts.len(), 3);
        assert_eq!(preset.prompts[0].text(), Some("Write the next reply."));
        assert!(preset.prompts[1].is_marker());
        assert_eq!(preset.prompts[1].text(), None);
        assert_eq!(preset.prompts[2].identifier(), Some("jailbreak"));
        assert!(!preset.prompts[2].is_enabled());
        assert_eq!(preset.enabled_prompts().count(), 2);
        assert_eq!(preset.settings["temperature"], 0.8);
    }

    #[test]
    fn reserializes_input_shape() {
        let value = json!({
            "prompts": [
                {"identifier": "chatHistory", "marker": true},
                {"identifier": "main", "role": "user", "content": "hi"}
            ],
            "openai_max_context": 4096
        });
        assert_eq!(round_trip(value.clone()), value);
    }

    #[test]
    fn missing_role_and_identifier_are_not_filled_in() {
        let no_role = json!({"prompts": [{"identifier": "main", "content": "hi"}]});
        assert_eq!(round_trip(no_role.clone()), no_role);

        let no_identifier = json!({"prompts": [{"role": "user", "content": "hi"}]});
        assert_eq!(round_trip(no_identifier.clone()), no_identifier);

        let preset: PresetDocument = serde_json::from_value(no_identifier).unwrap();
        assert!(!preset.prompts[0].is_marker());
        assert_eq!(preset.prompts[0].identifier(), None);
    }

    #[test]
    fn unknown_role_keeps_content_slot() {
        let value = json!({"prompts": [{"identifier": "tooling", "role": "tool", "content": "call it"}]});
        let preset: PresetDocument = serde_json::from_value(value.clone()).unwrap();

        assert_eq!(preset.prompts[0].text(), Some("call it"));
        match &preset.prompts[0] {
            PromptItem::Content(prompt) => {
                assert_eq!(prompt.role, None);
                assert_eq!(prompt.extra["role"], "tool");
            }
            other => panic!("expected content slot, got {other:?}"),
        }
        assert_eq!(serde_json::to_value(&preset).unwrap(), value);
    }

    #[test]
    fn non_string_content_is_a_marker_and_kept() {
        let value = json!({"prompts": [{"identifier": "odd", "content": null, "enabled": "yes"}]});
        let preset: PresetDocument = serde_json::from_value(value.clone()).unwrap();

        assert!(preset.prompts[0].is_marker());
        assert!(preset.prompts[0].is_enabled());
        assert_eq!(serde_json::to_value(&preset).unwrap(), value);
    }

    #[test]
    fn null_prompts_read_as_empty_and_written_back() {
        let value = json!({"prompts": null, "temperature": 1});
        let preset: PresetDocument = serde_json::from_value(value.clone()).unwrap();

        assert!(preset.prompts.is_empty());
        assert_eq!(preset.settings["temperature"], 1);
        assert_eq!(serde_json::to_value(&preset).unwrap(), value);
    }

    #[test]
    fn empty_prompt_list_is_written_back() {
        let value = json!({"prompts": []});
        assert_eq!(round_trip(value.clone()), value);
    }

    #[test]
    fn prompts_of_wrong_type_are_rejected() {
        let result = serde_json::from_value::<PresetDocument>(json!({"prompts": "main"}));
        assert!(result.is_err());
    }
}
