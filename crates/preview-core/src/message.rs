use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an assembled or post-processed prompt.
///
/// `source` is an opaque map the compute service may attach (which preset
/// slot or world-book entry produced the message). It is passed through
/// untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Map<String, Value>>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            source: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_serializes_lowercase() {
        let msg = Message::assistant("ok");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "assistant", "content": "ok"}));
    }

    #[test]
    fn source_is_preserved() {
        let value = json!({
            "role": "system",
            "content": "You are Seraphina.",
            "source": {"kind": "preset", "identifier": "main"}
        });
        let msg: Message = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.source.as_ref().unwrap()["identifier"], "main");
        assert_eq!(serde_json::to_value(&msg).unwrap(), value);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result = serde_json::from_value::<Message>(json!({"role": "tool", "content": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn missing_content_is_rejected() {
        let result = serde_json::from_value::<Message>(json!({"role": "user"}));
        assert!(result.is_err());
    }
}
