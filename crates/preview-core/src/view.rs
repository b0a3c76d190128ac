use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::Message;

/// Template variables carried between post-processing stages.
pub type VariableBag = Map<String, Value>;

/// Which audience a post-processing pass renders for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum View {
    UserView,
    AssistantView,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::UserView => "user_view",
            View::AssistantView => "assistant_view",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variable state before and after a post-processing pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Variables {
    #[serde(default)]
    pub initial: VariableBag,
    #[serde(rename = "final", default)]
    pub r#final: VariableBag,
}

impl Variables {
    pub fn is_empty(&self) -> bool {
        self.initial.is_empty() && self.r#final.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ViewResult {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub variables: Variables,
}

impl ViewResult {
    /// Bag to seed the next pass with. Only the final state carries forward.
    pub fn carry_forward(&self) -> VariableBag {
        self.variables.r#final.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn view_wire_names() {
        assert_eq!(serde_json::to_value(View::UserView).unwrap(), json!("user_view"));
        assert_eq!(
            serde_json::to_value(View::AssistantView).unwrap(),
            json!("assistant_view")
        );
        assert_eq!(View::AssistantView.to_string(), "assistant_view");
    }

    #[test]
    fn variables_use_final_key() {
        let vars: Variables =
            serde_json::from_value(json!({"initial": {"a": 0}, "final": {"a": 1}})).unwrap();
        assert_eq!(vars.initial["a"], 0);
        assert_eq!(vars.r#final["a"], 1);
        assert_eq!(
            serde_json::to_value(&vars).unwrap(),
            json!({"initial": {"a": 0}, "final": {"a": 1}})
        );
    }

    #[test]
    fn carry_forward_takes_final_not_initial() {
        let result = ViewResult {
            messages: vec![],
            variables: serde_json::from_value(json!({"initial": {"x": 0}, "final": {"x": 1}}))
                .unwrap(),
        };
        assert_eq!(Value::Object(result.carry_forward()), json!({"x": 1}));
    }
}
