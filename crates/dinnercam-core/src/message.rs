use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids;

// ---------- Role ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

// ---------- Attachments ----------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Macronutrients {
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub fiber_g: f64,
}

/// Scores are on a 1-10 scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionScore {
    #[serde(default)]
    pub overall: u8,
    #[serde(default)]
    pub balance: u8,
    #[serde(default)]
    pub healthiness: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionSummary {
    #[serde(default)]
    pub calories_per_serving: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default)]
    pub macronutrients: Macronutrients,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition_score: Option<NutritionScore>,
}

/// An illustration for one recipe step. `step_index` is 0-based on the wire
/// and rendered 1-based.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepImage {
    pub step_index: usize,
    #[serde(default)]
    pub step_text: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub failed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Wire field `type`; only `recipe_generation` is actionable.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub extracted_data: Value,
}

// ---------- Message ----------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Stable identity, assigned at creation, never reused.
    #[serde(default)]
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_image: Option<StepImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: ids::new_message_id(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            image: None,
            recipe: None,
            nutrition: None,
            step_image: None,
            suggestion: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_image(mut self, uri: impl Into<String>) -> Self {
        self.image = Some(uri.into());
        self
    }

    pub fn with_nutrition(mut self, nutrition: NutritionSummary) -> Self {
        self.nutrition = Some(nutrition);
        self
    }

    pub fn with_step_image(mut self, step_image: StepImage) -> Self {
        self.step_image = Some(step_image);
        self
    }

    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }
}

// ---------- MessagePatch ----------

/// Field-wise update merged into an existing message. Identity and
/// timestamp are never patched.
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub recipe: Option<String>,
    pub nutrition: Option<NutritionSummary>,
    pub step_image: Option<StepImage>,
    pub suggestion: Option<Suggestion>,
}

impl MessagePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn with_recipe(mut self, recipe: impl Into<String>) -> Self {
        self.recipe = Some(recipe.into());
        self
    }

    pub fn apply(self, message: &mut Message) {
        if let Some(content) = self.content {
            message.content = content;
        }
        if let Some(recipe) = self.recipe {
            message.recipe = Some(recipe);
        }
        if let Some(nutrition) = self.nutrition {
            message.nutrition = Some(nutrition);
        }
        if let Some(step_image) = self.step_image {
            message.step_image = Some(step_image);
        }
        if let Some(suggestion) = self.suggestion {
            message.suggestion = Some(suggestion);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_assigns_identity() {
        let message = Message::user("hello");
        assert!(!message.id.is_empty());
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "hello");
    }

    #[test]
    fn test_patch_replaces_only_given_fields() {
        let mut message = Message::assistant("before").with_image("http://img");
        let id = message.id.clone();

        MessagePatch::content("after").apply(&mut message);

        assert_eq!(message.id, id);
        assert_eq!(message.content, "after");
        assert_eq!(message.image.as_deref(), Some("http://img"));
    }

    #[test]
    fn test_patch_is_idempotent() {
        let mut once = Message::assistant("x");
        let mut twice = once.clone();

        let patch = MessagePatch::content("done").with_recipe("## Pasta");
        patch.clone().apply(&mut once);
        patch.clone().apply(&mut twice);
        patch.apply(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_message_round_trips_through_json() {
        let message = Message::assistant("nutrition").with_nutrition(NutritionSummary {
            calories_per_serving: 450.0,
            servings: Some(2),
            macronutrients: Macronutrients {
                protein_g: 20.0,
                carbs_g: 40.0,
                fat_g: 15.0,
                fiber_g: 5.0,
            },
            nutrition_score: Some(NutritionScore {
                overall: 7,
                balance: 7,
                healthiness: 7,
            }),
        });

        let json = serde_json::to_string(&message).expect("serialize");
        let back: Message = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, message);
    }

    #[test]
    fn test_persisted_shape_uses_camel_case_keys() {
        let message = Message::assistant("img").with_step_image(StepImage {
            step_index: 0,
            step_text: "Boil water".to_string(),
            image_url: "https://img/0.png".to_string(),
            failed: false,
        });

        let json = serde_json::to_string(&message).expect("serialize");
        // Top-level keys are camelCase; payload fields stay snake_case.
        assert!(json.contains("\"stepImage\""));
        assert!(json.contains("\"step_index\""));
    }

    #[test]
    fn test_deserialize_tolerates_missing_optionals() {
        let json = r#"{"role":"assistant","timestamp":"2025-06-01T12:00:00Z"}"#;
        let message: Message = serde_json::from_str(json).expect("deserialize");
        assert!(message.id.is_empty());
        assert!(message.content.is_empty());
        assert!(message.nutrition.is_none());
    }
}
