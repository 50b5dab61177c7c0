use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_MEAL_TYPE: &str = "Unspecified";
pub const DEFAULT_DIET_GOAL: &str = "General Health";

/// Advisory context for the prompt. Values are free text; the UI offers
/// Breakfast/Lunch/Dinner/Snack and Weight Loss/Muscle Gain/Keto / Low Carb/
/// General Health, but anything the caller sends passes through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisContext {
    pub meal_type: String,
    pub diet_goal: String,
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self {
            meal_type: DEFAULT_MEAL_TYPE.to_string(),
            diet_goal: DEFAULT_DIET_GOAL.to_string(),
        }
    }
}

impl AnalysisContext {
    /// Absent or blank fields fall back to the defaults.
    pub fn from_fields(meal_type: Option<String>, diet_goal: Option<String>) -> Self {
        fn or_default(value: Option<String>, default: &str) -> String {
            match value {
                Some(v) if !v.trim().is_empty() => v,
                _ => default.to_string(),
            }
        }
        Self {
            meal_type: or_default(meal_type, DEFAULT_MEAL_TYPE),
            diet_goal: or_default(diet_goal, DEFAULT_DIET_GOAL),
        }
    }
}

/// Image part of one submission, before it is staged to transient storage.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct IngestedUpload {
    pub image: UploadedImage,
    pub context: AnalysisContext,
}

/// Lenient typed view over a parsed backend reply. Every field may be
/// missing or of the wrong type; such fields read as `None`/empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionRecord {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub food_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub calories: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub proteins: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub carbs: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub fats: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub warnings: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Vec::is_empty")]
    pub healthier_alternatives: Vec<String>,
}

impl NutritionRecord {
    /// Anything that is not a JSON object yields an empty record.
    pub fn from_reply(reply: &Value) -> Self {
        // a derived Deserialize also reads sequences positionally
        if !reply.is_object() {
            return Self::default();
        }
        serde_json::from_value(reply.clone()).unwrap_or_default()
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    })
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}
