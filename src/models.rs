use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_SESSION_NAME: &str = "Recipe Analysis";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

// The model sometimes answers "easy" or "Intermediate"; anything unrecognised is Medium.
impl From<String> for Difficulty {
    fn from(label: String) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

impl From<Difficulty> for String {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.as_str().to_string()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NutritionInfo {
    pub calories: u32,
    pub protein: String, // e.g. "12g"
    pub carbs: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(rename = "cookingTime", alias = "cooking_time", default)]
    pub cooking_time: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionInfo>,
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}, {})", self.name, self.difficulty, self.cooking_time)?;
        if let Some(nutrition) = &self.nutrition {
            writeln!(
                f,
                "  {} kcal, protein {}, carbs {}",
                nutrition.calories, nutrition.protein, nutrition.carbs
            )?;
        }
        if !self.ingredients.is_empty() {
            writeln!(f, "  Ingredients: {}", self.ingredients.join(", "))?;
        }
        for (idx, step) in self.instructions.iter().enumerate() {
            writeln!(f, "  {}. {}", idx + 1, step)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// What a message carries: the user's free text or the assistant's recipes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MessageContent {
    Text(String),
    Recipes(Vec<Recipe>),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: MessageContent::Text(text.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(recipes: Vec<Recipe>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            content: MessageContent::Recipes(recipes),
            timestamp: Utc::now(),
        }
    }

    pub fn recipes(&self) -> Option<&[Recipe]> {
        match &self.content {
            MessageContent::Recipes(recipes) => Some(recipes.as_slice()),
            MessageContent::Text(_) => None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.content {
            MessageContent::Text(text) => writeln!(f, "> {}", text),
            MessageContent::Recipes(recipes) if recipes.is_empty() => {
                writeln!(f, "(no recipes returned)")
            }
            MessageContent::Recipes(recipes) => {
                for recipe in recipes {
                    write!(f, "{}", recipe)?;
                }
                Ok(())
            }
        }
    }
}

/// One ingredient-to-recipe conversation. `id` never changes after creation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: DEFAULT_SESSION_NAME.to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
