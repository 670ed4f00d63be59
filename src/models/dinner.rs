use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Dinner {
    pub id: i64,
    pub name: String,
    pub recipe: Option<String>,
    #[sqlx(json)]
    pub ingredients: Vec<String>, // stored as a JSON array
}

/// Body for POST /api/dinners. A missing or `null` name is rejected by the
/// handler with the same 400 as a blank one.
#[derive(Debug, Deserialize)]
pub struct CreateDinnerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub recipe: Option<String>,
}

impl CreateDinnerRequest {
    /// Trimmed name, `""` when absent.
    pub fn name(&self) -> &str {
        self.name.as_deref().map(str::trim).unwrap_or_default()
    }
}

/// Body for PUT /api/dinners/{id}. Absent fields keep their stored value.
///
/// `recipe` tells "absent" (`None`) apart from an explicit `null`
/// (`Some(None)`), which clears the stored recipe.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDinnerRequest {
    pub name: Option<String>,
    pub ingredients: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub recipe: Option<Option<String>>,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
