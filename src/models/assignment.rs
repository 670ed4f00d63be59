use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use super::dinner::Dinner;

/// A dinner planned for one calendar day, with the dinner inlined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub id: i64,
    pub date: NaiveDate,
    pub dinner_id: i64,
    pub dinner: Option<Dinner>,
}

/// Flat row of `dinner_assignments LEFT JOIN dinners`.
#[derive(Debug, FromRow)]
pub struct AssignmentRow {
    pub id: i64,
    pub date: NaiveDate,
    pub dinner_id: i64,
    pub dinner_name: Option<String>,
    pub dinner_recipe: Option<String>,
    pub dinner_ingredients: Option<Json<Vec<String>>>,
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        let dinner = row.dinner_name.map(|name| Dinner {
            id: row.dinner_id,
            name,
            recipe: row.dinner_recipe,
            ingredients: row.dinner_ingredients.map(|j| j.0).unwrap_or_default(),
        });
        Self {
            id: row.id,
            date: row.date,
            dinner_id: row.dinner_id,
            dinner,
        }
    }
}

/// Entry of GET /api/assignments/all.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssignmentSummary {
    pub id: i64,
    pub date: NaiveDate,
    pub dinner_id: i64,
    pub dinner_name: Option<String>,
}

/// Body for POST /api/assignments. Clients send `dinner_id` either as a
/// number or as a numeric string (`"3"`).
#[derive(Debug, Deserialize)]
pub struct AssignDinnerRequest {
    pub date: NaiveDate,
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub dinner_id: i64,
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid dinner id: {text:?}"))),
    }
}

/// Query params for GET and DELETE /api/assignments.
#[derive(Debug, Default, Deserialize)]
pub struct AssignmentQuery {
    /// Exact day, e.g. "2024-06-01".
    pub date: Option<String>,
    /// Month prefix, e.g. "2024-06".
    pub month: Option<String>,
}

impl AssignmentQuery {
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref().filter(|d| !d.is_empty())
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref().filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dinner_id_accepts_numbers_and_numeric_strings() {
        let number: AssignDinnerRequest =
            serde_json::from_str(r#"{"date":"2024-06-01","dinner_id":3}"#).unwrap();
        assert_eq!(number.dinner_id, 3);

        let text: AssignDinnerRequest =
            serde_json::from_str(r#"{"date":"2024-06-01","dinner_id":" 3"}"#).unwrap();
        assert_eq!(text.dinner_id, 3);

        assert!(serde_json::from_str::<AssignDinnerRequest>(
            r#"{"date":"2024-06-01","dinner_id":"three"}"#
        )
        .is_err());
    }
}
