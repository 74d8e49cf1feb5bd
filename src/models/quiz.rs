use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use validator::{Validate, ValidationError};

use super::{DbId, Timestamp};

fn default_passing_score() -> i32 {
    70
}

fn default_max_attempts() -> i32 {
    3
}

/// Owner of a quiz: a lesson for regular quizzes, the bootcamp itself for
/// final exams. Serialized flat as `lesson_id` or `bootcamp_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizParent {
    #[serde(rename = "lesson_id")]
    Lesson(DbId),
    #[serde(rename = "bootcamp_id")]
    Bootcamp(DbId),
}

impl QuizParent {
    /// `None` unless exactly one id is given.
    pub fn from_ids(lesson_id: Option<DbId>, bootcamp_id: Option<DbId>) -> Option<Self> {
        match (lesson_id, bootcamp_id) {
            (Some(id), None) => Some(QuizParent::Lesson(id)),
            (None, Some(id)) => Some(QuizParent::Bootcamp(id)),
            _ => None,
        }
    }

    pub fn lesson_id(self) -> Option<DbId> {
        match self {
            QuizParent::Lesson(id) => Some(id),
            QuizParent::Bootcamp(_) => None,
        }
    }

    pub fn bootcamp_id(self) -> Option<DbId> {
        match self {
            QuizParent::Bootcamp(id) => Some(id),
            QuizParent::Lesson(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: DbId,
    #[serde(flatten)]
    pub parent: QuizParent,
    pub title: String,
    pub description: String,
    pub is_exam: bool,
    pub time_limit_minutes: Option<i32>,
    pub passing_score_percentage: i32,
    pub max_attempts: i32,
    pub order_index: i32,
    pub created_at: Timestamp,
}

impl<'r> FromRow<'r, SqliteRow> for Quiz {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let lesson_id: Option<DbId> = row.try_get("lesson_id")?;
        let bootcamp_id: Option<DbId> = row.try_get("bootcamp_id")?;
        let parent = QuizParent::from_ids(lesson_id, bootcamp_id).ok_or_else(|| {
            sqlx::Error::ColumnDecode {
                index: "lesson_id".to_string(),
                source: "quiz row must reference exactly one of lesson_id, bootcamp_id".into(),
            }
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            parent,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            is_exam: row.try_get("is_exam")?,
            time_limit_minutes: row.try_get("time_limit_minutes")?,
            passing_score_percentage: row.try_get("passing_score_percentage")?,
            max_attempts: row.try_get("max_attempts")?,
            order_index: row.try_get("order_index")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Wire shape keeps the two optional parent ids; validation requires
/// exactly one of them.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_single_parent"))]
pub struct QuizCreate {
    #[serde(default)]
    pub lesson_id: Option<DbId>,
    #[serde(default)]
    pub bootcamp_id: Option<DbId>,
    #[validate(length(max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
    #[serde(default)]
    pub is_exam: bool,
    #[serde(default)]
    #[validate(range(min = 1, max = 300))]
    pub time_limit_minutes: Option<i32>,
    #[serde(default = "default_passing_score")]
    #[validate(range(min = 0, max = 100))]
    pub passing_score_percentage: i32,
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, max = 10))]
    pub max_attempts: i32,
    #[validate(range(min = 0))]
    pub order_index: i32,
}

fn validate_single_parent(quiz: &QuizCreate) -> Result<(), ValidationError> {
    if quiz.parent().is_some() {
        return Ok(());
    }
    let mut err = ValidationError::new("single_parent");
    err.message = Some("exactly one of lesson_id or bootcamp_id must be set".into());
    Err(err)
}

impl QuizCreate {
    pub fn new(parent: QuizParent, title: impl Into<String>, order_index: i32) -> Self {
        Self {
            lesson_id: parent.lesson_id(),
            bootcamp_id: parent.bootcamp_id(),
            title: title.into(),
            description: String::new(),
            is_exam: matches!(parent, QuizParent::Bootcamp(_)),
            time_limit_minutes: None,
            passing_score_percentage: default_passing_score(),
            max_attempts: default_max_attempts(),
            order_index,
        }
    }

    pub fn parent(&self) -> Option<QuizParent> {
        QuizParent::from_ids(self.lesson_id, self.bootcamp_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDetailResponse {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions_count: i64,
    pub total_points: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let req: QuizCreate = serde_json::from_value(json!({
            "lesson_id": 4,
            "title": "Check-in",
            "order_index": 0
        }))
        .unwrap();
        assert_eq!(req.passing_score_percentage, 70);
        assert_eq!(req.max_attempts, 3);
        assert_eq!(req.time_limit_minutes, None);
        assert!(!req.is_exam);
        assert_eq!(req.parent(), Some(QuizParent::Lesson(4)));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_both_parents_rejected() {
        let req: QuizCreate = serde_json::from_value(json!({
            "lesson_id": 4,
            "bootcamp_id": 1,
            "title": "Ambiguous",
            "order_index": 0
        }))
        .unwrap();
        assert!(req.parent().is_none());
        let errors = req.validate().unwrap_err();
        assert!(errors.errors().contains_key("__all__"));
    }

    #[test]
    fn test_no_parent_rejected() {
        let req: QuizCreate = serde_json::from_value(json!({
            "title": "Orphan",
            "order_index": 0
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_numeric_bounds() {
        let mut req = QuizCreate::new(QuizParent::Bootcamp(1), "Final", 0);
        assert!(req.is_exam);
        assert!(req.validate().is_ok());

        req.time_limit_minutes = Some(0);
        req.passing_score_percentage = 101;
        req.max_attempts = 11;
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("time_limit_minutes"));
        assert!(fields.contains_key("passing_score_percentage"));
        assert!(fields.contains_key("max_attempts"));

        req.time_limit_minutes = Some(300);
        req.passing_score_percentage = 0;
        req.max_attempts = 1;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_parent_serializes_flat() {
        let quiz = Quiz {
            id: 9,
            parent: QuizParent::Bootcamp(2),
            title: "Final".to_string(),
            description: String::new(),
            is_exam: true,
            time_limit_minutes: Some(90),
            passing_score_percentage: 80,
            max_attempts: 1,
            order_index: 0,
            created_at: chrono::Utc::now(),
        };
        let value = serde_json::to_value(&quiz).unwrap();
        assert_eq!(value["bootcamp_id"], json!(2));
        assert!(value.get("lesson_id").is_none());
    }

    #[test]
    fn test_title_description_and_order_bounds() {
        let mut req = QuizCreate::new(QuizParent::Lesson(1), "t".repeat(201), -1);
        req.description = "d".repeat(1001);
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("order_index"));

        req.title.pop();
        req.description.pop();
        req.order_index = 0;
        assert!(req.validate().is_ok());
    }
}
