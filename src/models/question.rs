use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{DbId, DifficultyLevel, QuestionType, Timestamp};

fn default_points() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: DbId,
    pub quiz_id: DbId,
    pub question_text: String,
    pub question_type: QuestionType,
    #[sqlx(json)]
    pub options: Vec<String>,
    #[sqlx(json)]
    pub correct_answers: Vec<String>,
    pub explanation: String,
    pub points: i32,
    pub order_index: i32,
    pub difficulty_level: DifficultyLevel,
    #[sqlx(json)]
    pub tags: Vec<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuestionCreate {
    pub quiz_id: DbId,
    #[validate(length(max = 2000))]
    pub question_text: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answers: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub explanation: String,
    #[serde(default = "default_points")]
    #[validate(range(min = 1, max = 10))]
    pub points: i32,
    #[validate(range(min = 0))]
    pub order_index: i32,
    #[serde(default)]
    pub difficulty_level: DifficultyLevel,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl QuestionCreate {
    pub fn new(quiz_id: DbId, question_text: impl Into<String>, order_index: i32) -> Self {
        Self {
            quiz_id,
            question_text: question_text.into(),
            question_type: QuestionType::default(),
            options: Vec::new(),
            correct_answers: Vec::new(),
            explanation: String::new(),
            points: default_points(),
            order_index,
            difficulty_level: DifficultyLevel::default(),
            tags: Vec::new(),
        }
    }

    /// Correct answers that are not among the options of a choice-type
    /// question. Empty for open-ended types.
    ///
    /// Whether answers must be a subset of options is undecided, so this is
    /// reported and never rejected.
    pub fn unmatched_answers(&self) -> Vec<&str> {
        if !self.question_type.is_choice() {
            return Vec::new();
        }
        self.correct_answers
            .iter()
            .filter(|answer| !self.options.contains(answer))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let req: QuestionCreate = serde_json::from_value(json!({
            "quiz_id": 2,
            "question_text": "What does `&mut` grant?",
            "order_index": 0
        }))
        .unwrap();
        assert_eq!(req.question_type, QuestionType::MultipleChoice);
        assert_eq!(req.points, 1);
        assert_eq!(req.difficulty_level, DifficultyLevel::Beginner);
        assert!(req.options.is_empty());
        assert!(req.correct_answers.is_empty());
        assert!(req.tags.is_empty());
    }

    #[test]
    fn test_points_bounds() {
        let mut req = QuestionCreate::new(1, "Q", 0);
        for points in [0, 11] {
            req.points = points;
            assert!(req.validate().unwrap_err().field_errors().contains_key("points"));
        }
        for points in [1, 10] {
            req.points = points;
            assert!(req.validate().is_ok());
        }
    }

    #[test]
    fn test_text_length() {
        let mut req = QuestionCreate::new(1, "q".repeat(2000), 0);
        assert!(req.validate().is_ok());
        req.question_text.push('q');
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_unmatched_answers_is_reported_not_rejected() {
        let mut req = QuestionCreate::new(1, "Pick the borrow", 0);
        req.options = vec!["&x".to_string(), "x".to_string()];
        req.correct_answers = vec!["&x".to_string(), "*x".to_string()];
        assert_eq!(req.unmatched_answers(), vec!["*x"]);
        assert!(req.validate().is_ok());

        req.question_type = QuestionType::Essay;
        assert!(req.unmatched_answers().is_empty());
    }

    #[test]
    fn test_negative_order_index_rejected() {
        let mut req = QuestionCreate::new(1, "Q", -1);
        assert!(req.validate().unwrap_err().field_errors().contains_key("order_index"));
        req.order_index = 0;
        assert!(req.validate().is_ok());
    }
}
