use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{DbId, Timestamp};

fn default_duration_minutes() -> i32 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: DbId,
    pub course_id: DbId,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub order_index: i32,
    pub estimated_duration_minutes: i32,
    #[sqlx(json)]
    pub key_concepts: Vec<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LessonCreate {
    pub course_id: DbId,
    #[validate(length(max = 200))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub summary: String,
    #[validate(range(min = 0))]
    pub order_index: i32,
    #[serde(default = "default_duration_minutes")]
    #[validate(range(min = 1, max = 480))]
    pub estimated_duration_minutes: i32,
    #[serde(default)]
    pub key_concepts: Vec<String>,
}

impl LessonCreate {
    pub fn new(course_id: DbId, title: impl Into<String>, order_index: i32) -> Self {
        Self {
            course_id,
            title: title.into(),
            content: String::new(),
            summary: String::new(),
            order_index,
            estimated_duration_minutes: default_duration_minutes(),
            key_concepts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonDetailResponse {
    pub id: DbId,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub order_index: i32,
    pub estimated_duration_minutes: i32,
    pub key_concepts: Vec<String>,
    pub materials_count: i64,
    pub quizzes_count: i64,
}

impl LessonDetailResponse {
    pub fn new(lesson: Lesson, materials_count: i64, quizzes_count: i64) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title,
            content: lesson.content,
            summary: lesson.summary,
            order_index: lesson.order_index,
            estimated_duration_minutes: lesson.estimated_duration_minutes,
            key_concepts: lesson.key_concepts,
            materials_count,
            quizzes_count,
        }
    }
}
