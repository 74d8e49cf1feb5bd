use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{DbId, Timestamp};

fn default_duration_hours() -> i32 {
    8
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: DbId,
    pub bootcamp_id: DbId,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub estimated_duration_hours: i32,
    #[sqlx(json)]
    pub learning_outcomes: Vec<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CourseCreate {
    pub bootcamp_id: DbId,
    #[validate(length(max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(range(min = 0))]
    pub order_index: i32,
    #[serde(default = "default_duration_hours")]
    #[validate(range(min = 1, max = 100))]
    pub estimated_duration_hours: i32,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
}

impl CourseCreate {
    pub fn new(bootcamp_id: DbId, title: impl Into<String>, order_index: i32) -> Self {
        Self {
            bootcamp_id,
            title: title.into(),
            description: String::new(),
            order_index,
            estimated_duration_hours: default_duration_hours(),
            learning_outcomes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseWithLessonsResponse {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub estimated_duration_hours: i32,
    pub learning_outcomes: Vec<String>,
    pub lessons_count: i64,
}

impl CourseWithLessonsResponse {
    pub fn new(course: Course, lessons_count: i64) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            order_index: course.order_index,
            estimated_duration_hours: course.estimated_duration_hours,
            learning_outcomes: course.learning_outcomes,
            lessons_count,
        }
    }
}
