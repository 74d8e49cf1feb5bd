use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{DbId, DifficultyLevel, GenerationStatus, Timestamp};

fn default_duration_hours() -> i32 {
    40
}

/// Root of the curriculum tree. Deleting it removes every course, lesson,
/// material, quiz and question beneath it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
pub struct Bootcamp {
    pub id: DbId,
    #[validate(length(max = 200))]
    pub title: String,
    #[validate(length(max = 100))]
    pub topic: String,
    #[validate(length(max = 2000))]
    pub description: String,
    pub difficulty_level: DifficultyLevel,
    #[validate(range(min = 1, max = 1000))]
    pub estimated_duration_hours: i32,
    #[sqlx(json)]
    pub learning_objectives: Vec<String>,
    #[sqlx(json)]
    pub prerequisites: Vec<String>,
    #[sqlx(json)]
    pub tags: Vec<String>,
    pub generation_status: GenerationStatus,
    #[validate(length(max = 5000))]
    pub generation_prompt: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BootcampCreate {
    #[validate(length(max = 200))]
    pub title: String,
    #[validate(length(max = 100))]
    pub topic: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde(default)]
    pub difficulty_level: DifficultyLevel,
    #[serde(default = "default_duration_hours")]
    #[validate(range(min = 1, max = 1000))]
    pub estimated_duration_hours: i32,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub generation_prompt: String,
}

impl BootcampCreate {
    pub fn new(title: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            topic: topic.into(),
            description: String::new(),
            difficulty_level: DifficultyLevel::default(),
            estimated_duration_hours: default_duration_hours(),
            learning_objectives: Vec::new(),
            prerequisites: Vec::new(),
            tags: Vec::new(),
            generation_prompt: String::new(),
        }
    }
}

/// Partial update. `None` leaves the stored value alone; `Some` overwrites,
/// including `Some(vec![])` which clears a list.
///
/// `generation_status` is not updatable here; after creation only
/// `GenerationService` writes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BootcampUpdate {
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub difficulty_level: Option<DifficultyLevel>,
    #[validate(range(min = 1, max = 1000))]
    pub estimated_duration_hours: Option<i32>,
    pub learning_objectives: Option<Vec<String>>,
    pub prerequisites: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl BootcampUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.difficulty_level.is_none()
            && self.estimated_duration_hours.is_none()
            && self.learning_objectives.is_none()
            && self.prerequisites.is_none()
            && self.tags.is_none()
    }

    /// Merge the present fields onto `bootcamp`. Timestamps are the caller's
    /// concern.
    pub fn apply_to(self, bootcamp: &mut Bootcamp) {
        if let Some(title) = self.title {
            bootcamp.title = title;
        }
        if let Some(description) = self.description {
            bootcamp.description = description;
        }
        if let Some(level) = self.difficulty_level {
            bootcamp.difficulty_level = level;
        }
        if let Some(hours) = self.estimated_duration_hours {
            bootcamp.estimated_duration_hours = hours;
        }
        if let Some(objectives) = self.learning_objectives {
            bootcamp.learning_objectives = objectives;
        }
        if let Some(prerequisites) = self.prerequisites {
            bootcamp.prerequisites = prerequisites;
        }
        if let Some(tags) = self.tags {
            bootcamp.tags = tags;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootcampResponse {
    pub id: DbId,
    pub title: String,
    pub topic: String,
    pub description: String,
    pub difficulty_level: DifficultyLevel,
    pub estimated_duration_hours: i32,
    pub learning_objectives: Vec<String>,
    pub prerequisites: Vec<String>,
    pub tags: Vec<String>,
    pub generation_status: GenerationStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Bootcamp> for BootcampResponse {
    fn from(b: Bootcamp) -> Self {
        Self {
            id: b.id,
            title: b.title,
            topic: b.topic,
            description: b.description,
            difficulty_level: b.difficulty_level,
            estimated_duration_hours: b.estimated_duration_hours,
            learning_objectives: b.learning_objectives,
            prerequisites: b.prerequisites,
            tags: b.tags,
            generation_status: b.generation_status,
            created_at: b.created_at.to_rfc3339(),
            updated_at: b.updated_at.to_rfc3339(),
        }
    }
}

/// Bootcamp with the size of its subtree's first level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootcampDetailResponse {
    #[serde(flatten)]
    pub bootcamp: BootcampResponse,
    pub courses_count: i64,
    pub exams_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn stored_bootcamp() -> Bootcamp {
        let now = Utc::now();
        Bootcamp {
            id: 1,
            title: "Rust from zero".to_string(),
            topic: "rust".to_string(),
            description: "ownership first".to_string(),
            difficulty_level: DifficultyLevel::Beginner,
            estimated_duration_hours: 40,
            learning_objectives: vec!["borrowing".to_string()],
            prerequisites: vec!["a terminal".to_string()],
            tags: vec!["systems".to_string()],
            generation_status: GenerationStatus::Pending,
            generation_prompt: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_defaults() {
        let req: BootcampCreate =
            serde_json::from_value(json!({ "title": "Go", "topic": "go" })).unwrap();
        assert_eq!(req.description, "");
        assert_eq!(req.difficulty_level, DifficultyLevel::Beginner);
        assert_eq!(req.estimated_duration_hours, 40);
        assert!(req.learning_objectives.is_empty());
        assert!(req.prerequisites.is_empty());
        assert!(req.tags.is_empty());
        assert_eq!(req.generation_prompt, "");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_requires_title_and_topic() {
        assert!(serde_json::from_value::<BootcampCreate>(json!({ "title": "Go" })).is_err());
        assert!(serde_json::from_value::<BootcampCreate>(json!({ "topic": "go" })).is_err());
    }

    #[test]
    fn test_create_duration_bounds() {
        let mut req = BootcampCreate::new("Go", "go");
        for hours in [1, 1000] {
            req.estimated_duration_hours = hours;
            assert!(req.validate().is_ok(), "{hours} should be accepted");
        }
        for hours in [0, -5, 1001] {
            req.estimated_duration_hours = hours;
            let errors = req.validate().unwrap_err();
            assert!(errors.field_errors().contains_key("estimated_duration_hours"));
        }
    }

    #[test]
    fn test_create_string_limits() {
        let mut req = BootcampCreate::new("t".repeat(200), "x".repeat(100));
        assert!(req.validate().is_ok());

        req.title = "t".repeat(201);
        req.topic = "x".repeat(101);
        req.generation_prompt = "p".repeat(5001);
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("topic"));
        assert!(fields.contains_key("generation_prompt"));
    }

    #[test]
    fn test_update_leaves_absent_fields_untouched() {
        let mut bootcamp = stored_bootcamp();
        let before = bootcamp.clone();
        let update: BootcampUpdate =
            serde_json::from_value(json!({ "title": "Rust, properly" })).unwrap();
        update.apply_to(&mut bootcamp);

        assert_eq!(bootcamp.title, "Rust, properly");
        assert_eq!(bootcamp.description, before.description);
        assert_eq!(bootcamp.estimated_duration_hours, before.estimated_duration_hours);
        assert_eq!(bootcamp.learning_objectives, before.learning_objectives);
        assert_eq!(bootcamp.tags, before.tags);
        assert_eq!(bootcamp.topic, before.topic);
    }

    #[test]
    fn test_update_explicit_empty_list_resets() {
        let mut bootcamp = stored_bootcamp();
        let update: BootcampUpdate =
            serde_json::from_value(json!({ "tags": [], "estimated_duration_hours": 12 })).unwrap();
        assert!(!update.is_empty());
        update.apply_to(&mut bootcamp);

        assert!(bootcamp.tags.is_empty());
        assert_eq!(bootcamp.estimated_duration_hours, 12);
        assert_eq!(bootcamp.prerequisites, vec!["a terminal".to_string()]);
    }

    #[test]
    fn test_update_bounds_only_checked_when_present() {
        assert!(BootcampUpdate::default().validate().is_ok());
        let update = BootcampUpdate {
            estimated_duration_hours: Some(1001),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_update_ignores_generation_status() {
        let update: BootcampUpdate =
            serde_json::from_value(json!({ "generation_status": "completed" })).unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn test_response_renders_timestamps_as_text() {
        let bootcamp = stored_bootcamp();
        let created = bootcamp.created_at.to_rfc3339();
        let response = BootcampResponse::from(bootcamp);
        assert_eq!(response.created_at, created);

        let value = serde_json::to_value(&response).unwrap();
        assert!(value["created_at"].is_string());
        assert!(value.get("generation_prompt").is_none());
    }
}
