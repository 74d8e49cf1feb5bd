use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{DbId, MaterialType, Timestamp};

/// Open key/value bag attached to a material. Values are untyped JSON.
pub type MaterialMetadata = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearningMaterial {
    pub id: DbId,
    pub lesson_id: DbId,
    pub title: String,
    pub description: String,
    pub material_type: MaterialType,
    pub content: String,
    pub url: Option<String>,
    pub file_path: Option<String>,
    pub order_index: i32,
    #[sqlx(json)]
    pub material_metadata: MaterialMetadata,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LearningMaterialCreate {
    pub lesson_id: DbId,
    #[validate(length(max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
    #[serde(default)]
    pub material_type: MaterialType,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub url: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub file_path: Option<String>,
    #[validate(range(min = 0))]
    pub order_index: i32,
    #[serde(default)]
    pub material_metadata: MaterialMetadata,
}

impl LearningMaterialCreate {
    pub fn new(lesson_id: DbId, title: impl Into<String>, order_index: i32) -> Self {
        Self {
            lesson_id,
            title: title.into(),
            description: String::new(),
            material_type: MaterialType::default(),
            content: String::new(),
            url: None,
            file_path: None,
            order_index,
            material_metadata: MaterialMetadata::new(),
        }
    }

    /// Whether the field that matters for `material_type` is filled in.
    /// Not enforced; the repository only warns.
    pub fn has_expected_source(&self) -> bool {
        if self.material_type.expects_inline_content() {
            !self.content.trim().is_empty()
        } else {
            self.url.as_deref().is_some_and(|u| !u.is_empty())
                || self.file_path.as_deref().is_some_and(|p| !p.is_empty())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let req: LearningMaterialCreate = serde_json::from_value(json!({
            "lesson_id": 1,
            "title": "Slides",
            "order_index": 0
        }))
        .unwrap();
        assert_eq!(req.material_type, MaterialType::Text);
        assert!(req.url.is_none());
        assert!(req.file_path.is_none());
        assert!(req.material_metadata.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_metadata_is_free_form() {
        let req: LearningMaterialCreate = serde_json::from_value(json!({
            "lesson_id": 1,
            "title": "Talk",
            "material_type": "video",
            "url": "https://videos.example.com/talk",
            "order_index": 1,
            "material_metadata": { "duration_seconds": 912, "captions": ["en", "ja"], "hd": true }
        }))
        .unwrap();
        assert_eq!(req.material_metadata["duration_seconds"], json!(912));
        assert_eq!(req.material_metadata["captions"], json!(["en", "ja"]));
        assert!(req.has_expected_source());
    }

    #[test]
    fn test_url_and_path_length() {
        let mut req = LearningMaterialCreate::new(1, "Doc", 0);
        req.url = Some("u".repeat(501));
        req.file_path = Some("p".repeat(501));
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("url"));
        assert!(errors.field_errors().contains_key("file_path"));
    }

    #[test]
    fn test_expected_source_by_type() {
        let mut req = LearningMaterialCreate::new(1, "Doc", 0);
        assert!(!req.has_expected_source());
        req.content = "# Intro".to_string();
        assert!(req.has_expected_source());

        req.material_type = MaterialType::Pdf;
        assert!(!req.has_expected_source());
        req.file_path = Some("docs/intro.pdf".to_string());
        assert!(req.has_expected_source());
    }

    #[test]
    fn test_title_description_and_order_bounds() {
        let mut req = LearningMaterialCreate::new(1, "t".repeat(201), -1);
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
