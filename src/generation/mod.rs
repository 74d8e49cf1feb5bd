//! Seam for the content generation pipeline.
//!
//! The pipeline itself (an LLM or anything else) lives outside this crate.
//! It receives a pending bootcamp and hands back an outline of courses and
//! lessons; `GenerationService` persists the outline and owns every
//! `generation_status` write.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Bootcamp;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedLesson {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_concepts: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedCourse {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    #[serde(default)]
    pub lessons: Vec<GeneratedLesson>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedOutline {
    pub courses: Vec<GeneratedCourse>,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, bootcamp: &Bootcamp) -> Result<GeneratedOutline, AppError>;
}

/// Generator that produces nothing. Used when no pipeline is wired in.
pub struct NoopContentGenerator;

#[async_trait]
impl ContentGenerator for NoopContentGenerator {
    async fn generate(&self, _bootcamp: &Bootcamp) -> Result<GeneratedOutline, AppError> {
        Ok(GeneratedOutline::default())
    }
}
