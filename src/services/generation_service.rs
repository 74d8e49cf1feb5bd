use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::generation::{ContentGenerator, GeneratedOutline};
use crate::models::{Bootcamp, CourseCreate, DbId, GenerationStatus, LessonCreate};

/// Drives one bootcamp through `pending -> generating -> completed | failed`.
pub struct GenerationService {
    db: SqlitePool,
    generator: Arc<dyn ContentGenerator>,
}

#[derive(Debug, Serialize)]
pub struct GenerationReport {
    pub bootcamp_id: DbId,
    pub status: GenerationStatus,
    pub courses_created: usize,
    pub lessons_created: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Marks the bootcamp `failed` when a run is dropped or errors out before
/// writing its final status.
struct InFlightRun {
    db: SqlitePool,
    bootcamp_id: DbId,
    finished: bool,
}

impl Drop for InFlightRun {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("Generation for bootcamp {} interrupted with no runtime", self.bootcamp_id);
            return;
        };
        warn!("Generation for bootcamp {} interrupted, marking failed", self.bootcamp_id);
        let db = self.db.clone();
        let bootcamp_id = self.bootcamp_id;
        handle.spawn(async move {
            if let Err(e) =
                repository::transition_generation_status(&db, bootcamp_id, GenerationStatus::Failed).await
            {
                warn!("Failed to mark bootcamp {} failed: {}", bootcamp_id, e);
            }
        });
    }
}

impl GenerationService {
    pub fn new(db: SqlitePool, generator: Arc<dyn ContentGenerator>) -> Self {
        Self { db, generator }
    }

    /// Run the generator for a pending bootcamp. A generator or persistence
    /// failure leaves the bootcamp `failed` and is reported, not returned.
    pub async fn run(&self, bootcamp_id: DbId) -> Result<GenerationReport, AppError> {
        let bootcamp = repository::transition_generation_status(
            &self.db,
            bootcamp_id,
            GenerationStatus::Generating,
        )
        .await?;
        info!("Generating content for bootcamp {}", bootcamp_id);
        let mut in_flight = InFlightRun {
            db: self.db.clone(),
            bootcamp_id,
            finished: false,
        };

        let mut report = GenerationReport {
            bootcamp_id,
            status: GenerationStatus::Generating,
            courses_created: 0,
            lessons_created: 0,
            error: None,
        };

        let outcome = match self.generator.generate(&bootcamp).await {
            Ok(outline) => self.persist_outline(&bootcamp, outline, &mut report).await,
            Err(e) => Err(e),
        };

        let next = match outcome {
            Ok(()) => GenerationStatus::Completed,
            Err(e) => {
                warn!("Generation failed for bootcamp {}: {}", bootcamp_id, e);
                report.error = Some(e.to_string());
                GenerationStatus::Failed
            }
        };

        repository::transition_generation_status(&self.db, bootcamp_id, next).await?;
        in_flight.finished = true;
        report.status = next;
        info!(
            "Generation finished for bootcamp {} ({}): {} courses, {} lessons",
            bootcamp_id, next, report.courses_created, report.lessons_created
        );
        Ok(report)
    }

    async fn persist_outline(
        &self,
        bootcamp: &Bootcamp,
        outline: GeneratedOutline,
        report: &mut GenerationReport,
    ) -> Result<(), AppError> {
        // Generated courses go after anything already in the bootcamp.
        let offset = repository::fetch_courses(&self.db, bootcamp.id).await?.len();

        for (i, generated) in outline.courses.into_iter().enumerate() {
            let mut req = CourseCreate::new(bootcamp.id, generated.title, order_index(offset + i)?);
            req.description = generated.description;
            req.learning_outcomes = generated.learning_outcomes;
            let course = repository::insert_course(&self.db, req).await?;
            report.courses_created += 1;

            for (j, lesson) in generated.lessons.into_iter().enumerate() {
                let mut req = LessonCreate::new(course.id, lesson.title, order_index(j)?);
                req.content = lesson.content;
                req.summary = lesson.summary;
                req.key_concepts = lesson.key_concepts;
                repository::insert_lesson(&self.db, req).await?;
                report.lessons_created += 1;
            }
        }
        Ok(())
    }
}

fn order_index(position: usize) -> Result<i32, AppError> {
    i32::try_from(position)
        .map_err(|_| AppError::BadRequest(format!("outline position {} is out of range", position)))
}
