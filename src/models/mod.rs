pub mod bootcamp;
pub mod course;
pub mod enums;
pub mod lesson;
pub mod material;
pub mod question;
pub mod quiz;

use chrono::{DateTime, Utc};

pub type DbId = i64;
pub type Timestamp = DateTime<Utc>;

pub use bootcamp::{
    Bootcamp, BootcampCreate, BootcampDetailResponse, BootcampResponse, BootcampUpdate,
};
pub use course::{Course, CourseCreate, CourseWithLessonsResponse};
pub use enums::{DifficultyLevel, GenerationStatus, MaterialType, QuestionType};
pub use lesson::{Lesson, LessonCreate, LessonDetailResponse};
pub use material::{LearningMaterial, LearningMaterialCreate, MaterialMetadata};
pub use question::{Question, QuestionCreate};
pub use quiz::{Quiz, QuizCreate, QuizDetailResponse, QuizParent};
