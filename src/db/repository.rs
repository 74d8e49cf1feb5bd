use chrono::Utc;
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};
use tracing::{info, warn};
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    Bootcamp, BootcampCreate, BootcampDetailResponse, BootcampUpdate, Course, CourseCreate,
    CourseWithLessonsResponse, DbId, GenerationStatus, LearningMaterial, LearningMaterialCreate,
    Lesson, LessonCreate, LessonDetailResponse, Question, QuestionCreate, Quiz, QuizCreate,
    QuizDetailResponse, QuizParent,
};

const BOOTCAMP_COLUMNS: &str = "id, title, topic, description, difficulty_level, \
    estimated_duration_hours, learning_objectives, prerequisites, tags, \
    generation_status, generation_prompt, created_at, updated_at";

const COURSE_COLUMNS: &str = "id, bootcamp_id, title, description, order_index, \
    estimated_duration_hours, learning_outcomes, created_at";

const LESSON_COLUMNS: &str = "id, course_id, title, content, summary, order_index, \
    estimated_duration_minutes, key_concepts, created_at";

const MATERIAL_COLUMNS: &str = "id, lesson_id, title, description, material_type, content, \
    url, file_path, order_index, material_metadata, created_at";

const QUIZ_COLUMNS: &str = "id, lesson_id, bootcamp_id, title, description, is_exam, \
    time_limit_minutes, passing_score_percentage, max_attempts, order_index, created_at";

const QUESTION_COLUMNS: &str = "id, quiz_id, question_text, question_type, options, \
    correct_answers, explanation, points, order_index, difficulty_level, tags, created_at";

/// Turn a foreign key failure on insert into a "parent missing" error.
fn parent_error(entity: &'static str, id: DbId) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_foreign_key_violation() {
                return AppError::ParentNotFound { entity, id };
            }
        }
        AppError::Database(e)
    }
}

async fn count(db: &SqlitePool, sql: &str, id: DbId) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(sql).bind(id).fetch_one(db).await?;
    Ok(row.0)
}

async fn delete_by_id(db: &SqlitePool, table: &str, id: DbId) -> Result<bool, sqlx::Error> {
    // Children go with the row through ON DELETE CASCADE in the same statement.
    let query = format!("DELETE FROM {table} WHERE id = ?1");
    let result = sqlx::query(&query).bind(id).execute(db).await?.rows_affected();
    if result > 0 {
        info!("deleted {} {}", table, id);
    }
    Ok(result > 0)
}

// ---------------------------------------------------------------------------
// Bootcamps
// ---------------------------------------------------------------------------

pub async fn insert_bootcamp(db: &SqlitePool, req: BootcampCreate) -> Result<Bootcamp, AppError> {
    req.validate()?;
    let now = Utc::now();

    let query = format!(
        "INSERT INTO bootcamps
            (title, topic, description, difficulty_level, estimated_duration_hours,
             learning_objectives, prerequisites, tags, generation_status,
             generation_prompt, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
         RETURNING {BOOTCAMP_COLUMNS}"
    );
    let bootcamp = sqlx::query_as::<_, Bootcamp>(&query)
        .bind(&req.title)
        .bind(&req.topic)
        .bind(&req.description)
        .bind(req.difficulty_level)
        .bind(req.estimated_duration_hours)
        .bind(Json(&req.learning_objectives))
        .bind(Json(&req.prerequisites))
        .bind(Json(&req.tags))
        .bind(GenerationStatus::Pending)
        .bind(&req.generation_prompt)
        .bind(now)
        .fetch_one(db)
        .await?;

    info!("created bootcamp {} ({})", bootcamp.id, bootcamp.title);
    Ok(bootcamp)
}

pub async fn find_bootcamp_by_id(db: &SqlitePool, id: DbId) -> Result<Option<Bootcamp>, sqlx::Error> {
    let query = format!("SELECT {BOOTCAMP_COLUMNS} FROM bootcamps WHERE id = ?1");
    sqlx::query_as::<_, Bootcamp>(&query)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn fetch_bootcamps(db: &SqlitePool) -> Result<Vec<Bootcamp>, sqlx::Error> {
    let query = format!("SELECT {BOOTCAMP_COLUMNS} FROM bootcamps ORDER BY updated_at DESC, id DESC");
    sqlx::query_as::<_, Bootcamp>(&query).fetch_all(db).await
}

/// Merge `req` onto the stored bootcamp and refresh `updated_at`.
/// `Ok(None)` when the bootcamp does not exist.
pub async fn update_bootcamp(
    db: &SqlitePool,
    id: DbId,
    req: BootcampUpdate,
) -> Result<Option<Bootcamp>, AppError> {
    req.validate()?;

    let mut current = match find_bootcamp_by_id(db, id).await? {
        Some(b) => b,
        None => return Ok(None),
    };

    req.apply_to(&mut current);
    current.validate()?;
    current.updated_at = Utc::now();

    let updated = sqlx::query(
        r#"
        UPDATE bootcamps
        SET title = ?1,
            description = ?2,
            difficulty_level = ?3,
            estimated_duration_hours = ?4,
            learning_objectives = ?5,
            prerequisites = ?6,
            tags = ?7,
            updated_at = ?8
        WHERE id = ?9
        "#,
    )
    .bind(&current.title)
    .bind(&current.description)
    .bind(current.difficulty_level)
    .bind(current.estimated_duration_hours)
    .bind(Json(&current.learning_objectives))
    .bind(Json(&current.prerequisites))
    .bind(Json(&current.tags))
    .bind(current.updated_at)
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(None);
    }
    Ok(Some(current))
}

/// Move a bootcamp along the generation lifecycle. The write only lands if
/// the stored status is still the one the transition was checked against.
pub async fn transition_generation_status(
    db: &SqlitePool,
    id: DbId,
    next: GenerationStatus,
) -> Result<Bootcamp, AppError> {
    let mut bootcamp = find_bootcamp_by_id(db, id).await?.ok_or(AppError::NotFound)?;
    let from = bootcamp.generation_status;
    if !from.can_transition_to(next) {
        return Err(AppError::InvalidTransition { from, to: next });
    }

    let now = Utc::now();
    let updated = sqlx::query(
        r#"
        UPDATE bootcamps
        SET generation_status = ?1,
            updated_at = ?2
        WHERE id = ?3 AND generation_status = ?4
        "#,
    )
    .bind(next)
    .bind(now)
    .bind(id)
    .bind(from)
    .execute(db)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::Conflict(format!(
            "generation status of bootcamp {} changed concurrently",
            id
        )));
    }

    info!("bootcamp {} generation status {} -> {}", id, from, next);
    bootcamp.generation_status = next;
    bootcamp.updated_at = now;
    Ok(bootcamp)
}

pub async fn delete_bootcamp(db: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
    delete_by_id(db, "bootcamps", id).await
}

pub async fn bootcamp_detail(
    db: &SqlitePool,
    id: DbId,
) -> Result<Option<BootcampDetailResponse>, sqlx::Error> {
    let Some(bootcamp) = find_bootcamp_by_id(db, id).await? else {
        return Ok(None);
    };
    let courses_count = count(db, "SELECT COUNT(*) FROM courses WHERE bootcamp_id = ?1", id).await?;
    let exams_count = count(db, "SELECT COUNT(*) FROM quizzes WHERE bootcamp_id = ?1", id).await?;

    Ok(Some(BootcampDetailResponse {
        bootcamp: bootcamp.into(),
        courses_count,
        exams_count,
    }))
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

pub async fn insert_course(db: &SqlitePool, req: CourseCreate) -> Result<Course, AppError> {
    req.validate()?;

    let query = format!(
        "INSERT INTO courses
            (bootcamp_id, title, description, order_index,
             estimated_duration_hours, learning_outcomes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         RETURNING {COURSE_COLUMNS}"
    );
    let course = sqlx::query_as::<_, Course>(&query)
        .bind(req.bootcamp_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.order_index)
        .bind(req.estimated_duration_hours)
        .bind(Json(&req.learning_outcomes))
        .bind(Utc::now())
        .fetch_one(db)
        .await
        .map_err(parent_error("bootcamp", req.bootcamp_id))?;

    info!("created course {} in bootcamp {}", course.id, course.bootcamp_id);
    Ok(course)
}

pub async fn find_course_by_id(db: &SqlitePool, id: DbId) -> Result<Option<Course>, sqlx::Error> {
    let query = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1");
    sqlx::query_as::<_, Course>(&query)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn fetch_courses(db: &SqlitePool, bootcamp_id: DbId) -> Result<Vec<Course>, sqlx::Error> {
    let query = format!(
        "SELECT {COURSE_COLUMNS} FROM courses
         WHERE bootcamp_id = ?1
         ORDER BY order_index ASC, id ASC"
    );
    sqlx::query_as::<_, Course>(&query)
        .bind(bootcamp_id)
        .fetch_all(db)
        .await
}

#[derive(FromRow)]
struct CourseWithCount {
    #[sqlx(flatten)]
    course: Course,
    lessons_count: i64,
}

/// Courses of a bootcamp with their current lesson counts.
pub async fn fetch_course_summaries(
    db: &SqlitePool,
    bootcamp_id: DbId,
) -> Result<Vec<CourseWithLessonsResponse>, sqlx::Error> {
    let query = format!(
        "SELECT {COURSE_COLUMNS},
            (SELECT COUNT(*) FROM lessons l WHERE l.course_id = courses.id) AS lessons_count
         FROM courses
         WHERE bootcamp_id = ?1
         ORDER BY order_index ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, CourseWithCount>(&query)
        .bind(bootcamp_id)
        .fetch_all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|r| CourseWithLessonsResponse::new(r.course, r.lessons_count))
        .collect())
}

pub async fn delete_course(db: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
    delete_by_id(db, "courses", id).await
}

// ---------------------------------------------------------------------------
// Lessons
// ---------------------------------------------------------------------------

pub async fn insert_lesson(db: &SqlitePool, req: LessonCreate) -> Result<Lesson, AppError> {
    req.validate()?;

    let query = format!(
        "INSERT INTO lessons
            (course_id, title, content, summary, order_index,
             estimated_duration_minutes, key_concepts, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         RETURNING {LESSON_COLUMNS}"
    );
    let lesson = sqlx::query_as::<_, Lesson>(&query)
        .bind(req.course_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(&req.summary)
        .bind(req.order_index)
        .bind(req.estimated_duration_minutes)
        .bind(Json(&req.key_concepts))
        .bind(Utc::now())
        .fetch_one(db)
        .await
        .map_err(parent_error("course", req.course_id))?;

    info!("created lesson {} in course {}", lesson.id, lesson.course_id);
    Ok(lesson)
}

pub async fn find_lesson_by_id(db: &SqlitePool, id: DbId) -> Result<Option<Lesson>, sqlx::Error> {
    let query = format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = ?1");
    sqlx::query_as::<_, Lesson>(&query)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn fetch_lessons(db: &SqlitePool, course_id: DbId) -> Result<Vec<Lesson>, sqlx::Error> {
    let query = format!(
        "SELECT {LESSON_COLUMNS} FROM lessons
         WHERE course_id = ?1
         ORDER BY order_index ASC, id ASC"
    );
    sqlx::query_as::<_, Lesson>(&query)
        .bind(course_id)
        .fetch_all(db)
        .await
}

#[derive(FromRow)]
struct LessonWithCounts {
    #[sqlx(flatten)]
    lesson: Lesson,
    materials_count: i64,
    quizzes_count: i64,
}

const LESSON_DETAIL_SELECT: &str = "SELECT id, course_id, title, content, summary, order_index, \
    estimated_duration_minutes, key_concepts, created_at, \
    (SELECT COUNT(*) FROM learning_materials m WHERE m.lesson_id = lessons.id) AS materials_count, \
    (SELECT COUNT(*) FROM quizzes q WHERE q.lesson_id = lessons.id) AS quizzes_count \
    FROM lessons";

pub async fn lesson_detail(
    db: &SqlitePool,
    id: DbId,
) -> Result<Option<LessonDetailResponse>, sqlx::Error> {
    let query = format!("{LESSON_DETAIL_SELECT} WHERE id = ?1");
    let row = sqlx::query_as::<_, LessonWithCounts>(&query)
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(row.map(|r| LessonDetailResponse::new(r.lesson, r.materials_count, r.quizzes_count)))
}

pub async fn fetch_lesson_details(
    db: &SqlitePool,
    course_id: DbId,
) -> Result<Vec<LessonDetailResponse>, sqlx::Error> {
    let query = format!("{LESSON_DETAIL_SELECT} WHERE course_id = ?1 ORDER BY order_index ASC, id ASC");
    let rows = sqlx::query_as::<_, LessonWithCounts>(&query)
        .bind(course_id)
        .fetch_all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|r| LessonDetailResponse::new(r.lesson, r.materials_count, r.quizzes_count))
        .collect())
}

pub async fn delete_lesson(db: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
    delete_by_id(db, "lessons", id).await
}

// ---------------------------------------------------------------------------
// Learning materials
// ---------------------------------------------------------------------------

pub async fn insert_material(
    db: &SqlitePool,
    req: LearningMaterialCreate,
) -> Result<LearningMaterial, AppError> {
    req.validate()?;
    if !req.has_expected_source() {
        warn!(
            "material '{}' of type {:?} has no source for its type",
            req.title, req.material_type
        );
    }

    let query = format!(
        "INSERT INTO learning_materials
            (lesson_id, title, description, material_type, content, url,
             file_path, order_index, material_metadata, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         RETURNING {MATERIAL_COLUMNS}"
    );
    let material = sqlx::query_as::<_, LearningMaterial>(&query)
        .bind(req.lesson_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.material_type)
        .bind(&req.content)
        .bind(&req.url)
        .bind(&req.file_path)
        .bind(req.order_index)
        .bind(Json(&req.material_metadata))
        .bind(Utc::now())
        .fetch_one(db)
        .await
        .map_err(parent_error("lesson", req.lesson_id))?;

    info!("created material {} in lesson {}", material.id, material.lesson_id);
    Ok(material)
}

pub async fn fetch_materials(
    db: &SqlitePool,
    lesson_id: DbId,
) -> Result<Vec<LearningMaterial>, sqlx::Error> {
    let query = format!(
        "SELECT {MATERIAL_COLUMNS} FROM learning_materials
         WHERE lesson_id = ?1
         ORDER BY order_index ASC, id ASC"
    );
    sqlx::query_as::<_, LearningMaterial>(&query)
        .bind(lesson_id)
        .fetch_all(db)
        .await
}

pub async fn delete_material(db: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
    delete_by_id(db, "learning_materials", id).await
}

// ---------------------------------------------------------------------------
// Quizzes
// ---------------------------------------------------------------------------

pub async fn insert_quiz(db: &SqlitePool, req: QuizCreate) -> Result<Quiz, AppError> {
    req.validate()?;
    let parent = req
        .parent()
        .ok_or_else(|| AppError::BadRequest("quiz needs exactly one parent".to_string()))?;
    let (entity, parent_id) = match parent {
        QuizParent::Lesson(id) => ("lesson", id),
        QuizParent::Bootcamp(id) => ("bootcamp", id),
    };

    let query = format!(
        "INSERT INTO quizzes
            (lesson_id, bootcamp_id, title, description, is_exam, time_limit_minutes,
             passing_score_percentage, max_attempts, order_index, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         RETURNING {QUIZ_COLUMNS}"
    );
    let quiz = sqlx::query_as::<_, Quiz>(&query)
        .bind(parent.lesson_id())
        .bind(parent.bootcamp_id())
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.is_exam)
        .bind(req.time_limit_minutes)
        .bind(req.passing_score_percentage)
        .bind(req.max_attempts)
        .bind(req.order_index)
        .bind(Utc::now())
        .fetch_one(db)
        .await
        .map_err(parent_error(entity, parent_id))?;

    info!("created quiz {} under {} {}", quiz.id, entity, parent_id);
    Ok(quiz)
}

pub async fn find_quiz_by_id(db: &SqlitePool, id: DbId) -> Result<Option<Quiz>, sqlx::Error> {
    let query = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?1");
    sqlx::query_as::<_, Quiz>(&query)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn fetch_lesson_quizzes(db: &SqlitePool, lesson_id: DbId) -> Result<Vec<Quiz>, sqlx::Error> {
    let query = format!(
        "SELECT {QUIZ_COLUMNS} FROM quizzes
         WHERE lesson_id = ?1
         ORDER BY order_index ASC, id ASC"
    );
    sqlx::query_as::<_, Quiz>(&query)
        .bind(lesson_id)
        .fetch_all(db)
        .await
}

/// Quizzes attached directly to a bootcamp.
pub async fn fetch_bootcamp_exams(db: &SqlitePool, bootcamp_id: DbId) -> Result<Vec<Quiz>, sqlx::Error> {
    let query = format!(
        "SELECT {QUIZ_COLUMNS} FROM quizzes
         WHERE bootcamp_id = ?1
         ORDER BY order_index ASC, id ASC"
    );
    sqlx::query_as::<_, Quiz>(&query)
        .bind(bootcamp_id)
        .fetch_all(db)
        .await
}

pub async fn quiz_detail(db: &SqlitePool, id: DbId) -> Result<Option<QuizDetailResponse>, sqlx::Error> {
    let Some(quiz) = find_quiz_by_id(db, id).await? else {
        return Ok(None);
    };
    let (questions_count, total_points): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(points), 0) FROM questions WHERE quiz_id = ?1",
    )
    .bind(id)
    .fetch_one(db)
    .await?;

    Ok(Some(QuizDetailResponse {
        quiz,
        questions_count,
        total_points,
    }))
}

pub async fn delete_quiz(db: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
    delete_by_id(db, "quizzes", id).await
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

pub async fn insert_question(db: &SqlitePool, req: QuestionCreate) -> Result<Question, AppError> {
    req.validate()?;
    let unmatched = req.unmatched_answers();
    if !unmatched.is_empty() {
        warn!(
            "question for quiz {} has correct answers outside its options: {:?}",
            req.quiz_id, unmatched
        );
    }

    let query = format!(
        "INSERT INTO questions
            (quiz_id, question_text, question_type, options, correct_answers,
             explanation, points, order_index, difficulty_level, tags, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         RETURNING {QUESTION_COLUMNS}"
    );
    let question = sqlx::query_as::<_, Question>(&query)
        .bind(req.quiz_id)
        .bind(&req.question_text)
        .bind(req.question_type)
        .bind(Json(&req.options))
        .bind(Json(&req.correct_answers))
        .bind(&req.explanation)
        .bind(req.points)
        .bind(req.order_index)
        .bind(req.difficulty_level)
        .bind(Json(&req.tags))
        .bind(Utc::now())
        .fetch_one(db)
        .await
        .map_err(parent_error("quiz", req.quiz_id))?;

    info!("created question {} in quiz {}", question.id, question.quiz_id);
    Ok(question)
}

pub async fn fetch_questions(db: &SqlitePool, quiz_id: DbId) -> Result<Vec<Question>, sqlx::Error> {
    let query = format!(
        "SELECT {QUESTION_COLUMNS} FROM questions
         WHERE quiz_id = ?1
         ORDER BY order_index ASC, id ASC"
    );
    sqlx::query_as::<_, Question>(&query)
        .bind(quiz_id)
        .fetch_all(db)
        .await
}

pub async fn delete_question(db: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
    delete_by_id(db, "questions", id).await
}
