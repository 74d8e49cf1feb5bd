use axum::Json;
use axum::extract::Path;
use axum::routing::{delete, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::services::{GenerationReport, GenerationService};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/bootcamps", get(list_bootcamps).post(create_bootcamp))
        .route(
            "/bootcamps/{id}",
            get(get_bootcamp).patch(update_bootcamp).delete(delete_bootcamp),
        )
        .route("/bootcamps/{id}/generate", post(generate_bootcamp))
        .route("/bootcamps/{id}/courses", get(list_courses))
        .route("/bootcamps/{id}/exams", get(list_exams))
        .route("/courses", post(create_course))
        .route("/courses/{id}", delete(delete_course))
        .route("/courses/{id}/lessons", get(list_lessons))
        .route("/lessons", post(create_lesson))
        .route("/lessons/{id}", get(get_lesson).delete(delete_lesson))
        .route("/lessons/{id}/materials", get(list_materials))
        .route("/lessons/{id}/quizzes", get(list_lesson_quizzes))
        .route("/materials", post(create_material))
        .route("/materials/{id}", delete(delete_material))
        .route("/quizzes", post(create_quiz))
        .route("/quizzes/{id}", get(get_quiz).delete(delete_quiz))
        .route("/quizzes/{id}/questions", get(list_questions))
        .route("/questions", post(create_question))
        .route("/questions/{id}", delete(delete_question))
        .with_state(state)
}

fn deleted(ok: bool) -> Result<StatusCode, AppError> {
    if ok {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

// Bootcamps

async fn list_bootcamps(State(state): State<AppState>) -> Result<Json<Vec<BootcampResponse>>, AppError> {
    let bootcamps = repository::fetch_bootcamps(&state.db).await?;
    Ok(Json(bootcamps.into_iter().map(BootcampResponse::from).collect()))
}

async fn create_bootcamp(
    State(state): State<AppState>,
    Json(req): Json<BootcampCreate>,
) -> Result<(StatusCode, Json<BootcampResponse>), AppError> {
    let bootcamp = repository::insert_bootcamp(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(bootcamp.into())))
}

async fn get_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<Json<BootcampDetailResponse>, AppError> {
    let detail = repository::bootcamp_detail(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(detail))
}

async fn update_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(req): Json<BootcampUpdate>,
) -> Result<Json<BootcampResponse>, AppError> {
    let bootcamp = repository::update_bootcamp(&state.db, id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(bootcamp.into()))
}

async fn delete_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<StatusCode, AppError> {
    deleted(repository::delete_bootcamp(&state.db, id).await?)
}

async fn generate_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<Json<GenerationReport>, AppError> {
    let service = GenerationService::new(state.db.clone(), state.generator.clone());
    let report = service.run(id).await?;
    Ok(Json(report))
}

async fn list_courses(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<Json<Vec<CourseWithLessonsResponse>>, AppError> {
    let courses = repository::fetch_course_summaries(&state.db, id).await?;
    Ok(Json(courses))
}

async fn list_exams(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<Json<Vec<Quiz>>, AppError> {
    let exams = repository::fetch_bootcamp_exams(&state.db, id).await?;
    Ok(Json(exams))
}

// Courses

async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<CourseCreate>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = repository::insert_course(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<StatusCode, AppError> {
    deleted(repository::delete_course(&state.db, id).await?)
}

async fn list_lessons(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<Json<Vec<LessonDetailResponse>>, AppError> {
    let lessons = repository::fetch_lesson_details(&state.db, id).await?;
    Ok(Json(lessons))
}

// Lessons

async fn create_lesson(
    State(state): State<AppState>,
    Json(req): Json<LessonCreate>,
) -> Result<(StatusCode, Json<Lesson>), AppError> {
    let lesson = repository::insert_lesson(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

async fn get_lesson(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<Json<LessonDetailResponse>, AppError> {
    let lesson = repository::lesson_detail(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(lesson))
}

async fn delete_lesson(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<StatusCode, AppError> {
    deleted(repository::delete_lesson(&state.db, id).await?)
}

async fn list_materials(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<Json<Vec<LearningMaterial>>, AppError> {
    let materials = repository::fetch_materials(&state.db, id).await?;
    Ok(Json(materials))
}

async fn list_lesson_quizzes(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<Json<Vec<Quiz>>, AppError> {
    let quizzes = repository::fetch_lesson_quizzes(&state.db, id).await?;
    Ok(Json(quizzes))
}

// Materials

async fn create_material(
    State(state): State<AppState>,
    Json(req): Json<LearningMaterialCreate>,
) -> Result<(StatusCode, Json<LearningMaterial>), AppError> {
    let material = repository::insert_material(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

async fn delete_material(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<StatusCode, AppError> {
    deleted(repository::delete_material(&state.db, id).await?)
}

// Quizzes

async fn create_quiz(
    State(state): State<AppState>,
    Json(req): Json<QuizCreate>,
) -> Result<(StatusCode, Json<Quiz>), AppError> {
    let quiz = repository::insert_quiz(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<Json<QuizDetailResponse>, AppError> {
    let quiz = repository::quiz_detail(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(quiz))
}

async fn delete_quiz(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<StatusCode, AppError> {
    deleted(repository::delete_quiz(&state.db, id).await?)
}

async fn list_questions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<Json<Vec<Question>>, AppError> {
    let questions = repository::fetch_questions(&state.db, id).await?;
    Ok(Json(questions))
}

// Questions

async fn create_question(
    State(state): State<AppState>,
    Json(req): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<Question>), AppError> {
    let question = repository::insert_question(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> Result<StatusCode, AppError> {
    deleted(repository::delete_question(&state.db, id).await?)
}
