//!
//! lectern HTTP server
//! -------------------
//! This module defines the axum-based HTTP API for lectern.
//!
//! Responsibilities:
//! - Sign-in/sign-out endpoints issuing the stateless session token as both
//!   a response field and a `t` cookie.
//! - User, course and lesson CRUD routes with per-route authorization guard
//!   chains applied in a fixed order.
//! - Path-addressed resource resolution before ownership checks, mirroring
//!   router-param semantics: an unresolvable course id returns 400 whatever
//!   the request's authentication state.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::identity::{
    self, apply, authenticate, require_course_owner, require_educator, require_self,
    resolve_profile, Access, SignInRequest, TokenService, SESSION_COOKIE,
};
use crate::store::{
    Course, CourseUpdate, Lesson, NewCourse, NewLesson, NewUser, SharedStore, User, UserUpdate,
};

/// Shared server state injected into all handlers. The token service carries
/// the signing secret fixed at startup; both fields are safe for concurrent
/// reads without further locking.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub tokens: Arc<TokenService>,
}

/// Mount all routes over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "lectern ok" }))
        .route("/signin", post(signin))
        .route("/signout", get(signout))
        .route("/api/users", get(user_index))
        .route("/api/user", post(user_create))
        .route(
            "/api/user/{id}",
            get(user_show).put(user_update).delete(user_destroy),
        )
        .route("/api/courses", get(course_index))
        .route("/api/course/{course_id}", get(course_show))
        .route("/api/courses/by/{user_id}", get(courses_by_instructor))
        .route("/api/course/by/{user_id}", post(course_create))
        .route(
            "/api/course/{course_id}/by/{user_id}",
            put(course_update).delete(course_destroy),
        )
        .route("/api/course/{course_id}/lesson/new", post(lesson_create))
        .route("/api/course/{course_id}/lessons", get(lesson_index))
        .with_state(state)
}

/// Start the lectern HTTP server with the given configuration.
pub async fn run_with_config(config: Config) -> anyhow::Result<()> {
    let state = AppState {
        store: SharedStore::new(),
        tokens: Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl)),
    };
    let app = router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Convenience entry point reading configuration from the environment.
pub async fn run() -> anyhow::Result<()> {
    run_with_config(Config::from_env()).await
}

pub fn session_cookie(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("{}={}; Path=/", SESSION_COOKIE, token)).unwrap()
}

pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/",
        SESSION_COOKIE
    ))
    .unwrap()
}

/// Public projection of a user; credential fields are never serialized.
fn user_json(u: &User) -> serde_json::Value {
    json!({
        "_id": u.id,
        "name": u.name,
        "email": u.email,
        "role": u.role,
        "createdAt": u.created_at,
        "updatedAt": u.updated_at,
    })
}

fn course_json(c: &Course) -> serde_json::Value {
    json!({
        "_id": c.id,
        "name": c.name,
        "description": c.description,
        "category": c.category,
        "published": c.published,
        "instructor": c.instructor_id,
        "createdAt": c.created_at,
        "updatedAt": c.updated_at,
    })
}

fn lesson_json(l: &Lesson) -> serde_json::Value {
    json!({
        "_id": l.id,
        "title": l.title,
        "content": l.content,
        "resourceUrl": l.resource_url,
    })
}

/// Router-param style resolution: runs before the authentication gate on
/// course-addressed routes.
fn get_course(store: &SharedStore, id: &str) -> AppResult<Course> {
    store
        .0
        .read()
        .find_course_by_id(id)
        .ok_or_else(|| AppError::resolution("Could not retrieve course."))
}

/// The course is resolved before the guard chain runs without holding the
/// lock, so it can vanish underneath a passing request. The mutation itself
/// decides whether the course is still there.
fn apply_course_update(store: &SharedStore, id: &str, upd: CourseUpdate) -> AppResult<()> {
    store
        .0
        .write()
        .update_course(id, upd)
        .map(|_| ())
        .ok_or_else(|| AppError::resolution("Could not retrieve course."))
}

fn remove_course(store: &SharedStore, id: &str) -> AppResult<()> {
    if store.0.write().delete_course(id) {
        Ok(())
    } else {
        Err(AppError::resolution("Could not retrieve course."))
    }
}

// ---- auth ----

async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Response, AppError> {
    // Key derivation is CPU-bound; keep it off the async workers.
    let store = state.store.clone();
    let tokens = state.tokens.clone();
    let outcome = tokio::task::spawn_blocking(move || identity::sign_in(&store, &tokens, &payload))
        .await
        .map_err(|e| AppError::internal(e.to_string()))??;

    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", session_cookie(&outcome.token));
    Ok((
        StatusCode::OK,
        headers,
        Json(json!({ "token": outcome.token, "user": outcome.user })),
    )
        .into_response())
}

/// Sign-out is advisory: the token stays cryptographically valid until
/// expiry, so all this does is clear the cookie. Safe to repeat.
async fn signout() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", clear_session_cookie());
    (
        StatusCode::OK,
        headers,
        Json(json!({ "message": "User signed out." })),
    )
}

// ---- users ----

async fn user_index(State(state): State<AppState>) -> impl IntoResponse {
    let users = state.store.0.read().list_users();
    Json(users.iter().map(user_json).collect::<Vec<_>>())
}

async fn user_create(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<Response, AppError> {
    let store = state.store.clone();
    let user = tokio::task::spawn_blocking(move || store.create_user(payload))
        .await
        .map_err(|e| AppError::internal(e.to_string()))??;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "User signed up.", "_id": user.id })),
    )
        .into_response())
}

async fn user_show(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    authenticate(&state.tokens, &headers)?;
    let user = state
        .store
        .0
        .read()
        .find_user_by_id(&id)
        .ok_or_else(|| AppError::not_found("User not found."))?;
    Ok(Json(user_json(&user)).into_response())
}

async fn user_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> Result<Response, AppError> {
    let principal = authenticate(&state.tokens, &headers)?;
    apply(
        Access::new(principal),
        vec![
            resolve_profile(state.store.clone(), id.clone()),
            require_self(),
        ],
    )?;
    let store = state.store.clone();
    let updated = tokio::task::spawn_blocking(move || store.update_user(&id, payload))
        .await
        .map_err(|e| AppError::internal(e.to_string()))??;
    match updated {
        Some(_) => Ok((
            StatusCode::OK,
            Json(json!({ "message": "User data successfully updated." })),
        )
            .into_response()),
        None => Err(AppError::not_found("User not found.")),
    }
}

async fn user_destroy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let principal = authenticate(&state.tokens, &headers)?;
    apply(
        Access::new(principal),
        vec![
            resolve_profile(state.store.clone(), id.clone()),
            require_self(),
        ],
    )?;
    state.store.0.write().delete_user(&id);
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "User deleted successfully." })),
    )
        .into_response())
}

// ---- courses ----

async fn course_index(State(state): State<AppState>) -> impl IntoResponse {
    let courses = state.store.0.read().list_courses();
    Json(courses.iter().map(course_json).collect::<Vec<_>>())
}

async fn course_show(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Response, AppError> {
    let course = get_course(&state.store, &course_id)?;
    Ok(Json(course_json(&course)).into_response())
}

async fn courses_by_instructor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Response, AppError> {
    authenticate(&state.tokens, &headers)?;
    let courses = state.store.0.read().courses_by_instructor(&user_id);
    Ok(Json(courses.iter().map(course_json).collect::<Vec<_>>()).into_response())
}

async fn course_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(payload): Json<NewCourse>,
) -> Result<Response, AppError> {
    let principal = authenticate(&state.tokens, &headers)?;
    let access = apply(
        Access::new(principal),
        vec![
            resolve_profile(state.store.clone(), user_id),
            require_self(),
            require_educator(),
        ],
    )?;
    let course = state
        .store
        .0
        .write()
        .create_course(&access.principal.user_id, payload)?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Course successfully created.", "_id": course.id })),
    )
        .into_response())
}

async fn course_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((course_id, user_id)): Path<(String, String)>,
    Json(payload): Json<CourseUpdate>,
) -> Result<Response, AppError> {
    let course = get_course(&state.store, &course_id)?;
    let principal = authenticate(&state.tokens, &headers)?;
    let mut access = Access::new(principal);
    access.course = Some(course);
    apply(
        access,
        vec![
            resolve_profile(state.store.clone(), user_id),
            require_self(),
            require_course_owner(),
        ],
    )?;
    apply_course_update(&state.store, &course_id, payload)?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Course data successfully updated." })),
    )
        .into_response())
}

async fn course_destroy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((course_id, user_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let course = get_course(&state.store, &course_id)?;
    let principal = authenticate(&state.tokens, &headers)?;
    let mut access = Access::new(principal);
    access.course = Some(course);
    apply(
        access,
        vec![
            resolve_profile(state.store.clone(), user_id),
            require_self(),
            require_course_owner(),
        ],
    )?;
    remove_course(&state.store, &course_id)?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Course deleted successfully." })),
    )
        .into_response())
}

// ---- lessons ----

async fn lesson_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(course_id): Path<String>,
    Json(payload): Json<NewLesson>,
) -> Result<Response, AppError> {
    let course = get_course(&state.store, &course_id)?;
    let principal = authenticate(&state.tokens, &headers)?;
    let mut access = Access::new(principal);
    access.course = Some(course);
    apply(access, vec![require_course_owner()])?;
    state.store.0.write().add_lesson(&course_id, payload)?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Lesson created successfully." })),
    )
        .into_response())
}

async fn lesson_index(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Response, AppError> {
    get_course(&state.store, &course_id)?;
    let lessons = state.store.0.read().lessons_for_course(&course_id);
    Ok((
        StatusCode::OK,
        Json(json!({ "lessons": lessons.iter().map(lesson_json).collect::<Vec<_>>() })),
    )
        .into_response())
}
