use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use bytes::BytesMut;
use serde_json::json;
use tracing::error;

use crate::{
    auth::{AuthContext, authenticate},
    catalog::Upload,
    error::AppError,
    models::*,
    state::AppState,
    utils::{attachment_header, parse_id},
};

// ---- Session ----

/// Log in and attach a session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserResponse>), AppError> {
    let user = authenticate(&state.db, &req.username, &req.password)?;
    let session_id = state.sessions.create(user.id);

    let cookie = Cookie::build((state.config.session_cookie.clone(), session_id))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build();

    Ok((jar.add(cookie), Json(UserResponse::from(&user))))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<serde_json::Value>) {
    if let Some(cookie) = jar.get(&state.config.session_cookie) {
        state.sessions.remove(cookie.value());
    }

    let jar = jar.remove(Cookie::build(state.config.session_cookie.clone()).path("/"));
    (jar, Json(json!({"message": "Logged out"})))
}

/// Current user, or 401. A cookie that no longer maps to a live session is cleared.
pub async fn me(
    State(state): State<AppState>,
    auth: AuthContext,
    jar: CookieJar,
) -> Response {
    let user = auth.require_user().and_then(|id| {
        state
            .db
            .users
            .get(id)
            .ok_or_else(|| AppError::Unauthenticated("User not found".to_string()))
    });

    match user {
        Ok(user) => Json(UserResponse::from(&user)).into_response(),
        Err(err) => {
            let jar = jar.remove(Cookie::build(state.config.session_cookie.clone()).path("/"));
            (jar, err).into_response()
        }
    }
}

// ---- Categories ----

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategoryResponse>> {
    Json(state.catalog.list_categories())
}

pub async fn get_category(
    State(state): State<AppState>,
    path: Result<Path<CategoryId>, PathRejection>,
) -> Result<Json<CategoryDetail>, AppError> {
    let id = path_id(path, "Category not found")?;
    Ok(Json(state.catalog.get_category(id)?))
}

pub async fn create_category(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    auth.require_admin()?;
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let category = state.catalog.create_category(&auth, req)?;
    Ok((StatusCode::CREATED, Json(CategoryResponse { category, file_count: 0 })))
}

pub async fn update_category(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<CategoryId>, PathRejection>,
    payload: Result<Json<CategoryPatch>, JsonRejection>,
) -> Result<Json<Category>, AppError> {
    auth.require_admin()?;
    let id = path_id(path, "Category not found")?;
    let Json(patch) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    Ok(Json(state.catalog.update_category(&auth, id, patch)?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<CategoryId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    auth.require_admin()?;
    let id = path_id(path, "Category not found")?;
    state.catalog.delete_category(&auth, id).await?;

    // 204 No Content indicates successful deletion with no response body
    Ok(StatusCode::NO_CONTENT)
}

// ---- Files ----

/// List files, optionally filtered by `?categoryId=`. A malformed filter is ignored.
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Json<Vec<File>> {
    let category_id = query.category_id.as_deref().and_then(parse_id);
    Json(state.catalog.list_files(category_id))
}

pub async fn get_file(
    State(state): State<AppState>,
    path: Result<Path<FileId>, PathRejection>,
) -> Result<Json<File>, AppError> {
    let id = path_id(path, "File not found")?;
    Ok(Json(state.catalog.get_file(id)?))
}

/// Upload an archive using multipart/form-data.
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<File>), AppError> {
    auth.require_admin()?;
    let mut multipart = multipart.map_err(|e| AppError::Multipart(e.body_text()))?;

    let max_file_size = state.config.max_file_size;
    let mut upload = Upload::default();

    // Parse multipart fields
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                upload.original_filename = field.file_name().map(|s| s.to_string());

                // Read in chunks so an oversized upload fails before anything is stored
                let mut data = BytesMut::new();
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    if (data.len() + chunk.len()) as u64 > max_file_size {
                        error!("Upload exceeds maximum limit of {} bytes", max_file_size);
                        return Err(AppError::PayloadTooLarge(format!(
                            "File exceeds maximum limit of {} bytes",
                            max_file_size
                        )));
                    }
                    data.extend_from_slice(&chunk);
                }
                upload.content = data.freeze();
            }
            "categoryId" => upload.category_id = Some(field.text().await.map_err(multipart_error)?),
            "name" => upload.name = Some(field.text().await.map_err(multipart_error)?),
            "description" => upload.description = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let file = state.catalog.upload_file(&auth, upload).await?;
    Ok((StatusCode::CREATED, Json(file)))
}

pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<FileId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    auth.require_admin()?;
    let id = path_id(path, "File not found")?;
    state.catalog.delete_file(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Download an archive by its ID and count the download.
pub async fn download_file(
    State(state): State<AppState>,
    path: Result<Path<FileId>, PathRejection>,
) -> Result<Response, AppError> {
    let id = path_id(path, "File not found")?;
    let download = state.catalog.download_file(id).await?;

    let mut response = Response::new(download.content.into());

    // Set Content-Type header so the browser knows the archive type
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(download.content_type),
    );

    // Set Content-Disposition header to force download under the display name
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, attachment_header(&download.filename));

    Ok(response)
}

// ---- Statistics ----

pub async fn get_stats(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Stats>, AppError> {
    Ok(Json(state.catalog.compute_stats(&auth)?))
}

/// Ids are unsigned integers; anything else names no record.
fn path_id<T>(path: Result<Path<T>, PathRejection>, not_found: &str) -> Result<T, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::NotFound(not_found.to_string()))
}

fn multipart_error(e: MultipartError) -> AppError {
    error!("Error parsing multipart: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Multipart(format!("Failed to parse multipart form: {}", e.body_text()))
    }
}
