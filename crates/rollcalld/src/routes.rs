use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use rollcall_core::{
    attendance::{self, AttendanceStatus, ConfidenceEntry},
    KnownFace,
};
use rollcall_store::NewStudent;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    extract::{ImagePayload, JsonBody, JsonOrForm},
    state::AppState,
    uploads,
};

type AppResult = Result<Json<Value>, AppError>;

struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

/// Register a student from a multipart form with `name` and `image` fields.
pub async fn register_student(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult {
    let mut multipart = multipart.map_err(|_| AppError::validation("Name and image required"))?;

    let mut name: Option<String> = None;
    let mut upload: Option<Upload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(e.body_text()))?
    {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(e.body_text()))?;
                name = Some(text.trim().to_string());
            }
            Some("image") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(e.body_text()))?;
                upload = Some(Upload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let (name, upload) = match (name.filter(|n| !n.is_empty()), upload) {
        (Some(name), Some(upload)) if !upload.bytes.is_empty() => (name, upload),
        _ => return Err(AppError::validation("Name and image required")),
    };
    uploads::check_image(&upload.bytes)?;

    let image_path = uploads::save(&state.paths.image_dir, &name, &upload.file_name, &upload.bytes).await?;

    let encoding = match state.engine.compute_encoding(&image_path) {
        Ok(enc) => enc,
        Err(e) => {
            uploads::discard(&image_path).await;
            return Err(e.into());
        }
    };

    let created = state
        .db
        .create_student(NewStudent {
            name: name.clone(),
            image_path: Some(image_path.clone()),
            encoding: Some(encoding.clone()),
        })
        .await;
    let student_id = match created {
        Ok(id) => id,
        Err(e) => {
            uploads::discard(&image_path).await;
            return Err(e.into());
        }
    };

    state
        .register_face(KnownFace {
            student_id,
            name: name.clone(),
            encoding,
        })
        .await;

    tracing::info!(student_id, name = %name, "student registered");
    Ok(Json(json!({
        "success": true,
        "message": format!("Student {name} registered successfully"),
        "student_id": student_id,
    })))
}

#[derive(Deserialize)]
pub struct LoginForm {
    username: Option<String>,
    password: Option<String>,
}

pub async fn teacher_login(
    State(state): State<Arc<AppState>>,
    JsonOrForm(form): JsonOrForm<LoginForm>,
) -> AppResult {
    let (Some(username), Some(password)) = (form.username, form.password) else {
        return Err(AppError::validation("Username and password required"));
    };

    match state.db.find_teacher(&username, &password).await? {
        Some(teacher) => {
            tracing::info!(teacher_id = teacher.id, username = %teacher.username, "teacher logged in");
            Ok(Json(json!({
                "success": true,
                "teacher_id": teacher.id,
                "username": teacher.username,
            })))
        }
        None => {
            tracing::warn!(username = %username, "rejected login");
            Err(AppError::Authentication("Invalid credentials".into()))
        }
    }
}

#[derive(Deserialize)]
pub struct BatchMark {
    #[serde(default)]
    recognized: Vec<ConfidenceEntry>,
}

/// Mark attendance from externally recognized `{id, confidence}` pairs.
pub async fn mark_attendance(
    State(state): State<Arc<AppState>>,
    JsonBody(batch): JsonBody<BatchMark>,
) -> AppResult {
    let split = attendance::partition(&batch.recognized, state.config.present_threshold);
    let updated = state.db.mark_present(split.present.clone()).await?;

    tracing::info!(
        present = split.present.len(),
        unidentifiable = split.unidentifiable.len(),
        updated,
        "batch attendance marked"
    );
    Ok(Json(json!({
        "success": true,
        "present_students": split.present,
        "unidentifiable_students": split.unidentifiable,
    })))
}

#[derive(Deserialize)]
pub struct ManualMark {
    student_id: Option<i64>,
    status: Option<String>,
}

pub async fn manual_mark(
    State(state): State<Arc<AppState>>,
    JsonOrForm(form): JsonOrForm<ManualMark>,
) -> AppResult {
    let status = form.status.as_deref().and_then(|s| s.parse::<AttendanceStatus>().ok());
    let (Some(student_id), Some(status)) = (form.student_id, status) else {
        return Err(AppError::validation("Invalid input"));
    };

    let found = state.db.set_present(student_id, status.is_present()).await?;
    if !found {
        tracing::warn!(student_id, "manual mark for unknown student");
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("Student {student_id} marked as {status}"),
    })))
}

pub async fn list_students(State(state): State<Arc<AppState>>) -> AppResult {
    let students = state.db.list_students().await?;
    Ok(Json(json!({ "success": true, "students": students })))
}

pub async fn recognize_faces(
    State(state): State<Arc<AppState>>,
    ImagePayload(image): ImagePayload,
) -> AppResult {
    let results = state.recognize(&image).await;
    Ok(Json(json!({
        "success": true,
        "faces_detected": results.len(),
        "results": results,
    })))
}

/// Recognize faces and mark every sufficiently confident match present.
pub async fn mark_attendance_from_faces(
    State(state): State<Arc<AppState>>,
    ImagePayload(image): ImagePayload,
) -> AppResult {
    let results = state.recognize(&image).await;
    let matches = attendance::qualifying_matches(&results, state.config.face_present_threshold);

    let ids: Vec<i64> = matches.iter().filter_map(|r| r.id).collect();
    let updated = state.db.mark_present(ids).await?;

    let marked: Vec<Value> = matches
        .iter()
        .map(|r| json!({ "id": r.id, "name": r.name, "confidence": r.confidence }))
        .collect();

    tracing::info!(faces = results.len(), marked = marked.len(), updated, "face attendance marked");
    Ok(Json(json!({
        "success": true,
        "faces_detected": results.len(),
        "results": results,
        "marked_present": marked,
    })))
}

pub async fn reload_faces(State(state): State<Arc<AppState>>) -> AppResult {
    let summary = state.reload_registry().await?;
    Ok(Json(json!({
        "success": true,
        "known_faces": summary.known_faces,
        "backfilled": summary.backfilled,
        "skipped": summary.skipped,
    })))
}

pub async fn face_status(State(state): State<Arc<AppState>>) -> AppResult {
    let faces: Vec<Value> = state
        .known_faces()
        .await
        .into_iter()
        .map(|f| json!({ "id": f.student_id, "name": f.name }))
        .collect();
    Ok(Json(json!({
        "success": true,
        "known_faces": faces.len(),
        "faces": faces,
    })))
}

pub async fn reset_attendance(State(state): State<Arc<AppState>>) -> AppResult {
    let reset = state.db.set_all_present(false).await?;
    tracing::info!(students = reset, "attendance reset");
    Ok(Json(json!({
        "success": true,
        "message": "Attendance reset",
        "students_reset": reset,
    })))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "success": true, "version": env!("CARGO_PKG_VERSION") }))
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Not found" })),
    )
}

pub async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "success": false, "error": "Method not allowed" })),
    )
}
