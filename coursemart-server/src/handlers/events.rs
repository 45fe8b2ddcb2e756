//! Event mutations: multipart forms with an optional image, admin only.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use coursemart::{Event, EventForm, Record};
use serde_json::Value;
use tracing::debug;

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::handlers::resource::deleted;
use crate::state::AppState;
use crate::uploads::ImageStore;

const IMAGE_FIELD: &str = "image";

/// An image file received in a form, not yet written to disk.
struct PendingImage {
    file_name: String,
    bytes: Vec<u8>,
}

/// Read every part of an event form.
///
/// An `image` part only counts as an upload when it carries a file name;
/// otherwise it is the client echoing the stored path and is ignored.
async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(EventForm, Option<PendingImage>), ApiError> {
    let mut multipart =
        multipart.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let mut form = EventForm::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            return Err(ApiError::BadRequest("form field without a name".to_string()));
        };

        if name == IMAGE_FIELD {
            let file_name = field
                .file_name()
                .map(str::to_string)
                .filter(|file_name| !file_name.is_empty());
            match file_name {
                Some(file_name) => {
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    image = Some(PendingImage {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
                None => debug!("[events.form] image part without a file, keeping stored image"),
            }
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        if !form.set(&name, value) {
            return Err(ApiError::BadRequest(format!("Unknown field: {name}")));
        }
    }

    Ok((form, image))
}

fn multipart_error(error: MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(error.body_text())
    } else {
        ApiError::BadRequest(error.body_text())
    }
}

/// Save the pending image, if any, and point the form at it.
async fn attach_image(
    images: &ImageStore,
    form: &mut EventForm,
    image: Option<PendingImage>,
) -> Result<Option<String>, ApiError> {
    let Some(image) = image else {
        return Ok(None);
    };
    let path = images.save(&image.file_name, &image.bytes).await?;
    form.image = Some(path.clone());
    Ok(Some(path))
}

/// `POST /api/events`: save the optional image, then create the event.
///
/// The saved image is removed again when the form does not validate.
pub async fn create(
    _admin: AdminSession,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Record<Event>>), ApiError> {
    let (mut form, image) = read_form(multipart).await?;
    let saved = attach_image(state.images(), &mut form, image).await?;

    match state.contract::<Event>().create(form).await {
        Ok(record) => Ok((StatusCode::CREATED, Json(record))),
        Err(error) => {
            if let Some(path) = saved {
                state.images().remove(&path).await;
            }
            Err(error.into())
        }
    }
}

/// `PUT /api/events/{id}`: merge the submitted fields into the stored event.
///
/// A new image replaces the old file; without one the stored path is kept.
pub async fn update(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Record<Event>>, ApiError> {
    let contract = state.contract::<Event>();
    let (mut form, image) = read_form(multipart).await?;
    // fail fast on unknown ids before anything touches the disk
    let previous = contract.get(&id).await?;
    let saved = attach_image(state.images(), &mut form, image).await?;

    match contract.update(&id, form).await {
        Ok(record) => {
            if saved.is_some() {
                if let Some(old) = previous.fields.image.as_deref() {
                    if record.fields.image.as_deref() != Some(old) {
                        state.images().remove(old).await;
                    }
                }
            }
            Ok(Json(record))
        }
        Err(error) => {
            if let Some(path) = saved {
                state.images().remove(&path).await;
            }
            Err(error.into())
        }
    }
}

/// `DELETE /api/events/{id}`: remove the event and its image file.
pub async fn remove(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let removed = state.contract::<Event>().delete(&id).await?;
    if let Some(image) = removed.fields.image.as_deref() {
        state.images().remove(image).await;
    }
    Ok(deleted::<Event>())
}
