use coursemart::{Event, EventForm, Record};
use reqwest::multipart::{Form, Part};

use crate::{confirmation, decode, ClientError, CoursemartClient, Credentials};

/// An image file to attach to an event form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-side name; the service only keeps its extension.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// An upload of `bytes` named `file_name`.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Multipart body for an event form. Fields left out of `form` are not sent,
/// so an update only touches what the caller set.
fn multipart(form: &EventForm, image: Option<ImageUpload>) -> Form {
    let mut body = form
        .text_fields()
        .into_iter()
        .fold(Form::new(), |body, (name, value)| {
            body.text(name, value.to_string())
        });
    if let Some(image) = image {
        body = body.part("image", Part::bytes(image.bytes).file_name(image.file_name));
    }
    body
}

impl CoursemartClient {
    /// Every event, in the order the service stored them.
    pub async fn list_events(&self) -> Result<Vec<Record<Event>>, ClientError> {
        let response = self.http.get(self.url(&["api", "events"])?).send().await?;
        decode(response, "Failed to fetch events").await
    }

    /// One event by id.
    pub async fn get_event(&self, id: &str) -> Result<Record<Event>, ClientError> {
        let response = self
            .http
            .get(self.url(&["api", "events", id])?)
            .send()
            .await?;
        decode(response, "Failed to fetch event").await
    }

    /// Create an event from a complete form, optionally with an image.
    pub async fn create_event(
        &self,
        form: &EventForm,
        image: Option<ImageUpload>,
        credentials: &Credentials,
    ) -> Result<Record<Event>, ClientError> {
        let request = self
            .http
            .post(self.url(&["api", "events"])?)
            .multipart(multipart(form, image));
        let response = Self::authorized(request, credentials).send().await?;
        decode(response, "Failed to create event").await
    }

    /// Send changed fields; the stored image is kept unless `image` is set.
    pub async fn update_event(
        &self,
        id: &str,
        form: &EventForm,
        image: Option<ImageUpload>,
        credentials: &Credentials,
    ) -> Result<Record<Event>, ClientError> {
        let request = self
            .http
            .put(self.url(&["api", "events", id])?)
            .multipart(multipart(form, image));
        let response = Self::authorized(request, credentials).send().await?;
        decode(response, "Failed to update event").await
    }

    /// Returns the server's confirmation message.
    pub async fn delete_event(
        &self,
        id: &str,
        credentials: &Credentials,
    ) -> Result<String, ClientError> {
        let request = self.http.delete(self.url(&["api", "events", id])?);
        let response = Self::authorized(request, credentials).send().await?;
        confirmation(response, "Failed to delete event").await
    }
}
