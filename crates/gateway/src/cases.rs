//! Case (report) mutations.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use validator::Validate;

use vigia_common::{AppError, AppResult};
use vigia_core::{Caller, ensure_can_delete_case};
use vigia_store::{CasePriority, CaseRecord, CaseStatus};

use crate::client::ApiClient;

/// An image attached to a multipart request. Serialization covers the
/// metadata only; the bytes travel as a multipart part.
#[derive(Debug, Clone, Serialize)]
pub struct ImageAttachment {
    /// File name reported to the backend.
    pub file_name: String,
    /// MIME type, e.g. `image/jpeg`.
    pub content_type: String,
    /// Raw file contents.
    #[serde(skip_serializing)]
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    pub(crate) fn to_part(&self) -> AppResult<Part> {
        Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)
            .map_err(|e| {
                AppError::Validation(format!(
                    "unsupported content type {}: {e}",
                    self.content_type
                ))
            })
    }
}

/// Fields for `POST reports/`.
#[derive(Debug, Clone, Validate)]
pub struct CreateCaseInput {
    /// What happened and where.
    #[validate(length(min = 10))]
    pub description: String,

    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Street address, when known.
    pub address: Option<String>,
    /// City / zone bucket.
    pub city: Option<String>,
    /// Whether to file without a reporter name.
    pub is_anonymous: bool,
    /// Urgency bucket.
    pub priority: CasePriority,

    /// Attached photos.
    #[validate(length(max = 5))]
    pub images: Vec<ImageAttachment>,
}

impl CreateCaseInput {
    /// Run every pre-dispatch check.
    pub fn ensure_valid(&self) -> AppResult<()> {
        self.validate()?;
        Ok(())
    }

    fn form(&self) -> AppResult<Form> {
        let mut form = Form::new()
            .text("description", self.description.clone())
            .text("lat", self.latitude.to_string())
            .text("lon", self.longitude.to_string())
            .text("is_anonymous", self.is_anonymous.to_string())
            .text("priority", self.priority.as_str());
        if let Some(address) = &self.address {
            form = form.text("address", address.clone());
        }
        if let Some(city) = &self.city {
            form = form.text("city", city.clone());
        }
        for image in &self.images {
            form = form.part("images", image.to_part()?);
        }
        Ok(form)
    }
}

impl ApiClient {
    /// File a new report.
    pub async fn create_case(&self, input: &CreateCaseInput) -> AppResult<CaseRecord> {
        input.ensure_valid()?;
        let request = self
            .request(Method::POST, "reports/")?
            .multipart(input.form()?);
        self.request_json(request).await
    }

    /// Hand a case to an assignee.
    pub async fn assign_case(&self, case_id: &str, assignee_id: &str) -> AppResult<()> {
        if assignee_id.trim().is_empty() {
            return Err(AppError::Validation(
                "assignee id must not be empty".to_string(),
            ));
        }
        let request = self
            .request(Method::PUT, &format!("reports/{case_id}/assign"))?
            .query(&[("encargado_id", assignee_id)]);
        self.request_empty(request).await
    }

    /// Move a case to a new lifecycle state. The closed enum keeps
    /// unknown states out of the query string.
    pub async fn update_case_status(
        &self,
        case_id: &str,
        new_status: CaseStatus,
    ) -> AppResult<()> {
        let request = self
            .request(Method::PATCH, &format!("reports/{case_id}/status"))?
            .query(&[("new_status", new_status.as_str())]);
        self.request_empty(request).await
    }

    /// Delete a report. The ownership pre-flight rejects the request
    /// before it reaches the wire.
    pub async fn delete_case(&self, caller: &Caller, case: &CaseRecord) -> AppResult<()> {
        ensure_can_delete_case(caller, case)?;
        let request = self.request(Method::DELETE, &format!("reports/{}", case.id))?;
        self.request_empty(request).await
    }
}
