//! Case follow-up mutations.

use reqwest::Method;
use reqwest::multipart::Form;
use validator::Validate;

use vigia_common::{AppError, AppResult};
use vigia_store::{CaseStatus, CaseUpdateRecord, UpdateKind};

use crate::cases::ImageAttachment;
use crate::client::ApiClient;

/// Fields for `POST cases/updates`.
#[derive(Debug, Clone, Validate)]
pub struct CreateCaseUpdateInput {
    /// Case the follow-up belongs to.
    pub case_id: String,

    /// Free-text body.
    #[validate(length(min = 5))]
    pub message: String,

    /// What the entry represents.
    pub kind: UpdateKind,
    /// Target state; required for status changes, rejected otherwise.
    pub new_status: Option<CaseStatus>,

    /// Attached photos.
    #[validate(length(max = 5))]
    pub images: Vec<ImageAttachment>,
}

impl CreateCaseUpdateInput {
    /// Run every pre-dispatch check, including the kind/status coupling
    /// the derive can't express.
    pub fn ensure_valid(&self) -> AppResult<()> {
        self.validate()?;
        match (self.kind, self.new_status) {
            (UpdateKind::StatusChange, None) => Err(AppError::Validation(
                "a status_change update requires new_status".to_string(),
            )),
            (UpdateKind::StatusChange, Some(_)) | (_, None) => Ok(()),
            (_, Some(_)) => Err(AppError::Validation(
                "new_status is only allowed on status_change updates".to_string(),
            )),
        }
    }

    fn form(&self) -> AppResult<Form> {
        let mut form = Form::new()
            .text("report_id", self.case_id.clone())
            .text("message", self.message.clone())
            .text("update_type", self.kind.as_str());
        if let Some(status) = self.new_status {
            form = form.text("new_status", status.as_str());
        }
        for image in &self.images {
            form = form.part("images", image.to_part()?);
        }
        Ok(form)
    }
}

impl ApiClient {
    /// Post a follow-up on a case.
    pub async fn create_case_update(
        &self,
        input: &CreateCaseUpdateInput,
    ) -> AppResult<CaseUpdateRecord> {
        input.ensure_valid()?;
        let request = self
            .request(Method::POST, "cases/updates")?
            .multipart(input.form()?);
        self.request_json(request).await
    }

    /// Delete a follow-up entry.
    pub async fn delete_case_update(&self, update_id: &str) -> AppResult<()> {
        let request = self.request(Method::DELETE, &format!("cases/updates/{update_id}"))?;
        self.request_empty(request).await
    }
}
