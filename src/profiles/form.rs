//! Turns a submitted form (multipart, urlencoded or JSON) into a validated
//! [`NewProfile`] or [`ProfilePatch`].

use std::collections::HashMap;

use axum::{
    Form, Json,
    extract::{FromRef, FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::{Map, Value};
use validator::Validate;

use crate::{
    AppError, AppResult,
    appresult::{FieldError, field_errors},
    moderation::Status,
    uploads::{PHOTO_FIELD, PhotoStore, PhotoUpload},
};

use super::{NewProfile, ProfilePatch};

/// Rules shared by submissions and edits. `None` is a field that was not
/// sent, which only an edit allows.
#[derive(Debug, Default, Validate)]
struct FieldRules {
    #[validate(length(min = 1, message = "is required"))]
    name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    email: Option<String>,
    #[validate(length(min = 1, message = "is required"))]
    profession: Option<String>,
    #[validate(range(min = 18, max = 100, message = "must be between 18 and 100"))]
    age: Option<i64>,
}

impl FieldRules {
    fn check(&self, mut errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
        if let Err(failed) = self.validate() {
            errors.extend(field_errors(&failed));
        }
        if errors.is_empty() {
            return Ok(());
        }
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        Err(errors)
    }
}

/// Text fields as submitted, keyed by their camelCase form names.
#[derive(Debug, Default, Clone)]
pub struct RawFields(HashMap<String, String>);

impl RawFields {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Scalars are stringified so JSON and form bodies validate the same
    /// way. `null` reads as an empty value, which clears optional fields.
    pub fn from_json(map: Map<String, Value>) -> AppResult<Self> {
        let mut fields = Self::default();
        for (key, value) in map {
            let value = match value {
                Value::Null => String::new(),
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(AppError::BadRequest(format!("{key} must be a plain value")));
                }
            };
            fields.insert(key, value);
        }
        Ok(fields)
    }

    fn take(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Validates a public submission. Status, slug and photo path coming in
    /// from the client are ignored.
    pub fn into_new_profile(mut self) -> Result<NewProfile, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = text(self.take("name"));
        let email = text(self.take("email"));
        let profession = text(self.take("profession"));
        let age = parse_age(self.take("age")).unwrap_or_else(|e| {
            errors.push(e);
            None
        });

        FieldRules {
            name: Some(name.clone()),
            email: Some(email.clone()),
            profession: Some(profession.clone()),
            age,
        }
        .check(errors)?;

        let profile = NewProfile {
            name,
            email,
            phone: optional(self.take("phone")),
            address: optional(self.take("address")),
            age,
            profession,
            experience: optional(self.take("experience")),
            skills: optional(self.take("skills")),
            education: optional(self.take("education")),
            work_experience: optional(self.take("workExperience")),
            achievements: optional(self.take("achievements")),
            profile_photo: None,
        };

        Ok(profile)
    }

    /// Validates an edit. Absent keys are left alone, present-but-empty
    /// optional keys are cleared, required keys may not be blanked.
    pub fn into_patch(mut self) -> Result<ProfilePatch, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.take("name").map(|v| text(Some(v)));
        let email = self.take("email").map(|v| text(Some(v)));
        let profession = self.take("profession").map(|v| text(Some(v)));
        let age = match self.take("age") {
            None => None,
            Some(v) => match parse_age(Some(v)) {
                Ok(age) => Some(age),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
        };
        let status = match self.take("status").filter(|v| !v.trim().is_empty()) {
            None => None,
            Some(v) => match v.parse::<Status>() {
                Ok(status) => Some(status),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
        };
        // only clearing is accepted here; a new photo comes in as a file part
        let profile_photo = self
            .take(PHOTO_FIELD)
            .filter(|v| v.trim().is_empty())
            .map(|_| None);

        let patch = ProfilePatch {
            name,
            email,
            phone: self.take("phone").map(|v| optional(Some(v))),
            address: self.take("address").map(|v| optional(Some(v))),
            age,
            profession,
            experience: self.take("experience").map(|v| optional(Some(v))),
            skills: self.take("skills").map(|v| optional(Some(v))),
            education: self.take("education").map(|v| optional(Some(v))),
            work_experience: self.take("workExperience").map(|v| optional(Some(v))),
            achievements: self.take("achievements").map(|v| optional(Some(v))),
            profile_photo,
            status,
        };

        FieldRules {
            name: patch.name.clone(),
            email: patch.email.clone(),
            profession: patch.profession.clone(),
            age: patch.age.flatten(),
        }
        .check(errors)?;

        Ok(patch)
    }
}

fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_owned()).unwrap_or_default()
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Empty means "not given". The range is checked by [`FieldRules`].
fn parse_age(value: Option<String>) -> Result<Option<i64>, FieldError> {
    let Some(value) = optional(value) else {
        return Ok(None);
    };
    value
        .parse()
        .map(Some)
        .map_err(|_| FieldError::new("age", "must be a whole number"))
}

/// Body of a create or update request: text fields plus an optional photo.
#[derive(Debug, Default)]
pub struct ProfileSubmission {
    pub fields: RawFields,
    pub photo: Option<PhotoUpload>,
}

impl<S> FromRequest<S> for ProfileSubmission
where
    S: Send + Sync,
    PhotoStore: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let max_bytes = PhotoStore::from_ref(state).max_bytes();
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            read_multipart(multipart, max_bytes).await
        } else if content_type.starts_with("application/json") {
            let Json(map) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self {
                fields: RawFields::from_json(map)?,
                photo: None,
            })
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(map) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self {
                fields: RawFields(map),
                photo: None,
            })
        } else {
            Err(AppError::BadRequest(
                "expected a multipart/form-data, urlencoded or JSON body".to_owned(),
            ))
        }
    }
}

async fn read_multipart(mut multipart: Multipart, max_bytes: usize) -> AppResult<ProfileSubmission> {
    let mut submission = ProfileSubmission::default();

    while let Some(mut field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == PHOTO_FIELD && field.file_name().is_some() {
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().map(str::to_owned);
            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await? {
                if bytes.len() + chunk.len() > max_bytes {
                    return Err(AppError::Invalid(vec![FieldError::new(
                        PHOTO_FIELD,
                        format!("must be at most {} bytes", max_bytes),
                    )]));
                }
                bytes.extend_from_slice(&chunk);
            }
            // browsers send an empty part when no file was picked
            if !bytes.is_empty() {
                submission.photo = Some(PhotoUpload {
                    bytes,
                    file_name,
                    content_type,
                });
            }
        } else {
            let value = field.text().await?;
            submission.fields.insert(name, value);
        }
    }

    Ok(submission)
}
