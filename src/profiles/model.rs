use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::moderation::Status;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub age: Option<i64>,
    pub profession: String,
    pub experience: Option<String>,
    pub skills: Option<String>,
    pub education: Option<String>,
    pub work_experience: Option<String>,
    pub achievements: Option<String>,
    pub profile_photo: Option<String>,
    pub slug: String,
    pub status: Status,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Profile {
    pub fn is_public(&self) -> bool {
        self.status.is_public()
    }

    /// Comma separated, trimmed, blanks dropped.
    pub fn skill_list(&self) -> Vec<&str> {
        split_list(self.skills.as_deref(), ',')
    }

    /// One achievement per line.
    pub fn achievement_list(&self) -> Vec<&str> {
        split_list(self.achievements.as_deref(), '\n')
    }
}

fn split_list(text: Option<&str>, separator: char) -> Vec<&str> {
    text.unwrap_or_default()
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// A validated public submission. Status and slug are assigned on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub age: Option<i64>,
    pub profession: String,
    pub experience: Option<String>,
    pub skills: Option<String>,
    pub education: Option<String>,
    pub work_experience: Option<String>,
    pub achievements: Option<String>,
    pub profile_photo: Option<String>,
}

/// A validated partial update.
///
/// Outer `None` leaves a column alone; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub age: Option<Option<i64>>,
    pub profession: Option<String>,
    pub experience: Option<Option<String>>,
    pub skills: Option<Option<String>>,
    pub education: Option<Option<String>>,
    pub work_experience: Option<Option<String>>,
    pub achievements: Option<Option<String>>,
    pub profile_photo: Option<Option<String>>,
    pub status: Option<Status>,
}

impl ProfilePatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && !self.touches_fields()
    }

    /// True when anything other than the status is being written.
    pub fn touches_fields(&self) -> bool {
        let Self {
            name,
            email,
            phone,
            address,
            age,
            profession,
            experience,
            skills,
            education,
            work_experience,
            achievements,
            profile_photo,
            status: _,
        } = self;

        name.is_some()
            || email.is_some()
            || phone.is_some()
            || address.is_some()
            || age.is_some()
            || profession.is_some()
            || experience.is_some()
            || skills.is_some()
            || education.is_some()
            || work_experience.is_some()
            || achievements.is_some()
            || profile_photo.is_some()
    }
}
