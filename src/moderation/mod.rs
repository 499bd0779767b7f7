//! Review workflow for submitted profiles.
//!
//! Every profile starts out `Pending`. An admin moves it to `Verified` or
//! `Rejected` and both of those are final: a reviewed profile cannot go back
//! into the queue or flip to the other outcome. Each applied change lands in
//! the activity log in the same transaction as the status write.

pub mod activity;
mod api;

use std::{fmt, str::FromStr};

use axum::{Router, routing::get};
use serde::{Deserialize, Serialize};

use crate::{AppState, appresult::FieldError};

pub use activity::{Action, ActivityEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
pub enum Status {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::Verified, Status::Rejected];

    pub fn as_str(&self) -> &'static str {
        use Status::*;
        match self {
            Pending => "Pending",
            Verified => "Verified",
            Rejected => "Rejected",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Status::Verified)
    }

    /// Checks a requested status change.
    ///
    /// `Ok(None)` means nothing changes (same status), `Ok(Some(action))` is
    /// the log entry the change produces.
    pub fn transition(self, next: Status) -> Result<Option<Action>, FieldError> {
        use Status::*;
        match (self, next) {
            (from, to) if from == to => Ok(None),
            (Pending, Verified) => Ok(Some(Action::Verified)),
            (Pending, Rejected) => Ok(Some(Action::Rejected)),
            (from, to) => Err(FieldError::new(
                "status",
                format!("cannot change a {from} profile to {to}"),
            )),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FieldError::new("status", "must be one of Pending, Verified, Rejected"))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activity", get(api::activity))
        .route("/analytics", get(api::analytics))
}
