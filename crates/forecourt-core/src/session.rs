//! # Session
//!
//! Who is signed in and the token their requests carry.
//!
//! A session exists from a successful `POST /login` until logout. Code that
//! needs the operator's identity takes a `&Session` rather than reading
//! ambient state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Body of `POST /login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Body returned by `POST /login`. Only `username` is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub username: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub employee_id: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

/// The signed-in user as shown in the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionUser {
    pub username: String,
    pub employee_id: Option<i64>,
    pub role: Option<String>,
}

/// An authenticated session.
#[derive(Clone, PartialEq)]
pub struct Session {
    pub user: SessionUser,
    token: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn from_login(response: LoginResponse, now: DateTime<Utc>) -> Self {
        Session {
            user: SessionUser {
                username: response.username,
                employee_id: response.employee_id,
                role: response.role,
            },
            token: response.token.filter(|t| !t.trim().is_empty()),
            started_at: now,
        }
    }

    /// Token for the `Authorization: Bearer` header, if the backend issued one.
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Greeting name, `"User"` when the backend sent a blank username.
    pub fn display_name(&self) -> &str {
        match self.user.username.trim() {
            "" => "User",
            name => name,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("started_at", &self.started_at)
            .finish()
    }
}
