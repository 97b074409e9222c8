use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::err::Error;

/// Permission level of a user. Stored as upper-case text in the `role` column.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Kurikulum,
    ItLogistik,
    Student,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Kurikulum, Role::ItLogistik, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Kurikulum => "KURIKULUM",
            Role::ItLogistik => "IT_LOGISTIK",
            Role::Student => "STUDENT",
        }
    }

    /// Lenient conversion for values read back from the database.
    pub fn from_stored(raw: &str) -> Role {
        raw.parse().unwrap_or(Role::Student)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Student
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| Error::invalid_payload(format!("Unknown role `{}`", s)))
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password: String,
    pub is_active: bool,
    pub seat_index: Option<i16>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
    pub teacher: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub url: String,
    pub subject: String,
    pub week: i16,
    #[sqlx(rename = "uploadedBy")]
    pub uploaded_by: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: String,
    pub user_id: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityLogEntry {
    pub fn new<S: Into<String>>(user_id: &str, action: S) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            action: action.into(),
            timestamp: Utc::now(),
        }
    }

    /// ISO-8601 form written to the text `timestamp` column.
    pub fn stored_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Raw `users` row. Columns are nullable in the bootstrap schema, so the
/// queries coalesce them before they land here.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    #[sqlx(rename = "fullName")]
    pub full_name: String,
    pub role: String,
    pub password: String,
    #[sqlx(rename = "isActive")]
    pub is_active: bool,
    #[sqlx(rename = "seatIndex")]
    pub seat_index: Option<i16>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            role: Role::from_stored(&row.role),
            password: row.password,
            is_active: row.is_active,
            seat_index: row.seat_index,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityLogRow {
    pub id: String,
    #[sqlx(rename = "userId")]
    pub user_id: String,
    pub action: String,
    pub timestamp: String,
}

impl TryFrom<ActivityLogRow> for ActivityLogEntry {
    type Error = Error;

    fn try_from(row: ActivityLogRow) -> Result<Self, Self::Error> {
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)?.with_timezone(&Utc);
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            action: row.action,
            timestamp,
        })
    }
}
