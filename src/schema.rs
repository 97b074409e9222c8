//! Bootstrap DDL for the hosted Postgres project and the deployment guide
//! served from the admin panel.

use serde::Serialize;
use sqlx::{Executor, PgPool};

/// Environment variable holding the Postgres URL of the hosted project.
pub const URL_VARIABLE: &str = "SUPABASE_URL";
/// Environment variable holding the public (anon) API key.
pub const KEY_VARIABLE: &str = "SUPABASE_KEY";

pub const BOOTSTRAP_SQL: &str = r#"
-- 1. USERS TABLE
create table if not exists users (
  "id" text primary key,
  "username" text,
  "fullName" text,
  "role" text,
  "password" text,
  "isActive" boolean default true,
  "seatIndex" int2
);

-- 2. SUBJECTS TABLE
create table if not exists subjects (
  "id" text primary key,
  "name" text,
  "code" text,
  "teacher" text
);

-- 3. ANNOUNCEMENTS TABLE
create table if not exists announcements (
  "id" text primary key,
  "title" text,
  "content" text,
  "date" text,
  "authorId" text,
  "authorName" text,
  "type" text
);

-- 4. TASKS TABLE
create table if not exists tasks (
  "id" text primary key,
  "title" text,
  "description" text,
  "subject" text,
  "deadline" text,
  "isCompleted" boolean default false,
  "createdBy" text
);

-- 5. SCHEDULE TABLE
create table if not exists schedule (
  "id" text primary key,
  "day" text,
  "time" text,
  "subject" text,
  "room" text
);

-- 6. VIDEOS TABLE
create table if not exists videos (
  "id" text primary key,
  "title" text,
  "url" text,
  "subject" text,
  "week" int2,
  "uploadedBy" text
);

-- 7. MATERIALS TABLE
create table if not exists materials (
  "id" text primary key,
  "title" text,
  "type" text,
  "url" text,
  "description" text,
  "subject" text,
  "uploadedBy" text
);

-- 8. TUTOR EVENTS TABLE
create table if not exists tutor_events (
  "id" text primary key,
  "title" text,
  "description" text,
  "date" text,
  "tutorId" text,
  "tutorName" text,
  "maxParticipants" int2,
  "participants" jsonb default '[]',
  "waitingList" jsonb default '[]'
);

-- MIGRATION: Ensure waitingList exists if table was created previously
alter table tutor_events add column if not exists "waitingList" jsonb default '[]';

-- 9. ACTIVITY LOGS
create table if not exists activity_logs (
  "id" text primary key,
  "userId" text,
  "action" text,
  "timestamp" text
);
"#;

/// Runs the whole script in one round trip. The script carries no bind
/// parameters, so sqlx sends it over the simple-query protocol, which accepts
/// several statements at once.
pub async fn bootstrap(pg: &PgPool) -> Result<(), sqlx::Error> {
    pg.execute(BOOTSTRAP_SQL).await?;
    log::info!("Bootstrap schema applied ({} tables)", table_names().len());
    Ok(())
}

/// Names of the tables the script creates, in declaration order.
pub fn table_names() -> Vec<&'static str> {
    BOOTSTRAP_SQL
        .lines()
        .filter_map(|line| line.trim().strip_prefix("create table if not exists "))
        .filter_map(|rest| rest.split_whitespace().next())
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentGuide {
    pub sql: &'static str,
    pub tables: Vec<&'static str>,
    pub environment: [&'static str; 2],
}

impl DeploymentGuide {
    pub fn new() -> Self {
        Self {
            sql: BOOTSTRAP_SQL,
            tables: table_names(),
            environment: [URL_VARIABLE, KEY_VARIABLE],
        }
    }
}

impl Default for DeploymentGuide {
    fn default() -> Self {
        Self::new()
    }
}
