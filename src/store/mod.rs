//! Process-wide state: the collections the pages read and the mutations
//! they trigger. `PgStore` talks to the hosted Postgres project,
//! `MemoryStore` keeps everything in process.

use axum::async_trait;

use crate::err::Error;
use crate::models::{ActivityLogEntry, Role, Subject, User, Video};

pub mod demo;
pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn users(&self) -> Result<Vec<User>, Error>;

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, Error>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, Error>;

    async fn insert_user(&self, user: &User) -> Result<(), Error>;

    /// Returns `false` when no user has the given id.
    async fn update_user_role(&self, id: &str, role: Role) -> Result<bool, Error>;

    /// Returns `false` when no user has the given id.
    async fn update_user_status(&self, id: &str, is_active: bool) -> Result<bool, Error>;

    async fn subjects(&self) -> Result<Vec<Subject>, Error>;

    async fn insert_subject(&self, subject: &Subject) -> Result<(), Error>;

    async fn videos(&self) -> Result<Vec<Video>, Error>;

    async fn insert_video(&self, video: &Video) -> Result<(), Error>;

    /// Returns `false` when nothing was deleted.
    async fn delete_video(&self, id: &str) -> Result<bool, Error>;

    /// Newest entry first.
    async fn activity_log(&self) -> Result<Vec<ActivityLogEntry>, Error>;

    async fn append_activity(&self, entry: &ActivityLogEntry) -> Result<(), Error>;

    async fn record(&self, user_id: &str, action: String) -> Result<(), Error> {
        self.append_activity(&ActivityLogEntry::new(user_id, action))
            .await
    }
}
