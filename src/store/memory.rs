use axum::async_trait;
use tokio::sync::RwLock;

use crate::err::Error;
use crate::models::{ActivityLogEntry, Role, Subject, User, Video};
use crate::store::Store;

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    subjects: RwLock<Vec<Subject>>,
    videos: RwLock<Vec<Video>>,
    activity: RwLock<Vec<ActivityLogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn users(&self) -> Result<Vec<User>, Error> {
        Ok(self.users.read().await.clone())
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, Error> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), Error> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.id == user.id) {
            return Err(Error::InternalError {
                kind: "DatabaseError",
                message: format!("duplicate user id `{}`", user.id),
            });
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update_user_role(&self, id: &str, role: Role) -> Result<bool, Error> {
        let mut users = self.users.write().await;
        Ok(match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.role = role;
                true
            }
            None => false,
        })
    }

    async fn update_user_status(&self, id: &str, is_active: bool) -> Result<bool, Error> {
        let mut users = self.users.write().await;
        Ok(match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.is_active = is_active;
                true
            }
            None => false,
        })
    }

    async fn subjects(&self) -> Result<Vec<Subject>, Error> {
        Ok(self.subjects.read().await.clone())
    }

    async fn insert_subject(&self, subject: &Subject) -> Result<(), Error> {
        self.subjects.write().await.push(subject.clone());
        Ok(())
    }

    async fn videos(&self) -> Result<Vec<Video>, Error> {
        Ok(self.videos.read().await.clone())
    }

    async fn insert_video(&self, video: &Video) -> Result<(), Error> {
        self.videos.write().await.push(video.clone());
        Ok(())
    }

    async fn delete_video(&self, id: &str) -> Result<bool, Error> {
        let mut videos = self.videos.write().await;
        let before = videos.len();
        videos.retain(|v| v.id != id);
        Ok(videos.len() < before)
    }

    async fn activity_log(&self) -> Result<Vec<ActivityLogEntry>, Error> {
        Ok(self.activity.read().await.iter().rev().cloned().collect())
    }

    async fn append_activity(&self, entry: &ActivityLogEntry) -> Result<(), Error> {
        self.activity.write().await.push(entry.clone());
        Ok(())
    }
}
