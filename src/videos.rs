//! Video materials gallery, filterable by subject.

use axum::Extension;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::err::{JsonBody, PathParam, QueryParams};
use crate::models::{Role, Subject, Video};
use crate::{breaks, proceeds, AppState, Error, Payload};

/// Roles allowed to add and delete videos.
pub const VIDEO_MANAGERS: [Role; 3] = [Role::ItLogistik, Role::Kurikulum, Role::Admin];

/// Subject filter value that matches every video.
pub const ALL_SUBJECTS: &str = "ALL";

pub fn can_manage_videos(role: Role) -> bool {
    VIDEO_MANAGERS.contains(&role)
}

/// Rewrites YouTube watch and short links into their embeddable form.
/// Anything else comes back untouched.
pub fn normalize_video_url(url: &str) -> String {
    if url.contains("watch?v=") {
        url.replacen("watch?v=", "embed/", 1)
    } else if url.contains("youtu.be/") {
        url.replacen("youtu.be/", "www.youtube.com/embed/", 1)
    } else {
        url.to_string()
    }
}

pub fn filter_by_subject(videos: Vec<Video>, subject: &str) -> Vec<Video> {
    if subject == ALL_SUBJECTS {
        return videos;
    }
    videos.into_iter().filter(|v| v.subject == subject).collect()
}

pub async fn list_subjects(
    _current: CurrentUser,
    Extension(state): Extension<AppState>,
) -> Payload<SubjectList> {
    proceeds(SubjectList {
        subjects: state.store.subjects().await?,
    })
}

pub async fn list_videos(
    current: CurrentUser,
    QueryParams(filter): QueryParams<VideoFilter>,
    Extension(state): Extension<AppState>,
) -> Payload<VideoList> {
    let subject = filter.subject.unwrap_or_else(|| ALL_SUBJECTS.to_string());
    let videos = filter_by_subject(state.store.videos().await?, &subject);

    proceeds(VideoList {
        subject,
        can_manage: can_manage_videos(current.user.role),
        videos,
    })
}

pub async fn add_video(
    current: CurrentUser,
    Extension(state): Extension<AppState>,
    JsonBody(body): JsonBody<NewVideo>,
) -> Payload<Video> {
    if let Err(err) = current.require(&VIDEO_MANAGERS, "add videos") {
        return breaks(err);
    }
    if let Err(err) = body.validate() {
        return breaks(err);
    }

    let video = Video {
        id: Uuid::new_v4().to_string(),
        title: body.title,
        url: normalize_video_url(&body.url),
        subject: body.subject,
        week: body.week,
        uploaded_by: current.user.role.to_string(),
    };
    state.store.insert_video(&video).await?;
    state
        .store
        .record(
            &current.user.id,
            format!("{} added video \"{}\"", current.user.full_name, video.title),
        )
        .await?;
    log::info!("`{}` added video `{}`", current.user.username, video.id);

    proceeds(video)
}

pub async fn delete_video(
    current: CurrentUser,
    PathParam(id): PathParam<String>,
    Extension(state): Extension<AppState>,
) -> Payload<VideoDeleted> {
    if let Err(err) = current.require(&VIDEO_MANAGERS, "delete videos") {
        return breaks(err);
    }

    let deleted = state.store.delete_video(&id).await?;
    if !deleted {
        return breaks(Error::NotFound {
            message: format!("Video `{}` does not exist!", id),
        });
    }
    state
        .store
        .record(
            &current.user.id,
            format!("{} deleted video {}", current.user.full_name, id),
        )
        .await?;
    log::info!("`{}` deleted video `{}`", current.user.username, id);

    proceeds(VideoDeleted {
        video_id: id,
        deleted,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoFilter {
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVideo {
    pub title: String,
    pub url: String,
    pub subject: String,
    pub week: i16,
}

impl NewVideo {
    fn validate(&self) -> Result<(), Error> {
        for (field, value) in [
            ("title", &self.title),
            ("url", &self.url),
            ("subject", &self.subject),
        ] {
            if value.trim().is_empty() {
                return Err(Error::invalid_payload(format!(
                    "`{}` parameter was empty",
                    field
                )));
            }
        }
        if self.week < 1 {
            return Err(Error::invalid_payload("`week` must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectList {
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoList {
    pub subject: String,
    pub can_manage: bool,
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDeleted {
    pub video_id: String,
    pub deleted: bool,
}
