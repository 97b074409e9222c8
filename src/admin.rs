use axum::Extension;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::err::{JsonBody, PathParam, QueryParams};
use crate::models::{ActivityLogEntry, Role, User};
use crate::schema::DeploymentGuide;
use crate::{breaks, proceeds, AppState, Error, Payload};

pub const ADMIN_ONLY: [Role; 1] = [Role::Admin];

/// Case-insensitive substring match on username or full name.
pub fn search_users(users: Vec<User>, query: &str) -> Vec<User> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return users;
    }
    users
        .into_iter()
        .filter(|u| {
            u.username.to_lowercase().contains(&needle)
                || u.full_name.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Admin accounts cannot be suspended or have their role changed.
pub fn is_protected(target: &User) -> bool {
    target.role == Role::Admin
}

/// Loads the target user and refuses protected accounts.
async fn modifiable_user(state: &AppState, id: &str) -> Result<User, Error> {
    let target = state
        .store
        .user_by_id(id)
        .await?
        .ok_or_else(|| Error::UserDoesNotExist {
            message: format!("User with id `{}` does not exist!", id),
        })?;
    if is_protected(&target) {
        log::warn!("Refused to modify admin account `{}`", target.username);
        return Err(Error::forbidden("Admin accounts cannot be modified"));
    }
    Ok(target)
}

pub async fn list_users(
    current: CurrentUser,
    QueryParams(search): QueryParams<UserSearch>,
    Extension(state): Extension<AppState>,
) -> Payload<UserList> {
    if let Err(err) = current.require(&ADMIN_ONLY, "manage users") {
        return breaks(err);
    }
    let users = search_users(
        state.store.users().await?,
        search.search.as_deref().unwrap_or_default(),
    );
    proceeds(UserList {
        roles: Role::ALL.to_vec(),
        users,
    })
}

pub async fn update_user_role(
    current: CurrentUser,
    PathParam(id): PathParam<String>,
    Extension(state): Extension<AppState>,
    JsonBody(body): JsonBody<RoleUpdate>,
) -> Payload<UserUpdated> {
    if let Err(err) = current.require(&ADMIN_ONLY, "change roles") {
        return breaks(err);
    }
    let target = match modifiable_user(&state, &id).await {
        Ok(target) => target,
        Err(err) => return breaks(err),
    };

    state.store.update_user_role(&target.id, body.role).await?;
    state
        .store
        .record(
            &current.user.id,
            format!("Changed role of {} to {}", target.username, body.role),
        )
        .await?;
    log::info!(
        "`{}` changed role of `{}` from {} to {}",
        current.user.username,
        target.username,
        target.role,
        body.role
    );

    proceeds(UserUpdated {
        user: User {
            role: body.role,
            ..target
        },
    })
}

pub async fn update_user_status(
    current: CurrentUser,
    PathParam(id): PathParam<String>,
    Extension(state): Extension<AppState>,
    JsonBody(body): JsonBody<StatusUpdate>,
) -> Payload<UserUpdated> {
    if let Err(err) = current.require(&ADMIN_ONLY, "change account status") {
        return breaks(err);
    }
    let target = match modifiable_user(&state, &id).await {
        Ok(target) => target,
        Err(err) => return breaks(err),
    };

    state
        .store
        .update_user_status(&target.id, body.is_active)
        .await?;
    if !body.is_active {
        state.sessions.drop_user_sessions(&target.id).await;
    }
    let verb = if body.is_active { "Activated" } else { "Suspended" };
    state
        .store
        .record(&current.user.id, format!("{} {}", verb, target.username))
        .await?;
    log::info!("`{}` {} `{}`", current.user.username, verb.to_lowercase(), target.username);

    proceeds(UserUpdated {
        user: User {
            is_active: body.is_active,
            ..target
        },
    })
}

pub async fn activity_log(
    current: CurrentUser,
    Extension(state): Extension<AppState>,
) -> Payload<ActivityLog> {
    if let Err(err) = current.require(&ADMIN_ONLY, "read activity logs") {
        return breaks(err);
    }
    proceeds(ActivityLog {
        logs: state.store.activity_log().await?,
    })
}

pub async fn deployment(current: CurrentUser) -> Payload<DeploymentGuide> {
    if let Err(err) = current.require(&ADMIN_ONLY, "read the deployment guide") {
        return breaks(err);
    }
    proceeds(DeploymentGuide::new())
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserSearch {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserList {
    pub roles: Vec<Role>,
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserUpdated {
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityLog {
    pub logs: Vec<ActivityLogEntry>,
}
