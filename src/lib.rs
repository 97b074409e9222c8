pub mod admin;
pub mod auth;
pub mod config;
pub mod err;
pub mod models;
pub mod schema;
pub mod store;
pub mod videos;

use std::sync::Arc;

use axum::handler::Handler;
use axum::routing::{delete, get, post, put};
use axum::{middleware, Extension, Router};
use serde::Serialize;
use tower::ServiceBuilder;

use crate::auth::Sessions;
use crate::config::Settings;
use crate::err::{Error, Fine, Maybe, Nothing};
use crate::store::Store;

pub type Payload<T> = Result<Maybe<T>, Error>;

pub fn proceeds<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok(Fine(value))
}

pub fn breaks<V>(err: Error) -> Payload<V>
where
    V: Serialize,
{
    Ok(Nothing(err))
}

/// Shared by every handler through an `Extension` layer.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<Sessions>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, settings: Settings) -> Self {
        Self {
            store,
            sessions: Arc::new(Sessions::default()),
            settings: Arc::new(settings),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/google", post(auth::login_with_google))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:id/role", put(admin::update_user_role))
        .route("/admin/users/:id/status", put(admin::update_user_status))
        .route("/admin/logs", get(admin::activity_log))
        .route("/admin/deployment", get(admin::deployment))
        .route("/subjects", get(videos::list_subjects))
        .route("/videos", get(videos::list_videos).post(videos::add_video))
        .route("/videos/:id", delete(videos::delete_video))
        .fallback(err::handler404.into_service())
        .layer(
            ServiceBuilder::new()
                .layer(Extension(state))
                .layer(middleware::from_fn(auth::require_api_key)),
        )
}
