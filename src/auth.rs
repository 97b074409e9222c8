use std::collections::HashMap;
use std::ops::Add;

use axum::body::Body;
use axum::extract::{FromRequest, RequestParts};
use axum::headers::authorization::Bearer;
use axum::headers::Authorization;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum::{async_trait, Extension, TypedHeader};
use chrono::{DateTime, Duration, Utc};
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::err::JsonBody;
use crate::models::{Role, User};
use crate::{breaks, proceeds, AppState, Error, Payload};

pub const API_KEY_HEADER: &str = "apikey";
pub const LOGIN_FAILED: &str = "Invalid credentials or inactive account";

#[derive(Debug, Clone, Eq, Ord, PartialOrd, PartialEq)]
pub enum AuthResult {
    Success,
    SessionExpired,
    InvalidSession,
}

impl Serialize for AuthResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:?}", self))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    #[serde(skip)]
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// In-process session registry. Tokens are looked up on every
/// authenticated request; expired ones are dropped when they are seen and
/// whenever a new session is opened.
#[derive(Debug)]
pub struct Sessions {
    by_ssid: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl Default for Sessions {
    fn default() -> Self {
        Self::with_ttl(Duration::days(2))
    }
}

impl Sessions {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            by_ssid: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Hands out the user's live session if one exists, a fresh one otherwise.
    pub async fn open(&self, user_id: &str) -> Session {
        let mut sessions = self.by_ssid.write().await;
        let now = Utc::now();
        sessions.retain(|_, s| s.expires_at > now);
        if let Some(existing) = sessions.values().find(|s| s.user_id == user_id)
        {
            // already authenticated
            return existing.clone();
        }

        let ssid_bytes: [u8; 32] = thread_rng().gen();
        let mut hasher: Sha256 = Digest::new();
        hasher.update(ssid_bytes);
        let ssid = hex::encode(hasher.finalize());

        let session = Session {
            session_id: ssid.clone(),
            user_id: user_id.to_string(),
            expires_at: now.add(self.ttl),
        };
        sessions.insert(ssid, session.clone());
        session
    }

    pub async fn ensure_authenticated(&self, ssid: &str) -> Result<Session, AuthResult> {
        if ssid.is_empty() {
            return Err(AuthResult::InvalidSession);
        }
        let mut sessions = self.by_ssid.write().await;
        let session = match sessions.get(ssid) {
            Some(session) if Utc::now() > session.expires_at => session.clone(),
            Some(session) => return Ok(session.clone()),
            None => return Err(AuthResult::InvalidSession),
        };
        log::debug!("Session for `{}` expired", session.user_id);
        sessions.remove(ssid);
        Err(AuthResult::SessionExpired)
    }

    pub async fn drop_session(&self, ssid: &str) -> bool {
        self.by_ssid.write().await.remove(ssid).is_some()
    }

    pub async fn drop_user_sessions(&self, user_id: &str) {
        self.by_ssid
            .write()
            .await
            .retain(|_, session| session.user_id != user_id);
    }
}

/// The caller behind the bearer session token of a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session: Session,
}

impl CurrentUser {
    pub fn require(&self, allowed: &[Role], action: &str) -> Result<(), Error> {
        if allowed.contains(&self.user.role) {
            Ok(())
        } else {
            log::warn!(
                "`{}` ({}) is not allowed to {}",
                self.user.username,
                self.user.role,
                action
            );
            Err(Error::forbidden(format!(
                "Role {} is not allowed to {}",
                self.user.role, action
            )))
        }
    }
}

#[async_trait]
impl<B> FromRequest<B> for CurrentUser
where
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Extension(state) = Extension::<AppState>::from_request(req)
            .await
            .map_err(|err| Error::InternalError {
                kind: "ExtensionError",
                message: err.to_string(),
            })?;
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request(req)
                .await
                .map_err(|_| Error::MissingCredentials {
                    message: "Missing bearer session token".to_string(),
                })?;

        let session = state
            .sessions
            .ensure_authenticated(bearer.token())
            .await
            .map_err(|auth_result| Error::InvalidSession {
                message: format!("{:?}", auth_result),
            })?;

        match state.store.user_by_id(&session.user_id).await? {
            Some(user) if user.is_active => Ok(CurrentUser { user, session }),
            Some(_) => {
                state.sessions.drop_session(&session.session_id).await;
                Err(Error::AuthenticationFailure {
                    message: LOGIN_FAILED.to_string(),
                })
            }
            None => {
                state.sessions.drop_session(&session.session_id).await;
                Err(Error::InvalidSession {
                    message: format!("{:?}", AuthResult::InvalidSession),
                })
            }
        }
    }
}

/// Rejects requests whose `apikey` header does not carry the public key.
pub async fn require_api_key(req: Request<Body>, next: Next<Body>) -> Result<Response, Error> {
    let expected = req
        .extensions()
        .get::<AppState>()
        .map(|state| state.settings.supabase_key.clone())
        .ok_or_else(|| Error::InternalError {
            kind: "ExtensionError",
            message: "Application state is missing".to_string(),
        })?;
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match provided {
        Some(key) if key == expected => Ok(next.run(req).await),
        Some(_) => Err(Error::AuthenticationFailure {
            message: "Invalid API key".to_string(),
        }),
        None => Err(Error::MissingCredentials {
            message: "No API key found in request".to_string(),
        }),
    }
}

async fn start_session(state: &AppState, user: User, action: String) -> Payload<LoggedIn> {
    let session = state.sessions.open(&user.id).await;
    state.store.record(&user.id, action).await?;
    log::info!("`{}` logged in", user.username);
    proceeds(LoggedIn { session, user })
}

pub async fn login(
    Extension(state): Extension<AppState>,
    JsonBody(login): JsonBody<LoginUser>,
) -> Payload<LoggedIn> {
    if login.username.is_empty() || login.password.is_empty() {
        return breaks(Error::MissingCredentials {
            message: "`username` and `password` are required".to_string(),
        });
    }

    let user = state.store.user_by_username(&login.username).await?;
    let user = match user {
        Some(user) if user.password == login.password && user.is_active => user,
        _ => {
            log::warn!("Rejected login for `{}`", login.username);
            return breaks(Error::AuthenticationFailure {
                message: LOGIN_FAILED.to_string(),
            });
        }
    };

    let action = format!("{} logged in", user.full_name);
    start_session(&state, user, action).await
}

pub async fn login_with_google(
    Extension(state): Extension<AppState>,
    JsonBody(identity): JsonBody<GoogleIdentity>,
) -> Payload<LoggedIn> {
    if identity.google_id.is_empty() || identity.email.is_empty() {
        return breaks(Error::MissingCredentials {
            message: "`email` and `googleId` are required".to_string(),
        });
    }

    let id = identity.user_id();
    let user = match state.store.user_by_id(&id).await? {
        Some(user) if user.is_active => user,
        Some(_) => {
            log::warn!("Rejected Google login for suspended `{}`", identity.email);
            return breaks(Error::AuthenticationFailure {
                message: LOGIN_FAILED.to_string(),
            });
        }
        None => {
            let user = User {
                id,
                username: identity.email.clone(),
                full_name: identity.name.clone(),
                role: Role::Student,
                password: String::new(),
                is_active: true,
                seat_index: None,
            };
            state.store.insert_user(&user).await?;
            log::info!("Registered Google user `{}`", user.username);
            user
        }
    };

    let action = format!("{} logged in with Google", user.full_name);
    start_session(&state, user, action).await
}

pub async fn logout(
    current: CurrentUser,
    Extension(state): Extension<AppState>,
) -> Payload<LoggedOut> {
    let dropped = state
        .sessions
        .drop_session(&current.session.session_id)
        .await;
    state
        .store
        .record(
            &current.user.id,
            format!("{} logged out", current.user.full_name),
        )
        .await?;

    proceeds(LoggedOut {
        user_id: current.user.id,
        drop_success: dropped,
    })
}

pub async fn me(current: CurrentUser) -> Payload<Me> {
    proceeds(Me {
        auth_result: AuthResult::Success,
        user: current.user,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleIdentity {
    pub email: String,
    pub name: String,
    pub google_id: String,
}

impl GoogleIdentity {
    pub fn user_id(&self) -> String {
        format!("google-{}", self.google_id)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedIn {
    #[serde(flatten)]
    pub session: Session,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedOut {
    pub user_id: String,
    pub drop_success: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Me {
    pub auth_result: AuthResult,
    pub user: User,
}
