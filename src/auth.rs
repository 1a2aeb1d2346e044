use crate::errors::{required, AppError, Result};
use crate::models::{Credential, OAuthProvider, PublicUser, SessionResponse, User};
use crate::state::AppState;
use crate::storage::Store;
use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "journalix_session";
const MIN_PASSWORD_LEN: usize = 8;
const EVENT_BUFFER: usize = 64;
const OAUTH_STATE_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    SignedUp,
    SignedIn,
    SignedOut,
    Expired,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub user_id: Uuid,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct PendingOAuth {
    provider: OAuthProvider,
    issued_at: DateTime<Utc>,
}

/// Identity asserted by an OAuth provider at the end of its flow.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    store: Store,
    ttl: Duration,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    pending_oauth: Arc<Mutex<HashMap<String, PendingOAuth>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthService {
    pub fn new(store: Store, ttl: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            store,
            ttl,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            pending_oauth: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<SessionResponse> {
        let name = required("name", name)?;
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::bad_request(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.find_by_email(&email).await.is_some() {
            return Err(AppError::Conflict("an account with this email already exists".into()));
        }

        let hash = hash_password(password.to_string()).await?;
        let user = User {
            id: Uuid::new_v4(),
            name,
            email,
            avatar: None,
            credential: Credential::Password { hash },
            created_at: Utc::now(),
        };
        let user = self.insert_user(user).await?;
        info!(user_id = %user.id, "account created");
        Ok(self.open_session(&user, SessionEventKind::SignedUp).await)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionResponse> {
        let email = normalize_email(email).map_err(|_| invalid_credentials())?;
        let user = self.find_by_email(&email).await.ok_or_else(invalid_credentials)?;

        let hash = match &user.credential {
            Credential::Password { hash } => hash.clone(),
            Credential::OAuth { provider } => {
                return Err(AppError::unauthorized(format!(
                    "this account signs in with {}",
                    provider.label()
                )));
            }
        };
        if !verify_password(password.to_string(), hash).await? {
            warn!(user_id = %user.id, "rejected sign-in");
            return Err(invalid_credentials());
        }

        Ok(self.open_session(&user, SessionEventKind::SignedIn).await)
    }

    /// Starts an OAuth flow and returns the one-time state value the callback
    /// must present within `OAUTH_STATE_TTL_MINUTES`. Stale states are dropped
    /// whenever a new one is issued.
    pub async fn begin_oauth(&self, provider: OAuthProvider) -> String {
        let state = new_token();
        let now = Utc::now();
        let mut pending = self.pending_oauth.lock().await;
        pending.retain(|_, issued| !oauth_state_expired(issued, now));
        pending.insert(
            state.clone(),
            PendingOAuth {
                provider,
                issued_at: now,
            },
        );
        state
    }

    pub async fn sign_in_with_provider(
        &self,
        provider: OAuthProvider,
        state: &str,
        profile: ProviderProfile,
    ) -> Result<SessionResponse> {
        let pending = self.pending_oauth.lock().await.remove(state);
        let valid = pending
            .is_some_and(|p| p.provider == provider && !oauth_state_expired(&p, Utc::now()));
        if !valid {
            return Err(AppError::unauthorized(format!(
                "{} sign-in failed: unknown or reused state",
                provider.label()
            )));
        }
        let email = normalize_email(&profile.email)
            .map_err(|_| AppError::unauthorized("provider did not supply a valid email"))?;

        let (user, kind) = match self.find_by_email(&email).await {
            Some(user) => (user, SessionEventKind::SignedIn),
            None => {
                let name = profile
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
                let user = User {
                    id: Uuid::new_v4(),
                    name,
                    email,
                    avatar: None,
                    credential: Credential::OAuth { provider },
                    created_at: Utc::now(),
                };
                (self.insert_user(user).await?, SessionEventKind::SignedUp)
            }
        };

        info!(user_id = %user.id, provider = provider.as_str(), "oauth sign-in");
        Ok(self.open_session(&user, kind).await)
    }

    pub async fn sign_out(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token);
        match removed {
            Some(session) => {
                self.publish(SessionEventKind::SignedOut, session.user_id);
                true
            }
            None => false,
        }
    }

    /// Resolves a token to its live session and user. Expired sessions are
    /// dropped on sight.
    pub async fn session(&self, token: &str) -> Result<(Session, PublicUser)> {
        let session = self
            .sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::unauthorized("not signed in"))?;

        if session.expires_at <= Utc::now() {
            self.sessions.write().await.remove(token);
            self.publish(SessionEventKind::Expired, session.user_id);
            return Err(AppError::unauthorized("session expired"));
        }

        let user = self
            .store
            .read(|data| data.users.get(&session.user_id).map(PublicUser::from))
            .await
            .ok_or_else(|| AppError::unauthorized("account no longer exists"))?;
        Ok((session, user))
    }

    async fn find_by_email(&self, email: &str) -> Option<User> {
        self.store
            .read(|data| data.users.values().find(|user| user.email == email).cloned())
            .await
    }

    async fn insert_user(&self, user: User) -> Result<User> {
        self.store
            .mutate(move |data| {
                if data.users.values().any(|existing| existing.email == user.email) {
                    return Err(AppError::Conflict(
                        "an account with this email already exists".into(),
                    ));
                }
                data.users.insert(user.id, user.clone());
                Ok(user)
            })
            .await
    }

    async fn open_session(&self, user: &User, kind: SessionEventKind) -> SessionResponse {
        let now = Utc::now();
        let session = Session {
            token: new_token(),
            user_id: user.id,
            created_at: now,
            expires_at: now + self.ttl,
        };
        let expired: Vec<Uuid> = {
            let mut sessions = self.sessions.write().await;
            let stale: Vec<String> = sessions
                .values()
                .filter(|s| s.expires_at <= now)
                .map(|s| s.token.clone())
                .collect();
            let expired = stale
                .iter()
                .filter_map(|token| sessions.remove(token))
                .map(|s| s.user_id)
                .collect();
            sessions.insert(session.token.clone(), session.clone());
            expired
        };
        for user_id in expired {
            self.publish(SessionEventKind::Expired, user_id);
        }
        self.publish(kind, user.id);

        SessionResponse {
            user: PublicUser::from(user),
            token: session.token,
            expires_at: session.expires_at,
        }
    }

    fn publish(&self, kind: SessionEventKind, user_id: Uuid) {
        // No subscribers is fine.
        let _ = self.events.send(SessionEvent {
            kind,
            user_id,
            at: Utc::now(),
        });
    }
}

fn oauth_state_expired(pending: &PendingOAuth, now: DateTime<Utc>) -> bool {
    now - pending.issued_at > Duration::minutes(OAUTH_STATE_TTL_MINUTES)
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("invalid email or password")
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(AppError::bad_request("a valid email address is required")),
    }
}

fn new_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AppError::Internal(format!("password hashing failed: {err}")))
    })
    .await
    .map_err(AppError::internal)?
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|err| AppError::Internal(format!("stored hash is unreadable: {err}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(AppError::internal)?
}

pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.num_seconds()
    )
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Bearer token first, then the session cookie.
pub fn token_from_parts(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }

    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// The signed-in user behind a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: PublicUser,
    pub token: String,
}

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = token_from_parts(parts).ok_or_else(|| AppError::unauthorized("not signed in"))?;
        let (session, user) = state.auth.session(&token).await?;
        Ok(Self {
            user,
            token: session.token,
        })
    }
}
