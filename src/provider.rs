use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::auth::{
    AuthError, AuthListener, AuthListeners, AuthWatch, DEFAULT_AVATAR_URL, IdentityProvider,
};
use crate::models::User;

// --- REST identity provider ---

/// Identity Toolkit compatible host. Override with JOBTRACK_AUTH_URL to
/// point at an emulator.
const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Backend adapter speaking the Identity Toolkit REST surface. The provider
/// session (user snapshot plus id token) is cached in the platform data
/// directory so separate invocations share one signed-in state, the terminal
/// analog of the web client's provider-managed local session.
pub struct RestIdentityProvider {
    api_key: String,
    base_url: String,
    client: reqwest::blocking::Client,
    listeners: Arc<AuthListeners>,
    state: Mutex<Option<CachedSession>>,
    cache_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedSession {
    user: User,
    id_token: String,
    issued_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    photo_url: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetRequest<'a> {
    request_type: &'a str,
    email: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    #[serde(default)]
    id_token: String,
    email: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    photo_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetResponse {
    #[allow(dead_code)]
    email: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Maps the backend's error code strings onto the taxonomy. Some codes carry
/// a trailing explanation ("WEAK_PASSWORD : Password should be ...").
pub fn map_provider_error(code: &str) -> AuthError {
    let bare = code.split(':').next().unwrap_or(code).trim();
    match bare {
        "EMAIL_NOT_FOUND" => AuthError::UnknownEmail,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
            AuthError::InvalidCredentials
        }
        "EMAIL_EXISTS" => AuthError::EmailInUse,
        "WEAK_PASSWORD" => AuthError::WeakPassword,
        "USER_CANCELLED" | "POPUP_CLOSED_BY_USER" => AuthError::PopupClosed,
        other => AuthError::Provider(other.to_string()),
    }
}

impl RestIdentityProvider {
    pub fn new() -> anyhow::Result<Self> {
        use anyhow::Context;
        let api_key = env::var("JOBTRACK_API_KEY").context(
            "JOBTRACK_API_KEY environment variable not set. Set it with: export JOBTRACK_API_KEY=your-key-here",
        )?;
        let base_url =
            env::var("JOBTRACK_AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string());
        let cache_path = Self::default_cache_path();
        let state = Self::load_cache(&cache_path);
        Ok(Self {
            api_key,
            base_url,
            client: reqwest::blocking::Client::new(),
            listeners: Arc::new(AuthListeners::default()),
            state: Mutex::new(state),
            cache_path,
        })
    }

    fn default_cache_path() -> PathBuf {
        // XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobtrack") {
            proj_dirs.data_dir().join("session.json")
        } else {
            PathBuf::from("jobtrack-session.json")
        }
    }

    fn load_cache(path: &Path) -> Option<CachedSession> {
        let raw = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn store(&self, session: Option<CachedSession>) {
        match &session {
            Some(cached) => {
                if let Some(parent) = self.cache_path.parent() {
                    let _ = std::fs::create_dir_all(parent);
                }
                match serde_json::to_string_pretty(cached) {
                    Ok(raw) => {
                        if let Err(err) = std::fs::write(&self.cache_path, raw) {
                            eprintln!("warning: could not persist session: {}", err);
                        }
                    }
                    Err(err) => eprintln!("warning: could not encode session: {}", err),
                }
            }
            None => {
                if let Err(err) = std::fs::remove_file(&self.cache_path) {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        eprintln!("warning: could not clear session cache: {}", err);
                    }
                }
            }
        }
        let user = session.as_ref().map(|c| c.user.clone());
        *self.state.lock().unwrap() = session;
        self.listeners.broadcast(user.as_ref());
    }

    fn post<Req, Resp>(&self, op: &str, body: &Req) -> Result<Resp, AuthError>
    where
        Req: Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let url = format!("{}/accounts:{}?key={}", self.base_url, op, self.api_key);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| AuthError::Provider(format!("request failed: {}", e)))?;

        if response.status().is_success() {
            response
                .json()
                .map_err(|e| AuthError::Provider(format!("malformed response: {}", e)))
        } else {
            let status = response.status();
            match response.json::<ApiErrorBody>() {
                Ok(body) => Err(map_provider_error(&body.error.message)),
                Err(_) => Err(AuthError::Provider(format!("unexpected status {}", status))),
            }
        }
    }

    fn cached_token(&self) -> Result<String, AuthError> {
        self.state
            .lock()
            .unwrap()
            .as_ref()
            .map(|c| c.id_token.clone())
            .ok_or(AuthError::NotAuthenticated)
    }
}

impl IdentityProvider for RestIdentityProvider {
    fn subscribe(&self, listener: AuthListener) -> AuthWatch {
        listener(self.state.lock().unwrap().as_ref().map(|c| c.user.clone()));
        self.listeners.register(listener)
    }

    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let response: AccountResponse = self.post(
            "signInWithPassword",
            &PasswordRequest {
                email,
                password,
                return_secure_token: true,
            },
        )?;
        let user = User {
            name: response.display_name,
            email: response.email,
            photo_url: response.photo_url,
            provider: "password".to_string(),
        };
        self.store(Some(CachedSession {
            user: user.clone(),
            id_token: response.id_token,
            issued_at: Utc::now(),
        }));
        Ok(user)
    }

    fn create_account(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let response: AccountResponse = self.post(
            "signUp",
            &PasswordRequest {
                email,
                password,
                return_secure_token: true,
            },
        )?;
        let user = User {
            name: response.display_name,
            email: response.email,
            photo_url: response.photo_url,
            provider: "password".to_string(),
        };
        self.store(Some(CachedSession {
            user: user.clone(),
            id_token: response.id_token,
            issued_at: Utc::now(),
        }));
        Ok(user)
    }

    fn update_profile(&self, name: &str, photo_url: &str) -> Result<User, AuthError> {
        let token = self.cached_token()?;
        let response: AccountResponse = self.post(
            "update",
            &UpdateRequest {
                id_token: &token,
                display_name: name,
                photo_url,
                return_secure_token: true,
            },
        )?;
        let user = User {
            name: response.display_name,
            email: response.email,
            photo_url: response.photo_url,
            provider: "password".to_string(),
        };
        // The update response may rotate the token.
        let id_token = if response.id_token.is_empty() {
            token
        } else {
            response.id_token
        };
        self.store(Some(CachedSession {
            user: user.clone(),
            id_token,
            issued_at: Utc::now(),
        }));
        Ok(user)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        self.store(None);
        Ok(())
    }

    fn federated_sign_in(&self) -> Result<User, AuthError> {
        // The popup flow needs a browser; there is none in a terminal.
        Err(AuthError::Provider(
            "federated sign-in is not available from the terminal".to_string(),
        ))
    }

    fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let _response: ResetResponse = self.post(
            "sendOobCode",
            &ResetRequest {
                request_type: "PASSWORD_RESET",
                email,
            },
        )?;
        Ok(())
    }
}

// --- In-memory identity provider ---

struct MemoryAccount {
    password: String,
    user: User,
}

/// In-memory provider used by the test suite and the `JOBTRACK_PROVIDER=memory`
/// offline mode. Accounts live for the process lifetime only.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    accounts: Mutex<HashMap<String, MemoryAccount>>,
    current: Mutex<Option<User>>,
    listeners: Arc<AuthListeners>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, email: &str, password: &str, name: &str) -> Self {
        let user = User {
            name: name.to_string(),
            email: email.to_string(),
            photo_url: DEFAULT_AVATAR_URL.to_string(),
            provider: "password".to_string(),
        };
        self.accounts.lock().unwrap().insert(
            email.to_lowercase(),
            MemoryAccount {
                password: password.to_string(),
                user,
            },
        );
        self
    }

    fn set_current(&self, user: Option<User>) {
        *self.current.lock().unwrap() = user.clone();
        self.listeners.broadcast(user.as_ref());
    }
}

impl IdentityProvider for MemoryIdentityProvider {
    fn subscribe(&self, listener: AuthListener) -> AuthWatch {
        listener(self.current.lock().unwrap().clone());
        self.listeners.register(listener)
    }

    fn sign_in_with_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get(&email.to_lowercase())
            .ok_or(AuthError::InvalidCredentials)?;
        if account.password != password {
            return Err(AuthError::InvalidCredentials);
        }
        let user = account.user.clone();
        drop(accounts);
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    fn create_account(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let mut accounts = self.accounts.lock().unwrap();
        let key = email.to_lowercase();
        if accounts.contains_key(&key) {
            return Err(AuthError::EmailInUse);
        }
        // Provider-side policy, independent of the client's pre-validation.
        if password.chars().count() < 6 {
            return Err(AuthError::WeakPassword);
        }
        let user = User {
            name: String::new(),
            email: email.to_string(),
            photo_url: String::new(),
            provider: "password".to_string(),
        };
        accounts.insert(
            key,
            MemoryAccount {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        drop(accounts);
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    fn update_profile(&self, name: &str, photo_url: &str) -> Result<User, AuthError> {
        let mut current = self.current.lock().unwrap();
        let user = current.as_mut().ok_or(AuthError::NotAuthenticated)?;
        user.name = name.to_string();
        user.photo_url = photo_url.to_string();
        let updated = user.clone();
        drop(current);

        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.get_mut(&updated.email.to_lowercase()) {
            account.user = updated.clone();
        }
        drop(accounts);
        self.listeners.broadcast(Some(&updated));
        Ok(updated)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        self.set_current(None);
        Ok(())
    }

    fn federated_sign_in(&self) -> Result<User, AuthError> {
        let user = User {
            name: "Demo User".to_string(),
            email: "demo.user@gmail.com".to_string(),
            photo_url: DEFAULT_AVATAR_URL.to_string(),
            provider: "google.com".to_string(),
        };
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let accounts = self.accounts.lock().unwrap();
        if !accounts.contains_key(&email.to_lowercase()) {
            return Err(AuthError::UnknownEmail);
        }
        Ok(())
    }
}
