// Copyright 2026 Grzegorz Blach
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Passkeys Demo Server
//!
//! A relying party built on `passkey_rp` and Axum.
//!
//! ## Flows
//!
//! ### Registration
//! 1. Client sends a username to `/register/start`
//! 2. Server issues a challenge bound to a fresh session and returns the options
//! 3. Client calls `navigator.credentials.create()` with these options
//! 4. Client sends the session and the credential to `/register/finish`
//! 5. Server verifies the attestation and saves the credential
//!
//! ### Authentication
//! - With a username, the options list only that user's credentials
//! - Without one, the browser offers every discoverable passkey and the
//!   server identifies the user from the credential
//!
//! ## Running
//! ```sh
//! RUST_LOG=debug cargo run --example axum
//! ```
//! Then open http://localhost:3000 in your browser. The relying party is
//! configured from `WEBAUTHN_RP_ID`, `WEBAUTHN_RP_ORIGIN` and `WEBAUTHN_RP_NAME`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use passkey_rp::{
    AuthenticationCredential, AuthenticationOptions, Error, ErrorKind, MemoryCredentialStore,
    RegistrationCredential, RegistrationOptions, RelyingParty, RelyingPartyConfig, UserIdentity,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// =============================================================================
// Error handling
// =============================================================================

enum AppError {
    Ceremony(Error),
    UnknownUser,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // The detailed cause was already logged by the relying party
            AppError::Ceremony(err) => {
                let status = match err.kind() {
                    ErrorKind::Collaborator => StatusCode::SERVICE_UNAVAILABLE,
                    ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorKind::Security => StatusCode::FORBIDDEN,
                    ErrorKind::Protocol | ErrorKind::Ceremony => StatusCode::BAD_REQUEST,
                };
                (status, err.public_message()).into_response()
            }
            AppError::UnknownUser => (StatusCode::NOT_FOUND, "unknown user").into_response(),
        }
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::Ceremony(err)
    }
}

type AppResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Accounts
// =============================================================================

/// Account record. Credentials live in the credential store, keyed by ID and
/// linked back to the account through `id`.
#[derive(Clone)]
struct User {
    /// Opaque user handle, never the username.
    id: Vec<u8>,
    display_name: String,
}

// =============================================================================
// Request/Response types
// =============================================================================

#[derive(Deserialize)]
struct RegisterStartRequest {
    username: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Request to start authentication. Without a username the usernameless
/// flow is used.
#[derive(Deserialize, Default)]
struct AuthStartRequest {
    #[serde(default)]
    username: Option<String>,
}

/// Options plus the session the client must echo back on finish.
#[derive(Serialize)]
struct StartResponse<T> {
    session: String,
    options: T,
}

#[derive(Deserialize)]
struct FinishRequest<T> {
    session: String,
    credential: T,
}

#[derive(Serialize)]
struct ApiResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

// =============================================================================
// Application state
// =============================================================================

#[derive(Clone)]
struct AppState {
    rp: Arc<RelyingParty>,
    credentials: Arc<MemoryCredentialStore>,
    /// Maps username -> account
    users: Arc<Mutex<HashMap<String, User>>>,
}

impl AppState {
    fn username_for(&self, user_id: &[u8]) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|(_, user)| user.id == user_id)
            .map(|(name, _)| name.clone())
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// POST /register/start - Begin passkey registration
///
/// Creates the account on first use. Credentials the account already owns
/// are listed in `excludeCredentials` so an authenticator is not enrolled twice.
async fn register_start(
    State(state): State<AppState>,
    Json(req): Json<RegisterStartRequest>,
) -> AppResult<StartResponse<RegistrationOptions>> {
    let user = state
        .users
        .lock()
        .unwrap()
        .entry(req.username.clone())
        .or_insert_with(|| User {
            id: Uuid::new_v4().as_bytes().to_vec(),
            display_name: req.display_name.unwrap_or_else(|| req.username.clone()),
        })
        .clone();

    let existing = state.credentials.credentials_for_user(&user.id);
    let identity = UserIdentity::new(user.id, &req.username, &user.display_name);

    let session = Uuid::new_v4().to_string();
    let options = state
        .rp
        .start_registration(&session, &identity, Some(&existing[..]))?;

    Ok(Json(StartResponse { session, options }))
}

/// POST /register/finish - Complete passkey registration
async fn register_finish(
    State(state): State<AppState>,
    Json(req): Json<FinishRequest<RegistrationCredential>>,
) -> AppResult<ApiResponse> {
    let credential = state
        .rp
        .register(&req.session, &req.credential, state.credentials.as_ref())
        .await?;

    Ok(Json(ApiResponse {
        success: true,
        message: "Registration successful".into(),
        username: state.username_for(&credential.user_id),
    }))
}

/// POST /auth/start - Begin passkey authentication
async fn auth_start(
    State(state): State<AppState>,
    Json(req): Json<AuthStartRequest>,
) -> AppResult<StartResponse<AuthenticationOptions>> {
    let allowed = match req.username {
        Some(ref username) => {
            let user_id = state
                .users
                .lock()
                .unwrap()
                .get(username)
                .map(|user| user.id.clone())
                .ok_or(AppError::UnknownUser)?;
            Some(state.credentials.credentials_for_user(&user_id))
        }
        None => None,
    };

    let session = Uuid::new_v4().to_string();
    let options = state
        .rp
        .start_authentication(&session, allowed.as_deref())?;

    Ok(Json(StartResponse { session, options }))
}

/// POST /auth/finish - Complete passkey authentication
///
/// The relying party looks the credential up, verifies the signature and
/// persists the new signature counter.
async fn auth_finish(
    State(state): State<AppState>,
    Json(req): Json<FinishRequest<AuthenticationCredential>>,
) -> AppResult<ApiResponse> {
    let verified = state
        .rp
        .authenticate(&req.session, &req.credential, state.credentials.as_ref())
        .await?;

    let username = state
        .username_for(&verified.user_id)
        .ok_or(AppError::UnknownUser)?;

    Ok(Json(ApiResponse {
        success: true,
        message: format!("Welcome back, {}!", username),
        username: Some(username),
    }))
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RelyingPartyConfig::from_env()?;
    tracing::info!(
        rp_id = config.rp_id(),
        origin = config.rp_origin(),
        "relying party configured"
    );

    let state = AppState {
        rp: Arc::new(RelyingParty::new(config)),
        credentials: Arc::new(MemoryCredentialStore::new()),
        users: Arc::default(),
    };

    // Abandoned ceremonies would otherwise accumulate
    let rp = state.rp.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let purged = rp.challenges().purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "expired challenges purged");
            }
        }
    });

    let app = Router::new()
        .route("/", get(index))
        .route("/register/start", post(register_start))
        .route("/register/finish", post(register_finish))
        .route("/auth/start", post(auth_start))
        .route("/auth/finish", post(auth_finish))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on http://localhost:3000");
    axum::serve(listener, app).await?;
    Ok(())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Passkeys Demo</title></head>
<body>
<h1>Passkeys Demo</h1>
<input id="username" placeholder="username (optional for login)">
<button id="register">Register</button>
<button id="login">Login</button>
<pre id="log"></pre>
<script>
const log = (msg) => { document.getElementById("log").textContent += msg + "\n"; };
const toBytes = (s) => Uint8Array.from(atob(s.replace(/-/g, "+").replace(/_/g, "/")), c => c.charCodeAt(0));
const toB64 = (buf) => btoa(String.fromCharCode(...new Uint8Array(buf)))
  .replace(/\+/g, "-").replace(/\//g, "_").replace(/=+$/, "");
const post = async (url, body) => {
  const res = await fetch(url, { method: "POST", headers: { "Content-Type": "application/json" }, body: JSON.stringify(body) });
  if (!res.ok) throw new Error(await res.text());
  return res.json();
};
const descriptors = (list) => list && list.map(c => ({ ...c, id: toBytes(c.id) }));

document.getElementById("register").onclick = async () => {
  try {
    const username = document.getElementById("username").value;
    const { session, options } = await post("/register/start", { username });
    const cred = await navigator.credentials.create({ publicKey: {
      ...options,
      challenge: toBytes(options.challenge),
      user: { ...options.user, id: toBytes(options.user.id) },
      excludeCredentials: descriptors(options.excludeCredentials),
    }});
    const credential = {
      id: cred.id, rawId: toB64(cred.rawId), type: cred.type,
      response: {
        clientDataJSON: toB64(cred.response.clientDataJSON),
        attestationObject: toB64(cred.response.attestationObject),
      },
    };
    log((await post("/register/finish", { session, credential })).message);
  } catch (e) { log("registration failed: " + e.message); }
};

document.getElementById("login").onclick = async () => {
  try {
    const username = document.getElementById("username").value || undefined;
    const { session, options } = await post("/auth/start", { username });
    const cred = await navigator.credentials.get({ publicKey: {
      ...options,
      challenge: toBytes(options.challenge),
      allowCredentials: descriptors(options.allowCredentials),
    }});
    const credential = {
      id: cred.id, rawId: toB64(cred.rawId), type: cred.type,
      response: {
        authenticatorData: toB64(cred.response.authenticatorData),
        clientDataJSON: toB64(cred.response.clientDataJSON),
        signature: toB64(cred.response.signature),
        userHandle: cred.response.userHandle ? toB64(cred.response.userHandle) : null,
      },
    };
    log((await post("/auth/finish", { session, credential })).message);
  } catch (e) { log("login failed: " + e.message); }
};
</script>
</body>
</html>
"#;
