// ── Session lifecycle ──
//
// Owns the bearer token and the client it rides on. Readers load an
// immutable snapshot without locking; the only writers are a login (under
// the single-flight mutex), a client rebind (same mutex), and
// `invalidate` (compare-and-swap on the snapshot).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use url::Url;

use smartpole_api::{ConsoleClient, RemoteAsset};

use crate::config::SyncConfig;
use crate::credentials::PasswordCipher;
use crate::error::CoreError;
use crate::transport::Binding;

// ── SessionState ─────────────────────────────────────────────────

/// Authentication state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated,
    /// Last login failed, or the session no longer matches the config.
    Invalid,
}

// ── Session ──────────────────────────────────────────────────────

/// An authenticated session.
///
/// The token and the client that sends it are one unit: a caller holding
/// an `Arc<Session>` can never pair a client with another session's token.
#[derive(Debug)]
pub struct Session {
    token: SecretString,
    bound_endpoint: Url,
    issued_at: DateTime<Utc>,
    assets: Arc<[RemoteAsset]>,
    client: Arc<ConsoleClient>,
    generation: u64,
}

impl Session {
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn bound_endpoint(&self) -> &Url {
        &self.bound_endpoint
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Asset inventory returned with the login.
    pub fn assets(&self) -> &[RemoteAsset] {
        &self.assets
    }

    /// Client carrying `Authorization: Bearer <token>`.
    pub fn client(&self) -> &ConsoleClient {
        &self.client
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Same token, new client. Used when only timeout or TLS changed.
    fn rebound(&self, client: Arc<ConsoleClient>) -> Self {
        Self {
            token: self.token.clone(),
            bound_endpoint: self.bound_endpoint.clone(),
            issued_at: self.issued_at,
            assets: Arc::clone(&self.assets),
            client,
            generation: self.generation,
        }
    }
}

/// Who the session was issued to. The password is compared in its stored
/// (encrypted) form.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Principal {
    username: String,
    password: String,
}

impl Principal {
    fn of(config: &SyncConfig) -> Self {
        Self {
            username: config.connection.username.clone(),
            password: config.connection.password.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    binding: Binding,
    principal: Principal,
    session: Option<Arc<Session>>,
}

impl Snapshot {
    /// The session, if it is usable as-is for `binding` and `principal`.
    fn usable(&self, binding: &Binding, principal: &Principal) -> Option<Arc<Session>> {
        if self.binding == *binding && self.principal == *principal {
            self.session.clone()
        } else {
            None
        }
    }
}

/// Result of the most recent login, shared with callers that queued
/// behind it.
struct LoginOutcome {
    binding: Binding,
    principal: Principal,
    result: Result<Arc<Session>, CoreError>,
}

// ── SessionManager ───────────────────────────────────────────────

pub struct SessionManager {
    cipher: Arc<dyn PasswordCipher>,
    current: ArcSwapOption<Snapshot>,
    state: watch::Sender<SessionState>,
    login: Mutex<Option<LoginOutcome>>,
    /// Bumped after every finished login attempt.
    completed: AtomicU64,
    generation: AtomicU64,
}

impl SessionManager {
    pub fn new(cipher: Arc<dyn PasswordCipher>) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self {
            cipher,
            current: ArcSwapOption::empty(),
            state,
            login: Mutex::new(None),
            completed: AtomicU64::new(0),
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current_session(&self) -> Option<Arc<Session>> {
        self.current.load().as_ref().and_then(|s| s.session.clone())
    }

    pub(crate) fn cipher(&self) -> &dyn PasswordCipher {
        &*self.cipher
    }

    /// Return a session valid for `config`, logging in if needed.
    ///
    /// The configuration is validated first; an invalid one fails without
    /// touching the network. Concurrent callers share a single login.
    pub async fn ensure_authenticated(&self, config: &SyncConfig) -> Result<Arc<Session>, CoreError> {
        self.authenticate(config, false).await
    }

    /// Log in again even when the cached session is still usable.
    ///
    /// The new session replaces the cached one, so its asset inventory is
    /// the console's current view. Callers queued behind another login
    /// that finished while they waited share its result instead.
    pub async fn refresh(&self, config: &SyncConfig) -> Result<Arc<Session>, CoreError> {
        self.authenticate(config, true).await
    }

    /// Drop `session` if it is still the current one.
    ///
    /// Called after a 401. A caller holding an older session never
    /// discards a newer one.
    pub fn invalidate(&self, session: &Session) {
        let mut dropped = false;
        self.current.rcu(|current| {
            dropped = false;
            match current {
                Some(snap)
                    if snap
                        .session
                        .as_ref()
                        .is_some_and(|s| s.generation == session.generation) =>
                {
                    dropped = true;
                    Some(Arc::new(Snapshot {
                        session: None,
                        ..Snapshot::clone(snap)
                    }))
                }
                other => other.clone(),
            }
        });

        if dropped {
            warn!(generation = session.generation, "session invalidated");
            self.state.send_replace(SessionState::Invalid);
        } else {
            debug!(generation = session.generation, "ignoring invalidate for superseded session");
        }
    }

    // ── Internals ────────────────────────────────────────────────

    async fn authenticate(&self, config: &SyncConfig, force: bool) -> Result<Arc<Session>, CoreError> {
        let conn = config.resolve(&*self.cipher)?;
        let binding = Binding::from_connection(&conn);
        let principal = Principal::of(config);

        if !force {
            if let Some(session) = self.fast_path(&binding, &principal) {
                return Ok(session);
            }
        }

        let observed = self.completed.load(Ordering::Acquire);
        let mut last = self.login.lock().await;

        // A login finished while we were queued: adopt its result.
        if self.completed.load(Ordering::Acquire) != observed {
            if let Some(outcome) = last.as_ref() {
                if outcome.binding == binding && outcome.principal == principal {
                    debug!("sharing result of concurrent login");
                    return outcome.result.clone();
                }
            }
        }

        if !force {
            if let Some(session) = self.fast_path(&binding, &principal) {
                return Ok(session);
            }
            if let Some(session) = self.rebind(&binding, &principal)? {
                return Ok(session);
            }
        }

        let result = self.login(&binding, &principal, &conn.username, &conn.password).await;
        *last = Some(LoginOutcome {
            binding,
            principal,
            result: result.clone(),
        });
        self.completed.fetch_add(1, Ordering::AcqRel);
        result
    }

    fn fast_path(&self, binding: &Binding, principal: &Principal) -> Option<Arc<Session>> {
        if self.state() != SessionState::Authenticated {
            return None;
        }
        self.current
            .load()
            .as_ref()
            .and_then(|snap| snap.usable(binding, principal))
    }

    /// Handle a binding change without a login when the session survives.
    ///
    /// Endpoint or principal change: the session is dropped and `None`
    /// returned so the caller logs in. Timeout or TLS change: a new client
    /// is built around the existing token and swapped in.
    fn rebind(
        &self,
        binding: &Binding,
        principal: &Principal,
    ) -> Result<Option<Arc<Session>>, CoreError> {
        let Some(snap) = self.current.load_full() else {
            return Ok(None);
        };
        let Some(session) = snap.session.as_ref() else {
            return Ok(None);
        };

        if snap.binding.endpoint != binding.endpoint || snap.principal != *principal {
            info!(
                old = %snap.binding.endpoint,
                new = %binding.endpoint,
                "endpoint or credentials changed, dropping session"
            );
            self.current.store(Some(Arc::new(Snapshot {
                binding: binding.clone(),
                principal: principal.clone(),
                session: None,
            })));
            self.state.send_replace(SessionState::Invalid);
            return Ok(None);
        }

        if self.state() != SessionState::Authenticated {
            return Ok(None);
        }

        debug!(timeout = ?binding.timeout, "transport settings changed, rebuilding client");
        let client = binding.build(Some(&session.token))?;
        let session = Arc::new(session.rebound(client));
        self.current.store(Some(Arc::new(Snapshot {
            binding: binding.clone(),
            principal: principal.clone(),
            session: Some(Arc::clone(&session)),
        })));
        Ok(Some(session))
    }

    async fn login(
        &self,
        binding: &Binding,
        principal: &Principal,
        username: &str,
        password: &SecretString,
    ) -> Result<Arc<Session>, CoreError> {
        let mut pending = PendingLogin::enter(&self.state);
        debug!(endpoint = %binding.endpoint, username, "authenticating");

        let result = self.try_login(binding, username, password).await;
        pending.finish();

        match result {
            Ok(session) => {
                self.current.store(Some(Arc::new(Snapshot {
                    binding: binding.clone(),
                    principal: principal.clone(),
                    session: Some(Arc::clone(&session)),
                })));
                self.state.send_replace(SessionState::Authenticated);
                info!(
                    endpoint = %binding.endpoint,
                    assets = session.assets.len(),
                    "authenticated"
                );
                Ok(session)
            }
            Err(e) => {
                self.current.store(Some(Arc::new(Snapshot {
                    binding: binding.clone(),
                    principal: principal.clone(),
                    session: None,
                })));
                self.state.send_replace(SessionState::Invalid);
                warn!(endpoint = %binding.endpoint, error = %e, "login failed");
                Err(e)
            }
        }
    }

    async fn try_login(
        &self,
        binding: &Binding,
        username: &str,
        password: &SecretString,
    ) -> Result<Arc<Session>, CoreError> {
        let anonymous = binding.build(None)?;
        let header = anonymous.login(username, password).await?;

        let client = binding.build(Some(&header.token))?;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        Ok(Arc::new(Session {
            token: header.token,
            bound_endpoint: binding.endpoint.clone(),
            issued_at: Utc::now(),
            assets: header.assets.into(),
            client,
            generation,
        }))
    }
}

/// Marks the state `Authenticating` for the duration of one login.
///
/// If the login future is dropped before it finishes, the state observed
/// before the attempt is put back.
struct PendingLogin<'a> {
    state: &'a watch::Sender<SessionState>,
    prior: SessionState,
    finished: bool,
}

impl<'a> PendingLogin<'a> {
    fn enter(state: &'a watch::Sender<SessionState>) -> Self {
        let prior = state.send_replace(SessionState::Authenticating);
        Self {
            state,
            prior,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for PendingLogin<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(restored = %self.prior, "login abandoned");
            self.state.send_replace(self.prior);
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
