//! Proxy and origin authentication state of a job.

use crate::http::auth::AuthCredentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    DontNeedAuth,
    NeedAuth,
    HaveAuth,
    Canceled,
}

/// Which side of the connection asked for credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTarget {
    Proxy,
    Server,
}

/// Tracks the two independent auth states. Proxy challenges are always
/// answered before origin challenges.
#[derive(Debug, Default)]
pub struct AuthCoordinator {
    proxy: AuthState,
    server: AuthState,
    /// Credentials waiting for the next restart.
    credentials: Option<AuthCredentials>,
}

impl AuthCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn proxy_state(&self) -> AuthState {
        self.proxy
    }

    pub fn server_state(&self) -> AuthState {
        self.server
    }

    /// Whether `response_code` is a challenge the embedder should answer.
    /// Marks the challenged side as needing auth unless it was canceled.
    pub fn needs_auth(&mut self, response_code: Option<u16>) -> bool {
        let state = match response_code {
            Some(407) => &mut self.proxy,
            Some(401) => &mut self.server,
            _ => return false,
        };
        if *state == AuthState::Canceled {
            return false;
        }
        *state = AuthState::NeedAuth;
        true
    }

    fn pending_target(&self) -> AuthTarget {
        if self.proxy == AuthState::NeedAuth {
            AuthTarget::Proxy
        } else {
            AuthTarget::Server
        }
    }

    fn state_mut(&mut self, target: AuthTarget) -> &mut AuthState {
        match target {
            AuthTarget::Proxy => &mut self.proxy,
            AuthTarget::Server => &mut self.server,
        }
    }

    /// Records credentials for the side that is waiting on them.
    ///
    /// Returns `None`, leaving both states alone, when no challenge is
    /// pending.
    pub fn set_auth(&mut self, credentials: AuthCredentials) -> Option<AuthTarget> {
        let target = self.pending_target();
        if *self.state_mut(target) != AuthState::NeedAuth {
            tracing::warn!(?target, "credentials supplied without a pending challenge");
            return None;
        }
        *self.state_mut(target) = AuthState::HaveAuth;
        self.credentials = Some(credentials);
        Some(target)
    }

    /// Stores credentials for a restart the transaction asked for itself.
    pub fn set_restart_credentials(&mut self, credentials: AuthCredentials) {
        self.credentials = Some(credentials);
    }

    /// Gives up on the side that is waiting on credentials.
    pub fn cancel_auth(&mut self) -> AuthTarget {
        let target = self.pending_target();
        *self.state_mut(target) = AuthState::Canceled;
        target
    }

    /// Credentials for the next restart; empty when none were stored.
    pub fn take_credentials(&mut self) -> AuthCredentials {
        self.credentials.take().unwrap_or_default()
    }
}
