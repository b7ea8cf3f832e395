// Copyright 2025 Dorina-RS Project
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

//! Polling of one submitted search job.
//!
//! A session lives for the pending period of exactly one submission. Status
//! checks are strictly sequential: the next check is only issued after the
//! previous response arrived and the retry delay elapsed. `pending` is the
//! only state that keeps the loop going; any other state string is terminal.
//! A session can be superseded through its [`SessionHandle`] when a newer
//! search takes over, and an optional check ceiling guards against backends
//! that never leave `pending`.

use std::error::Error;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::transport::SearchTransport;
use crate::{ClientConfig, SearchStatus};

/// Lifecycle of a [`PollingSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Submitted,
    Polling,
    Done,
    Failed,
}

/// Terminal failures of a polling session.
#[derive(Debug)]
pub enum SessionError {
    /// A newer search superseded this session.
    Superseded,
    /// The configured status-check ceiling was reached while the job was
    /// still pending.
    RetriesExhausted(u32),
    /// The transport rejected a status check.
    Transport(anyhow::Error),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Superseded => write!(f, "session superseded by a newer search"),
            SessionError::RetriesExhausted(max) => {
                write!(f, "job still pending after {} status checks", max)
            }
            SessionError::Transport(e) => write!(f, "status check failed: {}", e),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SessionError::Transport(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Handle used to supersede a running session.
pub struct SessionHandle {
    uuid: String,
    cancel: watch::Sender<bool>,
}

impl SessionHandle {
    /// Uuid of the submission this handle belongs to.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Tell the session to stop polling. Idempotent; the session finishes
    /// with [`SessionError::Superseded`].
    pub fn supersede(&self) {
        let _ = self.cancel.send(true);
    }
}

/// Poll loop for one submitted job.
pub struct PollingSession {
    transport: Arc<dyn SearchTransport>,
    uuid: String,
    retry_after: Duration,
    max_status_checks: Option<u32>,
    state: SessionState,
    cancel: watch::Receiver<bool>,
    cancel_closed: bool,
}

impl PollingSession {
    /// Create a session for an already-submitted job.
    pub fn new(
        transport: Arc<dyn SearchTransport>,
        uuid: impl Into<String>,
        config: &ClientConfig,
    ) -> (Self, SessionHandle) {
        let uuid = uuid.into();
        let (tx, rx) = watch::channel(false);
        let session = Self {
            transport,
            uuid: uuid.clone(),
            retry_after: config.retry_after,
            max_status_checks: config.max_status_checks,
            state: SessionState::Submitted,
            cancel: rx,
            cancel_closed: false,
        };
        let handle = SessionHandle { uuid, cancel: tx };
        (session, handle)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Poll until the job leaves `pending`, returning the terminal status.
    /// The result fetch is the caller's next step; it must not happen before
    /// this returns.
    pub async fn wait_until_terminal(&mut self) -> Result<SearchStatus, SessionError> {
        self.state = SessionState::Polling;
        let mut checks: u32 = 0;
        loop {
            if *self.cancel.borrow() {
                self.state = SessionState::Failed;
                return Err(SessionError::Superseded);
            }

            let status = match self.transport.status(&self.uuid).await {
                Ok(status) => status,
                Err(e) => {
                    self.state = SessionState::Failed;
                    return Err(SessionError::Transport(e));
                }
            };
            checks += 1;

            if !status.is_pending() {
                self.state = SessionState::Done;
                tracing::debug!(
                    uuid = %self.uuid,
                    state = %status.state,
                    checks,
                    "job reached terminal state"
                );
                return Ok(status);
            }

            if let Some(max) = self.max_status_checks {
                if checks >= max {
                    self.state = SessionState::Failed;
                    tracing::warn!(uuid = %self.uuid, max, "giving up on pending job");
                    return Err(SessionError::RetriesExhausted(max));
                }
            }

            tracing::trace!(uuid = %self.uuid, retry_after = ?self.retry_after, "job pending, rechecking later");
            if self.wait_retry().await {
                self.state = SessionState::Failed;
                return Err(SessionError::Superseded);
            }
        }
    }

    /// Sleep out the retry delay; returns true when superseded meanwhile.
    async fn wait_retry(&mut self) -> bool {
        if self.cancel_closed {
            tokio::time::sleep(self.retry_after).await;
            return false;
        }
        tokio::select! {
            res = self.cancel.changed() => match res {
                Ok(()) => *self.cancel.borrow(),
                Err(_) => {
                    // Handle dropped without superseding; fall back to a
                    // plain delay for the rest of the session.
                    self.cancel_closed = true;
                    tokio::time::sleep(self.retry_after).await;
                    false
                }
            },
            _ = tokio::time::sleep(self.retry_after) => false,
        }
    }
}
