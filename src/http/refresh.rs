//! Single-flight coordination of token refreshes.
//!
//! One [`RefreshCoordinator`] belongs to each [`crate::http::ApiClient`]. The
//! first request that needs a refresh becomes the leader and gets a
//! [`RefreshGuard`]; every request that needs one while the leader is still
//! working is parked as a [`PendingRequest`] and handed back once the leader
//! resolves the guard. Parked requests are resolved in arrival order.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;

use super::request::ApiRequest;

/// Why a refresh did not produce a new access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshFailureKind {
    /// The refresh token itself is missing or was rejected. The session is over.
    Credential,
    /// Transport trouble or an unexpected answer. Credentials stay in place.
    Transient,
}

/// A failed refresh, shared with every request that waited for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    pub kind: RefreshFailureKind,
    /// Status of the refresh endpoint's answer, when there was one.
    pub status: Option<u16>,
    pub message: String,
}

impl RefreshFailure {
    pub fn credential(message: impl Into<String>) -> Self {
        Self {
            kind: RefreshFailureKind::Credential,
            status: None,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: RefreshFailureKind::Transient,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_credential(&self) -> bool {
        self.kind == RefreshFailureKind::Credential
    }
}

impl fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {status})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Result a parked request receives: itself, ready for replay, or the failure.
pub type PendingOutcome = Result<ApiRequest, RefreshFailure>;

/// A request parked while another task refreshes.
#[derive(Debug)]
pub struct PendingRequest {
    request: ApiRequest,
    responder: oneshot::Sender<PendingOutcome>,
}

impl PendingRequest {
    fn resolve(self, outcome: &Result<String, RefreshFailure>) {
        let id = self.request.id();
        let message = match outcome {
            Ok(token) => Ok(self.request.into_replay(token.clone())),
            Err(failure) => Err(failure.clone()),
        };
        if self.responder.send(message).is_err() {
            tracing::debug!(request_id = %id, "parked request was dropped before resolution");
        }
    }
}

#[derive(Debug, Default)]
struct RefreshState {
    refreshing: bool,
    pending: VecDeque<PendingRequest>,
}

/// What [`RefreshCoordinator::begin_or_join`] decided for a caller.
pub enum RefreshRole<'a> {
    /// No refresh was running: this caller performs it.
    Leader {
        request: ApiRequest,
        guard: RefreshGuard<'a>,
    },
    /// A refresh is running: wait for its outcome.
    Follower(oneshot::Receiver<PendingOutcome>),
}

/// Owner of the refreshing flag and the queue of parked requests.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        // State stays consistent across a panic: every mutation is a single
        // push, take or flag write.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Number of parked requests.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Start a refresh, or park `request` behind the one already running.
    pub fn begin_or_join(&self, request: ApiRequest) -> RefreshRole<'_> {
        let mut state = self.lock();
        if state.refreshing {
            let (responder, rx) = oneshot::channel();
            tracing::debug!(
                request_id = %request.id(),
                queued = state.pending.len() + 1,
                "refresh in flight, parking request"
            );
            state.pending.push_back(PendingRequest { request, responder });
            return RefreshRole::Follower(rx);
        }
        state.refreshing = true;
        RefreshRole::Leader {
            request,
            guard: RefreshGuard {
                coordinator: self,
                outcome: None,
            },
        }
    }
}

/// Held by the refresh leader. Dropping it drains whatever is still parked
/// and clears the refreshing flag, on every path.
pub struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    outcome: Option<Result<String, RefreshFailure>>,
}

impl RefreshGuard<'_> {
    /// Hand the refresh result to every parked request, oldest first.
    ///
    /// `Ok` carries the new access token. The flag stays set until the guard
    /// is dropped; requests parked in between get the same outcome.
    pub fn resolve(&mut self, outcome: Result<String, RefreshFailure>) {
        let parked = std::mem::take(&mut self.coordinator.lock().pending);
        tracing::debug!(
            parked = parked.len(),
            success = outcome.is_ok(),
            "draining parked requests"
        );
        for pending in parked {
            pending.resolve(&outcome);
        }
        self.outcome = Some(outcome);
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        let parked = {
            let mut state = self.coordinator.lock();
            state.refreshing = false;
            std::mem::take(&mut state.pending)
        };
        if parked.is_empty() {
            return;
        }
        let outcome = self
            .outcome
            .take()
            .unwrap_or_else(|| Err(RefreshFailure::transient("token refresh was abandoned")));
        for pending in parked {
            pending.resolve(&outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn request(path: &str) -> ApiRequest {
        ApiRequest::new(Method::GET, path)
    }

    fn expect_follower(role: RefreshRole<'_>) -> oneshot::Receiver<PendingOutcome> {
        match role {
            RefreshRole::Follower(rx) => rx,
            RefreshRole::Leader { .. } => panic!("expected follower"),
        }
    }

    #[test]
    fn first_caller_leads_and_later_callers_park() {
        let coordinator = RefreshCoordinator::new();
        let RefreshRole::Leader { guard, .. } = coordinator.begin_or_join(request("/a")) else {
            panic!("expected leader");
        };
        assert!(coordinator.is_refreshing());
        let _rx1 = expect_follower(coordinator.begin_or_join(request("/b")));
        let _rx2 = expect_follower(coordinator.begin_or_join(request("/c")));
        assert_eq!(coordinator.pending(), 2);
        drop(guard);
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.pending(), 0);
    }

    #[test]
    fn success_hands_requests_back_in_arrival_order() {
        let coordinator = RefreshCoordinator::new();
        let RefreshRole::Leader { mut guard, .. } = coordinator.begin_or_join(request("/lead"))
        else {
            panic!("expected leader");
        };
        let mut receivers: Vec<_> = ["/1", "/2", "/3"]
            .iter()
            .map(|p| expect_follower(coordinator.begin_or_join(request(p))))
            .collect();

        guard.resolve(Ok("a2".to_string()));
        drop(guard);

        let paths: Vec<String> = receivers
            .iter_mut()
            .map(|rx| {
                let replay = rx.try_recv().unwrap().unwrap();
                assert!(replay.is_retried());
                assert_eq!(replay.bearer.as_deref(), Some("a2"));
                replay.path().to_string()
            })
            .collect();
        assert_eq!(paths, vec!["/1", "/2", "/3"]);
    }

    #[test]
    fn failure_rejects_every_parked_request() {
        let coordinator = RefreshCoordinator::new();
        let RefreshRole::Leader { mut guard, .. } = coordinator.begin_or_join(request("/lead"))
        else {
            panic!("expected leader");
        };
        let mut rx = expect_follower(coordinator.begin_or_join(request("/x")));
        guard.resolve(Err(RefreshFailure::credential("refresh token rejected").with_status(403)));
        let failure = rx.try_recv().unwrap().unwrap_err();
        assert!(failure.is_credential());
        assert_eq!(failure.status, Some(403));
    }

    #[test]
    fn dropped_leader_rejects_parked_requests() {
        let coordinator = RefreshCoordinator::new();
        let role = coordinator.begin_or_join(request("/lead"));
        let mut rx = expect_follower(coordinator.begin_or_join(request("/x")));
        drop(role);
        let failure = rx.try_recv().unwrap().unwrap_err();
        assert_eq!(failure.kind, RefreshFailureKind::Transient);
        assert!(!coordinator.is_refreshing());
    }

    #[test]
    fn request_parked_after_resolve_gets_same_outcome() {
        let coordinator = RefreshCoordinator::new();
        let RefreshRole::Leader { mut guard, .. } = coordinator.begin_or_join(request("/lead"))
        else {
            panic!("expected leader");
        };
        guard.resolve(Ok("a2".to_string()));
        let mut late = expect_follower(coordinator.begin_or_join(request("/late")));
        drop(guard);
        let replay = late.try_recv().unwrap().unwrap();
        assert_eq!(replay.bearer.as_deref(), Some("a2"));
    }

    #[test]
    fn next_refresh_can_start_after_guard_drops() {
        let coordinator = RefreshCoordinator::new();
        drop(coordinator.begin_or_join(request("/one")));
        assert!(matches!(
            coordinator.begin_or_join(request("/two")),
            RefreshRole::Leader { .. }
        ));
    }
}
