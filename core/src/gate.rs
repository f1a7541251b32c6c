//! Identity gate: a rendezvous between the scan loop and the rotation handler.
//!
//! The loop only waits on the gate. Closing it hands out a [`RotationTicket`],
//! and that ticket is the only way back out of the closed state, so the handler
//! that closed the gate for a timeout is the one that reopens it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Open,
    Closed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("identity rotation failed: {0}")]
    RotationFailed(String),
}

#[derive(Debug)]
struct Shared {
    state: watch::Sender<GateState>,
    rotations: AtomicU64,
}

#[derive(Debug, Clone)]
pub struct IdentityGate {
    shared: Arc<Shared>,
}

impl Default for IdentityGate {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(GateState::Open);
        IdentityGate { shared: Arc::new(Shared { state, rotations: AtomicU64::new(0) }) }
    }

    /// Suspend until the gate is open. Errors if a rotation failed.
    pub async fn wait_open(&self) -> Result<(), GateError> {
        let mut rx = self.shared.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let state = match rx.wait_for(|s| *s != GateState::Closed).await {
            Ok(s) => s.clone(),
            Err(_) => return Err(GateError::RotationFailed("gate dropped".into())),
        };
        match state {
            GateState::Failed(reason) => Err(GateError::RotationFailed(reason)),
            _ => Ok(()),
        }
    }

    /// OPEN -> CLOSED. The ticket must be reopened or failed by the rotation handler.
    pub fn close(&self) -> RotationTicket {
        self.shared.state.send_modify(|s| {
            debug_assert_eq!(*s, GateState::Open, "gate closed twice");
            *s = GateState::Closed;
        });
        RotationTicket { shared: Some(self.shared.clone()) }
    }

    pub fn state(&self) -> GateState {
        self.shared.state.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        *self.shared.state.borrow() == GateState::Open
    }

    /// Number of completed CLOSED -> OPEN transitions.
    pub fn rotations(&self) -> u64 {
        self.shared.rotations.load(Ordering::SeqCst)
    }
}

/// Capability to leave the CLOSED state, held by whoever closed the gate.
/// Dropping it unused fails the gate instead of leaving waiters stuck.
#[derive(Debug)]
#[must_use = "a closed gate stays closed until the ticket is reopened or failed"]
pub struct RotationTicket {
    shared: Option<Arc<Shared>>,
}

impl RotationTicket {
    pub fn reopen(mut self) {
        if let Some(shared) = self.shared.take() {
            shared.rotations.fetch_add(1, Ordering::SeqCst);
            shared.state.send_replace(GateState::Open);
        }
    }

    pub fn fail(mut self, reason: impl Into<String>) {
        if let Some(shared) = self.shared.take() {
            shared.state.send_replace(GateState::Failed(reason.into()));
        }
    }
}

impl Drop for RotationTicket {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.state.send_replace(GateState::Failed("rotation abandoned".into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn open_gate_does_not_block() {
        let gate = IdentityGate::new();
        assert!(gate.is_open());
        gate.wait_open().await.unwrap();
    }

    #[tokio::test]
    async fn waiter_resumes_on_reopen() {
        let gate = IdentityGate::new();
        let ticket = gate.close();
        assert_eq!(gate.state(), GateState::Closed);

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_open().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        ticket.reopen();
        waiter.await.unwrap().unwrap();
        assert!(gate.is_open());
        assert_eq!(gate.rotations(), 1);
    }

    #[tokio::test]
    async fn reopen_before_wait_is_not_missed() {
        let gate = IdentityGate::new();
        gate.close().reopen();
        tokio::time::timeout(Duration::from_millis(100), gate.wait_open())
            .await
            .expect("no missed wakeup")
            .unwrap();
    }

    #[tokio::test]
    async fn failed_rotation_escalates() {
        let gate = IdentityGate::new();
        gate.close().fail("auth rejected");
        let err = gate.wait_open().await.unwrap_err();
        assert_eq!(err, GateError::RotationFailed("auth rejected".into()));
        assert_eq!(gate.rotations(), 0);
    }

    #[tokio::test]
    async fn dropped_ticket_fails_gate() {
        let gate = IdentityGate::new();
        drop(gate.close());
        assert!(matches!(gate.state(), GateState::Failed(_)));
        assert!(gate.wait_open().await.is_err());
    }
}
