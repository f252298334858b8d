// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-observer reconciliation of push updates into a local view.
//!
//! A [`StopObserver`] seeds itself from a snapshot, merges incoming
//! envelopes one at a time in arrival order, and notifies subscribers
//! exactly once per applied envelope. Merge application is serialized per
//! subject: the observer owns its view and is driven from a single task, so
//! two envelopes for the same stop are never merged concurrently.
//!
//! Optimistic local mutations overlay the confirmed view tentatively. On a
//! rejected request the overlay rolls back to the last confirmed envelope's
//! state; on success the server's own envelope, carrying the true assigned
//! version, supersedes the guess.

use crate::envelope::{StopPatch, UpdateEnvelope};
use crate::error::ReconcileError;
use crate::merge::{MergeOutcome, StopView, apply_stop_patch};
use crate::version::Version;
use lastmile_domain::Stop;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Transport health as seen by one observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionHealth {
    /// Envelopes are flowing; the view is current.
    Live,
    /// The connection is down. The last known state is shown, marked
    /// possibly stale, and incoming envelopes are discarded until the
    /// observer rebaselines from a fresh snapshot.
    Degraded,
}

/// Reconciliation client for a single stop.
pub struct StopObserver {
    confirmed: StopView,
    /// Pending local mutation, overlaid on the confirmed view until the
    /// server confirms or rejects it.
    pending: Option<StopPatch>,
    health: ConnectionHealth,
    subscribers: Vec<mpsc::UnboundedSender<Stop>>,
}

impl StopObserver {
    /// Seeds an observer from a snapshot obtained via a synchronous fetch.
    ///
    /// The snapshot's version is the baseline: any envelope at or below it
    /// is stale.
    #[must_use]
    pub const fn new(snapshot: Stop, version: Version) -> Self {
        Self {
            confirmed: StopView::new(snapshot, version),
            pending: None,
            health: ConnectionHealth::Live,
            subscribers: Vec::new(),
        }
    }

    /// Subscribes to view changes.
    ///
    /// The receiver gets one message per applied envelope and per optimistic
    /// overlay change. No batching: coalescing could hide a transition from
    /// the presentation layer.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Stop> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Returns the view the presentation layer should render: the confirmed
    /// state with any pending optimistic mutation overlaid.
    #[must_use]
    pub fn current(&self) -> Stop {
        match &self.pending {
            Some(patch) => {
                let mut view: Stop = self.confirmed.stop.clone();
                apply_stop_patch(&mut view, patch);
                view
            }
            None => self.confirmed.stop.clone(),
        }
    }

    /// Returns the version of the last applied envelope or snapshot.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.confirmed.version
    }

    /// Returns the observer's connection health.
    #[must_use]
    pub const fn health(&self) -> ConnectionHealth {
        self.health
    }

    /// Offers an incoming envelope to the observer.
    ///
    /// While degraded, envelopes are discarded outright: they may postdate a
    /// gap, and applying them over a stale base would corrupt the view. The
    /// reconnect path refetches a snapshot instead.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError` if the envelope belongs to another subject.
    pub fn apply_envelope(
        &mut self,
        envelope: &UpdateEnvelope,
    ) -> Result<MergeOutcome, ReconcileError> {
        if self.health == ConnectionHealth::Degraded {
            debug!(subject = %envelope.subject, "Dropping envelope while degraded");
            return Ok(MergeOutcome::Stale);
        }

        let outcome = self.confirmed.merge(envelope)?;
        if outcome == MergeOutcome::Applied {
            self.notify();
        }
        Ok(outcome)
    }

    /// Overlays a tentative local mutation on the view.
    ///
    /// Subscribers are notified so the actor sees their action immediately.
    pub fn apply_optimistic(&mut self, patch: StopPatch) {
        self.pending = Some(patch);
        self.notify();
    }

    /// Clears the optimistic overlay after the server accepted the
    /// mutation.
    ///
    /// No notification: the server's own envelope carries the authoritative
    /// state and notifies when it arrives.
    pub fn confirm_optimistic(&mut self) {
        self.pending = None;
    }

    /// Rolls the view back to the last confirmed state after the server
    /// rejected the mutation.
    pub fn rollback_optimistic(&mut self) {
        if self.pending.take().is_some() {
            self.notify();
        }
    }

    /// Marks the connection lost. The current view remains visible but is
    /// possibly stale.
    pub fn mark_disconnected(&mut self) {
        self.health = ConnectionHealth::Degraded;
    }

    /// Rebaselines from a freshly fetched snapshot after a reconnect.
    ///
    /// Any envelopes buffered during the outage must have been discarded by
    /// the caller; processing resumes only from this snapshot's version. A
    /// pending optimistic mutation from before the outage is dropped, since
    /// its fate is unknown.
    pub fn resume_from_snapshot(&mut self, snapshot: Stop, version: Version) {
        self.confirmed = StopView::new(snapshot, version);
        self.pending = None;
        self.health = ConnectionHealth::Live;
        self.notify();
    }

    fn notify(&mut self) {
        let view: Stop = self.current();
        // Closed receivers are pruned as they are discovered.
        self.subscribers.retain(|tx| tx.send(view.clone()).is_ok());
    }
}

/// Bounded exponential backoff for reconnect attempts.
///
/// Push delivery remains authoritative; this only schedules the pull that
/// fills the gap after an outage. Every successful reconnect must be
/// followed by a snapshot refetch before envelope processing resumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    base: Duration,
    cap: Duration,
    attempt: u32,
}

impl ReconnectPolicy {
    /// Creates a policy with the given base delay and cap.
    #[must_use]
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            attempt: 0,
        }
    }

    /// Returns the delay before the next reconnect attempt and advances the
    /// attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let exponent: u32 = self.attempt.min(16);
        self.attempt = self.attempt.saturating_add(1);
        let factor: u32 = 1_u32 << exponent;
        self.base.saturating_mul(factor).min(self.cap)
    }

    /// Resets the counter after a successful reconnect.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Returns the number of attempts made since the last reset.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempt
    }
}
