//! RTI connection seam and an in-process loopback RTI.
//!
//! `RtiConnection` is where a real RTI binding would plug in. The workspace
//! ships `LoopbackRti`, which plays the rest of the federation from a set of
//! peer declarations: once the local federate submits its declaration, the
//! loopback announces every peer joining and confirms each local frame that
//! the federation can satisfy.

use std::{collections::VecDeque, time::Duration};

use async_trait::async_trait;
use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use spacefom_core::{Environment, FederateDeclaration, FederationRuntime, RuntimeEvent};
use thiserror::Error;

use crate::error::FederateError;

/// Federation notification delivered by an RTI connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FederationEvent {
    /// A federate joined the federation execution.
    FederateJoined {
        /// Federate name.
        name: String,
    },
    /// A published frame was discovered.
    FrameDiscovered {
        /// Frame name.
        name: String,
    },
    /// A subscribed frame was matched to its publisher.
    SubscriptionMatched {
        /// Frame name.
        name: String,
    },
}

impl FederationEvent {
    /// Convert into a start-up session event.
    pub fn into_runtime_event<I>(self) -> RuntimeEvent<I> {
        match self {
            Self::FederateJoined { name } => RuntimeEvent::FederateJoined { name },
            Self::FrameDiscovered { name } => RuntimeEvent::FrameDiscovered { name },
            Self::SubscriptionMatched { name } => RuntimeEvent::SubscriptionMatched { name },
        }
    }
}

/// Source of federation notifications.
#[async_trait]
pub trait RtiConnection: Send {
    /// Wait for the next notification.
    ///
    /// Returns `Ok(None)` once the connection will deliver nothing more.
    /// Implementations must be cancel-safe: dropping the future before it
    /// completes must not lose an event.
    async fn next_event(&mut self) -> Result<Option<FederationEvent>, FederateError>;
}

/// Errors from the loopback RTI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoopbackError {
    /// A declaration was already submitted through this connection.
    #[error("federate {federate} already submitted a declaration")]
    AlreadySubmitted {
        /// The federate that submitted first.
        federate: String,
    },

    /// The declaration names another federation execution.
    #[error("declaration targets federation {found}, loopback serves {expected}")]
    FederationMismatch {
        /// Federation the loopback emulates.
        expected: String,
        /// Federation named by the declaration.
        found: String,
    },

    /// Notifications were requested before a declaration was submitted.
    #[error("no declaration submitted, federate has not joined")]
    NotJoined,
}

/// In-process stand-in for the rest of the federation.
pub struct LoopbackRti<E: Environment> {
    env: E,
    federation: String,
    peers: Vec<FederateDeclaration>,
    delay: Duration,
    seed: Option<u64>,
    submitted: Option<String>,
    pending: VecDeque<FederationEvent>,
    next_due: Option<E::Instant>,
}

impl<E: Environment> LoopbackRti<E> {
    /// Emulate `federation` populated by `peers`.
    pub fn new(env: E, federation: impl Into<String>, peers: Vec<FederateDeclaration>) -> Self {
        Self {
            env,
            federation: federation.into(),
            peers,
            delay: Duration::ZERO,
            seed: None,
            submitted: None,
            pending: VecDeque::new(),
            next_due: None,
        }
    }

    /// Wait `delay` before delivering each notification.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Deliver notifications in an order shuffled by `seed`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Notifications not yet delivered.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn plan(&self, local: &FederateDeclaration) -> Vec<FederationEvent> {
        let mut events: Vec<FederationEvent> = std::iter::once(&local.federate)
            .chain(self.peers.iter().map(|peer| &peer.federate))
            .map(|name| FederationEvent::FederateJoined { name: name.clone() })
            .collect();

        for frame in local.all_frames() {
            if frame.publishes() {
                events.push(FederationEvent::FrameDiscovered { name: frame.name.clone() });
                continue;
            }

            let published = self
                .peers
                .iter()
                .filter(|peer| peer.enabled)
                .filter_map(|peer| peer.frame(&frame.name))
                .any(|peer_frame| peer_frame.publishes());
            if published {
                events.push(FederationEvent::SubscriptionMatched { name: frame.name.clone() });
            } else {
                tracing::debug!(frame = %frame.name, "no publisher in loopback federation");
            }
        }

        if let Some(seed) = self.seed {
            events.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
        }
        events
    }
}

impl<E: Environment> FederationRuntime for LoopbackRti<E> {
    type Error = LoopbackError;

    fn submit(&mut self, declaration: &FederateDeclaration) -> Result<(), Self::Error> {
        if let Some(federate) = &self.submitted {
            return Err(LoopbackError::AlreadySubmitted { federate: federate.clone() });
        }
        if declaration.federation != self.federation {
            return Err(LoopbackError::FederationMismatch {
                expected: self.federation.clone(),
                found: declaration.federation.clone(),
            });
        }

        let events = self.plan(declaration);
        tracing::info!(
            federate = %declaration.federate,
            peers = self.peers.len(),
            notifications = events.len(),
            "loopback RTI accepted declaration"
        );
        self.pending.extend(events);
        self.submitted = Some(declaration.federate.clone());
        Ok(())
    }
}

#[async_trait]
impl<E: Environment> RtiConnection for LoopbackRti<E> {
    async fn next_event(&mut self) -> Result<Option<FederationEvent>, FederateError> {
        if self.submitted.is_none() {
            return Err(LoopbackError::NotJoined.into());
        }
        if self.pending.is_empty() {
            return Ok(None);
        }
        if !self.delay.is_zero() {
            // The due time survives a dropped future so the delay is not restarted.
            let now = self.env.now();
            let due = *self.next_due.get_or_insert(now + self.delay);
            if due > now {
                self.env.sleep(due - now).await;
            }
            self.next_due = None;
        }
        Ok(self.pending.pop_front())
    }
}
