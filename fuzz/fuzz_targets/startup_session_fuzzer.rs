//! Fuzz target for the [`StartupSession`] barrier
//!
//! Prevent a federate from entering the time loop early.
//!
//! # Strategy
//!
//! - Event sequences: Arbitrary joins, confirmations, ticks and shutdowns
//! - Name probing: Known, unknown and optional federates, unknown frames
//! - Timeout testing: Advance time to cross the deadline
//!
//! # Invariants
//!
//! - `BeginExecution` ONLY when every required federate joined and every
//!   frame is ACTIVE
//! - No transition FROM a terminal phase
//! - A timeout reports exactly what was missing
//! - NEVER panic on unexpected names

#![no_main]

use std::{convert::Infallible, ops::Sub, time::Duration};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spacefom_core::{
    FederateConfig, FederateDeclaration, FederationRuntime, PackingHandle, ReferenceFrameObject,
    RuntimeEvent, StartupAction, StartupPhase, StartupSession, TerminateCause,
};

/// Represents time as Duration since epoch 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FuzzInstant(Duration);

impl Sub for FuzzInstant {
    type Output = Duration;

    fn sub(self, other: Self) -> Duration {
        self.0.saturating_sub(other.0)
    }
}

const FEDERATES: [&str; 5] = ["Master", "Pacing", "RRFP", "Other", "Stranger"];
const FRAMES: [&str; 3] = ["RootFrame", "FrameA", "Nowhere"];
const TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Arbitrary)]
enum SessionEvent {
    Join { federate: u8 },
    Discover { frame: u8 },
    MatchSubscription { frame: u8 },
    Tick { advance_secs: u8 },
    Shutdown,
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    initial_time_secs: u32,
    root_published: bool,
    frame_published: bool,
    events: Vec<SessionEvent>,
}

struct Accepting;

impl FederationRuntime for Accepting {
    type Error = Infallible;

    fn submit(&mut self, _declaration: &FederateDeclaration) -> Result<(), Self::Error> {
        Ok(())
    }
}

fn config(root_published: bool, frame_published: bool) -> Option<FederateConfig> {
    let mut config = FederateConfig::new("SpaceFOM_Roles_Test", "Other");
    for name in ["Other", "Master", "RRFP"] {
        config.add_known_federate(true, name).ok()?;
    }
    config.add_known_federate(false, "Pacing").ok()?;

    let root =
        ReferenceFrameObject::new(root_published, "RootFrame", PackingHandle::new(1), "root");
    config.set_root_frame(root).ok()?;
    let frame_a =
        ReferenceFrameObject::new(frame_published, "FrameA", PackingHandle::new(2), "frame_a");
    config.add_fed_object(frame_a).ok()?;

    config.initialize(&mut Accepting).ok()?;
    Some(config)
}

fuzz_target!(|input: FuzzInput| {
    let Some(config) = config(input.root_published, input.frame_published) else {
        return;
    };

    let start = FuzzInstant(Duration::from_secs(u64::from(input.initial_time_secs)));
    let Ok(mut session) = StartupSession::new(config, start, TIMEOUT) else {
        panic!("initialized configuration refused");
    };
    let mut now = start;

    for event in input.events {
        let before = session.phase();
        let event = match event {
            SessionEvent::Join { federate } => RuntimeEvent::FederateJoined {
                name: FEDERATES[usize::from(federate) % FEDERATES.len()].to_string(),
            },
            SessionEvent::Discover { frame } => RuntimeEvent::FrameDiscovered {
                name: FRAMES[usize::from(frame) % FRAMES.len()].to_string(),
            },
            SessionEvent::MatchSubscription { frame } => RuntimeEvent::SubscriptionMatched {
                name: FRAMES[usize::from(frame) % FRAMES.len()].to_string(),
            },
            SessionEvent::Tick { advance_secs } => {
                now = FuzzInstant(now.0 + Duration::from_secs(u64::from(advance_secs % 120)));
                RuntimeEvent::Tick { now }
            },
            SessionEvent::Shutdown => RuntimeEvent::Shutdown { reason: "fuzz".to_string() },
        };

        let actions = match session.handle(event) {
            Ok(actions) => actions,
            Err(_) => {
                assert_eq!(session.phase(), before, "error moved the session");
                continue;
            },
        };

        if before.is_terminal() {
            assert!(actions.is_empty(), "terminal phase {before} produced actions");
            assert_eq!(session.phase(), before, "left terminal phase {before}");
            continue;
        }

        for action in actions {
            match action {
                StartupAction::BeginExecution => {
                    assert_eq!(session.phase(), StartupPhase::Ready);
                    assert!(session.missing_federates().is_empty());
                    assert!(session.config().inactive_frames().is_empty());
                },
                StartupAction::Terminate { cause: TerminateCause::DiscoveryTimeout(e) } => {
                    assert_eq!(session.phase(), StartupPhase::TimedOut);
                    assert!(e.waited >= TIMEOUT);
                    assert_eq!(e.missing_federates, session.missing_federates());
                    assert_eq!(e.inactive_frames, session.config().inactive_frames());
                    assert!(!session.is_satisfied());
                },
                StartupAction::Terminate { cause: TerminateCause::Cancelled { .. } } => {
                    assert_eq!(session.phase(), StartupPhase::Cancelled);
                },
            }
        }

        assert!(!session.missing_federates().iter().any(|name| name == "Pacing"));
    }
});
