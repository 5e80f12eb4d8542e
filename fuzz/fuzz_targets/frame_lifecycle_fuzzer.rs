//! Fuzz target for the [`ReferenceFrameObject`] lifecycle
//!
//! Prevent a frame from going live without the runtime confirmation that
//! matches its direction.
//!
//! # Strategy
//!
//! - Operation sequences: Arbitrary registrations and confirmations, in any
//!   order, on a publisher or a subscriber
//! - Direction probing: Discovery on subscribers, matches on publishers
//!
//! # Invariants
//!
//! - `Configured → Registered → Active` is the only path
//! - No transition FROM `Active` (terminal invariant)
//! - A confirmation through the wrong direction MUST reject and leave the
//!   state unchanged
//! - A rejected operation NEVER changes the state
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spacefom_core::{
    Confirmation, Direction, FrameError, FrameState, PackingHandle, ReferenceFrameObject,
};

#[derive(Debug, Clone, Arbitrary)]
enum FrameOp {
    Register,
    Discover,
    MatchSubscription,
    ToggleDebug,
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    publishes: bool,
    packing: u64,
    ops: Vec<FrameOp>,
}

fuzz_target!(|input: FuzzInput| {
    let mut frame = ReferenceFrameObject::new(
        input.publishes,
        "FuzzFrame",
        PackingHandle::new(input.packing),
        "fuzz.frame_packing",
    );
    let direction = if input.publishes { Direction::Publish } else { Direction::Subscribe };
    assert_eq!(frame.direction(), direction);
    assert_eq!(frame.state(), FrameState::Configured);

    for op in input.ops {
        let before = frame.state();

        let result = match op {
            FrameOp::Register => frame.mark_registered(),
            FrameOp::Discover => frame.confirm(Confirmation::Discovery),
            FrameOp::MatchSubscription => frame.confirm(Confirmation::SubscriptionMatch),
            FrameOp::ToggleDebug => {
                frame.set_debug(!frame.debug());
                Ok(())
            },
        };
        let after = frame.state();

        match result {
            Ok(()) => match (before, after) {
                (FrameState::Configured, FrameState::Registered) => {
                    assert!(matches!(op, FrameOp::Register));
                },
                (FrameState::Registered, FrameState::Active) => {
                    let confirmation = match op {
                        FrameOp::Discover => Confirmation::Discovery,
                        FrameOp::MatchSubscription => Confirmation::SubscriptionMatch,
                        _ => panic!("{op:?} activated a frame"),
                    };
                    assert_eq!(confirmation.applies_to(), direction);
                },
                (unchanged, same) if unchanged == same => {
                    assert!(matches!(op, FrameOp::ToggleDebug));
                },
                (from, to) => panic!("illegal transition {from} -> {to} via {op:?}"),
            },
            Err(err) => {
                assert_eq!(before, after, "{op:?} failed but moved the frame");
                if let FrameError::DirectionMismatch { direction: declared, confirmation, .. } = err
                {
                    assert_eq!(declared, direction);
                    assert_ne!(confirmation.applies_to(), direction);
                }
            },
        }

        if before == FrameState::Active {
            assert_eq!(after, FrameState::Active, "ACTIVE must be terminal");
        }
        assert_eq!(frame.is_active(), after == FrameState::Active);
    }
});
