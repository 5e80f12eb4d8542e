//! Federation start-up scenarios.
//!
//! Each scenario runs the start-up barrier of every member on the simulated
//! clock and ends with oracles over the outcome:
//! - Who released, who timed out, and what they were waiting for
//! - Whether the declarations pass the federation audit

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use spacefom_core::{FederateConfig, FederationConsistencyError, PackingHandle, StartupPhase};
use spacefom_federate::{RunProfile, profiles::DEFAULT_FEDERATION};
use spacefom_harness::{
    Scenario,
    scenario::{all_released, consistent},
};

#[test]
fn reference_federation_starts() {
    let outcome = Scenario::new().oracle(all_released()).oracle(consistent()).run().unwrap();

    assert_eq!(outcome.reports.len(), 4);
    for report in &outcome.reports {
        assert!(report.config.all_frames().all(|frame| frame.is_active()), "{}", report.federate);
        assert_eq!(report.dropped, 0, "{}", report.federate);
    }
}

#[test]
fn missing_rrfp_times_out_everyone_waiting_on_it() {
    let outcome = Scenario::new()
        .without(RunProfile::Rrfp)
        .with_timeout(Duration::from_secs(30))
        .run()
        .unwrap();

    for federate in ["Master", "Pacing", "Other"] {
        let report = outcome.report(federate).unwrap();
        assert_eq!(report.phase, StartupPhase::TimedOut, "{federate}");
        assert!(report.finished_at >= Duration::from_secs(30));

        let timeout = report.timeout.as_ref().unwrap();
        assert!(timeout.inactive_frames.contains(&"RootFrame".to_string()), "{federate}");
    }

    let master = outcome.report("Master").unwrap().timeout.clone().unwrap();
    assert_eq!(master.missing_federates, vec!["RRFP"]);
    let other = outcome.report("Other").unwrap().timeout.clone().unwrap();
    assert_eq!(other.missing_federates, vec!["RRFP"]);
    assert_eq!(other.inactive_frames, vec!["RootFrame", "FrameA"]);
}

#[test]
fn missing_rrfp_is_an_audit_finding() {
    let findings = Scenario::new().without(RunProfile::Rrfp).run().unwrap().findings();

    assert!(findings.contains(&FederationConsistencyError::OrphanSubscription {
        frame: "RootFrame".to_string(),
        subscribers: vec!["Master".to_string(), "Other".to_string(), "Pacing".to_string()],
    }));
    assert!(findings.contains(&FederationConsistencyError::OrphanSubscription {
        frame: "FrameA".to_string(),
        subscribers: vec!["Other".to_string()],
    }));
    assert!(findings.contains(&FederationConsistencyError::MissingRequiredFederate {
        federate: "Master".to_string(),
        missing: "RRFP".to_string(),
    }));
}

#[test]
fn oracle_failure_fails_the_run() {
    let result = Scenario::new().without(RunProfile::Rrfp).oracle(all_released()).run();
    let err = result.unwrap_err();
    assert!(err.contains("Master"), "{err}");
}

#[test]
fn missing_master_blocks_only_those_waiting_on_it() {
    let outcome = Scenario::new().without(RunProfile::Master).run().unwrap();

    assert!(outcome.report("Pacing").unwrap().released());

    for federate in ["RRFP", "Other"] {
        let report = outcome.report(federate).unwrap();
        assert_eq!(report.phase, StartupPhase::TimedOut, "{federate}");
        let timeout = report.timeout.as_ref().unwrap();
        assert_eq!(timeout.missing_federates, vec!["Master"], "{federate}");
        assert!(timeout.inactive_frames.is_empty(), "{federate}");
    }
}

#[test]
fn second_root_publisher_is_flagged() {
    let mut rogue = FederateConfig::new(DEFAULT_FEDERATION, "Rogue");
    rogue.set_rrfp_role(true).unwrap();
    rogue.set_lookahead_time(0.25).unwrap();
    let root = rogue.new_root_frame("RootFrame", PackingHandle::new(9), "rogue.frame_packing");
    rogue.set_root_frame(root).unwrap();

    let outcome = Scenario::new().with_federate(rogue).run().unwrap();

    assert!(outcome.findings().contains(&FederationConsistencyError::DuplicatePublisher {
        frame: "RootFrame".to_string(),
        publishers: vec!["RRFP".to_string(), "Rogue".to_string()],
    }));
    assert!(consistent()(&outcome).is_err());
    assert!(outcome.report("Rogue").unwrap().released());
}

#[test]
fn disabled_federate_neither_joins_nor_waits() {
    let mut pacing = RunProfile::Pacing.build(DEFAULT_FEDERATION).unwrap();
    pacing.set_enabled(false).unwrap();

    let outcome = Scenario::new().without(RunProfile::Pacing).with_federate(pacing).run().unwrap();

    assert!(outcome.report("Pacing").is_none());
    assert_eq!(outcome.declarations.len(), 4);

    let master = outcome.report("Master").unwrap();
    assert_eq!(master.phase, StartupPhase::TimedOut);
    assert_eq!(master.timeout.as_ref().unwrap().missing_federates, vec!["Pacing"]);
}

#[test]
fn invalid_member_fails_the_run() {
    let headless = FederateConfig::new(DEFAULT_FEDERATION, "Headless");
    let err = Scenario::new().with_federate(headless).run().unwrap_err();
    assert!(err.starts_with("Headless"), "{err}");
}

#[test]
fn zero_latency_releases_immediately() {
    let outcome =
        Scenario::new().with_max_latency(Duration::ZERO).oracle(all_released()).run().unwrap();

    for report in &outcome.reports {
        assert_eq!(report.finished_at, Duration::ZERO, "{}", report.federate);
    }
}
