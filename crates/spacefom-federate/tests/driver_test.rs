//! Start-up driver tests on a paused tokio clock.
//!
//! Every test runs with `start_paused`, so deadlines and run durations are
//! crossed in virtual time: tokio advances the clock whenever the runtime
//! has nothing else to do.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::{future::pending, time::Duration};

use spacefom_core::{Environment, StartupError};
use spacefom_federate::{
    DriverConfig, ExecutionOutcome, FederateError, FederateRun, LoopbackError, LoopbackRti,
    RunOptions, RunProfile, StartupDriver, profiles::DEFAULT_FEDERATION, run_execution,
};
use tokio::time::Instant;

/// Environment on tokio's clock, which `start_paused` virtualizes.
#[derive(Clone)]
struct PausedEnv;

impl Environment for PausedEnv {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

fn driver_config(timeout_secs: u64) -> DriverConfig {
    DriverConfig { startup_timeout: Duration::from_secs(timeout_secs), ..Default::default() }
}

fn loopback(peers: &[RunProfile]) -> LoopbackRti<PausedEnv> {
    let peers = peers.iter().map(|peer| peer.declare(DEFAULT_FEDERATION).unwrap()).collect();
    LoopbackRti::new(PausedEnv, DEFAULT_FEDERATION, peers)
}

#[tokio::test(start_paused = true)]
async fn full_federation_releases_every_profile() {
    for profile in RunProfile::ALL {
        let mut run = FederateRun::new(profile);
        run.options = RunOptions { run_duration: Some(2.0) };

        let start = Instant::now();
        let (config, outcome) = run.execute(PausedEnv, pending::<()>).await.unwrap();

        assert_eq!(outcome, ExecutionOutcome::Completed);
        assert!(config.inactive_frames().is_empty(), "{profile}: frames left inactive");
        assert!(config.all_frames().all(|frame| frame.is_active()));
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(60), "{profile}: waited for the deadline");
    }
}

#[tokio::test(start_paused = true)]
async fn missing_rrfp_times_out() {
    let mut other = RunProfile::Other.build(DEFAULT_FEDERATION).unwrap();
    let mut rti = loopback(&[RunProfile::Master, RunProfile::Pacing]);
    other.initialize(&mut rti).unwrap();

    let start = Instant::now();
    let mut driver = StartupDriver::new(PausedEnv, rti, driver_config(30));
    let err = driver.run(other, pending()).await.unwrap_err();

    let FederateError::Timeout(timeout) = err else {
        panic!("expected a discovery timeout, got {err}");
    };
    assert_eq!(timeout.missing_federates, vec!["RRFP"]);
    assert_eq!(timeout.inactive_frames, vec!["RootFrame", "FrameA"]);
    assert!(timeout.waited >= Duration::from_secs(30));
    assert!(start.elapsed() >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn late_notifications_still_release() {
    let mut rrfp = RunProfile::Rrfp.build(DEFAULT_FEDERATION).unwrap();
    let mut rti = loopback(&[RunProfile::Master, RunProfile::Pacing, RunProfile::Other])
        .with_delay(Duration::from_secs(5));
    rrfp.initialize(&mut rti).unwrap();

    let start = Instant::now();
    let mut driver = StartupDriver::new(PausedEnv, rti, driver_config(60));
    let rrfp = driver.run(rrfp, pending()).await.unwrap();

    assert!(rrfp.root_frame().unwrap().is_active());
    assert!(start.elapsed() >= Duration::from_secs(5));
    assert!(start.elapsed() < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn operator_shutdown_cancels_start_up() {
    let mut master = RunProfile::Master.build(DEFAULT_FEDERATION).unwrap();
    let mut rti = loopback(&[]);
    master.initialize(&mut rti).unwrap();

    let mut driver = StartupDriver::new(PausedEnv, rti, driver_config(60));
    let err = driver.run(master, tokio::time::sleep(Duration::from_secs(3))).await.unwrap_err();

    assert!(err.is_cancellation(), "expected cancellation, got {err}");
}

#[tokio::test(start_paused = true)]
async fn uninitialized_federate_is_refused() {
    let other = RunProfile::Other.build(DEFAULT_FEDERATION).unwrap();
    let mut driver = StartupDriver::new(PausedEnv, loopback(&[]), driver_config(60));

    let err = driver.run(other, pending()).await.unwrap_err();
    assert!(matches!(err, FederateError::Startup(StartupError::NotInitialized)));
}

#[tokio::test(start_paused = true)]
async fn connection_without_declaration_fails_start_up() {
    // Initialized elsewhere, so this loopback never received the declaration.
    let mut other = RunProfile::Other.build(DEFAULT_FEDERATION).unwrap();
    other.initialize(&mut loopback(&[])).unwrap();

    let mut driver = StartupDriver::new(PausedEnv, loopback(&RunProfile::ALL), driver_config(30));
    let err = driver.run(other, pending()).await.unwrap_err();

    assert!(matches!(err, FederateError::Rti(LoopbackError::NotJoined)), "got {err}");
}

#[tokio::test(start_paused = true)]
async fn seeded_order_releases_the_same_way() {
    for seed in [1, 42, 1234] {
        let mut run = FederateRun::new(RunProfile::Other);
        run.seed = Some(seed);
        run.options = RunOptions { run_duration: Some(1.0) };

        let (config, outcome) = run.execute(PausedEnv, pending::<()>).await.unwrap();
        assert_eq!(outcome, ExecutionOutcome::Completed);
        assert!(config.inactive_frames().is_empty());
    }
}

#[tokio::test(start_paused = true)]
async fn execution_runs_for_the_stop_time() {
    let options = RunOptions::from_flags(Some(10.0), false).unwrap();

    let start = Instant::now();
    let outcome = run_execution(&PausedEnv, &options, pending()).await;

    assert_eq!(outcome, ExecutionOutcome::Completed);
    assert!(start.elapsed() >= Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn nostop_runs_until_interrupted() {
    let options = RunOptions::from_flags(Some(10.0), true).unwrap();

    let start = Instant::now();
    let outcome =
        run_execution(&PausedEnv, &options, tokio::time::sleep(Duration::from_secs(300))).await;

    assert_eq!(outcome, ExecutionOutcome::Interrupted);
    assert!(start.elapsed() >= Duration::from_secs(300));
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_a_bounded_run() {
    let options = RunOptions::default();
    let outcome =
        run_execution(&PausedEnv, &options, tokio::time::sleep(Duration::from_secs(1))).await;
    assert_eq!(outcome, ExecutionOutcome::Interrupted);
}
