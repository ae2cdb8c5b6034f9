//! Sync FSM tests

use argobridge::models::sync::{SyncOperationStatus, SyncProgress};
use argobridge::sync::fsm::{SyncEvent, SyncFsm};

fn progress(percentage: u8) -> SyncEvent {
    SyncEvent::Progress(SyncProgress {
        phase: "Syncing".to_string(),
        message: "Applying resources".to_string(),
        percentage,
    })
}

#[test]
fn test_fsm_initial_state() {
    let fsm = SyncFsm::new();
    assert_eq!(fsm.state(), SyncOperationStatus::Pending);
    assert!(!fsm.state().is_terminal());
}

#[test]
fn test_fsm_failure_flow() {
    let mut fsm = SyncFsm::new();
    fsm.process(&SyncEvent::Start).unwrap();
    fsm.process(&progress(50)).unwrap();
    fsm.process(&SyncEvent::Fail("hook failed".to_string()))
        .unwrap();

    assert_eq!(fsm.state(), SyncOperationStatus::Failed);
    assert!(fsm.state().is_terminal());
}

#[test]
fn test_fsm_pending_can_fail_directly() {
    let mut fsm = SyncFsm::new();
    fsm.process(&SyncEvent::Fail("queue closed".to_string()))
        .unwrap();
    assert_eq!(fsm.state(), SyncOperationStatus::Failed);
}

#[test]
fn test_fsm_terminal_states_are_final() {
    let mut fsm = SyncFsm::new();
    fsm.process(&SyncEvent::Start).unwrap();
    fsm.process(&SyncEvent::Complete).unwrap();

    assert!(fsm.process(&SyncEvent::Start).is_err());
    assert!(fsm.process(&progress(100)).is_err());
    assert!(fsm.process(&SyncEvent::Fail("late".to_string())).is_err());
    assert_eq!(fsm.state(), SyncOperationStatus::Completed);
}

#[test]
fn test_fsm_progress_is_monotonic() {
    let mut fsm = SyncFsm::new();
    fsm.process(&SyncEvent::Start).unwrap();
    fsm.process(&progress(50)).unwrap();
    fsm.process(&progress(50)).unwrap();

    assert!(fsm.process(&progress(20)).is_err());
    assert!(fsm.process(&progress(101)).is_err());
    assert_eq!(fsm.state(), SyncOperationStatus::InProgress);
}

#[test]
fn test_fsm_resume_keeps_percentage() {
    let stored = SyncProgress {
        phase: "Waiting".to_string(),
        message: String::new(),
        percentage: 80,
    };
    let mut fsm = SyncFsm::resume(SyncOperationStatus::InProgress, Some(&stored));
    assert!(fsm.process(&progress(50)).is_err());
    fsm.process(&progress(100)).unwrap();
}

#[test]
fn test_fsm_progress_before_start_rejected() {
    let mut fsm = SyncFsm::new();
    assert!(fsm.process(&progress(20)).is_err());
    assert!(fsm.process(&SyncEvent::Complete).is_err());
    assert_eq!(fsm.state(), SyncOperationStatus::Pending);
}
