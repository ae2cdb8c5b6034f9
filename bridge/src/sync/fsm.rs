//! Finite state machine for manual sync operations

use crate::models::sync::{SyncOperationStatus, SyncProgress};

/// Sync event
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Worker picked the operation up
    Start,

    /// Phase update while running
    Progress(SyncProgress),

    /// Finished successfully
    Complete,

    /// Finished with an error
    Fail(String),
}

/// Sync FSM.
///
/// `pending -> in_progress -> {completed | failed}`. A pending operation may
/// also fail directly (e.g. it could not be queued). Nothing moves backwards
/// and progress percentages never decrease.
#[derive(Debug, Clone)]
pub struct SyncFsm {
    state: SyncOperationStatus,
    percentage: u8,
}

impl SyncFsm {
    /// Create a new FSM in pending state
    pub fn new() -> Self {
        Self {
            state: SyncOperationStatus::Pending,
            percentage: 0,
        }
    }

    /// Resume the FSM from a stored status
    pub fn resume(state: SyncOperationStatus, progress: Option<&SyncProgress>) -> Self {
        Self {
            state,
            percentage: progress.map(|p| p.percentage).unwrap_or(0),
        }
    }

    /// Get current state
    pub fn state(&self) -> SyncOperationStatus {
        self.state
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: &SyncEvent) -> Result<SyncOperationStatus, String> {
        let new_state = match (self.state, event) {
            (SyncOperationStatus::Pending, SyncEvent::Start) => SyncOperationStatus::InProgress,
            (SyncOperationStatus::Pending, SyncEvent::Fail(_)) => SyncOperationStatus::Failed,

            (SyncOperationStatus::InProgress, SyncEvent::Progress(progress)) => {
                if progress.percentage > 100 || progress.percentage < self.percentage {
                    return Err(format!(
                        "Invalid progress: {}% after {}%",
                        progress.percentage, self.percentage
                    ));
                }
                self.percentage = progress.percentage;
                SyncOperationStatus::InProgress
            }
            (SyncOperationStatus::InProgress, SyncEvent::Complete) => {
                SyncOperationStatus::Completed
            }
            (SyncOperationStatus::InProgress, SyncEvent::Fail(_)) => SyncOperationStatus::Failed,

            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(new_state)
    }
}

impl Default for SyncFsm {
    fn default() -> Self {
        Self::new()
    }
}
