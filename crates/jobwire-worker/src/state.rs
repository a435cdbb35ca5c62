use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::identity::JobType;

/// Counters describing what a worker session has seen so far.
///
/// Each counter is updated independently; no invariant spans counters, so a
/// snapshot may observe one increment before another that happened earlier.
#[derive(Debug, Default)]
pub struct WorkerState {
    registered: AtomicU64,
    room: CategoryCounters,
    participant: CategoryCounters,
}

#[derive(Debug, Default)]
struct CategoryCounters {
    availability: AtomicU64,
    jobs: AtomicU64,
}

/// Point-in-time copy of [`WorkerState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStateSnapshot {
    pub registered: u64,
    pub room_availability_count: u64,
    pub room_job_count: u64,
    pub participant_availability_count: u64,
    pub participant_job_count: u64,
}

impl WorkerState {
    pub fn new() -> Self {
        Self::default()
    }

    fn category(&self, job_type: JobType) -> &CategoryCounters {
        match job_type {
            JobType::Room => &self.room,
            JobType::Publisher => &self.participant,
        }
    }

    pub(crate) fn record_register_ack(&self) -> u64 {
        self.registered.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_availability(&self, job_type: JobType) {
        self.category(job_type)
            .availability
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_assignment(&self, job_type: JobType) {
        self.category(job_type).jobs.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of registration acknowledgements received.
    pub fn registered(&self) -> u64 {
        self.registered.load(Ordering::Relaxed)
    }

    /// Availability requests received for `job_type`.
    pub fn availability_count(&self, job_type: JobType) -> u64 {
        self.category(job_type).availability.load(Ordering::Relaxed)
    }

    /// Job assignments received for `job_type`.
    pub fn job_count(&self, job_type: JobType) -> u64 {
        self.category(job_type).jobs.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> WorkerStateSnapshot {
        WorkerStateSnapshot {
            registered: self.registered(),
            room_availability_count: self.availability_count(JobType::Room),
            room_job_count: self.job_count(JobType::Room),
            participant_availability_count: self.availability_count(JobType::Publisher),
            participant_job_count: self.job_count(JobType::Publisher),
        }
    }
}
