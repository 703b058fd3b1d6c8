//! Job bookkeeping for background parsing/normalization runs.
//!
//! The external task executor owns scheduling; this crate only records
//! status/progress/result through an injected [`JobStore`] so no global
//! mutable registry leaks into the core. Cancellation is cooperative: the
//! runner checks a shared flag between requirements, so a stopped job leaves
//! a valid partial state (some requirements normalized, others untouched).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::JobStatus;

/// One background job: parsing or normalization of a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub job_type: String,
    pub status: JobStatus,
    pub progress: f32,
    pub error: Option<String>,
    pub result: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

impl Job {
    pub fn new(job_type: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: job_type.to_string(),
            status: JobStatus::Queued,
            progress: 0.0,
            error: None,
            result: None,
            created_at: chrono::Utc::now().naive_utc(),
            completed_at: None,
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.error = None;
        self.progress = 0.0;
    }

    pub fn complete(&mut self, result: serde_json::Value) {
        self.status = JobStatus::Completed;
        self.progress = 1.0;
        self.result = Some(result);
        self.completed_at = Some(chrono::Utc::now().naive_utc());
    }

    pub fn fail(&mut self, error: String) {
        self.status = JobStatus::Failed;
        self.error = Some(error);
        self.completed_at = Some(chrono::Utc::now().naive_utc());
    }

    pub fn cancel(&mut self) {
        self.status = JobStatus::Cancelled;
        self.completed_at = Some(chrono::Utc::now().naive_utc());
    }
}

/// Injected job registry: create/get/update.
///
/// The core never assumes a storage shape — callers may back this with
/// memory, SQLite, or anything else that can hold a [`Job`].
pub trait JobStore: Send + Sync {
    fn create(&self, job_type: &str) -> Job;

    fn get(&self, id: &Uuid) -> Option<Job>;

    fn update(&self, job: &Job);
}

/// In-memory job store, suitable for a single-process deployment.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn create(&self, job_type: &str) -> Job {
        let job = Job::new(job_type);
        self.jobs
            .lock()
            .expect("job store poisoned")
            .insert(job.id, job.clone());
        job
    }

    fn get(&self, id: &Uuid) -> Option<Job> {
        self.jobs.lock().expect("job store poisoned").get(id).cloned()
    }

    fn update(&self, job: &Job) {
        self.jobs
            .lock()
            .expect("job store poisoned")
            .insert(job.id, job.clone());
    }
}

/// Cooperative cancellation flag shared between the job runner and the
/// surface that requested the job.
#[derive(Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
