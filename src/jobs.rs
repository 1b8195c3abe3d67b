// src/jobs.rs

//! Background simulation jobs with pollable status.
//!
//! Each submitted job runs on its own thread. Its record lives in a single
//! mutex-guarded map, and every update (progress, completion, failure) is one
//! locked write, so readers never see a half-updated record. A run that panics
//! is recorded as a failed job. Jobs are kept in memory only.

use crate::error::SimError;
use crate::simulation::config::SimulationConfig;
use crate::simulation::engine::{run_single, TimeseriesRow};
use crate::simulation::kpi::Kpis;
use crate::simulation::monte_carlo::{MonteCarloRunner, MonteCarloSummary};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Running,
    Complete,
    Error,
}

/// Payload of a finished job.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobOutput {
    Single {
        kpis: Kpis,
        timeseries: Vec<TimeseriesRow>,
        config: SimulationConfig,
    },
    MonteCarlo {
        summary: MonteCarloSummary,
        config: SimulationConfig,
    },
}

/// Snapshot of a job as seen by a poller.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub job_id: Uuid,
    pub status: JobState,
    pub progress: f64,
    /// Unix epoch milliseconds
    pub created_at: u64,
    pub finished_at: Option<u64>,
    pub result: Option<JobOutput>,
    pub error: Option<String>,
}

type JobMap = HashMap<Uuid, JobStatus>;

/// In-memory registry of simulation jobs keyed by id.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<Mutex<JobMap>>,
    parallel: bool,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run Monte Carlo jobs on the rayon pool.
    pub fn with_parallel_replications(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Registers a job and starts it in the background.
    ///
    /// One replication runs a single trajectory; more run a Monte Carlo study.
    pub fn submit(&self, config: SimulationConfig, replications: usize) -> JobStatus {
        self.spawn_job(replications, move |registry, job_id| {
            registry.execute(job_id, &config, replications)
        })
    }

    fn spawn_job<F>(&self, replications: usize, work: F) -> JobStatus
    where
        F: FnOnce(&JobRegistry, Uuid) -> Result<JobOutput, SimError> + Send + 'static,
    {
        let job_id = Uuid::new_v4();
        let status = JobStatus {
            job_id,
            status: JobState::Running,
            progress: 0.0,
            created_at: now_ms(),
            finished_at: None,
            result: None,
            error: None,
        };
        lock(&self.jobs).insert(job_id, status.clone());
        info!(%job_id, replications, "job submitted");

        let registry = self.clone();
        thread::spawn(move || {
            // A panic inside the run still has to leave the job in a terminal state
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| work(&registry, job_id))) {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(payload) => Err(format!("job panicked: {}", panic_message(payload.as_ref()))),
            };
            registry.update(job_id, |job| {
                job.finished_at = Some(now_ms());
                match outcome {
                    Ok(output) => {
                        job.status = JobState::Complete;
                        job.progress = 1.0;
                        job.result = Some(output);
                    }
                    Err(e) => {
                        warn!(%job_id, error = %e, "job failed");
                        job.status = JobState::Error;
                        job.error = Some(e);
                    }
                }
            });
        });

        status
    }

    fn execute(
        &self,
        job_id: Uuid,
        config: &SimulationConfig,
        replications: usize,
    ) -> Result<JobOutput, SimError> {
        if replications == 1 {
            let result = run_single(config)?;
            return Ok(JobOutput::Single {
                kpis: result.kpis,
                timeseries: result.timeseries,
                config: result.config,
            });
        }

        let progress = |p: f64| self.update(job_id, |job| job.progress = p);
        let result = MonteCarloRunner::new(replications)
            .parallel(self.parallel)
            .run(config, Some(&progress))?;
        Ok(JobOutput::MonteCarlo {
            summary: result.summary,
            config: result.config,
        })
    }

    /// Current snapshot of a job, if it exists.
    pub fn get(&self, job_id: &Uuid) -> Option<JobStatus> {
        lock(&self.jobs).get(job_id).cloned()
    }

    /// Polls until the job leaves `Running`. `None` for an unknown id.
    pub fn wait(&self, job_id: &Uuid, poll_interval: Duration) -> Option<JobStatus> {
        loop {
            let status = self.get(job_id)?;
            if status.status != JobState::Running {
                return Some(status);
            }
            thread::sleep(poll_interval);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.jobs).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update<F: FnOnce(&mut JobStatus)>(&self, job_id: Uuid, apply: F) {
        if let Some(job) = lock(&self.jobs).get_mut(&job_id) {
            apply(job);
        }
    }
}

// Poisoning is recovered; job threads only mutate records through `update`
fn lock(jobs: &Mutex<JobMap>) -> MutexGuard<'_, JobMap> {
    jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_millis(5);

    fn config() -> SimulationConfig {
        SimulationConfig {
            days: 30,
            demand_lambda_per_day: 15.0,
            reorder_point_store: 80,
            order_up_to_store: 160,
            reorder_point_dc: 200,
            order_up_to_dc: 400,
            initial_on_hand_store: 120,
            initial_on_hand_dc: 300,
            lead_time_mean_days: 7.0,
            lead_time_std_days: 2.0,
            seed: Some(123),
            ..Default::default()
        }
    }

    #[test]
    fn single_job_completes_with_trajectory() {
        let registry = JobRegistry::new();
        let started = registry.submit(config(), 1);
        assert_eq!(started.status, JobState::Running);
        assert_eq!(started.progress, 0.0);

        let done = registry.wait(&started.job_id, POLL).unwrap();
        assert_eq!(done.status, JobState::Complete);
        assert_eq!(done.progress, 1.0);
        assert!(done.finished_at.is_some());
        match done.result {
            Some(JobOutput::Single { timeseries, .. }) => assert_eq!(timeseries.len(), 30),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn monte_carlo_job_reports_summary() {
        let registry = JobRegistry::new().with_parallel_replications(true);
        let started = registry.submit(config(), 5);

        let done = registry.wait(&started.job_id, POLL).unwrap();
        assert_eq!(done.status, JobState::Complete);
        match done.result {
            Some(JobOutput::MonteCarlo { summary, .. }) => assert_eq!(summary.replications, 5),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn invalid_config_marks_job_failed() {
        let registry = JobRegistry::new();
        let bad = SimulationConfig {
            reorder_point_store: 500,
            order_up_to_store: 100,
            ..config()
        };
        let started = registry.submit(bad, 3);

        let done = registry.wait(&started.job_id, POLL).unwrap();
        assert_eq!(done.status, JobState::Error);
        assert!(done.result.is_none());
        assert!(done.error.unwrap().contains("s = 500"));
    }

    #[test]
    fn panicking_job_is_marked_failed() {
        let registry = JobRegistry::new();
        let started = registry.spawn_job(1, |_, _| panic!("replication exploded"));

        let done = registry.wait(&started.job_id, POLL).unwrap();
        assert_eq!(done.status, JobState::Error);
        assert!(done.finished_at.is_some());
        assert!(done.result.is_none());
        assert!(done.error.unwrap().contains("replication exploded"));
    }

    #[test]
    fn registry_keeps_serving_after_a_panicked_job() {
        let registry = JobRegistry::new();
        let failed = registry.spawn_job(1, |_, _| panic!("{}", String::from("boom")));
        registry.wait(&failed.job_id, POLL).unwrap();

        let started = registry.submit(config(), 1);
        let done = registry.wait(&started.job_id, POLL).unwrap();
        assert_eq!(done.status, JobState::Complete);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn oversized_study_fails_instead_of_hanging() {
        let registry = JobRegistry::new();
        let started = registry.submit(config(), usize::MAX);

        let done = registry.wait(&started.job_id, POLL).unwrap();
        assert_eq!(done.status, JobState::Error);
        assert!(done.error.unwrap().contains("replications"));
    }

    #[test]
    fn unknown_job_is_none() {
        let registry = JobRegistry::new();
        assert!(registry.get(&Uuid::new_v4()).is_none());
        assert!(registry.wait(&Uuid::new_v4(), POLL).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn payload_serializes_with_type_tag() {
        let registry = JobRegistry::new();
        let started = registry.submit(config(), 2);
        let done = registry.wait(&started.job_id, POLL).unwrap();

        let json = serde_json::to_value(&done).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["result"]["type"], "monte_carlo");
        assert!(json["result"]["summary"]["kpi_mean"]["service_level"].is_number());
    }
}
