//! Shared fake collaborators for unit tests
//!
//! Fakes record every interaction so tests can assert on idempotence,
//! credential distribution and command construction without touching real
//! processes or a real platform.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mariadb_operator::controller::{Context, UnitStatus};
use mariadb_operator::exec::{CommandRunner, Exec, ExecError, ExecOutput};
use mariadb_operator::resources::ServicePlan;
use mariadb_operator::workload::{
    ImageDescriptor, ImageSource, RelationStore, ServiceState, StatusSink, Workload, WorkloadError,
};

/// Workload fake with combine semantics: applying a plan equal to the last
/// applied one does not count as an effective change.
#[derive(Default)]
pub struct FakeWorkload {
    pub applied: Mutex<Vec<ServicePlan>>,
    pub effective_changes: Mutex<u32>,
    last: Mutex<Option<ServicePlan>>,
    pub autostarts: Mutex<u32>,
    pub started: Mutex<Vec<String>>,
    pub stopped: Mutex<Vec<String>>,
    /// Scripted responses for `service_status`; empty queue means NotFound
    pub status_script: Mutex<VecDeque<Result<ServiceState, WorkloadError>>>,
    pub fail_apply: Mutex<Option<WorkloadError>>,
}

impl FakeWorkload {
    pub fn push_status(&self, result: Result<ServiceState, WorkloadError>) {
        self.status_script.lock().unwrap().push_back(result);
    }

    pub fn effective_changes(&self) -> u32 {
        *self.effective_changes.lock().unwrap()
    }

    pub fn applied_count(&self) -> usize {
        self.applied.lock().unwrap().len()
    }

    pub fn last_applied(&self) -> Option<ServicePlan> {
        self.applied.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Workload for FakeWorkload {
    async fn apply_plan(&self, plan: &ServicePlan) -> Result<(), WorkloadError> {
        if let Some(err) = self.fail_apply.lock().unwrap().clone() {
            return Err(err);
        }
        self.applied.lock().unwrap().push(plan.clone());
        let mut last = self.last.lock().unwrap();
        if last.as_ref() != Some(plan) {
            *self.effective_changes.lock().unwrap() += 1;
            *last = Some(plan.clone());
        }
        Ok(())
    }

    async fn autostart(&self) -> Result<(), WorkloadError> {
        *self.autostarts.lock().unwrap() += 1;
        Ok(())
    }

    async fn service_status(&self, name: &str) -> Result<ServiceState, WorkloadError> {
        self.status_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(WorkloadError::NotFound(name.to_string())))
    }

    async fn start_service(&self, name: &str) -> Result<(), WorkloadError> {
        self.started.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn stop_service(&self, name: &str) -> Result<(), WorkloadError> {
        self.stopped.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

pub struct FakeImageSource {
    pub result: Mutex<Result<ImageDescriptor, WorkloadError>>,
}

impl FakeImageSource {
    pub fn available() -> Self {
        Self {
            result: Mutex::new(Ok(ImageDescriptor {
                image_path: "registry.example.com/mariadb:10.11".to_string(),
                username: None,
                password: None,
            })),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Mutex::new(Err(WorkloadError::Unavailable(reason.to_string()))),
        }
    }
}

#[async_trait]
impl ImageSource for FakeImageSource {
    async fn fetch(&self) -> Result<ImageDescriptor, WorkloadError> {
        self.result.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct FakeRelationStore {
    pub data: Mutex<BTreeMap<(u32, String), String>>,
    pub writes: Mutex<u32>,
}

impl FakeRelationStore {
    pub fn get(&self, relation_id: u32, key: &str) -> Option<String> {
        self.data
            .lock()
            .unwrap()
            .get(&(relation_id, key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl RelationStore for FakeRelationStore {
    async fn set(&self, relation_id: u32, key: &str, value: &str) -> Result<(), WorkloadError> {
        self.data
            .lock()
            .unwrap()
            .insert((relation_id, key.to_string()), value.to_string());
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeStatusSink {
    pub statuses: Mutex<Vec<UnitStatus>>,
}

impl FakeStatusSink {
    pub fn history(&self) -> Vec<UnitStatus> {
        self.statuses.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusSink for FakeStatusSink {
    async fn set_status(&self, status: &UnitStatus) -> Result<(), WorkloadError> {
        self.statuses.lock().unwrap().push(status.clone());
        Ok(())
    }
}

/// Scripted command runner: records every invocation and replays queued
/// outputs (success with empty output once the queue is empty).
#[derive(Default)]
pub struct ScriptedRunner {
    pub calls: Mutex<Vec<Exec>>,
    pub outputs: Mutex<VecDeque<Result<ExecOutput, ExecError>>>,
    /// Emulate mysqldump writing its `--result-file` target
    pub touch_result_file: bool,
}

impl ScriptedRunner {
    pub fn emulating_mysqldump() -> Self {
        Self {
            touch_result_file: true,
            ..Self::default()
        }
    }

    pub fn push_output(&self, output: Result<ExecOutput, ExecError>) {
        self.outputs.lock().unwrap().push_back(output);
    }

    pub fn recorded_calls(&self) -> Vec<Exec> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, exec: &Exec) -> Result<ExecOutput, ExecError> {
        self.calls.lock().unwrap().push(exec.clone());

        if self.touch_result_file
            && exec.program == "mysqldump"
            && let Some(pos) = exec.args.iter().position(|a| a == "--result-file")
            && let Some(path) = exec.args.get(pos + 1)
        {
            std::fs::write(path, "-- fake dump\n").unwrap();
        }

        self.outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ExecOutput::default()))
    }
}

/// Bundle of fakes wired into a controller context
pub struct Fakes {
    pub workload: Arc<FakeWorkload>,
    pub image: Arc<FakeImageSource>,
    pub relations: Arc<FakeRelationStore>,
    pub status: Arc<FakeStatusSink>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            workload: Arc::new(FakeWorkload::default()),
            image: Arc::new(FakeImageSource::available()),
            relations: Arc::new(FakeRelationStore::default()),
            status: Arc::new(FakeStatusSink::default()),
        }
    }

    pub fn with_image(image: FakeImageSource) -> Self {
        Self {
            image: Arc::new(image),
            ..Self::new()
        }
    }

    pub fn context(&self) -> Context {
        Context {
            workload: self.workload.clone(),
            image: self.image.clone(),
            relations: self.relations.clone(),
            status: self.status.clone(),
        }
    }
}
