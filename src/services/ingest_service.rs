use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::domain::{AdapterResult, InstanceFailure, ItemCore, RunResult, SourceConfig, SourceItem};
use crate::errors::{IngestError, IngestResult};
use crate::sources::{SourceAdapter, SourceRegistry, TimeWindow};

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Upper bound on adapter invocations in flight
    pub max_concurrency: usize,
    /// Deadline for the whole run; None waits for every adapter
    pub run_timeout: Option<Duration>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            run_timeout: Some(Duration::from_secs(300)),
        }
    }
}

type TaskOutput = (usize, usize, IngestResult<Vec<SourceItem>>);
type Slot = Option<IngestResult<Vec<SourceItem>>>;

/// Runs every configured source concurrently and merges the outcomes.
pub struct IngestService {
    registry: SourceRegistry,
    options: ServiceOptions,
}

impl IngestService {
    pub fn new(registry: SourceRegistry, options: ServiceOptions) -> Self {
        Self { registry, options }
    }

    /// Reject a configuration before anything touches the network.
    pub fn validate(&self, config: &IngestConfig) -> IngestResult<()> {
        if config.hours_back == 0 {
            return Err(IngestError::Config(
                "hours_back must be greater than zero".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for source in &config.sources {
            let name = source.name.trim();
            if name.is_empty() {
                return Err(IngestError::Config("source name must not be empty".to_string()));
            }
            if !names.insert(name) {
                return Err(IngestError::Config(format!("duplicate source name '{}'", name)));
            }
            if !source.enabled {
                continue;
            }

            let adapter = self.adapter_for(source)?;
            if source.params.is_empty() {
                return Err(IngestError::InvalidParameter {
                    source_name: name.to_string(),
                    message: "at least one parameter is required".to_string(),
                });
            }
            for param in &source.params {
                if param.trim().is_empty() {
                    return Err(IngestError::InvalidParameter {
                        source_name: name.to_string(),
                        message: "parameters must not be blank".to_string(),
                    });
                }
                adapter
                    .locator(param)
                    .map_err(|e| IngestError::InvalidParameter {
                        source_name: name.to_string(),
                        message: e.to_string(),
                    })?;
            }
        }

        Ok(())
    }

    pub async fn run_all(&self, config: &IngestConfig) -> IngestResult<RunResult> {
        self.run_all_at(config, Utc::now()).await
    }

    /// Same as [`run_all`](Self::run_all) with the window anchored at `now`.
    pub async fn run_all_at(
        &self,
        config: &IngestConfig,
        now: DateTime<Utc>,
    ) -> IngestResult<RunResult> {
        self.validate(config)?;

        for source in config.sources.iter().filter(|s| !s.enabled) {
            info!(source = %source.name, "source disabled, skipping");
        }

        let window = TimeWindow::new(config.hours_back, now);
        let sources: Vec<&SourceConfig> = config.enabled_sources().collect();
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));

        let mut tasks: JoinSet<TaskOutput> = JoinSet::new();
        let mut slots: Vec<Vec<Slot>> = sources
            .iter()
            .map(|s| s.params.iter().map(|_| None).collect())
            .collect();

        for (source_idx, source) in sources.iter().enumerate() {
            let adapter = self.adapter_for(source)?;
            for (param_idx, param) in source.params.iter().enumerate() {
                tasks.spawn(run_instance(
                    Arc::clone(&adapter),
                    source.name.clone(),
                    param.clone(),
                    window,
                    Arc::clone(&semaphore),
                    (source_idx, param_idx),
                ));
            }
        }

        let deadline = self.options.run_timeout;
        let timed_out = match deadline {
            Some(limit) => tokio::time::timeout(limit, drain(&mut tasks, &mut slots))
                .await
                .is_err(),
            None => {
                drain(&mut tasks, &mut slots).await;
                false
            }
        };
        if timed_out {
            warn!(
                pending = tasks.len(),
                "run deadline exceeded, cancelling remaining adapters"
            );
            tasks.abort_all();
        }

        let mut results = BTreeMap::new();
        for (source, source_slots) in sources.iter().zip(slots) {
            let result = merge_source(source, source_slots, || {
                if timed_out {
                    IngestError::Timeout(deadline.unwrap_or_default())
                } else {
                    IngestError::Task("adapter task was cancelled".to_string())
                }
            });

            match &result {
                AdapterResult::Ok { items, failures } => info!(
                    source = %source.name,
                    items = items.len(),
                    failed_params = failures.len(),
                    "source finished"
                ),
                AdapterResult::Failed(detail) => warn!(
                    source = %source.name,
                    kind = %detail.kind,
                    error = %detail.message,
                    "source failed"
                ),
            }
            results.insert(source.name.clone(), result);
        }

        let run = RunResult {
            sources: results,
            hours_back: config.hours_back,
            executed_at: now,
        };
        info!(
            sources = run.sources.len(),
            items = run.total_items(),
            failed = run.failed_sources().len(),
            "ingestion run complete"
        );

        Ok(run)
    }

    fn adapter_for(&self, source: &SourceConfig) -> IngestResult<Arc<dyn SourceAdapter>> {
        self.registry.find(source.kind).ok_or_else(|| {
            IngestError::Config(format!(
                "no adapter registered for kind '{}' (source '{}')",
                source.kind, source.name
            ))
        })
    }
}

async fn run_instance(
    adapter: Arc<dyn SourceAdapter>,
    source: String,
    param: String,
    window: TimeWindow,
    semaphore: Arc<Semaphore>,
    (source_idx, param_idx): (usize, usize),
) -> TaskOutput {
    let result = async {
        let _permit = semaphore
            .acquire_owned()
            .await
            .map_err(|e| IngestError::Task(e.to_string()))?;

        info!(source = %source, parameter = %param, "adapter started");
        let items = AssertUnwindSafe(adapter.run(&param, &window))
            .catch_unwind()
            .await
            .map_err(|panic| IngestError::Task(panic_message(panic)))??;
        info!(source = %source, parameter = %param, items = items.len(), "adapter finished");

        Ok::<_, IngestError>(items)
    }
    .await;

    (source_idx, param_idx, result)
}

async fn drain(tasks: &mut JoinSet<TaskOutput>, slots: &mut [Vec<Slot>]) {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((source_idx, param_idx, result)) => slots[source_idx][param_idx] = Some(result),
            Err(e) => warn!(error = %e, "adapter task did not complete"),
        }
    }
}

// Parameter order decides item order and which failure is reported first.
fn merge_source<F>(source: &SourceConfig, slots: Vec<Slot>, unfinished: F) -> AdapterResult
where
    F: Fn() -> IngestError,
{
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut failures = Vec::new();
    let mut succeeded = false;

    for (param, slot) in source.params.iter().zip(slots) {
        match slot.unwrap_or_else(|| Err(unfinished())) {
            Ok(batch) => {
                succeeded = true;
                for item in batch {
                    if seen.insert(item.external_id().to_string()) {
                        items.push(item);
                    }
                }
            }
            Err(e) => {
                warn!(
                    source = %source.name,
                    parameter = %param,
                    kind = %e.kind(),
                    error = %e,
                    "adapter failed"
                );
                failures.push(InstanceFailure::from_error(param.as_str(), &e));
            }
        }
    }

    if succeeded {
        AdapterResult::Ok { items, failures }
    } else {
        AdapterResult::failed(failures)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("adapter panicked: {}", detail)
}
