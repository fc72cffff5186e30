use std::sync::Arc;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::model::config::GhostConfig;
use crate::model::project::Table;
use crate::model::row::{Record, display_value};

/// Largest batch a single request may ask for
pub const MAX_BATCH: usize = 20;

/// Error type for row generation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error("cannot generate {0} rows at once (max 20)")]
    TooMany(usize),
    #[error("generator failed: {0}")]
    Failed(String),
    #[error("generator stopped without a result")]
    Disconnected,
}

/// Produces candidate rows for review. Implementations may block; they run
/// off the UI thread.
pub trait RowGenerator: Send + Sync {
    fn generate(&self, count: usize) -> Result<Vec<Record>, GenerateError>;

    /// Best guess at how long `generate(count)` takes, for the progress bar
    fn estimated_duration(&self, count: usize) -> Duration;
}

/// Drafts follow-up rows from the titles already in a table.
///
/// Generated rows carry provisional negative ids (`-1`, `-2`, ...) and the
/// table's configured defaults; real ids are assigned when a row is accepted.
#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    title_key: String,
    seeds: Vec<String>,
    defaults: Map<String, Value>,
    latency: Duration,
}

impl TemplateGenerator {
    pub fn new(title_key: &str, seeds: Vec<String>, latency: Duration) -> Self {
        TemplateGenerator {
            title_key: title_key.to_string(),
            seeds,
            defaults: Map::new(),
            latency,
        }
    }

    /// A generator seeded from a table: the first visible column is the
    /// title, list-filterable columns get the most common existing value.
    pub fn for_table(table: &Table, ghost: &GhostConfig) -> Self {
        let title_key = table
            .config
            .columns
            .iter()
            .find(|c| c.visible)
            .map(|c| c.key.clone())
            .unwrap_or_else(|| "name".to_string());
        let seeds = table
            .rows
            .iter()
            .map(|r| display_value(r.get(&title_key)))
            .filter(|s| !s.is_empty())
            .collect();
        let mut generator = Self::new(&title_key, seeds, Duration::from_millis(ghost.duration_ms));
        for column in &table.config.columns {
            if column.key == title_key || column.filterable.is_none() {
                continue;
            }
            if let Some(value) = most_common(&table.rows, &column.key) {
                generator.defaults.insert(column.key.clone(), value);
            }
        }
        generator
    }

    fn draft(&self, index: usize) -> Record {
        let title = match self.seeds.get(index % self.seeds.len().max(1)) {
            Some(seed) => format!("Follow-up: {}", seed),
            None => format!("New item {}", index + 1),
        };
        let mut attrs: Vec<(String, Value)> = self
            .defaults
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        attrs.push((self.title_key.clone(), Value::String(title)));
        Record::new(-(index as i64) - 1, attrs)
    }
}

impl RowGenerator for TemplateGenerator {
    fn generate(&self, count: usize) -> Result<Vec<Record>, GenerateError> {
        if count > MAX_BATCH {
            return Err(GenerateError::TooMany(count));
        }
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        Ok((0..count).map(|i| self.draft(i)).collect())
    }

    fn estimated_duration(&self, count: usize) -> Duration {
        self.latency + Duration::from_millis(50 * count as u64)
    }
}

/// The value that occurs most often in a column, ties to the first seen
fn most_common(rows: &[Record], key: &str) -> Option<Value> {
    let mut counts: indexmap::IndexMap<String, (usize, &Value)> = indexmap::IndexMap::new();
    for row in rows {
        if let Some(value) = row.get(key).filter(|v| !v.is_null()) {
            let entry = counts.entry(display_value(Some(value))).or_insert((0, value));
            entry.0 += 1;
        }
    }
    let mut best: Option<(usize, &Value)> = None;
    for &(count, value) in counts.values() {
        if best.is_none_or(|(n, _)| count > n) {
            best = Some((count, value));
        }
    }
    best.map(|(_, v)| v.clone())
}

/// A generation request running on a background thread.
///
/// The UI loop calls `poll()` each tick; the job has no cancellation, a
/// result nobody wants is simply rejected.
pub struct GenerationJob {
    rx: mpsc::Receiver<Result<Vec<Record>, GenerateError>>,
}

impl GenerationJob {
    pub fn spawn(generator: Arc<dyn RowGenerator>, count: usize) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = generator.generate(count);
            let _ = tx.send(result);
        });
        tracing::debug!(count, "generation job spawned");
        GenerationJob { rx }
    }

    /// Non-blocking check for the result
    pub fn poll(&self) -> Option<Result<Vec<Record>, GenerateError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(GenerateError::Disconnected)),
        }
    }

    /// Block until the generator answers
    pub fn wait(self) -> Result<Vec<Record>, GenerateError> {
        self.rx.recv().unwrap_or(Err(GenerateError::Disconnected))
    }
}
