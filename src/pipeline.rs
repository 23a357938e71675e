//! One aggregation run: plan ranges, start readers and workers, merge.

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::aggregate::{self, Aggregator};
use crate::config::Config;
use crate::distributor;
use crate::error::{BrcError, Result};
use crate::format::Summary;
use crate::planner;
use crate::reader::ChunkReader;
use crate::worker;

/// Cooperative stop flag shared by every thread of a run.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Owns the settings and stop flag of a run. Nothing is global, so several
/// pipelines can run side by side.
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    stop: StopToken,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config: config.normalized(),
            stop: StopToken::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle for stopping the run from another thread. Readers finish their
    /// current block, queued batches are drained, and the run returns
    /// [`BrcError::Cancelled`]. A stopped pipeline stays stopped.
    pub fn stop_handle(&self) -> StopToken {
        self.stop.clone()
    }

    /// Aggregates `input` and returns the sorted result.
    pub fn run(&self, input: &Path) -> Result<Summary> {
        let started = Instant::now();
        let file = File::open(input).map_err(|source| BrcError::InputNotFound {
            path: input.to_path_buf(),
            source,
        })?;
        let ranges = planner::plan_file(&file, self.config.readers)?;
        drop(file);
        log::info!(
            "{} ranges, {} workers, block size {}",
            ranges.len(),
            self.config.workers,
            self.config.block_size
        );

        let (producer, consumer) = distributor::channel(self.config.queue_capacity);
        let (maps, failure) = thread::scope(|s| -> Result<_> {
            let mut workers = Vec::with_capacity(self.config.workers);
            for id in 0..self.config.workers {
                let consumer = consumer.clone();
                let stop = &self.stop;
                let handle = thread::Builder::new()
                    .name(format!("brc-worker-{id}"))
                    .spawn_scoped(s, move || {
                        let result = worker::consume(consumer);
                        match &result {
                            Ok((_, records)) => log::debug!("worker {id} folded {records} records"),
                            Err(_) => stop.stop(),
                        }
                        result.map(|(agg, _)| agg)
                    })?;
                workers.push(handle);
            }
            drop(consumer);

            let mut readers = Vec::with_capacity(ranges.len());
            for (id, range) in ranges.iter().copied().enumerate() {
                let mut producer = producer.clone();
                let stop = &self.stop;
                let config = &self.config;
                let handle = thread::Builder::new()
                    .name(format!("brc-reader-{id}"))
                    .spawn_scoped(s, move || {
                        let result = ChunkReader::open(
                            input,
                            range,
                            config.block_size,
                            config.max_buffer,
                        )
                        .and_then(|reader| reader.run(&mut producer, stop));
                        match &result {
                            Ok(stats) => log::debug!(
                                "reader {id} sent {} bytes in {} batches",
                                stats.bytes,
                                stats.batches
                            ),
                            Err(_) => stop.stop(),
                        }
                        result
                    })?;
                readers.push(handle);
            }
            drop(producer);

            let mut failure = None;
            for handle in readers {
                if let Err(e) = join(handle) {
                    failure.get_or_insert(e);
                }
            }
            let mut maps = Vec::with_capacity(workers.len());
            for handle in workers {
                match join(handle) {
                    Ok(map) => maps.push(map),
                    Err(e) => {
                        failure.get_or_insert(e);
                    }
                }
            }
            Ok((maps, failure))
        })?;
        log::info!("read and parsed in {:?}", started.elapsed());

        if let Some(e) = failure {
            return Err(e);
        }
        if self.stop.is_stopped() {
            return Err(BrcError::Cancelled);
        }

        let merged = merge(maps);
        let summary = Summary::from(merged);
        log::info!("{} names in {:?}", summary.len(), started.elapsed());
        Ok(summary)
    }

    /// Aggregates `input` and atomically writes the rendered result to
    /// `output`. Nothing is written when the run fails.
    pub fn run_to_file(&self, input: &Path, output: &Path) -> Result<Summary> {
        let summary = self.run(input)?;
        let started = Instant::now();
        summary.write_file(output)?;
        log::info!("wrote {} in {:?}", output.display(), started.elapsed());
        Ok(summary)
    }
}

fn merge(maps: Vec<Aggregator>) -> Aggregator {
    let started = Instant::now();
    let merged = aggregate::merge_all(maps);
    log::info!("merged in {:?}", started.elapsed());
    merged
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    match handle.join() {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Aggregates `input` with default settings and writes the result to `output`.
pub fn run(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<()> {
    Pipeline::default().run_to_file(input.as_ref(), output.as_ref())?;
    Ok(())
}
