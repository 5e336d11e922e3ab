//! Worker pool draining the package queue.
//!
//! Each worker owns one processor (in production: a [`PackageParser`] with
//! its own interpreter child) and pulls indices from a shared bounded
//! queue. Reports go out through the mutex-serialized sink. URLs already
//! present in the completed set are skipped before any processing, which
//! is what makes reruns over an existing sink cheap.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use crate::agent::AgentStats;
use crate::package::{PackageParser, PackageReport};
use crate::sink::ReportSink;

/// Seam between the pool and package processing, so pool behavior is
/// testable without network or an R installation.
pub trait PackageProcessor: Send {
    fn process(&mut self, url: &str) -> PackageReport;

    fn stats(&self) -> AgentStats {
        AgentStats::default()
    }
}

impl PackageProcessor for PackageParser {
    fn process(&mut self, url: &str) -> PackageReport {
        self.process_url(url)
    }

    fn stats(&self) -> AgentStats {
        PackageParser::stats(self)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PoolSummary {
    pub processed: u64,
    pub skipped: u64,
    pub stats: AgentStats,
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("all workers exited before the queue drained")]
    WorkersGone,
}

/// Run `urls` through `workers` parallel processors, writing one report
/// per non-skipped URL into `sink`.
pub fn run_pool<P, F>(
    urls: &[String],
    completed: &HashSet<String>,
    sink: &ReportSink,
    workers: usize,
    make_processor: F,
) -> Result<PoolSummary, PoolError>
where
    P: PackageProcessor,
    F: Fn() -> P + Send + Sync,
{
    let workers = workers.max(1);
    let (feed, queue) = mpsc::sync_channel::<usize>(workers);
    let queue = Arc::new(Mutex::new(queue));
    let started = Instant::now();

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let make_processor = &make_processor;
            handles.push(scope.spawn(move || {
                let mut processor = make_processor();
                let mut local = PoolSummary::default();
                loop {
                    // Hold the queue lock only for the receive itself.
                    let next = {
                        let Ok(guard) = queue.lock() else { break };
                        guard.recv()
                    };
                    let Ok(index) = next else { break };
                    let url = urls[index].as_str();
                    if completed.contains(url) {
                        local.skipped += 1;
                        continue;
                    }
                    let report = processor.process(url);
                    if let Err(err) = sink.write(&report) {
                        log::error!("could not write report for {url}: {err}");
                    }
                    local.processed += 1;
                }
                local.stats = processor.stats();
                local
            }));
        }

        let total = urls.len();
        for index in 0..total {
            if feed.send(index).is_err() {
                return Err(PoolError::WorkersGone);
            }
            let queued = index + 1;
            let eta = started.elapsed() / queued as u32 * (total - queued) as u32;
            log::info!(
                "queued {queued}/{total} ({:.1}%) eta {:.0?}",
                queued as f64 / total as f64 * 100.0,
                eta
            );
        }
        drop(feed);

        let mut summary = PoolSummary::default();
        for handle in handles {
            if let Ok(local) = handle.join() {
                summary.processed += local.processed;
                summary.skipped += local.skipped;
                summary.stats.add(&local.stats);
            }
        }
        Ok(summary)
    })
}
