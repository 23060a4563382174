// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A fork/join job system on top of a `rayon` worker pool.
//!
//! Jobs are created inside a [`JobScope`]. A child job signals its parent when
//! it completes, and [`JobScope::run_and_wait`] blocks until every child of a
//! job has completed. Children run with [`RunFlags::DONT_SIGNAL`] are held back
//! and handed to the workers together, the next time the scope signals.

mod job;

pub use job::{Job, JobScope, RunFlags};

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, ThreadId};

/// Errors raised while starting the job system.
#[derive(Debug, thiserror::Error)]
pub enum JobSystemError {
    /// The worker pool could not be created.
    #[error("failed to build the job thread pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

/// Owns the worker pool that executes jobs.
pub struct JobSystem {
    pool: rayon::ThreadPool,
    adopted: Mutex<HashSet<ThreadId>>,
}

impl JobSystem {
    /// Creates a job system.
    ///
    /// ## Arguments
    /// * `threads` - Number of workers, or `None` to use one per logical core.
    pub fn new(threads: Option<usize>) -> Result<Self, JobSystemError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|index| format!("aurora-job-{}", index))
            .build()?;
        log::debug!(
            "Job system started with {} worker(s).",
            pool.current_num_threads()
        );
        Ok(Self {
            pool,
            adopted: Mutex::new(HashSet::new()),
        })
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Opens a scope in which jobs can be created and run.
    ///
    /// The closure runs on the calling thread. Every job started in the scope,
    /// including children still held back by [`RunFlags::DONT_SIGNAL`], has
    /// completed when this returns.
    pub fn scope<'scope, R>(&self, op: impl for<'a> FnOnce(&'a JobScope<'a, 'scope>) -> R) -> R {
        self.pool.in_place_scope(|scope| {
            let jobs = JobScope::new(scope);
            let result = op(&jobs);
            jobs.signal();
            result
        })
    }

    /// Registers the calling thread as a client of the job system.
    pub fn adopt(&self) {
        self.adopted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(thread::current().id());
    }

    /// Detaches the calling thread from the job system.
    pub fn emancipate(&self) {
        self.adopted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&thread::current().id());
    }

    /// Returns `true` if the calling thread is adopted.
    pub fn is_adopted(&self) -> bool {
        self.adopted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&thread::current().id())
    }
}

impl std::fmt::Debug for JobSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSystem")
            .field("threads", &self.thread_count())
            .finish()
    }
}
