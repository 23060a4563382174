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

use std::cell::RefCell;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

type Task<'scope> = Box<dyn FnOnce() + Send + 'scope>;

/// Options for [`JobScope::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunFlags(u8);

impl RunFlags {
    /// Hand the job to the workers immediately.
    pub const NONE: Self = Self(0);
    /// Hold the job back until the scope next signals the workers.
    pub const DONT_SIGNAL: Self = Self(1);

    /// Returns `true` if every flag in `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for RunFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Number of unfinished children of a job.
#[derive(Debug, Default)]
struct Counter {
    running: Mutex<usize>,
    done: Condvar,
}

impl Counter {
    fn increment(&self) {
        *self.running.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn decrement(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        *running -= 1;
        if *running == 0 {
            self.done.notify_all();
        }
    }

    fn wait(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        while *running > 0 {
            running = self
                .done
                .wait(running)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Signals the parent when a child finishes, even if the child panicked.
struct Completion(Option<Arc<Counter>>);

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(parent) = self.0.take() {
            parent.decrement();
        }
    }
}

/// A unit of work, optionally attached to a parent job.
pub struct Job<'scope> {
    work: Option<Task<'scope>>,
    children: Arc<Counter>,
    parent: Option<Arc<Counter>>,
}

impl<'scope> Job<'scope> {
    fn into_task(self) -> Task<'scope> {
        let Job { work, parent, .. } = self;
        Box::new(move || {
            let _completion = Completion(parent);
            if let Some(work) = work {
                work();
            }
        })
    }
}

impl std::fmt::Debug for Job<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("has_work", &self.work.is_some())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// The region in which jobs are created and executed.
///
/// Obtained from [`super::JobSystem::scope`]. Jobs may borrow anything that
/// outlives the scope.
pub struct JobScope<'a, 'scope> {
    scope: &'a rayon::Scope<'scope>,
    held_back: RefCell<Vec<Task<'scope>>>,
}

impl<'a, 'scope> JobScope<'a, 'scope> {
    pub(super) fn new(scope: &'a rayon::Scope<'scope>) -> Self {
        Self {
            scope,
            held_back: RefCell::new(Vec::new()),
        }
    }

    /// Creates an empty job, typically used as a parent.
    pub fn create_job(&self) -> Job<'scope> {
        Job {
            work: None,
            children: Arc::default(),
            parent: None,
        }
    }

    /// Creates a job running `work`.
    pub fn create_job_with(&self, work: impl FnOnce() + Send + 'scope) -> Job<'scope> {
        Job {
            work: Some(Box::new(work)),
            children: Arc::default(),
            parent: None,
        }
    }

    /// Creates a job running `work` that `parent` will wait for.
    pub fn create_child(
        &self,
        parent: &Job<'scope>,
        work: impl FnOnce() + Send + 'scope,
    ) -> Job<'scope> {
        parent.children.increment();
        Job {
            work: Some(Box::new(work)),
            children: Arc::default(),
            parent: Some(Arc::clone(&parent.children)),
        }
    }

    /// Schedules `job` on the workers.
    pub fn run(&self, job: Job<'scope>, flags: RunFlags) {
        let task = job.into_task();
        if flags.contains(RunFlags::DONT_SIGNAL) {
            self.held_back.borrow_mut().push(task);
        } else {
            self.signal();
            self.scope.spawn(move |_| task());
        }
    }

    /// Hands every held back job to the workers.
    pub fn signal(&self) {
        let tasks: Vec<Task<'scope>> = self.held_back.borrow_mut().drain(..).collect();
        for task in tasks {
            self.scope.spawn(move |_| task());
        }
    }

    /// Runs `job` on the calling thread and waits for all of its children.
    pub fn run_and_wait(&self, job: Job<'scope>) {
        self.signal();
        let children = Arc::clone(&job.children);
        job.into_task()();
        children.wait();
    }
}
