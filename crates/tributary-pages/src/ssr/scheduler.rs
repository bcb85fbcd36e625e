//! Async resolution scheduler.
//!
//! Every pending job is started the moment it is submitted: the job future
//! is polled once in place, and if it is not finished yet it is spawned onto
//! a [`JoinSet`]. Jobs do not wait on each other; outcomes are yielded in
//! completion order.
//!
//! Panics inside a job are caught and reported as a dependency error for its
//! placeholder. Dropping the scheduler aborts all running jobs.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::task::noop_waker;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tributary_core::{Node, RenderError, Result};

use super::boundary::PlaceholderId;
use super::renderer::{JobQueue, PendingJob, unblock};

/// Settled result of one pending job.
#[derive(Debug)]
pub struct JobOutcome {
	/// Placeholder the job belongs to.
	pub id: PlaceholderId,
	/// Unblocked subtree, ready for synchronous rendering, or the failure.
	pub result: Result<Node>,
}

/// Drives pending jobs to completion.
pub struct Scheduler {
	tasks: JoinSet<JobOutcome>,
	ready: VecDeque<JobOutcome>,
	job_timeout: Option<Duration>,
	cancel: CancellationToken,
	submitted: usize,
}

impl std::fmt::Debug for Scheduler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Scheduler")
			.field("running", &self.tasks.len())
			.field("ready", &self.ready.len())
			.field("job_timeout", &self.job_timeout)
			.field("submitted", &self.submitted)
			.finish()
	}
}

impl Scheduler {
	/// Creates a scheduler that stops when `cancel` fires.
	///
	/// Must be used from within a tokio runtime.
	pub fn new(job_timeout: Option<Duration>, cancel: CancellationToken) -> Self {
		Self {
			tasks: JoinSet::new(),
			ready: VecDeque::new(),
			job_timeout,
			cancel,
			submitted: 0,
		}
	}

	/// Number of jobs submitted so far.
	pub fn submitted(&self) -> usize {
		self.submitted
	}

	/// Returns `true` when no job is running or waiting to be collected.
	pub fn is_idle(&self) -> bool {
		self.ready.is_empty() && self.tasks.is_empty()
	}

	/// Takes every outcome that is already available without waiting.
	pub fn drain_ready(&mut self) -> Vec<JobOutcome> {
		let mut outcomes: Vec<JobOutcome> = self.ready.drain(..).collect();
		while let Some(joined) = self.tasks.try_join_next() {
			match joined {
				Ok(outcome) => outcomes.push(outcome),
				Err(err) => warn!(error = %err, "pending job aborted"),
			}
		}
		outcomes
	}

	/// Waits for the next outcome in completion order.
	///
	/// Returns `None` once every job has settled, or as soon as the
	/// cancellation token fires; in the latter case running jobs are aborted.
	pub async fn next(&mut self) -> Option<JobOutcome> {
		if self.cancel.is_cancelled() {
			self.shutdown();
			return None;
		}
		if let Some(outcome) = self.ready.pop_front() {
			return Some(outcome);
		}
		loop {
			tokio::select! {
				biased;
				() = self.cancel.cancelled() => {
					self.shutdown();
					return None;
				}
				joined = self.tasks.join_next() => match joined {
					None => return None,
					Some(Ok(outcome)) => return Some(outcome),
					Some(Err(err)) => warn!(error = %err, "pending job aborted"),
				},
			}
		}
	}

	/// Aborts every running job and discards collected outcomes.
	pub fn shutdown(&mut self) {
		if !self.tasks.is_empty() {
			debug!(running = self.tasks.len(), "aborting pending jobs");
		}
		drop(std::mem::take(&mut self.tasks));
		self.ready.clear();
	}
}

impl JobQueue for Scheduler {
	fn submit(&mut self, job: PendingJob) {
		let PendingJob { id, child } = job;
		self.submitted += 1;
		let mut task = job_future(id, child, self.job_timeout);

		let waker = noop_waker();
		let mut cx = Context::from_waker(&waker);
		match task.poll_unpin(&mut cx) {
			Poll::Ready(outcome) => {
				debug!(placeholder = %id, "pending job settled on submission");
				self.ready.push_back(outcome);
			}
			Poll::Pending => {
				debug!(placeholder = %id, "pending job spawned");
				self.tasks.spawn(task);
			}
		}
	}
}

fn job_future(
	id: PlaceholderId,
	child: Node,
	job_timeout: Option<Duration>,
) -> BoxFuture<'static, JobOutcome> {
	async move {
		let work = async move {
			match job_timeout {
				Some(limit) => tokio::time::timeout(limit, unblock(child))
					.await
					.unwrap_or(Err(RenderError::Timeout(limit))),
				None => unblock(child).await,
			}
		};
		let result = AssertUnwindSafe(work)
			.catch_unwind()
			.await
			.unwrap_or_else(|panic| Err(RenderError::dependency(panic_message(&*panic))));
		JobOutcome { id, result }
	}
	.boxed()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
	if let Some(msg) = panic.downcast_ref::<&str>() {
		format!("job panicked: {msg}")
	} else if let Some(msg) = panic.downcast_ref::<String>() {
		format!("job panicked: {msg}")
	} else {
		"job panicked".to_string()
	}
}
