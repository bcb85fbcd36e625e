//! Streaming render orchestration.
//!
//! [`StreamingRenderer::render`] performs the synchronous walk of a tree and
//! decides the response: either a committed shell ([`RenderOutcome::Shell`])
//! or a substituted error document ([`RenderOutcome::Failed`]). Nothing is
//! written before that decision, so a failing shell never leaks partial bytes.
//!
//! A committed [`ShellStream`] is then driven by [`ShellStream::run`], which
//! writes the shell and one patch per settled job, in completion order,
//! until every job (including boundaries nested inside resolved jobs) has
//! settled or the render is cancelled.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::DropGuard;
use tracing::{debug, error, warn};
use tributary_core::{Node, RenderError, Result};

use super::boundary::{BoundaryManager, PlaceholderId};
use super::controller::{RenderController, RenderEvent, RenderPhase};
use super::protocol::{INLINE_ERROR_FRAGMENT, error_document, inject_bootstrap_scripts, reconstruct};
use super::renderer::{JobQueue, PendingJob, SyncRenderer};
use super::scheduler::{JobOutcome, Scheduler};
use super::sink::{ChannelWriter, ChunkWriter, RecordingWriter, SinkError, StreamSink};

/// What happens to a placeholder whose job fails after the shell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamErrorPolicy {
	/// No patch is sent; the fallback stays visible.
	#[default]
	KeepFallback,
	/// An inline error fragment replaces the fallback.
	InlineError,
}

/// Options for streaming renders.
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
	/// Bound after which a pending job is forced into the stream-error path.
	pub job_timeout: Option<Duration>,
	/// Handling of failed jobs after the shell.
	pub error_policy: StreamErrorPolicy,
	/// Client bootstrap modules appended to the shell.
	pub bootstrap_scripts: Vec<String>,
	/// Whether shell error documents include the error message.
	pub expose_errors: bool,
}

impl StreamOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the pending job timeout.
	pub fn job_timeout(mut self, timeout: Duration) -> Self {
		self.job_timeout = Some(timeout);
		self
	}

	/// Sets the stream error policy.
	pub fn error_policy(mut self, policy: StreamErrorPolicy) -> Self {
		self.error_policy = policy;
		self
	}

	/// Adds a client bootstrap module.
	pub fn bootstrap_script(mut self, src: impl Into<String>) -> Self {
		self.bootstrap_scripts.push(src.into());
		self
	}

	/// Includes error messages in shell error documents.
	pub fn expose_errors(mut self, expose: bool) -> Self {
		self.expose_errors = expose;
		self
	}
}

/// A shell that could not be produced.
#[derive(Debug)]
pub struct ShellFailure {
	/// The error that aborted the shell.
	pub error: RenderError,
	/// The error document to send instead, with a failure status.
	pub document: String,
}

/// Result of the shell decision.
#[derive(Debug)]
pub enum RenderOutcome {
	/// The shell is committed and ready to stream.
	Shell(ShellStream),
	/// The shell failed; send the error document.
	Failed(ShellFailure),
	/// The receiving side went away before the shell was committed.
	Cancelled,
}

/// Counters describing a finished stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamReport {
	/// Patches written.
	pub patches: usize,
	/// Jobs that ended in a stream error.
	pub stream_errors: usize,
	/// Whether the stream was cut short by cancellation or a transport failure.
	pub cancelled: bool,
}

/// The streaming renderer.
#[derive(Debug, Clone, Default)]
pub struct StreamingRenderer {
	options: StreamOptions,
}

impl StreamingRenderer {
	/// Creates a renderer with default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a renderer with custom options.
	pub fn with_options(options: StreamOptions) -> Self {
		Self { options }
	}

	/// Returns the options.
	pub fn options(&self) -> &StreamOptions {
		&self.options
	}

	/// Walks `root` and decides the shell.
	///
	/// Pending jobs start running during the walk. Jobs that already settled
	/// when the walk ends are part of the shell decision: a failure is a shell
	/// error, a success becomes the first patch after the shell.
	///
	/// Must be called from within a tokio runtime.
	pub fn render(&self, root: Node, controller: RenderController) -> RenderOutcome {
		if controller.is_cancelled() {
			controller.notify(RenderEvent::Disconnected);
			return RenderOutcome::Cancelled;
		}

		let mut boundaries = BoundaryManager::new();
		let mut scheduler = Scheduler::new(self.options.job_timeout, controller.token().child_token());

		let shell = match SyncRenderer::new(&mut boundaries).render_into(root, &mut scheduler) {
			Ok(html) => html,
			Err(error) => return self.fail(error, &controller),
		};

		let mut early = Vec::new();
		for JobOutcome { id, result } in scheduler.drain_ready() {
			match result {
				Ok(node) => early.push((id, node)),
				Err(error) => {
					error!(placeholder = %id, kind = error.kind(), error = %error, "pending job failed before the shell");
					return self.fail(error, &controller);
				}
			}
		}

		if controller.is_cancelled() {
			controller.notify(RenderEvent::Disconnected);
			return RenderOutcome::Cancelled;
		}

		controller.notify(RenderEvent::ShellReady);
		debug!(
			placeholders = boundaries.allocated(),
			settled = early.len(),
			"shell committed"
		);

		RenderOutcome::Shell(ShellStream {
			shell: inject_bootstrap_scripts(shell, &self.options.bootstrap_scripts),
			early,
			boundaries,
			scheduler,
			controller,
			policy: self.options.error_policy,
		})
	}

	/// Builds the failure outcome for a shell error.
	pub fn fail(&self, error: RenderError, controller: &RenderController) -> RenderOutcome {
		controller.notify(RenderEvent::ShellError);
		error!(kind = error.kind(), error = %error, "shell error");
		let detail = self.options.expose_errors.then(|| error.to_string());
		RenderOutcome::Failed(ShellFailure {
			document: error_document(detail.as_deref()),
			error,
		})
	}

	/// Renders `root` to completion and returns the reconstructed document.
	///
	/// Every job is awaited and its patch spliced into the shell, so the
	/// result is the document the client ends up with.
	///
	/// # Errors
	///
	/// Returns the shell error, if any.
	pub async fn render_to_string(&self, root: Node) -> Result<String> {
		match self.render(root, RenderController::new()) {
			RenderOutcome::Shell(stream) => {
				let writer = RecordingWriter::new();
				stream.run(writer.clone()).await;
				let shell = writer.shell().unwrap_or_default();
				let patches = writer.patches();
				Ok(reconstruct(
					&shell,
					patches.iter().map(|(id, markup)| (*id, markup.as_str())),
				))
			}
			RenderOutcome::Failed(failure) => Err(failure.error),
			RenderOutcome::Cancelled => Err(RenderError::Transport(
				"render cancelled before the shell".to_string(),
			)),
		}
	}
}

/// A committed shell and the jobs still to settle.
#[derive(Debug)]
pub struct ShellStream {
	shell: String,
	early: Vec<(PlaceholderId, Node)>,
	boundaries: BoundaryManager,
	scheduler: Scheduler,
	controller: RenderController,
	policy: StreamErrorPolicy,
}

impl ShellStream {
	/// The committed shell markup.
	pub fn shell(&self) -> &str {
		&self.shell
	}

	/// The controller observing this render.
	pub fn controller(&self) -> &RenderController {
		&self.controller
	}

	/// Writes the shell and every patch to `writer`, then closes it.
	///
	/// Stream errors are logged and counted, never returned.
	pub async fn run<W: ChunkWriter>(mut self, writer: W) -> StreamReport {
		let mut report = StreamReport::default();
		let mut sink = StreamSink::new(writer, self.controller.clone());

		let shell = std::mem::take(&mut self.shell);
		if let Err(err) = sink.emit_shell(shell).await {
			self.abandon(&err, &mut report);
			return report;
		}

		for (id, node) in std::mem::take(&mut self.early) {
			if let Err(err) = self.settle(&mut sink, id, Ok(node), &mut report).await {
				self.abandon(&err, &mut report);
				return report;
			}
		}

		while let Some(JobOutcome { id, result }) = self.scheduler.next().await {
			if let Err(err) = self.settle(&mut sink, id, result, &mut report).await {
				self.abandon(&err, &mut report);
				return report;
			}
		}

		if self.controller.is_cancelled() {
			self.abandon(&SinkError::Cancelled, &mut report);
			return report;
		}

		if let Err(err) = sink.close().await {
			warn!(error = %err, "failed to close stream");
		}
		self.controller.notify(RenderEvent::Completed);
		report
	}

	/// Spawns [`ShellStream::run`] feeding a byte stream.
	///
	/// Dropping the returned body (e.g. because the peer disconnected)
	/// cancels the render.
	pub fn into_body(self, capacity: usize) -> ShellBody {
		let (tx, rx) = mpsc::channel(capacity.max(1));
		let guard = self.controller.token().clone().drop_guard();
		tokio::spawn(self.run(ChannelWriter::new(tx)));
		ShellBody {
			inner: ReceiverStream::new(rx),
			_guard: guard,
		}
	}

	async fn settle<W: ChunkWriter>(
		&mut self,
		sink: &mut StreamSink<W>,
		id: PlaceholderId,
		result: Result<Node>,
		report: &mut StreamReport,
	) -> std::result::Result<(), SinkError> {
		let watermark = self.boundaries.last_allocated();
		let mut staged: Vec<PendingJob> = Vec::new();
		let rendered = result.and_then(|node| {
			SyncRenderer::new(&mut self.boundaries).render_into(node, &mut staged)
		});

		let markup = match rendered {
			Ok(markup) => {
				for job in staged {
					self.scheduler.submit(job);
				}
				markup
			}
			Err(error) => {
				// Boundaries nested in the failed subtree never reach the client.
				let discarded = self.boundaries.fail_pending_after(watermark);
				report.stream_errors += 1;
				if discarded > 0 {
					debug!(placeholder = %id, discarded, "discarded nested boundaries");
				}
				error!(placeholder = %id, kind = error.kind(), error = %error, "stream error");
				self.controller.notify(RenderEvent::StreamError { id });
				match self.policy {
					StreamErrorPolicy::KeepFallback => {
						if let Err(err) = self.boundaries.mark_failed(id) {
							error!(placeholder = %id, error = %err, "invalid placeholder state");
						}
						return Ok(());
					}
					StreamErrorPolicy::InlineError => INLINE_ERROR_FRAGMENT.to_string(),
				}
			}
		};

		match sink.emit_patch(&mut self.boundaries, id, markup).await {
			Ok(()) => {
				report.patches += 1;
				Ok(())
			}
			Err(SinkError::Patch(err)) => {
				error!(placeholder = %id, error = %err, "patch rejected");
				Ok(())
			}
			Err(err) => Err(err),
		}
	}

	fn abandon(&mut self, err: &SinkError, report: &mut StreamReport) {
		report.cancelled = true;
		self.scheduler.shutdown();
		if err.is_transport() {
			self.controller.notify(RenderEvent::TransportFailed);
		} else if self.controller.phase() != RenderPhase::Cancelled {
			self.controller.notify(RenderEvent::Disconnected);
		}
		debug!(error = %err, pending = self.boundaries.pending(), "stream abandoned");
	}
}

/// Response body of a streamed render.
///
/// Yields the shell followed by patches. Dropping it cancels the render.
#[derive(Debug)]
pub struct ShellBody {
	inner: ReceiverStream<Bytes>,
	_guard: DropGuard,
}

impl Stream for ShellBody {
	type Item = Bytes;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		Pin::new(&mut self.get_mut().inner).poll_next(cx)
	}
}
