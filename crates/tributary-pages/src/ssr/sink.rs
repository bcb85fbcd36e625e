//! Stream sink.
//!
//! [`StreamSink`] enforces the output contract on top of any [`ChunkWriter`]:
//! the shell is written exactly once and first, every patch targets a
//! placeholder that was emitted and not yet settled, and nothing at all is
//! written once the render has been cancelled.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::boundary::{BoundaryManager, PatchError, PlaceholderId};
use super::controller::{RenderController, RenderEvent};
use super::protocol::StreamChunk;

/// Errors raised by the sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
	/// The render was cancelled; no further writes are allowed.
	#[error("render cancelled")]
	Cancelled,
	/// The receiving side closed the channel.
	#[error("receiving side closed the stream")]
	Closed,
	/// The shell was already written.
	#[error("shell already emitted")]
	ShellAlreadyEmitted,
	/// A patch was attempted before the shell.
	#[error("patch emitted before the shell")]
	PatchBeforeShell,
	/// The patch target is invalid.
	#[error(transparent)]
	Patch(#[from] PatchError),
	/// The underlying writer failed.
	#[error("write failed: {0}")]
	Write(String),
}

impl SinkError {
	/// Returns `true` when the receiving side can no longer be reached.
	pub fn is_transport(&self) -> bool {
		matches!(self, Self::Closed | Self::Write(_))
	}
}

/// Destination of stream chunks.
#[async_trait]
pub trait ChunkWriter: Send {
	/// Writes one chunk.
	///
	/// # Errors
	///
	/// Returns an error when the chunk cannot be delivered.
	async fn write(&mut self, chunk: StreamChunk) -> Result<(), SinkError>;

	/// Signals the end of the stream.
	///
	/// # Errors
	///
	/// Returns an error when the end of stream cannot be delivered.
	async fn close(&mut self) -> Result<(), SinkError> {
		Ok(())
	}
}

/// Writes chunks as bytes into a bounded channel feeding a response body.
#[derive(Debug)]
pub struct ChannelWriter {
	tx: Option<mpsc::Sender<Bytes>>,
}

impl ChannelWriter {
	/// Creates a writer over `tx`.
	pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
		Self { tx: Some(tx) }
	}
}

#[async_trait]
impl ChunkWriter for ChannelWriter {
	async fn write(&mut self, chunk: StreamChunk) -> Result<(), SinkError> {
		let tx = self.tx.as_ref().ok_or(SinkError::Closed)?;
		tx.send(chunk.into_bytes())
			.await
			.map_err(|_| SinkError::Closed)
	}

	async fn close(&mut self) -> Result<(), SinkError> {
		// Dropping the sender ends the body stream.
		self.tx.take();
		Ok(())
	}
}

#[derive(Debug, Default)]
struct Recording {
	chunks: Vec<StreamChunk>,
	closed: bool,
}

/// Records every chunk in memory.
///
/// Used by the buffered render mode, and by tests asserting on exactly what
/// was written and when. Clones share the same recording.
#[derive(Debug, Clone, Default)]
pub struct RecordingWriter {
	inner: Arc<Mutex<Recording>>,
}

impl RecordingWriter {
	/// Creates an empty recording.
	pub fn new() -> Self {
		Self::default()
	}

	/// Every chunk written so far, in write order.
	pub fn chunks(&self) -> Vec<StreamChunk> {
		self.inner.lock().chunks.clone()
	}

	/// Number of chunks written so far.
	pub fn len(&self) -> usize {
		self.inner.lock().chunks.len()
	}

	/// Returns `true` when nothing was written.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Whether the stream was closed.
	pub fn is_closed(&self) -> bool {
		self.inner.lock().closed
	}

	/// The shell, if written.
	pub fn shell(&self) -> Option<String> {
		self.inner.lock().chunks.iter().find_map(|c| match c {
			StreamChunk::Shell(html) => Some(html.clone()),
			StreamChunk::Patch { .. } => None,
		})
	}

	/// Patches in emission order, as `(placeholder, markup)`.
	pub fn patches(&self) -> Vec<(PlaceholderId, String)> {
		self.inner
			.lock()
			.chunks
			.iter()
			.filter_map(|c| match c {
				StreamChunk::Patch { id, markup, .. } => Some((*id, markup.clone())),
				StreamChunk::Shell(_) => None,
			})
			.collect()
	}

	/// Concatenated wire bytes of everything written.
	pub fn body(&self) -> String {
		self.inner
			.lock()
			.chunks
			.iter()
			.map(StreamChunk::to_html)
			.collect()
	}
}

#[async_trait]
impl ChunkWriter for RecordingWriter {
	async fn write(&mut self, chunk: StreamChunk) -> Result<(), SinkError> {
		let mut recording = self.inner.lock();
		if recording.closed {
			return Err(SinkError::Closed);
		}
		recording.chunks.push(chunk);
		Ok(())
	}

	async fn close(&mut self) -> Result<(), SinkError> {
		self.inner.lock().closed = true;
		Ok(())
	}
}

/// Output channel of one render.
#[derive(Debug)]
pub struct StreamSink<W> {
	writer: W,
	controller: RenderController,
	shell_emitted: bool,
	runtime_emitted: bool,
}

impl<W: ChunkWriter> StreamSink<W> {
	/// Creates a sink writing to `writer`, observing `controller`.
	pub fn new(writer: W, controller: RenderController) -> Self {
		Self {
			writer,
			controller,
			shell_emitted: false,
			runtime_emitted: false,
		}
	}

	/// Writes the shell.
	///
	/// # Errors
	///
	/// Fails when cancelled, when the shell was already written, or when
	/// the writer fails.
	pub async fn emit_shell(&mut self, html: String) -> Result<(), SinkError> {
		self.ensure_live()?;
		if self.shell_emitted {
			return Err(SinkError::ShellAlreadyEmitted);
		}
		self.writer.write(StreamChunk::Shell(html)).await?;
		self.shell_emitted = true;
		Ok(())
	}

	/// Writes a patch for `id`.
	///
	/// # Errors
	///
	/// Fails when cancelled, before the shell, when `id` is not a pending
	/// placeholder of `boundaries`, or when the writer fails.
	pub async fn emit_patch(
		&mut self,
		boundaries: &mut BoundaryManager,
		id: PlaceholderId,
		markup: String,
	) -> Result<(), SinkError> {
		self.ensure_live()?;
		if !self.shell_emitted {
			return Err(SinkError::PatchBeforeShell);
		}
		boundaries.begin_patch(id)?;
		let chunk = StreamChunk::Patch {
			id,
			markup,
			with_runtime: !self.runtime_emitted,
		};
		self.writer.write(chunk).await?;
		self.runtime_emitted = true;
		self.controller.notify(RenderEvent::PatchEmitted { id });
		Ok(())
	}

	/// Ends the stream.
	///
	/// # Errors
	///
	/// Returns the writer's error.
	pub async fn close(mut self) -> Result<(), SinkError> {
		self.writer.close().await
	}

	fn ensure_live(&self) -> Result<(), SinkError> {
		if self.controller.is_cancelled() {
			Err(SinkError::Cancelled)
		} else {
			Ok(())
		}
	}
}
