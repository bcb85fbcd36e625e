//! Streaming server-side rendering.
//!
//! - [`renderer`]: synchronous walk and the async unblocking of job subtrees
//! - [`boundary`]: placeholder id allocation and patch validation
//! - [`scheduler`]: concurrent resolution of pending jobs
//! - [`sink`]: the output channel and its writers
//! - [`controller`]: lifecycle events, phases and cancellation
//! - [`stream`]: the per-request orchestration tying the above together
//! - [`markers`] and [`protocol`]: the markup and patch wire format

pub mod boundary;
pub mod controller;
pub mod markers;
pub mod protocol;
pub mod renderer;
pub mod scheduler;
pub mod sink;
pub mod stream;

pub use boundary::{BoundaryManager, PatchError, PlaceholderId, PlaceholderState};
pub use controller::{RenderController, RenderEvent, RenderPhase};
pub use markers::IslandMarker;
pub use protocol::{StreamChunk, error_document, reconstruct};
pub use renderer::{JobQueue, PendingJob, RenderOutput, SyncRenderer, unblock};
pub use scheduler::{JobOutcome, Scheduler};
pub use sink::{ChannelWriter, ChunkWriter, RecordingWriter, SinkError, StreamSink};
pub use stream::{
	RenderOutcome, ShellBody, ShellFailure, ShellStream, StreamErrorPolicy, StreamOptions,
	StreamReport, StreamingRenderer,
};
