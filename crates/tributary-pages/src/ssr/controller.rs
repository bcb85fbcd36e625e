//! Render lifecycle controller.
//!
//! The orchestrator reports named [`RenderEvent`]s to a [`RenderController`],
//! which owns the phase machine and the cancellation flag:
//!
//! ```text
//! PreShell --ShellReady--> PostShell --Completed--> Completed
//!    |                        |
//!    +--ShellError--> Failed  |
//!    |                        |
//!    +------------------------+--Disconnected / TransportFailed--> Cancelled
//! ```
//!
//! Cancellation is level-triggered: once the token is cancelled it stays
//! cancelled, and every wait and write checks it first.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::boundary::PlaceholderId;

/// Phase of one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
	/// The shell is still being built; errors replace the whole response.
	PreShell,
	/// The shell was committed; errors only affect their placeholder.
	PostShell,
	/// Every job settled and the stream was closed.
	Completed,
	/// The shell failed and was replaced by an error document.
	Failed,
	/// The receiving side went away.
	Cancelled,
}

impl RenderPhase {
	/// Returns `true` for phases no event can leave.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
	}
}

/// Lifecycle events raised while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEvent {
	/// The synchronous walk finished and the shell is committed.
	ShellReady,
	/// The shell could not be produced.
	ShellError,
	/// A pending job failed after the shell.
	StreamError {
		/// Affected placeholder.
		id: PlaceholderId,
	},
	/// A patch was written.
	PatchEmitted {
		/// Patched placeholder.
		id: PlaceholderId,
	},
	/// The receiving side disconnected.
	Disconnected,
	/// A write to the receiving side failed.
	TransportFailed,
	/// The stream was closed after every job settled.
	Completed,
}

/// Shared handle observing one render.
///
/// Cloning is cheap; all clones observe the same phase and token.
#[derive(Debug, Clone)]
pub struct RenderController {
	token: CancellationToken,
	phase: Arc<Mutex<RenderPhase>>,
}

impl Default for RenderController {
	fn default() -> Self {
		Self::new()
	}
}

impl RenderController {
	/// Creates a controller in the [`RenderPhase::PreShell`] phase.
	pub fn new() -> Self {
		Self::with_token(CancellationToken::new())
	}

	/// Creates a controller driven by an existing cancellation token.
	pub fn with_token(token: CancellationToken) -> Self {
		Self {
			token,
			phase: Arc::new(Mutex::new(RenderPhase::PreShell)),
		}
	}

	/// Returns the cancellation token.
	pub fn token(&self) -> &CancellationToken {
		&self.token
	}

	/// Signals that the receiving side disconnected.
	pub fn cancel(&self) {
		self.notify(RenderEvent::Disconnected);
	}

	/// Returns `true` once cancellation was signalled.
	pub fn is_cancelled(&self) -> bool {
		self.token.is_cancelled()
	}

	/// Returns the current phase.
	pub fn phase(&self) -> RenderPhase {
		*self.phase.lock()
	}

	/// Records an event, advancing the phase machine.
	///
	/// Events that do not apply to the current phase are ignored.
	pub fn notify(&self, event: RenderEvent) {
		let mut phase = self.phase.lock();
		let current = *phase;
		let next = match (current, event) {
			(RenderPhase::PreShell, RenderEvent::ShellReady) => RenderPhase::PostShell,
			(RenderPhase::PreShell, RenderEvent::ShellError) => RenderPhase::Failed,
			(RenderPhase::PostShell, RenderEvent::Completed) => RenderPhase::Completed,
			(p, RenderEvent::Disconnected | RenderEvent::TransportFailed) if !p.is_terminal() => {
				RenderPhase::Cancelled
			}
			(p, _) => p,
		};
		*phase = next;
		drop(phase);

		if matches!(event, RenderEvent::Disconnected | RenderEvent::TransportFailed) {
			self.token.cancel();
		}

		match event {
			RenderEvent::ShellReady => debug!(phase = ?next, "shell ready"),
			RenderEvent::ShellError => error!(phase = ?next, "shell error"),
			RenderEvent::StreamError { id } => {
				warn!(placeholder = %id, phase = ?next, "stream error, placeholder left unresolved")
			}
			RenderEvent::PatchEmitted { id } => debug!(placeholder = %id, "patch emitted"),
			RenderEvent::Disconnected if current != next => {
				warn!(from = ?current, "receiving side disconnected")
			}
			RenderEvent::TransportFailed if current != next => {
				warn!(from = ?current, "transport failed")
			}
			RenderEvent::Completed => info!(phase = ?next, "render completed"),
			RenderEvent::Disconnected | RenderEvent::TransportFailed => {}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_happy_path() {
		let controller = RenderController::new();
		assert_eq!(controller.phase(), RenderPhase::PreShell);

		controller.notify(RenderEvent::ShellReady);
		assert_eq!(controller.phase(), RenderPhase::PostShell);

		controller.notify(RenderEvent::PatchEmitted { id: PlaceholderId::from(1) });
		controller.notify(RenderEvent::StreamError { id: PlaceholderId::from(2) });
		assert_eq!(controller.phase(), RenderPhase::PostShell);

		controller.notify(RenderEvent::Completed);
		assert_eq!(controller.phase(), RenderPhase::Completed);
		assert!(!controller.is_cancelled());
	}

	#[rstest]
	fn test_shell_error_is_terminal() {
		let controller = RenderController::new();
		controller.notify(RenderEvent::ShellError);
		controller.notify(RenderEvent::ShellReady);
		assert_eq!(controller.phase(), RenderPhase::Failed);
	}

	#[rstest]
	#[case(RenderPhase::PreShell, &[])]
	#[case(RenderPhase::PostShell, &[RenderEvent::ShellReady])]
	fn test_disconnect_cancels(#[case] from: RenderPhase, #[case] before: &[RenderEvent]) {
		let controller = RenderController::new();
		for event in before {
			controller.notify(*event);
		}
		assert_eq!(controller.phase(), from);

		controller.cancel();
		assert_eq!(controller.phase(), RenderPhase::Cancelled);
		assert!(controller.is_cancelled());
		assert!(controller.token().is_cancelled());
	}

	#[rstest]
	fn test_transport_failure_cancels() {
		let controller = RenderController::new();
		controller.notify(RenderEvent::ShellReady);
		controller.notify(RenderEvent::TransportFailed);
		assert_eq!(controller.phase(), RenderPhase::Cancelled);
		assert!(controller.is_cancelled());
	}

	#[rstest]
	fn test_clones_share_state() {
		let controller = RenderController::new();
		let observer = controller.clone();
		controller.cancel();
		assert!(observer.is_cancelled());
		assert_eq!(observer.phase(), RenderPhase::Cancelled);
	}

	#[rstest]
	fn test_completed_phase_ignores_disconnect() {
		let controller = RenderController::new();
		controller.notify(RenderEvent::ShellReady);
		controller.notify(RenderEvent::Completed);
		controller.cancel();
		assert_eq!(controller.phase(), RenderPhase::Completed);
	}
}
