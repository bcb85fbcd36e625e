//! Placeholder bookkeeping for suspense boundaries.
//!
//! One [`BoundaryManager`] exists per render. It is owned by the render task
//! and never shared, so it needs no synchronization: ids are handed out from
//! plain counters and the placeholder table only grows.

use std::collections::BTreeMap;
use std::fmt;

/// Identifier correlating a placeholder in the shell with its patch.
///
/// Ids start at `1` and increase in walk order. They are never reused within
/// a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaceholderId(u64);

impl PlaceholderId {
	/// Returns the numeric value.
	pub fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for PlaceholderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<u64> for PlaceholderId {
	fn from(value: u64) -> Self {
		Self(value)
	}
}

/// Settlement state of a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderState {
	/// Fallback emitted, no patch yet.
	Pending,
	/// A patch was emitted.
	Patched,
	/// The job failed and the fallback stays in place.
	Failed,
}

#[derive(Debug)]
struct Placeholder {
	fallback: Option<String>,
	state: PlaceholderState,
}

/// Rejected patch attempts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
	/// The id was never allocated or its fallback was never emitted.
	#[error("placeholder {0} was never emitted")]
	UnknownPlaceholder(PlaceholderId),
	/// The placeholder already received a patch or was marked failed.
	#[error("placeholder {0} is already settled")]
	AlreadySettled(PlaceholderId),
}

/// Per-render placeholder and island allocator.
#[derive(Debug, Default)]
pub struct BoundaryManager {
	next_placeholder: u64,
	next_island: u64,
	placeholders: BTreeMap<PlaceholderId, Placeholder>,
}

impl BoundaryManager {
	/// Creates an empty manager.
	pub fn new() -> Self {
		Self::default()
	}

	/// Allocates a fresh placeholder id.
	pub fn allocate(&mut self) -> PlaceholderId {
		self.next_placeholder += 1;
		let id = PlaceholderId(self.next_placeholder);
		self.placeholders.insert(
			id,
			Placeholder {
				fallback: None,
				state: PlaceholderState::Pending,
			},
		);
		id
	}

	/// Allocates the next client island ordinal.
	pub fn next_island(&mut self) -> u64 {
		let n = self.next_island;
		self.next_island += 1;
		n
	}

	/// Records the fallback markup emitted for `id`.
	///
	/// # Errors
	///
	/// Returns [`PatchError::UnknownPlaceholder`] when `id` was not allocated.
	pub fn record_fallback(&mut self, id: PlaceholderId, html: String) -> Result<(), PatchError> {
		let entry = self
			.placeholders
			.get_mut(&id)
			.ok_or(PatchError::UnknownPlaceholder(id))?;
		entry.fallback = Some(html);
		Ok(())
	}

	/// Returns the fallback markup emitted for `id`.
	pub fn fallback(&self, id: PlaceholderId) -> Option<&str> {
		self.placeholders
			.get(&id)
			.and_then(|p| p.fallback.as_deref())
	}

	/// Returns the state of `id`.
	pub fn state(&self, id: PlaceholderId) -> Option<PlaceholderState> {
		self.placeholders.get(&id).map(|p| p.state)
	}

	/// Validates and records that a patch for `id` is about to be emitted.
	///
	/// # Errors
	///
	/// Fails when the fallback for `id` was never emitted, or when `id` is
	/// already settled.
	pub fn begin_patch(&mut self, id: PlaceholderId) -> Result<(), PatchError> {
		let entry = self
			.placeholders
			.get_mut(&id)
			.filter(|p| p.fallback.is_some())
			.ok_or(PatchError::UnknownPlaceholder(id))?;
		if entry.state != PlaceholderState::Pending {
			return Err(PatchError::AlreadySettled(id));
		}
		entry.state = PlaceholderState::Patched;
		Ok(())
	}

	/// Marks `id` as failed; its fallback remains visible.
	///
	/// # Errors
	///
	/// Same as [`BoundaryManager::begin_patch`].
	pub fn mark_failed(&mut self, id: PlaceholderId) -> Result<(), PatchError> {
		let entry = self
			.placeholders
			.get_mut(&id)
			.ok_or(PatchError::UnknownPlaceholder(id))?;
		if entry.state != PlaceholderState::Pending {
			return Err(PatchError::AlreadySettled(id));
		}
		entry.state = PlaceholderState::Failed;
		Ok(())
	}

	/// Id of the most recently allocated placeholder, if any.
	pub fn last_allocated(&self) -> Option<PlaceholderId> {
		(self.next_placeholder > 0).then_some(PlaceholderId(self.next_placeholder))
	}

	/// Marks every still-pending placeholder allocated after `after` as failed.
	///
	/// Returns how many were marked. Passing `None` covers every placeholder.
	pub fn fail_pending_after(&mut self, after: Option<PlaceholderId>) -> usize {
		let floor = after.map_or(0, PlaceholderId::get);
		let mut failed = 0;
		for (_, placeholder) in self.placeholders.range_mut(PlaceholderId(floor + 1)..) {
			if placeholder.state == PlaceholderState::Pending {
				placeholder.state = PlaceholderState::Failed;
				failed += 1;
			}
		}
		failed
	}

	/// Number of placeholders allocated so far.
	pub fn allocated(&self) -> usize {
		self.placeholders.len()
	}

	/// Number of placeholders that are still pending.
	pub fn pending(&self) -> usize {
		self.placeholders
			.values()
			.filter(|p| p.state == PlaceholderState::Pending)
			.count()
	}
}
