//! Synchronous renderer.
//!
//! [`SyncRenderer`] walks a tree depth-first and serializes everything that
//! can be produced without waiting. A suspense boundary contributes its
//! fallback wrapped in placeholder comments, and its child is handed to a
//! [`JobQueue`] as a [`PendingJob`]. The walk never awaits anything.
//!
//! [`unblock`] is the asynchronous counterpart used inside pending jobs: it
//! resolves every async component of a subtree (stopping at nested suspense
//! boundaries) so the result can then be rendered by a [`SyncRenderer`].

use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use tributary_core::node::{
	BOOLEAN_ATTRS, escape_raw_text, html_escape, is_boolean_attr_truthy,
};
use tributary_core::{ClientBoundary, HostElement, Node, RenderError, Result};

use super::boundary::{BoundaryManager, PlaceholderId};
use super::markers::{IslandMarker, placeholder_end, placeholder_start};

/// Emitted before an `html` element.
pub const DOCTYPE: &str = "<!DOCTYPE html>";

/// A deferred subtree registered by a suspense boundary.
#[derive(Debug)]
pub struct PendingJob {
	/// Placeholder the job's output replaces.
	pub id: PlaceholderId,
	/// The boundary's child.
	pub child: Node,
}

/// Receives pending jobs as the walk discovers them.
pub trait JobQueue {
	/// Registers a job. Must not block.
	fn submit(&mut self, job: PendingJob);
}

impl JobQueue for Vec<PendingJob> {
	fn submit(&mut self, job: PendingJob) {
		self.push(job);
	}
}

/// Output of a synchronous walk.
#[derive(Debug)]
pub struct RenderOutput {
	/// Rendered markup.
	pub html: String,
	/// Jobs registered during the walk, in walk order.
	pub jobs: Vec<PendingJob>,
}

/// Depth-first renderer for everything that does not need to wait.
pub struct SyncRenderer<'a> {
	boundaries: &'a mut BoundaryManager,
}

impl<'a> SyncRenderer<'a> {
	/// Creates a renderer allocating ids from `boundaries`.
	pub fn new(boundaries: &'a mut BoundaryManager) -> Self {
		Self { boundaries }
	}

	/// Renders `node`, collecting pending jobs.
	///
	/// # Errors
	///
	/// Returns the first error raised by a sync component, or
	/// [`RenderError::Structural`] when an async component is reached
	/// without an enclosing suspense boundary.
	pub fn render(&mut self, node: Node) -> Result<RenderOutput> {
		let mut jobs = Vec::new();
		let html = self.render_into(node, &mut jobs)?;
		Ok(RenderOutput { html, jobs })
	}

	/// Renders `node`, submitting pending jobs to `queue` as they are found.
	///
	/// # Errors
	///
	/// Same as [`SyncRenderer::render`].
	pub fn render_into(&mut self, node: Node, queue: &mut dyn JobQueue) -> Result<String> {
		let mut output = String::new();
		self.render_node(node, &mut output, queue, false)?;
		Ok(output)
	}

	fn render_node(
		&mut self,
		node: Node,
		output: &mut String,
		queue: &mut dyn JobQueue,
		raw_text: bool,
	) -> Result<()> {
		match node {
			Node::Host(el) => self.render_element(el, output, queue)?,
			Node::Text(text) => {
				if raw_text {
					output.push_str(&escape_raw_text(&text));
				} else {
					output.push_str(&html_escape(&text));
				}
			}
			Node::Fragment(children) => {
				for child in children {
					self.render_node(child, output, queue, raw_text)?;
				}
			}
			Node::Empty => {}
			Node::Sync(component) => {
				let rendered = component.render()?;
				self.render_node(rendered, output, queue, raw_text)?;
			}
			Node::Async(component) => {
				return Err(RenderError::structural(format!(
					"async component `{}` is not enclosed by a suspense boundary",
					component.name()
				)));
			}
			Node::Suspense(boundary) => {
				let id = self.boundaries.allocate();
				let (fallback, child) = boundary.into_parts();

				let mut fallback_html = String::new();
				self.render_node(fallback, &mut fallback_html, queue, raw_text)?;

				output.push_str(&placeholder_start(id));
				output.push_str(&fallback_html);
				output.push_str(&placeholder_end(id));

				self.boundaries
					.record_fallback(id, fallback_html)
					.map_err(|e| RenderError::structural(e.to_string()))?;
				queue.submit(PendingJob { id, child });
			}
			Node::Client(boundary) => {
				let (reference, child) = boundary.into_parts();
				let marker = IslandMarker::new(self.boundaries.next_island(), &reference);
				output.push_str(&marker.open_tag());
				self.render_node(child, output, queue, raw_text)?;
				output.push_str(marker.close_tag());
			}
		}
		Ok(())
	}

	fn render_element(
		&mut self,
		el: HostElement,
		output: &mut String,
		queue: &mut dyn JobQueue,
	) -> Result<()> {
		if el.tag_name().eq_ignore_ascii_case("html") {
			output.push_str(DOCTYPE);
		}
		output.push('<');
		output.push_str(el.tag_name());

		for (name, value) in el.attrs() {
			let name_str: &str = name.as_ref();
			if BOOLEAN_ATTRS.contains(&name_str) && !is_boolean_attr_truthy(value) {
				continue;
			}

			output.push(' ');
			output.push_str(name);
			output.push_str("=\"");
			output.push_str(&html_escape(value));
			output.push('"');
		}

		if el.is_void() {
			output.push_str(" />");
			return Ok(());
		}

		output.push('>');
		let raw_text = el.is_raw_text();
		let (el, children) = el.split_children();
		for child in children {
			self.render_node(child, output, queue, raw_text)?;
		}
		output.push_str("</");
		output.push_str(el.tag_name());
		output.push('>');
		Ok(())
	}
}

/// Resolves the async components of a subtree.
///
/// Sync components are evaluated along the way so that async components they
/// return are found too. Sibling subtrees are resolved concurrently. Nested
/// suspense boundaries are left untouched: they become new jobs when the
/// result is rendered.
pub fn unblock(node: Node) -> BoxFuture<'static, Result<Node>> {
	async move {
		match node {
			Node::Async(component) => {
				let resolved = component.resolve().await?;
				unblock(resolved).await
			}
			Node::Sync(component) => unblock(component.render()?).await,
			Node::Host(el) => {
				let (el, children) = el.split_children();
				let children = try_join_all(children.into_iter().map(unblock)).await?;
				Ok(Node::Host(el.with_children(children)))
			}
			Node::Fragment(children) => {
				let children = try_join_all(children.into_iter().map(unblock)).await?;
				Ok(Node::Fragment(children))
			}
			Node::Client(boundary) => {
				let (reference, child) = boundary.into_parts();
				let child = unblock(child).await?;
				Ok(Node::Client(ClientBoundary::from_parts(reference, child)))
			}
			leaf @ (Node::Text(_) | Node::Empty | Node::Suspense(_)) => Ok(leaf),
		}
	}
	.boxed()
}
