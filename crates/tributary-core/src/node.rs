//! Node types composing a render tree.
//!
//! ## Overview
//!
//! [`Node`] is a closed sum type. Renderers dispatch over it with exhaustive
//! matches, so adding a kind forces every renderer to handle it.
//!
//! | Kind | Evaluated | Notes |
//! |------|-----------|-------|
//! | `Host` | during the walk | tag, ordered attributes, ordered children |
//! | `Sync` | during the walk | `FnOnce(props) -> Result<Node>` |
//! | `Async` | by a pending job | must sit under a `Suspense` boundary |
//! | `Suspense` | during the walk | fallback now, child later |
//! | `Client` | during the walk | markup now, behaviour re-attached on the client |
//!
//! Component functions are consumed when evaluated: a tree is built for one
//! request and rendered exactly once.
//!
//! ## Example
//!
//! ```
//! use tributary_core::node::{HostElement, IntoNode, Node};
//!
//! let loading = HostElement::new("span").child("loading");
//! let list = Node::async_component("ItemCount", 3usize, |count| async move {
//! 	Ok(HostElement::new("span").child(format!("{count} items")).into_node())
//! });
//!
//! let tree = Node::suspense(loading, list);
//! assert!(matches!(tree, Node::Suspense(_)));
//! ```

mod util;

pub use util::{
	BOOLEAN_ATTRS, RAW_TEXT_ELEMENTS, VOID_ELEMENTS, escape_raw_text, html_escape,
	is_boolean_attr_truthy,
};

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::exception::Result;

/// Boxed future returned by an [`AsyncComponent`].
pub type NodeFuture = Pin<Box<dyn Future<Output = Result<Node>> + Send + 'static>>;

type RenderFn = Box<dyn FnOnce() -> Result<Node> + Send + 'static>;
type ResolveFn = Box<dyn FnOnce() -> NodeFuture + Send + 'static>;

/// A render tree node.
#[derive(Debug)]
pub enum Node {
	/// A markup element.
	Host(HostElement),
	/// Escaped text.
	Text(Cow<'static, str>),
	/// Ordered children without a wrapper element.
	Fragment(Vec<Node>),
	/// Renders nothing.
	Empty,
	/// A component evaluated immediately during the walk.
	Sync(SyncComponent),
	/// A component whose output becomes available later.
	Async(AsyncComponent),
	/// A deferred subtree with a fallback.
	Suspense(SuspenseBoundary),
	/// A subtree re-instantiated interactively on the receiving side.
	Client(ClientBoundary),
}

impl Node {
	/// Creates a host element builder.
	pub fn element(tag: impl Into<Cow<'static, str>>) -> HostElement {
		HostElement::new(tag)
	}

	/// Creates a text node.
	pub fn text(content: impl Into<Cow<'static, str>>) -> Self {
		Self::Text(content.into())
	}

	/// Creates a fragment node.
	pub fn fragment(children: impl IntoIterator<Item = impl IntoNode>) -> Self {
		Self::Fragment(children.into_iter().map(IntoNode::into_node).collect())
	}

	/// Creates an empty node.
	pub fn empty() -> Self {
		Self::Empty
	}

	/// Creates a synchronous component node.
	pub fn component<P, F>(name: impl Into<Cow<'static, str>>, props: P, render: F) -> Self
	where
		P: Send + 'static,
		F: FnOnce(P) -> Result<Node> + Send + 'static,
	{
		Self::Sync(SyncComponent::new(name, props, render))
	}

	/// Creates an asynchronous component node.
	pub fn async_component<P, F, Fut>(
		name: impl Into<Cow<'static, str>>,
		props: P,
		resolve: F,
	) -> Self
	where
		P: Send + 'static,
		F: FnOnce(P) -> Fut + Send + 'static,
		Fut: Future<Output = Result<Node>> + Send + 'static,
	{
		Self::Async(AsyncComponent::new(name, props, resolve))
	}

	/// Creates a suspense boundary node.
	pub fn suspense(fallback: impl IntoNode, child: impl IntoNode) -> Self {
		Self::Suspense(SuspenseBoundary::new(fallback, child))
	}

	/// Creates a client boundary node.
	///
	/// # Errors
	///
	/// Returns [`RenderError::Props`](crate::RenderError::Props) when `props`
	/// cannot be represented as JSON.
	pub fn client<P: Serialize + ?Sized>(
		component: impl Into<Cow<'static, str>>,
		props: &P,
		child: impl IntoNode,
	) -> Result<Self> {
		ClientBoundary::new(component, props, child).map(Self::Client)
	}

	/// Name of the node kind, for diagnostics.
	pub fn kind_name(&self) -> &'static str {
		match self {
			Self::Host(_) => "host",
			Self::Text(_) => "text",
			Self::Fragment(_) => "fragment",
			Self::Empty => "empty",
			Self::Sync(_) => "sync-component",
			Self::Async(_) => "async-component",
			Self::Suspense(_) => "suspense-boundary",
			Self::Client(_) => "client-boundary",
		}
	}
}

/// A markup element with ordered attributes and children.
#[derive(Debug)]
pub struct HostElement {
	tag: Cow<'static, str>,
	attrs: Vec<(Cow<'static, str>, Cow<'static, str>)>,
	children: Vec<Node>,
	is_void: bool,
}

impl HostElement {
	/// Creates a new element.
	pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
		let tag = tag.into();
		let is_void = VOID_ELEMENTS.contains(&tag.as_ref());
		Self {
			tag,
			attrs: Vec::new(),
			children: Vec::new(),
			is_void,
		}
	}

	/// Adds an attribute. Attribute order is preserved.
	pub fn attr(
		mut self,
		name: impl Into<Cow<'static, str>>,
		value: impl Into<Cow<'static, str>>,
	) -> Self {
		self.attrs.push((name.into(), value.into()));
		self
	}

	/// Adds a boolean attribute when `value` is true.
	pub fn bool_attr(self, name: impl Into<Cow<'static, str>>, value: bool) -> Self {
		if value {
			let name = name.into();
			self.attr(name.clone(), name)
		} else {
			self
		}
	}

	/// Adds a child node.
	pub fn child(mut self, child: impl IntoNode) -> Self {
		self.children.push(child.into_node());
		self
	}

	/// Adds multiple child nodes.
	pub fn children(mut self, children: impl IntoIterator<Item = impl IntoNode>) -> Self {
		self.children
			.extend(children.into_iter().map(IntoNode::into_node));
		self
	}

	/// Returns the tag name.
	pub fn tag_name(&self) -> &str {
		&self.tag
	}

	/// Returns the attributes in insertion order.
	pub fn attrs(&self) -> &[(Cow<'static, str>, Cow<'static, str>)] {
		&self.attrs
	}

	/// Returns the child nodes.
	pub fn child_nodes(&self) -> &[Node] {
		&self.children
	}

	/// Returns whether this is a void element.
	pub fn is_void(&self) -> bool {
		self.is_void
	}

	/// Returns whether text children are emitted without entity escaping.
	pub fn is_raw_text(&self) -> bool {
		RAW_TEXT_ELEMENTS.contains(&self.tag.as_ref())
	}

	/// Detaches the children, returning the childless element and its children.
	pub fn split_children(mut self) -> (Self, Vec<Node>) {
		let children = std::mem::take(&mut self.children);
		(self, children)
	}

	/// Replaces the children.
	pub fn with_children(mut self, children: Vec<Node>) -> Self {
		self.children = children;
		self
	}
}

/// A named component evaluated synchronously during the walk.
pub struct SyncComponent {
	name: Cow<'static, str>,
	render: RenderFn,
}

impl std::fmt::Debug for SyncComponent {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SyncComponent")
			.field("name", &self.name)
			.field("render", &"<closure>")
			.finish()
	}
}

impl SyncComponent {
	/// Creates a component that renders `props` with `render`.
	pub fn new<P, F>(name: impl Into<Cow<'static, str>>, props: P, render: F) -> Self
	where
		P: Send + 'static,
		F: FnOnce(P) -> Result<Node> + Send + 'static,
	{
		Self {
			name: name.into(),
			render: Box::new(move || render(props)),
		}
	}

	/// Returns the component name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Evaluates the component. Errors are returned unchanged.
	pub fn render(self) -> Result<Node> {
		(self.render)()
	}
}

/// A named component whose output becomes available asynchronously.
///
/// The only way to obtain its node is through [`AsyncComponent::resolve`],
/// which returns a future; a synchronous walk can therefore never block on it.
pub struct AsyncComponent {
	name: Cow<'static, str>,
	resolve: ResolveFn,
}

impl std::fmt::Debug for AsyncComponent {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AsyncComponent")
			.field("name", &self.name)
			.field("resolve", &"<closure>")
			.finish()
	}
}

impl AsyncComponent {
	/// Creates a component that resolves `props` with `resolve`.
	pub fn new<P, F, Fut>(name: impl Into<Cow<'static, str>>, props: P, resolve: F) -> Self
	where
		P: Send + 'static,
		F: FnOnce(P) -> Fut + Send + 'static,
		Fut: Future<Output = Result<Node>> + Send + 'static,
	{
		Self {
			name: name.into(),
			resolve: Box::new(move || Box::pin(resolve(props))),
		}
	}

	/// Returns the component name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Starts the asynchronous dependency.
	pub fn resolve(self) -> NodeFuture {
		(self.resolve)()
	}
}

/// The unit of deferred rendering: a fallback shown until the child resolves.
#[derive(Debug)]
pub struct SuspenseBoundary {
	fallback: Box<Node>,
	child: Box<Node>,
}

impl SuspenseBoundary {
	/// Creates a boundary.
	pub fn new(fallback: impl IntoNode, child: impl IntoNode) -> Self {
		Self {
			fallback: Box::new(fallback.into_node()),
			child: Box::new(child.into_node()),
		}
	}

	/// Returns the fallback node.
	pub fn fallback(&self) -> &Node {
		&self.fallback
	}

	/// Returns the deferred child node.
	pub fn child(&self) -> &Node {
		&self.child
	}

	/// Consumes the boundary, returning `(fallback, child)`.
	pub fn into_parts(self) -> (Node, Node) {
		(*self.fallback, *self.child)
	}
}

/// Serialized identity of a client boundary: what the receiving side needs
/// to reconstruct behaviour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientReference {
	/// Stable component identifier.
	pub component: Cow<'static, str>,
	/// Props as JSON.
	pub props: serde_json::Value,
}

impl ClientReference {
	/// Returns the props serialized as compact JSON.
	pub fn props_json(&self) -> String {
		self.props.to_string()
	}
}

/// A subtree rendered on the server and re-attached on the client.
#[derive(Debug)]
pub struct ClientBoundary {
	reference: ClientReference,
	child: Box<Node>,
}

impl ClientBoundary {
	/// Creates a client boundary, serializing `props` immediately.
	///
	/// # Errors
	///
	/// Returns [`RenderError::Props`](crate::RenderError::Props) when `props`
	/// cannot be represented as JSON.
	pub fn new<P: Serialize + ?Sized>(
		component: impl Into<Cow<'static, str>>,
		props: &P,
		child: impl IntoNode,
	) -> Result<Self> {
		let props = serde_json::to_value(props)?;
		Ok(Self {
			reference: ClientReference {
				component: component.into(),
				props,
			},
			child: Box::new(child.into_node()),
		})
	}

	/// Returns the serialized reference.
	pub fn reference(&self) -> &ClientReference {
		&self.reference
	}

	/// Consumes the boundary, returning the reference and server markup subtree.
	pub fn into_parts(self) -> (ClientReference, Node) {
		(self.reference, *self.child)
	}

	/// Reassembles a boundary from its parts.
	pub fn from_parts(reference: ClientReference, child: Node) -> Self {
		Self {
			reference,
			child: Box::new(child),
		}
	}
}

/// Conversion into a [`Node`].
pub trait IntoNode {
	/// Converts self into a node.
	fn into_node(self) -> Node;
}

impl IntoNode for Node {
	fn into_node(self) -> Node {
		self
	}
}

impl IntoNode for HostElement {
	fn into_node(self) -> Node {
		Node::Host(self)
	}
}

impl IntoNode for SyncComponent {
	fn into_node(self) -> Node {
		Node::Sync(self)
	}
}

impl IntoNode for AsyncComponent {
	fn into_node(self) -> Node {
		Node::Async(self)
	}
}

impl IntoNode for SuspenseBoundary {
	fn into_node(self) -> Node {
		Node::Suspense(self)
	}
}

impl IntoNode for ClientBoundary {
	fn into_node(self) -> Node {
		Node::Client(self)
	}
}

impl IntoNode for String {
	fn into_node(self) -> Node {
		Node::Text(Cow::Owned(self))
	}
}

impl IntoNode for &String {
	fn into_node(self) -> Node {
		Node::Text(Cow::Owned(self.clone()))
	}
}

impl IntoNode for &'static str {
	fn into_node(self) -> Node {
		Node::Text(Cow::Borrowed(self))
	}
}

impl IntoNode for Cow<'static, str> {
	fn into_node(self) -> Node {
		Node::Text(self)
	}
}

impl<T: IntoNode> IntoNode for Option<T> {
	fn into_node(self) -> Node {
		match self {
			Some(v) => v.into_node(),
			None => Node::Empty,
		}
	}
}

impl<T: IntoNode> IntoNode for Vec<T> {
	fn into_node(self) -> Node {
		Node::Fragment(self.into_iter().map(IntoNode::into_node).collect())
	}
}

impl IntoNode for () {
	fn into_node(self) -> Node {
		Node::Empty
	}
}

impl<A: IntoNode, B: IntoNode> IntoNode for (A, B) {
	fn into_node(self) -> Node {
		Node::Fragment(vec![self.0.into_node(), self.1.into_node()])
	}
}

impl<A: IntoNode, B: IntoNode, C: IntoNode> IntoNode for (A, B, C) {
	fn into_node(self) -> Node {
		Node::Fragment(vec![
			self.0.into_node(),
			self.1.into_node(),
			self.2.into_node(),
		])
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::RenderError;
	use rstest::rstest;

	struct OpenHandle;

	impl Serialize for OpenHandle {
		fn serialize<S: serde::Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
			Err(serde::ser::Error::custom("open handles have no serialized form"))
		}
	}

	#[rstest]
	fn test_host_element_builder() {
		let el = HostElement::new("div")
			.attr("class", "container")
			.attr("id", "main")
			.child("Hello")
			.child(HostElement::new("p"));

		assert_eq!(el.tag_name(), "div");
		assert_eq!(el.attrs().len(), 2);
		assert_eq!(el.attrs()[0].0, "class");
		assert_eq!(el.child_nodes().len(), 2);
	}

	#[rstest]
	#[case("br", true)]
	#[case("img", true)]
	#[case("meta", true)]
	#[case("div", false)]
	#[case("span", false)]
	fn test_void_element_detection(#[case] tag: &'static str, #[case] is_void: bool) {
		assert_eq!(HostElement::new(tag).is_void(), is_void);
	}

	#[rstest]
	fn test_raw_text_detection() {
		assert!(HostElement::new("style").is_raw_text());
		assert!(HostElement::new("script").is_raw_text());
		assert!(!HostElement::new("pre").is_raw_text());
	}

	#[rstest]
	fn test_bool_attr() {
		let on = HostElement::new("button").bool_attr("disabled", true);
		let off = HostElement::new("button").bool_attr("disabled", false);
		assert_eq!(on.attrs().len(), 1);
		assert!(off.attrs().is_empty());
	}

	#[rstest]
	fn test_split_and_restore_children() {
		let el = HostElement::new("ul").child("a").child("b");
		let (el, children) = el.split_children();
		assert!(el.child_nodes().is_empty());
		assert_eq!(children.len(), 2);

		let el = el.with_children(children);
		assert_eq!(el.child_nodes().len(), 2);
	}

	#[rstest]
	fn test_sync_component_receives_props() {
		let component = SyncComponent::new("Greeting", "Alice".to_string(), |name| {
			Ok(Node::text(format!("Hello, {name}")))
		});
		assert_eq!(component.name(), "Greeting");

		let node = component.render().unwrap();
		assert!(matches!(node, Node::Text(ref t) if t == "Hello, Alice"));
	}

	#[rstest]
	fn test_sync_component_error_is_unchanged() {
		let component = SyncComponent::new("Broken", (), |()| {
			Err(RenderError::component("Broken", "bad props"))
		});
		let err = component.render().unwrap_err();
		assert!(matches!(err, RenderError::Component { ref message, .. } if message == "bad props"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_async_component_resolves() {
		let component = AsyncComponent::new("Count", 3u32, |count| async move {
			Ok(Node::text(format!("{count} items")))
		});
		assert_eq!(component.name(), "Count");

		let node = component.resolve().await.unwrap();
		assert!(matches!(node, Node::Text(ref t) if t == "3 items"));
	}

	#[rstest]
	fn test_suspense_parts() {
		let boundary = SuspenseBoundary::new("loading", HostElement::new("ul"));
		assert!(matches!(boundary.fallback(), Node::Text(_)));
		assert!(matches!(boundary.child(), Node::Host(_)));

		let (fallback, child) = boundary.into_parts();
		assert_eq!(fallback.kind_name(), "text");
		assert_eq!(child.kind_name(), "host");
	}

	#[rstest]
	fn test_client_boundary_serializes_props() {
		let props = serde_json::json!({ "currentCategory": "Electronics" });
		let boundary = ClientBoundary::new("CategoryFilter", &props, "filters").unwrap();

		assert_eq!(boundary.reference().component, "CategoryFilter");
		assert_eq!(
			boundary.reference().props_json(),
			r#"{"currentCategory":"Electronics"}"#
		);
	}

	#[rstest]
	fn test_client_boundary_rejects_unserializable_props() {
		let err = ClientBoundary::new("Widget", &OpenHandle, Node::Empty).unwrap_err();
		assert!(matches!(err, RenderError::Props(_)));
	}

	#[rstest]
	fn test_client_boundary_round_trips_parts() {
		let boundary = ClientBoundary::new("Counter", &5, "5").unwrap();
		let (reference, child) = boundary.into_parts();
		let boundary = ClientBoundary::from_parts(reference.clone(), child);
		assert_eq!(boundary.reference(), &reference);
	}

	#[rstest]
	fn test_into_node_conversions() {
		assert!(matches!(Some("x").into_node(), Node::Text(_)));
		assert!(matches!(None::<&'static str>.into_node(), Node::Empty));
		assert!(matches!(vec!["a", "b"].into_node(), Node::Fragment(ref c) if c.len() == 2));
		assert!(matches!(().into_node(), Node::Empty));
		assert!(matches!(("a", "b", "c").into_node(), Node::Fragment(ref c) if c.len() == 3));
	}
}
