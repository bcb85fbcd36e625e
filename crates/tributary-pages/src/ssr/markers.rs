//! Markers embedded in the shell.
//!
//! Two kinds of regions are marked:
//!
//! - suspense placeholders, delimited by a pair of comments carrying the
//!   placeholder id, so a later patch can find and replace the fallback
//! - client islands, a wrapping `<div>` whose attributes carry the component
//!   identifier and its serialized props, so the client bootstrap can
//!   re-attach behaviour

use tributary_core::ClientReference;
use tributary_core::node::html_escape;

use super::boundary::PlaceholderId;

/// Comment prefix opening a placeholder region.
pub const PLACEHOLDER_PREFIX: &str = "tb-b:";

/// The attribute name for island ids.
pub const ISLAND_ATTR_ID: &str = "data-tb-island";

/// The attribute name for the client component identifier.
pub const ISLAND_ATTR_COMPONENT: &str = "data-tb-component";

/// The attribute name for serialized props.
pub const ISLAND_ATTR_PROPS: &str = "data-tb-props";

/// Opening comment of the placeholder region for `id`.
pub fn placeholder_start(id: PlaceholderId) -> String {
	format!("<!--{PLACEHOLDER_PREFIX}{id}-->")
}

/// Closing comment of the placeholder region for `id`.
pub fn placeholder_end(id: PlaceholderId) -> String {
	format!("<!--/{PLACEHOLDER_PREFIX}{id}-->")
}

/// Wraps rendered fallback markup in the placeholder comments for `id`.
pub fn placeholder_region(id: PlaceholderId, fallback: &str) -> String {
	let mut out = placeholder_start(id);
	out.push_str(fallback);
	out.push_str(&placeholder_end(id));
	out
}

/// Represents a client island embedded in the shell.
#[derive(Debug, Clone)]
pub struct IslandMarker {
	/// Per-render island id, `c0`, `c1`, ...
	pub id: String,
	/// Stable component identifier.
	pub component: String,
	/// Serialized props (JSON).
	pub props: String,
}

impl IslandMarker {
	/// Creates a marker for the `n`th island of a render.
	pub fn new(n: u64, reference: &ClientReference) -> Self {
		Self {
			id: format!("c{n}"),
			component: reference.component.to_string(),
			props: reference.props_json(),
		}
	}

	/// Generates the HTML attributes for this marker.
	pub fn to_attrs(&self) -> [(&'static str, &str); 3] {
		[
			(ISLAND_ATTR_ID, self.id.as_str()),
			(ISLAND_ATTR_COMPONENT, self.component.as_str()),
			(ISLAND_ATTR_PROPS, self.props.as_str()),
		]
	}

	/// Generates the HTML attribute string for this marker.
	pub fn to_attr_string(&self) -> String {
		self.to_attrs()
			.iter()
			.map(|(k, v)| format!("{}=\"{}\"", k, html_escape(v)))
			.collect::<Vec<_>>()
			.join(" ")
	}

	/// Opening tag of the island wrapper.
	pub fn open_tag(&self) -> String {
		format!("<div {}>", self.to_attr_string())
	}

	/// Closing tag of the island wrapper.
	pub fn close_tag(&self) -> &'static str {
		"</div>"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_placeholder_region() {
		let id = PlaceholderId::from(1);
		assert_eq!(
			placeholder_region(id, "<span>loading</span>"),
			"<!--tb-b:1--><span>loading</span><!--/tb-b:1-->"
		);
	}

	#[rstest]
	fn test_island_marker_attrs() {
		let reference = ClientReference {
			component: "CategoryFilter".into(),
			props: serde_json::json!({ "currentCategory": null }),
		};
		let marker = IslandMarker::new(0, &reference);

		assert_eq!(marker.id, "c0");
		assert_eq!(
			marker.open_tag(),
			r#"<div data-tb-island="c0" data-tb-component="CategoryFilter" data-tb-props="{&quot;currentCategory&quot;:null}">"#
		);
	}

	#[rstest]
	fn test_island_props_cannot_break_out_of_attribute() {
		let reference = ClientReference {
			component: "Note".into(),
			props: serde_json::json!({ "text": "\"><script>" }),
		};
		let attrs = IslandMarker::new(3, &reference).to_attr_string();

		assert!(!attrs.contains("\"><script>"));
		assert!(attrs.contains("data-tb-island=\"c3\""));
	}
}
