//! Wire format of the streamed response.
//!
//! A response is one shell chunk followed by zero or more patch chunks:
//!
//! ```text
//! <shell markup, placeholders wrapped in <!--tb-b:N--> ... <!--/tb-b:N-->>
//! <script>function $TB(id){...}</script>            (once, before the first patch)
//! <template id="tb-p:N">markup</template><script>$TB("N")</script>
//! ...
//! ```
//!
//! The receiving side applies a patch by replacing the region between the
//! two comments for its id with the template content. Ids it cannot find are
//! ignored. [`reconstruct`] performs the same splice over strings.

use bytes::Bytes;
use tributary_core::node::html_escape;

use super::boundary::PlaceholderId;
use super::markers::{placeholder_end, placeholder_start};

/// Inline script defining `$TB`, sent once before the first patch.
pub const PATCH_RUNTIME: &str = concat!(
	"<script>function $TB(id){",
	"var t=document.getElementById(\"tb-p:\"+id);if(!t)return;",
	"var s=t.nextElementSibling;",
	"var w=document.createTreeWalker(document,NodeFilter.SHOW_COMMENT),a=null,b=null,n;",
	"while((n=w.nextNode())){if(n.data===\"tb-b:\"+id){a=n}else if(a&&n.data===\"/tb-b:\"+id){b=n;break}}",
	"if(a&&b){var p=a.parentNode;while(a.nextSibling&&a.nextSibling!==b){p.removeChild(a.nextSibling)}",
	"p.insertBefore(t.content,b);p.removeChild(a);p.removeChild(b)}",
	"t.remove();if(s&&s.tagName===\"SCRIPT\"){s.remove()}",
	"}</script>"
);

/// Fragment patched into a failed placeholder under the inline-error policy.
pub const INLINE_ERROR_FRAGMENT: &str =
	r#"<div class="tb-error" role="alert">Failed to load this section.</div>"#;

/// One unit written to the stream sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
	/// The committed shell.
	Shell(String),
	/// Replacement markup for a placeholder.
	Patch {
		/// Target placeholder.
		id: PlaceholderId,
		/// Replacement markup.
		markup: String,
		/// Whether the `$TB` runtime precedes this patch.
		with_runtime: bool,
	},
}

impl StreamChunk {
	/// Serializes the chunk for the wire.
	pub fn to_html(&self) -> String {
		match self {
			Self::Shell(html) => html.clone(),
			Self::Patch {
				id,
				markup,
				with_runtime,
			} => {
				let mut out = String::with_capacity(markup.len() + 96);
				if *with_runtime {
					out.push_str(PATCH_RUNTIME);
				}
				out.push_str(&patch_unit(*id, markup));
				out
			}
		}
	}

	/// Serializes the chunk into bytes for a transport.
	pub fn into_bytes(self) -> Bytes {
		match self {
			Self::Shell(html) => Bytes::from(html),
			patch => Bytes::from(patch.to_html()),
		}
	}
}

/// A single patch unit without the runtime.
pub fn patch_unit(id: PlaceholderId, markup: &str) -> String {
	format!("<template id=\"tb-p:{id}\">{markup}</template><script>$TB(\"{id}\")</script>")
}

/// `<script>` tag loading a client bootstrap module.
pub fn bootstrap_script_tag(src: &str) -> String {
	format!(
		"<script type=\"module\" src=\"{}\" async></script>",
		html_escape(src)
	)
}

/// Appends bootstrap script tags to a shell, before `</body>` when present.
pub fn inject_bootstrap_scripts(shell: String, scripts: &[String]) -> String {
	if scripts.is_empty() {
		return shell;
	}
	let tags: String = scripts.iter().map(|src| bootstrap_script_tag(src)).collect();
	match shell.rfind("</body>") {
		Some(pos) => {
			let mut out = String::with_capacity(shell.len() + tags.len());
			out.push_str(&shell[..pos]);
			out.push_str(&tags);
			out.push_str(&shell[pos..]);
			out
		}
		None => shell + &tags,
	}
}

/// Minimal document substituted for the shell when it fails.
///
/// `detail` is only included when errors are exposed (debug mode).
pub fn error_document(detail: Option<&str>) -> String {
	let mut html = String::from(
		"<!DOCTYPE html><html><head><title>Error</title></head><body><h1>Server Error</h1>",
	);
	if let Some(detail) = detail {
		html.push_str("<pre>");
		html.push_str(&html_escape(detail));
		html.push_str("</pre>");
	}
	html.push_str("</body></html>");
	html
}

/// Applies patches to a shell the way `$TB` does on the client.
///
/// Patches are applied in the given order; a patch whose placeholder is not
/// present (never emitted, or removed by an earlier patch) is ignored. A
/// patch may introduce new placeholders that later patches target.
pub fn reconstruct<'a, I>(shell: &str, patches: I) -> String
where
	I: IntoIterator<Item = (PlaceholderId, &'a str)>,
{
	let mut document = shell.to_string();
	for (id, markup) in patches {
		let start = placeholder_start(id);
		let end = placeholder_end(id);
		let Some(open) = document.find(&start) else {
			continue;
		};
		let Some(close) = document[open..].find(&end).map(|pos| open + pos) else {
			continue;
		};
		document.replace_range(open..close + end.len(), markup);
	}
	document
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_patch_unit() {
		assert_eq!(
			patch_unit(PlaceholderId::from(2), "<span>3 items</span>"),
			"<template id=\"tb-p:2\"><span>3 items</span></template><script>$TB(\"2\")</script>"
		);
	}

	#[rstest]
	fn test_first_patch_carries_runtime() {
		let chunk = StreamChunk::Patch {
			id: PlaceholderId::from(1),
			markup: "x".into(),
			with_runtime: true,
		};
		let html = chunk.to_html();
		assert!(html.starts_with(PATCH_RUNTIME));
		assert!(html.ends_with("<script>$TB(\"1\")</script>"));
	}

	#[rstest]
	fn test_shell_bytes_are_verbatim() {
		let chunk = StreamChunk::Shell("<div><p>static</p></div>".into());
		assert_eq!(&chunk.into_bytes()[..], b"<div><p>static</p></div>");
	}

	#[rstest]
	#[case("<html><body><div></div></body></html>", "<html><body><div></div><script type=\"module\" src=\"/client.js\" async></script></body></html>")]
	#[case("<div></div>", "<div></div><script type=\"module\" src=\"/client.js\" async></script>")]
	fn test_inject_bootstrap_scripts(#[case] shell: &str, #[case] expected: &str) {
		let scripts = vec!["/client.js".to_string()];
		assert_eq!(inject_bootstrap_scripts(shell.to_string(), &scripts), expected);
	}

	#[rstest]
	fn test_no_bootstrap_scripts_leaves_shell_untouched() {
		assert_eq!(inject_bootstrap_scripts("<p>a</p>".into(), &[]), "<p>a</p>");
	}

	#[rstest]
	fn test_error_document_hides_detail_by_default() {
		let doc = error_document(None);
		assert!(doc.contains("<h1>Server Error</h1>"));
		assert!(!doc.contains("<pre>"));
	}

	#[rstest]
	fn test_error_document_escapes_detail() {
		let doc = error_document(Some("bad <tag>"));
		assert!(doc.contains("<pre>bad &lt;tag&gt;</pre>"));
	}

	#[rstest]
	fn test_reconstruct_replaces_region() {
		let shell = "<ul><!--tb-b:1--><li>loading</li><!--/tb-b:1--></ul>";
		let doc = reconstruct(shell, [(PlaceholderId::from(1), "<li>a</li><li>b</li>")]);
		assert_eq!(doc, "<ul><li>a</li><li>b</li></ul>");
	}

	#[rstest]
	fn test_reconstruct_ignores_unknown_ids() {
		let shell = "<p>done</p>";
		assert_eq!(reconstruct(shell, [(PlaceholderId::from(9), "x")]), shell);
	}

	#[rstest]
	fn test_reconstruct_nested_placeholders() {
		let shell = "<main><!--tb-b:1-->outer<!--/tb-b:1--></main>";
		let doc = reconstruct(
			shell,
			[
				(PlaceholderId::from(1), "<section><!--tb-b:2-->inner<!--/tb-b:2--></section>"),
				(PlaceholderId::from(2), "<p>deep</p>"),
			],
		);
		assert_eq!(doc, "<main><section><p>deep</p></section></main>");
	}

	#[rstest]
	fn test_reconstruct_does_not_confuse_prefix_ids() {
		let shell = "<!--tb-b:1-->a<!--/tb-b:1--><!--tb-b:12-->b<!--/tb-b:12-->";
		let doc = reconstruct(shell, [(PlaceholderId::from(12), "B"), (PlaceholderId::from(1), "A")]);
		assert_eq!(doc, "AB");
	}
}
