//! Tests for the page request entry point.

use futures::StreamExt;
use hyper::StatusCode;
use rstest::rstest;
use tributary_core::{HostElement, IntoNode, Node, RenderError};
use tributary_http::{Body, Handler, Request};
use tributary_pages::{PageHandler, StreamOptions, StreamingRenderer};

async fn collect(body: Body) -> String {
	match body {
		Body::Full(bytes) => String::from_utf8(bytes.to_vec()).unwrap(),
		Body::Stream(mut stream) => {
			let mut out = Vec::new();
			while let Some(chunk) = stream.next().await {
				out.extend_from_slice(&chunk.unwrap());
			}
			String::from_utf8(out).unwrap()
		}
	}
}

fn catalog_page(request: &Request) -> tributary_core::Result<Node> {
	let category = request.query_param("category");
	Ok(HostElement::new("main")
		.child(Node::suspense(
			HostElement::new("div").attr("class", "loading").child("Loading products..."),
			Node::async_component("ProductList", category, |category| async move {
				tokio::task::yield_now().await;
				let label = category.unwrap_or_else(|| "All".to_string());
				Ok(HostElement::new("p").child(label).into_node())
			}),
		))
		.into_node())
}

#[rstest]
#[tokio::test]
async fn test_page_streams_shell_then_patch() {
	let handler = PageHandler::new(StreamingRenderer::new(), catalog_page);
	let request = Request::builder()
		.uri("/?category=Electronics")
		.build()
		.unwrap();

	let response = handler.handle(request).await.unwrap();

	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(
		response.headers.get("content-type").unwrap(),
		"text/html; charset=utf-8"
	);
	assert!(response.body.is_stream());

	let body = collect(response.body).await;
	assert!(body.starts_with(
		"<main><!--tb-b:1--><div class=\"loading\">Loading products...</div><!--/tb-b:1--></main>"
	));
	assert!(body.ends_with(
		"<template id=\"tb-p:1\"><p>Electronics</p></template><script>$TB(\"1\")</script>"
	));
}

#[rstest]
#[tokio::test]
async fn test_build_error_is_error_document() {
	let handler = PageHandler::new(
		StreamingRenderer::with_options(StreamOptions::new().expose_errors(true)),
		|_request: &Request| Err(RenderError::structural("no root")),
	);
	let request = Request::builder().uri("/").build().unwrap();

	let response = handler.handle(request).await.unwrap();

	assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	let body = collect(response.body).await;
	assert!(body.contains("<h1>Server Error</h1>"));
	assert!(body.contains("Structural error: no root"));
}

#[rstest]
#[tokio::test]
async fn test_structural_error_sends_no_partial_shell() {
	let handler = PageHandler::new(StreamingRenderer::new(), |_request: &Request| {
		Ok(HostElement::new("section")
			.attr("id", "partial")
			.child(Node::async_component("Unwrapped", (), |()| async {
				Ok(Node::Empty)
			}))
			.into_node())
	});
	let request = Request::builder().uri("/").build().unwrap();

	let response = handler.handle(request).await.unwrap();

	assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(!response.body.is_stream());
	let body = collect(response.body).await;
	assert!(!body.contains("partial"));
}
