use bytes::Bytes;
use futures::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use tributary_http::{Body, Handler, Request, Response};

/// Boxed error type used by the server.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body type handed to hyper: complete or streamed.
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// How long [`HttpServer::serve`] waits for open connections after shutdown.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// HTTP/1.1 server dispatching every request to one handler.
pub struct HttpServer {
	pub handler: Arc<dyn Handler>,
	grace_period: Duration,
}

impl HttpServer {
	/// Create a new server with the given handler
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			grace_period: DEFAULT_GRACE_PERIOD,
		}
	}

	/// Sets how long open connections may keep running after shutdown.
	pub fn grace_period(mut self, grace_period: Duration) -> Self {
		self.grace_period = grace_period;
		self
	}

	/// Returns a clone of the server's handler.
	pub fn handler(&self) -> Arc<dyn Handler> {
		self.handler.clone()
	}

	/// Start the server and listen on the given address
	///
	/// Runs until an error occurs.
	///
	/// # Errors
	///
	/// Returns an error when the address cannot be bound.
	pub async fn listen(self, addr: SocketAddr) -> Result<(), BoxError> {
		self.listen_with_shutdown(addr, std::future::pending()).await
	}

	/// Start the server, stopping once `shutdown` completes.
	///
	/// # Examples
	///
	/// ```no_run
	/// use std::sync::Arc;
	/// use std::net::SocketAddr;
	/// use tributary_server::{HttpServer, shutdown_signal};
	/// use tributary_http::{Handler, Request, Response};
	///
	/// struct MyHandler;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for MyHandler {
	/// 	async fn handle(&self, _req: Request) -> tributary_http::Result<Response> {
	/// 		Ok(Response::ok().with_body("Hello"))
	/// 	}
	/// }
	///
	/// # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	/// let addr: SocketAddr = "127.0.0.1:3000".parse()?;
	/// HttpServer::new(Arc::new(MyHandler))
	/// 	.listen_with_shutdown(addr, shutdown_signal())
	/// 	.await?;
	/// # Ok(())
	/// # }
	/// ```
	///
	/// # Errors
	///
	/// Returns an error when the address cannot be bound.
	pub async fn listen_with_shutdown<F>(self, addr: SocketAddr, shutdown: F) -> Result<(), BoxError>
	where
		F: Future<Output = ()>,
	{
		let listener = TcpListener::bind(addr).await?;
		info!(addr = %listener.local_addr()?, "server listening");
		self.serve(listener, shutdown).await
	}

	/// Accept connections from an already bound listener until `shutdown`
	/// completes.
	///
	/// Once `shutdown` completes no new connections are accepted. Open
	/// connections finish their in-flight response and are then closed;
	/// `serve` returns when all of them are gone, or aborts the rest once the
	/// grace period elapses.
	///
	/// # Errors
	///
	/// Currently infallible; accept errors are logged and skipped.
	pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), BoxError>
	where
		F: Future<Output = ()>,
	{
		tokio::pin!(shutdown);
		let (stop_tx, stop_rx) = watch::channel(false);
		let mut connections = JoinSet::new();

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, remote_addr) = match result {
						Ok(accepted) => accepted,
						Err(err) => {
							warn!(error = %err, "failed to accept connection");
							continue;
						}
					};
					let handler = self.handler.clone();
					let stop = stop_rx.clone();

					connections.spawn(async move {
						if let Err(err) = Self::serve_connection(stream, remote_addr, handler, stop).await {
							debug!(remote = %remote_addr, error = %err, "connection closed with error");
						}
					});
				}
				Some(_) = connections.join_next(), if !connections.is_empty() => {}
				() = &mut shutdown => {
					info!("shutdown signal received, stopping server");
					break;
				}
			}
		}
		drop(listener);

		let _ = stop_tx.send(true);
		if !connections.is_empty() {
			info!(open = connections.len(), "waiting for open connections");
		}
		let drained = tokio::time::timeout(self.grace_period, async {
			while connections.join_next().await.is_some() {}
		})
		.await;
		if drained.is_err() {
			warn!(
				remaining = connections.len(),
				grace_period = ?self.grace_period,
				"grace period elapsed, aborting connections"
			);
			connections.shutdown().await;
		}

		Ok(())
	}

	/// Handle a single TCP connection by processing HTTP requests
	///
	/// # Errors
	///
	/// Returns the connection-level error reported by hyper.
	pub async fn handle_connection(
		stream: TcpStream,
		remote_addr: SocketAddr,
		handler: Arc<dyn Handler>,
	) -> Result<(), BoxError> {
		let (_stop_tx, stop) = watch::channel(false);
		Self::serve_connection(stream, remote_addr, handler, stop).await
	}

	/// Serves one connection until it closes, or until `stop` changes, after
	/// which the in-flight response is finished and the connection closed.
	async fn serve_connection(
		stream: TcpStream,
		remote_addr: SocketAddr,
		handler: Arc<dyn Handler>,
		mut stop: watch::Receiver<bool>,
	) -> Result<(), BoxError> {
		let io = TokioIo::new(stream);
		let service = RequestService {
			handler,
			remote_addr,
		};

		let connection = http1::Builder::new().serve_connection(io, service);
		tokio::pin!(connection);

		tokio::select! {
			result = connection.as_mut() => {
				result?;
				return Ok(());
			}
			_ = stop.changed() => {}
		}

		connection.as_mut().graceful_shutdown();
		connection.await?;

		Ok(())
	}
}

/// Converts a response into hyper's representation.
///
/// # Errors
///
/// Returns an error when the status or headers are rejected by hyper.
pub fn into_hyper_response(response: Response) -> Result<hyper::Response<ResponseBody>, BoxError> {
	let body = match response.body {
		Body::Full(bytes) => Full::new(bytes)
			.map_err(|never: Infallible| -> BoxError { match never {} })
			.boxed_unsync(),
		Body::Stream(stream) => StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync(),
	};

	let mut builder = hyper::Response::builder().status(response.status);
	for (key, value) in response.headers.iter() {
		builder = builder.header(key, value);
	}

	Ok(builder.body(body)?)
}

/// Service implementation for hyper
struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<ResponseBody>;
	type Error = BoxError;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			let body_bytes = body.collect().await?.to_bytes();

			let mut request = Request::new(
				parts.method,
				parts.uri,
				parts.version,
				parts.headers,
				body_bytes,
			);
			request.remote_addr = Some(remote_addr);

			let method = request.method.clone();
			let path = request.path().to_string();

			let response = match handler.handle(request).await {
				Ok(response) => response,
				Err(err) => {
					error!(method = %method, path = %path, error = %err, "handler failed");
					Response::from(err)
				}
			};
			info!(
				method = %method,
				path = %path,
				status = response.status.as_u16(),
				streamed = response.body.is_stream(),
				"request"
			);

			into_hyper_response(response)
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::StatusCode;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_full_body_keeps_status_and_headers() {
		let response = Response::not_found()
			.with_header("x-test", "yes")
			.with_body("missing");

		let hyper_response = into_hyper_response(response).unwrap();

		assert_eq!(hyper_response.status(), StatusCode::NOT_FOUND);
		assert_eq!(hyper_response.headers().get("x-test").unwrap(), "yes");
		let bytes = hyper_response.into_body().collect().await.unwrap().to_bytes();
		assert_eq!(&bytes[..], b"missing");
	}

	#[rstest]
	#[tokio::test]
	async fn test_stream_body_is_concatenated() {
		let chunks: Vec<Result<Bytes, BoxError>> =
			vec![Ok(Bytes::from_static(b"<p>a</p>")), Ok(Bytes::from_static(b"<p>b</p>"))];
		let response = tributary_http::StreamingResponse::new(futures::stream::iter(chunks))
			.media_type("text/html; charset=utf-8")
			.into_response();

		let hyper_response = into_hyper_response(response).unwrap();

		assert_eq!(
			hyper_response.headers().get("content-type").unwrap(),
			"text/html; charset=utf-8"
		);
		let bytes = hyper_response.into_body().collect().await.unwrap().to_bytes();
		assert_eq!(&bytes[..], b"<p>a</p><p>b</p>");
	}
}
