//! HTTP server for Tributary.
//!
//! An HTTP/1.1 server based on Hyper. Complete bodies are sent as-is;
//! streamed bodies are forwarded chunk by chunk as the handler produces them.
//! When the peer disconnects, hyper drops the body, which is how a streamed
//! render learns that nobody is listening anymore.
//!
//! ## Basic Usage
//!
//! ```rust,ignore
//! use tributary_server::{HttpServer, shutdown_signal};
//!
//! let addr: SocketAddr = "127.0.0.1:3000".parse()?;
//! HttpServer::new(handler)
//! 	.listen_with_shutdown(addr, shutdown_signal())
//! 	.await?;
//! ```

pub mod http;
pub mod shutdown;

pub use http::{BoxError, DEFAULT_GRACE_PERIOD, HttpServer, ResponseBody, into_hyper_response};
pub use shutdown::shutdown_signal;
