//! # Tributary HTTP
//!
//! Transport-neutral HTTP types shared by the renderer, the server and
//! applications.
//!
//! - [`Request`]: method, URI, headers and a fully read body
//! - [`Response`]: status, headers and either a complete or a streamed body
//! - [`StreamingResponse`]: builder for streamed bodies
//! - [`Handler`]: the request entry point implemented by applications
//! - [`Error`]: errors a handler may return, each mapped to a status code

pub mod error;
pub mod middleware;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use middleware::Handler;
pub use request::{Request, RequestBuilder};
pub use response::{Body, Response, StreamBody, StreamingResponse};
