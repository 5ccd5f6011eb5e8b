//! # Tessera Server
//!
//! HTTP collaborator for Tessera applications: a [`Dispatcher`] routing
//! requests to a static file directory, exact-path [`Handler`]s, or a fixed
//! `404 Not Found`, served over hyper's HTTP/1 implementation on tokio.
//! [`PageHandler`] answers with documents rendered by
//! [`tessera_pages::ssr::SsrRenderer`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tessera_pages::vnode::{Props, element};
//! use tessera_server::{Dispatcher, HttpServer, PageHandler, ServerConfig, handler_fn, Response};
//!
//! let config = ServerConfig::from_toml_str(r#"addr = "127.0.0.1:3000""#)?;
//! let dispatcher = Dispatcher::from_config(&config)
//!     .route("/", PageHandler::new(|| element("h1", Props::new(), ["Hello"])))
//!     .route("/api/health", handler_fn(|_| async { Ok(Response::ok().with_body("ok")) }));
//!
//! HttpServer::new(Arc::new(dispatcher)).listen(config.addr).await?;
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod page;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use config::ServerConfig;
pub use dispatcher::Dispatcher;
pub use error::{Result, ServerError};
pub use handler::{FnHandler, Handler, handler_fn};
pub use page::PageHandler;
pub use request::Request;
pub use response::{NOT_FOUND_BODY, Response};
pub use server::{HttpServer, serve};
pub use static_files::{StaticFiles, content_type_for};
