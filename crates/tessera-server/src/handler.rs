use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::request::Request;
use crate::response::Response;

/// Handler trait for processing requests
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> Result<Response>;
}

/// Blanket implementation for `Arc<T>` where T: Handler
#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

/// Handler backed by an async closure; see [`handler_fn`]
pub struct FnHandler<F> {
	f: F,
}

/// Wrap an async function as a [`Handler`]
///
/// # Examples
///
/// ```
/// use tessera_server::{Response, handler_fn};
///
/// let hello = handler_fn(|_request| async { Ok(Response::ok().with_body("Hello")) });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
	F: Fn(Request) -> Fut + Send + Sync,
	Fut: Future<Output = Result<Response>> + Send,
{
	FnHandler { f }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
	F: Fn(Request) -> Fut + Send + Sync,
	Fut: Future<Output = Result<Response>> + Send,
{
	async fn handle(&self, request: Request) -> Result<Response> {
		(self.f)(request).await
	}
}
