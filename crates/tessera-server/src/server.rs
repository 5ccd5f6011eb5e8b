use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use crate::error::Result;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;

/// HTTP/1 server over a [`Handler`]
pub struct HttpServer {
	handler: Arc<dyn Handler>,
}

impl HttpServer {
	/// Create a new server with the given handler
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use tessera_server::{Dispatcher, HttpServer};
	///
	/// let server = HttpServer::new(Arc::new(Dispatcher::new()));
	/// ```
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self { handler }
	}

	/// Bind `addr` and serve connections until an accept error occurs
	///
	/// # Examples
	///
	/// ```no_run
	/// use std::sync::Arc;
	/// use tessera_server::{Dispatcher, HttpServer};
	///
	/// # async fn example() -> tessera_server::Result<()> {
	/// let dispatcher = Dispatcher::new().static_files("/static/", "static");
	/// HttpServer::new(Arc::new(dispatcher))
	///     .listen("127.0.0.1:8000".parse().unwrap())
	///     .await
	/// # }
	/// ```
	pub async fn listen(self, addr: SocketAddr) -> Result<()> {
		let listener = TcpListener::bind(addr).await?;
		self.serve(listener).await
	}

	/// Serve connections accepted from an already bound listener
	pub async fn serve(self, listener: TcpListener) -> Result<()> {
		tracing::info!(addr = %listener.local_addr()?, "server listening");

		loop {
			let (stream, remote_addr) = listener.accept().await?;
			let handler = self.handler.clone();

			tokio::task::spawn(async move {
				if let Err(err) = Self::handle_connection(stream, handler).await {
					tracing::error!(%remote_addr, error = %err, "error handling connection");
				}
			});
		}
	}

	/// Serve HTTP/1 requests on a single connection
	pub async fn handle_connection(stream: TcpStream, handler: Arc<dyn Handler>) -> Result<()> {
		let io = TokioIo::new(stream);
		let service = service_fn(move |req: hyper::Request<Incoming>| {
			let handler = handler.clone();
			async move { Ok::<_, Infallible>(respond(handler.as_ref(), req).await) }
		});

		http1::Builder::new().serve_connection(io, service).await?;
		Ok(())
	}
}

async fn respond(handler: &dyn Handler, req: hyper::Request<Incoming>) -> hyper::Response<Full<Bytes>> {
	let (parts, body) = req.into_parts();
	let response = match body.collect().await {
		Ok(collected) => {
			let request = Request::new(
				parts.method,
				parts.uri,
				parts.version,
				parts.headers,
				collected.to_bytes(),
			);
			let path = request.path().to_string();
			handler.handle(request).await.unwrap_or_else(|err| {
				tracing::error!(%path, error = %err, "handler failed");
				Response::internal_server_error()
			})
		}
		Err(err) => {
			tracing::error!(error = %err, "failed to read request body");
			Response::internal_server_error()
		}
	};

	response.into_http().map(Full::new)
}

/// Serve `handler` on `addr`
pub async fn serve(addr: SocketAddr, handler: Arc<dyn Handler>) -> Result<()> {
	HttpServer::new(handler).listen(addr).await
}
