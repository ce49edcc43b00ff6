//! Loopback listener receiving the authorization server's redirect.

// std
use std::{io, net::SocketAddr};
// crates.io
use tokio::{
	io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
	net::{TcpListener, TcpStream},
	task::JoinSet,
};
use url::form_urlencoded;
// self
use crate::{_prelude::*, error::WebFlowError};

/// Time a single connection gets to deliver its request line and headers.
const CONNECTION_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
const SUCCESS_PAGE: &str = "<!DOCTYPE html><html><head><title>Authorization complete</title></head>\
<body><p>Authorization complete. You may close this window.</p></body></html>";
const FAILURE_PAGE: &str = "<!DOCTYPE html><html><head><title>Authorization failed</title></head>\
<body><p>Authorization failed. Return to the application for details.</p></body></html>";

/// Query parameters delivered to the redirect URI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
	/// Authorization code.
	pub code: Option<String>,
	/// Echoed `state` value.
	pub state: Option<String>,
	/// OAuth `error` parameter.
	pub error: Option<String>,
	/// OAuth `error_description` parameter.
	pub error_description: Option<String>,
}
impl CallbackParams {
	/// Parses the parameters from a URL query string.
	pub fn from_query(query: &str) -> Self {
		let mut params = Self::default();

		for (name, value) in form_urlencoded::parse(query.as_bytes()) {
			let slot = match &*name {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				_ => continue,
			};

			*slot = Some(value.into_owned());
		}

		params
	}

	/// Returns the authorization code once `state` matches `expected_state`.
	pub fn into_code(self, expected_state: &str) -> Result<String, WebFlowError> {
		if self.state.as_deref() != Some(expected_state) {
			return Err(WebFlowError::StateMismatch);
		}
		if let Some(error) = self.error {
			return Err(WebFlowError::Denied { error, description: self.error_description });
		}

		self.code.filter(|code| !code.is_empty()).ok_or(WebFlowError::MissingCode)
	}
}

/// Listener bound to the redirect URI's host and port.
#[derive(Debug)]
pub struct CallbackListener {
	listener: TcpListener,
	path: String,
}
impl CallbackListener {
	/// Binds the address of `redirect_uri`.
	pub async fn bind(redirect_uri: &Url) -> Result<Self, WebFlowError> {
		let host = redirect_uri.host_str().unwrap_or("127.0.0.1");
		let port = redirect_uri.port_or_known_default().unwrap_or_default();
		let addr = format!("{host}:{port}");
		let listener =
			TcpListener::bind(&addr).await.map_err(|source| WebFlowError::Bind { addr, source })?;

		Ok(Self { listener, path: redirect_uri.path().to_owned() })
	}

	/// Address the listener is bound to.
	pub fn local_addr(&self) -> io::Result<SocketAddr> {
		self.listener.local_addr()
	}

	/// Waits up to `timeout` for a GET on the redirect path and returns its query parameters.
	///
	/// Other connections are answered and dropped without ending the wait.
	pub async fn accept_one(self, timeout: Duration) -> Result<CallbackParams, WebFlowError> {
		let seconds = timeout.whole_seconds().unsigned_abs();

		tokio::time::timeout(timeout.unsigned_abs(), self.serve())
			.await
			.map_err(|_| WebFlowError::Timeout { seconds })?
	}

	async fn serve(self) -> Result<CallbackParams, WebFlowError> {
		let Self { listener, path } = self;
		let path = Arc::<str>::from(path);
		let mut connections = JoinSet::new();

		loop {
			tokio::select! {
				accepted = listener.accept() => {
					let (stream, peer) = accepted?;
					let path = path.clone();

					tracing::debug!(%peer, "Received authorization callback connection.");
					connections.spawn(async move {
						tokio::time::timeout(CONNECTION_TIMEOUT, handle(stream, &path)).await
					});
				},
				Some(joined) = connections.join_next() => match joined {
					Ok(Ok(Ok(Some(params)))) => return Ok(params),
					Ok(Ok(Ok(None))) => {},
					Ok(Ok(Err(e))) =>
						tracing::debug!(error = %e, "Dropped a failed callback connection."),
					Ok(Err(_)) => tracing::debug!("Dropped an idle callback connection."),
					Err(e) => tracing::debug!(error = %e, "Callback connection task failed."),
				},
			}
		}
	}
}

/// Serves one connection; `None` unless it carried the redirect.
async fn handle(stream: TcpStream, path: &str) -> Result<Option<CallbackParams>, WebFlowError> {
	let mut reader = BufReader::new(stream);
	let mut request_line = String::new();

	if reader.read_line(&mut request_line).await? == 0 {
		return Ok(None);
	}

	loop {
		let mut header = String::new();

		if reader.read_line(&mut header).await? == 0 || header.trim().is_empty() {
			break;
		}
	}

	let mut stream = reader.into_inner();
	let request_line = request_line.trim();
	let Some(query) = parse_target(request_line, path) else {
		tracing::debug!(request_line, "Ignoring a request outside the redirect path.");
		respond(&mut stream, "404 Not Found", FAILURE_PAGE).await?;

		return Ok(None);
	};
	let params = CallbackParams::from_query(query);
	let (status, page) = if params.code.is_some() && params.error.is_none() {
		("200 OK", SUCCESS_PAGE)
	} else {
		("400 Bad Request", FAILURE_PAGE)
	};

	respond(&mut stream, status, page).await?;

	Ok(Some(params))
}

fn parse_target<'r>(request_line: &'r str, expected_path: &str) -> Option<&'r str> {
	let mut parts = request_line.split_whitespace();
	let (Some("GET"), Some(target)) = (parts.next(), parts.next()) else {
		return None;
	};
	let (path, query) = target.split_once('?').unwrap_or((target, ""));

	(path == expected_path).then_some(query)
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) -> Result<(), WebFlowError> {
	let response = format!(
		"HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
		body.len()
	);

	stream.write_all(response.as_bytes()).await?;
	stream.shutdown().await?;

	Ok(())
}
