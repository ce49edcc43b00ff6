//! Transport primitives for token endpoint calls.
//!
//! The module exposes [`TokenHttpClient`], the client's only dependency on an HTTP stack, along
//! with the [`TokenHttpResponse`] it yields. Every grant submits its parameters as a URL-form-encoded
//! POST with `Accept: application/json`; the transport reports the status, the `Retry-After`
//! hint, and the raw body so the caller can persist the response verbatim.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::header::{ACCEPT, HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Form parameters submitted to the token endpoint.
pub type TokenForm = BTreeMap<String, String>;

/// Boxed future returned by [`TokenHttpClient::post_form`].
pub type HttpFuture<'a, T> =
	Pin<Box<dyn Future<Output = std::result::Result<T, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of calling the token endpoint.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared across
/// clients behind an `Arc`. Non-2xx statuses are *not* transport errors: they are returned as a
/// regular [`TokenHttpResponse`] so the client can decide between falling back and failing.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// POSTs `form` URL-form-encoded to `url` with `Accept: application/json`.
	fn post_form<'a>(&'a self, url: &'a Url, form: &'a TokenForm)
	-> HttpFuture<'a, TokenHttpResponse>;
}

/// Status, retry hint, and raw body of a token endpoint response.
#[derive(Clone, Debug, Default)]
pub struct TokenHttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Response body exactly as received.
	pub body: Vec<u8>,
}
impl TokenHttpResponse {
	/// Creates a response without a retry hint.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, retry_after: None, body: body.into() }
	}

	/// Returns `true` for any 2xx status.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Lossy, length-limited rendering of the body suitable for error messages.
	pub fn body_preview(&self) -> String {
		let body = String::from_utf8_lossy(&self.body);

		if body.chars().count() <= BODY_PREVIEW_LIMIT {
			return body.into_owned();
		}

		let mut buf = body.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

		buf.push('…');

		buf
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token requests should not follow redirects; configure any custom [`ReqwestClient`]
/// accordingly before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	fn post_form<'a>(
		&'a self,
		url: &'a Url,
		form: &'a TokenForm,
	) -> HttpFuture<'a, TokenHttpResponse> {
		Box::pin(async move {
			let response = self
				.0
				.post(url.clone())
				.header(ACCEPT, "application/json")
				.form(form)
				.send()
				.await?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await?.to_vec();

			Ok(TokenHttpResponse { status, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<i64>() {
		return Some(Duration::seconds(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
