//! Error taxonomy shared by the token client, grant strategies, and stores.
//!
//! Only [`Error::Config`], [`Error::Protocol`], [`Error::AuthFailure`] (plus the infrastructure
//! variants for transports, stores, and the interactive web flow) ever reach callers. Decoding
//! misses and rejected refresh attempts are absorbed by the client and only logged.

// std
use std::io;
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem; never retried.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint answered successfully but the payload is unusable.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Interactive authorization-code flow failed.
	#[error(transparent)]
	WebFlow(#[from] WebFlowError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token endpoint rejected the primary grant with a non-2xx status.
	#[error("Token endpoint rejected the {grant} grant with HTTP status {status}.")]
	AuthFailure {
		/// Grant tag that produced the request.
		grant: String,
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Truncated response body for diagnostics.
		body: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// No HTTP client was supplied and no default transport is compiled in.
	#[error("No HTTP client configured; enable the `reqwest` feature or supply one.")]
	MissingHttpClient,
	/// The base URL was not supplied.
	#[error("Base URL is required.")]
	MissingBaseUrl,
	/// A configured URL cannot be parsed.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Which configuration field failed to parse.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A configured URL uses a scheme other than `http` or `https`.
	#[error("The {field} URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which configuration field failed validation.
		field: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// No grant was selected.
	#[error("A grant type must be configured.")]
	MissingGrant,
	/// The grant tag is neither built in nor registered as a custom grant.
	#[error("Token creation type `{tag}` is unknown.")]
	UnknownGrant {
		/// Offending grant tag.
		tag: String,
	},
	/// A custom grant tried to reuse a built-in grant tag.
	#[error("Grant tag `{tag}` is reserved for a built-in grant.")]
	ReservedGrantTag {
		/// Offending grant tag.
		tag: String,
	},
	/// JWT grant was configured without a payload.
	#[error("JWT grant requires a payload.")]
	MissingJwtPayload,
	/// The JWT private key could not be loaded.
	#[error("JWT private key is invalid.")]
	InvalidSigningKey {
		/// Underlying key parsing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Signing the JWT assertion failed.
	#[error("Unable to sign the JWT assertion.")]
	JwtSign {
		/// Underlying signing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Web grant was configured without a redirect URI.
	#[error("Web grant requires a redirect URI.")]
	MissingRedirectUri,
	/// Redirect URI lacks the explicit port the loopback listener binds to.
	#[error("Redirect URI must carry an explicit port: {url}.")]
	MissingRedirectPort {
		/// Redirect URI that failed validation.
		url: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Token endpoint payload problems (fatal, never retried).
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// The configured access-token field is absent (or not a string).
	#[error("API error: no such field in answer: {field}.")]
	MissingTokenField {
		/// Name of the expected token field.
		field: String,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with JSON that is not an object.
	#[error("Token endpoint returned a JSON {kind} instead of an object.")]
	NotAnObject {
		/// JSON kind that was received.
		kind: &'static str,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Failures of the browser-based authorization-code flow.
#[derive(Debug, ThisError)]
pub enum WebFlowError {
	/// The loopback listener could not bind the redirect address.
	#[error("Unable to listen on {addr} for the authorization callback.")]
	Bind {
		/// Address derived from the redirect URI.
		addr: String,
		/// Underlying socket failure.
		#[source]
		source: io::Error,
	},
	/// Reading or answering the callback request failed.
	#[error("Authorization callback connection failed.")]
	Callback(#[from] io::Error),
	/// The returned `state` does not match the generated one.
	#[error("Authorization state does not match.")]
	StateMismatch,
	/// The callback carried no authorization code.
	#[error("Authorization callback is missing the code parameter.")]
	MissingCode,
	/// The authorization server reported an error through the callback.
	#[error("Authorization was denied: {error}.")]
	Denied {
		/// OAuth `error` parameter.
		error: String,
		/// OAuth `error_description` parameter, if present.
		description: Option<String>,
	},
	/// No callback arrived before the configured timeout.
	#[error("No authorization callback received within {seconds} seconds.")]
	Timeout {
		/// Timeout that elapsed, in whole seconds.
		seconds: u64,
	},
	/// The browser could not be launched.
	#[error("Unable to open the authorization page in a browser.")]
	Browser {
		/// Underlying launcher failure.
		#[source]
		source: io::Error,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
