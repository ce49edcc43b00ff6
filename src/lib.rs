//! OAuth 2.0 token client with pluggable grants (generic, web, JWT bearer, custom), transparent
//! refresh, and a persistent token cache keyed by the logical identity of each credential.
//!
//! Build an [`OAuthConfig`](config::OAuthConfig), hand it to a [`TokenClient`](flows::TokenClient),
//! and call [`TokenClient::get_authorization`](flows::TokenClient::get_authorization) whenever an
//! `Authorization` header is needed. The client reuses cached tokens, renews them ahead of expiry,
//! and falls back to a full grant when a refresh is rejected.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod decode;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod store;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests and demos.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use crate::{
		config::OAuthConfig,
		flows::TokenClient,
		http::ReqwestHttpClient,
		store::{MemoryStore, TokenCache, TokenStore},
	};

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`TokenClient`] backed by an in-memory store and the reqwest transport used
	/// across integration tests.
	pub fn build_reqwest_test_client(config: OAuthConfig) -> (TokenClient, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let client = TokenClient::builder(config)
			.http_client(test_reqwest_http_client())
			.cache(TokenCache::new(store))
			.build()
			.expect("Failed to build token client for tests.");

		(client, store_backend)
	}

	/// Produces an unsigned three-segment token whose payload carries `claims`.
	///
	/// Only the payload matters to the decoders, so the header and signature are placeholders.
	pub fn unsigned_jwt(claims: &JsonValue) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
		let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

		format!("{header}.{payload}.c2lnbmF0dXJl")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};

	/// JSON object as returned by token endpoints and carried in claims.
	pub type JsonMap = serde_json::Map<String, JsonValue>;
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
