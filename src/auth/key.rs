//! Cache identities derived from the request parameters that define a distinct credential.
//!
//! A [`CacheKey`] is built from the token category, the token endpoint's host and path, and the
//! values of the configured [`IdentityElement`]s. Each component is length-prefixed and hashed
//! together with its element label, so two configurations that request different tokens never
//! share an entry while repeated invocations of the same request always land on the same one.

// std
use std::borrow::Borrow;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	config::{GrantConfig, OAuthConfig},
};

/// Category shared by every token entry; garbage collection and flushing operate on it.
pub const TOKEN_CATEGORY: &str = "token";

/// Configuration values that distinguish one credential from another, in hashing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentityElement {
	/// Requested scope.
	Scope,
	/// Grant tag (`generic`, `web`, `jwt`, or a custom name).
	GrantTag,
	/// OAuth client identifier.
	ClientId,
	/// Username the credential acts for.
	Username,
	/// `sub` claim of the JWT assertion payload.
	JwtSubject,
	/// `grant_type` of a generic grant, reduced to the suffix after its last `:`.
	GenericGrantType,
	/// `apikey` of a generic grant.
	GenericApiKey,
	/// `response_type` of a generic grant.
	GenericResponseType,
	/// URL token of a public link.
	PublicLinkToken,
}
impl IdentityElement {
	/// Every element in the order it contributes to the key.
	pub const ORDERED: [Self; 9] = [
		Self::Scope,
		Self::GrantTag,
		Self::ClientId,
		Self::Username,
		Self::JwtSubject,
		Self::GenericGrantType,
		Self::GenericApiKey,
		Self::GenericResponseType,
		Self::PublicLinkToken,
	];

	/// Stable label hashed alongside the element's value.
	pub const fn label(self) -> &'static str {
		match self {
			Self::Scope => "scope",
			Self::GrantTag => "crtype",
			Self::ClientId => "client_id",
			Self::Username => "auth.username",
			Self::JwtSubject => "jwt.payload.sub",
			Self::GenericGrantType => "generic.grant_type",
			Self::GenericApiKey => "generic.apikey",
			Self::GenericResponseType => "generic.response_type",
			Self::PublicLinkToken => "pub_link.url_token",
		}
	}

	/// Looks up the element's value in `config`, if present.
	pub fn resolve(self, config: &OAuthConfig) -> Option<String> {
		match self {
			Self::Scope => config.scope().map(str::to_owned),
			Self::GrantTag => Some(config.grant().tag().to_owned()),
			Self::ClientId => config.client_id().map(str::to_owned),
			Self::Username => config.username().map(str::to_owned),
			Self::JwtSubject => match config.grant() {
				GrantConfig::Jwt(jwt) => jwt.payload.get("sub").and_then(scalar_text),
				_ => None,
			},
			Self::GenericGrantType => generic_param(config, "grant_type")
				.map(|value| value.rsplit(':').next().unwrap_or(value).to_owned()),
			Self::GenericApiKey => generic_param(config, "apikey").map(str::to_owned),
			Self::GenericResponseType => generic_param(config, "response_type").map(str::to_owned),
			Self::PublicLinkToken => config.public_link_token().map(str::to_owned),
		}
	}
}

/// Opaque, filesystem-safe identifier of a cached token.
///
/// The textual form is `<category>.<fingerprint>` where the fingerprint is an unpadded URL-safe
/// base64 SHA-256 digest. The fingerprint alphabet has no `.`, so the category is everything
/// before the last one.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);
impl CacheKey {
	/// Derives the key for `config` from its token endpoint and identity elements.
	pub fn for_config(config: &OAuthConfig) -> Self {
		let endpoint = config.token_endpoint();
		let elements = IdentityElement::ORDERED
			.into_iter()
			.filter_map(|element| element.resolve(config).map(|value| (element.label(), value)))
			.collect::<Vec<_>>();

		Self::from_components(
			TOKEN_CATEGORY,
			endpoint.host_str().unwrap_or_default(),
			endpoint.path(),
			elements.iter().map(|(label, value)| (*label, value.as_str())),
		)
	}

	/// Builds a key from explicit components; `elements` pairs each label with its value.
	pub fn from_components<'a, I>(category: &str, host: &str, path: &str, elements: I) -> Self
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let mut hasher = Sha256::new();

		feed(&mut hasher, category);
		feed(&mut hasher, host);
		feed(&mut hasher, path);

		for (label, value) in elements {
			feed(&mut hasher, label);
			feed(&mut hasher, value);
		}

		Self(format!("{category}.{}", URL_SAFE_NO_PAD.encode(hasher.finalize())))
	}

	/// Category prefix of the key.
	pub fn category(&self) -> &str {
		category_of(&self.0)
	}

	/// Returns `true` if the key belongs to `category`.
	pub fn is_in_category(&self, category: &str) -> bool {
		self.category() == category
	}

	/// Textual form of the key.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for CacheKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for CacheKey {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "CacheKey({})", self.0)
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Category prefix of a textual key.
pub(crate) fn category_of(raw: &str) -> &str {
	raw.rsplit_once('.').map_or(raw, |(category, _)| category)
}

fn feed(hasher: &mut Sha256, part: &str) {
	hasher.update((part.len() as u64).to_be_bytes());
	hasher.update(part.as_bytes());
}

fn generic_param<'c>(config: &'c OAuthConfig, name: &str) -> Option<&'c str> {
	match config.grant() {
		GrantConfig::Generic(params) => params.get(name).map(String::as_str),
		_ => None,
	}
}

fn scalar_text(value: &JsonValue) -> Option<String> {
	match value {
		JsonValue::String(text) => Some(text.clone()),
		JsonValue::Number(number) => Some(number.to_string()),
		JsonValue::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}
