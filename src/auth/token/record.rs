//! Token endpoint responses kept byte-for-byte alongside their parsed JSON object.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret, error::ProtocolError, http::TokenHttpResponse};

/// Name of the refresh token field in token endpoint responses.
pub const REFRESH_TOKEN_FIELD: &str = "refresh_token";

/// Token endpoint response as persisted in the cache.
///
/// The raw bytes are what the store keeps; the parsed object only serves field lookups, so a
/// record loaded from the cache serializes back to exactly the bytes the endpoint returned.
#[derive(Clone)]
pub struct TokenRecord {
	raw: Vec<u8>,
	fields: JsonMap,
}
impl TokenRecord {
	/// Parses a JSON object from `raw`, keeping the bytes untouched.
	pub fn from_slice(raw: impl Into<Vec<u8>>) -> Result<Self, ProtocolError> {
		Self::parse(raw.into(), None)
	}

	/// Parses the body of a token endpoint response.
	pub fn from_response(response: &TokenHttpResponse) -> Result<Self, ProtocolError> {
		Self::parse(response.body.clone(), Some(response.status))
	}

	fn parse(raw: Vec<u8>, status: Option<u16>) -> Result<Self, ProtocolError> {
		let mut de = serde_json::Deserializer::from_slice(&raw);
		let value: JsonValue = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ProtocolError::MalformedResponse { source, status })?;
		let fields = match value {
			JsonValue::Object(fields) => fields,
			other => return Err(ProtocolError::NotAnObject { kind: json_kind(&other), status }),
		};

		Ok(Self { raw, fields })
	}

	/// Raw response bytes.
	pub fn as_bytes(&self) -> &[u8] {
		&self.raw
	}

	/// Consumes the record and returns the raw response bytes.
	pub fn into_bytes(self) -> Vec<u8> {
		self.raw
	}

	/// Parsed response object.
	pub fn fields(&self) -> &JsonMap {
		&self.fields
	}

	/// Access token stored under `field`, if it is present and a string.
	pub fn access_token(&self, field: &str) -> Option<TokenSecret> {
		self.string_field(field)
	}

	/// Refresh token, if the endpoint issued one.
	pub fn refresh_token(&self) -> Option<TokenSecret> {
		self.string_field(REFRESH_TOKEN_FIELD)
	}

	fn string_field(&self, field: &str) -> Option<TokenSecret> {
		self.fields.get(field).and_then(JsonValue::as_str).map(TokenSecret::new)
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("len", &self.raw.len())
			.field("fields", &self.fields.keys().collect::<Vec<_>>())
			.finish()
	}
}

fn json_kind(value: &JsonValue) -> &'static str {
	match value {
		JsonValue::Null => "null",
		JsonValue::Bool(_) => "boolean",
		JsonValue::Number(_) => "number",
		JsonValue::String(_) => "string",
		JsonValue::Array(_) => "array",
		JsonValue::Object(_) => "object",
	}
}
