//! Token decoders that turn opaque access tokens into [`DecodedClaims`].
//!
//! Decoders are consulted in registration order and signal "does not apply" with `None`, so an
//! unrecognized token shape simply means the client has no expiry information for it.

// crates.io
use base64::{
	Engine as _,
	alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
// self
use crate::{_prelude::*, auth::DecodedClaims};

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
	.with_encode_padding(false)
	.with_decode_padding_mode(DecodePaddingMode::Indifferent)
	.with_decode_allow_trailing_bits(true);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Strategy that extracts claims from a token string.
pub trait TokenDecoder
where
	Self: Send + Sync,
{
	/// Returns the token's claims, or `None` when the token shape is not recognized.
	fn decode(&self, token: &str) -> Option<DecodedClaims>;
}
impl<F> TokenDecoder for F
where
	F: Send + Sync + Fn(&str) -> Option<DecodedClaims>,
{
	fn decode(&self, token: &str) -> Option<DecodedClaims> {
		self(token)
	}
}

/// Decoder for compact three-segment tokens whose middle segment is a base64 JSON object.
///
/// The signature is not verified; only the payload is read.
#[derive(Clone, Copy, Debug, Default)]
pub struct JwtPayloadDecoder;
impl TokenDecoder for JwtPayloadDecoder {
	fn decode(&self, token: &str) -> Option<DecodedClaims> {
		let mut segments = token.split('.');
		let (Some(_header), Some(payload), Some(_signature), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return None;
		};
		let bytes = URL_SAFE_LENIENT
			.decode(payload)
			.or_else(|_| STANDARD_LENIENT.decode(payload))
			.ok()?;

		match serde_json::from_slice(&bytes).ok()? {
			JsonValue::Object(claims) => Some(DecodedClaims::new(claims)),
			_ => None,
		}
	}
}

/// Ordered set of decoders; the first one that recognizes a token wins.
#[derive(Clone)]
pub struct DecoderRegistry {
	decoders: Vec<Arc<dyn TokenDecoder>>,
}
impl DecoderRegistry {
	/// Registry without any decoder; every token is treated as opaque.
	pub fn empty() -> Self {
		Self { decoders: Vec::new() }
	}

	/// Appends a decoder after the already registered ones.
	pub fn register<D>(&mut self, decoder: D) -> &mut Self
	where
		D: 'static + TokenDecoder,
	{
		self.decoders.push(Arc::new(decoder));

		self
	}

	/// Builder-style variant of [`register`](Self::register).
	pub fn with_decoder<D>(mut self, decoder: D) -> Self
	where
		D: 'static + TokenDecoder,
	{
		self.register(decoder);

		self
	}

	/// Runs the decoders in registration order and returns the first result.
	pub fn decode(&self, token: &str) -> Option<DecodedClaims> {
		self.decoders.iter().find_map(|decoder| decoder.decode(token))
	}

	/// Number of registered decoders.
	pub fn len(&self) -> usize {
		self.decoders.len()
	}

	/// Returns `true` when no decoder is registered.
	pub fn is_empty(&self) -> bool {
		self.decoders.is_empty()
	}
}
impl Default for DecoderRegistry {
	fn default() -> Self {
		Self::empty().with_decoder(JwtPayloadDecoder)
	}
}
impl Debug for DecoderRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DecoderRegistry").field("decoders", &self.decoders.len()).finish()
	}
}
