//! Salted SHA-1 (`{SSHA}`) password encoding and verification.
//!
//! An encoded password has the form `{SSHA}` followed by the standard base64
//! encoding of `sha1(password || salt) || salt`, where the salt is four random
//! bytes.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use sha1::{Digest, Sha1};

use crate::error::Error;

/// The scheme tag prefixed to every encoded password.
pub const SSHA_PREFIX: &str = "{SSHA}";
/// Length of a SHA-1 digest in bytes.
const DIGEST_LEN: usize = 20;
/// Length of the random salt in bytes.
const SALT_LEN: usize = 4;

/// Encode a raw password with a freshly generated salt.
#[must_use]
pub fn encode(raw: &str) -> String {
	let mut salt = [0_u8; SALT_LEN];
	rand::rng().fill(&mut salt);
	encode_with_salt(raw, &salt)
}

/// Encode a raw password with the given salt.
fn encode_with_salt(raw: &str, salt: &[u8]) -> String {
	let mut payload = digest(raw.as_bytes(), salt);
	payload.extend_from_slice(salt);
	format!("{SSHA_PREFIX}{}", STANDARD.encode(payload))
}

/// Check whether `raw` is the password that produced `encoded`. Anything that
/// is not a well-formed `{SSHA}` value simply doesn't match.
#[must_use]
pub fn matches(encoded: &str, raw: &str) -> bool {
	let Some(payload) = encoded.strip_prefix(SSHA_PREFIX) else {
		return false;
	};
	let Ok(payload) = STANDARD.decode(payload) else {
		return false;
	};
	if payload.len() != DIGEST_LEN + SALT_LEN {
		return false;
	}
	let (expected, salt) = payload.split_at(DIGEST_LEN);
	digest(raw.as_bytes(), salt) == expected
}

/// Normalise a password value read from the users document for storage.
///
/// Values already carrying the `{SSHA}` tag are kept verbatim, values with
/// any other `{SCHEME}` tag are rejected, and untagged values are treated as
/// plain text and encoded.
pub fn ingest(value: &str) -> Result<String, Error> {
	if value.starts_with(SSHA_PREFIX) {
		return Ok(value.to_owned());
	}
	if let Some(tagged) = value.strip_prefix('{') {
		let scheme = tagged.split_once('}').map_or(tagged, |(scheme, _)| scheme);
		return Err(Error::UnsupportedScheme(scheme.to_owned()));
	}
	Ok(encode(value))
}

/// `sha1(password || salt)`
fn digest(password: &[u8], salt: &[u8]) -> Vec<u8> {
	let mut hasher = Sha1::new();
	hasher.update(password);
	hasher.update(salt);
	hasher.finalize().to_vec()
}
