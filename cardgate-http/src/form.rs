//! Form encoding and HTTP Basic credentials.

use base64::prelude::*;
use cardgate::params::{Params, params_from_pairs};
use url::form_urlencoded;

/// Encodes `(key, value)` pairs as `application/x-www-form-urlencoded`.
///
/// Pairs are emitted in the given order; keys with empty values are kept.
#[must_use]
pub fn form_encode<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Decodes a form-encoded body into [`Params`].
///
/// Later duplicates of a key overwrite earlier ones.
#[must_use]
pub fn form_decode(body: &str) -> Params {
    params_from_pairs(form_urlencoded::parse(body.trim().as_bytes()).into_owned())
}

/// Builds an HTTP Basic `Authorization` header value.
#[must_use]
pub fn basic_auth(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        BASE64_STANDARD.encode(format!("{username}:{password}"))
    )
}
