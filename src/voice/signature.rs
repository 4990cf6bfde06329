//! Webhook Request Validation
//!
//! The provider signs every webhook with HMAC-SHA1 over the full request URL
//! followed by the POST parameters sorted by name, keyed by the account auth
//! token, and sends the base64 digest in the `X-Twilio-Signature` header.

use super::SignatureError;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

/// Header carrying the request signature
pub const SIGNATURE_HEADER: &str = "X-Twilio-Signature";

/// Validates inbound webhook signatures for one account
#[derive(Debug, Clone)]
pub struct RequestValidator {
    account_sid: String,
    auth_token: String,
}

impl RequestValidator {
    /// Create a validator from the account SID and auth token
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
        }
    }

    pub fn account_sid(&self) -> &str {
        &self.account_sid
    }

    /// Build the string that gets signed.
    ///
    /// Parameters are ordered by name, then by value for repeated names, and
    /// every value is appended as `name` + `value` with no separator. The URI
    /// is taken exactly as the provider requested it, so relative or
    /// non-normalized forms are signed verbatim; only an empty URI is refused.
    pub fn signing_payload<K, V>(uri: &str, params: &[(K, V)]) -> Result<String, SignatureError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if uri.trim().is_empty() {
            return Err(SignatureError::MalformedInput("empty request URI".to_string()));
        }

        let mut sorted: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .collect();
        sorted.sort();

        let mut payload = uri.to_string();
        for (key, value) in sorted {
            payload.push_str(key);
            payload.push_str(value);
        }
        Ok(payload)
    }

    /// Compute the expected signature for a request
    pub fn compute_signature<K, V>(
        &self,
        uri: &str,
        params: &[(K, V)],
    ) -> Result<String, SignatureError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let payload = Self::signing_payload(uri, params)?;
        // HMAC accepts keys of any length
        let mut mac = Hmac::<Sha1>::new_from_slice(self.auth_token.as_bytes())
            .map_err(|e| SignatureError::MalformedInput(e.to_string()))?;
        mac.update(payload.as_bytes());
        let digest = mac.finalize().into_bytes();
        Ok(base64::engine::general_purpose::STANDARD
            .encode(digest)
            .trim()
            .to_string())
    }

    /// Check `signature` against the request.
    ///
    /// A mismatch is `Ok(false)`; only malformed input is an error.
    pub fn validate<K, V>(
        &self,
        uri: &str,
        params: &[(K, V)],
        signature: &str,
    ) -> Result<bool, SignatureError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let expected = self.compute_signature(uri, params)?;
        let valid = timing_safe_eq(&expected, signature);
        if !valid {
            tracing::debug!(uri = %uri, "webhook signature mismatch");
        }
        Ok(valid)
    }
}

/// Timing-safe string equality.
pub fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut out = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        out |= x ^ y;
    }
    out == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "https://example.com/hook";

    fn validator() -> RequestValidator {
        RequestValidator::new("AC123", "12345")
    }

    #[test]
    fn test_payload_sorts_and_concatenates() {
        let params = [("B", "2"), ("A", "1")];
        let payload = RequestValidator::signing_payload(URI, &params).unwrap();
        assert_eq!(payload, "https://example.com/hookA1B2");
    }

    #[test]
    fn test_payload_without_params_is_uri() {
        let params: [(&str, &str); 0] = [];
        let payload = RequestValidator::signing_payload(URI, &params).unwrap();
        assert_eq!(payload, URI);
    }

    #[test]
    fn test_payload_repeated_keys_keep_every_value() {
        let params = [("B", "3"), ("A", "2"), ("A", "1")];
        let payload = RequestValidator::signing_payload(URI, &params).unwrap();
        assert_eq!(payload, "https://example.com/hookA1A2B3");
    }

    #[test]
    fn test_compute_signature_known_value() {
        let params = [("B", "2"), ("A", "1")];
        let sig = validator().compute_signature(URI, &params).unwrap();
        assert_eq!(sig, "/R9yCuzBSBTgSgLb07IA5Gbl9iM=");
    }

    #[test]
    fn test_validate_accepts_correct_signature() {
        let params = [("B", "2"), ("A", "1")];
        assert!(validator()
            .validate(URI, &params, "/R9yCuzBSBTgSgLb07IA5Gbl9iM=")
            .unwrap());
    }

    #[test]
    fn test_validate_repeated_keys_signature() {
        let params = [("B", "3"), ("A", "2"), ("A", "1")];
        assert!(validator()
            .validate(URI, &params, "PcXG4AghwNdK9Bv3fetz/SRT1xc=")
            .unwrap());
    }

    #[test]
    fn test_validate_rejects_altered_value() {
        let params = [("B", "3"), ("A", "1")];
        assert!(!validator()
            .validate(URI, &params, "/R9yCuzBSBTgSgLb07IA5Gbl9iM=")
            .unwrap());
    }

    #[test]
    fn test_validate_is_case_sensitive() {
        let params = [("B", "2"), ("A", "1")];
        assert!(!validator()
            .validate(URI, &params, "/r9yCuzBSBTgSgLb07IA5Gbl9iM=")
            .unwrap());
    }

    #[test]
    fn test_validate_rejects_other_token() {
        let params = [("B", "2"), ("A", "1")];
        let other = RequestValidator::new("AC123", "54321");
        assert!(!other
            .validate(URI, &params, "/R9yCuzBSBTgSgLb07IA5Gbl9iM=")
            .unwrap());
    }

    #[test]
    fn test_malformed_uri_is_error() {
        let params = [("A", "1")];
        assert!(matches!(
            validator().validate("", &params, "x"),
            Err(SignatureError::MalformedInput(_))
        ));
        assert!(matches!(
            validator().validate("  ", &params, "x"),
            Err(SignatureError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_relative_uri_signed_verbatim() {
        let params = [("B", "2"), ("A", "1")];
        assert_eq!(
            RequestValidator::signing_payload("/hook", &params).unwrap(),
            "/hookA1B2"
        );
        assert!(validator()
            .validate("/hook", &params, "cN9o9BZ9UKPpVfnZ/qxVt0tVg2Q=")
            .unwrap());
    }

    #[test]
    fn test_owned_params_accepted() {
        let params = vec![("A".to_string(), "1".to_string()), ("B".to_string(), "2".to_string())];
        assert!(validator()
            .validate(URI, &params, "/R9yCuzBSBTgSgLb07IA5Gbl9iM=")
            .unwrap());
    }

    #[test]
    fn test_timing_safe_eq() {
        assert!(timing_safe_eq("abc", "abc"));
        assert!(!timing_safe_eq("abc", "abd"));
        assert!(!timing_safe_eq("abc", "ab"));
    }
}
