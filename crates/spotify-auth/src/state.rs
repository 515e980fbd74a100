//! Anti-forgery `state` values for the authorization request
//!
//! The relay holds no session table. A login attempt is bound to the browser
//! that started it only through the cookie carrying this value, so the value
//! must be unguessable and the callback comparison must be exact.

use rand::RngExt;
use subtle::ConstantTimeEq;

use crate::constants::STATE_LENGTH;

/// Alphabet the state is drawn from: ASCII upper and lower case letters.
const STATE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Generate a fresh anti-forgery state value.
///
/// Each of the `STATE_LENGTH` characters is sampled uniformly from
/// `STATE_ALPHABET` using the thread-local CSPRNG.
pub fn generate_state() -> String {
    let mut rng = rand::rng();
    (0..STATE_LENGTH)
        .map(|_| STATE_ALPHABET[rng.random_range(0..STATE_ALPHABET.len())] as char)
        .collect()
}

/// Check the `state` echoed by the provider against the value the browser
/// carried back in its cookie.
///
/// Fails closed: a missing or empty value on either side never matches.
/// Equal-length values are compared in constant time.
pub fn states_match(returned: Option<&str>, stored: Option<&str>) -> bool {
    match (returned, stored) {
        (Some(returned), Some(stored)) if !returned.is_empty() && !stored.is_empty() => {
            returned.as_bytes().ct_eq(stored.as_bytes()).into()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_has_fixed_length_and_alphabet() {
        for _ in 0..200 {
            let state = generate_state();
            assert_eq!(state.len(), STATE_LENGTH);
            assert!(
                state.chars().all(|c| c.is_ascii_alphabetic()),
                "state must be letters only: {state}"
            );
        }
    }

    #[test]
    fn states_are_unique() {
        let a = generate_state();
        let b = generate_state();
        assert_ne!(a, b, "two states must not collide");
    }

    #[test]
    fn sampling_reaches_both_cases() {
        let joined: String = (0..50).map(|_| generate_state()).collect();
        assert!(joined.chars().any(|c| c.is_ascii_uppercase()));
        assert!(joined.chars().any(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn matching_states_are_accepted() {
        assert!(states_match(
            Some("abcd1234efgh5678"),
            Some("abcd1234efgh5678")
        ));
    }

    #[test]
    fn mismatched_states_are_rejected() {
        assert!(!states_match(Some("WRONG"), Some("abcd1234efgh5678")));
        assert!(!states_match(Some("abcd1234efgh567"), Some("abcd1234efgh5678")));
        assert!(!states_match(Some("ABCD1234EFGH5678"), Some("abcd1234efgh5678")));
    }

    #[test]
    fn missing_or_empty_states_fail_closed() {
        assert!(!states_match(None, Some("abc")));
        assert!(!states_match(Some("abc"), None));
        assert!(!states_match(None, None));
        assert!(!states_match(Some(""), Some("")));
        assert!(!states_match(Some(""), Some("abc")));
    }
}
