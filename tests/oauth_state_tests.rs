// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! OAuth state signing tests.
//!
//! The state parameter binds a redirect to the request that started it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use noir_auth::services::{StateError, StateSigner};

#[test]
fn test_oauth_state_roundtrip() {
    let signer = StateSigner::new(b"secret_key");
    let state = signer.issue().unwrap();

    assert_eq!(signer.verify(&state), Ok(()));
}

#[test]
fn test_oauth_state_is_unique() {
    let signer = StateSigner::new(b"secret_key");

    assert_ne!(signer.issue().unwrap(), signer.issue().unwrap());
}

#[test]
fn test_oauth_state_other_key_rejected() {
    let state = StateSigner::new(b"secret_key").issue().unwrap();

    assert_eq!(
        StateSigner::new(b"other_key").verify(&state),
        Err(StateError::BadSignature)
    );
}

#[test]
fn test_oauth_state_tampered_nonce_rejected() {
    let signer = StateSigner::new(b"secret_key");
    let state = signer.issue().unwrap();

    let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&state).unwrap()).unwrap();
    let flipped = if decoded.starts_with('0') { '1' } else { '0' };
    let tampered = format!("{}{}", flipped, &decoded[1..]);
    let tampered = URL_SAFE_NO_PAD.encode(tampered.as_bytes());

    assert_eq!(signer.verify(&tampered), Err(StateError::BadSignature));
}

#[test]
fn test_oauth_state_decode_invalid() {
    let signer = StateSigner::new(b"secret_key");

    // Invalid base64
    assert_eq!(
        signer.verify("not-valid-base64!!!"),
        Err(StateError::Malformed)
    );
    // Valid base64, wrong shape
    let two_parts = URL_SAFE_NO_PAD.encode(b"abcd|18c");
    assert_eq!(signer.verify(&two_parts), Err(StateError::Malformed));
    assert_eq!(signer.verify(""), Err(StateError::Malformed));
}

#[test]
fn test_oauth_state_base64_url_safe() {
    let signer = StateSigner::new(b"secret_key");

    for _ in 0..32 {
        let state = signer.issue().unwrap();
        assert!(!state.contains('+'), "State should not contain '+'");
        assert!(!state.contains('/'), "State should not contain '/'");
        assert!(!state.contains('='), "State should not contain '=' padding");
    }
}
