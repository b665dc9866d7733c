//! Credential decryption.
//!
//! Deployed brokers encrypt the password with single DES (ECB, PKCS#5
//! padding) under a key built from the response nonce and the application
//! check code. Both the algorithm and the key derivation are part of the
//! wire contract.

pub mod des_ecb;

pub use des_ecb::*;
