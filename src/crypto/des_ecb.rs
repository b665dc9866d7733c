//! DES/ECB credential cipher.

use base64::{engine::general_purpose, Engine as _};
use des::Des;
use ecb::cipher::block_padding::Pkcs7;
use ecb::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};
use serde::{Deserialize, Serialize};

use crate::error::DecryptionError;

type DesEcbDecryptor = ecb::Decryptor<Des>;
type DesEcbEncryptor = ecb::Encryptor<Des>;

/// DES key length. Derived bytes past the eighth are ignored.
pub const DES_KEY_LEN: usize = 8;

/// Text encoding of the ciphertext inside `dbuserpwd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiphertextEncoding {
    #[default]
    Hex,
    Base64,
}

impl CiphertextEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            CiphertextEncoding::Hex => "hex",
            CiphertextEncoding::Base64 => "base64",
        }
    }

    fn decode(self, text: &str) -> Result<Vec<u8>, DecryptionError> {
        let text = text.trim();
        let decoded = match self {
            CiphertextEncoding::Hex => hex::decode(text).ok(),
            CiphertextEncoding::Base64 => general_purpose::STANDARD.decode(text).ok(),
        };
        decoded.ok_or(DecryptionError::InvalidEncoding {
            encoding: self.as_str(),
        })
    }

    fn encode(self, bytes: &[u8]) -> String {
        match self {
            CiphertextEncoding::Hex => hex::encode_upper(bytes),
            CiphertextEncoding::Base64 => general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// Key material: `nonce` followed by `app_check_code`, as raw UTF-8 bytes.
pub fn derive_key(nonce: &str, app_check_code: &str) -> Result<[u8; DES_KEY_LEN], DecryptionError> {
    let material = format!("{}{}", nonce, app_check_code);
    let bytes = material.as_bytes();
    if bytes.len() < DES_KEY_LEN {
        return Err(DecryptionError::KeyTooShort { len: bytes.len() });
    }
    let mut key = [0u8; DES_KEY_LEN];
    key.copy_from_slice(&bytes[..DES_KEY_LEN]);
    Ok(key)
}

/// Recover the plaintext password returned by the broker.
pub fn decrypt(
    ciphertext: &str,
    nonce: &str,
    app_check_code: &str,
    encoding: CiphertextEncoding,
) -> Result<String, DecryptionError> {
    let key = derive_key(nonce, app_check_code)?;
    let bytes = encoding.decode(ciphertext)?;
    let plaintext = decrypt_bytes(&key, &bytes)?;
    String::from_utf8(plaintext).map_err(|_| DecryptionError::InvalidUtf8)
}

/// Broker-side counterpart of [`decrypt`], for stub brokers and fixtures.
pub fn encrypt(
    plaintext: &str,
    nonce: &str,
    app_check_code: &str,
    encoding: CiphertextEncoding,
) -> Result<String, DecryptionError> {
    let key = derive_key(nonce, app_check_code)?;
    let cipher =
        DesEcbEncryptor::new_from_slice(&key).map_err(|_| DecryptionError::KeyTooShort {
            len: key.len(),
        })?;
    let bytes = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    Ok(encoding.encode(&bytes))
}

fn decrypt_bytes(key: &[u8; DES_KEY_LEN], ciphertext: &[u8]) -> Result<Vec<u8>, DecryptionError> {
    if ciphertext.is_empty() || ciphertext.len() % DES_KEY_LEN != 0 {
        return Err(DecryptionError::InvalidCiphertext);
    }
    let cipher =
        DesEcbDecryptor::new_from_slice(key).map_err(|_| DecryptionError::KeyTooShort {
            len: key.len(),
        })?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| DecryptionError::InvalidCiphertext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use des::cipher::generic_array::GenericArray;
    use des::cipher::BlockDecrypt;

    const APP_CHECK_CODE: &str = "abcdefg";

    #[test]
    fn test_des_known_answer() {
        // Classic FIPS 46 worked example.
        let key = hex::decode("133457799BBCDFF1").unwrap();
        let cipher = Des::new_from_slice(&key).unwrap();
        let mut block = GenericArray::clone_from_slice(&hex::decode("85E813540F0AB405").unwrap());
        cipher.decrypt_block(&mut block);
        assert_eq!(hex::encode_upper(block.as_slice()), "0123456789ABCDEF");
    }

    #[test]
    fn test_derive_key_concatenates_nonce_then_app_code() {
        assert_eq!(&derive_key("R7K9", APP_CHECK_CODE).unwrap(), b"R7K9abcd");
        assert_eq!(&derive_key("12345678", "zz").unwrap(), b"12345678");
        assert_eq!(&derive_key("", "ABCDEFGH").unwrap(), b"ABCDEFGH");
        assert_eq!(
            derive_key("R7K9", "abc"),
            Err(DecryptionError::KeyTooShort { len: 7 })
        );
    }

    #[test]
    fn test_decrypt_matches_independent_encryption() {
        // Encrypt with the block-mode crate directly, not through `encrypt`.
        let independent = DesEcbEncryptor::new_from_slice(b"R7K9abcd")
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(b"S3cr3t!");
        assert_eq!(independent.len(), 8);

        let ciphertext = hex::encode_upper(&independent);
        let plaintext =
            decrypt(&ciphertext, "R7K9", APP_CHECK_CODE, CiphertextEncoding::Hex).unwrap();
        assert_eq!(plaintext, "S3cr3t!");

        let lower = hex::encode(&independent);
        assert_eq!(
            decrypt(&lower, "R7K9", APP_CHECK_CODE, CiphertextEncoding::Hex).unwrap(),
            "S3cr3t!"
        );
    }

    #[test]
    fn test_openssl_vector() {
        // openssl enc -des-ecb -K 52374B3961626364 <<< "S3cr3t!" (no newline)
        const CIPHERTEXT: &str = "65020DF1E8A4D85F";
        assert_eq!(
            decrypt(CIPHERTEXT, "R7K9", APP_CHECK_CODE, CiphertextEncoding::Hex).unwrap(),
            "S3cr3t!"
        );
        assert_eq!(
            encrypt("S3cr3t!", "R7K9", APP_CHECK_CODE, CiphertextEncoding::Hex).unwrap(),
            CIPHERTEXT
        );
    }

    #[test]
    fn test_encrypt_decrypt_base64() {
        let ciphertext = encrypt(
            "p@ss-with-ünïcode",
            "NONCE",
            APP_CHECK_CODE,
            CiphertextEncoding::Base64,
        )
        .unwrap();
        let plaintext =
            decrypt(&ciphertext, "NONCE", APP_CHECK_CODE, CiphertextEncoding::Base64).unwrap();
        assert_eq!(plaintext, "p@ss-with-ünïcode");
    }

    #[test]
    fn test_wrong_nonce_does_not_recover_plaintext() {
        let ciphertext = encrypt("S3cr3t!", "R7K9", APP_CHECK_CODE, CiphertextEncoding::Hex).unwrap();
        let result = decrypt(&ciphertext, "XXXX", APP_CHECK_CODE, CiphertextEncoding::Hex);
        assert_ne!(result, Ok("S3cr3t!".to_string()));
    }

    #[test]
    fn test_malformed_ciphertext() {
        assert_eq!(
            decrypt("not-hex", "R7K9", APP_CHECK_CODE, CiphertextEncoding::Hex),
            Err(DecryptionError::InvalidEncoding { encoding: "hex" })
        );
        assert_eq!(
            decrypt("0A1B2C", "R7K9", APP_CHECK_CODE, CiphertextEncoding::Hex),
            Err(DecryptionError::InvalidCiphertext)
        );
        assert_eq!(
            decrypt("", "R7K9", APP_CHECK_CODE, CiphertextEncoding::Hex),
            Err(DecryptionError::InvalidCiphertext)
        );
        assert_eq!(
            decrypt("%%%", "R7K9", APP_CHECK_CODE, CiphertextEncoding::Base64),
            Err(DecryptionError::InvalidEncoding { encoding: "base64" })
        );
    }

    #[test]
    fn test_short_key_is_rejected_before_decoding() {
        assert_eq!(
            decrypt("zz", "R7", "K9", CiphertextEncoding::Hex),
            Err(DecryptionError::KeyTooShort { len: 4 })
        );
    }
}
