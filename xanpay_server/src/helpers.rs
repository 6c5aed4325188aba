use std::fmt::Write;

use hmac::{Hmac, Mac};
use sha2::Sha256;

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

/// HMAC-SHA256 over `data`, hex-encoded. The deposit webhook carries this in its signature
/// header.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(data);
    to_hex(&mac.finalize().into_bytes())
}
