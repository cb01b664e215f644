use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::utils::token::generate_nonce;

type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 32;

fn mac_for(secret: &str, subject: &str, nonce: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(subject.as_bytes());
    mac.update(b":");
    mac.update(nonce.as_bytes());
    Some(mac)
}

/// Issues an anti-forgery token bound to the session subject.
pub fn issue_token(secret: &str, subject: &str) -> String {
    let nonce = generate_nonce(NONCE_LEN);
    let signature = mac_for(secret, subject, &nonce)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("{}.{}", nonce, signature)
}

pub fn verify_token(secret: &str, subject: &str, token: &str) -> bool {
    let Some((nonce, signature)) = token.trim().split_once('.') else {
        return false;
    };
    if nonce.len() != NONCE_LEN {
        return false;
    }
    let Ok(signature) = hex::decode(signature) else {
        return false;
    };
    match mac_for(secret, subject, nonce) {
        Some(mac) => mac.verify_slice(&signature).is_ok(),
        None => false,
    }
}
