//! Request signing for authenticated exchange endpoints

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn hmac_sha256(secret: &str, message: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow!("HMAC key error: {}", e))?;
    mac.update(message.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// OKX timestamp: ISO-8601, millisecond precision, `Z` suffix
pub fn okx_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// OKX `OK-ACCESS-SIGN`: base64(HMAC-SHA256(timestamp + METHOD + requestPath + body))
pub fn okx_signature(
    secret: &str,
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: &str,
) -> Result<String> {
    let message = format!(
        "{}{}{}{}",
        timestamp,
        method.to_uppercase(),
        request_path,
        body
    );
    Ok(BASE64.encode(hmac_sha256(secret, &message)?))
}

/// Binance `signature` parameter: hex(HMAC-SHA256(query))
pub fn binance_signature(secret: &str, query: &str) -> Result<String> {
    Ok(hex::encode(hmac_sha256(secret, query)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_okx_timestamp_format() {
        let ts = Utc
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(678))
            .unwrap();
        assert_eq!(okx_timestamp(ts), "2024-01-02T03:04:05.678Z");
    }

    #[test]
    fn test_okx_signature_vector() {
        let sig = okx_signature(
            "secret",
            "2024-01-02T03:04:05.678Z",
            "get",
            "/api/v5/account/interest-rate",
            "",
        )
        .unwrap();
        assert_eq!(sig, "5gesAofpIJ23Sqwsn0QYvX0fbg7IhAyfSBeu+4v5VXU=");
    }

    #[test]
    fn test_binance_signature_vector() {
        let sig = binance_signature("secret", "product=STAKING&timestamp=1700000000000").unwrap();
        assert_eq!(
            sig,
            "3055c45c5ef3fcf24c82e42cc7e9b15ba0faa60091f6adde24cf4173c6995829"
        );
    }
}
