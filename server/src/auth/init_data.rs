//! Telegram Mini App init data verification.
//!
//! The client forwards the raw query string Telegram hands the Mini App. It
//! is trusted when its `hash` equals
//! `HMAC-SHA256(HMAC-SHA256("WebAppData", bot_token), data_check_string)`,
//! where the data check string is every other `key=value` pair, sorted by
//! key and joined with `\n`.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_KEY: &[u8] = b"WebAppData";

/// How far ahead of the server clock an `auth_date` may be.
const MAX_CLOCK_SKEW_SECS: i64 = 300;

/// User fields Telegram puts in the `user` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitDataError {
    #[error("hash is missing")]
    MissingHash,

    #[error("auth_date is missing or malformed")]
    InvalidAuthDate,

    #[error("init data expired")]
    Expired,

    #[error("auth_date is in the future")]
    IssuedInFuture,

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("user is missing")]
    MissingUser,

    #[error("user is malformed: {0}")]
    InvalidUser(String),
}

/// Checks init data against one bot token.
#[derive(Clone)]
pub struct InitDataValidator {
    secret: Vec<u8>,
    max_age_secs: u64,
}

impl InitDataValidator {
    /// `max_age_secs` of 0 accepts init data of any age, including data
    /// dated ahead of the server clock.
    pub fn new(bot_token: &str, max_age_secs: u64) -> Self {
        Self {
            secret: hmac_sha256(WEB_APP_KEY, bot_token.as_bytes()),
            max_age_secs,
        }
    }

    /// Verify `init_data` as of `now` (Unix seconds) and return its user.
    pub fn validate(&self, init_data: &str, now: i64) -> Result<TelegramUser, InitDataError> {
        let mut hash = None;
        let mut auth_date = None;
        let mut user = None;
        let mut pairs: Vec<(String, String)> = Vec::new();

        for (key, value) in form_urlencoded::parse(init_data.as_bytes()) {
            match &*key {
                "hash" => {
                    hash = Some(value.into_owned());
                    continue;
                }
                "auth_date" => auth_date = Some(value.to_string()),
                "user" => user = Some(value.to_string()),
                _ => {}
            }
            pairs.push((key.into_owned(), value.into_owned()));
        }

        let hash = hash.ok_or(InitDataError::MissingHash)?;
        let expected = hex::decode(hash.trim()).map_err(|_| InitDataError::SignatureMismatch)?;

        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let check_string = pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("\n");

        // verify_slice compares in constant time
        let mut mac = new_mac(&self.secret);
        mac.update(check_string.as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| InitDataError::SignatureMismatch)?;

        let auth_date: i64 = auth_date
            .and_then(|d| d.parse().ok())
            .ok_or(InitDataError::InvalidAuthDate)?;
        if self.max_age_secs > 0 {
            let age = now.saturating_sub(auth_date);
            if age > self.max_age_secs as i64 {
                return Err(InitDataError::Expired);
            }
            if age < -MAX_CLOCK_SKEW_SECS {
                return Err(InitDataError::IssuedInFuture);
            }
        }

        let user = user.ok_or(InitDataError::MissingUser)?;
        serde_json::from_str(&user).map_err(|e| InitDataError::InvalidUser(e.to_string()))
    }
}

fn new_mac(key: &[u8]) -> HmacSha256 {
    match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = new_mac(key);
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Build init data signed for `bot_token`, the way Telegram does.
    pub fn sign(bot_token: &str, fields: &[(&str, &str)]) -> String {
        let mut sorted: Vec<_> = fields.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let check_string = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("\n");

        let secret = hmac_sha256(WEB_APP_KEY, bot_token.as_bytes());
        let hash = hex::encode(hmac_sha256(&secret, check_string.as_bytes()));

        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter().copied())
            .append_pair("hash", &hash)
            .finish()
    }

    pub const USER_JSON: &str =
        r#"{"id":42,"first_name":"Алиса","last_name":"Сонная","username":"alice","language_code":"ru"}"#;
}
