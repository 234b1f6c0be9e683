//! Password gate with a stateless auth cookie

use axum::http::{header::COOKIE, HeaderMap};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie carrying the auth token
pub const AUTH_COOKIE: &str = "auth";

/// Message signed when a cookie secret is configured
const SIGNED_FLAG: &[u8] = b"auth=1";

/// Checks passwords and issues/verifies the auth cookie.
///
/// Without a secret the token is the bare flag `1`. With a secret it is
/// `1.<hex hmac-sha256>` and unsigned cookies are rejected.
#[derive(Clone)]
pub struct AuthGate {
    passwords: Arc<HashSet<String>>,
    secret: Option<Arc<Vec<u8>>>,
    max_age_secs: u64,
}

impl AuthGate {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            passwords: Arc::new(config.passwords.iter().cloned().collect()),
            secret: config
                .cookie_secret
                .as_ref()
                .map(|s| Arc::new(s.as_bytes().to_vec())),
            max_age_secs: config.cookie_max_age_secs,
        }
    }

    /// Whether any password is configured
    pub fn password_required(&self) -> bool {
        !self.passwords.is_empty()
    }

    /// True when the gate is open or `password` is one of the configured ones
    pub fn check_password(&self, password: Option<&str>) -> bool {
        if !self.password_required() {
            return true;
        }
        password.map_or(false, |p| self.passwords.contains(p))
    }

    fn signature(&self, secret: &[u8]) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(secret).ok()?;
        mac.update(SIGNED_FLAG);
        Some(mac)
    }

    /// Cookie value proving a successful login
    pub fn token(&self) -> String {
        match self
            .secret
            .as_ref()
            .and_then(|secret| self.signature(secret))
        {
            Some(mac) => format!("1.{}", hex::encode(mac.finalize().into_bytes())),
            None => "1".to_string(),
        }
    }

    fn verify_token(&self, token: &str) -> bool {
        let Some(secret) = &self.secret else {
            return token == "1";
        };
        let Some(signature) = token
            .strip_prefix("1.")
            .and_then(|hex_sig| hex::decode(hex_sig).ok())
        else {
            return false;
        };
        self.signature(secret)
            .map_or(false, |mac| mac.verify_slice(&signature).is_ok())
    }

    /// True when the request carries a valid auth cookie
    pub fn cookie_authed(&self, headers: &HeaderMap) -> bool {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(name, value)| name == AUTH_COOKIE && self.verify_token(value))
    }

    /// Auth state for a request: open gate, valid cookie or matching body password
    pub fn is_authed(&self, headers: &HeaderMap, password: Option<&str>) -> bool {
        !self.password_required()
            || self.cookie_authed(headers)
            || password.map_or(false, |p| self.passwords.contains(p))
    }

    /// `Set-Cookie` header value issued after a successful login
    pub fn set_cookie_header(&self) -> String {
        format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax; Secure",
            AUTH_COOKIE,
            self.token(),
            self.max_age_secs
        )
    }
}
