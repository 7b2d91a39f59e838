//! Request authentication for the iRacing API.
//!
//! Two modes exist: a static bearer key, and a session established by
//! posting a hashed password to the login endpoint. Both are represented by
//! [`AuthContext`], which knows how to attach itself to an outgoing request.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{COOKIE, SET_COOKIE};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Hash a password the way the login endpoint expects it.
///
/// The email is lower-cased and appended to the password as a salt; the
/// SHA-256 digest of the UTF-8 bytes is then base64 encoded.
pub fn encode_password(email: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(email.to_lowercase().as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Credentials attached to telemetry requests.
#[derive(Clone, Debug)]
pub enum AuthContext {
    /// `Authorization: Bearer <key>` on every request.
    Bearer(SecretString),
    /// Cookies handed out by a successful login.
    Session(Arc<Jar>),
}

impl AuthContext {
    /// Build a session from the `Set-Cookie` headers of a login response.
    pub fn session_from_response(resp: &reqwest::Response) -> Self {
        let jar = Arc::new(Jar::default());
        let mut cookies = resp.headers().get_all(SET_COOKIE).iter();
        jar.set_cookies(&mut cookies, resp.url());
        AuthContext::Session(jar)
    }

    /// Attach credentials to a request bound for `url`.
    pub fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        url: &reqwest::Url,
    ) -> reqwest::RequestBuilder {
        match self {
            AuthContext::Bearer(key) => request.bearer_auth(key.expose_secret()),
            AuthContext::Session(jar) => match jar.cookies(url) {
                Some(header) => request.header(COOKIE, header),
                None => request,
            },
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            AuthContext::Bearer(_) => "bearer",
            AuthContext::Session(_) => "session",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_password_matches_documented_example() {
        assert_eq!(
            encode_password("CLunky@iRacing.Com", "MyPassWord"),
            "xGKecAR27ALXNuMLsGaG0v5Q9pSs2tZTZRKNgmHMg+Q="
        );
    }

    #[test]
    fn encode_password_ignores_email_case() {
        assert_eq!(
            encode_password("Driver@Example.com", "hunter2"),
            encode_password("driver@example.com", "hunter2")
        );
        assert_eq!(
            encode_password("driver@example.com", "hunter2"),
            "b2YdRMTIiziQusHSkGC0vXYm9zr72DZSb8WCOcwOq4Q="
        );
    }

    #[test]
    fn bearer_sets_authorization_header() {
        let ctx = AuthContext::Bearer(SecretString::new("k3y".into()));
        let url: reqwest::Url = "http://localhost/data".parse().unwrap();
        let req = ctx
            .authorize(reqwest::Client::new().get(url.clone()), &url)
            .build()
            .unwrap();
        assert_eq!(req.headers()["authorization"], "Bearer k3y");
        assert_eq!(ctx.mode(), "bearer");
    }

    #[test]
    fn session_forwards_stored_cookies() {
        let jar = Arc::new(Jar::default());
        let url: reqwest::Url = "http://localhost/data".parse().unwrap();
        jar.add_cookie_str("authtoken_members=abc; Path=/", &url);
        let ctx = AuthContext::Session(jar);
        let req = ctx
            .authorize(reqwest::Client::new().get(url.clone()), &url)
            .build()
            .unwrap();
        assert_eq!(req.headers()["cookie"], "authtoken_members=abc");
        assert!(req.headers().get("authorization").is_none());
    }

    #[test]
    fn empty_session_adds_nothing() {
        let ctx = AuthContext::Session(Arc::new(Jar::default()));
        let url: reqwest::Url = "http://localhost/data".parse().unwrap();
        let req = ctx
            .authorize(reqwest::Client::new().get(url.clone()), &url)
            .build()
            .unwrap();
        assert!(req.headers().get("cookie").is_none());
        assert_eq!(ctx.mode(), "session");
    }
}
