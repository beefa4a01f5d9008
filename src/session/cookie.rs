//! Session cookie rendering and the transport abstraction the guard talks to.
//!
//! The session guard never touches an HTTP framework directly. It reads and
//! writes one named cookie through [`CookieTransport`]; the axum layer
//! provides a header-backed implementation.

use chrono::{DateTime, Utc};

use super::SessionConfig;
use super::config::SameSite;

/// Format used for the `Expires` attribute.
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Read and write access to the request/response cookies of one exchange.
pub trait CookieTransport: Send {
    /// Value of the named request cookie, if present.
    fn read(&self, name: &str) -> Option<String>;

    /// Queues a cookie to be sent with the response.
    fn write(&mut self, cookie: SessionCookie);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub expires: DateTime<Utc>,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl SessionCookie {
    /// Cookie carrying `value` until `expires`.
    pub fn issue(config: &SessionConfig, value: String, expires: DateTime<Utc>) -> Self {
        Self {
            name: config.cookie_name.clone(),
            value,
            expires,
            path: config.cookie_path.clone(),
            domain: config.cookie_domain.clone(),
            secure: config.cookie_secure,
            http_only: config.cookie_http_only,
            same_site: config.cookie_same_site,
        }
    }

    /// Empty cookie that expired at the epoch, instructing the client to drop it.
    pub fn removal(config: &SessionConfig) -> Self {
        Self::issue(config, String::new(), DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn is_removal(&self) -> bool {
        self.value.is_empty() && self.expires <= DateTime::<Utc>::UNIX_EPOCH
    }

    /// Renders the `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut header = format!(
            "{}={}; Path={}; Expires={}",
            self.name,
            self.value,
            self.path,
            self.expires.format(HTTP_DATE)
        );
        if let Some(domain) = &self.domain {
            header.push_str("; Domain=");
            header.push_str(domain);
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        if self.secure {
            header.push_str("; Secure");
        }
        header.push_str("; SameSite=");
        header.push_str(&self.same_site.to_string());
        header
    }
}

/// Looks up `name` in a raw `Cookie` request header.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

/// In-memory transport for exercising the session guard without HTTP.
#[cfg(any(test, feature = "mocks"))]
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    pub incoming: std::collections::HashMap<String, String>,
    pub written: Vec<SessionCookie>,
}

#[cfg(any(test, feature = "mocks"))]
impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie(name: &str, value: &str) -> Self {
        let mut jar = Self::new();
        jar.incoming.insert(name.to_owned(), value.to_owned());
        jar
    }

    pub fn last_written(&self) -> Option<&SessionCookie> {
        self.written.last()
    }
}

#[cfg(any(test, feature = "mocks"))]
impl CookieTransport for MemoryCookieJar {
    fn read(&self, name: &str) -> Option<String> {
        self.incoming.get(name).cloned()
    }

    fn write(&mut self, cookie: SessionCookie) {
        self.written.push(cookie);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_issue_renders_all_attributes() {
        let config = SessionConfig::default();
        let expires = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let cookie = SessionCookie::issue(&config, "abc:def".to_owned(), expires);

        assert_eq!(
            cookie.to_header_value(),
            "session_id=abc:def; Path=/; Expires=Wed, 04 Mar 2026 05:06:07 GMT; HttpOnly; Secure; SameSite=Strict"
        );
        assert!(!cookie.is_removal());
    }

    #[test]
    fn test_removal_expires_at_epoch() {
        let config = SessionConfig {
            cookie_domain: Some("example.com".to_owned()),
            cookie_secure: false,
            cookie_same_site: SameSite::Lax,
            ..SessionConfig::default()
        };
        let cookie = SessionCookie::removal(&config);

        assert!(cookie.is_removal());
        assert_eq!(
            cookie.to_header_value(),
            "session_id=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Domain=example.com; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn test_find_cookie() {
        let header = "theme=dark; session_id=abc:def; other=1";
        assert_eq!(find_cookie(header, "session_id"), Some("abc:def"));
        assert_eq!(find_cookie(header, "theme"), Some("dark"));
        assert_eq!(find_cookie(header, "missing"), None);
        assert_eq!(find_cookie("session_idx=1", "session_id"), None);
        assert_eq!(find_cookie("", "session_id"), None);
    }

    #[test]
    fn test_memory_jar_records_writes() {
        let mut jar = MemoryCookieJar::with_cookie("session_id", "value");
        assert_eq!(jar.read("session_id").as_deref(), Some("value"));
        assert!(jar.last_written().is_none());

        jar.write(SessionCookie::removal(&SessionConfig::default()));
        assert!(jar.last_written().unwrap().is_removal());
    }
}
