//! Header-backed [`CookieTransport`] for axum requests.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};

use crate::session::{CookieTransport, SessionCookie, find_cookie};

/// Reads the request's `Cookie` headers and buffers cookies to be written to
/// the response.
#[derive(Debug, Default)]
pub struct HeaderCookies {
    request: String,
    pending: Vec<SessionCookie>,
}

impl HeaderCookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        // HTTP/2 clients may split cookies over several headers
        let request = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");

        Self {
            request,
            pending: Vec::new(),
        }
    }

    /// Appends the buffered cookies as `Set-Cookie` headers.
    ///
    /// A cookie the response already sets (for example the removal written by
    /// the logout handler) is left as the handler wrote it.
    pub fn apply(self, headers: &mut HeaderMap) {
        for cookie in self.pending {
            let prefix = format!("{}=", cookie.name);
            let already_set = headers
                .get_all(SET_COOKIE)
                .iter()
                .any(|value| value.as_bytes().starts_with(prefix.as_bytes()));
            if already_set {
                continue;
            }
            append_cookie(headers, &cookie);
        }
    }
}

impl CookieTransport for HeaderCookies {
    fn read(&self, name: &str) -> Option<String> {
        find_cookie(&self.request, name).map(ToOwned::to_owned)
    }

    fn write(&mut self, cookie: SessionCookie) {
        self.pending.push(cookie);
    }
}

/// Adds `cookie` as a `Set-Cookie` header.
pub fn append_cookie(headers: &mut HeaderMap, cookie: &SessionCookie) {
    match HeaderValue::from_str(&cookie.to_header_value()) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(e) => {
            log::error!(
                target: "mainframe_auth",
                "msg=\"invalid set-cookie header\" cookie=\"{}\" error=\"{e}\"",
                cookie.name
            );
        }
    }
}
