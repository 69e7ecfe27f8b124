//! Refresh token transport policy: cookie construction, parsing, and the
//! `Expires` formatting that keeps cookie lifetime in lockstep with the
//! token's own expiry.

use axum::http::header;

/// Default name of the refresh token cookie.
pub const DEFAULT_REFRESH_COOKIE: &str = "refresh";

/// How refresh tokens are placed in and read back from cookies.
///
/// The cookie's `Expires` attribute is always the refresh token's own hard
/// expiry, so the cookie can neither outlive the token nor vice versa.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    /// Cookie name (configurable, default `refresh`).
    pub name: String,
    /// Whether to set the `Secure` attribute.
    pub secure: bool,
}

impl CookiePolicy {
    pub fn new(name: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            secure,
        }
    }

    /// Build the Set-Cookie value carrying a refresh token that expires at
    /// `expires_at` (Unix seconds).
    pub fn set_cookie(&self, token: &str, expires_at: u64) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!(
            "{}={}; HttpOnly; SameSite=Strict; Path=/; Expires={}{}",
            self.name,
            token,
            format_http_date(expires_at),
            secure
        )
    }

    /// Build the Set-Cookie value that deletes the refresh cookie.
    pub fn clear_cookie(&self) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!(
            "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0{}",
            self.name, secure
        )
    }

    /// Read the refresh token from an incoming request's Cookie header.
    pub fn read<'a>(&self, headers: &'a axum::http::HeaderMap) -> Option<&'a str> {
        get_cookie(headers, &self.name)
    }
}

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Format a Unix timestamp as an RFC 7231 IMF-fixdate for cookie `Expires`
/// attributes, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(timestamp: u64) -> String {
    const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    let days_since_epoch = timestamp / 86400;
    let time_of_day = timestamp % 86400;
    let hours = time_of_day / 3600;
    let minutes = (time_of_day % 3600) / 60;
    let seconds = time_of_day % 60;

    let (year, month, day) = days_to_ymd(days_since_epoch as i64);
    // 1970-01-01 was a Thursday
    let weekday = DAYS[((days_since_epoch + 4) % 7) as usize];

    format!(
        "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
        weekday,
        day,
        MONTHS[(month - 1) as usize],
        year,
        hours,
        minutes,
        seconds
    )
}

/// Convert days since Unix epoch to year, month, day.
fn days_to_ymd(days: i64) -> (i32, u32, u32) {
    // Algorithm from http://howardhinnant.github.io/date_algorithms.html
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y as i32, m, d)
}
