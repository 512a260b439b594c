use lazy_static::lazy_static;
use regex::Regex;

/// Django's CSRF cookie.
pub const CSRF_COOKIE: &str = "csrftoken";

lazy_static! {
    static ref COOKIE_PAIR: Regex = Regex::new(r"(?:^|;)\s*([^=;\s]+)\s*=([^;]*)").unwrap();
}

/// Looks up `name` in a `Cookie` header style string and percent-decodes its value.
/// The first occurrence wins.
pub fn get_cookie(raw: &str, name: &str) -> Option<String> {
    COOKIE_PAIR
        .captures_iter(raw)
        .find(|c| &c[1] == name)
        .map(|c| decode(c[2].trim()))
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| value.to_owned())
}
