// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::{AppError, Result};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const SEC_CH_UA: &str = r#""Google Chrome";v="131", "Chromium";v="131", "Not_A Brand";v="24""#;

/// Static header profile of a desktop Chrome XHR against `origin`.
///
/// `Accept-Encoding` is left to reqwest so that it only advertises the
/// encodings it will transparently decode.
pub fn browser_headers(origin: &Url) -> Result<HeaderMap> {
    let origin = origin.origin().ascii_serialization();
    let referer = format!("{origin}/");

    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9,zh-CN;q=0.8,zh;q=0.7"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(header::ORIGIN, header_value(&origin)?);
    headers.insert(header::REFERER, header_value(&referer)?);
    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static(SEC_CH_UA),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-mobile"),
        HeaderValue::from_static("?0"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"Linux\""),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::config(format!("Invalid header value {value:?}: {e}")))
}

/// Create an asynchronous HTTP client presenting as a browser to `origin`.
pub fn create_async_client(origin: &Url, timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(browser_headers(origin)?)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Create a plain client for outbound pushes.
pub fn create_push_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(client)
}

/// Join `path` onto `base` and append the `t=<unix-ms>&fresh=1` cache buster.
pub fn cache_busted_url(base: &Url, path: &str, now_ms: i64) -> Result<Url> {
    let mut url = base.join(path)?;
    url.query_pairs_mut()
        .append_pair("t", &now_ms.to_string())
        .append_pair("fresh", "1");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_headers_follow_origin() {
        let base = Url::parse("https://alpha123.uk/some/page").unwrap();
        let headers = browser_headers(&base).unwrap();
        assert_eq!(headers[header::ORIGIN], "https://alpha123.uk");
        assert_eq!(headers[header::REFERER], "https://alpha123.uk/");
        assert_eq!(headers["x-requested-with"], "XMLHttpRequest");
        assert!(!headers.contains_key(header::ACCEPT_ENCODING));
    }

    #[test]
    fn test_cache_busted_url() {
        let base = Url::parse("https://alpha123.uk").unwrap();
        let url = cache_busted_url(&base, "/api/price/ZK", 1748822400000).unwrap();
        assert_eq!(
            url.as_str(),
            "https://alpha123.uk/api/price/ZK?t=1748822400000&fresh=1"
        );
    }

    #[test]
    fn test_client_builds() {
        let base = Url::parse("https://alpha123.uk").unwrap();
        assert!(create_async_client(&base, Duration::from_secs(5)).is_ok());
    }
}
