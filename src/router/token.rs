// Page scripts append `###uniqueRequestId<token>` to a URL so that a captured
// body can be matched to the request that the web view later reports.

pub const REQUEST_ID_MARKER: &str = "###uniqueRequestId";

/// Target URL with any request token removed, plus the token if one was present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedUrl<'a> {
    pub url: &'a str,
    pub token: Option<&'a str>,
}

pub fn split_request_token(raw: &str) -> TaggedUrl<'_> {
    match raw.rfind(REQUEST_ID_MARKER) {
        Some(pos) => TaggedUrl {
            url: &raw[..pos],
            token: Some(&raw[pos + REQUEST_ID_MARKER.len()..]),
        },
        None => TaggedUrl { url: raw, token: None },
    }
}

pub fn tag_url(url: &str, token: &str) -> String {
    format!("{}{}{}", url, REQUEST_ID_MARKER, token)
}
