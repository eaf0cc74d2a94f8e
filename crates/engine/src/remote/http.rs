use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use super::{Fetched, RemoteError, RemoteSource};
use crate::config::DEFAULT_MAX_SNAPSHOT_BYTES;

/// Default per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Remote source served over HTTP(S) at `<base>/<source>/<path>`.
///
/// The source id is percent-encoded as a single path segment. `404 Not
/// Found` means the document has not been published yet. Bodies larger than
/// [`max_response_bytes`](Self::max_response_bytes) are rejected with
/// [`RemoteError::TooLarge`], whether the server declares the length or not.
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
    max_response_bytes: usize,
}

impl HttpSource {
    /// Creates a source with a default client.
    pub fn new(base: &str) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Self::with_client(base, client)
    }

    /// Creates a source that issues requests through `client`.
    pub fn with_client(base: &str, client: reqwest::Client) -> Result<Self, RemoteError> {
        let base = Url::parse(base).map_err(|err| RemoteError::InvalidLocation {
            location: base.to_owned(),
            reason: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidLocation {
                location: base.to_string(),
                reason: "not a base URL".to_owned(),
            });
        }
        Ok(Self {
            client,
            base,
            max_response_bytes: DEFAULT_MAX_SNAPSHOT_BYTES,
        })
    }

    /// Sets the largest response body accepted, in bytes.
    #[must_use]
    pub const fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Largest response body accepted, in bytes.
    #[must_use]
    pub const fn max_response_bytes(&self) -> usize {
        self.max_response_bytes
    }

    /// Builds the request URL for `path` of `source`.
    pub fn url_for(&self, source: &str, path: &str) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| RemoteError::InvalidLocation {
                location: self.base.to_string(),
                reason: "not a base URL".to_owned(),
            })?;
            segments.pop_if_empty().push(source);
            segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
        }
        Ok(url)
    }
}

impl RemoteSource for HttpSource {
    fn fetch(
        &self,
        source: &str,
        path: &str,
    ) -> impl Future<Output = Result<Fetched, RemoteError>> + Send {
        let url = self.url_for(source, path);
        let client = self.client.clone();
        let limit = self.max_response_bytes;
        async move {
            let url = url?;
            let mut response = client.get(url.clone()).send().await?;
            match response.status() {
                StatusCode::NOT_FOUND => Ok(Fetched::NotYetAvailable),
                status if status.is_success() => {
                    let too_large = || RemoteError::TooLarge {
                        url: url.to_string(),
                        limit,
                    };
                    let mut body = LimitedBody::new(limit, response.content_length())
                        .ok_or_else(too_large)?;
                    while let Some(chunk) = response.chunk().await? {
                        if !body.push(&chunk) {
                            return Err(too_large());
                        }
                    }
                    Ok(Fetched::Available(body.into_inner()))
                }
                status => Err(RemoteError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                }),
            }
        }
    }
}

/// Response body collected chunk by chunk up to a byte limit.
#[derive(Debug)]
struct LimitedBody {
    limit: usize,
    bytes: Vec<u8>,
}

impl LimitedBody {
    /// Starts a body, or `None` when the declared length already exceeds
    /// `limit`.
    fn new(limit: usize, declared: Option<u64>) -> Option<Self> {
        let capacity = match declared {
            Some(length) => usize::try_from(length).ok().filter(|&length| length <= limit)?,
            None => 0,
        };
        Some(Self {
            limit,
            bytes: Vec::with_capacity(capacity),
        })
    }

    /// Appends `chunk`, returning `false` once the limit would be passed.
    fn push(&mut self, chunk: &[u8]) -> bool {
        if chunk.len() > self.limit - self.bytes.len() {
            return false;
        }
        self.bytes.extend_from_slice(chunk);
        true
    }

    fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_is_one_encoded_segment() {
        let source = HttpSource::new("https://symbols.example/feeds/").expect("source");
        let url = source
            .url_for("https://api.nuget.org/v3/index.json", "Symbols_V1/Latest.json")
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://symbols.example/feeds/https:%2F%2Fapi.nuget.org%2Fv3%2Findex.json/Symbols_V1/Latest.json"
        );
    }

    #[test]
    fn non_base_urls_are_rejected() {
        assert!(HttpSource::new("mailto:someone@example.com").is_err());
    }

    #[test]
    fn response_limit_defaults_to_snapshot_limit() {
        let source = HttpSource::new("https://symbols.example/").expect("source");
        assert_eq!(source.max_response_bytes(), DEFAULT_MAX_SNAPSHOT_BYTES);
        assert_eq!(source.with_max_response_bytes(64).max_response_bytes(), 64);
    }

    #[test]
    fn declared_length_over_limit_is_refused_up_front() {
        assert!(LimitedBody::new(16, Some(17)).is_none());
        assert!(LimitedBody::new(16, Some(u64::MAX)).is_none());
        assert!(LimitedBody::new(16, Some(16)).is_some());
        assert!(LimitedBody::new(16, None).is_some());
    }

    #[test]
    fn undeclared_body_is_cut_off_at_the_limit() {
        let mut body = LimitedBody::new(10, None).expect("no declared length");
        assert!(body.push(b"0123"));
        assert!(body.push(b"456789"));
        assert!(!body.push(b"x"));
        assert_eq!(body.into_inner(), b"0123456789");
    }

    #[test]
    fn understated_length_does_not_lift_the_limit() {
        let mut body = LimitedBody::new(8, Some(4)).expect("declared within limit");
        assert!(body.push(b"abcd"));
        assert!(!body.push(b"efghi"));
    }
}
