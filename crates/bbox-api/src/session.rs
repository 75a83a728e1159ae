// Router session
//
// Wraps `reqwest::Client` with base-URL resolution, the cookie jar the
// login endpoint populates, and the current bearer token. Every request
// to the router goes through here; the authenticator writes the token,
// gateways and the refresher read it.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, trace};
use url::Url;

use crate::auth::Authenticator;
use crate::codec::FORM_CONTENT_TYPE;
use crate::error::Error;
use crate::gateway::RuleGateway;
use crate::model::{BearerToken, FirewallRule, NatRule};
use crate::transport::TransportConfig;

/// The router's public management endpoint.
pub const DEFAULT_BASE_URL: &str = "https://mabbox.bytel.fr/api/v1";

/// Authenticated session against a single router.
///
/// Cheap to clone: clones share the HTTP client, cookie jar and token.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    http: reqwest::Client,
    base_url: Url,
    /// Single writer (the authenticator), many readers. Readers take an
    /// `Arc` snapshot, so a refresh never pulls a token out from under an
    /// in-flight request.
    token: ArcSwapOption<BearerToken>,
    cookie_jar: Option<Arc<Jar>>,
    timeout: Duration,
}

impl Session {
    /// Create a session from a `TransportConfig`.
    ///
    /// A cookie jar is created if the config doesn't carry one; the login
    /// flow depends on it. `base_url` is the API root, e.g.
    /// `https://mabbox.bytel.fr/api/v1`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Self::build(http, base_url, config.cookie_jar, config.timeout)
    }

    /// Create a session around a pre-built `reqwest::Client`.
    ///
    /// The client is responsible for its own cookie handling.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Result<Self, Error> {
        Self::build(http, base_url, None, TransportConfig::default().timeout)
    }

    fn build(
        http: reqwest::Client,
        base_url: Url,
        cookie_jar: Option<Arc<Jar>>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        Ok(Self {
            inner: Arc::new(SessionInner {
                http,
                base_url,
                token: ArcSwapOption::empty(),
                cookie_jar,
                timeout,
            }),
        })
    }

    /// The API root every path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve `path` below the base URL, keeping the base's own path
    /// (`/api/v1`) intact.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Start a request for callers needing custom headers or query.
    pub fn build_request(&self, method: Method, path: &str) -> Result<RequestBuilder, Error> {
        Ok(self.inner.http.request(method, self.url(path)?))
    }

    /// Start a request carrying the current bearer token as `?btoken=`.
    ///
    /// Fails with [`Error::AuthRequired`] before anything goes on the wire
    /// when no token has been published yet.
    pub fn build_authorized_request(
        &self,
        method: Method,
        path: &str,
    ) -> Result<RequestBuilder, Error> {
        let token = self.require_token()?;
        Ok(self
            .build_request(method, path)?
            .query(&[("btoken", token.expose_token())]))
    }

    /// Send a prepared request, mapping transport failures.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, Error> {
        let request = builder.build().map_err(Error::Network)?;
        debug!(method = %request.method(), path = request.url().path(), "router request");

        let resp = self
            .inner
            .http
            .execute(request)
            .await
            .map_err(|e| self.map_transport(e))?;

        trace!(status = resp.status().as_u16(), "router response");
        Ok(resp)
    }

    pub async fn get(&self, path: &str) -> Result<Response, Error> {
        self.send(self.build_request(Method::GET, path)?).await
    }

    pub async fn post(
        &self,
        path: &str,
        content_type: &str,
        body: impl Into<reqwest::Body>,
    ) -> Result<Response, Error> {
        let builder = self
            .build_request(Method::POST, path)?
            .header(CONTENT_TYPE, content_type)
            .body(body);
        self.send(builder).await
    }

    /// PUT with an optional form body.
    pub async fn put(&self, path: &str, body: Option<String>) -> Result<Response, Error> {
        self.send(with_form_body(self.build_request(Method::PUT, path)?, body))
            .await
    }

    /// DELETE with an optional form body.
    pub async fn delete(&self, path: &str, body: Option<String>) -> Result<Response, Error> {
        self.send(with_form_body(self.build_request(Method::DELETE, path)?, body))
            .await
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.inner.timeout.as_secs(),
            }
        } else {
            Error::Network(err)
        }
    }

    // ── Token ─────────────────────────────────────────────────────────

    /// Snapshot of the current bearer token.
    pub fn token(&self) -> Option<Arc<BearerToken>> {
        self.inner.token.load_full()
    }

    /// The current token, or [`Error::AuthRequired`].
    pub fn require_token(&self) -> Result<Arc<BearerToken>, Error> {
        self.token().ok_or(Error::AuthRequired)
    }

    /// Publish a new token, superseding the previous one.
    pub(crate) fn set_token(&self, token: BearerToken) -> Arc<BearerToken> {
        let token = Arc::new(token);
        self.inner.token.store(Some(Arc::clone(&token)));
        token
    }

    /// Forget the current token.
    pub fn clear_token(&self) {
        self.inner.token.store(None);
    }

    /// The `Cookie` header the jar would send to the base URL.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.inner.cookie_jar.as_ref()?;
        let cookies = jar.cookies(&self.inner.base_url)?;
        cookies.to_str().ok().map(String::from)
    }

    // ── Components ───────────────────────────────────────────────────

    pub fn auth(&self) -> Authenticator {
        Authenticator::new(self.clone())
    }

    pub fn firewall(&self) -> RuleGateway<FirewallRule> {
        RuleGateway::new(self.clone())
    }

    pub fn nat(&self) -> RuleGateway<NatRule> {
        RuleGateway::new(self.clone())
    }
}

fn with_form_body(builder: RequestBuilder, body: Option<String>) -> RequestBuilder {
    match body {
        Some(body) => builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(body),
        None => builder,
    }
}

// ── Response checks ──────────────────────────────────────────────────

/// Require one of `accepted`, else [`Error::Status`] with the observed code.
pub(crate) async fn expect_status(
    resp: Response,
    accepted: &[StatusCode],
    operation: &str,
) -> Result<(), Error> {
    let status = resp.status();
    if accepted.contains(&status) {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), %operation, body = %body, "unexpected status");
    Err(Error::Status {
        status: status.as_u16(),
        operation: operation.to_owned(),
    })
}

/// Require a 2xx and return the body text.
pub(crate) async fn expect_success(resp: Response, operation: &str) -> Result<String, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            operation: operation.to_owned(),
        });
    }
    resp.text().await.map_err(Error::Network)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(base: &str) -> Session {
        Session::with_client(reqwest::Client::new(), Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn url_keeps_base_path() {
        let s = session("https://mabbox.bytel.fr/api/v1");
        assert_eq!(
            s.url("/firewall/rules/3").unwrap().as_str(),
            "https://mabbox.bytel.fr/api/v1/firewall/rules/3"
        );
        assert_eq!(
            s.url("nat/rules").unwrap().as_str(),
            "https://mabbox.bytel.fr/api/v1/nat/rules"
        );
    }

    #[test]
    fn url_tolerates_trailing_slash_on_base() {
        let s = session("http://192.168.1.254/api/v1/");
        assert_eq!(
            s.url("login").unwrap().as_str(),
            "http://192.168.1.254/api/v1/login"
        );
    }

    #[test]
    fn cannot_be_a_base_is_rejected() {
        let result = Session::with_client(
            reqwest::Client::new(),
            Url::parse("mailto:admin@example.com").unwrap(),
        );
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn authorized_request_requires_token() {
        let s = session("https://mabbox.bytel.fr/api/v1");
        let err = s
            .build_authorized_request(Method::DELETE, "firewall/rules/1")
            .unwrap_err();
        assert!(matches!(err, Error::AuthRequired));
    }

    #[test]
    fn authorized_request_carries_btoken() {
        let s = session("https://mabbox.bytel.fr/api/v1");
        s.set_token(BearerToken::new("tok 1", "2030-01-01T00:00:00+0100"));
        let req = s
            .build_authorized_request(Method::PUT, "nat/rules/4")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.url().query(), Some("btoken=tok+1"));
    }

    #[test]
    fn token_swap_keeps_old_snapshot_alive() {
        let s = session("https://mabbox.bytel.fr/api/v1");
        s.set_token(BearerToken::new("old", "2030-01-01T00:00:00+0100"));
        let held = s.token().unwrap();
        s.set_token(BearerToken::new("new", "2030-01-01T01:00:00+0100"));
        assert_eq!(held.expose_token(), "old");
        assert_eq!(s.token().unwrap().expose_token(), "new");
        s.clear_token();
        assert!(s.token().is_none());
    }

    #[test]
    fn concurrent_readers_never_see_a_torn_token() {
        let s = session("https://mabbox.bytel.fr/api/v1");
        s.set_token(BearerToken::new("tok-0", "0"));

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for n in 1..2_000u32 {
                    s.set_token(BearerToken::new(format!("tok-{n}"), n.to_string()));
                }
            });
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..2_000 {
                        let snap = s.token().unwrap();
                        let suffix = snap.expose_token().trim_start_matches("tok-");
                        assert_eq!(suffix, snap.expires());
                    }
                });
            }
        });
    }
}
