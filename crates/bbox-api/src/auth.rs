// Router authentication
//
// Password login sets the session cookie; the device-token endpoint then
// hands out the short-lived bearer token that mutating calls carry. The
// refresher keeps that token fresh in the background for as long as the
// session lives.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::{self, FORM_CONTENT_TYPE};
use crate::error::Error;
use crate::model::{BearerToken, DeviceTokenEnvelope};
use crate::session::{Session, expect_success};

const LOGIN_PATH: &str = "login";
const DEVICE_TOKEN_PATH: &str = "device/token";

/// Timing knobs for the token refresher.
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    /// How long before expiry to fetch a new token.
    pub lead: Duration,
    /// Wait applied after a malformed expiry, a failed fetch, or a fresh
    /// token that already expires inside `lead`.
    pub fallback: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            lead: Duration::from_secs(60),
            fallback: Duration::from_secs(30),
        }
    }
}

/// Login and bearer-token lifecycle for a [`Session`].
#[derive(Clone)]
pub struct Authenticator {
    session: Session,
    policy: RefreshPolicy,
}

impl Authenticator {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            policy: RefreshPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Log in with the router admin password, then fetch a bearer token.
    ///
    /// The router answers `POST /login` with a session cookie that the
    /// session's jar keeps for every later request.
    pub async fn login(&self, password: &SecretString) -> Result<Arc<BearerToken>, Error> {
        debug!(path = LOGIN_PATH, "logging in");

        let body = codec::encode_form([("password", password.expose_secret())]);
        let resp = self
            .session
            .post(LOGIN_PATH, FORM_CONTENT_TYPE, body)
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        debug!("login successful");
        self.fetch_token().await
    }

    /// Fetch a fresh bearer token and publish it into the session.
    pub async fn fetch_token(&self) -> Result<Arc<BearerToken>, Error> {
        let resp = self.session.get(DEVICE_TOKEN_PATH).await?;
        let body = expect_success(resp, "fetch device token").await?;

        let envelope: DeviceTokenEnvelope = codec::decode_envelope(&body)?;
        let token = BearerToken::try_from(envelope.device)?;
        debug!(expires = token.expires(), "bearer token issued");

        Ok(self.session.set_token(token))
    }

    /// Spawn the background refresher.
    ///
    /// Requires a published token. The task lives until the returned
    /// handle is stopped or the runtime shuts down.
    pub fn start_refresher(&self) -> Result<RefresherHandle, Error> {
        if self.session.token().is_none() {
            return Err(Error::State(
                "can't start the token refresher before login".into(),
            ));
        }

        let cancel = CancellationToken::new();
        let auth = self.clone();
        let task = tokio::spawn(refresh_loop(
            self.session.clone(),
            self.policy,
            cancel.clone(),
            move || {
                let auth = auth.clone();
                async move { auth.fetch_token().await }
            },
        ));

        info!("token refresher started");
        Ok(RefresherHandle { cancel, task })
    }
}

/// Control handle for the background token refresher.
///
/// Dropping the handle leaves the task running; call [`stop`](Self::stop)
/// for a deterministic shutdown.
pub struct RefresherHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RefresherHandle {
    /// Signal the refresher to stop without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop the refresher and wait for the task to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                warn!(error = %e, "token refresher panicked");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// The token the task watches, for tying it to a wider shutdown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// How long to sleep before refreshing a token expiring at `expires_at`.
///
/// Fires `lead` before expiry; an expiry already (nearly) past yields zero.
pub fn refresh_delay(
    expires_at: DateTime<FixedOffset>,
    now: DateTime<Utc>,
    lead: Duration,
) -> Duration {
    let lead = TimeDelta::from_std(lead).unwrap_or(TimeDelta::zero());
    let fire_at = expires_at.with_timezone(&Utc) - lead;
    (fire_at - now).to_std().unwrap_or(Duration::ZERO)
}

async fn refresh_loop<F, Fut>(
    session: Session,
    policy: RefreshPolicy,
    cancel: CancellationToken,
    mut fetch: F,
) where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Arc<BearerToken>, Error>> + Send,
{
    let mut refreshed = false;
    loop {
        let mut delay = next_delay(&session, &policy);
        if refreshed && delay.is_zero() {
            warn!(retry_in = ?policy.fallback, "fresh token already due for refresh");
            delay = policy.fallback;
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = fetch() => result,
        };

        match result {
            Ok(token) => {
                info!(expires = token.expires(), "bearer token refreshed");
                refreshed = true;
            }
            Err(e) => {
                refreshed = false;
                warn!(error = %e, retry_in = ?policy.fallback, "token refresh failed");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(policy.fallback) => {}
                }
            }
        }
    }
    debug!("token refresher stopped");
}

fn next_delay(session: &Session, policy: &RefreshPolicy) -> Duration {
    let Some(token) = session.token() else {
        warn!(retry_in = ?policy.fallback, "no bearer token to refresh");
        return policy.fallback;
    };

    match token.expires_at() {
        Ok(expires_at) => {
            let delay = refresh_delay(expires_at, Utc::now(), policy.lead);
            debug!(
                expires = token.expires(),
                delay_secs = delay.as_secs(),
                "next token refresh scheduled"
            );
            delay
        }
        Err(e) => {
            warn!(error = %e, retry_in = ?policy.fallback, "cannot schedule token refresh");
            policy.fallback
        }
    }
}
