// Rule gateway
//
// Generic CRUD over a rule table. Reads are plain cookie-authenticated
// GETs; every mutating call carries `?btoken=` and a form body. Nothing
// here retries: callers decide what to do with a failure.

use std::marker::PhantomData;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use tracing::{debug, info};

use crate::codec::{self, FORM_CONTENT_TYPE, RuleKind};
use crate::error::Error;
use crate::model::{NatRule, NatTable};
use crate::session::{Session, expect_status, expect_success};
use crate::wire::flag_str;

/// CRUD access to one rule table (`firewall/rules`, `nat/rules`).
pub struct RuleGateway<R> {
    session: Session,
    _kind: PhantomData<fn() -> R>,
}

impl<R> Clone for RuleGateway<R> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            _kind: PhantomData,
        }
    }
}

impl<R: RuleKind> RuleGateway<R> {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session,
            _kind: PhantomData,
        }
    }

    fn rule_path(id: u32) -> String {
        format!("{}/{id}", R::PATH)
    }

    async fn fetch_envelope(&self) -> Result<R::Envelope, Error> {
        let resp = self.session.get(R::PATH).await?;
        let body = expect_success(resp, &format!("list {}s", R::LABEL)).await?;
        codec::decode_envelope(&body)
    }

    /// All rules in the table, in router order.
    pub async fn list(&self) -> Result<Vec<R>, Error> {
        let rules = R::into_rules(self.fetch_envelope().await?);
        debug!(count = rules.len(), kind = R::LABEL, "listed rules");
        Ok(rules)
    }

    /// A single rule by id.
    ///
    /// The router has no usable single-rule GET, so this scans the list.
    pub async fn get(&self, id: u32) -> Result<R, Error> {
        self.list()
            .await?
            .into_iter()
            .find(|r| r.id() == Some(id))
            .ok_or_else(|| Error::NotFound {
                kind: R::LABEL,
                identifier: id.to_string(),
            })
    }

    /// First rule whose description matches exactly.
    pub async fn find_by_description(&self, description: &str) -> Result<Option<R>, Error> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|r| r.description() == description))
    }

    /// Create a rule. The router answers 201 and does not echo the new id.
    pub async fn add(&self, rule: &R) -> Result<(), Error> {
        let body = codec::encode_form(rule.form_fields());
        let builder = self
            .session
            .build_authorized_request(Method::POST, R::PATH)?
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body);

        let resp = self.session.send(builder).await?;
        expect_status(resp, &[StatusCode::CREATED], &format!("add {}", R::LABEL)).await?;

        info!(kind = R::LABEL, description = rule.description(), "rule created");
        Ok(())
    }

    /// Update the rule whose description matches `rule.description`.
    ///
    /// Descriptions are a weak key (the router doesn't enforce uniqueness);
    /// the first match wins. With no match nothing is sent.
    pub async fn update(&self, rule: &R) -> Result<(), Error> {
        self.session.require_token()?;

        let target = self
            .find_by_description(rule.description())
            .await?
            .and_then(|existing| existing.id())
            .ok_or_else(|| Error::NotFound {
                kind: R::LABEL,
                identifier: rule.description().to_owned(),
            })?;

        self.update_by_id(target, rule).await
    }

    /// Replace rule `id` with the fields of `rule`.
    pub async fn update_by_id(&self, id: u32, rule: &R) -> Result<(), Error> {
        let body = codec::encode_form(rule.form_fields());
        let builder = self
            .session
            .build_authorized_request(Method::PUT, &Self::rule_path(id))?
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body);

        let resp = self.session.send(builder).await?;
        expect_status(resp, &[StatusCode::OK], &format!("update {} {id}", R::LABEL)).await?;

        info!(kind = R::LABEL, id, "rule updated");
        Ok(())
    }

    /// Delete rule `id`. Firmware revisions answer either 200 or 204.
    pub async fn delete(&self, id: u32) -> Result<(), Error> {
        let builder = self
            .session
            .build_authorized_request(Method::DELETE, &Self::rule_path(id))?;

        let resp = self.session.send(builder).await?;
        expect_status(
            resp,
            &[StatusCode::OK, StatusCode::NO_CONTENT],
            &format!("delete {} {id}", R::LABEL),
        )
        .await?;

        info!(kind = R::LABEL, id, "rule deleted");
        Ok(())
    }

    /// Switch rule `id` on or off without touching its other fields.
    pub async fn set_enabled(&self, id: u32, enabled: bool) -> Result<(), Error> {
        let body = codec::encode_form([("enable", flag_str(enabled))]);
        let builder = self
            .session
            .build_authorized_request(Method::PUT, &Self::rule_path(id))?
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body);

        let resp = self.session.send(builder).await?;
        let verb = if enabled { "enable" } else { "disable" };
        expect_status(
            resp,
            &[StatusCode::OK, StatusCode::NO_CONTENT],
            &format!("{verb} {} {id}", R::LABEL),
        )
        .await?;

        info!(kind = R::LABEL, id, enabled, "rule toggled");
        Ok(())
    }
}

impl RuleGateway<NatRule> {
    /// The whole NAT table, including its router-wide enable flag.
    pub async fn table(&self) -> Result<NatTable, Error> {
        Ok(self.fetch_envelope().await?.nat)
    }
}
