// Rule codec
//
// The router speaks two dialects: JSON (always wrapped in a one-element
// array) on the way out, `application/x-www-form-urlencoded` on the way in.
// `RuleKind` ties a rule type to its resource path, envelope shape and
// form field order so `RuleGateway` can stay generic.

use serde::Serialize;
use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::error::Error;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A rule resource managed through [`RuleGateway`](crate::RuleGateway).
pub trait RuleKind: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    /// Resource path relative to the API base, e.g. `firewall/rules`.
    const PATH: &'static str;
    /// Human-readable name used in errors and logs.
    const LABEL: &'static str;

    /// The object found inside the one-element response array.
    type Envelope: DeserializeOwned + Send;

    fn into_rules(envelope: Self::Envelope) -> Vec<Self>;

    /// Router-assigned id, `None` for rules that haven't been created yet.
    fn id(&self) -> Option<u32>;

    fn description(&self) -> &str;

    /// Form fields in the order the router expects them.
    fn form_fields(&self) -> Vec<(&'static str, String)>;
}

/// Encode key/value pairs as a form body, escaping `&`, `=`, spaces etc.
pub fn encode_form<I, K, V>(fields: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs::<I, K, V>(fields)
        .finish()
}

/// Decode a one-element JSON array and return its sole element.
///
/// Zero or several elements is a protocol error: the router always wraps
/// a single logical resource this way.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    let items: Vec<T> = serde_json::from_str(body)
        .map_err(|e| Error::protocol(format!("unexpected response shape: {e}"), body))?;

    let [item]: [T; 1] = items.try_into().map_err(|items: Vec<T>| {
        Error::protocol(
            format!(
                "expected a one-element envelope array, got {} elements",
                items.len()
            ),
            body,
        )
    })?;
    Ok(item)
}
