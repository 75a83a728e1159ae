// bbox-api: Async Rust client for the Bbox router management API

pub mod auth;
pub mod codec;
pub mod error;
pub mod gateway;
pub mod model;
pub mod session;
pub mod transport;
pub mod wire;

pub use auth::{Authenticator, RefreshPolicy, RefresherHandle, refresh_delay};
pub use codec::RuleKind;
pub use error::Error;
pub use gateway::RuleGateway;
pub use model::{
    Action, BearerToken, FirewallRule, IpProtocol, NatRule, NatTable, Protocol,
    unique_description,
};
pub use session::{DEFAULT_BASE_URL, Session};
pub use transport::{TlsMode, TransportConfig};
pub use wire::WireValue;
