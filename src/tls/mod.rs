//! Transport security: SSL facts, HSTS, Expect-CT and header processing.

pub mod expectct;
pub mod hsts;
pub mod securityheaders;
pub mod sslinfo;
pub mod state;

pub use expectct::{CtRequirement, ExpectCtStore};
pub use hsts::{HstsEntry, HstsStore};
pub use sslinfo::{CertStatus, ClientCertificate, SslCertRequestInfo, SslInfo};
pub use state::{DefaultTransportSecurityState, TransportSecurityState};
