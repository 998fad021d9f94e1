//! OAuth2 client side of the gateway.
//!
//! Talks to two external collaborators:
//!
//! - the identity provider's tenant-scoped authorization and token endpoints
//!   (authorization-code grant)
//! - the profile API, called with the access token as a bearer credential

pub mod client;
pub mod profile;

pub use client::{ProviderClient, TokenResponse};
pub use profile::{Profile, UserRecord};
