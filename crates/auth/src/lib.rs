//! Credentials for the storefront.
//!
//! - [`hash_password`] / [`verify_password`]: argon2 PHC strings
//! - [`TokenService`]: HS256 bearer tokens carrying the user id and role
//! - [`IdentityProvider`]: federated sign-in, with [`GoogleOAuthClient`] for
//!   production and [`StaticIdentityProvider`] for tests

pub mod error;
pub mod oauth;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use oauth::{
    GoogleConfig, GoogleOAuthClient, GoogleProfile, IdentityProvider, StaticIdentityProvider,
    frontend_callback_url,
};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};
