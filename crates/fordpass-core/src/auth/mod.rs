//! Authentication support: PKCE challenge generation and token state.
//!
//! The login flow itself lives in [`crate::api::ApiClient`]; this module
//! provides the pieces it composes:
//! - `pkce`: S256 verifier/challenge pairs for the SSO authorize request
//! - `TokenState`: the access/refresh token pair with independent expiry

pub mod pkce;
pub mod token;

pub use token::TokenState;
