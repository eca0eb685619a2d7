//! Outbound side of the web tier: credential exchange against the token
//! endpoint and authenticated calls to the data API.

pub mod client;
pub mod token;

pub use client::{DataApiClient, DownstreamRequest};
pub use token::{AccessToken, Credential, TokenProvider};
