//! # Ordertrack Storefront
//!
//! Typed client for the storefront's basket-creation endpoint. Creating a
//! basket is how orders enter the projection: the storefront returns the new
//! basket record and the client registers it at `CREATED`.
//!
//! Basket creation is the one user-facing surface of the service — its
//! failures are returned to the caller as [`StorefrontError`], unlike
//! event-stream failures which are only logged.

mod client;
mod error;

pub use client::{demo_basket, StorefrontClient};
pub use error::StorefrontError;
