//! Shopify session-token pipeline.
//!
//! The `/inventory` route runs three stages against Shopify, in order:
//!
//! 1. [`session`] - verify the inbound session token and decode its claims
//! 2. [`exchange`] - trade the session token for an Admin API access token
//! 3. [`inventory`] - query inventory levels for a variant and pick the
//!    level at the requested location
//!
//! Stage 1 failures are fatal to the request (401/403). Stages 2 and 3
//! return tagged failures that are carried into the response envelope
//! instead of aborting the pipeline.

pub mod exchange;
pub mod inventory;
pub mod session;

pub use exchange::{ExchangeFailure, exchange_session_token};
pub use inventory::{
    InventoryLevelNode, InventoryLevels, InventoryMatch, LocationNode, QueryFailure,
    fetch_variant_inventory, location_gid, select_match, variant_gid,
};
pub use session::{SessionClaims, SessionTokenError, verify_session_token};
