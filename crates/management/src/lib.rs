//! Campaign store for the insights service — user-scoped, read-mostly access
//! to campaign records and their aggregate counters.
//!
//! Data stored in DashMap (development); swap to a database-backed
//! `CampaignStore` for production.

pub mod store;

pub use store::{ManagementStore, DEMO_USER};
