//! # Wardboard Core
//!
//! Read-side logic for the clinic management dashboard.
//!
//! This crate holds the record store seam and its backends, and the aggregation engine that
//! turns store rows into the dashboard KPIs, occupancy, notifications, search results, ward
//! summaries and audit views. It also keeps the notice board and view slots used by the
//! surfaces that present those values.
//!
//! **No API concerns**: HTTP handlers and command-line parsing belong in `api-rest` and `cli`.

pub mod audit;
pub mod badge;
pub mod clock;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
#[cfg(test)]
mod fixtures;
pub mod notices;
pub mod notifications;
pub mod occupancy;
pub mod search;
pub mod store;
pub mod view;
pub mod wards;

pub use audit::{AuditFilter, AuditStats, AuditTab, AuditView};
pub use badge::{badge_label, BadgeRefresher};
pub use config::{open_store, CoreConfig, OpenedStore, StoreBackend};
pub use dashboard::{DashboardReport, DashboardStats};
pub use error::{WardError, WardResult};
pub use notices::{Notice, NoticeBoard, NoticeLevel};
pub use notifications::Notification;
pub use occupancy::DepartmentOccupancy;
pub use search::SearchResult;
pub use store::{ChangeFeed, MemoryStore, PostgrestStore, RecordStore};
pub use view::ViewSlot;
pub use wards::{BedFilter, WardBoard};
