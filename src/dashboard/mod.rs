//! Dashboard module
//!
//! Provides an overview page showing spending statistics, charts, and the
//! recent-expenses table. Includes the date range filter for bounding which
//! expenses are aggregated.

mod cards;
mod charts;
mod handlers;
mod query;
mod stats;
mod tables;

pub use handlers::get_dashboard_page;
