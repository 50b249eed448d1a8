//! # Repository Module
//!
//! SQLite repositories for Kiosk POS.
//!
//! ## Repository Pattern
//! ```text
//! Register command
//!      │
//!      │  db.products().find_by_barcode("7790001")
//!      ▼
//! ProductRepository
//! ├── find_by_barcode / get_by_id / list_all
//! ├── insert / update / delete
//! └── adjust_stock
//!      │
//!      ▼
//! SQLite
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD and barcode lookup
//! - [`sale::SaleRepository`] - Atomic settlement and sales history

pub mod product;
pub mod sale;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{DbError, DbResult};

/// Timestamps are stored as fixed-width RFC 3339 text so they sort as strings.
pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(field: &str, text: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| DbError::corrupt(field, text))
}
