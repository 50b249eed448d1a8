//! # Sales History
//!
//! Period windows, free-text search and summaries over settled sales.
//!
//! ## Periods
//! ```text
//! Today     ── local midnight of `now` .. now
//! LastWeek  ── now - 7 days .. now
//! LastMonth ── now - 1 calendar month .. now
//! All       ── no lower bound
//! ```
//!
//! Windows are computed in the register's timezone and handed to the store
//! as a UTC lower bound.

use chrono::{DateTime, Duration, Local, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Sale;

/// Date format used when searching sales by date text.
pub const SALE_DATE_FORMAT: &str = "%d/%m/%y";

// =============================================================================
// Sales Period
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesPeriod {
    #[default]
    Today,
    LastWeek,
    LastMonth,
    All,
}

impl SalesPeriod {
    /// Lower bound of the window ending at `now`, or `None` for [`SalesPeriod::All`].
    pub fn start<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
        match self {
            SalesPeriod::Today => {
                let midnight = now.date_naive().and_hms_opt(0, 0, 0)?;
                // DST gaps at midnight fall back to the instant itself
                let local = now
                    .timezone()
                    .from_local_datetime(&midnight)
                    .earliest()
                    .unwrap_or_else(|| now.clone());
                Some(local.with_timezone(&Utc))
            }
            SalesPeriod::LastWeek => Some((now.clone() - Duration::days(7)).with_timezone(&Utc)),
            SalesPeriod::LastMonth => now
                .clone()
                .checked_sub_months(Months::new(1))
                .map(|d| d.with_timezone(&Utc)),
            SalesPeriod::All => None,
        }
    }

    /// Lower bound of the window ending now, in the local timezone.
    pub fn start_local(&self) -> Option<DateTime<Utc>> {
        self.start(&Local::now())
    }

    /// Checks whether a sale date falls in the window ending at `now`.
    pub fn contains<Tz: TimeZone>(&self, date: DateTime<Utc>, now: &DateTime<Tz>) -> bool {
        match self.start(now) {
            Some(start) => date >= start,
            None => true,
        }
    }
}

impl fmt::Display for SalesPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SalesPeriod::Today => "today",
            SalesPeriod::LastWeek => "last week",
            SalesPeriod::LastMonth => "last month",
            SalesPeriod::All => "all time",
        })
    }
}

impl FromStr for SalesPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "today" => Ok(SalesPeriod::Today),
            "week" => Ok(SalesPeriod::LastWeek),
            "month" => Ok(SalesPeriod::LastMonth),
            "all" => Ok(SalesPeriod::All),
            _ => Err(ValidationError::NotAllowed {
                field: "period".to_string(),
                allowed: vec![
                    "day".to_string(),
                    "week".to_string(),
                    "month".to_string(),
                    "all".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Sale Search
// =============================================================================

/// Free-text search over settled sales.
///
/// A sale matches when the text appears in any item's name (case-insensitive),
/// quantity or unit price, in the sale total, or in the sale date
/// formatted as `dd/mm/yy`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleSearch {
    needle: String,
}

impl SaleSearch {
    pub fn new(text: &str) -> Self {
        SaleSearch {
            needle: text.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Matches using the local timezone for the date text.
    pub fn matches(&self, sale: &Sale) -> bool {
        self.matches_in(sale, &Local)
    }

    pub fn matches_in<Tz: TimeZone>(&self, sale: &Sale, tz: &Tz) -> bool
    where
        Tz::Offset: fmt::Display,
    {
        if self.is_empty() {
            return true;
        }
        let needle = self.needle.as_str();

        let item_hit = sale.items.iter().any(|item| {
            item.name.to_lowercase().contains(needle)
                || item.quantity.to_string().contains(needle)
                || item.price().to_plain_string().contains(needle)
        });
        if item_hit {
            return true;
        }

        if sale.total().to_plain_string().contains(needle) {
            return true;
        }

        sale.date
            .with_timezone(tz)
            .format(SALE_DATE_FORMAT)
            .to_string()
            .contains(needle)
    }

    pub fn apply<'a>(&self, sales: &'a [Sale]) -> Vec<&'a Sale> {
        sales.iter().filter(|s| self.matches(s)).collect()
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Count and grand total of a list of sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub count: usize,
    pub units: i64,
    pub total: Money,
}

impl SalesSummary {
    pub fn of<'a, I>(sales: I) -> Self
    where
        I: IntoIterator<Item = &'a Sale>,
    {
        sales.into_iter().fold(SalesSummary::default(), |mut acc, sale| {
            acc.count += 1;
            acc.units += sale.total_quantity();
            acc.total += sale.total();
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleItem;
    use chrono::FixedOffset;

    fn sale(date: DateTime<Utc>, name: &str, price_cents: i64, quantity: i64) -> Sale {
        Sale {
            id: "s1".to_string(),
            items: vec![SaleItem {
                product_id: "p1".to_string(),
                barcode: "123".to_string(),
                name: name.to_string(),
                price_cents,
                quantity,
                subtotal_cents: price_cents * quantity,
            }],
            total_cents: price_cents * quantity,
            date,
            cashier_id: None,
        }
    }

    #[test]
    fn test_today_starts_at_local_midnight() {
        let tz = FixedOffset::west_opt(3 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();

        let start = SalesPeriod::Today.start(&now).unwrap();
        // 00:00 at -03:00 is 03:00 UTC
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 15, 3, 0, 0).unwrap());
    }

    #[test]
    fn test_week_and_month_windows() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();

        assert_eq!(
            SalesPeriod::LastWeek.start(&now).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 24, 12, 0, 0).unwrap()
        );
        // Clamped to the last day of February
        assert_eq!(
            SalesPeriod::LastMonth.start(&now).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
        );
        assert_eq!(SalesPeriod::All.start(&now), None);
    }

    #[test]
    fn test_contains() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let yesterday = Utc.with_ymd_and_hms(2024, 3, 14, 23, 0, 0).unwrap();

        assert!(!SalesPeriod::Today.contains(yesterday, &now));
        assert!(SalesPeriod::LastWeek.contains(yesterday, &now));
        assert!(SalesPeriod::All.contains(yesterday, &now));
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!("day".parse::<SalesPeriod>().unwrap(), SalesPeriod::Today);
        assert_eq!("WEEK".parse::<SalesPeriod>().unwrap(), SalesPeriod::LastWeek);
        assert_eq!("month".parse::<SalesPeriod>().unwrap(), SalesPeriod::LastMonth);
        assert_eq!("all".parse::<SalesPeriod>().unwrap(), SalesPeriod::All);
        assert!("year".parse::<SalesPeriod>().is_err());
    }

    #[test]
    fn test_search_fields() {
        let date = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let s = sale(date, "Agua 500ml", 1000, 4);

        assert!(SaleSearch::new("").matches_in(&s, &Utc));
        assert!(SaleSearch::new("AGUA").matches_in(&s, &Utc));
        assert!(SaleSearch::new("10.00").matches_in(&s, &Utc));
        assert!(SaleSearch::new("40.00").matches_in(&s, &Utc));
        assert!(SaleSearch::new("15/03/24").matches_in(&s, &Utc));
        assert!(!SaleSearch::new("coca").matches_in(&s, &Utc));
    }

    #[test]
    fn test_summary() {
        let date = Utc::now();
        let sales = vec![sale(date, "Agua", 1000, 4), sale(date, "Pan", 250, 2)];

        let summary = SalesSummary::of(&sales);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.units, 6);
        assert_eq!(summary.total.cents(), 4500);

        assert_eq!(SalesSummary::of(Vec::<Sale>::new().iter()), SalesSummary::default());
    }
}
