//! Trade log entries.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStatus {
    Closed,
    /// Still open at the final bar, valued at that bar's close.
    Unrealized,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Closed => write!(f, "closed"),
            TradeStatus::Unrealized => write!(f, "unrealized"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub direction: Direction,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: Option<NaiveDate>,
    pub exit_price: Option<f64>,
    /// Latest valuation price: the exit price once closed, otherwise the
    /// close of the last bar seen.
    pub mark_price: f64,
}

impl Trade {
    pub fn open_long(entry_date: NaiveDate, entry_price: f64) -> Self {
        Self {
            direction: Direction::Long,
            entry_date,
            entry_price,
            exit_date: None,
            exit_price: None,
            mark_price: entry_price,
        }
    }

    pub fn close(&mut self, exit_date: NaiveDate, exit_price: f64) {
        self.exit_date = Some(exit_date);
        self.exit_price = Some(exit_price);
        self.mark_price = exit_price;
    }

    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }

    pub fn status(&self) -> TradeStatus {
        if self.is_closed() {
            TradeStatus::Closed
        } else {
            TradeStatus::Unrealized
        }
    }

    /// `Some(true)` for a closed trade that exited above entry, `None` while open.
    pub fn is_win(&self) -> Option<bool> {
        self.exit_price.map(|exit| exit > self.entry_price)
    }

    /// Fractional return at the mark price.
    pub fn return_pct(&self) -> f64 {
        self.mark_price / self.entry_price - 1.0
    }
}
