use chrono::{Datelike, NaiveDateTime};

use crate::quantity::price::MegawattHourPrice;

/// Single price observation, owned by the series of its country.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceRecord {
    /// Local wall-clock time of the market interval start.
    timestamp: NaiveDateTime,

    price: MegawattHourPrice,

    year: i32,

    /// 1-based.
    month: u32,
}

impl PriceRecord {
    pub fn new(timestamp: NaiveDateTime, price: MegawattHourPrice) -> Self {
        Self { timestamp, price, year: timestamp.year(), month: timestamp.month() }
    }

    #[must_use]
    pub const fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub const fn price(&self) -> MegawattHourPrice {
        self.price
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }
}
