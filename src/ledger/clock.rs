use chrono::{Local, NaiveDate, TimeZone};

/// Source of "now" for id assignment and current-year filtering.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn timestamp_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn timestamp_millis(&self) -> i64 {
        Local::now().timestamp_millis()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    today: NaiveDate,
    millis: i64,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        let millis = today
            .and_hms_opt(12, 0, 0)
            .map(|naive| chrono::Utc.from_utc_datetime(&naive).timestamp_millis())
            .unwrap_or_default();
        Self { today, millis }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn timestamp_millis(&self) -> i64 {
        self.millis
    }
}
