use chrono::{DateTime, Datelike, Local, NaiveTime, Weekday};

/// Pluggable holiday source consulted by [`TradingCalendar::is_trading_day`].
///
/// The default [`NoHolidays`] treats every weekday as a trading day, matching
/// the spec's placeholder behaviour; a real deployment plugs in an exchange
/// holiday list here without touching the hour-window logic below.
pub trait HolidayCalendar: Send + Sync {
    fn is_holiday(&self, date: chrono::NaiveDate) -> bool;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn is_holiday(&self, _date: chrono::NaiveDate) -> bool {
        false
    }
}

/// Pure, stateless trading-day / trading-hours predicate.
///
/// No I/O, no errors. Implementations must use the host's local time;
/// timezone handling is the caller's responsibility (see spec §4.1).
pub trait TradingCalendar: Send + Sync {
    fn is_trading_day(&self, t: DateTime<Local>) -> bool;

    fn is_trading_hours(&self, t: DateTime<Local>) -> bool {
        if !self.is_trading_day(t) {
            return false;
        }
        let time = t.time();
        in_window(time, 9, 30, 11, 30) || in_window(time, 13, 0, 15, 0)
    }
}

fn in_window(time: NaiveTime, h1: u32, m1: u32, h2: u32, m2: u32) -> bool {
    let start = NaiveTime::from_hms_opt(h1, m1, 0).expect("valid time");
    let end = NaiveTime::from_hms_opt(h2, m2, 0).expect("valid time");
    time >= start && time <= end
}

/// Live calendar backed by the host clock and an injectable holiday source.
#[derive(Default)]
pub struct HostCalendar<H = NoHolidays> {
    holidays: H,
}

impl<H> HostCalendar<H> {
    pub fn new(holidays: H) -> Self {
        Self { holidays }
    }
}

impl<H: HolidayCalendar> TradingCalendar for HostCalendar<H> {
    fn is_trading_day(&self, t: DateTime<Local>) -> bool {
        let weekday = t.weekday();
        if matches!(weekday, Weekday::Sat | Weekday::Sun) {
            return false;
        }
        !self.holidays.is_holiday(t.date_naive())
    }
}

/// Fixed-clock calendar used by tests that need deterministic "now".
///
/// Grounded on the teacher's `HistoricalClock` test-double pattern
/// (`barter/src/engine/clock.rs`): instead of calling `Local::now()`, the
/// caller advances time explicitly.
#[derive(Debug, Clone, Copy)]
pub struct FixedCalendar {
    pub trading_day: bool,
}

impl FixedCalendar {
    pub fn trading_day() -> Self {
        Self { trading_day: true }
    }

    pub fn holiday() -> Self {
        Self { trading_day: false }
    }
}

impl TradingCalendar for FixedCalendar {
    fn is_trading_day(&self, _t: DateTime<Local>) -> bool {
        self.trading_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn weekend_is_not_a_trading_day() {
        let cal = HostCalendar::new(NoHolidays);
        // 2024-01-06 is a Saturday.
        assert!(!cal.is_trading_day(at(2024, 1, 6, 10, 0)));
    }

    #[test]
    fn weekday_is_a_trading_day_by_default() {
        let cal = HostCalendar::new(NoHolidays);
        // 2024-01-08 is a Monday.
        assert!(cal.is_trading_day(at(2024, 1, 8, 10, 0)));
    }

    #[test]
    fn trading_hours_excludes_lunch_break() {
        let cal = HostCalendar::new(NoHolidays);
        assert!(cal.is_trading_hours(at(2024, 1, 8, 10, 0)));
        assert!(!cal.is_trading_hours(at(2024, 1, 8, 12, 0)));
        assert!(cal.is_trading_hours(at(2024, 1, 8, 14, 0)));
        assert!(!cal.is_trading_hours(at(2024, 1, 8, 16, 0)));
    }

    #[test]
    fn weekend_is_never_trading_hours() {
        let cal = HostCalendar::new(NoHolidays);
        assert!(!cal.is_trading_hours(at(2024, 1, 6, 10, 0)));
    }
}
