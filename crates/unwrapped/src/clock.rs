//! Wall-clock display, refreshed once a second in 12-hour format.

use chrono::{DateTime, Local, Timelike};

/// Formatted clock parts as shown in the top bar.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClockDisplay {
    pub hour: String,
    pub minutes: String,
    pub seconds: String,
    pub ampm: String,
}

impl ClockDisplay {
    pub fn text(&self) -> String {
        format!("{}:{}:{} {}", self.hour, self.minutes, self.seconds, self.ampm)
    }
}

/// Format a timestamp into zero-padded 12-hour parts.
pub fn format_time(now: &DateTime<Local>) -> ClockDisplay {
    let (is_pm, hour12) = now.hour12();
    ClockDisplay {
        hour: format!("{hour12:02}"),
        minutes: format!("{:02}", now.minute()),
        seconds: format!("{:02}", now.second()),
        ampm: if is_pm { "PM" } else { "AM" }.to_owned(),
    }
}

/// The ticking clock. Re-formats only when the displayed second changes.
#[derive(Debug, Default)]
pub struct Clock {
    display: ClockDisplay,
}

impl Clock {
    pub fn display(&self) -> &ClockDisplay {
        &self.display
    }

    /// Refresh from the wall clock; returns true when the display changed.
    pub fn update(&mut self) -> bool {
        let display = format_time(&Local::now());
        if display == self.display {
            return false;
        }
        self.display = display;
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32, min: u32, sec: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 7, hour, min, sec).unwrap()
    }

    #[test]
    fn afternoon_times_format_as_pm() {
        let display = format_time(&at(15, 4, 9));
        assert_eq!(display.text(), "03:04:09 PM");
    }

    #[test]
    fn morning_times_format_as_am() {
        let display = format_time(&at(9, 30, 0));
        assert_eq!(display.text(), "09:30:00 AM");
    }

    #[test]
    fn midnight_is_twelve_am_and_noon_twelve_pm() {
        assert_eq!(format_time(&at(0, 0, 0)).text(), "12:00:00 AM");
        assert_eq!(format_time(&at(12, 0, 0)).text(), "12:00:00 PM");
    }

    #[test]
    fn update_reports_change_only_when_the_second_ticks() {
        let mut clock = Clock::default();
        assert!(clock.update());
        // Immediately after, the same second is almost certainly still
        // displayed; either way the display stays well-formed.
        let display = clock.display().clone();
        assert_eq!(display.hour.len(), 2);
        assert!(display.ampm == "AM" || display.ampm == "PM");
    }
}
