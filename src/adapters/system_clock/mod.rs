// System clock adapter

use chrono::{DateTime, Utc};

use crate::ports::*;

/// Wall-clock time from the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClockAdapter;

impl ClockPort for SystemClockAdapter {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
