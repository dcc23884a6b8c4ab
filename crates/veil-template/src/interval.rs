use chrono::{Duration, Months, NaiveDateTime};

/// PostgreSQL style interval, e.g. `1 year 6 mon 1 day 02:00:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PgInterval {
    pub months: i32,
    pub days: i32,
    pub micros: i64,
}

impl PgInterval {
    pub fn parse(source: &str) -> Result<Self, String> {
        let mut interval = PgInterval::default();
        let parts: Vec<&str> = source.split_whitespace().collect();
        if parts.is_empty() {
            return Err("interval is empty".to_string());
        }

        let mut idx = 0;
        while idx < parts.len() {
            let part = parts[idx];
            if part.contains(':') {
                interval.micros += parse_clock(part)?;
                idx += 1;
                continue;
            }

            let amount = part
                .parse::<i64>()
                .map_err(|_| format!("invalid interval amount \"{}\"", part))?;
            let unit = parts
                .get(idx + 1)
                .ok_or_else(|| format!("missing unit after \"{}\"", part))?;

            let lowered = unit.to_lowercase();
            let normalized = match lowered.as_str() {
                "ms" => "millisecond",
                other => other.trim_end_matches('s'),
            };
            match normalized {
                "year" | "yr" | "y" => interval.months += (amount * 12) as i32,
                "mon" | "month" => interval.months += amount as i32,
                "week" | "w" => interval.days += (amount * 7) as i32,
                "day" | "d" => interval.days += amount as i32,
                "hour" | "hr" | "h" => interval.micros += amount * 3_600_000_000,
                "min" | "minute" => interval.micros += amount * 60_000_000,
                "sec" | "second" => interval.micros += amount * 1_000_000,
                "millisecond" => interval.micros += amount * 1_000,
                _ => return Err(format!("unknown interval unit \"{}\"", unit)),
            }
            idx += 2;
        }

        Ok(interval)
    }

    /// Shifts `value` by the interval, forwards or backwards.
    pub fn shift(&self, value: NaiveDateTime, forward: bool) -> Option<NaiveDateTime> {
        let months = Months::new(self.months.unsigned_abs());
        let with_months = if (self.months >= 0) == forward {
            value.checked_add_months(months)?
        } else {
            value.checked_sub_months(months)?
        };
        let sign = if forward { 1 } else { -1 };
        with_months
            .checked_add_signed(Duration::days(sign * self.days as i64))?
            .checked_add_signed(Duration::microseconds(sign * self.micros))
    }
}

fn parse_clock(part: &str) -> Result<i64, String> {
    let (negative, clock) = match part.strip_prefix('-') {
        Some(clock) => (true, clock),
        None => (false, part),
    };
    let fields: Vec<&str> = clock.split(':').collect();
    if fields.len() < 2 || fields.len() > 3 {
        return Err(format!("invalid interval time \"{}\"", part));
    }

    let hours = fields[0]
        .parse::<i64>()
        .map_err(|_| format!("invalid interval time \"{}\"", part))?;
    let minutes = fields[1]
        .parse::<i64>()
        .map_err(|_| format!("invalid interval time \"{}\"", part))?;
    let seconds = match fields.get(2) {
        Some(seconds) => seconds
            .parse::<f64>()
            .map_err(|_| format!("invalid interval time \"{}\"", part))?,
        None => 0.0,
    };

    let micros =
        hours * 3_600_000_000 + minutes * 60_000_000 + (seconds * 1_000_000.0).round() as i64;
    Ok(if negative { -micros } else { micros })
}
