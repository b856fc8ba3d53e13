// Day-aligned pagination over a time range
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};

/// One calendar day, `[start, start + 24h)` in the range's own offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBucket {
    pub start: DateTime<FixedOffset>,
}

impl DayBucket {
    pub fn end(&self) -> DateTime<FixedOffset> {
        self.start + Duration::hours(24)
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// `YYYY-MM-DD`, the form the trends endpoint expects
    pub fn date_param(&self) -> String {
        self.date().format("%Y-%m-%d").to_string()
    }
}

/// Local midnight of the day containing `t`
pub fn midnight(t: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    *t - t.time().signed_duration_since(NaiveTime::MIN)
}

/// Lazy walk over the days covering `[from, to]`; clone it to restart.
#[derive(Debug, Clone)]
pub struct DayBuckets {
    next: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

/// Days are counted in `from`'s offset, whatever offset `to` carries.
pub fn bucketize(from: &DateTime<FixedOffset>, to: &DateTime<FixedOffset>) -> DayBuckets {
    let to = to.with_timezone(from.offset());
    DayBuckets {
        next: midnight(from),
        // exclusive bound; keeps the day holding `to` even when `to` is not midnight
        end: midnight(&to) + Duration::hours(24),
    }
}

impl Iterator for DayBuckets {
    type Item = DayBucket;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let bucket = DayBucket { start: self.next };
        self.next += Duration::hours(24);
        Some(bucket)
    }
}
