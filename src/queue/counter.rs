//! Sequential ticket numbers of the form `<prefix>-NN`.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::models::QueueMeta;

pub const DEFAULT_PREFIX: &str = "S5";

/// Issues ticket numbers for the current day.
///
/// The counter owns the prefix and the UTC offset that defines where one
/// calendar day ends and the next begins.
#[derive(Debug, Clone)]
pub struct QueueCounter {
    prefix: String,
    offset: FixedOffset,
}

/// Result of [`QueueCounter::issue_next`]: the number handed out and the
/// meta record the caller must persist along with the ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issued {
    pub queue_number: String,
    pub meta: QueueMeta,
}

impl QueueCounter {
    pub fn new(prefix: impl Into<String>, offset: FixedOffset) -> Self {
        Self {
            prefix: prefix.into(),
            offset,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn offset(&self) -> &FixedOffset {
        &self.offset
    }

    /// Zero-padded to two digits; wider values are never truncated.
    pub fn format(&self, sequence: u32) -> String {
        format!("{}-{:02}", self.prefix, sequence)
    }

    pub fn first(&self) -> String {
        self.format(1)
    }

    /// Numeric suffix of `queue_number`, or 0 when it does not carry this
    /// counter's prefix or the suffix is not a number.
    pub fn parse_sequence(&self, queue_number: &str) -> u32 {
        queue_number
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
            .unwrap_or(0)
    }

    /// Calendar day of `at` in the reset timezone.
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// Next number for the day containing `now`.
    ///
    /// A meta record from another day (or none at all) restarts numbering at
    /// `<prefix>-01` and stamps `now` as the reset date.
    pub fn issue_next(&self, meta: Option<&QueueMeta>, now: DateTime<Utc>) -> Issued {
        match meta {
            Some(meta) if self.day_of(meta.last_reset_date) == self.day_of(now) => {
                let sequence = self.parse_sequence(&meta.queue_number).saturating_add(1);
                let queue_number = self.format(sequence);
                Issued {
                    meta: QueueMeta {
                        queue_number: queue_number.clone(),
                        last_reset_date: meta.last_reset_date,
                    },
                    queue_number,
                }
            }
            _ => self.restart(now),
        }
    }

    /// Like [`issue_next`](Self::issue_next), but aware of how many tickets
    /// are on record for the day.
    ///
    /// A reset leaves the meta at `<prefix>-01` with no tickets behind it;
    /// the first registration afterwards must receive `-01`, not `-02`.
    pub fn issue_after(
        &self,
        meta: Option<&QueueMeta>,
        tickets_on_record: usize,
        now: DateTime<Utc>,
    ) -> Issued {
        match meta {
            Some(m)
                if tickets_on_record == 0
                    && self.parse_sequence(&m.queue_number) <= 1
                    && self.day_of(m.last_reset_date) == self.day_of(now) =>
            {
                let queue_number = self.first();
                Issued {
                    meta: QueueMeta {
                        queue_number: queue_number.clone(),
                        last_reset_date: m.last_reset_date,
                    },
                    queue_number,
                }
            }
            _ => self.issue_next(meta, now),
        }
    }

    /// Meta written by a reset at `now`.
    pub fn reset_meta(&self, now: DateTime<Utc>) -> QueueMeta {
        QueueMeta {
            queue_number: self.first(),
            last_reset_date: now,
        }
    }

    fn restart(&self, now: DateTime<Utc>) -> Issued {
        Issued {
            queue_number: self.first(),
            meta: self.reset_meta(now),
        }
    }
}

impl Default for QueueCounter {
    fn default() -> Self {
        use chrono::Offset;
        Self::new(DEFAULT_PREFIX, Utc.fix())
    }
}
