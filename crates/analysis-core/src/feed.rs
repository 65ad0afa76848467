use crate::{OIChangeSnapshot, OISnapshot, PCRPoint};

/// Payload of one upstream feed for one symbol.
///
/// A missing payload is `Empty`, a failed fetch is `Unavailable`; both read
/// as an empty sequence so analysis can proceed on whatever feeds did arrive.
#[derive(Debug, Clone, PartialEq)]
pub enum Feed<T> {
    Data(Vec<T>),
    Empty,
    Unavailable(String),
}

impl<T> Feed<T> {
    /// Wrap fetched records, mapping an empty list to `Empty`
    pub fn from_records(records: Vec<T>) -> Self {
        if records.is_empty() {
            Feed::Empty
        } else {
            Feed::Data(records)
        }
    }

    pub fn records(&self) -> &[T] {
        match self {
            Feed::Data(records) => records,
            Feed::Empty | Feed::Unavailable(_) => &[],
        }
    }

    pub fn has_data(&self) -> bool {
        !self.records().is_empty()
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Feed::Unavailable(_))
    }

    /// Keep only records matching `keep`; collapses to `Empty` if none survive
    pub fn retain(self, keep: impl FnMut(&T) -> bool) -> Self {
        match self {
            Feed::Data(mut records) => {
                records.retain(keep);
                Feed::from_records(records)
            }
            other => other,
        }
    }
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Feed::Empty
    }
}

/// The three feeds gathered for one symbol
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolFeeds {
    pub oi: Feed<OISnapshot>,
    pub oi_change: Feed<OIChangeSnapshot>,
    pub pcr: Feed<PCRPoint>,
}

impl SymbolFeeds {
    pub fn has_any_data(&self) -> bool {
        self.oi.has_data() || self.oi_change.has_data() || self.pcr.has_data()
    }

    pub fn all_unavailable(&self) -> bool {
        self.oi.is_unavailable() && self.oi_change.is_unavailable() && self.pcr.is_unavailable()
    }

    /// Underlying price as reported by the OI feed, falling back to the change
    /// feed when the OI feed has no positive close
    pub fn current_price(&self) -> Option<f64> {
        self.oi
            .records()
            .first()
            .map(|s| s.index_close)
            .filter(|price| *price > 0.0)
            .or_else(|| {
                self.oi_change
                    .records()
                    .first()
                    .map(|s| s.index_close)
                    .filter(|price| *price > 0.0)
            })
    }
}
