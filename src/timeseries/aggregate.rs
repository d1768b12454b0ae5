use crate::errors::{PriceHubError, Result};
use crate::models::series::{AggregatePoint, Observation, ObservationSeries};

/// Subset and grand-total sums sampled at every synchronization instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateSeries {
    pub subset: Vec<AggregatePoint>,
    pub total: Vec<AggregatePoint>,
}

/// Read position over one input series.
///
/// The effective observation is the one at the cursor while it is in
/// bounds; once the series is exhausted it stays on the last one.
struct Cursor<'a> {
    series: &'a ObservationSeries,
    index: usize,
}

impl<'a> Cursor<'a> {
    fn new(series: &'a ObservationSeries) -> Self {
        Self { series, index: 0 }
    }

    /// Observation at the cursor, `None` once exhausted.
    fn pending(&self) -> Option<&'a Observation> {
        self.series.observations().get(self.index)
    }

    fn effective(&self) -> &'a Observation {
        match self.pending() {
            Some(o) => o,
            // 非空已在 validate 中保证
            None => &self.series.observations()[self.series.len() - 1],
        }
    }

    fn advance_to(&mut self, ts: i64) -> bool {
        match self.pending() {
            Some(o) if o.timestamp == ts => {
                self.index += 1;
                true
            }
            _ => false,
        }
    }
}

fn validate(series: &[&ObservationSeries]) -> Result<()> {
    if series.is_empty() {
        return Err(PriceHubError::InvalidSeries("nothing to aggregate".to_string()));
    }
    for (idx, s) in series.iter().enumerate() {
        if s.is_empty() {
            return Err(PriceHubError::InvalidSeries(format!("series #{} is empty", idx)));
        }
        if let Some(w) = s.observations().windows(2).find(|w| w[0].timestamp >= w[1].timestamp) {
            return Err(PriceHubError::InvalidSeries(format!(
                "series #{} is not strictly increasing at {} -> {}",
                idx, w[0].timestamp, w[1].timestamp
            )));
        }
    }
    Ok(())
}

/// 多序列同步合并
///
/// Output instants are the sorted union of all input timestamps. At each
/// instant every series contributes the observation under its cursor, or
/// its last one once exhausted (carry-forward), summed into `total`, and
/// into `subset` for series flagged in-subset. Cursors sitting on the
/// instant advance after the sums are emitted.
pub fn aggregate<'a, I>(series: I) -> Result<AggregateSeries>
where
    I: IntoIterator<Item = &'a ObservationSeries>,
{
    let series: Vec<&ObservationSeries> = series.into_iter().collect();
    validate(&series)?;

    let mut cursors: Vec<Cursor> = series.iter().map(|s| Cursor::new(*s)).collect();
    let mut out = AggregateSeries::default();

    loop {
        let Some(min_ts) = cursors.iter().filter_map(|c| c.pending()).map(|o| o.timestamp).min() else {
            break;
        };

        let mut subtotal = 0u64;
        let mut total = 0u64;
        for cursor in &cursors {
            let price = cursor.effective().price;
            total += price;
            if cursor.series.in_subset() {
                subtotal += price;
            }
        }

        out.subset.push(AggregatePoint { timestamp: min_ts, value: subtotal });
        out.total.push(AggregatePoint { timestamp: min_ts, value: total });

        let mut advanced = 0;
        for cursor in cursors.iter_mut() {
            if cursor.advance_to(min_ts) {
                advanced += 1;
            }
        }
        if advanced == 0 {
            break;
        }
    }

    Ok(out)
}
