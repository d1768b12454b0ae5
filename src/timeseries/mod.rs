pub mod aggregate;
pub mod resample;

pub use aggregate::{aggregate, AggregateSeries};
pub use resample::{daily_ratio_series, normalize, resample_daily, DailyPoint};
