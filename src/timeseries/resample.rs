use chrono::{NaiveDate, NaiveDateTime, TimeZone};

use crate::errors::{PriceHubError, Result};
use crate::models::series::{NormalizedPoint, Sample};

// 无观测日的锚点时间，避免仅显示日期时跨日歧义
const ANCHOR_HOUR: u32 = 12;

/// One resampled day: the instant it is plotted at and the price it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyPoint {
    pub instant: NaiveDateTime,
    pub price: u64,
}

fn local_time<Tz: TimeZone>(tz: &Tz, ts: i64) -> Result<NaiveDateTime> {
    tz.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.naive_local())
        .ok_or_else(|| PriceHubError::InvalidSeries(format!("timestamp {} out of range", ts)))
}

fn anchor(day: NaiveDate) -> Result<NaiveDateTime> {
    day.and_hms_opt(ANCHOR_HOUR, 0, 0)
        .ok_or_else(|| PriceHubError::InvalidSeries(format!("no anchor time for {}", day)))
}

/// 按自然日重采样
///
/// Emits exactly one point per calendar day (in `tz`) from the day of the
/// first sample through the day of `now`. A day with observations is
/// represented by its last observation at that observation's own instant;
/// a day without any is anchored at noon and carries the previous price.
/// The series is first extended with `(now, last price)` so it always
/// reaches the present.
pub fn resample_daily<S, Tz>(samples: &[S], now: i64, tz: &Tz) -> Result<Vec<DailyPoint>>
where
    S: Sample,
    Tz: TimeZone,
{
    let Some(last) = samples.last() else {
        return Err(PriceHubError::InvalidSeries("cannot resample an empty series".to_string()));
    };
    if let Some(w) = samples.windows(2).find(|w| w[0].timestamp() >= w[1].timestamp()) {
        return Err(PriceHubError::InvalidSeries(format!(
            "timestamps not increasing at {} -> {}",
            w[0].timestamp(),
            w[1].timestamp()
        )));
    }

    let mut readings = samples
        .iter()
        .map(|s| -> Result<(NaiveDateTime, u64)> { Ok((local_time(tz, s.timestamp())?, s.price())) })
        .collect::<Result<Vec<_>>>()?;
    if now > last.timestamp() {
        readings.push((local_time(tz, now)?, last.price()));
    }

    let mut day = readings[0].0.date();
    let last_day = readings[readings.len() - 1].0.date();
    let mut carried = readings[0].1;
    let mut i = 0;
    let mut points = Vec::new();

    while day <= last_day {
        let mut closing = None;
        while i < readings.len() && readings[i].0.date() <= day {
            closing = Some(readings[i]);
            carried = readings[i].1;
            i += 1;
        }

        points.push(match closing {
            Some((instant, price)) => DailyPoint { instant, price },
            None => DailyPoint { instant: anchor(day)?, price: carried },
        });

        day = day
            .succ_opt()
            .ok_or_else(|| PriceHubError::InvalidSeries(format!("no day after {}", day)))?;
    }

    Ok(points)
}

/// Divides every price by the smallest one.
pub fn normalize(points: &[DailyPoint]) -> Result<Vec<NormalizedPoint>> {
    let Some(min_price) = points.iter().map(|p| p.price).min() else {
        return Ok(Vec::new());
    };
    if min_price == 0 {
        return Err(PriceHubError::InvalidSeries("cannot normalize against a zero price".to_string()));
    }

    Ok(points
        .iter()
        .map(|p| NormalizedPoint {
            instant: p.instant,
            ratio: p.price as f64 / min_price as f64,
        })
        .collect())
}

/// 日重采样并按最低价归一化，供绘图使用
pub fn daily_ratio_series<S, Tz>(samples: &[S], now: i64, tz: &Tz) -> Result<Vec<NormalizedPoint>>
where
    S: Sample,
    Tz: TimeZone,
{
    normalize(&resample_daily(samples, now, tz)?)
}
