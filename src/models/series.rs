use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 单次价格观测：时间戳（秒）与价格（最小货币单位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "time")]
    pub timestamp: i64,
    #[serde(rename = "val")]
    pub price: u64,
}

/// 汇总序列中的一个点，由聚合器生成
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatePoint {
    pub timestamp: i64,
    pub value: u64,
}

/// 归一化后的日序列点，ratio = price / 序列最低价
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    pub instant: NaiveDateTime,
    pub ratio: f64,
}

/// Anything that reads as a (timestamp, price) sample.
pub trait Sample {
    fn timestamp(&self) -> i64;
    fn price(&self) -> u64;
}

impl Sample for Observation {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn price(&self) -> u64 {
        self.price
    }
}

impl Sample for AggregatePoint {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn price(&self) -> u64 {
        self.value
    }
}

/// 单个商品的价格变化记录
///
/// 只记录变化：与上一条价格相同的新观测不会被追加。
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSeries {
    observations: Vec<Observation>,
    lowest: u64,
    in_subset: bool,
}

impl ObservationSeries {
    pub fn new(lowest: u64, in_subset: bool) -> Self {
        Self {
            observations: Vec::new(),
            lowest,
            in_subset,
        }
    }

    /// 最后一条观测的时间
    pub fn last_timestamp(&self) -> Option<i64> {
        self.observations.last().map(|o| o.timestamp)
    }

    /// Builds a series from persisted observations, sorted by timestamp.
    pub fn from_observations(mut observations: Vec<Observation>, lowest: u64, in_subset: bool) -> Self {
        observations.sort_by_key(|o| o.timestamp);
        Self {
            observations,
            lowest,
            in_subset,
        }
    }

    /// Appends `price` observed at `timestamp` unless it repeats the last
    /// recorded price. Returns whether an observation was added.
    ///
    /// Timestamps must stay strictly increasing; an observation at or before
    /// the last recorded instant is dropped.
    pub fn append(&mut self, price: u64, timestamp: i64) -> bool {
        if let Some(last) = self.observations.last() {
            if last.price == price || timestamp <= last.timestamp {
                return false;
            }
        }
        self.observations.push(Observation { timestamp, price });
        self.lowest = self.lowest.min(price);
        true
    }

    pub fn current_price(&self) -> Option<u64> {
        self.observations.last().map(|o| o.price)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn lowest(&self) -> u64 {
        self.lowest
    }

    pub fn in_subset(&self) -> bool {
        self.in_subset
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
