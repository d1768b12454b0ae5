// 公开导出的模块，供外部使用
pub mod models;
pub mod timeseries;
pub mod data_provider;
pub mod errors;
pub mod scrapers;
pub mod services;
pub mod config;

#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use models::series::{AggregatePoint, NormalizedPoint, Observation, ObservationSeries};
pub use models::item::{Item, ItemRecord};
pub use data_provider::Catalog;
pub use timeseries::{aggregate, daily_ratio_series, resample_daily, AggregateSeries};
pub use errors::{Result, PriceHubError};
