use crate::errors::Result;
use async_trait::async_trait;

/// Base trait for price scrapers
#[async_trait]
pub trait PriceScraper {
    /// Name of the price source, used in logs
    fn source_name(&self) -> &'static str;

    /// Fetch the current price of one item.
    /// Any failure is reported as `PriceHubError::PriceUnavailable`.
    async fn fetch_price(&self, gid: u64) -> Result<u64>;
}
