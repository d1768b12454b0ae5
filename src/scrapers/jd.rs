use crate::config::Config;
use crate::errors::{PriceHubError, Result};
use crate::scrapers::base::PriceScraper;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use log::debug;

/// 京东价格接口抓取器
pub struct JdScraper {
    client: Client,
    api_url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl JdScraper {
    /// 创建新的价格抓取器
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(PriceHubError::RequestError)?;

        Ok(Self {
            client,
            api_url: config.price_api_url.clone(),
            min_interval: Duration::from_millis(config.request_interval_ms),
            last_request: Mutex::new(None),
        })
    }

    /// 等待请求频率限制
    async fn wait_for_rate_limit(&self) {
        let now = Instant::now();
        let should_wait = {
            let mut last = match self.last_request.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let should_wait = (*last)
                .and_then(|instant| self.min_interval.checked_sub(instant.elapsed()))
                .filter(|wait| !wait.is_zero());
            *last = Some(now);
            should_wait
        };

        if let Some(wait_time) = should_wait {
            debug!("等待 {:?} 以遵守频率限制", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }

    async fn request(&self, gid: u64) -> std::result::Result<String, String> {
        let response = self.client
            .get(&self.api_url)
            .query(&[("skuids", gid.to_string())])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP status {}", status));
        }
        response.text().await.map_err(|e| e.to_string())
    }
}

/// 解析价格接口响应，形如 `[{"id":"J_100","p":"2999.00"}]`
///
/// The decimal price is truncated to an integer.
pub fn parse_price_response(text: &str) -> std::result::Result<u64, String> {
    let json: Value = serde_json::from_str(text.trim()).map_err(|e| e.to_string())?;

    let price_text = json
        .get(0)
        .and_then(|entry| entry.get("p"))
        .ok_or_else(|| format!("price field missing in {}", text))?;

    let price = match price_text {
        Value::String(s) => s.trim().parse::<f64>().map_err(|e| format!("price {:?} not valid: {}", s, e))?,
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("price {} not valid", n))?,
        other => return Err(format!("price {} not valid", other)),
    };

    if !price.is_finite() || price < 0.0 {
        return Err(format!("price {} not valid", price));
    }
    Ok(price as u64)
}

#[async_trait]
impl PriceScraper for JdScraper {
    fn source_name(&self) -> &'static str {
        "JD"
    }

    async fn fetch_price(&self, gid: u64) -> Result<u64> {
        // 限制请求频率
        self.wait_for_rate_limit().await;
        debug!("获取商品 {} 的价格", gid);

        let unavailable = |reason: String| PriceHubError::PriceUnavailable { gid, reason };

        let text = self.request(gid).await.map_err(unavailable)?;
        let price = parse_price_response(&text).map_err(unavailable)?;

        debug!("商品 {} 当前价格 {}", gid, price);
        Ok(price)
    }
}
