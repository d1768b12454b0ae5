use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::{PriceHubError, Result};
use crate::models::series::{Observation, ObservationSeries};

const ITEM_HOST: &str = "item.jd.com";

/// 持久化文件中的单个商品记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub suite: bool,
    #[serde(rename = "type")]
    pub category: String,
    pub name: String,
    pub link: String,
    pub lowest: u64,
    #[serde(default)]
    pub prices: Vec<Observation>,
}

/// 追踪中的商品
#[derive(Debug, Clone)]
pub struct Item {
    pub category: String,
    pub name: String,
    pub link: String,
    pub gid: u64,
    pub series: ObservationSeries,
}

impl Item {
    pub fn from_record(record: ItemRecord) -> Result<Self> {
        let gid = parse_gid(&record.link)?;

        let mut seen = HashSet::new();
        for price in &record.prices {
            if !seen.insert(price.timestamp) {
                return Err(PriceHubError::InvalidSeries(format!(
                    "{} has more than one price at {}",
                    record.category, price.timestamp
                )));
            }
        }

        Ok(Self {
            category: record.category,
            name: record.name,
            link: record.link,
            gid,
            series: ObservationSeries::from_observations(record.prices, record.lowest, record.suite),
        })
    }

    pub fn to_record(&self) -> ItemRecord {
        ItemRecord {
            suite: self.series.in_subset(),
            category: self.category.clone(),
            name: self.name.clone(),
            link: self.link.clone(),
            lowest: self.series.lowest(),
            prices: self.series.observations().to_vec(),
        }
    }

    pub fn in_suite(&self) -> bool {
        self.series.in_subset()
    }
}

/// 商品页面链接，形如 https://item.jd.com/{gid}.html
pub fn item_link(gid: u64) -> String {
    format!("https://{}/{}.html", ITEM_HOST, gid)
}

/// 从商品链接中提取数字编号
pub fn parse_gid(link: &str) -> Result<u64> {
    let malformed = || PriceHubError::MalformedLink(link.to_string());

    let url = Url::parse(link.trim()).map_err(|_| malformed())?;
    if url.scheme() != "https" || url.host_str() != Some(ITEM_HOST) {
        return Err(malformed());
    }

    let digits = url
        .path()
        .strip_prefix('/')
        .and_then(|p| p.strip_suffix(".html"))
        .ok_or_else(malformed)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    digits.parse::<u64>().map_err(|_| malformed())
}
