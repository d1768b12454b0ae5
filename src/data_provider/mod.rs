use log::{info, warn};

use crate::errors::{PriceHubError, Result};
use crate::models::item::{Item, ItemRecord};
use crate::timeseries::{self, AggregateSeries};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// 商品目录，负责读取、校验和保存价格记录
pub struct Catalog {
    items: Vec<Item>,
    // 索引用于快速查找
    category_index: HashMap<String, usize>,
}

impl Catalog {
    /// 使用提供的商品创建目录
    ///
    /// Items are reordered so that suite members come first; a category
    /// label shared by two items is rejected.
    pub fn new_with_items(mut items: Vec<Item>) -> Result<Self> {
        items.sort_by_key(|item| !item.in_suite());

        let mut catalog = Self {
            items,
            category_index: HashMap::new(),
        };
        catalog.rebuild_indices()?;

        Ok(catalog)
    }

    pub fn from_records(records: Vec<ItemRecord>) -> Result<Self> {
        let items = records
            .into_iter()
            .map(Item::from_record)
            .collect::<Result<Vec<_>>>()?;

        for item in &items {
            if let Some(min_price) = item.series.observations().iter().map(|o| o.price).min() {
                if min_price < item.series.lowest() {
                    warn!("{} records a price {} below its lowest {}", item.category, min_price, item.series.lowest());
                }
            }
        }

        Self::new_with_items(items)
    }

    /// 从文件加载数据
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let records: Vec<ItemRecord> = serde_json::from_str(&content)?;
        info!("Loaded {} items from {}", records.len(), path.display());
        Self::from_records(records)
    }

    /// 优先读取历史数据文件，不存在时读取初始输入
    pub fn load(data_path: &Path, input_path: &Path) -> Result<Self> {
        if data_path.exists() {
            Self::load_from_file(data_path)
        } else {
            info!("No existing data found, loading seed input {}", input_path.display());
            Self::load_from_file(input_path)
        }
    }

    /// 保存数据到文件，已有文件先备份为 `.bk`
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        if path.exists() {
            let mut backup = path.as_os_str().to_owned();
            backup.push(".bk");
            fs::copy(path, &backup)?;
        }

        let json = serde_json::to_string_pretty(&self.to_records())?;
        fs::write(path, json)?;

        info!("Saved {} items to {}", self.items.len(), path.display());
        Ok(())
    }

    pub fn to_records(&self) -> Vec<ItemRecord> {
        self.items.iter().map(Item::to_record).collect()
    }

    /// 获取所有商品
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [Item] {
        &mut self.items
    }

    /// 按类型获取商品
    pub fn get_item_by_category(&self, category: &str) -> Option<&Item> {
        self.category_index.get(category).map(|&idx| &self.items[idx])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 套装价与总价序列
    ///
    /// Items that have never been priced are left out; `None` when no item
    /// has a price yet.
    pub fn aggregate(&self) -> Result<Option<AggregateSeries>> {
        let priced: Vec<_> = self
            .items
            .iter()
            .filter(|item| !item.series.is_empty())
            .map(|item| &item.series)
            .collect();
        if priced.is_empty() {
            return Ok(None);
        }
        timeseries::aggregate(priced).map(Some)
    }

    /// 重建索引
    fn rebuild_indices(&mut self) -> Result<()> {
        self.category_index.clear();

        for (i, item) in self.items.iter().enumerate() {
            if self.category_index.insert(item.category.clone(), i).is_some() {
                return Err(PriceHubError::DuplicateCategory(item.category.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::item_link;
    use crate::models::series::Observation;

    fn record(category: &str, suite: bool, gid: u64) -> ItemRecord {
        ItemRecord {
            suite,
            category: category.to_string(),
            name: format!("{} 商品", category),
            link: item_link(gid),
            lowest: 100,
            prices: vec![Observation { timestamp: 1, price: 120 }],
        }
    }

    #[test]
    fn test_suite_items_first() {
        let catalog = Catalog::from_records(vec![
            record("A", false, 1),
            record("B", true, 2),
            record("C", false, 3),
            record("D", true, 4),
        ])
        .unwrap();

        let order: Vec<&str> = catalog.items().iter().map(|i| i.category.as_str()).collect();
        assert_eq!(order, vec!["B", "D", "A", "C"]);
        assert_eq!(catalog.get_item_by_category("C").unwrap().gid, 3);
        assert!(catalog.get_item_by_category("Z").is_none());
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let err = Catalog::from_records(vec![record("CPU", true, 1), record("CPU", false, 2)]);
        assert!(matches!(err, Err(PriceHubError::DuplicateCategory(c)) if c == "CPU"));
    }

    #[test]
    fn test_aggregate_skips_unpriced_items() {
        let mut unpriced = record("SSD", true, 9);
        unpriced.prices.clear();

        let catalog = Catalog::from_records(vec![unpriced.clone()]).unwrap();
        assert!(catalog.aggregate().unwrap().is_none());

        let catalog = Catalog::from_records(vec![record("CPU", true, 1), unpriced]).unwrap();
        let aggregate = catalog.aggregate().unwrap().unwrap();
        assert_eq!(aggregate.total.len(), 1);
        assert_eq!(aggregate.total[0].value, 120);
        assert_eq!(aggregate.subset[0].value, 120);
    }

    #[test]
    fn test_malformed_link_rejected() {
        let mut bad = record("GPU", false, 1);
        bad.link = "https://example.com/1.html".to_string();
        assert!(matches!(Catalog::from_records(vec![bad]), Err(PriceHubError::MalformedLink(_))));
    }
}
