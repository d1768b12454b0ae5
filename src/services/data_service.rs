use crate::config::Config;
use crate::data_provider::Catalog;
use crate::errors::Result;
use crate::models::plot::{into_panels, PlotPanel, PlotSeries};
use crate::models::series::AggregatePoint;
use crate::scrapers::base::PriceScraper;
use crate::services::report::{md_link, trim_to_width, MarkdownTable, PrettyTable};
use crate::timeseries::{daily_ratio_series, AggregateSeries};
use crate::util::arrow_utils;
use chrono::TimeZone;
use log::{info, warn};
use std::fs;
use std::sync::Arc;

/// 一次价格更新的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub changed: usize,
    pub unchanged: usize,
    /// 抓取失败的商品类型，本次保持原价
    pub failed: Vec<String>,
    /// 已有不早于本次时间的记录，未抓取
    pub skipped: Vec<String>,
}

/// 价格服务，处理价格的抓取、汇总和报表
pub struct PriceService {
    config: Config,
    scraper: Arc<dyn PriceScraper + Send + Sync>,
}

impl PriceService {
    /// 创建新的价格服务实例
    pub fn new(config: Config, scraper: Arc<dyn PriceScraper + Send + Sync>) -> Self {
        Self { config, scraper }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 加载商品目录
    pub fn load_catalog(&self) -> Result<Catalog> {
        Catalog::load(&self.config.data_path(), &self.config.input_path())
    }

    pub fn save_catalog(&self, catalog: &Catalog) -> Result<()> {
        catalog.save_to_file(&self.config.data_path())
    }

    /// 按目录顺序逐个抓取当前价格
    ///
    /// Every append of this run is stamped with `now`. A failed fetch only
    /// affects its own item, which keeps its last known price.
    pub async fn update(&self, catalog: &mut Catalog, now: i64) -> UpdateSummary {
        let mut summary = UpdateSummary::default();
        let total = catalog.len();
        info!("Updating {} items from {}", total, self.scraper.source_name());

        for (i, item) in catalog.items_mut().iter_mut().enumerate() {
            info!("[{}/{}] {}", i + 1, total, item.category);

            if let Some(last) = item.series.last_timestamp().filter(|&last| last >= now) {
                warn!("{} already has a price at {}, skipping update at {}", item.category, last, now);
                summary.skipped.push(item.category.clone());
                continue;
            }

            match self.scraper.fetch_price(item.gid).await {
                Ok(price) => {
                    if item.series.append(price, now) {
                        info!("{} price changed to {}", item.category, price);
                        summary.changed += 1;
                    } else {
                        summary.unchanged += 1;
                    }
                }
                Err(e) => {
                    warn!("Failed to update {}: {}", item.category, e);
                    summary.failed.push(item.category.clone());
                }
            }
        }

        info!(
            "Update finished: {} changed, {} unchanged, {} failed, {} skipped",
            summary.changed,
            summary.unchanged,
            summary.failed.len(),
            summary.skipped.len()
        );
        summary
    }

    /// 简要文本报表：类型、最低价、当前价
    pub fn brief_report(&self, catalog: &Catalog, aggregate: Option<&AggregateSeries>) -> Result<String> {
        let header = vec!["type".to_string(), "lowest".to_string(), "current".to_string()];
        let mut lines = Vec::new();

        for item in catalog.items() {
            lines.push(vec![
                item.category.clone(),
                item.series.lowest().to_string(),
                display_price(item.series.current_price()),
            ]);
        }

        if let Some(aggregate) = aggregate {
            let (total_min, total_now) = min_and_latest(&aggregate.total);
            lines.push(vec!["TOTAL".to_string(), total_min, total_now]);
            let (suite_min, suite_now) = min_and_latest(&aggregate.subset);
            lines.push(vec!["SUITE".to_string(), suite_min, suite_now]);
        }

        Ok(PrettyTable::new(header, lines)?.format())
    }

    /// Markdown 报表：名称链接、当前价、最低价
    pub fn markdown_report(&self, catalog: &Catalog, aggregate: Option<&AggregateSeries>) -> Result<String> {
        let header = vec!["名称".to_string(), "当前价".to_string(), "最低价".to_string()];
        let mut lines = Vec::new();

        for item in catalog.items() {
            let name = md_link(&trim_to_width(&item.name, self.config.name_width), &item.link);
            lines.push(vec![
                name,
                display_price(item.series.current_price()),
                item.series.lowest().to_string(),
            ]);
        }

        if let Some(aggregate) = aggregate {
            let (total_min, total_now) = min_and_latest(&aggregate.total);
            lines.push(vec!["总计".to_string(), total_now, total_min]);
            let (suite_min, suite_now) = min_and_latest(&aggregate.subset);
            lines.push(vec!["套装".to_string(), suite_now, suite_min]);
        }

        Ok(MarkdownTable::new(header, lines)?.format())
    }

    pub fn write_markdown_report(&self, catalog: &Catalog, aggregate: Option<&AggregateSeries>) -> Result<()> {
        let report = self.markdown_report(catalog, aggregate)?;
        let path = self.config.report_path();
        fs::write(&path, report)?;
        info!("Report written to {}", path.display());
        Ok(())
    }

    /// 每个商品一条归一化日曲线，外加总价曲线，按面板分组
    ///
    /// Items without a price are skipped, as is any series that cannot be
    /// normalized.
    pub fn plot_panels<Tz: TimeZone>(
        &self,
        catalog: &Catalog,
        aggregate: Option<&AggregateSeries>,
        now: i64,
        tz: &Tz,
    ) -> Vec<PlotPanel> {
        let mut series = Vec::new();

        for item in catalog.items() {
            if item.series.is_empty() {
                continue;
            }
            match daily_ratio_series(item.series.observations(), now, tz) {
                Ok(points) => series.push(PlotSeries {
                    label: item.category.clone(),
                    points,
                }),
                Err(e) => warn!("Skipping plot of {}: {}", item.category, e),
            }
        }

        if let Some(aggregate) = aggregate {
            match daily_ratio_series(&aggregate.total, now, tz) {
                Ok(points) => series.push(PlotSeries {
                    label: "Total".to_string(),
                    points,
                }),
                Err(e) => warn!("Skipping plot of total: {}", e),
            }
        }

        into_panels(series, self.config.plot_batch_size)
    }

    pub fn export_plot(&self, panels: &[PlotPanel]) -> Result<()> {
        arrow_utils::save_plot_panels_to_arrow(panels, &self.config.plot_path())
    }

    /// 完整流程：加载、可选更新并保存、生成报表、可选导出曲线
    ///
    /// Returns the brief table for display.
    pub async fn process<Tz: TimeZone>(&self, with_update: bool, with_graph: bool, now: i64, tz: &Tz) -> Result<String> {
        let mut catalog = self.load_catalog()?;

        if with_update {
            self.update(&mut catalog, now).await;
            self.save_catalog(&catalog)?;
        }

        // 所有商品更新完成后再汇总
        let aggregate = catalog.aggregate()?;
        let brief = self.brief_report(&catalog, aggregate.as_ref())?;
        self.write_markdown_report(&catalog, aggregate.as_ref())?;

        if with_graph {
            let panels = self.plot_panels(&catalog, aggregate.as_ref(), now, tz);
            self.export_plot(&panels)?;
        }

        Ok(brief)
    }
}

fn display_price(price: Option<u64>) -> String {
    price.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())
}

fn min_and_latest(points: &[AggregatePoint]) -> (String, String) {
    let min = points.iter().map(|p| p.value).min();
    let latest = points.last().map(|p| p.value);
    (display_price(min), display_price(latest))
}
