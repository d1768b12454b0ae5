use async_trait::async_trait;
use chrono::Utc;
use pricehub::config::Config;
use pricehub::scrapers::base::PriceScraper;
use pricehub::services::data_service::{PriceService, UpdateSummary};
use pricehub::util::arrow_utils;
use pricehub::{Catalog, PriceHubError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const DAY: i64 = 86_400;
// 2024-03-01 08:00:00 UTC
const DAY0: i64 = 1_709_280_000;

struct FixedScraper {
    prices: HashMap<u64, u64>,
    calls: Mutex<Vec<u64>>,
}

impl FixedScraper {
    fn new(prices: &[(u64, u64)]) -> Arc<Self> {
        Arc::new(Self {
            prices: prices.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PriceScraper for FixedScraper {
    fn source_name(&self) -> &'static str {
        "fixed"
    }

    async fn fetch_price(&self, gid: u64) -> Result<u64> {
        self.calls.lock().unwrap().push(gid);
        self.prices.get(&gid).copied().ok_or(PriceHubError::PriceUnavailable {
            gid,
            reason: "no quote".to_string(),
        })
    }
}

struct TestDir(PathBuf);

impl TestDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("pricehub_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    fn path(&self) -> &Path {
        &self.0
    }

    fn config(&self) -> Config {
        Config::new()
            .with_data_dir(self.0.to_str().unwrap())
            .with_request_interval_ms(0)
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn write_seed(dir: &TestDir) {
    let seed = format!(
        r#"[
  {{"suite": false, "type": "SSD", "name": "固态硬盘 1TB", "link": "https://item.jd.com/300.html", "lowest": 500}},
  {{"suite": true, "type": "CPU", "name": "处理器 i7", "link": "https://item.jd.com/100.html", "lowest": 2000,
    "prices": [{{"time": {day0}, "val": 2199}}]}},
  {{"suite": true, "type": "内存", "name": "内存条 16G", "link": "https://item.jd.com/200.html", "lowest": 400,
    "prices": [{{"time": {day0}, "val": 459}}]}}
]"#,
        day0 = DAY0
    );
    fs::write(dir.path().join("input.json"), seed).unwrap();
}

#[tokio::test]
async fn update_appends_changes_and_keeps_failed_items() {
    let dir = TestDir::new("update");
    write_seed(&dir);

    let scraper = FixedScraper::new(&[(100, 2099), (200, 459)]);
    let service = PriceService::new(dir.config(), scraper.clone());
    let mut catalog = service.load_catalog().unwrap();

    let now = DAY0 + 2 * DAY;
    let summary = service.update(&mut catalog, now).await;
    assert_eq!(
        summary,
        UpdateSummary {
            changed: 1,
            unchanged: 1,
            failed: vec!["SSD".to_string()],
            skipped: Vec::new(),
        }
    );

    // catalog order: suite items first
    assert_eq!(*scraper.calls.lock().unwrap(), vec![100, 200, 300]);

    let cpu = catalog.get_item_by_category("CPU").unwrap();
    assert_eq!(cpu.series.len(), 2);
    assert_eq!(cpu.series.observations()[1].timestamp, now);
    assert_eq!(cpu.series.current_price(), Some(2099));
    assert_eq!(cpu.series.lowest(), 2000);

    assert_eq!(catalog.get_item_by_category("内存").unwrap().series.len(), 1);
    assert!(catalog.get_item_by_category("SSD").unwrap().series.is_empty());
}

#[tokio::test]
async fn repeated_update_at_same_instant_keeps_data_loadable() {
    let dir = TestDir::new("same_instant");
    write_seed(&dir);

    let now = DAY0 + DAY;
    let first = PriceService::new(dir.config(), FixedScraper::new(&[(100, 2099), (200, 459), (300, 599)]));
    first.process(true, false, now, &Utc).await.unwrap();

    let scraper = FixedScraper::new(&[(100, 1999), (200, 449), (300, 599)]);
    let second = PriceService::new(dir.config(), scraper.clone());
    let mut catalog = second.load_catalog().unwrap();
    let summary = second.update(&mut catalog, now).await;
    assert_eq!(summary.changed, 1);
    assert_eq!(summary.skipped, vec!["CPU".to_string(), "SSD".to_string()]);
    // 内存 only holds the seed price at DAY0
    assert_eq!(*scraper.calls.lock().unwrap(), vec![200]);
    second.save_catalog(&catalog).unwrap();

    let reloaded = Catalog::load_from_file(&dir.path().join("data.json")).unwrap();
    let cpu = reloaded.get_item_by_category("CPU").unwrap();
    assert_eq!(cpu.series.current_price(), Some(2099));
    assert_eq!(reloaded.get_item_by_category("内存").unwrap().series.current_price(), Some(449));
    assert!(reloaded.aggregate().unwrap().is_some());
}

#[tokio::test]
async fn process_writes_reports_and_plot() {
    let dir = TestDir::new("process");
    write_seed(&dir);

    let scraper = FixedScraper::new(&[(100, 2099), (200, 459), (300, 599)]);
    let service = PriceService::new(dir.config(), scraper);

    let now = DAY0 + 2 * DAY;
    let brief = service.process(true, true, now, &Utc).await.unwrap();

    let total_row = brief.lines().find(|l| l.starts_with("TOTAL")).unwrap();
    let cols: Vec<&str> = total_row.split_whitespace().collect();
    // CPU 2199 -> 2099, 内存 459, SSD first priced at `now` with 599
    assert_eq!(cols, vec!["TOTAL", "3157", "3157"]);
    let suite_row = brief.lines().find(|l| l.starts_with("SUITE")).unwrap();
    let cols: Vec<&str> = suite_row.split_whitespace().collect();
    assert_eq!(cols, vec!["SUITE", "2558", "2558"]);

    let report = fs::read_to_string(dir.path().join("report.md")).unwrap();
    assert!(report.starts_with("| 名称 | 当前价 | 最低价 |\n| ---- | ---- | ---- |\n"));
    assert!(report.contains("| [处理器 i7](https://item.jd.com/100.html) | 2099 | 2000 |"));
    assert!(report.contains("| 总计 | 3157 | 3157 |"));
    assert!(report.contains("| 套装 | 2558 | 2558 |"));

    assert!(dir.path().join("data.json").exists());
    assert!(!dir.path().join("data.json.bk").exists());

    let panels = arrow_utils::read_plot_panels_from_arrow(&dir.path().join("plot.arrow")).unwrap();
    assert_eq!(panels.len(), 1);
    let labels: Vec<&str> = panels[0].series.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["CPU", "内存", "SSD", "Total"]);

    let cpu = &panels[0].series[0];
    assert_eq!(cpu.points.len(), 3);
    assert_eq!(cpu.points[0].ratio, 2199.0 / 2099.0);
    assert_eq!(cpu.points[2].ratio, 1.0);
    assert!(panels[0].series.iter().all(|s| s.points.iter().all(|p| p.ratio >= 1.0)));
}

#[tokio::test]
async fn second_run_reads_saved_data_and_backs_it_up() {
    let dir = TestDir::new("second_run");
    write_seed(&dir);

    let first = PriceService::new(dir.config(), FixedScraper::new(&[(100, 2099), (200, 459), (300, 599)]));
    first.process(true, false, DAY0 + DAY, &Utc).await.unwrap();

    let second = PriceService::new(dir.config(), FixedScraper::new(&[(100, 1899), (200, 459), (300, 599)]));
    second.process(true, false, DAY0 + 3 * DAY, &Utc).await.unwrap();

    assert!(dir.path().join("data.json.bk").exists());
    let backup = Catalog::load_from_file(&dir.path().join("data.json.bk")).unwrap();
    assert_eq!(backup.get_item_by_category("CPU").unwrap().series.len(), 2);

    let catalog = Catalog::load_from_file(&dir.path().join("data.json")).unwrap();
    let cpu = catalog.get_item_by_category("CPU").unwrap();
    let prices: Vec<u64> = cpu.series.observations().iter().map(|o| o.price).collect();
    assert_eq!(prices, vec![2199, 2099, 1899]);
    assert_eq!(cpu.series.lowest(), 1899);
    assert_eq!(catalog.get_item_by_category("SSD").unwrap().series.len(), 1);
}

#[test]
fn saved_document_round_trips() {
    let dir = TestDir::new("round_trip");
    write_seed(&dir);

    let catalog = Catalog::load_from_file(&dir.path().join("input.json")).unwrap();
    let first = dir.path().join("first.json");
    catalog.save_to_file(&first).unwrap();

    let reloaded = Catalog::load_from_file(&first).unwrap();
    assert_eq!(reloaded.to_records(), catalog.to_records());

    let second = dir.path().join("second.json");
    reloaded.save_to_file(&second).unwrap();
    assert_eq!(fs::read_to_string(&first).unwrap(), fs::read_to_string(&second).unwrap());

    // non-ASCII text is written as-is
    assert!(fs::read_to_string(&first).unwrap().contains("\"type\": \"内存\""));
}

#[tokio::test]
async fn duplicate_category_aborts_the_run() {
    let dir = TestDir::new("duplicate");
    let seed = r#"[
  {"suite": true, "type": "CPU", "name": "a", "link": "https://item.jd.com/1.html", "lowest": 1},
  {"suite": false, "type": "CPU", "name": "b", "link": "https://item.jd.com/2.html", "lowest": 1}
]"#;
    fs::write(dir.path().join("input.json"), seed).unwrap();

    let service = PriceService::new(dir.config(), FixedScraper::new(&[]));
    let err = service.process(true, false, DAY0, &Utc).await.unwrap_err();
    assert!(matches!(err, PriceHubError::DuplicateCategory(c) if c == "CPU"));
    assert!(!dir.path().join("data.json").exists());
}

#[tokio::test]
async fn report_without_any_price_has_no_totals() {
    let dir = TestDir::new("unpriced");
    let seed = r#"[{"suite": true, "type": "GPU", "name": "显卡", "link": "https://item.jd.com/5.html", "lowest": 3000}]"#;
    fs::write(dir.path().join("input.json"), seed).unwrap();

    let service = PriceService::new(dir.config(), FixedScraper::new(&[]));
    let brief = service.process(false, true, DAY0, &Utc).await.unwrap();

    assert!(brief.contains("GPU"));
    assert!(!brief.contains("TOTAL"));
    let panels = arrow_utils::read_plot_panels_from_arrow(&dir.path().join("plot.arrow")).unwrap();
    assert!(panels.is_empty());
}
