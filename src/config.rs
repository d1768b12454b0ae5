use std::path::PathBuf;

pub struct Config {
    pub data_dir: String,
    pub input_file: String,
    pub data_file: String,
    pub report_file: String,
    pub plot_file: String,
    pub price_api_url: String,
    pub request_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub name_width: usize,      // markdown 名称列的显示宽度上限
    pub plot_batch_size: usize, // 每个图表面板的曲线数量
}

impl Config {
    pub fn new() -> Self {
        Self {
            data_dir: ".".to_string(),
            input_file: "input.json".to_string(),
            data_file: "data.json".to_string(),
            report_file: "report.md".to_string(),
            plot_file: "plot.arrow".to_string(),
            price_api_url: "http://pe.3.cn/prices/mgets".to_string(),
            request_interval_ms: 500,
            request_timeout_secs: 30,
            name_width: 60,
            plot_batch_size: 5,
        }
    }

    pub fn with_data_dir(mut self, dir: &str) -> Self {
        self.data_dir = dir.to_string();
        self
    }

    pub fn with_report_file(mut self, file: &str) -> Self {
        self.report_file = file.to_string();
        self
    }

    pub fn with_plot_file(mut self, file: &str) -> Self {
        self.plot_file = file.to_string();
        self
    }

    pub fn with_price_api_url(mut self, url: &str) -> Self {
        self.price_api_url = url.to_string();
        self
    }

    pub fn with_request_interval_ms(mut self, interval: u64) -> Self {
        self.request_interval_ms = interval;
        self
    }

    pub fn with_name_width(mut self, width: usize) -> Self {
        self.name_width = width;
        self
    }

    // 面板大小至少为1
    pub fn with_plot_batch_size(mut self, size: usize) -> Self {
        self.plot_batch_size = size.max(1);
        self
    }

    pub fn input_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.input_file)
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.data_file)
    }

    pub fn report_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.report_file)
    }

    pub fn plot_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.plot_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
