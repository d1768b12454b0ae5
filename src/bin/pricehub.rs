use pricehub::config::Config;
use pricehub::scrapers::jd::JdScraper;
use pricehub::services::data_service::PriceService;
use pricehub::util;

use anyhow::Context;
use chrono::Local;
use clap::{App, Arg};
use log::{error, info};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let matches = App::new("PriceHub")
        .version(env!("CARGO_PKG_VERSION"))
        .author("PriceHub Team")
        .about("Track item prices, summarize suite and total prices")
        .arg(
            Arg::with_name("update")
                .long("update")
                .help("Fetch current prices and save them before reporting")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("graph")
                .long("graph")
                .help("Export normalized daily price curves for plotting")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .help("Directory holding input.json and data.json")
                .takes_value(true)
                .default_value("."),
        )
        .arg(
            Arg::with_name("report")
                .long("report")
                .value_name("FILE")
                .help("Markdown report file name")
                .takes_value(true)
                .default_value("report.md"),
        )
        .arg(
            Arg::with_name("plot")
                .long("plot")
                .value_name("FILE")
                .help("Arrow file receiving the plot panels")
                .takes_value(true)
                .default_value("plot.arrow"),
        )
        .arg(
            Arg::with_name("batch-size")
                .long("batch-size")
                .value_name("N")
                .help("Number of curves per plot panel")
                .takes_value(true)
                .default_value("5"),
        )
        .get_matches();

    let with_update = matches.is_present("update");
    let with_graph = matches.is_present("graph");
    let batch_size = matches
        .value_of("batch-size")
        .unwrap_or("5")
        .parse::<usize>()
        .context("batch size must be a positive integer")?;

    let config = Config::new()
        .with_data_dir(matches.value_of("data-dir").unwrap_or("."))
        .with_report_file(matches.value_of("report").unwrap_or("report.md"))
        .with_plot_file(matches.value_of("plot").unwrap_or("plot.arrow"))
        .with_plot_batch_size(batch_size);

    let scraper = Arc::new(JdScraper::new(&config)?);
    let service = PriceService::new(config, scraper);

    let now = util::now_timestamp();
    if with_update {
        info!("Update run at {}", util::format_timestamp(now));
    }

    match service.process(with_update, with_graph, now, &Local).await {
        Ok(brief) => {
            print!("{}", brief);
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            Err(e.into())
        }
    }
}
