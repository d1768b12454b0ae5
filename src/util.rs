use chrono::{Local, NaiveDateTime};
use crate::errors::{Result, PriceHubError};

/// 当前时间戳（秒）
pub fn now_timestamp() -> i64 {
    Local::now().timestamp()
}

/// 本地时间显示
pub fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn instant_from_millis(ms: i64) -> Result<NaiveDateTime> {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| PriceHubError::DataError(format!("Invalid instant: {}", ms)))
}

// Arrow数据转换工具
pub mod arrow_utils {
    use super::*;
    use crate::models::plot::{PlotPanel, PlotSeries};
    use crate::models::series::NormalizedPoint;
    use arrow_schema::{DataType, Field, Schema, TimeUnit};
    use arrow::array::{ArrayRef, StringBuilder};
    use arrow_array::{Array, Float64Array, Int32Array, StringArray, TimestampMillisecondArray};
    use arrow::record_batch::RecordBatch;
    use arrow_ipc::reader::FileReader;
    use arrow_ipc::writer::FileWriter;
    use log::info;
    use std::fs::File;
    use std::path::Path;
    use std::sync::Arc;

    fn plot_schema() -> Schema {
        Schema::new(vec![
            Field::new("panel", DataType::Int32, false),
            Field::new("label", DataType::Utf8, false),
            Field::new("instant", DataType::Timestamp(TimeUnit::Millisecond, None), false),
            Field::new("ratio", DataType::Float64, false),
        ])
    }

    // 将图表面板展开为一行一个点的记录批次
    pub fn plot_panels_to_record_batch(panels: &[PlotPanel]) -> Result<RecordBatch> {
        let mut panel_values = Vec::new();
        let mut label_builder = StringBuilder::new();
        let mut instant_values = Vec::new();
        let mut ratio_values = Vec::new();

        for (panel_idx, panel) in panels.iter().enumerate() {
            for series in &panel.series {
                for point in &series.points {
                    panel_values.push(panel_idx as i32);
                    label_builder.append_value(&series.label);
                    instant_values.push(point.instant.and_utc().timestamp_millis());
                    ratio_values.push(point.ratio);
                }
            }
        }

        let panel_array: ArrayRef = Arc::new(Int32Array::from(panel_values));
        let label_array: ArrayRef = Arc::new(label_builder.finish());
        let instant_array: ArrayRef = Arc::new(TimestampMillisecondArray::from(instant_values));
        let ratio_array: ArrayRef = Arc::new(Float64Array::from(ratio_values));

        RecordBatch::try_new(
            Arc::new(plot_schema()),
            vec![panel_array, label_array, instant_array, ratio_array],
        )
        .map_err(|e| PriceHubError::ArrowError(e.to_string()))
    }

    // 将图表面板保存到Arrow文件
    pub fn save_plot_panels_to_arrow(panels: &[PlotPanel], path: &Path) -> Result<()> {
        info!("Saving {} plot panels to {}", panels.len(), path.display());

        let batch = plot_panels_to_record_batch(panels)?;
        let file = File::create(path)?;

        let mut writer = FileWriter::try_new(file, &batch.schema())
            .map_err(|e| PriceHubError::ArrowError(e.to_string()))?;
        writer.write(&batch)
            .map_err(|e| PriceHubError::ArrowError(e.to_string()))?;
        writer.finish()
            .map_err(|e| PriceHubError::ArrowError(e.to_string()))?;

        Ok(())
    }

    // 从Arrow文件读取图表面板，曲线按首次出现的顺序还原
    pub fn read_plot_panels_from_arrow(path: &Path) -> Result<Vec<PlotPanel>> {
        let file = File::open(path)?;
        let reader = FileReader::try_new(file, None)
            .map_err(|e| PriceHubError::ArrowError(e.to_string()))?;

        let mut panels: Vec<PlotPanel> = Vec::new();

        for batch in reader {
            let batch = batch.map_err(|e| PriceHubError::ArrowError(e.to_string()))?;

            let panel_array = batch.column(0).as_any().downcast_ref::<Int32Array>()
                .ok_or_else(|| PriceHubError::ArrowError("Failed to downcast panel column".to_string()))?;
            let label_array = batch.column(1).as_any().downcast_ref::<StringArray>()
                .ok_or_else(|| PriceHubError::ArrowError("Failed to downcast label column".to_string()))?;
            let instant_array = batch.column(2).as_any().downcast_ref::<TimestampMillisecondArray>()
                .ok_or_else(|| PriceHubError::ArrowError("Failed to downcast instant column".to_string()))?;
            let ratio_array = batch.column(3).as_any().downcast_ref::<Float64Array>()
                .ok_or_else(|| PriceHubError::ArrowError("Failed to downcast ratio column".to_string()))?;

            for i in 0..batch.num_rows() {
                let panel_idx = usize::try_from(panel_array.value(i))
                    .map_err(|_| PriceHubError::ArrowError(format!("Negative panel index at row {}", i)))?;
                if panels.len() <= panel_idx {
                    panels.resize_with(panel_idx + 1, PlotPanel::default);
                }

                let label = label_array.value(i);
                let panel = &mut panels[panel_idx];
                let series = match panel.series.iter().position(|s| s.label == label) {
                    Some(pos) => &mut panel.series[pos],
                    None => {
                        panel.series.push(PlotSeries {
                            label: label.to_string(),
                            points: Vec::new(),
                        });
                        let last = panel.series.len() - 1;
                        &mut panel.series[last]
                    }
                };

                series.points.push(NormalizedPoint {
                    instant: instant_from_millis(instant_array.value(i))?,
                    ratio: ratio_array.value(i),
                });
            }
        }

        Ok(panels)
    }
}
