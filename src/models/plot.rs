use crate::models::series::NormalizedPoint;

/// 一条归一化曲线
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub label: String,
    pub points: Vec<NormalizedPoint>,
}

/// 一个图表面板中的若干曲线
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlotPanel {
    pub series: Vec<PlotSeries>,
}

/// Groups series into panels of at most `batch_size`, keeping their order.
pub fn into_panels(series: Vec<PlotSeries>, batch_size: usize) -> Vec<PlotPanel> {
    let batch_size = batch_size.max(1);
    let mut panels = Vec::new();
    let mut iter = series.into_iter().peekable();
    while iter.peek().is_some() {
        panels.push(PlotPanel {
            series: iter.by_ref().take(batch_size).collect(),
        });
    }
    panels
}
