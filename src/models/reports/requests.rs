use serde::Deserialize;
use ts_rs::TS;

/// 日期范围参数（YYYY-MM-DD，闭区间）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct DateRangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
