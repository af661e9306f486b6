use serde::{Deserialize, Serialize};

use crate::application::services::quality_service::{ChunkMetrics, ProbeReport, QualityReport};

#[derive(Debug, Deserialize)]
pub struct QualityRequestDto {
    pub tenant_id: String,
    /// "metrics", "questions", "search", or "all" (the default).
    pub test_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QualityReportDto {
    pub manual_id: String,
    pub test_type: String,
    pub metrics: Option<ChunkMetrics>,
    pub probe_report: Option<ProbeReport>,
    pub recommendations: Vec<String>,
}

impl From<QualityReport> for QualityReportDto {
    fn from(report: QualityReport) -> Self {
        Self {
            manual_id: report.manual_id,
            test_type: report.test_type.as_str().to_string(),
            metrics: report.metrics,
            probe_report: report.probe_report,
            recommendations: report.recommendations,
        }
    }
}
