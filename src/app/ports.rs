use crate::app::report_use_case::Report;
use crate::error::Result;

/// Output port for finished reports
pub trait ReportSink: Send + Sync {
    fn publish(&self, report: &Report) -> Result<()>;
}
