pub mod ports;
pub mod report_use_case;

pub use ports::ReportSink;
pub use report_use_case::{Report, ReportKind, ReportOptions, ReportUseCase};
