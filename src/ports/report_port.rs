//! Report output port.

use crate::domain::alert::Alert;
use crate::domain::error::PortwatchError;
use crate::domain::metrics::PerformanceReport;

/// Port for presenting a refresh cycle's results.
pub trait ReportPort {
    fn write(
        &self,
        report: &PerformanceReport,
        alerts: &[Alert],
        output_path: &str,
    ) -> Result<(), PortwatchError>;
}
