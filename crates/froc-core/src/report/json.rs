use std::path::Path;

use crate::report::rjafroc::RjafrocReport;
use crate::report::summary::Summary;
use crate::report::SCHEMA_VERSION;

pub fn write_json(report: &RjafrocReport, summary: &Summary, out: &Path) -> anyhow::Result<()> {
    let v = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "summary": summary,
        "truth": report.truth,
        "tp": report.tp,
        "fp": report.fp,
        "lesions": report.lesions,
        "raters": report.raters,
    });
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, serde_json::to_string_pretty(&v)?)?;
    Ok(())
}
