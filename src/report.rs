//! Output formatting - plaintext and JSON.

use std::fmt::Write as _;

use serde_json::json;
use tracing::warn;

use crate::classify::ClassificationReport;

/// Renders the report in plain text format.
///
/// Missing targets list every source that names them, one `<- key:line`
/// per reference, so a broken chain can be followed back by hand.
pub fn render_plain(report: &ClassificationReport) -> String {
    let mut out = String::new();

    let reachable = report.reachable();
    let orphans = report.orphans();

    // Missing targets were never scanned, so they stay out of the total.
    let _ = writeln!(
        out,
        "Scanned {} artifacts: {} reachable, {} orphaned, {} missing",
        reachable.len() + orphans.len(),
        reachable.len(),
        orphans.len(),
        report.missing.len()
    );

    if !report.converged {
        let _ = writeln!(
            out,
            "WARNING: closure stopped after {} passes without converging; listing is partial",
            report.passes
        );
    }

    if orphans.is_empty() {
        let _ = writeln!(out, "No orphaned artifacts found.");
    } else {
        let _ = writeln!(out, "ORPHANED ({}):", orphans.len());
        for key in &orphans {
            let _ = writeln!(out, "- {}", key);
        }
    }

    if !report.missing.is_empty() {
        let _ = writeln!(out, "MISSING ({}):", report.missing.len());
        for m in &report.missing {
            let _ = writeln!(out, "- {}", m.target);
            for s in &m.sources {
                let _ = writeln!(out, "    <- {}:{}", s.key, s.line);
            }
        }
    }

    if !report.inactive.is_empty() {
        let _ = writeln!(out, "COMMENTED-OUT REFERENCES ({}):", report.inactive.len());
        for i in &report.inactive {
            let _ = writeln!(out, "- {}:{} -> {}", i.key, i.line, i.target);
        }
    }

    if !report.diagnostics.is_empty() {
        let _ = writeln!(out, "DIAGNOSTICS ({}):", report.diagnostics.len());
        for d in &report.diagnostics {
            let _ = writeln!(out, "- {}", d);
        }
    }

    out
}

/// Prints the plain text report to stdout.
pub fn print_plain(report: &ClassificationReport) {
    print!("{}", render_plain(report));
}

/// Renders the report as pretty-printed JSON with a generation timestamp.
pub fn render_json(report: &ClassificationReport) -> String {
    let value = json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "report": report,
    });
    match serde_json::to_string_pretty(&value) {
        Ok(json) => json,
        Err(e) => {
            // Fallback: still emit something machine-readable
            warn!(error = %e, "JSON serialization failed");
            format!("{{\"orphans\": {:?}}}", report.orphans())
        }
    }
}

/// Prints the JSON report to stdout.
pub fn print_json(report: &ClassificationReport) {
    println!("{}", render_json(report));
}
