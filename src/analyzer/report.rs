//! Human-readable report formatting for an `Analysis` (spec.md §4.5
//! "formatted_report").

use std::collections::HashMap;
use std::fmt::Write as _;

use super::{AnalysisStatus, FailurePattern};

pub fn format_report(status: AnalysisStatus, totals: &HashMap<String, usize>, patterns: &[FailurePattern]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "status: {status}");
    let mut totals_sorted: Vec<_> = totals.iter().collect();
    totals_sorted.sort_by_key(|(k, _)| k.to_string());
    for (status_name, count) in totals_sorted {
        let _ = writeln!(out, "  {status_name}: {count}");
    }
    if patterns.is_empty() {
        out.push_str("no failure patterns\n");
        return out;
    }
    let _ = writeln!(out, "failure patterns ({}):", patterns.len());
    for pattern in patterns {
        let _ = writeln!(
            out,
            "- [{}] x{} {}{}",
            pattern.category,
            pattern.count,
            pattern.representative_message,
            pattern
                .location
                .as_ref()
                .map(|l| format!(" ({l})"))
                .unwrap_or_default()
        );
        for action in &pattern.suggested_actions {
            let _ = writeln!(out, "    - {action}");
        }
    }
    out
}
