//! Plain-text rendering of a daily metrics page

use rust_decimal::Decimal;
use std::fmt::Write;

use tracemeter::types::{DailyMetrics, DailyMetricsPage};

/// Format number with thousands separators
/// Example: 1234567 → "1,234,567"
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3);

    // Digits are ASCII, so byte indexing is safe
    for (i, ch) in s.bytes().enumerate() {
        if i > 0 && (len - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(ch as char);
    }

    result
}

/// Trailing zeros dropped: 1.50 → "$1.5", 0 → "$0"
pub fn format_cost(cost: Decimal) -> String {
    format!("${}", cost.normalize())
}

const ROW_HEADER: [&str; 7] = ["MODEL", "INPUT", "OUTPUT", "TOTAL", "OBS", "TRACES", "COST"];

fn render_day(out: &mut String, day: &DailyMetrics) {
    let _ = writeln!(
        out,
        "{}  {} traces  {}",
        day.date,
        format_number(day.count_traces),
        format_cost(day.total_cost)
    );

    if day.usage.is_empty() {
        out.push_str("  (no generations)\n");
        return;
    }

    let [model, input, output, total, obs, traces, cost] = ROW_HEADER;
    let _ = writeln!(
        out,
        "  {model:<28}{input:>12}{output:>12}{total:>12}{obs:>8}{traces:>8}{cost:>14}"
    );
    for row in &day.usage {
        let _ = writeln!(
            out,
            "  {:<28}{:>12}{:>12}{:>12}{:>8}{:>8}{:>14}",
            row.model.to_string(),
            format_number(row.input_usage),
            format_number(row.output_usage),
            format_number(row.total_usage),
            format_number(row.count_observations),
            format_number(row.count_traces),
            format_cost(row.total_cost),
        );
    }
}

pub fn render_table(page: &DailyMetricsPage) -> String {
    let mut out = String::new();

    if page.data.is_empty() {
        out.push_str("No usage data\n");
    }
    for (i, day) in page.data.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_day(&mut out, day);
    }

    let _ = writeln!(
        out,
        "\npage {}/{} ({} days)",
        page.meta.page,
        page.meta.total_pages,
        format_number(page.meta.total_items)
    );
    out
}
