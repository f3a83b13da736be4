//! Human-readable profile formatting.

use perfprof_core::{PerformanceProfile, ProfileStatus};

const HEADERS: [&str; 4] = ["WORKER", "REQUEST TYPE", "MAX RPS", "STATUS"];

pub fn format_profile(profile: &PerformanceProfile) -> String {
    let rows: Vec<[String; 4]> = profile
        .entries
        .iter()
        .map(|e| {
            [
                e.worker_type_id.clone(),
                e.request_type_id.clone(),
                format!("{:.2}", e.max_throughput_rps),
                e.status.label().to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(String::from), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }

    let ok = profile.count_status(ProfileStatus::Ok) + profile.count_status(ProfileStatus::OkUsingHighestRate);
    out.push_str(&format!("\n{} entries, {ok} within SLO\n", rows.len()));
    out
}

fn push_row(out: &mut String, row: &[String; 4], widths: &[usize; 4]) {
    out.push_str(&format!(
        "{:<w0$}  {:<w1$}  {:>w2$}  {}\n",
        row[0],
        row[1],
        row[2],
        row[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
    ));
}
