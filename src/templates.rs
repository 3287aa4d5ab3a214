use crate::processing::{DistanceUnit, InspectedFit, LapSummary, ProcessedFit, speed_to_pace};

fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(total) => {
            let rounded = total.round().max(0.0) as u64;
            let hours = rounded / 3600;
            let minutes = (rounded % 3600) / 60;
            let seconds = rounded % 60;

            if hours > 0 {
                format!("{}h {:02}m {:02}s", hours, minutes, seconds)
            } else {
                format!("{}m {:02}s", minutes, seconds)
            }
        }
        None => "—".to_string(),
    }
}

fn format_distance(meters: Option<f64>, unit: DistanceUnit) -> String {
    match (meters, unit) {
        (Some(distance), DistanceUnit::Kilometer) if distance < 1000.0 => {
            format!("{:.0} m", distance)
        }
        (Some(distance), unit) => {
            format!("{:.2} {}", distance / unit.meters(), unit.label())
        }
        (None, _) => "—".to_string(),
    }
}

fn format_pace(speed: Option<f64>, unit: DistanceUnit) -> String {
    speed
        .and_then(|value| speed_to_pace(value, unit.meters()))
        .map(|pace| format!("{pace} min/{}", unit.label()))
        .unwrap_or_else(|| "—".to_string())
}

fn format_heart_rate(value: Option<f64>) -> String {
    match value {
        Some(hr) if hr.is_finite() && hr > 0.0 => format!("{:.0} bpm", hr.round()),
        _ => "—".to_string(),
    }
}

/// Escape text for inclusion in HTML element content or quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn render_landing_page() -> String {
    include_str!("../templates/landing.html").to_string()
}

fn summary_card(label: &str, value: &str) -> String {
    format!(
        "<div class=\"summary-card\"><p class=\"label\">{label}</p><p class=\"value\">{}</p></div>",
        escape_html(value)
    )
}

fn render_lap_table(laps: &[LapSummary], unit: DistanceUnit) -> String {
    let mut table = String::new();
    table.push_str("<div class=\"table-wrapper\"><table class=\"laps\"><thead><tr><th>Lap</th><th>Distance</th><th>Timer time</th><th>Pace</th><th>Avg HR</th></tr></thead><tbody>");

    for (idx, lap) in laps.iter().enumerate() {
        table.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            idx + 1,
            format_distance(Some(lap.total_distance), unit),
            format_duration(Some(lap.total_timer_time)),
            format_pace(Some(lap.avg_speed), unit),
            format_heart_rate(lap.avg_heart_rate),
        ));
    }

    table.push_str("</tbody></table></div>");
    table
}

/// Lap listing shown after a file is inspected, with a pre-filled per-lap
/// pace list the user can edit.
pub fn render_lap_overview(inspected: &InspectedFit, unit: DistanceUnit) -> String {
    let mut body = String::new();

    body.push_str("<section class=\"results-card\">");
    body.push_str(&format!(
        "<div class=\"results-header\"><div><p class=\"eyebrow\">Laps</p><h2>{} laps, {} records</h2></div></div>",
        inspected.laps.len(),
        inspected.record_count
    ));

    if inspected.laps.is_empty() {
        body.push_str("<p>This activity has no laps. Use a single pace, optionally with auto laps.</p>");
    } else {
        body.push_str(&render_lap_table(&inspected.laps, unit));
        let paces: Vec<String> = inspected
            .laps
            .iter()
            .map(|lap| {
                speed_to_pace(lap.avg_speed, unit.meters()).unwrap_or_else(|| "00:00".into())
            })
            .collect();
        body.push_str(&format!(
            "<p class=\"hint\">Current paces: <code id=\"current-paces\">{}</code></p>",
            escape_html(&paces.join(", "))
        ));
    }

    body.push_str("</section>");
    body
}

pub fn render_processed_records(
    processed: &ProcessedFit,
    download_url: &str,
    unit: DistanceUnit,
) -> String {
    let mut body = String::new();
    let summary = &processed.summary;

    body.push_str("<section class=\"results-card\">");
    body.push_str(
        "<div class=\"results-header\"><div><p class=\"eyebrow\">Workout Overview</p><h2>Rewritten FIT file</h2></div>",
    );
    body.push_str(&format!(
        "<a class=\"cta\" href=\"{}\">Download processed FIT</a>",
        escape_html(download_url)
    ));
    body.push_str("</div>");

    body.push_str("<div class=\"summary-grid\">");
    body.push_str(&summary_card(
        "Workout Duration",
        &format_duration(summary.duration_seconds),
    ));
    body.push_str(&summary_card(
        "Workout Type",
        summary.workout_type.as_deref().unwrap_or("Unknown"),
    ));
    body.push_str(&summary_card(
        "Workout Distance",
        &format_distance(summary.distance_meters, unit),
    ));
    body.push_str(&summary_card("Laps", &summary.lap_count.to_string()));
    body.push_str(&summary_card(
        "Pace (slowest)",
        &format_pace(summary.speed_min, unit),
    ));
    body.push_str(&summary_card(
        "Pace (average)",
        &format_pace(summary.speed_mean, unit),
    ));
    body.push_str(&summary_card(
        "Pace (fastest)",
        &format_pace(summary.speed_max, unit),
    ));
    body.push_str(&summary_card(
        "Heart Rate (min)",
        &format_heart_rate(summary.heart_rate_min),
    ));
    body.push_str(&summary_card(
        "Heart Rate (mean)",
        &format_heart_rate(summary.heart_rate_mean),
    ));
    body.push_str(&summary_card(
        "Heart Rate (max)",
        &format_heart_rate(summary.heart_rate_max),
    ));
    body.push_str("</div>");
    body.push_str("</section>");

    if !processed.laps.is_empty() {
        body.push_str("<section class=\"results-card\">");
        body.push_str(
            "<div class=\"results-header\"><div><p class=\"eyebrow\">Laps</p><h2>Rewritten laps</h2></div></div>",
        );
        body.push_str(&render_lap_table(&processed.laps, unit));
        body.push_str("</section>");
    }

    body.push_str("<section class=\"results-card\">");
    body.push_str(&format!(
        "<div class=\"results-header\"><div><p class=\"eyebrow\">Data records</p><h2>Showing the first 25 of {} records</h2></div></div>",
        processed.records.len()
    ));
    body.push_str("<div class=\"table-wrapper\"><table><thead><tr><th>Message</th><th>Fields</th></tr></thead><tbody>");

    for record in processed.records.iter().take(25) {
        body.push_str(&format!(
            "<tr><td>{}</td><td>",
            escape_html(&record.message_type)
        ));
        body.push_str("<ul>");
        for field in &record.fields {
            body.push_str(&format!(
                "<li><strong>{}</strong>: {}</li>",
                escape_html(&field.name),
                escape_html(&field.value)
            ));
        }
        body.push_str("</ul></td></tr>");
    }

    body.push_str("</tbody></table></div>");
    body.push_str("</section>");
    body
}
