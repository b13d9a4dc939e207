//! Plain-text chart report for terminal output.

use std::fmt::Write as _;

use natal_chart_models::ChartResult;

/// Formats degrees within a sign as `DD°MM'`, truncating seconds.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn degrees_minutes(degrees: f64) -> String {
    let total_minutes = (degrees.max(0.0) * 60.0).floor() as u32;
    format!("{:02}\u{b0}{:02}'", total_minutes / 60, total_minutes % 60)
}

/// Renders a chart as a multi-section text report.
#[must_use]
pub fn format_chart(chart: &ChartResult) -> String {
    let mut out = String::new();
    let input = &chart.input;
    let location = input.location();

    let _ = writeln!(
        out,
        "Natal chart for {}{}",
        input.datetime().format("%Y-%m-%d %H:%M:%S %:z"),
        input.place().map(|p| format!(" ({p})")).unwrap_or_default()
    );
    let _ = writeln!(
        out,
        "Latitude {:.4}, longitude {:.4}, {} houses",
        location.latitude, location.longitude, chart.house_system
    );

    out.push_str("\nPlanets\n");
    for position in &chart.planets {
        let _ = writeln!(
            out,
            "  {} {:<8} {} {:<12} {}  house {}",
            position.planet.glyph(),
            position.planet.to_string(),
            position.sign.glyph(),
            position.sign.to_string(),
            degrees_minutes(position.degree_in_sign()),
            position.house
        );
    }

    out.push_str("\nHouses\n");
    for cusp in &chart.cusps {
        let _ = writeln!(
            out,
            "  {:>2}  {} {:<12} {}",
            cusp.house,
            cusp.sign.glyph(),
            cusp.sign.to_string(),
            degrees_minutes(cusp.degree_in_sign())
        );
    }

    out.push_str("\nAspects\n");
    if chart.aspects.is_empty() {
        out.push_str("  (none)\n");
    }
    for aspect in &chart.aspects {
        let _ = writeln!(
            out,
            "  {} {} {} (orb {})",
            aspect.first,
            aspect.kind,
            aspect.second,
            degrees_minutes(aspect.orb)
        );
    }

    out
}
