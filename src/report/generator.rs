//! Satisfaction report generation.
//!
//! This module renders a [`Report`] built from a ledger snapshot as
//! Markdown or JSON.

use crate::models::{
    ManagerEntry, Rejection, Report, ReportMetadata, SatisfactionTrend, TicketEntry,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Satisfaction Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_global_section(report));
    output.push_str(&generate_managers_section(&report.managers));
    output.push_str(&generate_tickets_section(&report.tickets));
    output.push_str(&generate_rejections_section(report));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Input:** `{}`\n", metadata.input));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Submissions:** {}\n", metadata.submissions));
    section.push_str(&format!("- **Accepted:** {}\n", metadata.accepted));
    if metadata.rejected > 0 {
        section.push_str(&format!("- **Rejected:** {}\n", metadata.rejected));
    }
    section.push_str(&format!(
        "- **Replay Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_global_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Global Satisfaction\n\n");
    section.push_str("| Average | Ratings | Five-star % |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {}% |\n\n",
        report.global.average_rating,
        report.global.total_ratings,
        report.global_five_star_percentage
    ));

    if report.global.total_ratings > 0 {
        section.push_str("### Score Distribution\n\n");
        section.push_str(&distribution_table(&report.distribution));
    }

    section
}

/// Render a 1..5 star distribution as a Markdown table.
fn distribution_table(distribution: &[u64; 5]) -> String {
    let mut table = String::new();

    table.push_str("| Stars | Ratings |\n");
    table.push_str("|:---|:---:|\n");
    for (i, count) in distribution.iter().enumerate().rev() {
        let stars = i + 1;
        table.push_str(&format!(
            "| {}{} | {} |\n",
            "★".repeat(stars),
            "☆".repeat(5 - stars),
            count
        ));
    }
    table.push('\n');

    table
}

fn generate_managers_section(managers: &[ManagerEntry]) -> String {
    let mut section = String::new();

    section.push_str("## Managers\n\n");

    if managers.is_empty() {
        section.push_str("No manager has received a rating yet.\n\n");
        return section;
    }

    section.push_str("| Manager | Average | Ratings | Five-star | Five-star % |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|\n");

    // Highest average first, then most ratings.
    let mut sorted: Vec<&ManagerEntry> = managers.iter().collect();
    sorted.sort_by(|a, b| {
        b.trend
            .avg_rating
            .cmp(&a.trend.avg_rating)
            .then_with(|| b.trend.total_ratings.cmp(&a.trend.total_ratings))
            .then_with(|| a.manager.cmp(&b.manager))
    });

    for entry in sorted {
        section.push_str(&format!(
            "| `{}` | {} | {} | {} | {}% |\n",
            entry.manager,
            entry.satisfaction.average_rating,
            entry.satisfaction.total_ratings,
            entry.satisfaction.five_star_count,
            entry.trend.five_star_percentage
        ));
    }
    section.push('\n');

    section
}

fn generate_tickets_section(tickets: &[TicketEntry]) -> String {
    if tickets.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Tickets\n\n");
    section.push_str("| Ticket | Average | Ratings |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for entry in tickets {
        section.push_str(&format!(
            "| #{} | {} | {} |\n",
            entry.ticket_id, entry.satisfaction.average_rating, entry.satisfaction.total_ratings
        ));
    }
    section.push('\n');

    section
}

fn generate_rejections_section(report: &Report) -> String {
    if report.rejections.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Rejected Submissions\n\n");
    for (code, count) in report.rejections_by_code() {
        section.push_str(&format!("- **{}:** {}\n", code, count));
    }
    section.push('\n');

    for rejection in &report.rejections {
        section.push_str(&generate_rejection_line(rejection));
    }
    section.push('\n');

    section
}

fn generate_rejection_line(rejection: &Rejection) -> String {
    format!(
        "- #{} `{}` ticket #{}: **{}** ({}) {}\n",
        rejection.position,
        rejection.customer,
        rejection.ticket_id,
        rejection.name,
        rejection.code,
        rejection.message
    )
}

fn generate_footer() -> String {
    "---\n\n*Report generated by satledger*\n".to_string()
}

/// One-manager trend block for the console.
pub fn format_trend(manager: &str, trend: &SatisfactionTrend) -> String {
    format!(
        "📈 Trend for {}:\n   Average: {} | Ratings: {} | Five-star: {}%",
        manager, trend.avg_rating, trend.total_ratings, trend.five_star_percentage
    )
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::models::{LedgerSnapshot, RatingRequest, Score, Tally};
    use chrono::Utc;

    fn create_test_report() -> Report {
        let mut tally = Tally::default();
        for s in [4, 5, 3] {
            tally.record(Score::new(s).unwrap());
        }

        let mut snapshot = LedgerSnapshot::default();
        snapshot.managers.insert("ST2JHG".to_string(), tally);
        snapshot.tickets.insert(1, tally);
        snapshot.global = tally;
        snapshot.ratings_recorded = 3;

        let request = RatingRequest {
            customer: "ST2CY".to_string(),
            ticket_id: 1,
            manager: "ST2JHG".to_string(),
            score: 6,
            feedback: None,
        };
        let rejection = Rejection::new(4, &request, &LedgerError::InvalidRating { score: 6 });

        let metadata = ReportMetadata {
            input: "ratings.json".to_string(),
            generated_at: Utc::now(),
            submissions: 4,
            accepted: 3,
            rejected: 1,
            duration_seconds: 0.2,
        };

        Report::from_snapshot(metadata, &snapshot, vec![rejection])
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Satisfaction Report"));
        assert!(markdown.contains("## Global Satisfaction"));
        assert!(markdown.contains("| 4 | 3 | 33% |"));
        assert!(markdown.contains("| `ST2JHG` | 4 | 3 | 1 | 33% |"));
        assert!(markdown.contains("| #1 | 4 | 3 |"));
        assert!(markdown.contains("INVALID_RATING"));
        assert!(markdown.contains("- **501:** 1"));
    }

    #[test]
    fn test_format_trend() {
        let mut tally = Tally::default();
        for s in [4, 5, 3] {
            tally.record(Score::new(s).unwrap());
        }

        let text = format_trend("ST2JHG", &tally.trend());
        assert!(text.starts_with("📈 Trend for ST2JHG:"));
        assert!(text.contains("Average: 4 | Ratings: 3 | Five-star: 33%"));

        let empty = format_trend("ST2NEB", &Tally::default().trend());
        assert!(empty.contains("Average: 0 | Ratings: 0 | Five-star: 0%"));
    }

    #[test]
    fn test_distribution_table() {
        let table = distribution_table(&[0, 0, 1, 1, 1]);
        assert!(table.contains("| ★★★★★ | 1 |"));
        assert!(table.contains("| ★☆☆☆☆ | 0 |"));
    }

    #[test]
    fn test_empty_report() {
        let metadata = ReportMetadata {
            input: "empty.json".to_string(),
            generated_at: Utc::now(),
            submissions: 0,
            accepted: 0,
            rejected: 0,
            duration_seconds: 0.0,
        };
        let report = Report::from_snapshot(metadata, &LedgerSnapshot::default(), Vec::new());
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("| 0 | 0 | 0% |"));
        assert!(markdown.contains("No manager has received a rating yet."));
        assert!(!markdown.contains("## Tickets"));
        assert!(!markdown.contains("## Rejected Submissions"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["global"]["averageRating"], 4);
        assert_eq!(value["managers"][0]["trend"]["fiveStarPercentage"], 33);
        assert_eq!(value["rejections"][0]["code"], 501);
    }
}
