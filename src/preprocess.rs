use chrono::{Duration, Local, NaiveDate};

/// Rewrite relative date words in a question into literal dates so the
/// query generator can match them against stored `inspectionDate` strings.
///
/// "today" takes precedence over "yesterday"; only one clause is ever
/// appended. Questions mentioning neither pass through unchanged.
pub fn expand_relative_dates(question: &str, today: NaiveDate) -> String {
    let lowered = question.to_lowercase();
    if lowered.contains("today") {
        format!(
            "{} (For reference, today's date is {}.)",
            question,
            format_inspection_date(today)
        )
    } else if lowered.contains("yesterday") {
        format!(
            "{} (For reference, yesterday's date was {}.)",
            question,
            format_inspection_date(today - Duration::days(1))
        )
    } else {
        question.to_string()
    }
}

/// Same expansion pinned to the server's local date.
pub fn expand_relative_dates_now(question: &str) -> String {
    expand_relative_dates(question, Local::now().date_naive())
}

/// Dates are stored as M/D/YYYY strings without leading zeros.
pub fn format_inspection_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}
