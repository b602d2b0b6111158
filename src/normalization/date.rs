use chrono::NaiveDate;

/// Tried in order; day-first wins over month-first for ambiguous dates.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

/// Parse a calendar date from the formats seen in the sheet. A bare year maps to January 1st.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// A plain year column value ("2021", "2021.0").
pub fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    let year = trimmed
        .parse::<i32>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i32))
        .or_else(|| {
            use chrono::Datelike;
            parse_date(trimmed).map(|d| d.year())
        })?;
    (1900..=2200).contains(&year).then_some(year)
}
