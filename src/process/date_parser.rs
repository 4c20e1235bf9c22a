use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// "19 July 2024", "19th July 2024", "1st March 2023", anywhere in the text.
static PUBLICATION_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})(?:st|nd|rd|th)? ([A-Za-z]+) (\d{4})").expect("date pattern should compile")
});

/// Pull the first "day [suffix] month year" date out of free text.
/// Returns `None` when nothing matches or the match is not a real date.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    let caps = PUBLICATION_DATE.captures(text)?;
    let candidate = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
    NaiveDate::parse_from_str(&candidate, "%d %B %Y").ok()
}
