// src/crawler/consultant.rs

//! Production calendar crawler for consultant.ru.
//!
//! The yearly page lays out four quarter rows, each holding three month
//! tables. Non-working days are `td.weekend` cells and shortened days are
//! `td.preholiday` cells, with the day of month as text (optionally
//! suffixed by `*`).

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::crawler::Crawler;
use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, DateRecord, DayKind, sort_by_day};
use crate::utils::http;

/// Crawler for the consultant.ru production calendar.
pub struct ConsultantCrawler {
    client: reqwest::Client,
    base_url: Url,
}

impl ConsultantCrawler {
    /// Create a new crawler with the given HTTP settings.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        config.validate()?;
        let client = http::create_async_client(config)?;

        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
        })
    }

    fn year_url(&self, year: i32) -> Result<Url> {
        Ok(self.base_url.join(&format!("{year}/"))?)
    }
}

#[async_trait]
impl Crawler for ConsultantCrawler {
    async fn scrape_year(&self, year: i32) -> Result<Vec<DateRecord>> {
        let url = self.year_url(year)?;
        log::debug!("Fetching calendar for {} from {}", year, url);

        let html = http::fetch_text(&self.client, url.as_str()).await?;
        let records = parse_calendar(&html, year)?;

        log::debug!("Parsed {} classified days for {}", records.len(), year);
        Ok(records)
    }
}

/// Parse a yearly calendar page into records sorted by day.
pub fn parse_calendar(html: &str, year: i32) -> Result<Vec<DateRecord>> {
    let document = Html::parse_document(html);
    let months = month_tables(&document)?;
    let cell_sel = parse_selector("td")?;

    // There are rarely more than 128 classified days in a year
    let mut records = Vec::with_capacity(128);
    for (index, month) in months.iter().enumerate() {
        let month_number = index as u32 + 1;

        for cell in month.select(&cell_sel) {
            let is_weekend = has_class(&cell, "weekend");
            if !is_weekend && !has_class(&cell, "preholiday") {
                continue;
            }

            let text: String = cell.text().collect();
            let text = text.trim().trim_end_matches('*');
            let day = text
                .parse::<u32>()
                .ok()
                .and_then(|d| NaiveDate::from_ymd_opt(year, month_number, d))
                .ok_or_else(|| {
                    AppError::crawl(
                        format!("{year}-{month_number:02}"),
                        format!("can't parse day from '{text}'"),
                    )
                })?;

            let kind = if !is_weekend {
                DayKind::Preholiday
            } else if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                DayKind::Weekend
            } else {
                DayKind::Holiday
            };
            records.push(DateRecord::new(day, kind));
        }
    }

    // The page is already ordered, but the contract is ascending by day.
    sort_by_day(&mut records);
    Ok(records)
}

/// Collect the twelve month tables in calendar order.
fn month_tables(document: &Html) -> Result<Vec<ElementRef<'_>>> {
    let row_sel = parse_selector(".calendar-table > tbody > tr")?;
    let title_sel = parse_selector(".quarter-title")?;
    let month_sel = parse_selector(".month-block > table")?;
    let name_sel = parse_selector("th.month")?;

    let quarters = document
        .select(&row_sel)
        .filter(|row| row.select(&title_sel).next().is_some());

    let mut months = Vec::with_capacity(12);
    let mut found = Vec::with_capacity(12);
    for (quarter, row) in quarters.enumerate() {
        for (position, table) in row.select(&month_sel).enumerate() {
            let name = table
                .select(&name_sel)
                .flat_map(|th| th.text())
                .collect::<String>()
                .trim()
                .to_lowercase();

            let number = month_number(&name).ok_or_else(|| {
                AppError::crawl("calendar", format!("month '{name}' does not exist"))
            })?;

            let parsed = 3 * quarter + position + 1;
            if number != parsed {
                return Err(AppError::crawl(
                    "calendar",
                    format!("month '{name}' out of order - #{parsed}, must be #{number}"),
                ));
            }

            months.push(table);
            found.push(name);
        }
    }

    if months.len() != 12 {
        return Err(AppError::crawl(
            "calendar",
            format!("not all months are parsed: {found:?}"),
        ));
    }
    Ok(months)
}

fn month_number(name: &str) -> Option<usize> {
    let number = match name {
        "январь" => 1,
        "февраль" => 2,
        "март" => 3,
        "апрель" => 4,
        "май" => 5,
        "июнь" => 6,
        "июль" => 7,
        "август" => 8,
        "сентябрь" => 9,
        "октябрь" => 10,
        "ноябрь" => 11,
        "декабрь" => 12,
        _ => return None,
    };
    Some(number)
}

fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONTHS: [&str; 12] = [
        "Январь", "Февраль", "Март", "Апрель", "Май", "Июнь", "Июль", "Август", "Сентябрь",
        "Октябрь", "Ноябрь", "Декабрь",
    ];

    fn month_html(name: &str, cells: &str) -> String {
        format!(
            r#"<td class="month-block"><table class="cal">
                <thead><tr><th class="month">{name}</th></tr></thead>
                <tbody><tr>{cells}</tr></tbody>
            </table></td>"#
        )
    }

    fn calendar_html(names: &[&str], cells: impl Fn(usize) -> &'static str) -> String {
        let quarters: String = names
            .chunks(3)
            .enumerate()
            .map(|(q, chunk)| {
                let months: String = chunk
                    .iter()
                    .enumerate()
                    .map(|(i, name)| month_html(name, cells(q * 3 + i)))
                    .collect();
                format!(r#"<tr><th class="quarter-title">Q{}</th>{months}</tr>"#, q + 1)
            })
            .collect();

        format!(
            r#"<html><body><table class="calendar-table"><tbody>{quarters}</tbody></table></body></html>"#
        )
    }

    fn sample_cells(index: usize) -> &'static str {
        match index {
            0 => {
                r#"<td class="weekend">1</td><td class="weekend">6</td><td>9</td><td class="preholiday">22*</td>"#
            }
            2 => r#"<td class="weekend">8</td><td class="inactive">9</td>"#,
            _ => "<td>15</td>",
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_calendar() {
        let html = calendar_html(&MONTHS, sample_cells);
        let records = parse_calendar(&html, 2024).unwrap();

        let parsed: Vec<_> = records.iter().map(|r| (r.day, r.kind)).collect();
        assert_eq!(
            parsed,
            vec![
                (day(2024, 1, 1), DayKind::Holiday),
                (day(2024, 1, 6), DayKind::Weekend),
                (day(2024, 1, 22), DayKind::Preholiday),
                (day(2024, 3, 8), DayKind::Holiday),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_out_of_order_months() {
        let mut names = MONTHS;
        names.swap(0, 1);
        let html = calendar_html(&names, sample_cells);

        let err = parse_calendar(&html, 2024).unwrap_err();
        assert!(err.to_string().contains("out of order"));
    }

    #[test]
    fn test_parse_rejects_missing_months() {
        let html = calendar_html(&MONTHS[..9], sample_cells);

        let err = parse_calendar(&html, 2024).unwrap_err();
        assert!(err.to_string().contains("not all months are parsed"));
    }

    #[test]
    fn test_parse_rejects_unknown_month() {
        let mut names = MONTHS;
        names[4] = "Maй";
        let html = calendar_html(&names, sample_cells);

        let err = parse_calendar(&html, 2024).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_parse_rejects_bad_day() {
        let html = calendar_html(&MONTHS, |i| match i {
            1 => r#"<td class="weekend">x</td>"#,
            _ => "<td>1</td>",
        });

        let err = parse_calendar(&html, 2024).unwrap_err();
        assert!(matches!(err, AppError::Crawl { ref context, .. } if context == "2024-02"));
    }

    #[test]
    fn test_new_rejects_bad_settings() {
        let config = CrawlerConfig {
            timeout_secs: 0,
            ..CrawlerConfig::default()
        };
        assert!(matches!(
            ConsultantCrawler::new(&config),
            Err(AppError::Config(_))
        ));

        let config = CrawlerConfig {
            base_url: "calendar".to_string(),
            ..CrawlerConfig::default()
        };
        assert!(matches!(ConsultantCrawler::new(&config), Err(AppError::Url(_))));
    }

    #[test]
    fn test_year_url() {
        let config = CrawlerConfig {
            base_url: "http://example.com/calendar".to_string(),
            ..CrawlerConfig::default()
        };
        let crawler = ConsultantCrawler::new(&config).unwrap();
        assert_eq!(
            crawler.year_url(2025).unwrap().as_str(),
            "http://example.com/calendar/2025/"
        );
    }
}
