//! Matching roster rows against a date.

use chrono::NaiveDate;

use crate::roster::ACTIVE_COLUMN;
use crate::roster::NAME_COLUMN;
use crate::roster::PHOTO_COLUMN;
use crate::roster::Roster;
use crate::roster::RosterRow;
use crate::roster::TELEGRAM_ID_COLUMN;

const INACTIVE_VALUES: [&str; 4] = ["FALSE", "F", "0", "NO"];

/// A person whose event falls on the checked date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventMatch {
    pub name: String,
    pub photo_ref: String,
    pub telegram_id: Option<String>,
    /// Header of the matching column, e.g. "Birthday".
    pub event_name: String,
}

/// `DD/MM` and `DD-MM` keys for `date`.
pub fn date_keys(date: NaiveDate) -> [String; 2] {
    [
        date.format("%d/%m").to_string(),
        date.format("%d-%m").to_string(),
    ]
}

/// Every header that is not a reserved column, in header order.
pub fn event_columns(roster: &Roster, reserved: &[String]) -> Vec<String> {
    roster
        .headers
        .iter()
        .filter(|h| !h.is_empty() && !reserved.contains(h))
        .cloned()
        .collect()
}

pub fn is_inactive(value: &str) -> bool {
    let value = value.trim().to_uppercase();
    INACTIVE_VALUES.contains(&value.as_str())
}

/// Finds all (person, event column) pairs dated on `date`.
pub fn find_events(roster: &Roster, reserved: &[String], date: NaiveDate) -> Vec<EventMatch> {
    let keys = date_keys(date);
    let columns = event_columns(roster, reserved);

    roster
        .rows
        .iter()
        .flat_map(|row| matches_in_row(row, &columns, &keys))
        .collect()
}

fn matches_in_row(row: &RosterRow, columns: &[String], keys: &[String; 2]) -> Vec<EventMatch> {
    if row.get(ACTIVE_COLUMN).is_some_and(is_inactive) {
        return Vec::new();
    }

    let name = row.get(NAME_COLUMN).unwrap_or_default().trim();
    let photo_ref = row.get(PHOTO_COLUMN).unwrap_or_default().trim();
    if name.is_empty() || photo_ref.is_empty() {
        return Vec::new();
    }
    let telegram_id = row
        .get(TELEGRAM_ID_COLUMN)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    columns
        .iter()
        .filter(|column| {
            let value = row.get(column).unwrap_or_default().trim();
            keys.iter().any(|key| value.starts_with(key.as_str()))
        })
        .map(|column| EventMatch {
            name: name.to_string(),
            photo_ref: photo_ref.to_string(),
            telegram_id: telegram_id.clone(),
            event_name: column.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReservedColumns;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn roster(rows: &[&[&str]]) -> Roster {
        Roster::from_records(
            strings(&[
                "Name",
                "PhotoFile",
                "TelegramID",
                "Active",
                "Birthday",
                "Anniversary",
            ]),
            rows.iter().map(|r| strings(r)).collect::<Vec<_>>(),
        )
        .unwrap()
    }

    fn reserved() -> Vec<String> {
        ReservedColumns::default().columns
    }

    fn oct_19() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_date_keys_are_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(date_keys(date), ["07/03".to_string(), "07-03".to_string()]);
    }

    #[test]
    fn test_event_columns_exclude_reserved() {
        let roster = roster(&[]);
        assert_eq!(
            event_columns(&roster, &reserved()),
            strings(&["Birthday", "Anniversary"])
        );
    }

    #[test]
    fn test_find_events_both_formats() {
        let roster = roster(&[
            &["Ada", "ada.png", "111", "TRUE", "19/10/1990", ""],
            &["Bob", "bob.png", "", "", "01/01", "19-10-2015"],
            &["Cy", "cy.png", "333", "", "20/10", "18-10"],
        ]);
        let events = find_events(&roster, &reserved(), oct_19());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "Ada");
        assert_eq!(events[0].event_name, "Birthday");
        assert_eq!(events[0].telegram_id.as_deref(), Some("111"));
        assert_eq!(events[1].name, "Bob");
        assert_eq!(events[1].event_name, "Anniversary");
        assert_eq!(events[1].telegram_id, None);
    }

    #[test]
    fn test_multiple_events_for_one_person() {
        let roster = roster(&[&["Ada", "ada.png", "", "", "19/10", " 19-10-2020 "]]);
        let events = find_events(&roster, &reserved(), oct_19());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_name, "Birthday");
        assert_eq!(events[1].event_name, "Anniversary");
    }

    #[test]
    fn test_inactive_rows_skipped() {
        for flag in ["FALSE", "f", " no ", "0"] {
            let roster = roster(&[&["Ada", "ada.png", "", flag, "19/10", ""]]);
            assert!(find_events(&roster, &reserved(), oct_19()).is_empty(), "{flag}");
        }
        for flag in ["", "yes", "TRUE", "1"] {
            let roster = roster(&[&["Ada", "ada.png", "", flag, "19/10", ""]]);
            assert_eq!(find_events(&roster, &reserved(), oct_19()).len(), 1, "{flag}");
        }
    }

    #[test]
    fn test_rows_without_name_or_photo_skipped() {
        let roster = roster(&[
            &["", "ada.png", "", "", "19/10", ""],
            &["Bob", "  ", "", "", "19/10", ""],
        ]);
        assert!(find_events(&roster, &reserved(), oct_19()).is_empty());
    }

    #[test]
    fn test_unpadded_dates_do_not_match() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        let roster = roster(&[&["Ada", "ada.png", "", "", "7/3", "07/03/1999"]]);
        let events = find_events(&roster, &reserved(), date);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name, "Anniversary");
    }

    #[test]
    fn test_no_active_column() {
        let roster = Roster::from_records(
            strings(&["Name", "PhotoFile", "Birthday"]),
            vec![strings(&["Ada", "ada.png", "19/10"])],
        )
        .unwrap();
        assert_eq!(find_events(&roster, &reserved(), oct_19()).len(), 1);
    }

    #[test]
    fn test_blank_header_column_is_not_an_event() {
        let roster = Roster::from_records(
            strings(&["Name", "PhotoFile", "", "Birthday"]),
            vec![strings(&["Ada", "ada.png", "19/10", "19/10/1990"])],
        )
        .unwrap();
        assert_eq!(event_columns(&roster, &reserved()), strings(&["Birthday"]));

        let events = find_events(&roster, &reserved(), oct_19());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name, "Birthday");
    }
}
