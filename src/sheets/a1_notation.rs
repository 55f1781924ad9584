use std::fmt::Formatter;

use super::service::WorksheetHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Notation(String);

impl std::fmt::Display for A1Notation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<A1Notation> for String {
    fn from(a1_notation: A1Notation) -> Self {
        a1_notation.0
    }
}

impl AsRef<str> for A1Notation {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub trait ToA1Notation {
    fn to_a1_notation(&self) -> A1Notation;
}

/// Quotes a sheet title for use in a range, doubling embedded single quotes.
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// A bare quoted title addresses every populated cell of the worksheet.
impl ToA1Notation for WorksheetHandle {
    fn to_a1_notation(&self) -> A1Notation {
        A1Notation(quote_sheet_title(&self.title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worksheet(title: &str) -> WorksheetHandle {
        WorksheetHandle {
            spreadsheet_id: "spreadsheet-id".to_string(),
            sheet_id: 0,
            title: title.to_string(),
            index: 0,
        }
    }

    #[test]
    fn test_plain_title() {
        assert_eq!(worksheet("Sheet1").to_a1_notation().as_ref(), "'Sheet1'");
    }

    #[test]
    fn test_title_with_spaces_and_unicode() {
        assert_eq!(
            worksheet("Données 2024").to_a1_notation().to_string(),
            "'Données 2024'"
        );
    }

    #[test]
    fn test_title_with_single_quote() {
        assert_eq!(
            String::from(worksheet("Bob's sheet").to_a1_notation()),
            "'Bob''s sheet'"
        );
    }
}
