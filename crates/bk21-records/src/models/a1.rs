//! A1 notation helpers.

/// Convert a 0-based column index to its letter (`0` is `A`, `26` is `AA`).
#[must_use]
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1 reference for a 1-based row and 0-based column.
#[must_use]
pub fn cell(row: usize, col: usize) -> String {
    format!("{}{row}", column_letter(col))
}

/// Quote a tab name for use in a range (`'논문'!A1`).
#[must_use]
pub fn qualified(tab: &str, range: &str) -> String {
    format!("'{}'!{range}", tab.replace('\'', "''"))
}
