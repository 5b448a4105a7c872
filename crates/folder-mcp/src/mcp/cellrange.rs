//! Helpers for the spreadsheet-shaped endpoints: parsing `Location::Sheet`
//! cell ranges like `"A1:C12"` and the `N | N-M | N,M,...` selector grammar
//! shared by `get_slides`/`get_pages`.

/// Parses `"A1:C12"` into `(rows, columns)`. Returns `None` if the range
/// isn't in the expected `<col><row>:<col><row>` shape.
#[must_use]
pub fn parse_cell_range(range: &str) -> Option<(usize, usize)> {
    let (start, end) = range.split_once(':')?;
    let (start_col, start_row) = split_cell(start)?;
    let (end_col, end_row) = split_cell(end)?;
    let rows = end_row.checked_sub(start_row)?.checked_add(1)?;
    let columns = end_col.checked_sub(start_col)?.checked_add(1)?;
    Some((rows, columns))
}

fn split_cell(cell: &str) -> Option<(usize, usize)> {
    let letters_end = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(letters_end);
    if letters.is_empty() || digits.is_empty() {
        return None;
    }
    let column = column_letters_to_index(letters)?;
    let row: usize = digits.parse().ok()?;
    Some((column, row))
}

fn column_letters_to_index(letters: &str) -> Option<usize> {
    let mut index: usize = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index)
}

/// Parses the `N | N-M | N,M,N-P` numbered-item selector grammar used by
/// `get_slides`/`get_pages`. Returns the selected 1-indexed numbers in
/// ascending, deduplicated order. `None` if any term is malformed.
#[must_use]
pub fn parse_number_selector(selector: &str) -> Option<Vec<usize>> {
    let mut numbers = std::collections::BTreeSet::new();
    for term in selector.split(',') {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        if let Some((start, end)) = term.split_once('-') {
            let start: usize = start.trim().parse().ok()?;
            let end: usize = end.trim().parse().ok()?;
            if start > end {
                return None;
            }
            for n in start..=end {
                numbers.insert(n);
            }
        } else {
            numbers.insert(term.parse().ok()?);
        }
    }
    Some(numbers.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_range() {
        assert_eq!(parse_cell_range("A1:C12"), Some((12, 3)));
    }

    #[test]
    fn rejects_malformed_range() {
        assert_eq!(parse_cell_range("garbage"), None);
    }

    #[test]
    fn parses_single_number() {
        assert_eq!(parse_number_selector("5"), Some(vec![5]));
    }

    #[test]
    fn parses_range_and_list() {
        assert_eq!(parse_number_selector("1-3,5"), Some(vec![1, 2, 3, 5]));
    }

    #[test]
    fn rejects_inverted_range() {
        assert_eq!(parse_number_selector("5-1"), None);
    }

    #[test]
    fn rejects_empty_term() {
        assert_eq!(parse_number_selector("1,,3"), None);
    }
}
