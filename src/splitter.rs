//! Record boundary detection inside a raw byte buffer.

use crate::error::{BrcError, Result};

/// Borrowed view of one `name;value` record.
///
/// Only valid while the buffer it points into is alive; the worker decodes it
/// before the buffer goes back to a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSlice<'a> {
    pub name: &'a [u8],
    pub value: &'a [u8],
}

/// Scans `buf` for newlines and appends the index of each one to `ends`.
///
/// Returns how many bytes are covered by fully terminated records, i.e. the
/// position just past the last newline. Everything from there on is the
/// unconsumed tail. `\r` is left in place.
pub fn find_records(buf: &[u8], ends: &mut Vec<usize>) -> usize {
    let before = ends.len();
    ends.extend(memchr::memchr_iter(b'\n', buf));
    match ends.len() {
        n if n > before => ends[n - 1] + 1,
        _ => 0,
    }
}

/// Splits a record (without its newline) at the first `;`.
///
/// `offset` is the record's absolute position, reported when the separator
/// is missing.
pub fn split_record(line: &[u8], offset: u64) -> Result<RecordSlice<'_>> {
    let at = memchr::memchr(b';', line).ok_or(BrcError::MalformedRecord { offset })?;
    Ok(RecordSlice {
        name: &line[..at],
        value: &line[at + 1..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_complete_records_and_tail() {
        let buf = b"AB;1.2\nCD;3.4\nEF;5";
        let mut ends = Vec::new();
        let consumed = find_records(buf, &mut ends);
        assert_eq!(ends, vec![6, 13]);
        assert_eq!(consumed, 14);
        assert_eq!(&buf[consumed..], b"EF;5");
    }

    #[test]
    fn no_newline_consumes_nothing() {
        let mut ends = Vec::new();
        assert_eq!(find_records(b"Hamburg;12", &mut ends), 0);
        assert!(ends.is_empty());
        assert_eq!(find_records(b"", &mut ends), 0);
    }

    #[test]
    fn carriage_return_stays_with_value() {
        let buf = b"Oslo;1.0\r\n";
        let mut ends = Vec::new();
        find_records(buf, &mut ends);
        let record = split_record(&buf[..ends[0]], 0).unwrap();
        assert_eq!(record.name, b"Oslo");
        assert_eq!(record.value, b"1.0\r");
    }

    #[test]
    fn splits_on_first_separator() {
        let record = split_record("Ōsaka;-3.4".as_bytes(), 0).unwrap();
        assert_eq!(record.name, "Ōsaka".as_bytes());
        assert_eq!(record.value, b"-3.4");
    }

    #[test]
    fn missing_separator_reports_offset() {
        match split_record(b"Oslo 1.0", 77) {
            Err(BrcError::MalformedRecord { offset }) => assert_eq!(offset, 77),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            split_record(b"", 3),
            Err(BrcError::MalformedRecord { offset: 3 })
        ));
    }
}
