const LF: &[u8] = b"\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineScan {
    Complete { len: usize, consumed: usize },
    Incomplete,
    TooLong,
    BareLineFeed { at: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct LineScanner {
    budget: usize,
}

impl LineScanner {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn scan(&self, buffer: &[u8]) -> LineScan {
        let window_len = buffer.len().min(self.budget.saturating_add(2));
        let window = &buffer[..window_len];

        match twoway::find_bytes(window, LF) {
            Some(at) if at == 0 || window[at - 1] != b'\r' => LineScan::BareLineFeed { at },
            Some(at) => {
                let len = at - 1;
                if len > self.budget {
                    LineScan::TooLong
                } else {
                    LineScan::Complete {
                        len,
                        consumed: at + 1,
                    }
                }
            }
            None if window_len >= self.budget.saturating_add(2) => LineScan::TooLong,
            None => LineScan::Incomplete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LineScan, LineScanner};

    #[test]
    fn finds_crlf_line() {
        let scanner = LineScanner::new(16);
        assert_eq!(
            scanner.scan(b"Host: a\r\nrest"),
            LineScan::Complete {
                len: 7,
                consumed: 9
            }
        );
        assert_eq!(
            scanner.scan(b"\r\n"),
            LineScan::Complete {
                len: 0,
                consumed: 2
            }
        );
    }

    #[test]
    fn waits_for_terminator_within_budget() {
        let scanner = LineScanner::new(16);
        assert_eq!(scanner.scan(b"Host: exa"), LineScan::Incomplete);
        assert_eq!(scanner.scan(b"Host: example\r"), LineScan::Incomplete);
    }

    #[test]
    fn rejects_once_budget_is_exceeded_without_terminator() {
        let scanner = LineScanner::new(4);
        assert_eq!(scanner.scan(b"abcd\r"), LineScan::Incomplete);
        assert_eq!(scanner.scan(b"abcde\r"), LineScan::TooLong);
        assert_eq!(
            scanner.scan(b"abcd\r\n"),
            LineScan::Complete {
                len: 4,
                consumed: 6
            }
        );
    }

    #[test]
    fn line_feed_past_the_window_is_not_seen() {
        let scanner = LineScanner::new(4);
        let mut long = vec![b'a'; 1000];
        long.extend_from_slice(b"\r\n");
        assert_eq!(scanner.scan(&long), LineScan::TooLong);
    }

    #[test]
    fn reports_bare_line_feed() {
        let scanner = LineScanner::new(16);
        assert_eq!(scanner.scan(b"abc\ndef"), LineScan::BareLineFeed { at: 3 });
        assert_eq!(scanner.scan(b"\n"), LineScan::BareLineFeed { at: 0 });
    }
}
