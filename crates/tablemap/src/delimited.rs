//! Streaming reader for delimited flat files (CSV, TSV, pipe separated).
//!
//! Fields may be quoted; inside quotes the delimiter and line breaks are
//! literal and a doubled quote stands for one quote character. Records end at
//! LF, CR or CRLF. Rows may have differing field counts.
//!
//! ```
//! use tablemap::{DelimitedOptions, DelimitedReader};
//!
//! let input = "Id,Name\r\n1,\"Smith, \"\"Jo\"\"\"\r\n2,Lee\r\n";
//! let mut reader = DelimitedReader::new(input.as_bytes(), DelimitedOptions::default());
//! assert_eq!(reader.headers()?.unwrap(), ["Id", "Name"]);
//! assert_eq!(reader.read_record()?.unwrap(), ["1", "Smith, \"Jo\""]);
//! assert_eq!(reader.read_record()?.unwrap(), ["2", "Lee"]);
//! assert!(reader.read_record()?.is_none());
//! # Ok::<(), tablemap::MapError>(())
//! ```

use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};

/// Reader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelimitedOptions {
    pub delimiter: char,
    pub quote: char,
    /// First record holds column names.
    pub has_header: bool,
    /// Trim whitespace around unquoted fields.
    pub trim: bool,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            has_header: true,
            trim: false,
        }
    }
}

impl DelimitedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// A quote seen inside a quoted field: either the closing quote or the
    /// first half of an escaped one.
    QuoteInQuoted,
}

/// Character-level delimited record reader over any [`BufRead`].
#[derive(Debug)]
pub struct DelimitedReader<R> {
    reader: R,
    options: DelimitedOptions,
    buffer: String,
    pos: usize,
    /// 1-based line of the next unread character.
    line: usize,
    headers: Option<Vec<String>>,
    header_read: bool,
}

impl<R: BufRead> DelimitedReader<R> {
    pub fn new(reader: R, options: DelimitedOptions) -> Self {
        Self {
            reader,
            options,
            buffer: String::new(),
            pos: 0,
            line: 1,
            headers: None,
            header_read: false,
        }
    }

    pub fn options(&self) -> &DelimitedOptions {
        &self.options
    }

    /// Header record, when the options declare one.
    pub fn headers(&mut self) -> MapResult<Option<&[String]>> {
        self.ensure_header()?;
        Ok(self.headers.as_deref())
    }

    /// Next data record, or `None` at end of input.
    pub fn read_record(&mut self) -> MapResult<Option<Vec<String>>> {
        self.ensure_header()?;
        self.parse_record()
    }

    /// Next data record paired with the header names.
    ///
    /// Fails with `ColumnMismatch` when the record is ragged.
    pub fn read_pairs(&mut self) -> MapResult<Option<Vec<(String, String)>>> {
        self.ensure_header()?;
        let line = self.line;
        let Some(record) = self.parse_record()? else {
            return Ok(None);
        };
        let headers = self
            .headers
            .as_ref()
            .ok_or_else(|| MapError::configuration("read_pairs requires a header record"))?;
        if headers.len() != record.len() {
            return Err(MapError::ColumnMismatch {
                row: line,
                expected: headers.len(),
                found: record.len(),
            });
        }
        Ok(Some(headers.iter().cloned().zip(record).collect()))
    }

    fn ensure_header(&mut self) -> MapResult<()> {
        if self.options.has_header && !self.header_read {
            self.header_read = true;
            self.headers = self.parse_record()?;
        }
        Ok(())
    }

    fn parse_record(&mut self) -> MapResult<Option<Vec<String>>> {
        let DelimitedOptions {
            delimiter,
            quote,
            trim,
            ..
        } = self.options;
        let start_line = self.line;

        let mut fields = Vec::new();
        let mut field = String::new();
        let mut quoted = false;
        let mut state = State::FieldStart;

        loop {
            let Some(ch) = self.next_char()? else {
                if state == State::Quoted {
                    return Err(MapError::parse(start_line, "unterminated quoted field"));
                }
                if fields.is_empty() && field.is_empty() && state == State::FieldStart {
                    return Ok(None);
                }
                fields.push(finish(field, quoted, trim));
                return Ok(Some(fields));
            };

            match state {
                State::FieldStart | State::Unquoted => {
                    if ch == delimiter {
                        fields.push(finish(std::mem::take(&mut field), quoted, trim));
                        quoted = false;
                        state = State::FieldStart;
                    } else if ch == '\n' || ch == '\r' {
                        self.end_line(ch)?;
                        if fields.is_empty() && field.is_empty() && state == State::FieldStart {
                            // blank line
                            continue;
                        }
                        fields.push(finish(field, quoted, trim));
                        return Ok(Some(fields));
                    } else if ch == quote && state == State::FieldStart {
                        quoted = true;
                        field.clear();
                        state = State::Quoted;
                    } else if state == State::FieldStart && trim && ch.is_whitespace() {
                        field.push(ch);
                    } else {
                        field.push(ch);
                        state = State::Unquoted;
                    }
                }
                State::Quoted => {
                    if ch == quote {
                        state = State::QuoteInQuoted;
                    } else {
                        if ch == '\n' || (ch == '\r' && self.peek_char()? != Some('\n')) {
                            self.line += 1;
                        }
                        field.push(ch);
                    }
                }
                State::QuoteInQuoted => {
                    if ch == quote {
                        field.push(quote);
                        state = State::Quoted;
                    } else if ch == delimiter {
                        fields.push(finish(std::mem::take(&mut field), quoted, trim));
                        quoted = false;
                        state = State::FieldStart;
                    } else if ch == '\n' || ch == '\r' {
                        self.end_line(ch)?;
                        fields.push(finish(field, quoted, trim));
                        return Ok(Some(fields));
                    } else if trim && ch.is_whitespace() {
                        // trailing blanks after the closing quote
                    } else {
                        return Err(MapError::parse(
                            self.line,
                            format!("unexpected '{ch}' after closing quote"),
                        ));
                    }
                }
            }
        }
    }

    /// Count a line break, folding CRLF into one.
    fn end_line(&mut self, ch: char) -> MapResult<()> {
        if ch == '\r' && self.peek_char()? == Some('\n') {
            self.next_char()?;
        }
        self.line += 1;
        Ok(())
    }

    fn fill(&mut self) -> MapResult<bool> {
        if self.pos < self.buffer.len() {
            return Ok(true);
        }
        self.buffer.clear();
        self.pos = 0;
        Ok(self.reader.read_line(&mut self.buffer)? > 0)
    }

    fn peek_char(&mut self) -> MapResult<Option<char>> {
        if !self.fill()? {
            return Ok(None);
        }
        Ok(self.buffer[self.pos..].chars().next())
    }

    fn next_char(&mut self) -> MapResult<Option<char>> {
        let ch = self.peek_char()?;
        if let Some(ch) = ch {
            self.pos += ch.len_utf8();
        }
        Ok(ch)
    }
}

fn finish(field: String, quoted: bool, trim: bool) -> String {
    if trim && !quoted {
        field.trim().to_string()
    } else {
        field
    }
}

impl<R: BufRead> Iterator for DelimitedReader<R> {
    type Item = MapResult<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}
