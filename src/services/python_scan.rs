//! Line-oriented recognizer for top-level Python statements.
//!
//! This is not a parser. It tracks just enough lexical state (string
//! literals, bracket nesting, backslash continuations, indentation) to know
//! where each top-level statement starts and ends, and whether it is an
//! `import`/`from` statement.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Import,
    Other,
}

/// Line span of one top-level statement, 0-based and inclusive.
/// Indented bodies of compound statements belong to the statement that opens them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelStatement {
    pub kind: StatementKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    /// 1-based.
    pub line: usize,
    pub message: String,
}

impl ScanError {
    fn at(line_index: usize, message: impl Into<String>) -> Self {
        Self {
            line: line_index + 1,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Literal {
    Single(char),
    Triple(char),
}

#[derive(Default)]
struct Lexer {
    brackets: Vec<(char, usize)>,
    literal: Option<(Literal, usize)>,
    continuation: bool,
}

impl Lexer {
    fn neutral(&self) -> bool {
        self.brackets.is_empty() && self.literal.is_none() && !self.continuation
    }

    fn feed(&mut self, index: usize, line: &str) -> Result<(), ScanError> {
        let chars: Vec<char> = line.chars().collect();
        let n = chars.len();
        let mut j = 0;
        let mut escaped_eol = false;
        self.continuation = false;

        while j < n {
            let c = chars[j];
            match self.literal {
                Some((Literal::Triple(q), _)) => {
                    if c == '\\' {
                        j += 2;
                    } else if c == q && j + 2 < n && chars[j + 1] == q && chars[j + 2] == q {
                        self.literal = None;
                        j += 3;
                    } else {
                        j += 1;
                    }
                }
                Some((Literal::Single(q), _)) => {
                    if c == '\\' {
                        if j + 1 == n {
                            escaped_eol = true;
                        }
                        j += 2;
                    } else if c == q {
                        self.literal = None;
                        j += 1;
                    } else {
                        j += 1;
                    }
                }
                None => {
                    match c {
                        '#' => break,
                        '"' | '\'' => {
                            if j + 2 < n && chars[j + 1] == c && chars[j + 2] == c {
                                self.literal = Some((Literal::Triple(c), index));
                                j += 3;
                                continue;
                            }
                            self.literal = Some((Literal::Single(c), index));
                        }
                        '(' | '[' | '{' => self.brackets.push((c, index)),
                        ')' | ']' | '}' => {
                            let expected = match c {
                                ')' => '(',
                                ']' => '[',
                                _ => '{',
                            };
                            match self.brackets.pop() {
                                Some((open, _)) if open == expected => {}
                                Some((open, _)) => {
                                    return Err(ScanError::at(
                                        index,
                                        format!("closing '{}' does not match '{}'", c, open),
                                    ))
                                }
                                None => {
                                    return Err(ScanError::at(index, format!("unmatched '{}'", c)))
                                }
                            }
                        }
                        '\\' if j + 1 == n => self.continuation = true,
                        _ => {}
                    }
                    j += 1;
                }
            }
        }

        if let Some((Literal::Single(_), _)) = self.literal {
            if !escaped_eol {
                return Err(ScanError::at(index, "unterminated string literal"));
            }
        }
        Ok(())
    }

    fn finish(&self, line_count: usize) -> Result<(), ScanError> {
        if let Some((_, start)) = self.literal {
            return Err(ScanError::at(start, "unterminated triple-quoted string"));
        }
        if let Some((open, start)) = self.brackets.last() {
            return Err(ScanError::at(*start, format!("'{}' was never closed", open)));
        }
        if self.continuation {
            return Err(ScanError::at(
                line_count.saturating_sub(1),
                "unexpected end of file after line continuation",
            ));
        }
        Ok(())
    }
}

fn classify(code: &str) -> StatementKind {
    let word: String = code
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    match word.as_str() {
        "import" | "from" => StatementKind::Import,
        _ => StatementKind::Other,
    }
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Splits `source` into lines that keep their terminators.
pub fn source_lines(source: &str) -> Vec<&str> {
    source.split_inclusive('\n').collect()
}

pub fn scan(source: &str) -> Result<Vec<TopLevelStatement>, ScanError> {
    let lines = source_lines(source);
    let mut lexer = Lexer::default();
    let mut statements: Vec<TopLevelStatement> = Vec::new();

    for (i, raw) in lines.iter().enumerate() {
        let mut line = strip_terminator(raw);
        if i == 0 {
            line = line.strip_prefix('\u{feff}').unwrap_or(line);
        }

        if lexer.neutral() {
            let code = line.trim_start_matches([' ', '\t', '\x0c']);
            if code.is_empty() || code.starts_with('#') {
                continue;
            }
            if code.len() == line.len() {
                statements.push(TopLevelStatement {
                    kind: classify(code),
                    start: i,
                    end: i,
                });
            } else if statements.is_empty() {
                return Err(ScanError::at(i, "unexpected indent"));
            }
        }

        lexer.feed(i, line)?;
        if let Some(last) = statements.last_mut() {
            last.end = i;
        }
    }

    lexer.finish(lines.len())?;
    Ok(statements)
}

/// Line index just past the last top-level import, or 0 when there is none.
pub fn insertion_line(statements: &[TopLevelStatement]) -> usize {
    statements
        .iter()
        .filter(|s| s.kind == StatementKind::Import)
        .map(|s| s.end + 1)
        .last()
        .unwrap_or(0)
}

/// Physical lines holding code (outside comments), 0-based, for lines that
/// call `name(`. Used by the report inventory.
pub fn call_lines(source: &str, name: &str) -> Vec<usize> {
    let needle = format!("{}(", name);
    source_lines(source)
        .iter()
        .enumerate()
        .filter(|(_, l)| {
            let code = strip_terminator(l);
            let code = code.split('#').next().unwrap_or("");
            code.contains(&needle)
        })
        .map(|(i, _)| i)
        .collect()
}
