// SQLステートメント分割
//
// スキーマスクリプトを個別のステートメントに分割します。
// セミコロン区切りでは、クォート（' " ` [ ]）、PostgreSQLドル引用符、
// コメント（`--` / `/* */`）内のセミコロンを区切りとして扱いません。
// 空行区切りは旧形式のスクリプト向けで、空行だけを境界とみなします。

use serde::{Deserialize, Serialize};

/// ステートメントの区切り方
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementDelimiter {
    /// `;` で区切る
    #[default]
    Semicolon,
    /// 空行で区切る（各断片の末尾の `;` は取り除く）
    BlankLine,
}

/// SQL文字列を個別のステートメントに分割
///
/// 空白のみ、またはコメントのみの断片は破棄します。
///
/// # Arguments
///
/// * `sql` - 分割するSQL文字列
/// * `delimiter` - 区切り方
///
/// # Returns
///
/// 前後の空白をトリムしたステートメントのベクター
pub fn split_statements(sql: &str, delimiter: StatementDelimiter) -> Vec<String> {
    let mut splitter = Splitter::new(sql, delimiter);
    splitter.run();
    splitter.statements
}

/// 走査中の状態
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    Normal,
    /// 閉じ文字を保持（' " ` ]）
    Quoted(char),
    DollarQuoted(String),
    LineComment,
    /// ネスト深さを保持
    BlockComment(u32),
}

struct Splitter<'a> {
    sql: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    delimiter: StatementDelimiter,
    state: ScanState,
    current: String,
    /// 現在の断片にコメント以外の文字があるか
    has_content: bool,
    statements: Vec<String>,
}

impl<'a> Splitter<'a> {
    fn new(sql: &'a str, delimiter: StatementDelimiter) -> Self {
        Self {
            sql,
            chars: sql.char_indices().collect(),
            pos: 0,
            delimiter,
            state: ScanState::Normal,
            current: String::new(),
            has_content: false,
            statements: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).map(|(_, c)| *c)
    }

    fn take(&mut self, count: usize) {
        for _ in 0..count {
            if let Some((_, c)) = self.chars.get(self.pos) {
                self.current.push(*c);
                self.pos += 1;
            }
        }
    }

    fn run(&mut self) {
        while let Some(c) = self.peek(0) {
            match self.state.clone() {
                ScanState::Normal => self.scan_normal(c),
                ScanState::Quoted(close) => {
                    if c == close {
                        if self.peek(1) == Some(close) {
                            // 閉じ文字の二重化はエスケープ
                            self.take(2);
                            continue;
                        }
                        self.state = ScanState::Normal;
                    }
                    self.take(1);
                }
                ScanState::DollarQuoted(tag) => {
                    let byte_pos = self.chars[self.pos].0;
                    if c == '$' && self.sql[byte_pos..].starts_with(tag.as_str()) {
                        self.take(tag.chars().count());
                        self.state = ScanState::Normal;
                    } else {
                        self.take(1);
                    }
                }
                ScanState::LineComment => {
                    if c == '\n' {
                        self.state = ScanState::Normal;
                        // 行コメント直後の空行も区切りになる
                        continue;
                    }
                    self.take(1);
                }
                ScanState::BlockComment(depth) => {
                    if c == '/' && self.peek(1) == Some('*') {
                        self.state = ScanState::BlockComment(depth + 1);
                        self.take(2);
                    } else if c == '*' && self.peek(1) == Some('/') {
                        self.state = if depth == 1 {
                            ScanState::Normal
                        } else {
                            ScanState::BlockComment(depth - 1)
                        };
                        self.take(2);
                    } else {
                        self.take(1);
                    }
                }
            }
        }

        self.flush();
    }

    fn scan_normal(&mut self, c: char) {
        match c {
            '\'' | '"' | '`' => self.open_quote(c),
            '[' => self.open_quote(']'),
            '-' if self.peek(1) == Some('-') => {
                self.state = ScanState::LineComment;
                self.take(2);
            }
            '/' if self.peek(1) == Some('*') => {
                self.state = ScanState::BlockComment(1);
                self.take(2);
            }
            '$' => self.try_dollar_quote(),
            ';' if self.delimiter == StatementDelimiter::Semicolon => {
                self.pos += 1;
                self.flush();
            }
            '\n' if self.delimiter == StatementDelimiter::BlankLine => {
                match self.blank_line_end() {
                    Some(next) => {
                        self.pos = next;
                        self.flush();
                    }
                    None => self.take(1),
                }
            }
            _ => {
                if !c.is_whitespace() {
                    self.has_content = true;
                }
                self.take(1);
            }
        }
    }

    fn open_quote(&mut self, close: char) {
        self.state = ScanState::Quoted(close);
        self.has_content = true;
        self.take(1);
    }

    /// 現在位置の改行の後に空白だけの行が続く場合、その行末の次の位置を返す
    fn blank_line_end(&self) -> Option<usize> {
        let mut i = self.pos + 1;
        while let Some((_, c)) = self.chars.get(i) {
            match c {
                '\n' => return Some(i + 1),
                ' ' | '\t' | '\r' => i += 1,
                _ => return None,
            }
        }
        None
    }

    /// `$tag$` であればドル引用符を開始し、そうでなければ `$` を1文字として扱う
    fn try_dollar_quote(&mut self) {
        let byte_pos = self.chars[self.pos].0;
        let rest = &self.sql[byte_pos + 1..];
        if let Some(end) = rest.find('$') {
            let inner = &rest[..end];
            if inner.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
                let tag = format!("${}$", inner);
                self.has_content = true;
                self.take(tag.chars().count());
                self.state = ScanState::DollarQuoted(tag);
                return;
            }
        }
        self.has_content = true;
        self.take(1);
    }

    fn flush(&mut self) {
        let mut statement = self.current.trim();
        if self.delimiter == StatementDelimiter::BlankLine {
            statement = statement.strip_suffix(';').unwrap_or(statement).trim_end();
        }

        if self.has_content && !statement.is_empty() {
            self.statements.push(statement.to_string());
        }

        self.current.clear();
        self.has_content = false;
    }
}
