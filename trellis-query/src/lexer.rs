use std::iter::Peekable;
use std::str::Chars;

/// Prefix marking a storage (physical) path.
pub const DB_PREFIX: &str = "db:";
/// Prefix marking an explicit object path; stripped by the lexer.
pub const OBJ_PREFIX: &str = "obj:";

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Keywords
    And,
    Or,
    Not,
    Like,
    LikeIgnoreCase,
    In,
    Between,

    // Symbols
    LeftParen,
    RightParen,
    Comma,

    // Operators
    Equals,
    NotEquals,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Plus,
    Dash,
    Asterisk,
    Divide,

    // Literals
    String(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Null,

    // References
    Path(String),
    Parameter(String), // $name

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        tokens.push(Token {
            token_type: TokenType::Eof,
            line: self.line,
            column: self.column,
        });
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, String> {
        self.skip_whitespace();

        let start_line = self.line;
        let start_column = self.column;
        let Some(char) = self.advance() else {
            return Ok(None);
        };

        if char == '\'' || char == '"' {
            return Ok(Some(self.read_string(char, start_line, start_column)?));
        }

        if char.is_ascii_digit() {
            return Ok(Some(self.read_number(char, start_line, start_column)?));
        }

        if char == '$' {
            return Ok(Some(self.read_parameter(start_line, start_column)?));
        }

        if char.is_alphabetic() || char == '_' {
            return Ok(Some(self.read_word(char, start_line, start_column)));
        }

        let token_type = match char {
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            ',' => TokenType::Comma,
            '+' => TokenType::Plus,
            '-' => TokenType::Dash,
            '*' => TokenType::Asterisk,
            '/' => TokenType::Divide,
            '=' => {
                if let Some(&'=') = self.chars.peek() {
                    self.advance();
                }
                TokenType::Equals
            }
            '<' => {
                if let Some(&'=') = self.chars.peek() {
                    self.advance();
                    TokenType::LessEqual
                } else if let Some(&'>') = self.chars.peek() {
                    self.advance();
                    TokenType::NotEquals
                } else {
                    TokenType::LessThan
                }
            }
            '>' => {
                if let Some(&'=') = self.chars.peek() {
                    self.advance();
                    TokenType::GreaterEqual
                } else {
                    TokenType::GreaterThan
                }
            }
            '!' => {
                if let Some(&'=') = self.chars.peek() {
                    self.advance();
                    TokenType::NotEquals
                } else {
                    TokenType::Not
                }
            }
            '&' => {
                if let Some(&'&') = self.chars.peek() {
                    self.advance();
                    TokenType::And
                } else {
                    return Err(format!(
                        "Unexpected character '&' at {start_line}:{start_column}"
                    ));
                }
            }
            '|' => {
                if let Some(&'|') = self.chars.peek() {
                    self.advance();
                    TokenType::Or
                } else {
                    return Err(format!(
                        "Unexpected character '|' at {start_line}:{start_column}"
                    ));
                }
            }
            _ => {
                return Err(format!(
                    "Unexpected character '{char}' at {start_line}:{start_column}"
                ));
            }
        };

        Ok(Some(Token {
            token_type,
            line: start_line,
            column: start_column,
        }))
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            self.position += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        char
    }

    fn skip_whitespace(&mut self) {
        while let Some(&char) = self.chars.peek() {
            if char.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self, quote: char, line: usize, column: usize) -> Result<Token, String> {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some(escaped) => value.push(escaped),
                    None => {
                        return Err(format!("Unterminated string starting at {line}:{column}"));
                    }
                },
                Some(c) => value.push(c),
                None => return Err(format!("Unterminated string starting at {line}:{column}")),
            }
        }
        Ok(Token {
            token_type: TokenType::String(value),
            line,
            column,
        })
    }

    fn read_number(&mut self, first: char, line: usize, column: usize) -> Result<Token, String> {
        let mut value = String::new();
        value.push(first);
        let mut has_dot = false;
        while let Some(&char) = self.chars.peek() {
            if char.is_ascii_digit() {
                value.push(char);
                self.advance();
            } else if char == '.' && !has_dot {
                // Only a digit after the dot makes this a decimal.
                let mut ahead = self.chars.clone();
                ahead.next();
                if !matches!(ahead.peek(), Some(c) if c.is_ascii_digit()) {
                    break;
                }
                has_dot = true;
                value.push(char);
                self.advance();
            } else {
                break;
            }
        }

        let token_type = if has_dot {
            TokenType::Decimal(
                value
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid number: {value}"))?,
            )
        } else {
            match value.parse::<i64>() {
                Ok(n) => TokenType::Integer(n),
                Err(_) => TokenType::Decimal(
                    value
                        .parse::<f64>()
                        .map_err(|_| format!("Invalid number: {value}"))?,
                ),
            }
        };
        Ok(Token {
            token_type,
            line,
            column,
        })
    }

    fn read_parameter(&mut self, line: usize, column: usize) -> Result<Token, String> {
        let mut value = String::new();
        while let Some(&char) = self.chars.peek() {
            if char.is_alphanumeric() || char == '_' {
                value.push(char);
                self.advance();
            } else {
                break;
            }
        }
        if value.is_empty() {
            return Err(format!("Empty parameter name at {line}:{column}"));
        }
        Ok(Token {
            token_type: TokenType::Parameter(value),
            line,
            column,
        })
    }

    fn read_path_chars(&mut self, value: &mut String) {
        while let Some(&char) = self.chars.peek() {
            if char.is_alphanumeric() || char == '_' || char == '.' {
                value.push(char);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self, first: char, line: usize, column: usize) -> Token {
        let mut value = String::new();
        value.push(first);
        self.read_path_chars(&mut value);

        // db:/obj: prefixed paths
        if let Some(&':') = self.chars.peek()
            && (value == "db" || value == "obj")
        {
            self.advance();
            let mut rest = String::new();
            self.read_path_chars(&mut rest);
            let path = if value == "db" {
                format!("{DB_PREFIX}{rest}")
            } else {
                rest
            };
            return Token {
                token_type: TokenType::Path(path),
                line,
                column,
            };
        }

        let token_type = if value.contains('.') {
            TokenType::Path(value)
        } else {
            match value.to_uppercase().as_str() {
                "AND" => TokenType::And,
                "OR" => TokenType::Or,
                "NOT" => TokenType::Not,
                "LIKE" => TokenType::Like,
                "LIKEIGNORECASE" => TokenType::LikeIgnoreCase,
                "IN" => TokenType::In,
                "BETWEEN" => TokenType::Between,
                "TRUE" => TokenType::Boolean(true),
                "FALSE" => TokenType::Boolean(false),
                "NULL" => TokenType::Null,
                _ => TokenType::Path(value),
            }
        };

        Token {
            token_type,
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(input: &str) -> Vec<TokenType> {
        Lexer::new(input)
            .tokenize()
            .expect("tokenize should succeed")
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn comparison_chain() {
        assert_eq!(
            types("cInt = 12345 and cVarchar = 'John Smith'"),
            vec![
                TokenType::Path("cInt".into()),
                TokenType::Equals,
                TokenType::Integer(12345),
                TokenType::And,
                TokenType::Path("cVarchar".into()),
                TokenType::Equals,
                TokenType::String("John Smith".into()),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn prefixed_and_dotted_paths() {
        assert_eq!(
            types("db:id=$i or obj:e5.name <> NULL"),
            vec![
                TokenType::Path("db:id".into()),
                TokenType::Equals,
                TokenType::Parameter("i".into()),
                TokenType::Or,
                TokenType::Path("e5.name".into()),
                TokenType::NotEquals,
                TokenType::Null,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn decimals_and_symbolic_operators() {
        assert_eq!(
            types("a >= 4.4009 && !(b != 2)"),
            vec![
                TokenType::Path("a".into()),
                TokenType::GreaterEqual,
                TokenType::Decimal(4.4009),
                TokenType::And,
                TokenType::Not,
                TokenType::LeftParen,
                TokenType::Path("b".into()),
                TokenType::NotEquals,
                TokenType::Integer(2),
                TokenType::RightParen,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(Lexer::new("name = 'abc").tokenize().is_err());
    }

    #[test]
    fn trailing_backslash_leaves_string_unterminated() {
        let err = Lexer::new("cVarchar = 'abc\\").tokenize().unwrap_err();
        assert_eq!(err, "Unterminated string starting at 1:12");
        assert_eq!(types(r"'a\'b'"), vec![TokenType::String("a'b".into())]);
    }

    #[test]
    fn stray_character_is_an_error() {
        let err = Lexer::new("a # b").tokenize().unwrap_err();
        assert_eq!(err, "Unexpected character '#' at 1:3");
    }
}
