use crate::compiler::error::CompileError;

/// Every token kind of the Whacky language.
///
/// Keywords map to distinct kinds; identifiers and literals carry a lexeme in
/// [`Token::lexeme`]. The boolean keywords `yep` / `nope` are emitted as
/// [`TokenKind::BoolLit`] carrying `"1"` / `"0"`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    // Literals
    Ident,
    IntLit,
    StringLit,
    BoolLit,

    // Punctuation
    Semi,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Comma,
    Dot,
    Colon,
    Eq,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    EqEq,
    Neq,
    Le,
    Ge,
    Lt,
    Gt,
    And,
    Or,
    Band,
    Bor,
    Xor,

    // Type keywords
    Number,
    Str,
    Bool,
    Nothin,

    // Statement / expression keywords
    Bye,
    Gimme,
    Gimmeback,
    Thingy,
    Maybe,
    But,
    Nah,
    KeepGoing,
    RoundAndRound,
    In,
    Yell,
}

/// A single token: kind, 1-based source position of its first byte, and the
/// lexeme for identifiers and literals.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
    pub lexeme: Option<String>,
}

impl Token {
    fn new(kind: TokenKind, line: usize, col: usize) -> Self {
        Self {
            kind,
            line,
            col,
            lexeme: None,
        }
    }

    fn with_lexeme(kind: TokenKind, line: usize, col: usize, lexeme: String) -> Self {
        Self {
            kind,
            line,
            col,
            lexeme: Some(lexeme),
        }
    }
}

/// Maps a scanned word against the keyword table; identifiers fall through.
///
/// `yep` and `nope` are handled by the caller because they carry a lexeme.
fn keyword(word: &str) -> Option<TokenKind> {
    match word {
        "bye" => Some(TokenKind::Bye),
        "gimme" => Some(TokenKind::Gimme),
        "gimmeback" => Some(TokenKind::Gimmeback),
        "thingy" => Some(TokenKind::Thingy),
        "maybe" => Some(TokenKind::Maybe),
        "but" => Some(TokenKind::But),
        "nah" => Some(TokenKind::Nah),
        "keepgoing" => Some(TokenKind::KeepGoing),
        "roundandround" => Some(TokenKind::RoundAndRound),
        "in" => Some(TokenKind::In),
        "yell" => Some(TokenKind::Yell),
        "and" => Some(TokenKind::And),
        "or" => Some(TokenKind::Or),
        "band" => Some(TokenKind::Band),
        "bor" => Some(TokenKind::Bor),
        "xor" => Some(TokenKind::Xor),
        "number" => Some(TokenKind::Number),
        "str" => Some(TokenKind::Str),
        "bool" => Some(TokenKind::Bool),
        "nothin" => Some(TokenKind::Nothin),
        _ => None,
    }
}

struct Lexer<'src> {
    src: &'src [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            src: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    /// Consumes one byte, advancing the line/column counters.
    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(byte)
    }

    fn error(&self, message: impl Into<String>, line: usize, col: usize) -> CompileError {
        CompileError::tokenize(message, line, col)
    }

    fn tokenize(mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();

        while let Some(byte) = self.peek() {
            let (line, col) = (self.line, self.col);

            match byte {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.bump();
                }
                b'A'..=b'Z' | b'a'..=b'z' => {
                    let word = self.scan_word();
                    let token = if word == "yep" {
                        Token::with_lexeme(TokenKind::BoolLit, line, col, "1".to_string())
                    } else if word == "nope" {
                        Token::with_lexeme(TokenKind::BoolLit, line, col, "0".to_string())
                    } else if let Some(kind) = keyword(&word) {
                        Token::new(kind, line, col)
                    } else {
                        Token::with_lexeme(TokenKind::Ident, line, col, word)
                    };
                    tokens.push(token);
                }
                b'0'..=b'9' => {
                    let mut digits = String::new();
                    while let Some(d @ b'0'..=b'9') = self.peek() {
                        digits.push(d as char);
                        self.bump();
                    }
                    tokens.push(Token::with_lexeme(TokenKind::IntLit, line, col, digits));
                }
                b'"' => {
                    let contents = self.scan_string(line, col)?;
                    tokens.push(Token::with_lexeme(TokenKind::StringLit, line, col, contents));
                }
                b'/' => match self.peek_at(1) {
                    Some(b'/') => self.skip_line_comment(),
                    Some(b'*') => self.skip_block_comment(line, col)?,
                    _ => {
                        self.bump();
                        tokens.push(Token::new(TokenKind::Slash, line, col));
                    }
                },
                b'=' => {
                    self.bump();
                    if self.peek() == Some(b'=') {
                        self.bump();
                        tokens.push(Token::new(TokenKind::EqEq, line, col));
                    } else {
                        tokens.push(Token::new(TokenKind::Eq, line, col));
                    }
                }
                b'!' => {
                    self.bump();
                    if self.peek() == Some(b'=') {
                        self.bump();
                        tokens.push(Token::new(TokenKind::Neq, line, col));
                    } else {
                        return Err(self.error("Unrecognised character '!'", line, col));
                    }
                }
                b'<' => {
                    self.bump();
                    if self.peek() == Some(b'=') {
                        self.bump();
                        tokens.push(Token::new(TokenKind::Le, line, col));
                    } else {
                        tokens.push(Token::new(TokenKind::Lt, line, col));
                    }
                }
                b'>' => {
                    self.bump();
                    if self.peek() == Some(b'=') {
                        self.bump();
                        tokens.push(Token::new(TokenKind::Ge, line, col));
                    } else {
                        tokens.push(Token::new(TokenKind::Gt, line, col));
                    }
                }
                b'+' => {
                    self.bump();
                    tokens.push(Token::new(TokenKind::Plus, line, col));
                }
                b'-' => {
                    self.bump();
                    tokens.push(Token::new(TokenKind::Minus, line, col));
                }
                b'*' => {
                    self.bump();
                    tokens.push(Token::new(TokenKind::Star, line, col));
                }
                b';' => {
                    self.bump();
                    tokens.push(Token::new(TokenKind::Semi, line, col));
                }
                b'(' => {
                    self.bump();
                    tokens.push(Token::new(TokenKind::OpenParen, line, col));
                }
                b')' => {
                    self.bump();
                    tokens.push(Token::new(TokenKind::CloseParen, line, col));
                }
                b'{' => {
                    self.bump();
                    tokens.push(Token::new(TokenKind::OpenBrace, line, col));
                }
                b'}' => {
                    self.bump();
                    tokens.push(Token::new(TokenKind::CloseBrace, line, col));
                }
                b',' => {
                    self.bump();
                    tokens.push(Token::new(TokenKind::Comma, line, col));
                }
                b'.' => {
                    self.bump();
                    tokens.push(Token::new(TokenKind::Dot, line, col));
                }
                b':' => {
                    self.bump();
                    tokens.push(Token::new(TokenKind::Colon, line, col));
                }
                other => {
                    return Err(self.error(
                        format!("Unrecognised character '{}'", other as char),
                        line,
                        col,
                    ));
                }
            }
        }

        Ok(tokens)
    }

    /// Scans `[A-Za-z][A-Za-z0-9]*` starting at the current byte.
    fn scan_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(byte) = self.peek() {
            if byte.is_ascii_alphanumeric() {
                word.push(byte as char);
                self.bump();
            } else {
                break;
            }
        }
        word
    }

    /// Scans a string literal body up to the next unescaped `"`.
    ///
    /// Escape sequences are kept verbatim (backslash included); they are
    /// expanded into byte lists only when the literal is emitted into the
    /// `.data` section.
    fn scan_string(&mut self, line: usize, col: usize) -> Result<String, CompileError> {
        self.bump(); // opening quote
        let mut contents = String::new();

        loop {
            match self.bump() {
                Some(b'"') => return Ok(contents),
                Some(b'\\') => {
                    contents.push('\\');
                    match self.bump() {
                        Some(escaped) => contents.push(escaped as char),
                        None => {
                            return Err(self.error("Unterminated string literal", line, col));
                        }
                    }
                }
                Some(byte) => contents.push(byte as char),
                None => return Err(self.error("Unterminated string literal", line, col)),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(byte) = self.peek() {
            if byte == b'\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self, line: usize, col: usize) -> Result<(), CompileError> {
        self.bump(); // '/'
        self.bump(); // '*'
        loop {
            match self.bump() {
                Some(b'*') if self.peek() == Some(b'/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(self.error("Unterminated block comment", line, col)),
            }
        }
    }
}

/// Turns Whacky source text into its token stream.
///
/// # Arguments
///
/// * `source` - The raw source code.
///
/// # Returns
///
/// The tokens in source order, or the first [`CompileError`] encountered.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    Lexer::new(source).tokenize()
}
