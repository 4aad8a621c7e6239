//! Lexical analysis for Symphony source text.
//!
//! Produces a flat token stream with 1-based line numbers. Literals are
//! lexed unsigned; a `+` or `-` in front of a number is always handed to
//! the parser as an operator token, which resolves the sign/operator
//! ambiguity of the grammar. Unexpected characters are reported and
//! skipped, they never abort lexing.

use tracing::warn;

/// Reserved function names, recognized as `SpecialId` tokens.
pub const SPECIAL_IDS: [&str; 22] = [
    "print",
    "println",
    "read",
    "sqrt",
    "log",
    "random",
    "little_star",
    "A",
    "B",
    "C",
    "D",
    "E",
    "F",
    "G",
    "concat",
    "length",
    "copy",
    "get",
    "to_str",
    "input",
    "floor",
    "ceil",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    IntVal,
    DecVal,
    CharVal,
    StrVal,
    BoolVal,
    // Type keywords
    Int,
    Dec,
    Char,
    Str,
    Bool,
    Void,
    // Control keywords
    If,
    Else,
    Elseif,
    While,
    Fun,
    Return,
    Break,
    Program,
    // Word operators
    Equals,
    Mod,
    And,
    Or,
    Not,
    // Multi-character operators
    Exponentiation,
    Increment,
    Decrement,
    GreaterEqual,
    LessEqual,
    // Single-character tokens
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Greater,
    Less,
    // Names
    Id,
    SpecialId,
}

/// A token with its raw text (literals hold their unquoted payload) and
/// the line it started on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
        }
    }
}

/// The lexer's output: tokens plus the diagnostics for characters it had
/// to skip.
#[derive(Debug)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<String>,
}

fn keyword_kind(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "int" => TokenKind::Int,
        "dec" => TokenKind::Dec,
        "char" => TokenKind::Char,
        "str" => TokenKind::Str,
        "bool" => TokenKind::Bool,
        "void" => TokenKind::Void,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "elseif" => TokenKind::Elseif,
        "while" => TokenKind::While,
        "fun" => TokenKind::Fun,
        "return" => TokenKind::Return,
        "break" => TokenKind::Break,
        "program" => TokenKind::Program,
        "equals" => TokenKind::Equals,
        "mod" => TokenKind::Mod,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "true" | "false" => TokenKind::BoolVal,
        _ => return None,
    };
    Some(kind)
}

/// Tokenize a whole source file.
pub fn tokenize(source: &str) -> TokenStream {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();
    let mut pos = 0;
    let mut line = 1;

    while pos < chars.len() {
        let c = chars[pos];

        // Whitespace
        if c == '\n' {
            line += 1;
            pos += 1;
            continue;
        }
        if c == ' ' || c == '\t' || c == '\r' {
            pos += 1;
            continue;
        }

        // Comments
        if c == '/' && chars.get(pos + 1) == Some(&'/') {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }
        if c == '/' && chars.get(pos + 1) == Some(&'*') {
            // Shortest match, no nesting; an unterminated comment swallows
            // the rest of the file.
            pos += 2;
            while pos < chars.len() {
                if chars[pos] == '*' && chars.get(pos + 1) == Some(&'/') {
                    pos += 2;
                    break;
                }
                if chars[pos] == '\n' {
                    line += 1;
                }
                pos += 1;
            }
            continue;
        }

        // Identifiers, keywords and reserved functions
        if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len()
                && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_')
            {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            let kind = if SPECIAL_IDS.contains(&word.as_str()) {
                TokenKind::SpecialId
            } else {
                keyword_kind(&word).unwrap_or(TokenKind::Id)
            };
            tokens.push(Token::new(kind, word, line));
            continue;
        }

        // Numbers: digits, optionally with a fraction; also `.9` style
        // decimals with no integer part.
        let starts_decimal =
            c == '.' && chars.get(pos + 1).is_some_and(|ch| ch.is_ascii_digit());
        if c.is_ascii_digit() || starts_decimal {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            let mut kind = TokenKind::IntVal;
            if chars.get(pos) == Some(&'.')
                && chars.get(pos + 1).is_some_and(|ch| ch.is_ascii_digit())
            {
                kind = TokenKind::DecVal;
                pos += 1;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
            let text: String = chars[start..pos].iter().collect();
            tokens.push(Token::new(kind, text, line));
            continue;
        }

        // Character literal: exactly one non-quote character
        if c == '\'' {
            if let Some(&payload) = chars.get(pos + 1)
                && payload != '\''
                && chars.get(pos + 2) == Some(&'\'')
            {
                tokens.push(Token::new(TokenKind::CharVal, payload.to_string(), line));
                if payload == '\n' {
                    line += 1;
                }
                pos += 3;
                continue;
            }
            skip_unexpected(&mut diagnostics, c, line);
            pos += 1;
            continue;
        }

        // String literal: a quote-free run between double quotes
        if c == '"' {
            let start_line = line;
            let mut cursor = pos + 1;
            let mut closed = false;
            while cursor < chars.len() {
                if chars[cursor] == '"' {
                    closed = true;
                    break;
                }
                if chars[cursor] == '\n' {
                    line += 1;
                }
                cursor += 1;
            }
            let payload: String = chars[pos + 1..cursor].iter().collect();
            if closed {
                tokens.push(Token::new(TokenKind::StrVal, payload, start_line));
                pos = cursor + 1;
            } else {
                diagnostics.push(format!(
                    "The system found an unclosed string starting on line {}, so \
                     please add the missing '\"' and correct it.",
                    start_line
                ));
                warn!(line = start_line, "unclosed string literal");
                pos = chars.len();
            }
            continue;
        }

        // Multi-character operators before their single-character prefixes
        let two: Option<(char, TokenKind)> = match c {
            '>' => Some(('=', TokenKind::GreaterEqual)),
            '<' => Some(('=', TokenKind::LessEqual)),
            '*' => Some(('*', TokenKind::Exponentiation)),
            '+' => Some(('+', TokenKind::Increment)),
            '-' => Some(('-', TokenKind::Decrement)),
            _ => None,
        };
        if let Some((second, kind)) = two
            && chars.get(pos + 1) == Some(&second)
        {
            let text: String = [c, second].iter().collect();
            tokens.push(Token::new(kind, text, line));
            pos += 2;
            continue;
        }

        let single = match c {
            ',' => Some(TokenKind::Comma),
            ';' => Some(TokenKind::Semicolon),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            '=' => Some(TokenKind::Assign),
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '>' => Some(TokenKind::Greater),
            '<' => Some(TokenKind::Less),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token::new(kind, c.to_string(), line));
            pos += 1;
            continue;
        }

        skip_unexpected(&mut diagnostics, c, line);
        pos += 1;
    }

    TokenStream {
        tokens,
        diagnostics,
    }
}

fn skip_unexpected(diagnostics: &mut Vec<String>, c: char, line: usize) {
    diagnostics.push(format!(
        "The system found a problem with how you wrote your program, so \
         please find the character sequence '{}' on line {} and correct it.",
        c, line
    ));
    warn!(character = %c, line, "skipped unexpected character");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_literals_and_operators() {
        let stream = tokenize(
            "int dec char str bool 12 4.75 .9 'a' \"hello\" true false void , ; ( ) \
             { } [ ] = + - * / ** ++ -- mod equals > < >= <= and or not fun while \
             if else elseif hello sqrt return program",
        );
        assert!(stream.diagnostics.is_empty());
        use TokenKind::*;
        assert_eq!(
            stream.tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                Int, Dec, Char, Str, Bool, IntVal, DecVal, DecVal, CharVal, StrVal, BoolVal,
                BoolVal, Void, Comma, Semicolon, LParen, RParen, LBrace, RBrace, LBracket,
                RBracket, Assign, Plus, Minus, Star, Slash, Exponentiation, Increment,
                Decrement, Mod, Equals, Greater, Less, GreaterEqual, LessEqual, And, Or, Not,
                Fun, While, If, Else, Elseif, Id, SpecialId, Return, Program
            ]
        );
    }

    #[test]
    fn test_literal_payloads_are_unquoted() {
        let stream = tokenize("'x' \"la la\" 4.75");
        assert_eq!(stream.tokens[0].text, "x");
        assert_eq!(stream.tokens[1].text, "la la");
        assert_eq!(stream.tokens[2].text, "4.75");
    }

    #[test]
    fn test_numbers_are_unsigned() {
        // `-1` is an operator token followed by a literal; the parser turns
        // it into a unary minus.
        let stream = tokenize("x-1");
        let kinds: Vec<TokenKind> = stream.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Id, TokenKind::Minus, TokenKind::IntVal]);
    }

    #[test]
    fn test_comments_are_skipped_and_lines_counted() {
        let stream = tokenize("// one line\n/* two\nlines */ x");
        assert_eq!(stream.tokens.len(), 1);
        assert_eq!(stream.tokens[0].line, 3);
    }

    #[test]
    fn test_unterminated_block_comment_swallows_the_rest() {
        let stream = tokenize("x /* no end\ny z");
        assert_eq!(stream.tokens.len(), 1);
        assert!(stream.diagnostics.is_empty());
    }

    #[test]
    fn test_unexpected_character_is_reported_and_skipped() {
        let stream = tokenize("x @ y");
        assert_eq!(kinds("x @ y"), vec![TokenKind::Id, TokenKind::Id]);
        assert_eq!(stream.diagnostics.len(), 1);
        assert!(stream.diagnostics[0].contains('@'));
        assert!(stream.diagnostics[0].contains("line 1"));
    }

    #[test]
    fn test_note_letters_are_special_ids() {
        let stream = tokenize("A G little_star to_str");
        assert!(stream.tokens.iter().all(|t| t.kind == TokenKind::SpecialId));
    }

    #[test]
    fn test_line_numbers_are_one_based_and_advance() {
        let stream = tokenize("a\nb\n\nc");
        let lines: Vec<usize> = stream.tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 4]);
    }
}
