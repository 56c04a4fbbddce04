// ABOUTME: Syntax highlighter for the REPL with color support
// Implements rustyline's Highlighter trait to provide ANSI color codes
// for OCR-script syntax elements while preserving display width

use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::borrow::Cow;
use std::collections::HashSet;

// ANSI color codes (3-bit/4-bit colors for maximum terminal compatibility)
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_PARENS: &str = "\x1b[1;34m"; // Bold blue
const COLOR_KEYWORD: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_BUILTIN: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_LITERAL: &str = "\x1b[33m"; // Yellow
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)

/// Main highlighter helper for the REPL.
pub struct OcrHelper;

impl OcrHelper {
    pub fn new() -> Self {
        OcrHelper
    }
}

impl Default for OcrHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for OcrHelper {}

impl Completer for OcrHelper {
    type Candidate = String;
}

impl Hinter for OcrHelper {
    type Hint = String;
}

impl Validator for OcrHelper {}

impl Highlighter for OcrHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let keywords = get_keywords();
        let builtins = get_builtins();

        let highlighted = highlight_line(line, &keywords, &builtins);
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

/// Tokenize a line and apply syntax highlighting.
fn highlight_line(
    line: &str,
    keywords: &HashSet<&'static str>,
    builtins: &HashSet<&'static str>,
) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            // Comments: // to end of line
            '/' if i + 1 < chars.len() && chars[i + 1] == '/' => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() && chars[i] != '\n' {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            // Strings: preserve exact content but colorize
            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;
                while i < chars.len() {
                    if chars[i] == '"' {
                        result.push('"');
                        i += 1;
                        break;
                    }
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            // Numbers: integer and decimal forms
            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let number: String = chars[start..i].iter().collect();
                result.push_str(COLOR_NUMBER);
                result.push_str(&number);
                result.push_str(COLOR_RESET);
            }

            // Parentheses and brackets
            '(' | ')' | '[' | ']' => {
                result.push_str(COLOR_PARENS);
                result.push(chars[i]);
                i += 1;
                result.push_str(COLOR_RESET);
            }

            // Identifiers and keywords
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();

                if matches!(word.as_str(), "nil" | "true" | "false") {
                    result.push_str(COLOR_LITERAL);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if keywords.contains(word.as_str()) {
                    result.push_str(COLOR_KEYWORD);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if builtins.contains(word.as_str()) {
                    result.push_str(COLOR_BUILTIN);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&word);
                }
            }

            // Everything else (operators, whitespace) passes through
            _ => {
                result.push(chars[i]);
                i += 1;
            }
        }
    }

    result
}

/// Reserved words with special parse or evaluation behaviour.
fn get_keywords() -> HashSet<&'static str> {
    [
        "global",
        "for",
        "to",
        "next",
        "while",
        "endwhile",
        "do",
        "until",
        "if",
        "then",
        "elseif",
        "else",
        "endif",
        "switch",
        "case",
        "default",
        "endswitch",
        "AND",
        "OR",
        "NOT",
        "MOD",
        "DIV",
        "function",
        "return",
        "endfunction",
        "procedure",
        "endprocedure",
        "byVal",
        "byRef",
        "class",
        "endclass",
        "inherits",
        "public",
        "private",
        "super",
        "self",
        "new",
        "array",
    ]
    .iter()
    .copied()
    .collect()
}

/// The native library bound into the global scope.
fn get_builtins() -> HashSet<&'static str> {
    ["print", "typeof", "bool", "string", "float", "int"]
        .iter()
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlight(line: &str) -> String {
        highlight_line(line, &get_keywords(), &get_builtins())
    }

    #[test]
    fn test_number_highlighting() {
        assert!(highlight("42").contains(COLOR_NUMBER));
        assert!(highlight("3.14").contains(COLOR_NUMBER));
    }

    #[test]
    fn test_string_highlighting() {
        assert!(highlight("\"hello\"").contains(COLOR_STRING));
    }

    #[test]
    fn test_comment_highlighting() {
        assert!(highlight("// a comment").contains(COLOR_COMMENT));
    }

    #[test]
    fn test_keyword_highlighting() {
        let highlighted = highlight("for i = 0 to 3");
        assert!(highlighted.contains(COLOR_KEYWORD));
        // Casing is strict, so 'FOR' stays plain
        assert!(!highlight("FOR").contains(COLOR_KEYWORD));
    }

    #[test]
    fn test_builtin_highlighting() {
        let highlighted = highlight("print(x)");
        assert!(highlighted.contains(COLOR_BUILTIN));
        assert!(highlighted.contains(COLOR_PARENS));
    }

    #[test]
    fn test_literal_highlighting() {
        assert!(highlight("nil").contains(COLOR_LITERAL));
        assert!(highlight("true").contains(COLOR_LITERAL));
    }

    #[test]
    fn test_plain_identifiers_untouched() {
        assert_eq!(highlight("my_var"), "my_var");
    }
}
