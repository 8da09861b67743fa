use logos::Logos;

use crate::{error::SchemeError, value::Value};

fn unescape<'s>(lex: &mut logos::Lexer<'s, Token<'s>>) -> Option<String> {
    let slice = lex.slice();
    let mut text = String::with_capacity(slice.len());
    let mut chars = slice[1..slice.len() - 1].chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        text.push(match chars.next()? {
            'n' => '\n',
            't' => '\t',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            _ => return None,
        });
    }

    Some(text)
}

#[derive(Debug, Logos, PartialEq)]
#[logos(skip r"([ \t\r\n\f]+|;[^\n]*)")]
enum Token<'a> {
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("'")]
    Quote,

    #[token(".")]
    Dot,

    #[regex("#[tTfF]", |lex| Some(matches!(lex.slice(), "#t" | "#T")))]
    Boolean(bool),

    #[regex(r"[+-]?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r"[+-]?(([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+)", |lex| lex.slice().parse::<f64>().ok())]
    Double(f64),

    #[regex(r#""([^"\\]|\\.)*""#, unescape)]
    String(String),

    #[regex(r"[A-Za-z!$%&*/:<=>?~_^][A-Za-z0-9!$%&*/:<=>?~_^.+-]*", |lex| lex.slice())]
    #[regex(r"[+-]", |lex| lex.slice())]
    Symbol(&'a str),
}

type ParseResult<O> = Result<O, SchemeError>;

impl Token<'_> {
    fn is_number(&self) -> bool {
        matches!(self, Token::Integer(_) | Token::Double(_))
    }

    fn is_atom(&self) -> bool {
        !matches!(self, Token::LeftParen | Token::RightParen | Token::Quote)
    }
}

fn lexer(input: &str) -> ParseResult<Vec<Token<'_>>> {
    let mut tokens: Vec<Token<'_>> = vec![];
    let mut tokenizer = Token::lexer(input);
    let mut previous_span = 0..0;

    while let Some(result) = tokenizer.next() {
        let span = tokenizer.span();
        let token = result.map_err(|_| SchemeError::Syntax(format!("Illegal token `{}`.", tokenizer.slice())))?;

        // A number must be followed by a delimiter, so `1x` is not read as `1 x`
        let touches_number = previous_span.end == span.start
            && tokens.last().is_some_and(Token::is_number);
        if touches_number && token.is_atom() {
            return Err(SchemeError::Syntax(format!("Illegal token `{}`.", &input[previous_span.start..span.end])))
        }

        previous_span = span;
        tokens.push(token);
    }

    Ok(tokens)
}

fn unmatched_open() -> SchemeError {
    SchemeError::Syntax("Unmatched Open Parenthesis.".to_owned())
}

fn unmatched_close() -> SchemeError {
    SchemeError::Syntax("Unmatched Close Parenthesis.".to_owned())
}

fn parse_atom<'a, 'b: 'a>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Value)> {
    let (token, tokens) = tokens.split_first().ok_or_else(unmatched_open)?;
    let value = match token {
        Token::Boolean(value) => Value::Bool(*value),
        Token::Integer(value) => Value::Int(*value),
        Token::Double(value) => Value::Double(*value),
        Token::String(value) => Value::string(value),
        Token::Symbol(name) => Value::symbol(name),
        Token::RightParen => return Err(unmatched_close()),
        Token::Dot => return Err(SchemeError::Syntax("Unexpected `.`.".to_owned())),
        Token::LeftParen | Token::Quote => unreachable!("handled by parse_datum"),
    };
    Ok((tokens, value))
}

fn parse_list<'a, 'b: 'a>(mut tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Value)> {
    // The opening parenthesis has already been consumed. Elements are collected until the
    // closing parenthesis, with an optional `. tail` right before it

    let mut elements = vec![];
    loop {
        match tokens.first() {
            None => return Err(unmatched_open()),
            Some(Token::RightParen) => return Ok((&tokens[1..], Value::list(elements))),
            Some(Token::Dot) if !elements.is_empty() => {
                let (rest, tail) = parse_datum(&tokens[1..])?;
                return match rest.first() {
                    Some(Token::RightParen) => Ok((&rest[1..], Value::list_with_tail(elements, tail))),
                    None => Err(unmatched_open()),
                    Some(_) => Err(SchemeError::Syntax("Expected `)` after the tail of a dotted list.".to_owned())),
                }
            }
            Some(_) => {
                let (rest, element) = parse_datum(tokens)?;
                elements.push(element);
                tokens = rest;
            }
        }
    }
}

fn parse_datum<'a, 'b: 'a>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Value)> {
    match tokens.first() {
        Some(Token::LeftParen) => parse_list(&tokens[1..]),
        Some(Token::Quote) => {
            let (tokens, quoted) = parse_datum(&tokens[1..])?;
            Ok((tokens, Value::list([Value::symbol("quote"), quoted])))
        }
        _ => parse_atom(tokens),
    }
}

/// Parses every top-level datum of `input` into one proper list.
pub fn parse(input: &str) -> ParseResult<Value> {
    let tokens = lexer(input)?;

    let mut data = vec![];
    let mut rest = tokens.as_slice();
    while !rest.is_empty() {
        let (remaining, datum) = parse_datum(rest)?;
        data.push(datum);
        rest = remaining;
    }

    Ok(Value::list(data))
}

/// Whether every opened parenthesis in `input` is closed, so a REPL knows to keep
/// reading lines. A surplus closing parenthesis is an error.
pub fn is_balanced(input: &str) -> ParseResult<bool> {
    let mut depth = 0usize;
    for token in lexer(input)? {
        match token {
            Token::LeftParen => depth += 1,
            Token::RightParen => depth = depth.checked_sub(1).ok_or_else(unmatched_close)?,
            _ => {}
        }
    }
    Ok(depth == 0)
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use crate::test_utils::{all_testcases, load_test_pair};

    use super::*;

    fn parse_one(input: &str) -> ParseResult<Value> {
        parse(input)?.car("parse")
    }

    #[test]
    fn atoms() -> anyhow::Result<()> {
        assert_eq!(parse_one("42")?, Value::Int(42));
        assert_eq!(parse_one("-7")?, Value::Int(-7));
        assert_eq!(parse_one("+7")?, Value::Int(7));
        assert_eq!(parse_one("1.5")?, Value::Double(1.5));
        assert_eq!(parse_one(".5")?, Value::Double(0.5));
        assert_eq!(parse_one("-2.")?, Value::Double(-2.0));
        assert_eq!(parse_one("#t")?, Value::Bool(true));
        assert_eq!(parse_one("#F")?, Value::Bool(false));
        assert_eq!(parse_one("set!")?, Value::symbol("set!"));
        assert_eq!(parse_one("let*")?, Value::symbol("let*"));
        assert_eq!(parse_one("<=")?, Value::symbol("<="));
        assert_eq!(parse_one("-")?, Value::symbol("-"));
        assert_eq!(parse_one("list->vector")?, Value::symbol("list->vector"));
        Ok(())
    }

    #[test]
    fn numbers_need_a_delimiter() -> anyhow::Result<()> {
        assert!(matches!(parse("1x"), Err(SchemeError::Syntax(_))));
        assert!(matches!(parse("1.5.5"), Err(SchemeError::Syntax(_))));
        assert!(matches!(parse("(+ 1-2)"), Err(SchemeError::Syntax(_))));
        assert!(matches!(parse("2\"s\""), Err(SchemeError::Syntax(_))));
        assert_eq!(parse("(1(2)3)")?.to_string(), "((1 (2) 3))");
        assert_eq!(parse("'1")?.to_string(), "((quote 1))");
        Ok(())
    }

    #[test]
    fn exponent_doubles() -> anyhow::Result<()> {
        assert_eq!(parse_one("1e20")?, Value::Double(1e20));
        assert_eq!(parse_one("-2.5E-3")?, Value::Double(-2.5e-3));
        assert_eq!(parse_one(".5e1")?, Value::Double(5.0));

        for value in [1e20, 1e-7, 3.0, -0.25, 123456789.125] {
            let rendered = Value::Double(value).to_string();
            assert_eq!(parse_one(&rendered)?, Value::Double(value), "{} did not read back", rendered);
        }
        Ok(())
    }

    #[test]
    fn strings_unescape() -> anyhow::Result<()> {
        assert_eq!(parse_one(r#""hello world""#)?, Value::string("hello world"));
        assert_eq!(parse_one(r#""a\nb\t\"c\"\\""#)?, Value::string("a\nb\t\"c\"\\"));
        assert!(matches!(parse(r#""bad \q escape""#), Err(SchemeError::Syntax(_))));
        assert!(matches!(parse(r#""unterminated"#), Err(SchemeError::Syntax(_))));
        Ok(())
    }

    #[test]
    fn lists_and_quotes() -> anyhow::Result<()> {
        assert_eq!(parse_one("(+ 1 (* 2 3))")?.to_string(), "(+ 1 (* 2 3))");
        assert_eq!(parse_one("()")?, Value::Null);
        assert_eq!(parse_one("'(1 2)")?.to_string(), "(quote (1 2))");
        assert_eq!(parse_one("''a")?.to_string(), "(quote (quote a))");
        assert_eq!(parse_one("(1 . 2)")?.to_string(), "(1 . 2)");
        assert_eq!(parse_one("(1 2 . (3))")?.to_string(), "(1 2 3)");
        Ok(())
    }

    #[test]
    fn top_level_sequence() -> anyhow::Result<()> {
        let program = parse("(define x 1) ; a comment\n x 'y")?;
        assert!(program.is_list());
        assert_eq!(program.length("parse")?, 3);
        assert_eq!(parse("")?, Value::Null);
        assert_eq!(parse("; only a comment")?, Value::Null);
        Ok(())
    }

    #[test]
    fn unbalanced_parentheses() {
        assert_eq!(parse("(1 2"), Err(unmatched_open()));
        assert_eq!(parse("1 2)"), Err(unmatched_close()));
        assert_eq!(parse("'"), Err(unmatched_open()));
        assert!(matches!(parse("(. 1)"), Err(SchemeError::Syntax(_))));
        assert!(matches!(parse("(1 . 2 3)"), Err(SchemeError::Syntax(_))));
        assert!(matches!(parse("[1]"), Err(SchemeError::Syntax(_))));
    }

    #[test]
    fn balance_check() -> anyhow::Result<()> {
        assert!(is_balanced("(define x 1)")?);
        assert!(!is_balanced("(define (f x)")?);
        assert!(is_balanced("\"(\"")?);
        assert!(is_balanced("; (")?);
        assert!(is_balanced("(a))").is_err());
        Ok(())
    }

    fn assert_can_parse(testcase: (usize, usize), input: String, expected_result: Result<String, String>) -> anyhow::Result<()> {
        let parse_result = parse(&input);
        match (parse_result, expected_result) {
            (Ok(result), Err(expected)) if expected == "Syntax"
                => bail!("Testcase {}:{} - Expected {:?} but got {:?}", testcase.0, testcase.1, expected, result),
            (Err(result), Ok(expected))
                => bail!("Testcase {}:{} - Expected {:?} but got {:?}", testcase.0, testcase.1, expected, result),
            (Err(result), Err(expected)) if result.kind() != "Syntax" || expected != "Syntax"
                => bail!("Testcase {}:{} - Expected {:?} but got {:?}", testcase.0, testcase.1, expected, result),
            _ => Ok(())
        }
    }

    #[test]
    fn parse_testcases() -> anyhow::Result<()> {
        for testcase in all_testcases() {
            println!("Running testcase {}", testcase);
            let entries = load_test_pair(testcase)?;

            for (lineno, (input, expected)) in entries.into_iter().enumerate() {
                assert_can_parse((testcase, lineno), input, expected.into())?;
            }
        }

        Ok(())
    }
}
