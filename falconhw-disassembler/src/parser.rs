//! Literal array parser

use crate::error::{DisassemblerError, Result};
use crate::lexer::Token;
use falconhw_spec::ProgramKind;
use logos::Logos;
use std::ops::Range;

/// Parse a SystemVerilog instruction array, returning the array name and its
/// words
///
/// The element count must match the `localparam` it is declared with.
pub fn parse_literal_array(text: &str) -> Result<(String, Vec<u128>)> {
    let mut parser = Parser::new(text)?;

    parser.expect(Token::Localparam)?;
    parser.expect(Token::Int)?;
    let param = parser.identifier()?;
    parser.expect(Token::Equals)?;
    let declared = parser.number()?;
    parser.expect(Token::Semicolon)?;

    parser.expect(Token::Logic)?;
    parser.expect(Token::LBracket)?;
    let msb = parser.number()?;
    parser.expect(Token::Colon)?;
    let lsb = parser.number()?;
    if (msb, lsb) != (127, 0) {
        return Err(parser.error(format!("element width must be [127:0], found [{}:{}]", msb, lsb)));
    }
    parser.expect(Token::RBracket)?;
    let name = parser.identifier()?;
    parser.expect(Token::LBracket)?;
    let size = parser.identifier()?;
    if size != param {
        return Err(parser.error(format!("array sized by `{}`, expected `{}`", size, param)));
    }
    parser.expect(Token::RBracket)?;
    parser.expect(Token::Equals)?;
    parser.expect(Token::OpenList)?;

    let mut words = Vec::new();
    if !parser.eat(&Token::RBrace) {
        loop {
            words.push(parser.word()?);
            if parser.eat(&Token::RBrace) {
                break;
            }
            parser.expect(Token::Comma)?;
        }
    }
    parser.expect(Token::Semicolon)?;
    parser.finish()?;

    if words.len() != declared {
        return Err(DisassemblerError::CountMismatch {
            declared,
            found: words.len(),
        });
    }
    Ok((name, words))
}

/// Program kind named by an array such as `sign_instructions`
pub fn array_kind(name: &str) -> Option<ProgramKind> {
    name.strip_suffix("_instructions").and_then(ProgramKind::from_name)
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Result<Self> {
        let mut tokens = Vec::new();
        for (token, span) in Token::lexer(text).spanned() {
            match token {
                Ok(token) => tokens.push((token, span)),
                Err(()) => {
                    return Err(DisassemblerError::Syntax {
                        line: line_of(text, span.start),
                        message: format!("unexpected `{}`", &text[span]),
                    })
                }
            }
        }
        Ok(Self { text, tokens, pos: 0 })
    }

    fn line(&self) -> usize {
        match self.tokens.get(self.pos).or_else(|| self.tokens.last()) {
            Some((_, span)) => line_of(self.text, span.start),
            None => 1,
        }
    }

    fn error(&self, message: String) -> DisassemblerError {
        DisassemblerError::Syntax {
            line: self.line(),
            message,
        }
    }

    fn next(&mut self, expected: &str) -> Result<Token> {
        match self.tokens.get(self.pos) {
            Some((token, _)) => {
                self.pos += 1;
                Ok(token.clone())
            }
            None => Err(self.error(format!("expected {}, found end of input", expected))),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        let matches = matches!(self.tokens.get(self.pos), Some((t, _)) if t == token);
        if matches {
            self.pos += 1;
        }
        matches
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        let expected = token.describe();
        let found = self.next(&expected)?;
        if found == token {
            Ok(())
        } else {
            self.pos -= 1;
            Err(self.error(format!("expected {}, found {}", expected, found.describe())))
        }
    }

    fn identifier(&mut self) -> Result<String> {
        match self.next("identifier")? {
            Token::Identifier(name) => Ok(name),
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected identifier, found {}", other.describe())))
            }
        }
    }

    fn number(&mut self) -> Result<usize> {
        match self.next("number")? {
            Token::Number(n) => Ok(n),
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected number, found {}", other.describe())))
            }
        }
    }

    fn word(&mut self) -> Result<u128> {
        match self.next("instruction word")? {
            Token::Word(w) => Ok(w),
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected instruction word, found {}", other.describe())))
            }
        }
    }

    fn finish(&self) -> Result<()> {
        match self.tokens.get(self.pos) {
            None => Ok(()),
            Some((token, _)) => Err(self.error(format!("unexpected {} after array", token.describe()))),
        }
    }
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}
