//! # Lexer for SystemVerilog instruction arrays
//!
//! Covers the subset the compiler writes:
//!
//! ```text
//! localparam int SIGN_INSTRUCTION_COUNT = 4619;
//! logic [127:0] sign_instructions[SIGN_INSTRUCTION_COUNT] = '{
//! 128'h...,
//! ...
//! };
//! ```

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    #[token("localparam")]
    Localparam,

    #[token("int")]
    Int,

    #[token("logic")]
    Logic,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse().ok())]
    Number(usize),

    /// 128-bit hex literal, underscores allowed between digits
    #[regex(r"128'[hH][0-9a-fA-F_]+", parse_word)]
    Word(u128),

    #[token("'{")]
    OpenList,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("}")]
    RBrace,

    #[token(":")]
    Colon,

    #[token("=")]
    Equals,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,
}

fn parse_word(lex: &mut logos::Lexer<Token>) -> Option<u128> {
    let digits: String = lex.slice()[5..].chars().filter(|&c| c != '_').collect();
    if digits.is_empty() || digits.len() > 32 {
        return None;
    }
    u128::from_str_radix(&digits, 16).ok()
}

impl Token {
    /// Short description for syntax errors
    pub fn describe(&self) -> String {
        match self {
            Token::Localparam => "`localparam`".to_string(),
            Token::Int => "`int`".to_string(),
            Token::Logic => "`logic`".to_string(),
            Token::Identifier(name) => format!("identifier `{}`", name),
            Token::Number(n) => format!("number {}", n),
            Token::Word(_) => "instruction word".to_string(),
            Token::OpenList => "`'{`".to_string(),
            Token::LBracket => "`[`".to_string(),
            Token::RBracket => "`]`".to_string(),
            Token::RBrace => "`}`".to_string(),
            Token::Colon => "`:`".to_string(),
            Token::Equals => "`=`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::Semicolon => "`;`".to_string(),
        }
    }
}
