use tracing::{debug, warn};

use crate::ast::*;
use crate::error::{Error, Expected, ParseError};
use crate::tokenizer::{tokenize, unquote, Token, TokenKind};

/// Parses a whole document. Fails on the first lex or syntax error and never
/// returns a partial tree.
pub fn parse_string(code: &str) -> Result<Structogram, Error> {
    let tokens = tokenize(code).inspect_err(|e| warn!(error = %e, "tokenizing failed"))?;
    let token_count = tokens.len();

    let structogram = Parser::new(tokens)
        .structogram()
        .inspect_err(|e| warn!(error = %e, "parsing failed"))?;

    debug!(
        tokens = token_count,
        statements = structogram.statements.len(),
        titled = structogram.title.is_some(),
        "parsed structogram"
    );
    Ok(structogram)
}

/// Deepest block nesting the parser accepts. Formatting and layout recurse
/// once per level, so this also bounds their stack use.
pub const MAX_NESTING: usize = 64;

struct Parser<'s> {
    tokens: Vec<Token<'s>>,
    at: usize,
    depth: usize,
}

impl<'s> Parser<'s> {
    /// `tokens` must end with the `Eof` token the tokenizer emits.
    fn new(tokens: Vec<Token<'s>>) -> Self {
        Self {
            tokens,
            at: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Token<'s> {
        let last = self.tokens.len().saturating_sub(1);
        self.tokens[self.at.min(last)]
    }

    fn sees(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn sees_word(&self, word: &str) -> bool {
        let t = self.peek();
        t.kind == TokenKind::Word && t.text == word
    }

    fn skip_space(&mut self) {
        while self.sees(TokenKind::Space) {
            self.at += 1;
        }
    }

    /// Consumes the current token and any white space after it.
    fn bump(&mut self) -> Token<'s> {
        let t = self.peek();
        if t.kind != TokenKind::Eof {
            self.at += 1;
        }
        self.skip_space();
        t
    }

    fn error(&self, context: &'static str, expected: Expected) -> ParseError {
        ParseError {
            pos: self.peek().start,
            context,
            expected,
        }
    }

    fn eat(&mut self, kind: TokenKind, context: &'static str) -> Result<Token<'s>, ParseError> {
        if self.sees(kind) {
            return Ok(self.bump());
        }
        let expected = match kind {
            TokenKind::OpenBrace => Expected::OpenBrace,
            TokenKind::CloseBrace => Expected::CloseBrace,
            _ => Expected::String,
        };
        Err(self.error(context, expected))
    }

    fn eat_string(&mut self, context: &'static str) -> Result<Literal, ParseError> {
        if !self.sees(TokenKind::Str) {
            return Err(self.error(context, Expected::String));
        }
        let t = self.bump();
        Ok(Literal {
            text: unquote(t.text),
            quoted: t.text.to_string(),
            span: Span::new(t.start, t.end),
        })
    }

    fn optional_string(&mut self) -> Option<Literal> {
        if self.sees(TokenKind::Str) {
            self.eat_string("label").ok()
        } else {
            None
        }
    }

    fn structogram(&mut self) -> Result<Structogram, ParseError> {
        self.skip_space();
        let title = if self.sees_word("title") {
            self.bump();
            Some(self.eat_string("title")?)
        } else {
            None
        };
        let statements = self.statements()?;
        if !self.sees(TokenKind::Eof) {
            return Err(self.error("structogram", Expected::Statement));
        }
        Ok(Structogram { title, statements })
    }

    /// Parses statements until something that cannot start one.
    fn statements(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut all = Vec::new();
        while let Some(s) = self.statement()? {
            all.push(s);
        }
        Ok(all)
    }

    fn block(&mut self, context: &'static str) -> Result<Block, ParseError> {
        if self.depth >= MAX_NESTING && self.sees(TokenKind::OpenBrace) {
            return Err(self.error(context, Expected::ShallowerBlock(MAX_NESTING)));
        }
        let open = self.eat(TokenKind::OpenBrace, context)?;
        self.depth += 1;
        let statements = self.statements()?;
        self.depth -= 1;
        let close = self.eat(TokenKind::CloseBrace, context)?;
        Ok(Block {
            statements,
            span: Span::new(open.start, close.end),
        })
    }

    fn statement(&mut self) -> Result<Option<Statement>, ParseError> {
        let t = self.peek();
        if t.kind == TokenKind::Str {
            let text = self.eat_string("instruction")?;
            return Ok(Some(Statement::Instruction(Instruction { text })));
        }
        if t.kind != TokenKind::Word {
            return Ok(None);
        }

        let keyword = t.start;
        let statement = match t.text {
            "if" => {
                self.bump();
                self.if_statement(keyword)?
            }
            "switch" => {
                self.bump();
                Statement::Switch(self.switch(keyword)?)
            }
            "while" => {
                self.bump();
                if self.sees(TokenKind::Str) {
                    let condition = self.eat_string("while")?;
                    let block = self.block("while")?;
                    Statement::While(While {
                        keyword,
                        condition,
                        block,
                    })
                } else {
                    let block = self.block("while")?;
                    Statement::InfiniteLoop(InfiniteLoop { keyword, block })
                }
            }
            "do" => {
                self.bump();
                let block = self.block("do")?;
                if !self.sees_word("while") {
                    return Err(self.error("do-while loop", Expected::Keyword("while")));
                }
                self.bump();
                let condition = self.eat_string("do-while loop")?;
                Statement::DoWhile(DoWhile {
                    keyword,
                    block,
                    condition,
                })
            }
            "break" => {
                self.bump();
                let text = self.eat_string("break")?;
                Statement::Break(Break { keyword, text })
            }
            "call" => {
                self.bump();
                let text = self.eat_string("call")?;
                Statement::Call(Call { keyword, text })
            }
            "parallel" => {
                self.bump();
                let open = self.eat(TokenKind::OpenBrace, "parallel")?;
                let mut blocks = Vec::new();
                while self.sees(TokenKind::OpenBrace) {
                    blocks.push(self.block("parallel")?);
                }
                let close = self.eat(TokenKind::CloseBrace, "parallel")?;
                Statement::Parallel(Parallel {
                    keyword,
                    blocks,
                    body: Span::new(open.start, close.end),
                })
            }
            _ => return Ok(None),
        };
        Ok(Some(statement))
    }

    fn if_statement(&mut self, keyword: Pos) -> Result<Statement, ParseError> {
        let condition = self.eat_string("if")?;
        let true_label = self.optional_string();
        let then = self.block("if")?;
        if !self.sees_word("else") {
            return Ok(Statement::If(If {
                keyword,
                condition,
                true_label,
                then,
            }));
        }

        self.bump();
        let false_label = self.optional_string();
        let otherwise = self.block("else")?;
        Ok(Statement::IfElse(IfElse {
            keyword,
            condition,
            true_label,
            then,
            false_label,
            otherwise,
        }))
    }

    fn switch(&mut self, keyword: Pos) -> Result<Switch, ParseError> {
        let subject = self.eat_string("switch")?;
        let open = self.eat(TokenKind::OpenBrace, "switch")?;
        let mut cases = Vec::new();
        while self.sees_word("case") {
            self.bump();
            let label = if self.sees_word("default") {
                self.bump();
                CaseLabel::Default
            } else {
                CaseLabel::Condition(self.eat_string("case")?)
            };
            let block = self.block("case")?;
            cases.push(SwitchCase { label, block });
        }
        let close = self.eat(TokenKind::CloseBrace, "switch")?;
        Ok(Switch {
            keyword,
            subject,
            cases,
            body: Span::new(open.start, close.end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(code: &str) -> Structogram {
        let mut s = parse_string(code).unwrap();
        s.clear_spans();
        s
    }

    fn parse_err(code: &str) -> ParseError {
        match parse_string(code) {
            Err(Error::Parse(e)) => e,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    fn instruction(text: &str) -> Statement {
        Statement::Instruction(Instruction {
            text: Literal::new(text),
        })
    }

    #[test]
    fn empty_string_yields_empty_structogram() {
        assert_eq!(parse(""), Structogram::default());
        assert_eq!(parse(" \n\t "), Structogram::default());
    }

    #[test]
    fn title_comes_first() {
        let s = parse(r#"title "the title""#);
        assert_eq!(s.title, Some(Literal::new("the title")));
        assert!(s.statements.is_empty());
    }

    #[test]
    fn title_string_is_unescaped() {
        let s = parse(r#"title "quote:\" backslash:\\ line-break:\n""#);
        let title = s.title.unwrap();
        assert_eq!(title.text, "quote:\" backslash:\\ line-break:\n");
        assert_eq!(title.quoted, r#""quote:\" backslash:\\ line-break:\n""#);
    }

    #[test]
    fn regular_instructions_are_just_strings() {
        assert_eq!(parse(r#""instruction""#).statements, vec![instruction("instruction")]);
    }

    #[test]
    fn if_can_have_no_else() {
        let s = parse(
            r#"
if "condition" {
	"do this"
	"and that"
}
"#,
        );
        assert_eq!(
            s.statements,
            vec![Statement::If(If {
                condition: Literal::new("condition"),
                then: Block::new(vec![instruction("do this"), instruction("and that")]),
                ..If::default()
            })]
        );
    }

    #[test]
    fn if_can_have_else_with_labels() {
        let s = parse(r#"if "false" "yes" { "then this" } else "no" { "else this" }"#);
        assert_eq!(
            s.statements,
            vec![Statement::IfElse(IfElse {
                condition: Literal::new("false"),
                true_label: Some(Literal::new("yes")),
                then: Block::new(vec![instruction("then this")]),
                false_label: Some(Literal::new("no")),
                otherwise: Block::new(vec![instruction("else this")]),
                ..IfElse::default()
            })]
        );
    }

    #[test]
    fn while_with_break() {
        let s = parse(r#"while "i<10" { break "x" }"#);
        assert_eq!(
            s.statements,
            vec![Statement::While(While {
                condition: Literal::new("i<10"),
                block: Block::new(vec![Statement::Break(Break {
                    text: Literal::new("x"),
                    ..Break::default()
                })]),
                ..While::default()
            })]
        );
    }

    #[test]
    fn while_without_condition_loops_forever() {
        let s = parse(r#"while { call "tick" }"#);
        assert_eq!(
            s.statements,
            vec![Statement::InfiniteLoop(InfiniteLoop {
                block: Block::new(vec![Statement::Call(Call {
                    text: Literal::new("tick"),
                    ..Call::default()
                })]),
                ..InfiniteLoop::default()
            })]
        );
    }

    #[test]
    fn do_while_puts_the_condition_last() {
        let s = parse(r#"do { "a" } while "more""#);
        assert_eq!(
            s.statements,
            vec![Statement::DoWhile(DoWhile {
                block: Block::new(vec![instruction("a")]),
                condition: Literal::new("more"),
                ..DoWhile::default()
            })]
        );
    }

    #[test]
    fn switch_with_default_case() {
        let s = parse(r#"switch "s" { case "1" {} case default {} }"#);
        let Statement::Switch(switch) = &s.statements[0] else {
            panic!("expected switch, got {:?}", s.statements[0]);
        };
        assert_eq!(switch.subject.text, "s");
        assert_eq!(switch.cases.len(), 2);
        assert!(!switch.cases[0].is_default());
        assert_eq!(switch.cases[0].condition(), "1");
        assert!(switch.cases[1].is_default());
        assert_eq!(switch.cases[1].condition(), "");
    }

    #[test]
    fn parallel_accepts_empty_blocks() {
        let s = parse("parallel { {} {} }");
        assert_eq!(
            s.statements,
            vec![Statement::Parallel(Parallel {
                blocks: vec![Block::default(), Block::default()],
                ..Parallel::default()
            })]
        );
        assert_eq!(
            parse("parallel {}").statements,
            vec![Statement::Parallel(Parallel::default())]
        );
    }

    #[test]
    fn unterminated_switch_wants_closing_brace() {
        let err = parse_err(r#"switch "" {"#);
        assert_eq!(err.expected, Expected::CloseBrace);
        assert_eq!(err.context, "switch");
        assert_eq!(err.pos, Pos::new(1, 12));
        assert!(err.to_string().contains("'}' expected"));
    }

    #[test]
    fn do_without_while_is_an_expected_token_error() {
        let err = parse_err(r#"do { "a" } "b""#);
        assert_eq!(err.expected, Expected::Keyword("while"));
        assert_eq!(err.pos, Pos::new(1, 12));
    }

    #[test]
    fn missing_string_is_reported() {
        let err = parse_err("call {}");
        assert_eq!(err.context, "call");
        assert_eq!(err.expected, Expected::String);
        assert_eq!(err.to_string(), "1:6: call: string expected");
    }

    #[test]
    fn leftover_input_is_an_error() {
        let err = parse_err(r#""a" }"#);
        assert_eq!(err.expected, Expected::Statement);
        assert_eq!(err.pos, Pos::new(1, 5));

        let err = parse_err(r#""a" unknown"#);
        assert_eq!(err.pos, Pos::new(1, 5));
    }

    fn nested_loops(depth: usize) -> String {
        format!("{}{}", "while {".repeat(depth), "}".repeat(depth))
    }

    #[test]
    fn nesting_up_to_the_limit_is_accepted() {
        let s = parse(&nested_loops(MAX_NESTING));
        assert_eq!(s.statements.len(), 1);
    }

    #[test]
    fn nesting_past_the_limit_is_an_error() {
        let err = parse_err(&nested_loops(MAX_NESTING + 1));
        assert_eq!(err.expected, Expected::ShallowerBlock(MAX_NESTING));
        assert_eq!(err.context, "while");
        // the offending '{' follows 64 "while {" prefixes and one "while "
        assert_eq!(err.pos, Pos::new(1, MAX_NESTING * 7 + 7));

        for depth in [200, 400, 20_000] {
            assert!(matches!(
                parse_string(&nested_loops(depth)),
                Err(Error::Parse(_))
            ));
        }
        assert!(crate::format_string(&nested_loops(400)).is_err());
    }

    #[test]
    fn lex_errors_pass_through() {
        assert!(matches!(parse_string("\"a\" ("), Err(Error::Lex(_))));
    }

    #[test]
    fn statements_record_their_spans() {
        let s = parse_string("\"a\"\n\nif \"c\" {\n}\ncall \"f\"").unwrap();
        assert_eq!(s.statements[0].span(), Span::new(Pos::new(1, 1), Pos::new(1, 4)));
        assert_eq!(s.statements[1].span(), Span::new(Pos::new(3, 1), Pos::new(4, 2)));
        assert_eq!(s.statements[2].span(), Span::new(Pos::new(5, 1), Pos::new(5, 9)));

        let Statement::If(x) = &s.statements[1] else {
            panic!("expected if");
        };
        assert_eq!(x.condition.span, Span::new(Pos::new(3, 4), Pos::new(3, 7)));
        assert_eq!(x.then.span, Span::new(Pos::new(3, 8), Pos::new(4, 2)));
    }
}
