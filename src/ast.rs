use serde::Serialize;
use std::fmt;

/// 1-indexed source position. Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    pub const START: Pos = Pos { line: 1, col: 1 };

    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// The position right after `c`.
    pub fn advance(self, c: char) -> Self {
        if c == '\n' {
            Pos {
                line: self.line + 1,
                col: 1,
            }
        } else {
            Pos {
                line: self.line,
                col: self.col + 1,
            }
        }
    }

    pub fn advance_str(self, s: &str) -> Self {
        s.chars().fold(self, Pos::advance)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// `end` is the position just past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }
}

/// A quoted string from the source: decoded text, the quoted form as
/// written, and where it was written.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Literal {
    pub text: String,
    pub quoted: String,
    pub span: Span,
}

impl Literal {
    /// Builds a literal from decoded text, quoting it canonically.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            quoted: crate::tokenizer::quote(&text),
            text,
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Structogram {
    pub title: Option<Literal>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Statement {
    Instruction(Instruction),
    Call(Call),
    Break(Break),
    If(If),
    IfElse(IfElse),
    Switch(Switch),
    Parallel(Parallel),
    InfiniteLoop(InfiniteLoop),
    While(While),
    DoWhile(DoWhile),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Instruction {
    pub text: Literal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Call {
    pub keyword: Pos,
    pub text: Literal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Break {
    pub keyword: Pos,
    pub text: Literal,
}

/// A braced statement list. `span` covers the braces themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            statements,
            span: Span::default(),
        }
    }

    /// Span of the statements between the braces, if there are any.
    pub fn content_span(&self) -> Option<Span> {
        let first = self.statements.first()?;
        let last = self.statements.last()?;
        Some(Span::new(first.start(), last.end()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct If {
    pub keyword: Pos,
    pub condition: Literal,
    pub true_label: Option<Literal>,
    pub then: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct IfElse {
    pub keyword: Pos,
    pub condition: Literal,
    pub true_label: Option<Literal>,
    pub then: Block,
    pub false_label: Option<Literal>,
    pub otherwise: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Switch {
    pub keyword: Pos,
    pub subject: Literal,
    pub cases: Vec<SwitchCase>,
    /// The braces around the case list.
    pub body: Span,
}

/// A `case "x" { ... }` or `case default { ... }` arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchCase {
    pub label: CaseLabel,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "condition", rename_all = "lowercase")]
pub enum CaseLabel {
    Default,
    Condition(Literal),
}

impl SwitchCase {
    pub fn is_default(&self) -> bool {
        matches!(self.label, CaseLabel::Default)
    }

    /// Empty for the default case.
    pub fn condition(&self) -> &str {
        match &self.label {
            CaseLabel::Default => "",
            CaseLabel::Condition(c) => &c.text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Parallel {
    pub keyword: Pos,
    pub blocks: Vec<Block>,
    pub body: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InfiniteLoop {
    pub keyword: Pos,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct While {
    pub keyword: Pos,
    pub condition: Literal,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DoWhile {
    pub keyword: Pos,
    pub block: Block,
    pub condition: Literal,
}

impl Statement {
    pub fn start(&self) -> Pos {
        match self {
            Statement::Instruction(x) => x.text.span.start,
            Statement::Call(x) => x.keyword,
            Statement::Break(x) => x.keyword,
            Statement::If(x) => x.keyword,
            Statement::IfElse(x) => x.keyword,
            Statement::Switch(x) => x.keyword,
            Statement::Parallel(x) => x.keyword,
            Statement::InfiniteLoop(x) => x.keyword,
            Statement::While(x) => x.keyword,
            Statement::DoWhile(x) => x.keyword,
        }
    }

    pub fn end(&self) -> Pos {
        match self {
            Statement::Instruction(x) => x.text.span.end,
            Statement::Call(x) => x.text.span.end,
            Statement::Break(x) => x.text.span.end,
            Statement::If(x) => x.then.span.end,
            Statement::IfElse(x) => x.otherwise.span.end,
            Statement::Switch(x) => x.body.end,
            Statement::Parallel(x) => x.body.end,
            Statement::InfiniteLoop(x) => x.block.span.end,
            Statement::While(x) => x.block.span.end,
            Statement::DoWhile(x) => x.condition.span.end,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start(), self.end())
    }

    fn clear_spans(&mut self) {
        match self {
            Statement::Instruction(x) => x.text.span = Span::default(),
            Statement::Call(x) => {
                x.keyword = Pos::default();
                x.text.span = Span::default();
            }
            Statement::Break(x) => {
                x.keyword = Pos::default();
                x.text.span = Span::default();
            }
            Statement::If(x) => {
                x.keyword = Pos::default();
                x.condition.span = Span::default();
                clear_label(&mut x.true_label);
                x.then.clear_spans();
            }
            Statement::IfElse(x) => {
                x.keyword = Pos::default();
                x.condition.span = Span::default();
                clear_label(&mut x.true_label);
                x.then.clear_spans();
                clear_label(&mut x.false_label);
                x.otherwise.clear_spans();
            }
            Statement::Switch(x) => {
                x.keyword = Pos::default();
                x.subject.span = Span::default();
                x.body = Span::default();
                for case in &mut x.cases {
                    if let CaseLabel::Condition(c) = &mut case.label {
                        c.span = Span::default();
                    }
                    case.block.clear_spans();
                }
            }
            Statement::Parallel(x) => {
                x.keyword = Pos::default();
                x.body = Span::default();
                for block in &mut x.blocks {
                    block.clear_spans();
                }
            }
            Statement::InfiniteLoop(x) => {
                x.keyword = Pos::default();
                x.block.clear_spans();
            }
            Statement::While(x) => {
                x.keyword = Pos::default();
                x.condition.span = Span::default();
                x.block.clear_spans();
            }
            Statement::DoWhile(x) => {
                x.keyword = Pos::default();
                x.block.clear_spans();
                x.condition.span = Span::default();
            }
        }
    }
}

fn clear_label(label: &mut Option<Literal>) {
    if let Some(l) = label {
        l.span = Span::default();
    }
}

impl Block {
    fn clear_spans(&mut self) {
        self.span = Span::default();
        for s in &mut self.statements {
            s.clear_spans();
        }
    }
}

impl Structogram {
    /// Resets every position in the tree, so two parses of the same program
    /// laid out differently compare equal.
    pub fn clear_spans(&mut self) {
        clear_label(&mut self.title);
        for s in &mut self.statements {
            s.clear_spans();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_advances_over_lines() {
        let p = Pos::START.advance_str("ab\n\tc");
        assert_eq!(p, Pos::new(2, 3));
    }

    #[test]
    fn block_content_span_differs_from_brace_span() {
        let inner = Statement::Instruction(Instruction {
            text: Literal {
                text: "a".into(),
                quoted: "\"a\"".into(),
                span: Span::new(Pos::new(2, 2), Pos::new(2, 5)),
            },
        });
        let block = Block {
            statements: vec![inner],
            span: Span::new(Pos::new(1, 1), Pos::new(3, 2)),
        };
        assert_eq!(
            block.content_span(),
            Some(Span::new(Pos::new(2, 2), Pos::new(2, 5)))
        );
        assert_eq!(Block::default().content_span(), None);
    }

    #[test]
    fn default_case_has_empty_condition() {
        let case = SwitchCase {
            label: CaseLabel::Default,
            block: Block::default(),
        };
        assert!(case.is_default());
        assert_eq!(case.condition(), "");
    }
}
