use tracing::debug;

use crate::ast::*;
use crate::error::Error;
use crate::parser::parse_string;
use crate::types::FormatOptions;

/// Parses `code` and prints it back in canonical form.
pub fn format_string(code: &str) -> Result<String, Error> {
    format_string_with(code, &FormatOptions::default())
}

pub fn format_string_with(code: &str, options: &FormatOptions) -> Result<String, Error> {
    let structogram = parse_string(code)?;
    let out = format_structogram(&structogram, options);
    debug!(bytes = out.len(), "formatted structogram");
    Ok(out)
}

/// Prints a parsed tree. Literals keep their original quoting; statement
/// positions decide where a blank line survives.
pub fn format_structogram(s: &Structogram, options: &FormatOptions) -> String {
    let mut p = Printer::new(&options.indent);

    if let Some(title) = &s.title {
        p.write("title ");
        p.write(&title.quoted);
        p.write("\n");
        if !s.statements.is_empty() {
            p.write("\n");
        }
    }

    p.statements(&s.statements);
    if !s.statements.is_empty() {
        p.new_line();
    }
    p.out
}

struct Printer<'o> {
    out: String,
    indent: &'o str,
    depth: usize,
}

impl<'o> Printer<'o> {
    fn new(indent: &'o str) -> Self {
        Self {
            out: String::new(),
            indent,
            depth: 0,
        }
    }

    fn write(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn new_line(&mut self) {
        self.out.push('\n');
        for _ in 0..self.depth {
            self.out.push_str(self.indent);
        }
    }

    fn label(&mut self, label: &Option<Literal>) {
        if let Some(l) = label {
            self.write(" ");
            self.write(&l.quoted);
        }
    }

    fn statements(&mut self, list: &[Statement]) {
        for (i, s) in list.iter().enumerate() {
            if i > 0 {
                if separated(&list[i - 1], s) {
                    self.out.push('\n');
                }
                self.new_line();
            }
            self.statement(s);
        }
    }

    /// `{`, the statements one level deeper, `}`. An empty body still gets
    /// its own indented line.
    fn block(&mut self, block: &Block) {
        self.write("{");
        self.depth += 1;
        self.new_line();
        self.statements(&block.statements);
        self.close();
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.new_line();
        self.write("}");
    }

    fn statement(&mut self, s: &Statement) {
        match s {
            Statement::Instruction(x) => self.write(&x.text.quoted),
            Statement::Call(x) => {
                self.write("call ");
                self.write(&x.text.quoted);
            }
            Statement::Break(x) => {
                self.write("break ");
                self.write(&x.text.quoted);
            }
            Statement::If(x) => {
                self.write("if ");
                self.write(&x.condition.quoted);
                self.label(&x.true_label);
                self.write(" ");
                self.block(&x.then);
            }
            Statement::IfElse(x) => {
                self.write("if ");
                self.write(&x.condition.quoted);
                self.label(&x.true_label);
                self.write(" ");
                self.block(&x.then);
                self.write(" else");
                self.label(&x.false_label);
                self.write(" ");
                self.block(&x.otherwise);
            }
            Statement::Switch(x) => {
                self.write("switch ");
                self.write(&x.subject.quoted);
                self.write(" {");
                self.depth += 1;
                self.new_line();
                for (i, case) in x.cases.iter().enumerate() {
                    if i > 0 {
                        self.new_line();
                    }
                    self.write("case ");
                    match &case.label {
                        CaseLabel::Default => self.write("default"),
                        CaseLabel::Condition(c) => self.write(&c.quoted),
                    }
                    self.write(" ");
                    self.block(&case.block);
                }
                self.close();
            }
            Statement::Parallel(x) => {
                self.write("parallel {");
                self.depth += 1;
                self.new_line();
                for (i, block) in x.blocks.iter().enumerate() {
                    if i > 0 {
                        self.new_line();
                    }
                    self.block(block);
                }
                self.close();
            }
            Statement::InfiniteLoop(x) => {
                self.write("while ");
                self.block(&x.block);
            }
            Statement::While(x) => {
                self.write("while ");
                self.write(&x.condition.quoted);
                self.write(" ");
                self.block(&x.block);
            }
            Statement::DoWhile(x) => {
                self.write("do ");
                self.block(&x.block);
                self.write(" while ");
                self.write(&x.condition.quoted);
            }
        }
    }
}

/// Two or more line breaks in the source between `a` and `b`.
fn separated(a: &Statement, b: &Statement) -> bool {
    b.start().line >= a.end().line + 2
}
