//! Печать дерева обратно в исходный текст.
//!
//! Два режима: одна строка (операторы через `;`) и многострочный с
//! настраиваемым отступом. Ключевые слова печатаются в каноническом
//! написании, директивы — как были записаны. Вложенные «голые» бинарные
//! операции оборачиваются в скобки, чтобы приоритеты читались явно;
//! скобки из исходника (`Grouping`) печатают себя сами и повторно не
//! оборачиваются.

use crate::ast::*;

/// Настройки печати.
#[derive(Debug, Clone, Copy)]
pub struct PrintConf {
    /// Печатать всё в одну строку.
    pub one_line: bool,
    /// Пробелов на уровень вложенности в многострочном режиме.
    pub margin: usize,
}

impl Default for PrintConf {
    fn default() -> Self {
        Self {
            one_line: false,
            margin: 4,
        }
    }
}

impl Module {
    /// Печатает модуль целиком.
    pub fn print(&self, conf: PrintConf) -> String {
        let mut printer = Printer::new(conf);
        printer.module(self);
        printer.out
    }

    /// Печатает один оператор.
    pub fn print_statement(&self, stmt: &Statement, conf: PrintConf) -> String {
        print_statement(stmt, conf)
    }
}

/// Печатает один оператор без контекста модуля.
pub fn print_statement(stmt: &Statement, conf: PrintConf) -> String {
    let mut printer = Printer::new(conf);
    printer.statement(stmt, 0);
    printer.out
}

struct Printer {
    conf: PrintConf,
    out: String,
}

impl Printer {
    fn new(conf: PrintConf) -> Self {
        Self {
            conf,
            out: String::new(),
        }
    }

    fn module(&mut self, module: &Module) {
        for var in &module.global_variables {
            if let Some(directive) = &var.directive {
                self.push_indent(0);
                self.out.push_str(directive);
                self.out.push('\n');
            }
            let mut text = format!("Перем {}", var.name);
            if var.export {
                text.push_str(" Экспорт");
            }
            self.simple(&text, 0);
        }

        for stmt in &module.body {
            self.statement(stmt, 0);
        }
    }

    fn statement(&mut self, stmt: &Statement, level: usize) {
        match stmt {
            Statement::Routine(fp) => self.routine(fp, level),
            Statement::Assignment(a) => {
                let text = format!("{} = {}", expr(&a.target), expr(&a.value));
                self.simple(&text, level);
            }
            Statement::Call(e) => self.simple(&expr(e), level),
            Statement::If(i) => self.if_statement(i, level),
            Statement::While(w) => {
                self.header(&format!("Пока {} Цикл", expr(&w.condition)), level);
                self.block(&w.body, level + 1);
                self.terminator("КонецЦикла", level);
            }
            Statement::For(f) => {
                self.header(
                    &format!(
                        "Для {} = {} По {} Цикл",
                        f.variable,
                        expr(&f.from),
                        expr(&f.to)
                    ),
                    level,
                );
                self.block(&f.body, level + 1);
                self.terminator("КонецЦикла", level);
            }
            Statement::ForEach(f) => {
                self.header(
                    &format!(
                        "Для Каждого {} Из {} Цикл",
                        f.variable,
                        expr(&f.collection)
                    ),
                    level,
                );
                self.block(&f.body, level + 1);
                self.terminator("КонецЦикла", level);
            }
            Statement::Try(t) => {
                self.header("Попытка", level);
                self.block(&t.body, level + 1);
                self.header("Исключение", level);
                self.block(&t.handler, level + 1);
                self.terminator("КонецПопытки", level);
            }
            Statement::Return(value) => {
                let text = match value {
                    Some(e) => format!("Возврат {}", expr(e)),
                    None => "Возврат".to_string(),
                };
                self.simple(&text, level);
            }
            Statement::Throw(t) => self.simple(&throw_text(t), level),
            Statement::Break => self.simple("Прервать", level),
            Statement::Continue => self.simple("Продолжить", level),
            Statement::Goto(label) => self.simple(&format!("Перейти ~{label}"), level),
            Statement::Label(label) => self.marker(&format!("~{label}:"), level),
            Statement::Execute(e) => {
                let args: Vec<String> = e.args.iter().map(expr).collect();
                self.simple(&format!("Выполнить({})", args.join(", ")), level);
            }
            Statement::PreprocessorIf(p) => self.preproc_if(p, level),
            Statement::Region(r) => {
                self.preproc_marker(&format!("#Область {}", r.name), level);
                self.block(&r.body, level);
                self.preproc_marker("#КонецОбласти", level);
            }
            Statement::RegionStart(name) => {
                self.preproc_marker(&format!("#Область {name}"), level)
            }
            Statement::RegionEnd => self.preproc_marker("#КонецОбласти", level),
            Statement::Use(path) => self.preproc_marker(&format!("#Использовать {path}"), level),
        }
    }

    fn routine(&mut self, fp: &FunctionOrProcedure, level: usize) {
        for directive in &fp.directives {
            self.push_indent(level);
            self.out.push_str(directive);
            self.out.push('\n');
        }

        let params: Vec<String> = fp.params.iter().map(param_text).collect();
        let keyword = match fp.kind {
            RoutineKind::Procedure => "Процедура",
            RoutineKind::Function => "Функция",
        };
        let mut head = String::new();
        if fp.is_async {
            head.push_str("Асинх ");
        }
        head.push_str(keyword);
        head.push(' ');
        head.push_str(&fp.name);
        head.push('(');
        head.push_str(&params.join(", "));
        head.push(')');
        if fp.export {
            head.push_str(" Экспорт");
        }
        self.header(&head, level);

        if !fp.explicit_variables.is_empty() {
            self.simple(
                &format!("Перем {}", fp.explicit_variables.join(", ")),
                level + 1,
            );
        }

        self.block(&fp.body, level + 1);

        let end = match fp.kind {
            RoutineKind::Procedure => "КонецПроцедуры",
            RoutineKind::Function => "КонецФункции",
        };
        if self.conf.one_line {
            self.out.push_str(end);
            self.out.push(' ');
        } else {
            self.push_indent(level);
            self.out.push_str(end);
            self.out.push_str(" \n\n");
        }
    }

    fn if_statement(&mut self, i: &IfStatement, level: usize) {
        self.header(&format!("Если {} Тогда", expr(&i.condition)), level);
        self.block(&i.then_branch, level + 1);
        for elseif in &i.else_ifs {
            self.header(
                &format!("ИначеЕсли {} Тогда", expr(&elseif.condition)),
                level,
            );
            self.block(&elseif.body, level + 1);
        }
        if let Some(else_branch) = &i.else_branch {
            self.header("Иначе", level);
            self.block(else_branch, level + 1);
        }
        self.terminator("КонецЕсли", level);
    }

    fn preproc_if(&mut self, p: &PreprocessorIfStatement, level: usize) {
        self.preproc_marker(&format!("#Если {} Тогда", p.condition), level);
        self.block(&p.then_block, level);
        for elseif in &p.else_ifs {
            self.preproc_marker(&format!("#ИначеЕсли {} Тогда", elseif.condition), level);
            self.block(&elseif.body, level);
        }
        if let Some(else_block) = &p.else_block {
            self.preproc_marker("#Иначе", level);
            self.block(else_block, level);
        }
        self.preproc_marker("#КонецЕсли", level);
    }

    fn block(&mut self, stmts: &[Statement], level: usize) {
        for stmt in stmts {
            self.statement(stmt, level);
        }
    }

    /// Простой оператор: текст с `;`.
    fn simple(&mut self, text: &str, level: usize) {
        if self.conf.one_line {
            self.out.push_str(text);
            self.out.push(';');
        } else {
            self.push_indent(level);
            self.out.push_str(text);
            self.out.push_str(";\n");
        }
    }

    /// Заголовок блока: завершает строку пробелом.
    fn header(&mut self, text: &str, level: usize) {
        if self.conf.one_line {
            self.out.push_str(text);
            self.out.push(' ');
        } else {
            self.push_indent(level);
            self.out.push_str(text);
            self.out.push_str(" \n");
        }
    }

    /// Завершение блока: с `;`.
    fn terminator(&mut self, text: &str, level: usize) {
        if self.conf.one_line {
            self.out.push_str(text);
            self.out.push(';');
        } else {
            self.push_indent(level);
            self.out.push_str(text);
            self.out.push_str(";\n");
        }
    }

    /// Строка без `;` (метки).
    fn marker(&mut self, text: &str, level: usize) {
        if self.conf.one_line {
            self.out.push_str(text);
        } else {
            self.push_indent(level);
            self.out.push_str(text);
            self.out.push('\n');
        }
    }

    /// Маркер препроцессора занимает отдельную строку и в однострочном
    /// режиме.
    fn preproc_marker(&mut self, text: &str, level: usize) {
        if !self.conf.one_line {
            self.push_indent(level);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn push_indent(&mut self, level: usize) {
        if self.conf.one_line {
            return;
        }
        for _ in 0..level * self.conf.margin {
            self.out.push(' ');
        }
    }
}

fn param_text(p: &Parameter) -> String {
    let mut out = String::new();
    if p.by_value {
        out.push_str("Знач ");
    }
    out.push_str(&p.name);
    if let Some(default) = &p.default {
        out.push_str(" = ");
        out.push_str(&expr(default));
    }
    out
}

fn throw_text(t: &ThrowStatement) -> String {
    match &t.args {
        None => "ВызватьИсключение".to_string(),
        Some(args) if t.parenthesized => {
            format!("ВызватьИсключение({})", arg_list(args))
        }
        Some(args) => {
            let first = args.iter().flatten().next().map(expr).unwrap_or_default();
            format!("ВызватьИсключение {first}")
        }
    }
}

fn arg_list(args: &Arguments) -> String {
    let parts: Vec<String> = args
        .iter()
        .map(|a| a.as_ref().map(expr).unwrap_or_default())
        .collect();
    parts.join(", ")
}

/// Печать выражения. Операнд-«голая» бинарная операция берётся в скобки.
fn expr(e: &Expression) -> String {
    match e {
        Expression::Literal(lit) => literal_text(lit),
        Expression::Identifier(name) => name.clone(),
        Expression::Unary(u) => {
            let prefix = match u.op {
                UnaryOperator::Not => "Не ",
                UnaryOperator::Minus => "-",
            };
            format!("{prefix}{}", operand(&u.operand))
        }
        Expression::Binary(b) => format!(
            "{} {} {}",
            operand(&b.left),
            b.op.as_str(),
            operand(&b.right)
        ),
        Expression::Ternary(t) => format!(
            "?({}, {}, {})",
            expr(&t.condition),
            expr(&t.then_expr),
            expr(&t.else_expr)
        ),
        Expression::FunctionCall(c) => format!("{}({})", c.name, arg_list(&c.args)),
        Expression::MethodCall(c) => {
            format!("{}.{}({})", expr(&c.object), c.method, arg_list(&c.args))
        }
        Expression::PropertyAccess(p) => format!("{}.{}", expr(&p.object), p.property),
        Expression::IndexAccess(i) => format!("{}[{}]", expr(&i.object), expr(&i.index)),
        Expression::New(n) => match (&n.type_name, &n.args) {
            (Some(name), Some(args)) => format!("Новый {name}({})", arg_list(args)),
            (Some(name), None) => format!("Новый {name}"),
            (None, Some(args)) => format!("Новый({})", arg_list(args)),
            (None, None) => "Новый".to_string(),
        },
        Expression::Await(inner) => format!("Ждать {}", expr(inner)),
        Expression::Grouping(inner) => format!("({})", expr(inner)),
    }
}

fn operand(e: &Expression) -> String {
    match e {
        Expression::Binary(_) => format!("({})", expr(e)),
        _ => expr(e),
    }
}

fn literal_text(lit: &Literal) -> String {
    match lit {
        Literal::Number(n) => number_text(*n),
        Literal::String(s) => format!("\"{s}\""),
        Literal::Date(Some(dt)) => format!("'{}'", dt.format("%Y%m%d%H%M%S")),
        Literal::Date(None) => "'00010101000000'".to_string(),
        Literal::Boolean(true) => "Истина".to_string(),
        Literal::Boolean(false) => "Ложь".to_string(),
        Literal::Undefined => "Неопределено".to_string(),
        Literal::Null => "Null".to_string(),
    }
}

/// Целые печатаются без дробной части.
fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
