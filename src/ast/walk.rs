//! Обход дерева.
//!
//! Pre-order, в порядке объявления. Посетитель получает объемлющую
//! подпрограмму (или None на уровне модуля), родительский оператор
//! (или None) и текущий оператор. Дерево во время обхода не меняется —
//! обход работает по разделяемым ссылкам.

use super::*;

/// Посетитель узлов. Оба метода по умолчанию пустые: реализуйте только
/// нужный уровень.
pub trait Visitor {
    fn visit_statement(
        &mut self,
        _routine: Option<&FunctionOrProcedure>,
        _parent: Option<&Statement>,
        _stmt: &Statement,
    ) {
    }

    fn visit_expression(&mut self, _routine: Option<&FunctionOrProcedure>, _expr: &Expression) {}
}

impl Module {
    /// Обход операторов замыканием — для потребителей, которым не нужны
    /// выражения.
    pub fn walk<F>(&self, f: F)
    where
        F: FnMut(Option<&FunctionOrProcedure>, Option<&Statement>, &Statement),
    {
        struct ClosureVisitor<F>(F);

        impl<F> Visitor for ClosureVisitor<F>
        where
            F: FnMut(Option<&FunctionOrProcedure>, Option<&Statement>, &Statement),
        {
            fn visit_statement(
                &mut self,
                routine: Option<&FunctionOrProcedure>,
                parent: Option<&Statement>,
                stmt: &Statement,
            ) {
                (self.0)(routine, parent, stmt)
            }
        }

        self.accept(&mut ClosureVisitor(f));
    }

    /// Полный обход с посетителем: операторы и выражения.
    pub fn accept<V: Visitor>(&self, visitor: &mut V) {
        for stmt in &self.body {
            walk_statement(None, None, stmt, visitor);
        }
    }
}

fn walk_statement<'a, V: Visitor>(
    routine: Option<&'a FunctionOrProcedure>,
    parent: Option<&'a Statement>,
    stmt: &'a Statement,
    visitor: &mut V,
) {
    visitor.visit_statement(routine, parent, stmt);

    match stmt {
        Statement::Routine(fp) => {
            for param in &fp.params {
                if let Some(default) = &param.default {
                    walk_expression(Some(fp), default, visitor);
                }
            }
            for inner in &fp.body {
                walk_statement(Some(fp), Some(stmt), inner, visitor);
            }
        }
        Statement::Assignment(a) => {
            walk_expression(routine, &a.target, visitor);
            walk_expression(routine, &a.value, visitor);
        }
        Statement::Call(expr) => walk_expression(routine, expr, visitor),
        Statement::If(i) => {
            walk_expression(routine, &i.condition, visitor);
            for inner in &i.then_branch {
                walk_statement(routine, Some(stmt), inner, visitor);
            }
            for elseif in &i.else_ifs {
                walk_expression(routine, &elseif.condition, visitor);
                for inner in &elseif.body {
                    walk_statement(routine, Some(stmt), inner, visitor);
                }
            }
            if let Some(else_branch) = &i.else_branch {
                for inner in else_branch {
                    walk_statement(routine, Some(stmt), inner, visitor);
                }
            }
        }
        Statement::While(w) => {
            walk_expression(routine, &w.condition, visitor);
            for inner in &w.body {
                walk_statement(routine, Some(stmt), inner, visitor);
            }
        }
        Statement::For(f) => {
            walk_expression(routine, &f.from, visitor);
            walk_expression(routine, &f.to, visitor);
            for inner in &f.body {
                walk_statement(routine, Some(stmt), inner, visitor);
            }
        }
        Statement::ForEach(f) => {
            walk_expression(routine, &f.collection, visitor);
            for inner in &f.body {
                walk_statement(routine, Some(stmt), inner, visitor);
            }
        }
        Statement::Try(t) => {
            for inner in &t.body {
                walk_statement(routine, Some(stmt), inner, visitor);
            }
            for inner in &t.handler {
                walk_statement(routine, Some(stmt), inner, visitor);
            }
        }
        Statement::Return(expr) => {
            if let Some(expr) = expr {
                walk_expression(routine, expr, visitor);
            }
        }
        Statement::Throw(t) => {
            if let Some(args) = &t.args {
                for arg in args.iter().flatten() {
                    walk_expression(routine, arg, visitor);
                }
            }
        }
        Statement::Execute(e) => {
            for arg in &e.args {
                walk_expression(routine, arg, visitor);
            }
        }
        Statement::PreprocessorIf(p) => {
            for inner in &p.then_block {
                walk_statement(routine, Some(stmt), inner, visitor);
            }
            for elseif in &p.else_ifs {
                for inner in &elseif.body {
                    walk_statement(routine, Some(stmt), inner, visitor);
                }
            }
            if let Some(else_block) = &p.else_block {
                for inner in else_block {
                    walk_statement(routine, Some(stmt), inner, visitor);
                }
            }
        }
        Statement::Region(r) => {
            for inner in &r.body {
                walk_statement(routine, Some(stmt), inner, visitor);
            }
        }
        Statement::Break
        | Statement::Continue
        | Statement::Goto(_)
        | Statement::Label(_)
        | Statement::RegionStart(_)
        | Statement::RegionEnd
        | Statement::Use(_) => {}
    }
}

fn walk_expression<'a, V: Visitor>(
    routine: Option<&'a FunctionOrProcedure>,
    expr: &'a Expression,
    visitor: &mut V,
) {
    visitor.visit_expression(routine, expr);

    match expr {
        Expression::Literal(_) | Expression::Identifier(_) => {}
        Expression::Unary(u) => walk_expression(routine, &u.operand, visitor),
        Expression::Binary(b) => {
            walk_expression(routine, &b.left, visitor);
            walk_expression(routine, &b.right, visitor);
        }
        Expression::Ternary(t) => {
            walk_expression(routine, &t.condition, visitor);
            walk_expression(routine, &t.then_expr, visitor);
            walk_expression(routine, &t.else_expr, visitor);
        }
        Expression::FunctionCall(c) => {
            for arg in c.args.iter().flatten() {
                walk_expression(routine, arg, visitor);
            }
        }
        Expression::MethodCall(c) => {
            walk_expression(routine, &c.object, visitor);
            for arg in c.args.iter().flatten() {
                walk_expression(routine, arg, visitor);
            }
        }
        Expression::PropertyAccess(p) => walk_expression(routine, &p.object, visitor),
        Expression::IndexAccess(i) => {
            walk_expression(routine, &i.object, visitor);
            walk_expression(routine, &i.index, visitor);
        }
        Expression::New(n) => {
            if let Some(args) = &n.args {
                for arg in args.iter().flatten() {
                    walk_expression(routine, arg, visitor);
                }
            }
        }
        Expression::Await(inner) | Expression::Grouping(inner) => {
            walk_expression(routine, inner, visitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;

    #[test]
    fn test_walk_visits_nested_statements() {
        let module = parse_module(
            "Процедура Тест()\n    Попытка\n        а = 1;\n    Исключение\n        б = 2;\n    КонецПопытки\nКонецПроцедуры",
        )
        .unwrap();

        let mut statements = 0;
        module.walk(|_, _, _| statements += 1);
        // подпрограмма, попытка и два присваивания
        assert_eq!(statements, 4);
    }

    #[test]
    fn test_walk_passes_enclosing_routine() {
        let module = parse_module(
            "Процедура Внешняя()\n    а = 1;\nКонецПроцедуры",
        )
        .unwrap();

        let mut seen = Vec::new();
        module.walk(|routine, _, stmt| {
            if let Statement::Assignment(_) = stmt {
                seen.push(routine.map(|r| r.name.clone()));
            }
        });
        assert_eq!(seen, vec![Some("Внешняя".to_string())]);
    }

    #[test]
    fn test_walk_parent_statement() {
        let module = parse_module(
            "Процедура Тест()\n    Если а = 1 Тогда\n        б = 1;\n    КонецЕсли;\nКонецПроцедуры",
        )
        .unwrap();

        let mut parent_is_if = false;
        module.walk(|_, parent, stmt| {
            if let Statement::Assignment(_) = stmt {
                parent_is_if = matches!(parent, Some(Statement::If(_)));
            }
        });
        assert!(parent_is_if);
    }

    #[test]
    fn test_walk_preprocessor_branches() {
        let module = parse_module(
            "#Если Сервер Тогда\nПроцедура Тест1()\nКонецПроцедуры\n#ИначеЕсли Клиент Тогда\nПроцедура Тест2()\nКонецПроцедуры\n#Иначе\nПроцедура Тест3()\nКонецПроцедуры\n#КонецЕсли",
        )
        .unwrap();

        let mut routines = 0;
        module.walk(|_, _, stmt| {
            if matches!(stmt, Statement::Routine(_)) {
                routines += 1;
            }
        });
        assert_eq!(routines, 3);
    }

    #[test]
    fn test_visitor_sees_expressions() {
        let module = parse_module(
            "Процедура Тест()\n    а = Объект.Метод(1, 2).Свойство;\nКонецПроцедуры",
        )
        .unwrap();

        struct CallCollector(Vec<String>);
        impl Visitor for CallCollector {
            fn visit_expression(
                &mut self,
                _routine: Option<&FunctionOrProcedure>,
                expr: &Expression,
            ) {
                if let Expression::MethodCall(c) = expr {
                    self.0.push(c.method.clone());
                }
            }
        }

        let mut collector = CallCollector(Vec::new());
        module.accept(&mut collector);
        assert_eq!(collector.0, vec!["Метод".to_string()]);
    }

    #[test]
    fn test_walk_use_statement() {
        let module =
            parse_module("#Использовать lib\nПроцедура Тест()\nКонецПроцедуры").unwrap();
        let mut use_found = false;
        module.walk(|_, _, stmt| {
            if matches!(stmt, Statement::Use(_)) {
                use_found = true;
            }
        });
        assert!(use_found);
    }
}
