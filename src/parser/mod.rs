//! Синтаксический анализатор BSL.
//!
//! Парсер тянет токены из лексера по одному и строит дерево. Неоднозначность
//! «присваивание или вызов» уже решена лексером (`LValueIdent`/`CallIdent`),
//! поэтому каждый оператор распознаётся по одному токену предпросмотра.
//! Приоритеты выражений закодированы по одной функции на уровень.
//!
//! Разбор прерывается на первой ошибке; частичное дерево наружу не отдаётся.


use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::keywords::case_fold;
use crate::lexer::token::{Token, TokenKind, TokenValue};
use crate::lexer::Lexer;
use std::collections::HashSet;

/// Разбирает исходный текст одного модуля.
pub fn parse_module(source: &str) -> Result<Module, ParseError> {
    Parser::new(source)?.parse()
}

/// Фазы модуля: объявления переменных, затем подпрограммы, затем свободные
/// операторы. Переход к более поздней фазе необратим.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ModulePhase {
    Globals,
    Routines,
    LooseBody,
}

/// Метки и переходы одной области (модуль или подпрограмма).
#[derive(Default)]
struct LabelScope {
    declared: HashSet<String>,
    gotos: Vec<Token>,
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    phase: ModulePhase,
    global_names: HashSet<String>,
    /// Глубина вложенности циклов для Прервать/Продолжить.
    loop_depth: u32,
    /// Глубина вложенности блоков Исключение для ВызватьИсключение без
    /// аргументов.
    handler_depth: u32,
    /// Вид текущей подпрограммы; None на уровне модуля.
    routine_kind: Option<RoutineKind>,
    locals: Vec<String>,
    local_names: HashSet<String>,
    labels: LabelScope,
    module_labels: LabelScope,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            phase: ModulePhase::Globals,
            global_names: HashSet::new(),
            loop_depth: 0,
            handler_depth: 0,
            routine_kind: None,
            locals: Vec::new(),
            local_names: HashSet::new(),
            labels: LabelScope::default(),
            module_labels: LabelScope::default(),
        })
    }

    pub fn parse(mut self) -> Result<Module, ParseError> {
        let mut module = Module::default();
        let mut body = Vec::new();
        self.parse_module_items(&[], &mut module, &mut body)?;
        module.body = body;

        if self.current.kind != TokenKind::Eof {
            return Err(self.error_here());
        }

        let scope = std::mem::take(&mut self.module_labels);
        self.check_labels(&scope)?;

        Ok(module)
    }

    // ------------------------------------------------------------------
    // Уровень модуля
    // ------------------------------------------------------------------

    /// Последовательность элементов уровня модуля до одного из
    /// терминаторов: объявления переменных, подпрограммы, контейнеры
    /// препроцессора и области, свободные операторы.
    fn parse_module_items(
        &mut self,
        terminators: &[TokenKind],
        module: &mut Module,
        out: &mut Vec<Statement>,
    ) -> Result<(), ParseError> {
        let mut directives: Vec<String> = Vec::new();

        loop {
            if terminators.contains(&self.current.kind) || self.current.kind == TokenKind::Eof {
                return Ok(());
            }

            match self.current.kind {
                TokenKind::Semicolon => self.advance()?,
                TokenKind::Directive | TokenKind::ExtDirective => {
                    directives.push(self.current.literal.clone());
                    self.advance()?;
                }
                TokenKind::Var => {
                    let directive = directives.drain(..).last();
                    self.parse_global_vars(directive, module)?;
                }
                TokenKind::Async | TokenKind::Procedure | TokenKind::Function => {
                    let routine = self.parse_routine(std::mem::take(&mut directives))?;
                    out.push(routine);
                }
                TokenKind::PreprocIf => {
                    let stmt = self.parse_module_preproc_if(module)?;
                    out.push(stmt);
                }
                TokenKind::PreprocRegion => {
                    let stmt = self.parse_module_region(module)?;
                    out.push(stmt);
                }
                TokenKind::PreprocUse => {
                    out.push(Statement::Use(self.current.literal.clone()));
                    self.advance()?;
                }
                _ => {
                    if !directives.is_empty() {
                        return Err(self.error_here());
                    }
                    if self.phase != ModulePhase::LooseBody {
                        tracing::debug!("module enters loose body phase");
                        self.phase = ModulePhase::LooseBody;
                    }
                    if let Some(stmt) = self.parse_body_item()? {
                        out.push(stmt);
                    }
                }
            }
        }
    }

    /// Перем на уровне модуля: только в начальной фазе.
    fn parse_global_vars(
        &mut self,
        directive: Option<String>,
        module: &mut Module,
    ) -> Result<(), ParseError> {
        if self.phase != ModulePhase::Globals {
            return Err(ParseError::VariableAfterBody {
                position: self.lexer.position_at(self.current.offset),
                literal: self.current.literal.clone(),
            });
        }

        self.advance()?; // Перем
        loop {
            let name = self.expect_identifier()?;
            if !self.global_names.insert(case_fold(&name.literal)) {
                return Err(ParseError::VariableRedefined {
                    position: self.lexer.position_at(name.offset),
                    literal: name.literal,
                });
            }
            let export = self.eat(TokenKind::Export)?;
            module.global_variables.push(GlobalVariable {
                name: name.literal,
                export,
                directive: directive.clone(),
            });
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        self.eat(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_module_preproc_if(&mut self, module: &mut Module) -> Result<Statement, ParseError> {
        let condition = self.current.literal.clone();
        self.advance()?;

        const BRANCH_END: &[TokenKind] = &[
            TokenKind::PreprocElseIf,
            TokenKind::PreprocElse,
            TokenKind::PreprocEndIf,
        ];

        let mut then_block = Vec::new();
        self.parse_module_items(BRANCH_END, module, &mut then_block)?;

        let mut else_ifs = Vec::new();
        while self.current.kind == TokenKind::PreprocElseIf {
            let condition = self.current.literal.clone();
            self.advance()?;
            let mut body = Vec::new();
            self.parse_module_items(BRANCH_END, module, &mut body)?;
            else_ifs.push(PreprocessorElseIf { condition, body });
        }

        let else_block = if self.current.kind == TokenKind::PreprocElse {
            self.advance()?;
            let mut body = Vec::new();
            self.parse_module_items(&[TokenKind::PreprocEndIf], module, &mut body)?;
            Some(body)
        } else {
            None
        };

        self.expect(TokenKind::PreprocEndIf)?;

        Ok(Statement::PreprocessorIf(PreprocessorIfStatement {
            condition,
            then_block,
            else_ifs,
            else_block,
        }))
    }

    /// #Область на уровне модуля — сбалансированный контейнер.
    fn parse_module_region(&mut self, module: &mut Module) -> Result<Statement, ParseError> {
        let name = self.current.literal.clone();
        self.advance()?;

        let mut body = Vec::new();
        self.parse_module_items(&[TokenKind::PreprocEndRegion], module, &mut body)?;
        self.expect(TokenKind::PreprocEndRegion)?;

        Ok(Statement::Region(RegionStatement { name, body }))
    }

    // ------------------------------------------------------------------
    // Подпрограммы
    // ------------------------------------------------------------------

    fn parse_routine(&mut self, directives: Vec<String>) -> Result<Statement, ParseError> {
        if self.phase == ModulePhase::LooseBody {
            return Err(ParseError::RoutineAfterBody {
                position: self.lexer.position_at(self.current.offset),
                literal: self.current.literal.clone(),
            });
        }
        self.phase = ModulePhase::Routines;

        let is_async = self.eat(TokenKind::Async)?;
        let kind = match self.current.kind {
            TokenKind::Procedure => RoutineKind::Procedure,
            TokenKind::Function => RoutineKind::Function,
            _ => return Err(self.error_here()),
        };
        self.advance()?;

        let name = self.expect_identifier()?;
        self.expect(TokenKind::LeftParen)?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RightParen)?;
        let export = self.eat(TokenKind::Export)?;
        // точка с запятой после заголовка встречается в реальных модулях
        self.eat(TokenKind::Semicolon)?;

        tracing::debug!(name = %name.literal, ?kind, "routine");

        self.routine_kind = Some(kind);
        self.locals.clear();
        self.local_names.clear();
        self.labels = LabelScope::default();

        let body = self.parse_block(&[TokenKind::EndProcedure, TokenKind::EndFunction])?;

        let end_kind = match kind {
            RoutineKind::Procedure => TokenKind::EndProcedure,
            RoutineKind::Function => TokenKind::EndFunction,
        };
        if self.current.kind != end_kind {
            return Err(self.error_here());
        }
        self.advance()?;

        let scope = std::mem::take(&mut self.labels);
        self.check_labels(&scope)?;
        self.routine_kind = None;

        Ok(Statement::Routine(FunctionOrProcedure {
            name: name.literal,
            kind,
            directives,
            params,
            export,
            is_async,
            explicit_variables: std::mem::take(&mut self.locals),
            body,
        }))
    }

    fn parse_params(&mut self) -> Result<Vec<Parameter>, ParseError> {
        let mut params = Vec::new();
        let mut seen = HashSet::new();

        if self.current.kind == TokenKind::RightParen {
            return Ok(params);
        }

        loop {
            let by_value = self.eat(TokenKind::ValueParam)?;
            let name = self.expect_identifier()?;
            if !seen.insert(case_fold(&name.literal)) {
                return Err(ParseError::VariableRedefined {
                    position: self.lexer.position_at(name.offset),
                    literal: name.literal,
                });
            }
            let default = if self.eat(TokenKind::Equal)? {
                Some(self.parse_param_default()?)
            } else {
                None
            };
            params.push(Parameter {
                name: name.literal,
                by_value,
                default,
            });
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }

        Ok(params)
    }

    /// Значение по умолчанию — литерал с необязательным знаком.
    fn parse_param_default(&mut self) -> Result<Expression, ParseError> {
        let negate = if self.eat(TokenKind::Minus)? {
            true
        } else {
            self.eat(TokenKind::Plus)?;
            false
        };

        let literal = match (&self.current.kind, &self.current.value) {
            (TokenKind::Number, TokenValue::Number(n)) => {
                Literal::Number(if negate { -n } else { *n })
            }
            _ if negate => return Err(self.error_here()),
            (TokenKind::String, TokenValue::String(s)) => Literal::String(s.clone()),
            (TokenKind::Date, TokenValue::Date(d)) => Literal::Date(*d),
            (TokenKind::True, _) => Literal::Boolean(true),
            (TokenKind::False, _) => Literal::Boolean(false),
            (TokenKind::Undefined, _) => Literal::Undefined,
            (TokenKind::Null, _) => Literal::Null,
            _ => return Err(self.error_here()),
        };
        self.advance()?;
        Ok(Expression::Literal(literal))
    }

    /// Перем внутри тела: имена копятся в явные переменные подпрограммы.
    fn parse_local_vars(&mut self) -> Result<(), ParseError> {
        self.advance()?; // Перем
        loop {
            let name = self.expect_identifier()?;
            if !self.local_names.insert(case_fold(&name.literal)) {
                return Err(ParseError::VariableRedefined {
                    position: self.lexer.position_at(name.offset),
                    literal: name.literal,
                });
            }
            self.locals.push(name.literal);
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        self.eat(TokenKind::Semicolon)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Операторы
    // ------------------------------------------------------------------

    /// Операторы до одного из терминаторов. Разделители `;` необязательны.
    fn parse_block(&mut self, terminators: &[TokenKind]) -> Result<Vec<Statement>, ParseError> {
        let mut out = Vec::new();
        loop {
            while self.current.kind == TokenKind::Semicolon {
                self.advance()?;
            }
            if terminators.contains(&self.current.kind) || self.current.kind == TokenKind::Eof {
                return Ok(out);
            }
            if let Some(stmt) = self.parse_body_item()? {
                out.push(stmt);
            }
        }
    }

    fn parse_body_item(&mut self) -> Result<Option<Statement>, ParseError> {
        let stmt = match self.current.kind {
            TokenKind::LValueIdent => self.parse_assignment()?,
            TokenKind::CallIdent => Statement::Call(self.parse_postfix()?),
            TokenKind::Await => Statement::Call(self.parse_unary()?),
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Try => self.parse_try()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::Throw => self.parse_throw()?,
            TokenKind::Break | TokenKind::Continue => self.parse_loop_control()?,
            TokenKind::Goto => self.parse_goto()?,
            TokenKind::GotoLabel => self.parse_label()?,
            TokenKind::Execute => self.parse_execute()?,
            TokenKind::VarBody => {
                self.parse_local_vars()?;
                return Ok(None);
            }
            TokenKind::PreprocIfBody => self.parse_body_preproc_if()?,
            TokenKind::PreprocRegionBody => {
                let name = self.current.literal.clone();
                self.advance()?;
                Statement::RegionStart(name)
            }
            TokenKind::PreprocEndRegionBody => {
                self.advance()?;
                Statement::RegionEnd
            }
            TokenKind::PreprocUse => {
                let path = self.current.literal.clone();
                self.advance()?;
                Statement::Use(path)
            }
            _ => return Err(self.error_here()),
        };
        Ok(Some(stmt))
    }

    fn parse_assignment(&mut self) -> Result<Statement, ParseError> {
        let target = self.parse_postfix()?;
        if target.is_call() {
            // голый вызов не может стоять слева от присваивания
            return Err(self.error_here());
        }
        self.expect(TokenKind::Equal)?;
        let value = self.parse_expression()?;
        Ok(Statement::Assignment(AssignmentStatement { target, value }))
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // Если
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Then)?;
        self.eat(TokenKind::Semicolon)?;

        const BRANCH_END: &[TokenKind] = &[TokenKind::ElseIf, TokenKind::Else, TokenKind::EndIf];

        let then_branch = self.parse_block(BRANCH_END)?;

        let mut else_ifs = Vec::new();
        while self.current.kind == TokenKind::ElseIf {
            self.advance()?;
            let condition = self.parse_expression()?;
            self.expect(TokenKind::Then)?;
            self.eat(TokenKind::Semicolon)?;
            let body = self.parse_block(BRANCH_END)?;
            else_ifs.push(ElseIfBranch { condition, body });
        }

        let else_branch = if self.current.kind == TokenKind::Else {
            self.advance()?;
            Some(self.parse_block(&[TokenKind::EndIf])?)
        } else {
            None
        };

        self.expect(TokenKind::EndIf)?;

        Ok(Statement::If(IfStatement {
            condition,
            then_branch,
            else_ifs,
            else_branch,
        }))
    }

    fn parse_while(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // Пока
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Loop)?;
        self.eat(TokenKind::Semicolon)?;

        self.loop_depth += 1;
        let body = self.parse_block(&[TokenKind::EndLoop]);
        self.loop_depth -= 1;
        let body = body?;

        self.expect(TokenKind::EndLoop)?;
        Ok(Statement::While(WhileStatement { condition, body }))
    }

    fn parse_for(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // Для

        if self.eat(TokenKind::Each)? {
            let variable = self.expect_identifier()?.literal;
            self.expect(TokenKind::In)?;
            let collection = self.parse_expression()?;
            self.expect(TokenKind::Loop)?;
            self.eat(TokenKind::Semicolon)?;

            self.loop_depth += 1;
            let body = self.parse_block(&[TokenKind::EndLoop]);
            self.loop_depth -= 1;
            let body = body?;

            self.expect(TokenKind::EndLoop)?;
            return Ok(Statement::ForEach(ForEachStatement {
                variable,
                collection,
                body,
            }));
        }

        let variable = self.expect_identifier()?.literal;
        self.expect(TokenKind::Equal)?;
        let from = self.parse_expression()?;
        self.expect(TokenKind::To)?;
        let to = self.parse_expression()?;
        self.expect(TokenKind::Loop)?;
        self.eat(TokenKind::Semicolon)?;

        self.loop_depth += 1;
        let body = self.parse_block(&[TokenKind::EndLoop]);
        self.loop_depth -= 1;
        let body = body?;

        self.expect(TokenKind::EndLoop)?;
        Ok(Statement::For(ForStatement {
            variable,
            from,
            to,
            body,
        }))
    }

    fn parse_try(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // Попытка
        let body = self.parse_block(&[TokenKind::Catch])?;
        self.expect(TokenKind::Catch)?;

        self.handler_depth += 1;
        let handler = self.parse_block(&[TokenKind::EndTry]);
        self.handler_depth -= 1;
        let handler = handler?;

        self.expect(TokenKind::EndTry)?;
        Ok(Statement::Try(TryStatement { body, handler }))
    }

    fn parse_return(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // Возврат

        if !self.current.starts_expression() {
            return Ok(Statement::Return(None));
        }

        let value_tok = self.current.clone();
        let expr = self.parse_expression()?;
        if self.routine_kind == Some(RoutineKind::Procedure) {
            return Err(ParseError::ProcedureReturnsValue {
                position: self.lexer.position_at(value_tok.offset),
                literal: value_tok.literal,
            });
        }
        Ok(Statement::Return(Some(expr)))
    }

    fn parse_throw(&mut self) -> Result<Statement, ParseError> {
        let operator = self.current.literal.clone();
        self.advance()?;

        if self.current.kind == TokenKind::LeftParen {
            self.advance()?;
            let args = self.parse_arguments()?;
            self.expect(TokenKind::RightParen)?;
            return Ok(Statement::Throw(ThrowStatement {
                args: Some(args),
                parenthesized: true,
            }));
        }

        if self.current.starts_expression() {
            let expr = self.parse_expression()?;
            return Ok(Statement::Throw(ThrowStatement {
                args: Some(vec![Some(expr)]),
                parenthesized: false,
            }));
        }

        // без аргументов — только при обработке исключения
        if self.handler_depth == 0 {
            return Err(ParseError::BareThrow {
                operator,
                position: self.lexer.position_at(self.current.offset),
                literal: self.current.literal.clone(),
            });
        }
        Ok(Statement::Throw(ThrowStatement {
            args: None,
            parenthesized: false,
        }))
    }

    fn parse_loop_control(&mut self) -> Result<Statement, ParseError> {
        let tok = self.current.clone();
        if self.loop_depth == 0 {
            return Err(ParseError::OutsideLoop {
                operator: tok.literal.clone(),
                position: self.lexer.position_at(tok.offset),
                literal: tok.literal,
            });
        }
        let stmt = match tok.kind {
            TokenKind::Break => Statement::Break,
            _ => Statement::Continue,
        };
        self.advance()?;
        Ok(stmt)
    }

    fn parse_goto(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // Перейти
        if self.current.kind != TokenKind::GotoLabel {
            return Err(self.error_here());
        }
        let label = self.current.clone();
        self.advance()?;
        self.label_scope_mut().gotos.push(label.clone());
        Ok(Statement::Goto(label.literal))
    }

    fn parse_label(&mut self) -> Result<Statement, ParseError> {
        let label = self.current.clone();
        self.advance()?;
        self.expect(TokenKind::Colon)?;
        if !self
            .label_scope_mut()
            .declared
            .insert(case_fold(&label.literal))
        {
            return Err(ParseError::LabelRedefined {
                position: self.lexer.position_at(label.offset),
                literal: label.literal,
            });
        }
        Ok(Statement::Label(label.literal))
    }

    fn parse_execute(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // Выполнить

        if self.current.kind == TokenKind::LeftParen {
            self.advance()?;
            let mut args = Vec::new();
            if self.current.kind != TokenKind::RightParen {
                loop {
                    args.push(self.parse_expression()?);
                    if !self.eat(TokenKind::Comma)? {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RightParen)?;
            return Ok(Statement::Execute(ExecuteStatement { args }));
        }

        // без скобок — ровно одно выражение; запятая за ним даст
        // синтаксическую ошибку на самой запятой
        let expr = self.parse_expression()?;
        Ok(Statement::Execute(ExecuteStatement { args: vec![expr] }))
    }

    fn parse_body_preproc_if(&mut self) -> Result<Statement, ParseError> {
        let condition = self.current.literal.clone();
        self.advance()?;

        const BRANCH_END: &[TokenKind] = &[
            TokenKind::PreprocElseIfBody,
            TokenKind::PreprocElseBody,
            TokenKind::PreprocEndIfBody,
        ];

        let then_block = self.parse_block(BRANCH_END)?;

        let mut else_ifs = Vec::new();
        while self.current.kind == TokenKind::PreprocElseIfBody {
            let condition = self.current.literal.clone();
            self.advance()?;
            let body = self.parse_block(BRANCH_END)?;
            else_ifs.push(PreprocessorElseIf { condition, body });
        }

        let else_block = if self.current.kind == TokenKind::PreprocElseBody {
            self.advance()?;
            Some(self.parse_block(&[TokenKind::PreprocEndIfBody])?)
        } else {
            None
        };

        self.expect(TokenKind::PreprocEndIfBody)?;

        Ok(Statement::PreprocessorIf(PreprocessorIfStatement {
            condition,
            then_block,
            else_ifs,
            else_block,
        }))
    }

    // ------------------------------------------------------------------
    // Выражения: по функции на уровень приоритета, все операции
    // левоассоциативны
    // ------------------------------------------------------------------

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_and()?;
        while self.current.kind == TokenKind::Or {
            self.advance()?;
            let right = self.parse_and()?;
            left = binary(left, BinaryOperator::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_not()?;
        while self.current.kind == TokenKind::And {
            self.advance()?;
            let right = self.parse_not()?;
            left = binary(left, BinaryOperator::And, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expression, ParseError> {
        if self.current.kind == TokenKind::Not {
            self.advance()?;
            let operand = self.parse_not()?;
            return Ok(Expression::Unary(UnaryExpression {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            }));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Equal => BinaryOperator::Equal,
                TokenKind::NotEqual => BinaryOperator::NotEqual,
                TokenKind::Less => BinaryOperator::Less,
                TokenKind::Greater => BinaryOperator::Greater,
                TokenKind::LessEq => BinaryOperator::LessOrEqual,
                TokenKind::GreaterEq => BinaryOperator::GreaterOrEqual,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Multiply => BinaryOperator::Multiply,
                TokenKind::Divide => BinaryOperator::Divide,
                TokenKind::Modulo => BinaryOperator::Modulo,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        match self.current.kind {
            TokenKind::Minus => {
                self.advance()?;
                let operand = self.parse_unary()?;
                // минус над числовым литералом сворачивается в
                // отрицательный литерал
                if let Expression::Literal(Literal::Number(n)) = operand {
                    return Ok(Expression::Literal(Literal::Number(-n)));
                }
                Ok(Expression::Unary(UnaryExpression {
                    op: UnaryOperator::Minus,
                    operand: Box::new(operand),
                }))
            }
            TokenKind::Plus => {
                // унарный плюс поглощается
                self.advance()?;
                self.parse_unary()
            }
            TokenKind::Await => {
                self.advance()?;
                let operand = self.parse_unary()?;
                Ok(Expression::Await(Box::new(operand)))
            }
            _ => self.parse_postfix(),
        }
    }

    /// Цепочка: первичное выражение и шаги `.Свойство`, `.Метод(…)`,
    /// `[индекс]`, `Имя(…)`.
    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let name = self.expect_identifier()?;
                    if self.current.kind == TokenKind::LeftParen {
                        self.advance()?;
                        let args = self.parse_arguments()?;
                        self.expect(TokenKind::RightParen)?;
                        expr = Expression::MethodCall(MethodCall {
                            object: Box::new(expr),
                            method: name.literal,
                            args,
                        });
                    } else {
                        expr = Expression::PropertyAccess(PropertyAccess {
                            object: Box::new(expr),
                            property: name.literal,
                        });
                    }
                }
                TokenKind::LeftBracket => {
                    self.advance()?;
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RightBracket)?;
                    expr = Expression::IndexAccess(IndexAccess {
                        object: Box::new(expr),
                        index: Box::new(index),
                    });
                }
                TokenKind::LeftParen => {
                    // вызовом продолжается только идентификатор
                    let name = match expr {
                        Expression::Identifier(name) => name,
                        other => return Ok(other),
                    };
                    self.advance()?;
                    let args = self.parse_arguments()?;
                    self.expect(TokenKind::RightParen)?;
                    expr = Expression::FunctionCall(FunctionCall { name, args });
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let expr = match (&self.current.kind, &self.current.value) {
            (TokenKind::Number, TokenValue::Number(n)) => Expression::Literal(Literal::Number(*n)),
            (TokenKind::String, TokenValue::String(s)) => {
                Expression::Literal(Literal::String(s.clone()))
            }
            (TokenKind::Date, TokenValue::Date(d)) => Expression::Literal(Literal::Date(*d)),
            (TokenKind::True, _) => Expression::Literal(Literal::Boolean(true)),
            (TokenKind::False, _) => Expression::Literal(Literal::Boolean(false)),
            (TokenKind::Undefined, _) => Expression::Literal(Literal::Undefined),
            (TokenKind::Null, _) => Expression::Literal(Literal::Null),
            (TokenKind::Identifier | TokenKind::LValueIdent | TokenKind::CallIdent, _) => {
                Expression::Identifier(self.current.literal.clone())
            }
            (TokenKind::LeftParen, _) => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RightParen)?;
                // скобки сохраняются только вокруг операторных выражений
                return Ok(match inner {
                    Expression::Binary(_) | Expression::Unary(_) | Expression::Grouping(_) => {
                        Expression::Grouping(Box::new(inner))
                    }
                    other => other,
                });
            }
            (TokenKind::Question, _) => return self.parse_ternary(),
            (TokenKind::New, _) => return self.parse_new(),
            _ => return Err(self.error_here()),
        };
        self.advance()?;
        Ok(expr)
    }

    fn parse_ternary(&mut self) -> Result<Expression, ParseError> {
        self.advance()?; // ?
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Comma)?;
        let then_expr = self.parse_expression()?;
        self.expect(TokenKind::Comma)?;
        let else_expr = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        Ok(Expression::Ternary(TernaryExpression {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        }))
    }

    fn parse_new(&mut self) -> Result<Expression, ParseError> {
        self.advance()?; // Новый

        match self.current.kind {
            TokenKind::Identifier => {
                let type_name = self.current.literal.clone();
                self.advance()?;
                let args = if self.current.kind == TokenKind::LeftParen {
                    self.advance()?;
                    let args = self.parse_arguments()?;
                    self.expect(TokenKind::RightParen)?;
                    Some(args)
                } else {
                    None
                };
                Ok(Expression::New(NewExpression {
                    type_name: Some(type_name),
                    args,
                }))
            }
            TokenKind::LeftParen => {
                // функциональная форма: Новый(ТипВыражение, Параметры)
                self.advance()?;
                let args = self.parse_arguments()?;
                self.expect(TokenKind::RightParen)?;
                Ok(Expression::New(NewExpression {
                    type_name: None,
                    args: Some(args),
                }))
            }
            _ => Err(self.error_here()),
        }
    }

    /// Список аргументов до закрывающей скобки. Пропущенные аргументы
    /// допустимы и представлены None.
    fn parse_arguments(&mut self) -> Result<Arguments, ParseError> {
        let mut args: Arguments = Vec::new();
        if self.current.kind == TokenKind::RightParen {
            return Ok(args);
        }
        loop {
            if matches!(self.current.kind, TokenKind::Comma | TokenKind::RightParen) {
                args.push(None);
            } else {
                args.push(Some(self.parse_expression()?));
            }
            if self.eat(TokenKind::Comma)? {
                continue;
            }
            break;
        }
        Ok(args)
    }

    // ------------------------------------------------------------------
    // Вспомогательные
    // ------------------------------------------------------------------

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn eat(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        if self.current.kind == kind {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.current.kind != kind {
            return Err(self.error_here());
        }
        let tok = self.current.clone();
        self.advance()?;
        Ok(tok)
    }

    fn expect_identifier(&mut self) -> Result<Token, ParseError> {
        self.expect(TokenKind::Identifier)
    }

    fn error_here(&self) -> ParseError {
        ParseError::syntax(
            self.lexer.position_at(self.current.offset),
            self.current.literal.clone(),
        )
    }

    fn label_scope_mut(&mut self) -> &mut LabelScope {
        if self.routine_kind.is_some() {
            &mut self.labels
        } else {
            &mut self.module_labels
        }
    }

    /// Каждый Перейти должен указывать на объявленную в той же области
    /// метку.
    fn check_labels(&self, scope: &LabelScope) -> Result<(), ParseError> {
        for goto in &scope.gotos {
            if !scope.declared.contains(&case_fold(&goto.literal)) {
                return Err(ParseError::UndefinedLabel {
                    position: self.lexer.position_at(goto.offset),
                    literal: goto.literal.clone(),
                });
            }
        }
        Ok(())
    }
}

fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
    Expression::Binary(BinaryExpression {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}
