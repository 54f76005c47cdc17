//! AST структуры для BSL.
//!
//! Дерево строится парсером и с его стороны далее не меняется. Все узлы
//! несут serde-производные: внешне тегированное представление enum'ов даёт
//! стабильную пару «тег узла + поля» для обмена с внешними инструментами.

pub mod walk;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Корень разбора: один модуль.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    pub global_variables: Vec<GlobalVariable>,
    pub body: Vec<Statement>,
}

impl Module {
    /// Структурированное представление дерева.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Глобальная переменная модуля.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVariable {
    pub name: String,
    pub export: bool,
    pub directive: Option<String>,
}

/// Вид подпрограммы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutineKind {
    Procedure,
    Function,
}

/// Процедура или функция.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionOrProcedure {
    pub name: String,
    pub kind: RoutineKind,
    /// Директивы компиляции и расширений, как записаны в исходнике.
    pub directives: Vec<String>,
    pub params: Vec<Parameter>,
    pub export: bool,
    pub is_async: bool,
    /// Имена из объявлений Перем внутри подпрограммы.
    pub explicit_variables: Vec<String>,
    pub body: Vec<Statement>,
}

/// Параметр подпрограммы.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Передача по значению (Знач).
    pub by_value: bool,
    pub default: Option<Expression>,
}

/// Операторы.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Routine(FunctionOrProcedure),
    Assignment(AssignmentStatement),
    /// Вызов в позиции оператора, включая одиночный `Ждать …`.
    Call(Expression),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    ForEach(ForEachStatement),
    Try(TryStatement),
    Return(Option<Expression>),
    Throw(ThrowStatement),
    Break,
    Continue,
    /// Перейти ~метка.
    Goto(String),
    /// Объявление метки: ~метка:
    Label(String),
    Execute(ExecuteStatement),
    PreprocessorIf(PreprocessorIfStatement),
    /// #Область на уровне модуля — контейнер с телом.
    Region(RegionStatement),
    /// Маркеры области внутри тела подпрограммы: область может пересекать
    /// границы управляющих конструкций, поэтому контейнером не является.
    RegionStart(String),
    RegionEnd,
    /// #Использовать путь.
    Use(String),
}

/// Присваивание.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentStatement {
    pub target: Expression,
    pub value: Expression,
}

/// Условный оператор.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Vec<Statement>,
    pub else_ifs: Vec<ElseIfBranch>,
    pub else_branch: Option<Vec<Statement>>,
}

/// Ветка ИначеЕсли.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElseIfBranch {
    pub condition: Expression,
    pub body: Vec<Statement>,
}

/// Цикл Пока.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Vec<Statement>,
}

/// Цикл Для … По.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStatement {
    pub variable: String,
    pub from: Expression,
    pub to: Expression,
    pub body: Vec<Statement>,
}

/// Цикл Для Каждого … Из.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForEachStatement {
    pub variable: String,
    pub collection: Expression,
    pub body: Vec<Statement>,
}

/// Попытка … Исключение … КонецПопытки.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryStatement {
    pub body: Vec<Statement>,
    pub handler: Vec<Statement>,
}

/// ВызватьИсключение: без аргументов, с выражением или со списком в скобках.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowStatement {
    pub args: Option<Vec<Option<Expression>>>,
    pub parenthesized: bool,
}

/// Выполнить: одно выражение или список выражений в скобках.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteStatement {
    pub args: Vec<Expression>,
}

/// #Если … #ИначеЕсли … #Иначе … #КонецЕсли. Обе ветки всегда в дереве;
/// условия хранятся как текст и не вычисляются.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessorIfStatement {
    pub condition: String,
    pub then_block: Vec<Statement>,
    pub else_ifs: Vec<PreprocessorElseIf>,
    pub else_block: Option<Vec<Statement>>,
}

/// Ветка #ИначеЕсли.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessorElseIf {
    pub condition: String,
    pub body: Vec<Statement>,
}

/// #Область уровня модуля.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStatement {
    pub name: String,
    pub body: Vec<Statement>,
}

/// Аргументы вызова. Пропущенные аргументы (`Новый Шрифт(,,Истина)`)
/// представлены None и печатаются пустым местом.
pub type Arguments = Vec<Option<Expression>>;

/// Выражения.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Ternary(TernaryExpression),
    FunctionCall(FunctionCall),
    MethodCall(MethodCall),
    PropertyAccess(PropertyAccess),
    IndexAccess(IndexAccess),
    New(NewExpression),
    Await(Box<Expression>),
    /// Скобки из исходника вокруг операторного выражения. Скобки вокруг
    /// атома в дереве не материализуются.
    Grouping(Box<Expression>),
}

/// Литералы.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(f64),
    String(String),
    /// None — пустая дата.
    Date(Option<NaiveDateTime>),
    Boolean(bool),
    Undefined,
    Null,
}

/// Унарная операция.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpression {
    pub op: UnaryOperator,
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Minus,
}

/// Бинарная операция.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub left: Box<Expression>,
    pub op: BinaryOperator,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    And,
    Or,
}

impl BinaryOperator {
    /// Каноническое написание оператора.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::And => "И",
            BinaryOperator::Or => "ИЛИ",
        }
    }
}

/// Тернарная операция ?(условие, а, б).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TernaryExpression {
    pub condition: Box<Expression>,
    pub then_expr: Box<Expression>,
    pub else_expr: Box<Expression>,
}

/// Вызов глобальной функции.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Arguments,
}

/// Вызов метода.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub object: Box<Expression>,
    pub method: String,
    pub args: Arguments,
}

/// Обращение к свойству.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAccess {
    pub object: Box<Expression>,
    pub property: String,
}

/// Индексный доступ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexAccess {
    pub object: Box<Expression>,
    pub index: Box<Expression>,
}

/// Создание объекта. Именная форма `Новый Тип(…)` несёт имя типа;
/// функциональная `Новый(ТипВыражение, Параметры)` — только аргументы.
/// `args == None` — форма без скобок (`Новый Структура`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpression {
    pub type_name: Option<String>,
    pub args: Option<Arguments>,
}

impl Expression {
    /// Цепочка заканчивается вызовом (метода или функции).
    pub fn is_call(&self) -> bool {
        matches!(
            self,
            Expression::FunctionCall(_) | Expression::MethodCall(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_is_tagged() {
        let module = Module {
            global_variables: vec![GlobalVariable {
                name: "а".to_string(),
                export: false,
                directive: None,
            }],
            body: vec![Statement::Break],
        };
        let json = module.to_json().unwrap();
        assert!(json.contains("\"Break\""));
        assert!(json.contains("\"global_variables\""));
    }

    #[test]
    fn test_operator_spelling() {
        assert_eq!(BinaryOperator::Or.as_str(), "ИЛИ");
        assert_eq!(BinaryOperator::And.as_str(), "И");
        assert_eq!(BinaryOperator::NotEqual.as_str(), "<>");
        assert_eq!(BinaryOperator::Modulo.as_str(), "%");
    }

    #[test]
    fn test_is_call() {
        let call = Expression::FunctionCall(FunctionCall {
            name: "Сообщить".to_string(),
            args: vec![],
        });
        assert!(call.is_call());
        let prop = Expression::PropertyAccess(PropertyAccess {
            object: Box::new(Expression::Identifier("а".to_string())),
            property: "Код".to_string(),
        });
        assert!(!prop.is_call());
    }
}
