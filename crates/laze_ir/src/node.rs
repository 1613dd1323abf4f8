//! IR node definitions.
//!
//! The tree arrives fully desugared: argument lists are explicit, pattern
//! shorthands are expanded and multi-argument lambdas are already curried
//! where the source language requires it.

use crate::types::{AliasInfo, DefinitionScope, PassFlags};
use laze_core::intern::InternedString;
use laze_core::text::TextSpan;
use laze_diagnostics::Diagnostic;

/// A name as written in the program.
pub type Symbol = InternedString;

// ============================================================================
// Expressions
// ============================================================================

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Option<TextSpan>,
    /// Set by the scope graph builder.
    pub alias: Option<AliasInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// A reference to a symbol.
    Name(Symbol),
    Lambda(Lambda),
    /// A prefix call.
    Application(Application),
    /// Explicit evaluation of a suspended computation.
    Force(Box<Expr>),
    /// A vector literal.
    Sequence(Vec<Expr>),
    Binding(Binding),
    Block(Block),
    Case(Case),
    Foreign(Foreign),
    Comment(Comment),
    Error(ErrorNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Number(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub arguments: Vec<Parameter>,
    pub body: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub function: Box<Expr>,
    pub arguments: Vec<CallArgument>,
}

/// One argument at a call site.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArgument {
    pub name: Option<Symbol>,
    pub value: Box<Expr>,
    pub span: Option<TextSpan>,
    /// The scope the value is evaluated in.
    pub alias: Option<AliasInfo>,
    /// Set by the demand analyzer: whether code generation must wrap the
    /// value in a new suspended computation.
    pub should_be_suspended: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: Symbol,
    pub expression: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub expressions: Vec<Expr>,
    pub return_value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub scrutinee: Box<Expr>,
    pub branches: Vec<CaseBranch>,
    /// Taken when no branch matches.
    pub fallback: Option<Box<CaseBranch>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    pub pattern: Pattern,
    pub body: Expr,
    pub span: Option<TextSpan>,
    /// The scope holding the pattern's variables.
    pub alias: Option<AliasInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Foreign {
    pub language: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub doc: String,
    pub commented: Box<Expr>,
}

// ============================================================================
// Arguments and patterns
// ============================================================================

/// An entry of a lambda's or a data constructor's argument list.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Argument(DefinitionArgument),
    /// An argument whose name is already taken in the same list. The error
    /// carries the original argument, unannotated.
    Redefined(ErrorNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionArgument {
    pub name: Symbol,
    pub default: Option<Box<Expr>>,
    /// Declared to receive a suspended computation.
    pub suspended: bool,
    pub span: Option<TextSpan>,
    /// The definition occurrence of the argument.
    pub alias: Option<AliasInfo>,
}

/// A name in a pattern or a reference to a constructor or type.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: Symbol,
    pub span: Option<TextSpan>,
    pub alias: Option<AliasInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// `_`: matches anything, binds nothing.
    Blank,
    /// Binds the scrutinee to a variable.
    Name(Ident),
    /// Matches a constructor and destructures its fields.
    Constructor { constructor: Ident, fields: Vec<Pattern> },
    Literal(Literal),
    /// Binds the scrutinee to `name` if it is an instance of `type_name`.
    Type { name: Ident, type_name: Ident },
    Error(ErrorNode),
}

// ============================================================================
// Errors
// ============================================================================

/// A problem in the program, embedded in the tree in place of the offending
/// node.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNode {
    pub kind: ErrorKind,
    pub diagnostic: Diagnostic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// Reported by an upstream stage; opaque to the analysis.
    Opaque,
    /// The binding's symbol was already defined in the same scope. The
    /// bound expression has still been analyzed.
    RedefinedBinding(Box<Binding>),
    RedefinedArgument(Box<DefinitionArgument>),
    RedefinedPatternVariable(Ident),
}

// ============================================================================
// Top-level definitions
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone)]
pub enum Definition {
    Method(Method),
    Type(TypeDefinition),
}

/// A method. Its body is one top-level definition with its own graph.
#[derive(Debug, Clone)]
pub struct Method {
    pub type_name: Option<Symbol>,
    pub name: Symbol,
    pub body: Expr,
    pub span: Option<TextSpan>,
    pub scope: Option<DefinitionScope>,
    pub passes: PassFlags,
}

#[derive(Debug, Clone)]
pub struct TypeDefinition {
    pub name: Symbol,
    pub constructors: Vec<DataConstructor>,
    pub span: Option<TextSpan>,
}

/// A data constructor. Its argument defaults form one top-level definition
/// with its own graph.
#[derive(Debug, Clone)]
pub struct DataConstructor {
    pub name: Symbol,
    pub arguments: Vec<Parameter>,
    pub span: Option<TextSpan>,
    pub scope: Option<DefinitionScope>,
    pub passes: PassFlags,
}

/// An expression analyzed inside an existing lexical context rather than as
/// a definition of its own. The graph it was built against stays with the
/// caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub expr: Expr,
    pub passes: PassFlags,
}

// ============================================================================
// Construction helpers
// ============================================================================

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            span: None,
            alias: None,
        }
    }

    pub fn with_span(mut self, span: TextSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn number(text: &str) -> Self {
        Self::new(ExprKind::Literal(Literal::Number(text.to_string())))
    }

    pub fn text(text: &str) -> Self {
        Self::new(ExprKind::Literal(Literal::Text(text.to_string())))
    }

    pub fn name(symbol: Symbol) -> Self {
        Self::new(ExprKind::Name(symbol))
    }

    pub fn lambda(arguments: Vec<DefinitionArgument>, body: Expr) -> Self {
        Self::new(ExprKind::Lambda(Lambda {
            arguments: arguments.into_iter().map(Parameter::Argument).collect(),
            body: Box::new(body),
        }))
    }

    pub fn apply(function: Expr, arguments: Vec<CallArgument>) -> Self {
        Self::new(ExprKind::Application(Application {
            function: Box::new(function),
            arguments,
        }))
    }

    /// A call with positional arguments only.
    pub fn call(function: Expr, values: Vec<Expr>) -> Self {
        Self::apply(function, values.into_iter().map(CallArgument::positional).collect())
    }

    pub fn force(target: Expr) -> Self {
        Self::new(ExprKind::Force(Box::new(target)))
    }

    pub fn sequence(items: Vec<Expr>) -> Self {
        Self::new(ExprKind::Sequence(items))
    }

    pub fn binding(name: Symbol, expression: Expr) -> Self {
        Self::new(ExprKind::Binding(Binding {
            name,
            expression: Box::new(expression),
        }))
    }

    pub fn block(expressions: Vec<Expr>, return_value: Expr) -> Self {
        Self::new(ExprKind::Block(Block {
            expressions,
            return_value: Box::new(return_value),
        }))
    }

    pub fn case(scrutinee: Expr, branches: Vec<CaseBranch>, fallback: Option<CaseBranch>) -> Self {
        Self::new(ExprKind::Case(Case {
            scrutinee: Box::new(scrutinee),
            branches,
            fallback: fallback.map(Box::new),
        }))
    }

    pub fn foreign(language: &str, code: &str) -> Self {
        Self::new(ExprKind::Foreign(Foreign {
            language: language.to_string(),
            code: code.to_string(),
        }))
    }

    pub fn comment(doc: &str, commented: Expr) -> Self {
        Self::new(ExprKind::Comment(Comment {
            doc: doc.to_string(),
            commented: Box::new(commented),
        }))
    }

    pub fn error(diagnostic: Diagnostic) -> Self {
        Self::new(ExprKind::Error(ErrorNode {
            kind: ErrorKind::Opaque,
            diagnostic,
        }))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_))
    }

    /// The symbol if this is a bare name.
    pub fn as_name(&self) -> Option<Symbol> {
        match self.kind {
            ExprKind::Name(symbol) => Some(symbol),
            _ => None,
        }
    }
}

impl CallArgument {
    pub fn positional(value: Expr) -> Self {
        Self {
            name: None,
            value: Box::new(value),
            span: None,
            alias: None,
            should_be_suspended: None,
        }
    }

    pub fn named(name: Symbol, value: Expr) -> Self {
        Self {
            name: Some(name),
            ..Self::positional(value)
        }
    }
}

impl DefinitionArgument {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            default: None,
            suspended: false,
            span: None,
            alias: None,
        }
    }

    /// An argument declared to receive a suspended computation.
    pub fn suspended(name: Symbol) -> Self {
        Self {
            suspended: true,
            ..Self::new(name)
        }
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(Box::new(default));
        self
    }
}

impl Parameter {
    /// The argument if it was not reified as a redefinition.
    pub fn as_argument(&self) -> Option<&DefinitionArgument> {
        match self {
            Parameter::Argument(arg) => Some(arg),
            Parameter::Redefined(_) => None,
        }
    }
}

impl Ident {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            span: None,
            alias: None,
        }
    }
}

impl CaseBranch {
    pub fn new(pattern: Pattern, body: Expr) -> Self {
        Self {
            pattern,
            body,
            span: None,
            alias: None,
        }
    }
}

impl Pattern {
    pub fn name(symbol: Symbol) -> Self {
        Pattern::Name(Ident::new(symbol))
    }

    pub fn constructor(constructor: Symbol, fields: Vec<Pattern>) -> Self {
        Pattern::Constructor {
            constructor: Ident::new(constructor),
            fields,
        }
    }

    pub fn typed(name: Symbol, type_name: Symbol) -> Self {
        Pattern::Type {
            name: Ident::new(name),
            type_name: Ident::new(type_name),
        }
    }
}

impl Method {
    pub fn new(type_name: Option<Symbol>, name: Symbol, body: Expr) -> Self {
        Self {
            type_name,
            name,
            body,
            span: None,
            scope: None,
            passes: PassFlags::NONE,
        }
    }
}

impl DataConstructor {
    pub fn new(name: Symbol, arguments: Vec<DefinitionArgument>) -> Self {
        Self {
            name,
            arguments: arguments.into_iter().map(Parameter::Argument).collect(),
            span: None,
            scope: None,
            passes: PassFlags::NONE,
        }
    }
}

impl Module {
    pub fn new(definitions: Vec<Definition>) -> Self {
        Self { definitions }
    }
}
