//! IR visitor trait for traversing analyzed and unanalyzed trees.
//!
//! Provides an `IrVisitor` trait whose default methods walk into children,
//! plus the free `walk_*` functions implementors call to keep walking after
//! handling a node themselves.

use crate::node::*;

/// A visitor over the IR. Default implementations walk into children.
pub trait IrVisitor<'a> {
    fn visit_definition(&mut self, definition: &'a Definition) {
        walk_definition(self, definition);
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        walk_expr(self, expr);
    }

    fn visit_parameter(&mut self, parameter: &'a Parameter) {
        walk_parameter(self, parameter);
    }

    fn visit_call_argument(&mut self, argument: &'a CallArgument) {
        self.visit_expr(&argument.value);
    }

    fn visit_branch(&mut self, branch: &'a CaseBranch) {
        self.visit_pattern(&branch.pattern);
        self.visit_expr(&branch.body);
    }

    fn visit_pattern(&mut self, pattern: &'a Pattern) {
        walk_pattern(self, pattern);
    }

    fn visit_error(&mut self, error: &'a ErrorNode) {
        walk_error(self, error);
    }
}

pub fn walk_definition<'a, V: IrVisitor<'a> + ?Sized>(visitor: &mut V, definition: &'a Definition) {
    match definition {
        Definition::Method(method) => visitor.visit_expr(&method.body),
        Definition::Type(ty) => {
            for constructor in &ty.constructors {
                for parameter in &constructor.arguments {
                    visitor.visit_parameter(parameter);
                }
            }
        }
    }
}

pub fn walk_expr<'a, V: IrVisitor<'a> + ?Sized>(visitor: &mut V, expr: &'a Expr) {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Name(_) | ExprKind::Foreign(_) => {}
        ExprKind::Lambda(lambda) => {
            for parameter in &lambda.arguments {
                visitor.visit_parameter(parameter);
            }
            visitor.visit_expr(&lambda.body);
        }
        ExprKind::Application(app) => {
            visitor.visit_expr(&app.function);
            for argument in &app.arguments {
                visitor.visit_call_argument(argument);
            }
        }
        ExprKind::Force(target) => visitor.visit_expr(target),
        ExprKind::Sequence(items) => {
            for item in items {
                visitor.visit_expr(item);
            }
        }
        ExprKind::Binding(binding) => visitor.visit_expr(&binding.expression),
        ExprKind::Block(block) => {
            for statement in &block.expressions {
                visitor.visit_expr(statement);
            }
            visitor.visit_expr(&block.return_value);
        }
        ExprKind::Case(case) => {
            visitor.visit_expr(&case.scrutinee);
            for branch in &case.branches {
                visitor.visit_branch(branch);
            }
            if let Some(fallback) = &case.fallback {
                visitor.visit_branch(fallback);
            }
        }
        ExprKind::Comment(comment) => visitor.visit_expr(&comment.commented),
        ExprKind::Error(error) => visitor.visit_error(error),
    }
}

pub fn walk_parameter<'a, V: IrVisitor<'a> + ?Sized>(visitor: &mut V, parameter: &'a Parameter) {
    match parameter {
        Parameter::Argument(argument) => {
            if let Some(default) = &argument.default {
                visitor.visit_expr(default);
            }
        }
        Parameter::Redefined(error) => visitor.visit_error(error),
    }
}

pub fn walk_pattern<'a, V: IrVisitor<'a> + ?Sized>(visitor: &mut V, pattern: &'a Pattern) {
    match pattern {
        Pattern::Constructor { fields, .. } => {
            for field in fields {
                visitor.visit_pattern(field);
            }
        }
        Pattern::Error(error) => visitor.visit_error(error),
        Pattern::Blank | Pattern::Name(_) | Pattern::Literal(_) | Pattern::Type { .. } => {}
    }
}

pub fn walk_error<'a, V: IrVisitor<'a> + ?Sized>(visitor: &mut V, error: &'a ErrorNode) {
    match &error.kind {
        ErrorKind::RedefinedBinding(binding) => visitor.visit_expr(&binding.expression),
        ErrorKind::RedefinedArgument(argument) => {
            if let Some(default) = &argument.default {
                visitor.visit_expr(default);
            }
        }
        ErrorKind::Opaque | ErrorKind::RedefinedPatternVariable(_) => {}
    }
}

/// Collects every error node of a tree, outermost first.
#[derive(Debug, Default)]
pub struct ErrorCollector<'a> {
    pub errors: Vec<&'a ErrorNode>,
}

impl<'a> IrVisitor<'a> for ErrorCollector<'a> {
    fn visit_error(&mut self, error: &'a ErrorNode) {
        self.errors.push(error);
        walk_error(self, error);
    }
}

/// All error nodes embedded in a definition.
pub fn collect_errors(definition: &Definition) -> Vec<&ErrorNode> {
    let mut collector = ErrorCollector::default();
    collector.visit_definition(definition);
    collector.errors
}

/// All error nodes embedded in an expression.
pub fn collect_expr_errors(expr: &Expr) -> Vec<&ErrorNode> {
    let mut collector = ErrorCollector::default();
    collector.visit_expr(expr);
    collector.errors
}

/// Looks for any annotation left by an earlier run of a pass.
#[derive(Debug, Default)]
struct AnnotationFinder {
    found: bool,
}

impl AnnotationFinder {
    fn ident(&mut self, ident: &Ident) {
        self.found |= ident.alias.is_some();
    }
}

impl<'a> IrVisitor<'a> for AnnotationFinder {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if self.found || expr.alias.is_some() {
            self.found = true;
            return;
        }
        walk_expr(self, expr);
    }

    fn visit_parameter(&mut self, parameter: &'a Parameter) {
        if let Parameter::Argument(argument) = parameter {
            self.found |= argument.alias.is_some();
        }
        if !self.found {
            walk_parameter(self, parameter);
        }
    }

    fn visit_call_argument(&mut self, argument: &'a CallArgument) {
        self.found |= argument.alias.is_some() || argument.should_be_suspended.is_some();
        if !self.found {
            self.visit_expr(&argument.value);
        }
    }

    fn visit_branch(&mut self, branch: &'a CaseBranch) {
        self.found |= branch.alias.is_some();
        if !self.found {
            self.visit_pattern(&branch.pattern);
            self.visit_expr(&branch.body);
        }
    }

    fn visit_pattern(&mut self, pattern: &'a Pattern) {
        match pattern {
            Pattern::Name(name) => self.ident(name),
            Pattern::Type { name, type_name } => {
                self.ident(name);
                self.ident(type_name);
            }
            Pattern::Constructor { constructor, .. } => self.ident(constructor),
            Pattern::Blank | Pattern::Literal(_) | Pattern::Error(_) => {}
        }
        if !self.found {
            walk_pattern(self, pattern);
        }
    }
}

/// Whether any node of `expr` carries an annotation.
pub fn is_annotated(expr: &Expr) -> bool {
    let mut finder = AnnotationFinder::default();
    finder.visit_expr(expr);
    finder.found
}

/// Whether any argument of a list, or anything in its defaults, carries an
/// annotation.
pub fn parameters_annotated(parameters: &[Parameter]) -> bool {
    let mut finder = AnnotationFinder::default();
    for parameter in parameters {
        finder.visit_parameter(parameter);
    }
    finder.found
}

/// All error nodes embedded in an argument list.
pub fn collect_parameter_errors(parameters: &[Parameter]) -> Vec<&ErrorNode> {
    let mut collector = ErrorCollector::default();
    for parameter in parameters {
        collector.visit_parameter(parameter);
    }
    collector.errors
}
