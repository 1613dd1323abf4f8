//! The scope graph builder.
//!
//! Scope allocation rules:
//! - a lambda gets one scope shared by its arguments and its body; a block
//!   body reuses it
//! - a method whose body is a lambda reuses the definition's root scope
//! - every block, case branch and fallback gets a fresh scope
//! - every call argument gets a fresh scope, unless the value is a bare
//!   literal
//! - argument defaults live in the scope of the arguments themselves
//!
//! Uses are resolved as soon as they are registered, so a name only sees the
//! definitions introduced before it. That is what keeps argument defaults
//! from referring to later arguments.

use laze_core::intern::StringInterner;
use laze_core::text::TextSpan;
use laze_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use laze_graph::{Graph, Occurrence, OccurrenceId, ScopeId};
use laze_ir::node::*;
use laze_ir::types::{AliasInfo, DefinitionScope, PassFlags};
use laze_ir::visitor::{is_annotated, parameters_annotated};
use laze_ir::PassError;

const PASS_NAME: &str = "scope graph";

/// Builds the scope graph of top-level definitions and annotates their IR.
pub struct ScopeGraphBuilder {
    interner: StringInterner,
    /// Shadowing warnings; redefinition errors live in the tree.
    diagnostics: DiagnosticCollection,
    warn_on_shadowing: bool,
}

impl ScopeGraphBuilder {
    pub fn new(interner: StringInterner) -> Self {
        Self {
            interner,
            diagnostics: DiagnosticCollection::new(),
            warn_on_shadowing: true,
        }
    }

    pub fn with_shadowing_warnings(mut self, enabled: bool) -> Self {
        self.warn_on_shadowing = enabled;
        self
    }

    /// Take the warnings reported so far.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Build the graph of a method body, attaching it to the method.
    pub fn build_method(&mut self, mut method: Method) -> Result<Method, PassError> {
        if method.passes.contains(PassFlags::SCOPE_GRAPH) || is_annotated(&method.body) {
            return Err(PassError::AlreadyAnalyzed { pass: PASS_NAME });
        }
        let (body, graph) = self.build_scope_graph(method.body)?;
        log::debug!(
            "built scope graph for method {}: {} scopes, {} links",
            self.interner.resolve(method.name),
            graph.num_scopes(),
            graph.num_links()
        );
        method.body = body;
        method.scope = Some(DefinitionScope::new(graph));
        method.passes |= PassFlags::SCOPE_GRAPH;
        Ok(method)
    }

    /// Build the graph of a data constructor's arguments and their defaults.
    pub fn build_constructor(&mut self, mut constructor: DataConstructor) -> Result<DataConstructor, PassError> {
        if constructor.passes.contains(PassFlags::SCOPE_GRAPH) || parameters_annotated(&constructor.arguments) {
            return Err(PassError::AlreadyAnalyzed { pass: PASS_NAME });
        }
        let mut graph = Graph::new();
        let root = graph.root_scope();
        constructor.arguments = self.analyze_parameters(&mut graph, constructor.arguments, root)?;
        constructor.scope = Some(DefinitionScope::new(graph));
        constructor.passes |= PassFlags::SCOPE_GRAPH;
        Ok(constructor)
    }

    /// Build a fresh graph for the body of a top-level definition.
    ///
    /// A body that is a lambda shares the root scope, so a method written as
    /// a lambda around a block allocates exactly one scope for both.
    ///
    /// Any annotation anywhere in `body` means a pass already ran over it.
    pub fn build_scope_graph(&mut self, body: Expr) -> Result<(Expr, Graph), PassError> {
        if is_annotated(&body) {
            return Err(PassError::AlreadyAnalyzed { pass: PASS_NAME });
        }
        let mut graph = Graph::new();
        let root = graph.root_scope();
        let Expr { kind, span, .. } = body;
        let body = match kind {
            ExprKind::Lambda(lambda) => self.analyze_lambda(&mut graph, lambda, span, root, true)?,
            kind => self.analyze_expr(&mut graph, Expr { kind, span, alias: None }, root)?,
        };
        Ok((body, graph))
    }

    /// Analyze a fragment inside an existing lexical context, extending the
    /// caller's graph. Used for interactive evaluation.
    pub fn build_expression(&mut self, expr: Expr, graph: &mut Graph, scope: ScopeId) -> Result<Fragment, PassError> {
        if is_annotated(&expr) {
            return Err(PassError::AlreadyAnalyzed { pass: PASS_NAME });
        }
        graph.scope(scope)?;
        let expr = self.analyze_expr(graph, expr, scope)?;
        Ok(Fragment {
            expr,
            passes: PassFlags::SCOPE_GRAPH,
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn analyze_expr(&mut self, graph: &mut Graph, expr: Expr, scope: ScopeId) -> Result<Expr, PassError> {
        let Expr { kind, span, .. } = expr;
        match kind {
            ExprKind::Name(symbol) => self.analyze_name(graph, symbol, span, scope),
            ExprKind::Lambda(lambda) => self.analyze_lambda(graph, lambda, span, scope, false),
            ExprKind::Block(block) => self.analyze_block(graph, block, span, scope, false),
            ExprKind::Binding(binding) => self.analyze_binding(graph, binding, span, scope),
            ExprKind::Application(app) => {
                let function = self.analyze_expr(graph, *app.function, scope)?;
                let arguments = app
                    .arguments
                    .into_iter()
                    .map(|arg| self.analyze_call_argument(graph, arg, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(unannotated(
                    ExprKind::Application(Application {
                        function: Box::new(function),
                        arguments,
                    }),
                    span,
                ))
            }
            ExprKind::Force(target) => {
                let target = self.analyze_expr(graph, *target, scope)?;
                Ok(unannotated(ExprKind::Force(Box::new(target)), span))
            }
            ExprKind::Sequence(items) => {
                let items = items
                    .into_iter()
                    .map(|item| self.analyze_expr(graph, item, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(unannotated(ExprKind::Sequence(items), span))
            }
            ExprKind::Case(case) => self.analyze_case(graph, case, span, scope),
            ExprKind::Comment(comment) => {
                let commented = self.analyze_expr(graph, *comment.commented, scope)?;
                Ok(unannotated(
                    ExprKind::Comment(Comment {
                        doc: comment.doc,
                        commented: Box::new(commented),
                    }),
                    span,
                ))
            }
            kind @ (ExprKind::Literal(_) | ExprKind::Foreign(_) | ExprKind::Error(_)) => Ok(unannotated(kind, span)),
        }
    }

    fn analyze_name(
        &mut self,
        graph: &mut Graph,
        symbol: Symbol,
        span: Option<TextSpan>,
        scope: ScopeId,
    ) -> Result<Expr, PassError> {
        let id = self.register_usage(graph, symbol, scope)?;
        Ok(Expr {
            kind: ExprKind::Name(symbol),
            span,
            alias: Some(AliasInfo::Occurrence(id)),
        })
    }

    fn analyze_lambda(
        &mut self,
        graph: &mut Graph,
        lambda: Lambda,
        span: Option<TextSpan>,
        scope: ScopeId,
        reuse_scope: bool,
    ) -> Result<Expr, PassError> {
        let lambda_scope = if reuse_scope { scope } else { graph.add_child(scope)? };
        let arguments = self.analyze_parameters(graph, lambda.arguments, lambda_scope)?;
        let Expr { kind, span: body_span, .. } = *lambda.body;
        let body = match kind {
            ExprKind::Block(block) => self.analyze_block(graph, block, body_span, lambda_scope, true)?,
            kind => self.analyze_expr(graph, unannotated(kind, body_span), lambda_scope)?,
        };
        Ok(Expr {
            kind: ExprKind::Lambda(Lambda {
                arguments,
                body: Box::new(body),
            }),
            span,
            alias: Some(AliasInfo::ChildScope(lambda_scope)),
        })
    }

    fn analyze_block(
        &mut self,
        graph: &mut Graph,
        block: Block,
        span: Option<TextSpan>,
        scope: ScopeId,
        reuse_scope: bool,
    ) -> Result<Expr, PassError> {
        let block_scope = if reuse_scope { scope } else { graph.add_child(scope)? };
        let expressions = block
            .expressions
            .into_iter()
            .map(|statement| self.analyze_expr(graph, statement, block_scope))
            .collect::<Result<Vec<_>, _>>()?;
        let return_value = self.analyze_expr(graph, *block.return_value, block_scope)?;
        Ok(Expr {
            kind: ExprKind::Block(Block {
                expressions,
                return_value: Box::new(return_value),
            }),
            span,
            alias: Some(AliasInfo::ChildScope(block_scope)),
        })
    }

    fn analyze_binding(
        &mut self,
        graph: &mut Graph,
        binding: Binding,
        span: Option<TextSpan>,
        scope: ScopeId,
    ) -> Result<Expr, PassError> {
        let name = binding.name;
        if graph.scope(scope)?.has_definition(name) {
            log::debug!("binding {} redefined in {}", self.interner.resolve(name), scope);
            let expression = self.analyze_expr(graph, *binding.expression, scope)?;
            let diagnostic = Diagnostic::with_span(
                span,
                &messages::VARIABLE_0_IS_BEING_REDEFINED,
                &[self.interner.resolve(name)],
            );
            return Ok(unannotated(
                ExprKind::Error(ErrorNode {
                    kind: ErrorKind::RedefinedBinding(Box::new(Binding {
                        name,
                        expression: Box::new(expression),
                    })),
                    diagnostic,
                }),
                span,
            ));
        }

        // Defined before the expression is analyzed, so recursive bindings
        // resolve to themselves.
        let id = self.register_definition(graph, name, false, scope)?;
        self.report_shadowing(graph, id, span, &messages::BINDING_0_SHADOWS_AN_OUTER_DEFINITION)?;
        let expression = self.analyze_expr(graph, *binding.expression, scope)?;
        Ok(Expr {
            kind: ExprKind::Binding(Binding {
                name,
                expression: Box::new(expression),
            }),
            span,
            alias: Some(AliasInfo::Occurrence(id)),
        })
    }

    fn analyze_call_argument(
        &mut self,
        graph: &mut Graph,
        argument: CallArgument,
        scope: ScopeId,
    ) -> Result<CallArgument, PassError> {
        // Literals capture nothing, a dedicated scope would be wasted.
        let argument_scope = if argument.value.is_literal() {
            scope
        } else {
            graph.add_child(scope)?
        };
        let value = self.analyze_expr(graph, *argument.value, argument_scope)?;
        Ok(CallArgument {
            value: Box::new(value),
            alias: Some(AliasInfo::ChildScope(argument_scope)),
            ..argument
        })
    }

    fn analyze_case(
        &mut self,
        graph: &mut Graph,
        case: Case,
        span: Option<TextSpan>,
        scope: ScopeId,
    ) -> Result<Expr, PassError> {
        let scrutinee = self.analyze_expr(graph, *case.scrutinee, scope)?;
        let branches = case
            .branches
            .into_iter()
            .map(|branch| self.analyze_branch(graph, branch, scope))
            .collect::<Result<Vec<_>, _>>()?;
        let fallback = match case.fallback {
            Some(fallback) => Some(Box::new(self.analyze_branch(graph, *fallback, scope)?)),
            None => None,
        };
        Ok(unannotated(
            ExprKind::Case(Case {
                scrutinee: Box::new(scrutinee),
                branches,
                fallback,
            }),
            span,
        ))
    }

    /// Pattern variables are confined to their own branch.
    fn analyze_branch(&mut self, graph: &mut Graph, branch: CaseBranch, scope: ScopeId) -> Result<CaseBranch, PassError> {
        let branch_scope = graph.add_child(scope)?;
        let pattern = self.analyze_pattern(graph, branch.pattern, branch_scope)?;
        let body = self.analyze_expr(graph, branch.body, branch_scope)?;
        Ok(CaseBranch {
            pattern,
            body,
            span: branch.span,
            alias: Some(AliasInfo::ChildScope(branch_scope)),
        })
    }

    fn analyze_pattern(&mut self, graph: &mut Graph, pattern: Pattern, scope: ScopeId) -> Result<Pattern, PassError> {
        match pattern {
            Pattern::Name(ident) => self.bind_pattern_name(graph, ident, scope),
            Pattern::Constructor { constructor, fields } => {
                let constructor = self.analyze_ident_usage(graph, constructor, scope)?;
                let fields = fields
                    .into_iter()
                    .map(|field| self.analyze_pattern(graph, field, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Pattern::Constructor { constructor, fields })
            }
            Pattern::Type { name, type_name } => {
                // The whole pattern is replaced on redefinition, so the type
                // name must not be registered in that case.
                if graph.scope(scope)?.has_definition(name.name) {
                    return Ok(self.redefined_pattern_variable(name));
                }
                let type_name = self.analyze_ident_usage(graph, type_name, scope)?;
                match self.bind_pattern_name(graph, name, scope)? {
                    Pattern::Name(name) => Ok(Pattern::Type { name, type_name }),
                    redefined => Ok(redefined),
                }
            }
            pattern @ (Pattern::Blank | Pattern::Literal(_) | Pattern::Error(_)) => Ok(pattern),
        }
    }

    /// Returns either the annotated name pattern or an error pattern if the
    /// branch already binds the name.
    fn bind_pattern_name(&mut self, graph: &mut Graph, ident: Ident, scope: ScopeId) -> Result<Pattern, PassError> {
        if graph.scope(scope)?.has_definition(ident.name) {
            return Ok(self.redefined_pattern_variable(ident));
        }
        let id = self.register_definition(graph, ident.name, false, scope)?;
        self.report_shadowing(graph, id, ident.span, &messages::PATTERN_VARIABLE_0_SHADOWS_AN_OUTER_DEFINITION)?;
        Ok(Pattern::Name(Ident {
            alias: Some(AliasInfo::Occurrence(id)),
            ..ident
        }))
    }

    fn redefined_pattern_variable(&self, ident: Ident) -> Pattern {
        let diagnostic = Diagnostic::with_span(
            ident.span,
            &messages::PATTERN_VARIABLE_0_IS_BEING_REDEFINED,
            &[self.interner.resolve(ident.name)],
        );
        Pattern::Error(ErrorNode {
            kind: ErrorKind::RedefinedPatternVariable(ident),
            diagnostic,
        })
    }

    fn analyze_ident_usage(&mut self, graph: &mut Graph, ident: Ident, scope: ScopeId) -> Result<Ident, PassError> {
        let id = self.register_usage(graph, ident.name, scope)?;
        Ok(Ident {
            alias: Some(AliasInfo::Occurrence(id)),
            ..ident
        })
    }

    // ========================================================================
    // Arguments
    // ========================================================================

    fn analyze_parameters(
        &mut self,
        graph: &mut Graph,
        parameters: Vec<Parameter>,
        scope: ScopeId,
    ) -> Result<Vec<Parameter>, PassError> {
        parameters
            .into_iter()
            .map(|parameter| match parameter {
                Parameter::Argument(argument) => self.analyze_argument(graph, argument, scope),
                redefined @ Parameter::Redefined(_) => Ok(redefined),
            })
            .collect()
    }

    fn analyze_argument(
        &mut self,
        graph: &mut Graph,
        argument: DefinitionArgument,
        scope: ScopeId,
    ) -> Result<Parameter, PassError> {
        if graph.scope(scope)?.has_definition(argument.name) {
            log::debug!("argument {} redefined in {}", self.interner.resolve(argument.name), scope);
            let diagnostic = Diagnostic::with_span(
                argument.span,
                &messages::ARGUMENT_0_IS_BEING_REDEFINED,
                &[self.interner.resolve(argument.name)],
            );
            return Ok(Parameter::Redefined(ErrorNode {
                kind: ErrorKind::RedefinedArgument(Box::new(argument)),
                diagnostic,
            }));
        }

        // The default is analyzed before the argument is defined: it may
        // only see the arguments to its left.
        let default = match argument.default {
            Some(default) => Some(Box::new(self.analyze_expr(graph, *default, scope)?)),
            None => None,
        };

        let id = self.register_definition(graph, argument.name, argument.suspended, scope)?;
        self.report_shadowing(graph, id, argument.span, &messages::ARGUMENT_0_SHADOWS_AN_OUTER_DEFINITION)?;
        Ok(Parameter::Argument(DefinitionArgument {
            default,
            alias: Some(AliasInfo::Occurrence(id)),
            ..argument
        }))
    }

    // ========================================================================
    // Occurrences
    // ========================================================================

    fn register_definition(
        &mut self,
        graph: &mut Graph,
        symbol: Symbol,
        is_lazy: bool,
        scope: ScopeId,
    ) -> Result<OccurrenceId, PassError> {
        let id = graph.next_id();
        graph.add_occurrence(scope, Occurrence::def(id, symbol, is_lazy))?;
        Ok(id)
    }

    fn register_usage(&mut self, graph: &mut Graph, symbol: Symbol, scope: ScopeId) -> Result<OccurrenceId, PassError> {
        let id = graph.next_id();
        graph.add_occurrence(scope, Occurrence::usage(id, symbol))?;
        match graph.resolve_usage(id)? {
            Some(link) => log::trace!(
                "{} {} -> {} ({} hops)",
                self.interner.resolve(symbol),
                id,
                link.target,
                link.scope_distance
            ),
            None => log::trace!("{} {} left for global resolution", self.interner.resolve(symbol), id),
        }
        Ok(id)
    }

    fn report_shadowing(
        &mut self,
        graph: &Graph,
        id: OccurrenceId,
        span: Option<TextSpan>,
        message: &DiagnosticMessage,
    ) -> Result<(), PassError> {
        if !self.warn_on_shadowing {
            return Ok(());
        }
        if !graph.can_shadow(id)? {
            return Ok(());
        }
        let symbol = graph.occurrence(id)?.symbol();
        self.diagnostics
            .add(Diagnostic::with_span(span, message, &[self.interner.resolve(symbol)]));
        Ok(())
    }
}

fn unannotated(kind: ExprKind, span: Option<TextSpan>) -> Expr {
    Expr { kind, span, alias: None }
}
