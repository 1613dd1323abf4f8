//! The demand analyzer.
//!
//! Forcing and suspension are decided asymmetrically. A name is never forced
//! as the direct value of a call argument: arguments are passed as shared
//! suspended computations, and forcing there would evaluate too early. An
//! argument is suspended at the call site unless its value already is a bare
//! reference to a suspended binding, in which case it is forwarded as-is.

use laze_graph::Graph;
use laze_ir::node::*;
use laze_ir::types::{AliasInfo, PassFlags};
use laze_ir::PassError;
use std::sync::Arc;

const PASS_NAME: &str = "demand";

/// Flags threaded top-down through the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct DemandContext {
    inside_application: bool,
    /// Only set for the immediate value of a call argument.
    inside_call_argument: bool,
}

impl DemandContext {
    /// Function bodies, branch bodies and vector items start afresh.
    const FRESH: DemandContext = DemandContext {
        inside_application: false,
        inside_call_argument: false,
    };
    const CALLEE: DemandContext = DemandContext {
        inside_application: true,
        inside_call_argument: false,
    };
    const CALL_ARGUMENT: DemandContext = DemandContext {
        inside_application: true,
        inside_call_argument: true,
    };
}

/// Run demand analysis over a method whose scope graph has been built.
pub fn analyze_method(mut method: Method) -> Result<Method, PassError> {
    let graph = checked_graph(method.passes, method.scope.as_ref().map(|s| &s.graph))?;
    method.body = DemandAnalyzer::new(&graph).analyze_expression(method.body)?;
    method.passes |= PassFlags::DEMAND;
    Ok(method)
}

/// Run demand analysis over a data constructor's argument defaults.
pub fn analyze_constructor(mut constructor: DataConstructor) -> Result<DataConstructor, PassError> {
    let graph = checked_graph(constructor.passes, constructor.scope.as_ref().map(|s| &s.graph))?;
    constructor.arguments = DemandAnalyzer::new(&graph).analyze_parameters(constructor.arguments)?;
    constructor.passes |= PassFlags::DEMAND;
    Ok(constructor)
}

/// Run demand analysis over every top-level definition contained in `definition`.
pub fn analyze_definition(definition: Definition) -> Result<Definition, PassError> {
    match definition {
        Definition::Method(method) => analyze_method(method).map(Definition::Method),
        Definition::Type(mut ty) => {
            ty.constructors = ty
                .constructors
                .into_iter()
                .map(analyze_constructor)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Definition::Type(ty))
        }
    }
}

fn checked_graph(passes: PassFlags, graph: Option<&Arc<Graph>>) -> Result<Arc<Graph>, PassError> {
    if passes.contains(PassFlags::DEMAND) {
        return Err(PassError::AlreadyAnalyzed { pass: PASS_NAME });
    }
    match graph {
        Some(graph) if passes.contains(PassFlags::SCOPE_GRAPH) => Ok(Arc::clone(graph)),
        _ => Err(PassError::MissingScopeGraph),
    }
}

/// Rewrites a tree annotated by the scope graph builder against its graph.
pub struct DemandAnalyzer<'g> {
    graph: &'g Graph,
}

impl<'g> DemandAnalyzer<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    /// Analyze a fragment built inside this analyzer's graph. The fragment
    /// is evaluated in a fresh context.
    pub fn analyze_fragment(&self, mut fragment: Fragment) -> Result<Fragment, PassError> {
        if fragment.passes.contains(PassFlags::DEMAND) {
            return Err(PassError::AlreadyAnalyzed { pass: PASS_NAME });
        }
        if !fragment.passes.contains(PassFlags::SCOPE_GRAPH) {
            return Err(PassError::MissingScopeGraph);
        }
        fragment.expr = self.analyze_expression(fragment.expr)?;
        fragment.passes |= PassFlags::DEMAND;
        Ok(fragment)
    }

    fn analyze_expression(&self, expr: Expr) -> Result<Expr, PassError> {
        self.analyze(expr, DemandContext::FRESH)
    }

    fn analyze_parameters(&self, parameters: Vec<Parameter>) -> Result<Vec<Parameter>, PassError> {
        parameters
            .into_iter()
            .map(|parameter| match parameter {
                Parameter::Argument(mut argument) => {
                    if let Some(default) = argument.default.take() {
                        argument.default = Some(Box::new(self.analyze(*default, DemandContext::FRESH)?));
                    }
                    Ok(Parameter::Argument(argument))
                }
                redefined @ Parameter::Redefined(_) => Ok(redefined),
            })
            .collect()
    }

    fn analyze(&self, expr: Expr, ctx: DemandContext) -> Result<Expr, PassError> {
        let Expr { kind, span, alias } = expr;
        let kind = match kind {
            ExprKind::Name(symbol) => {
                let name = Expr {
                    kind: ExprKind::Name(symbol),
                    span,
                    alias,
                };
                return self.analyze_name(name, ctx);
            }
            ExprKind::Lambda(lambda) => ExprKind::Lambda(Lambda {
                arguments: self.analyze_parameters(lambda.arguments)?,
                body: Box::new(self.analyze(*lambda.body, DemandContext::FRESH)?),
            }),
            ExprKind::Application(app) => {
                let function = self.analyze(*app.function, DemandContext::CALLEE)?;
                let arguments = app
                    .arguments
                    .into_iter()
                    .map(|argument| self.analyze_call_argument(argument))
                    .collect::<Result<Vec<_>, _>>()?;
                ExprKind::Application(Application {
                    function: Box::new(function),
                    arguments,
                })
            }
            ExprKind::Force(target) => ExprKind::Force(Box::new(self.analyze(*target, ctx)?)),
            ExprKind::Sequence(items) => ExprKind::Sequence(
                items
                    .into_iter()
                    .map(|item| self.analyze(item, DemandContext::FRESH))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            ExprKind::Binding(binding) => {
                let binding_ctx = DemandContext {
                    inside_call_argument: false,
                    ..ctx
                };
                ExprKind::Binding(Binding {
                    name: binding.name,
                    expression: Box::new(self.analyze(*binding.expression, binding_ctx)?),
                })
            }
            ExprKind::Block(block) => ExprKind::Block(Block {
                expressions: block
                    .expressions
                    .into_iter()
                    .map(|statement| self.analyze(statement, ctx))
                    .collect::<Result<Vec<_>, _>>()?,
                return_value: Box::new(self.analyze(*block.return_value, ctx)?),
            }),
            ExprKind::Case(case) => ExprKind::Case(Case {
                scrutinee: Box::new(self.analyze(*case.scrutinee, ctx)?),
                branches: case
                    .branches
                    .into_iter()
                    .map(|branch| self.analyze_branch(branch))
                    .collect::<Result<Vec<_>, _>>()?,
                fallback: match case.fallback {
                    Some(fallback) => Some(Box::new(self.analyze_branch(*fallback)?)),
                    None => None,
                },
            }),
            ExprKind::Comment(comment) => {
                let comment_ctx = DemandContext {
                    inside_application: false,
                    ..ctx
                };
                ExprKind::Comment(Comment {
                    doc: comment.doc,
                    commented: Box::new(self.analyze(*comment.commented, comment_ctx)?),
                })
            }
            kind @ (ExprKind::Literal(_) | ExprKind::Foreign(_) | ExprKind::Error(_)) => kind,
        };
        Ok(Expr { kind, span, alias })
    }

    fn analyze_name(&self, name: Expr, ctx: DemandContext) -> Result<Expr, PassError> {
        let uses_lazy = self.uses_lazy_definition(&name)?;
        if ctx.inside_call_argument || !uses_lazy {
            return Ok(name);
        }
        log::trace!("forcing read of suspended {:?}", name.alias);
        let span = name.span;
        Ok(Expr {
            kind: ExprKind::Force(Box::new(name)),
            span,
            alias: None,
        })
    }

    fn analyze_branch(&self, branch: CaseBranch) -> Result<CaseBranch, PassError> {
        Ok(CaseBranch {
            body: self.analyze(branch.body, DemandContext::FRESH)?,
            ..branch
        })
    }

    fn analyze_call_argument(&self, argument: CallArgument) -> Result<CallArgument, PassError> {
        // Decided on the value as written, before any rewrite.
        let should_be_suspended = !self.is_usage_of_suspended_term(&argument.value)?;
        let value = self.analyze(*argument.value, DemandContext::CALL_ARGUMENT)?;
        Ok(CallArgument {
            value: Box::new(value),
            should_be_suspended: Some(should_be_suspended),
            ..argument
        })
    }

    /// A bare name whose definition is a suspended argument.
    fn is_usage_of_suspended_term(&self, expr: &Expr) -> Result<bool, PassError> {
        match expr.kind {
            ExprKind::Name(_) => self.uses_lazy_definition(expr),
            _ => Ok(false),
        }
    }

    /// Unresolved names are treated as eager: their binding is not known here.
    fn uses_lazy_definition(&self, name: &Expr) -> Result<bool, PassError> {
        let id = match name.alias {
            Some(AliasInfo::Occurrence(id)) => id,
            _ => return Err(PassError::MissingAlias { node: "name" }),
        };
        if !self.graph.occurrence(id)?.is_use() {
            return Err(laze_graph::GraphError::NotAUse(id).into());
        }
        Ok(self
            .graph
            .linked_definition(id)?
            .map_or(false, |definition| definition.is_lazy()))
    }
}
