//! Demand analysis integration tests.
//!
//! Every tree is first run through the scope graph builder, then through
//! the demand analyzer, and the rewritten shape is inspected.

use laze_binder::ScopeGraphBuilder;
use laze_core::StringInterner;
use laze_demand::{analyze_constructor, analyze_definition, analyze_method, DemandAnalyzer};
use laze_graph::ScopeId;
use laze_ir::*;

struct Fixture {
    interner: StringInterner,
}

impl Fixture {
    fn new() -> Self {
        Self {
            interner: StringInterner::new(),
        }
    }

    fn sym(&self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    /// Run both passes over `body` as the body of a method `Test.run`.
    fn analyze(&self, body: Expr) -> Method {
        let method = Method::new(Some(self.sym("Test")), self.sym("run"), body);
        let mut builder = ScopeGraphBuilder::new(self.interner.clone());
        let method = builder.build_method(method).unwrap();
        analyze_method(method).unwrap()
    }

    /// `~v -> <body>`, the body analyzed with `v` lazy.
    fn with_lazy_v(&self, body: Expr) -> Expr {
        let method = self.analyze(Expr::lambda(vec![DefinitionArgument::suspended(self.sym("v"))], body));
        match method.body.kind {
            ExprKind::Lambda(lambda) => *lambda.body,
            other => panic!("expected lambda, got {:?}", other),
        }
    }
}

fn is_forced_name(expr: &Expr, symbol: Symbol) -> bool {
    match &expr.kind {
        ExprKind::Force(target) => target.as_name() == Some(symbol),
        _ => false,
    }
}

fn call_arguments(expr: &Expr) -> &[CallArgument] {
    match &expr.kind {
        ExprKind::Application(app) => &app.arguments,
        other => panic!("expected application, got {:?}", other),
    }
}

// ============================================================================
// Forcing placement
// ============================================================================

#[test]
fn test_block_return_value_is_forced() {
    let fx = Fixture::new();
    let v = fx.sym("v");
    let body = fx.with_lazy_v(Expr::block(vec![], Expr::name(v)));
    match &body.kind {
        ExprKind::Block(block) => assert!(is_forced_name(&block.return_value, v)),
        other => panic!("expected block, got {:?}", other),
    }
}

#[test]
fn test_direct_call_argument_is_not_forced() {
    let fx = Fixture::new();
    let v = fx.sym("v");
    let body = fx.with_lazy_v(Expr::call(Expr::name(fx.sym("g")), vec![Expr::name(v)]));
    let arguments = call_arguments(&body);
    assert_eq!(arguments[0].value.as_name(), Some(v));
}

#[test]
fn test_eager_argument_is_never_forced() {
    let fx = Fixture::new();
    let x = fx.sym("x");
    let method = fx.analyze(Expr::lambda(vec![DefinitionArgument::new(x)], Expr::name(x)));
    match &method.body.kind {
        ExprKind::Lambda(lambda) => assert_eq!(lambda.body.as_name(), Some(x)),
        other => panic!("expected lambda, got {:?}", other),
    }
}

#[test]
fn test_unresolved_name_is_not_forced() {
    let fx = Fixture::new();
    let global = fx.sym("global");
    let body = fx.with_lazy_v(Expr::name(global));
    assert_eq!(body.as_name(), Some(global));
}

#[test]
fn test_callee_is_forced() {
    let fx = Fixture::new();
    let v = fx.sym("v");
    let body = fx.with_lazy_v(Expr::call(Expr::name(v), vec![Expr::number("1")]));
    match &body.kind {
        ExprKind::Application(app) => assert!(is_forced_name(&app.function, v)),
        other => panic!("expected application, got {:?}", other),
    }
}

// ============================================================================
// Suspension decision
// ============================================================================

#[test]
fn test_bare_lazy_argument_is_forwarded() {
    let fx = Fixture::new();
    let v = fx.sym("v");
    let body = fx.with_lazy_v(Expr::call(Expr::name(fx.sym("g")), vec![Expr::name(v)]));
    assert_eq!(call_arguments(&body)[0].should_be_suspended, Some(false));
}

#[test]
fn test_compound_argument_is_suspended() {
    // g (1 + v)
    let fx = Fixture::new();
    let v = fx.sym("v");
    let sum = Expr::call(Expr::name(fx.sym("+")), vec![Expr::number("1"), Expr::name(v)]);
    let body = fx.with_lazy_v(Expr::call(Expr::name(fx.sym("g")), vec![sum]));

    let outer = call_arguments(&body);
    assert_eq!(outer[0].should_be_suspended, Some(true));
    let inner = call_arguments(&outer[0].value);
    assert_eq!(inner[0].should_be_suspended, Some(true));
    assert_eq!(inner[1].should_be_suspended, Some(false));
    assert_eq!(inner[1].value.as_name(), Some(v));
}

#[test]
fn test_eager_name_and_literal_arguments_are_suspended() {
    let fx = Fixture::new();
    let x = fx.sym("x");
    let method = fx.analyze(Expr::lambda(
        vec![DefinitionArgument::new(x)],
        Expr::call(Expr::name(fx.sym("g")), vec![Expr::name(x), Expr::text("s")]),
    ));
    let ExprKind::Lambda(lambda) = &method.body.kind else {
        panic!("expected lambda");
    };
    let arguments = call_arguments(&lambda.body);
    assert_eq!(arguments[0].should_be_suspended, Some(true));
    assert_eq!(arguments[1].should_be_suspended, Some(true));
}

#[test]
fn test_explicit_force_argument_keeps_context() {
    let fx = Fixture::new();
    let v = fx.sym("v");
    let body = fx.with_lazy_v(Expr::call(
        Expr::name(fx.sym("g")),
        vec![Expr::force(Expr::name(v))],
    ));
    let arguments = call_arguments(&body);
    assert_eq!(arguments[0].should_be_suspended, Some(true));
    assert!(is_forced_name(&arguments[0].value, v));
}

// ============================================================================
// Context propagation
// ============================================================================

#[test]
fn test_binding_inside_argument_forces() {
    // g { y = v; y }
    let fx = Fixture::new();
    let (v, y) = (fx.sym("v"), fx.sym("y"));
    let block = Expr::block(vec![Expr::binding(y, Expr::name(v))], Expr::name(y));
    let body = fx.with_lazy_v(Expr::call(Expr::name(fx.sym("g")), vec![block]));

    let arguments = call_arguments(&body);
    assert_eq!(arguments[0].should_be_suspended, Some(true));
    let ExprKind::Block(block) = &arguments[0].value.kind else {
        panic!("expected block");
    };
    let ExprKind::Binding(binding) = &block.expressions[0].kind else {
        panic!("expected binding");
    };
    assert!(is_forced_name(&binding.expression, v));
    assert_eq!(block.return_value.as_name(), Some(y));
}

#[test]
fn test_block_inherits_call_argument_context() {
    let fx = Fixture::new();
    let v = fx.sym("v");
    let body = fx.with_lazy_v(Expr::call(
        Expr::name(fx.sym("g")),
        vec![Expr::block(vec![], Expr::name(v))],
    ));
    let ExprKind::Block(block) = &call_arguments(&body)[0].value.kind else {
        panic!("expected block");
    };
    assert_eq!(block.return_value.as_name(), Some(v));
}

#[test]
fn test_case_branches_start_fresh() {
    // g (case v of _ -> v)
    let fx = Fixture::new();
    let v = fx.sym("v");
    let case = Expr::case(
        Expr::name(v),
        vec![CaseBranch::new(Pattern::Blank, Expr::name(v))],
        Some(CaseBranch::new(Pattern::Blank, Expr::name(v))),
    );
    let body = fx.with_lazy_v(Expr::call(Expr::name(fx.sym("g")), vec![case]));

    let ExprKind::Case(case) = &call_arguments(&body)[0].value.kind else {
        panic!("expected case");
    };
    assert_eq!(case.scrutinee.as_name(), Some(v));
    assert!(is_forced_name(&case.branches[0].body, v));
    assert!(is_forced_name(&case.fallback.as_ref().unwrap().body, v));
}

#[test]
fn test_lambda_body_inside_argument_starts_fresh() {
    let fx = Fixture::new();
    let v = fx.sym("v");
    let callback = Expr::lambda(vec![DefinitionArgument::new(fx.sym("z"))], Expr::name(v));
    let body = fx.with_lazy_v(Expr::call(Expr::name(fx.sym("g")), vec![callback]));

    let ExprKind::Lambda(lambda) = &call_arguments(&body)[0].value.kind else {
        panic!("expected lambda");
    };
    assert!(is_forced_name(&lambda.body, v));
}

#[test]
fn test_sequence_items_start_fresh() {
    let fx = Fixture::new();
    let v = fx.sym("v");
    let body = fx.with_lazy_v(Expr::call(
        Expr::name(fx.sym("g")),
        vec![Expr::sequence(vec![Expr::name(v), Expr::number("2")])],
    ));
    let ExprKind::Sequence(items) = &call_arguments(&body)[0].value.kind else {
        panic!("expected sequence");
    };
    assert!(is_forced_name(&items[0], v));
    assert!(items[1].is_literal());
}

#[test]
fn test_comment_is_transparent() {
    let fx = Fixture::new();
    let v = fx.sym("v");
    let body = fx.with_lazy_v(Expr::comment("the value", Expr::name(v)));
    let ExprKind::Comment(comment) = &body.kind else {
        panic!("expected comment");
    };
    assert_eq!(comment.doc, "the value");
    assert!(is_forced_name(&comment.commented, v));
}

#[test]
fn test_redefined_argument_is_left_alone() {
    // f ~v ~v = v
    let fx = Fixture::new();
    let v = fx.sym("v");
    let method = fx.analyze(Expr::lambda(
        vec![DefinitionArgument::suspended(v), DefinitionArgument::suspended(v)],
        Expr::name(v),
    ));
    let ExprKind::Lambda(lambda) = &method.body.kind else {
        panic!("expected lambda");
    };
    assert!(matches!(lambda.arguments[1], Parameter::Redefined(_)));
    assert!(is_forced_name(&lambda.body, v));
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_receiver_and_suspended_argument_flags() {
    // Test.run self ~x = x
    let fx = Fixture::new();
    let (this, x) = (fx.sym("self"), fx.sym("x"));
    let method = fx.analyze(Expr::lambda(
        vec![DefinitionArgument::new(this), DefinitionArgument::suspended(x)],
        Expr::name(x),
    ));
    assert_eq!(method.passes, PassFlags::ALL);

    let graph = &method.scope.as_ref().unwrap().graph;
    let ExprKind::Lambda(lambda) = &method.body.kind else {
        panic!("expected lambda");
    };
    let receiver = lambda.arguments[0].as_argument().unwrap();
    let declared = lambda.arguments[1].as_argument().unwrap();
    assert!(!receiver.suspended);
    assert!(declared.suspended);

    let receiver_def = receiver.alias.and_then(AliasInfo::occurrence).unwrap();
    let declared_def = declared.alias.and_then(AliasInfo::occurrence).unwrap();
    assert!(!graph.occurrence(receiver_def).unwrap().is_lazy());
    assert!(graph.occurrence(declared_def).unwrap().is_lazy());
    assert!(is_forced_name(&lambda.body, x));
}

#[test]
fn test_constructor_defaults_are_analyzed() {
    // type Pair = Pair ~a (b = a)
    let fx = Fixture::new();
    let (a, b) = (fx.sym("a"), fx.sym("b"));
    let constructor = DataConstructor::new(
        fx.sym("Pair"),
        vec![
            DefinitionArgument::suspended(a),
            DefinitionArgument::new(b).with_default(Expr::name(a)),
        ],
    );
    let mut builder = ScopeGraphBuilder::new(fx.interner.clone());
    let constructor = analyze_constructor(builder.build_constructor(constructor).unwrap()).unwrap();

    let default = constructor.arguments[1].as_argument().unwrap().default.as_ref().unwrap();
    assert!(is_forced_name(default, a));
    assert!(constructor.passes.contains(PassFlags::DEMAND));
}

#[test]
fn test_type_definition_runs_every_constructor() {
    let fx = Fixture::new();
    let mut builder = ScopeGraphBuilder::new(fx.interner.clone());
    let constructors = ["Nil", "Cons"]
        .iter()
        .map(|name| builder.build_constructor(DataConstructor::new(fx.sym(name), vec![])).unwrap())
        .collect();
    let ty = Definition::Type(TypeDefinition {
        name: fx.sym("List"),
        constructors,
        span: None,
    });
    let Definition::Type(ty) = analyze_definition(ty).unwrap() else {
        panic!("expected type definition");
    };
    assert!(ty.constructors.iter().all(|c| c.passes == PassFlags::ALL));
}

#[test]
fn test_inline_expression_in_existing_context() {
    let fx = Fixture::new();
    let v = fx.sym("v");
    let mut builder = ScopeGraphBuilder::new(fx.interner.clone());
    let (_, mut graph) = builder
        .build_scope_graph(Expr::lambda(vec![DefinitionArgument::suspended(v)], Expr::number("0")))
        .unwrap();

    let fragment = builder.build_expression(Expr::name(v), &mut graph, ScopeId::ROOT).unwrap();
    let analyzed = DemandAnalyzer::new(&graph).analyze_fragment(fragment).unwrap();
    assert_eq!(analyzed.passes, PassFlags::ALL);
    assert!(is_forced_name(&analyzed.expr, v));
}

#[test]
fn test_inline_expression_forced_once() {
    let fx = Fixture::new();
    let v = fx.sym("v");
    let mut builder = ScopeGraphBuilder::new(fx.interner.clone());
    let (_, mut graph) = builder
        .build_scope_graph(Expr::lambda(vec![DefinitionArgument::suspended(v)], Expr::number("0")))
        .unwrap();

    let fragment = builder.build_expression(Expr::name(v), &mut graph, ScopeId::ROOT).unwrap();
    let analyzer = DemandAnalyzer::new(&graph);
    let analyzed = analyzer.analyze_fragment(fragment).unwrap();
    let err = analyzer.analyze_fragment(analyzed.clone()).unwrap_err();
    assert_eq!(err, PassError::AlreadyAnalyzed { pass: "demand" });
    assert!(is_forced_name(&analyzed.expr, v));
}

#[test]
fn test_named_lazy_argument_is_forwarded() {
    // g (value = v) v
    let fx = Fixture::new();
    let (v, value) = (fx.sym("v"), fx.sym("value"));
    let body = fx.with_lazy_v(Expr::apply(
        Expr::name(fx.sym("g")),
        vec![CallArgument::named(value, Expr::name(v)), CallArgument::positional(Expr::name(v))],
    ));
    let arguments = call_arguments(&body);
    assert_eq!(arguments[0].name, Some(value));
    assert_eq!(arguments[0].should_be_suspended, Some(false));
    assert_eq!(arguments[0].value.as_name(), Some(v));
    assert_eq!(arguments[1].name, None);
    assert_eq!(arguments[1].should_be_suspended, Some(false));
}

// ============================================================================
// Pass ordering
// ============================================================================

#[test]
fn test_demand_requires_scope_graph() {
    let fx = Fixture::new();
    let method = Method::new(None, fx.sym("main"), Expr::number("1"));
    assert_eq!(analyze_method(method).unwrap_err(), PassError::MissingScopeGraph);
}

#[test]
fn test_demand_rejects_second_run() {
    let fx = Fixture::new();
    let method = fx.analyze(Expr::number("1"));
    assert_eq!(
        analyze_method(method).unwrap_err(),
        PassError::AlreadyAnalyzed { pass: "demand" }
    );
}
