//! laze_compiler: Analysis driver.
//!
//! Runs the scope graph builder and the demand analyzer over every
//! top-level definition of a module and gathers their diagnostics.
//! Definitions are independent, so they are analyzed on the rayon pool
//! unless the options turn that off. A fatal defect aborts only the
//! method or data constructor it occurred in.

use laze_binder::ScopeGraphBuilder;
use laze_core::intern::StringInterner;
use laze_diagnostics::{messages, Diagnostic, DiagnosticCollection};
use laze_graph::{Graph, ScopeId};
use laze_ir::types::DefinitionScope;
use laze_ir::visitor::{collect_expr_errors, collect_parameter_errors};
use laze_ir::{DataConstructor, Definition, ErrorNode, Expr, Fragment, Method, Module, PassError};
use laze_options::AnalysisOptions;
use rayon::prelude::*;

/// The outcome of analyzing a module.
#[derive(Debug)]
pub struct AnalysisResult {
    /// The analyzed module. Methods whose analysis was aborted are left out,
    /// as are the aborted constructors of a type.
    pub module: Module,
    /// Every diagnostic, sorted.
    pub diagnostics: DiagnosticCollection,
    pub failures: Vec<DefinitionFailure>,
}

/// A method or a data constructor whose analysis hit a fatal defect.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionFailure {
    pub definition: String,
    pub error: PassError,
}

/// What one definition contributed. A type keeps the constructors that
/// could be analyzed; every constructor that could not is a failure of its own.
#[derive(Default)]
struct DefinitionOutcome {
    definition: Option<Definition>,
    failures: Vec<DefinitionFailure>,
    diagnostics: DiagnosticCollection,
}

/// Drives both analysis passes.
pub struct Compiler {
    interner: StringInterner,
    options: AnalysisOptions,
}

impl Compiler {
    pub fn new(interner: StringInterner, options: AnalysisOptions) -> Self {
        Self { interner, options }
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Run both passes over every definition of `module`.
    pub fn analyze_module(&self, module: Module) -> AnalysisResult {
        let count = module.definitions.len();
        let outcomes: Vec<DefinitionOutcome> = if self.options.parallel() {
            module
                .definitions
                .into_par_iter()
                .map(|definition| self.analyze_definition(definition))
                .collect()
        } else {
            module
                .definitions
                .into_iter()
                .map(|definition| self.analyze_definition(definition))
                .collect()
        };

        let mut definitions = Vec::with_capacity(count);
        let mut diagnostics = DiagnosticCollection::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            diagnostics.extend(outcome.diagnostics);
            definitions.extend(outcome.definition);
            failures.extend(outcome.failures);
        }
        diagnostics.sort();

        log::debug!(
            "analyzed {} definitions: {} errors, {} warnings, {} aborted",
            count,
            diagnostics.error_count(),
            diagnostics.warning_count(),
            failures.len()
        );
        AnalysisResult {
            module: Module::new(definitions),
            diagnostics,
            failures,
        }
    }

    /// Analyze a fragment inside an existing lexical context, extending
    /// `graph`. Returns the analyzed fragment and the diagnostics it produced.
    pub fn analyze_expression(
        &self,
        expr: Expr,
        graph: &mut Graph,
        scope: ScopeId,
    ) -> Result<(Fragment, DiagnosticCollection), PassError> {
        let mut builder = self.builder();
        let fragment = builder.build_expression(expr, graph, scope)?;
        if self.options.validate_graphs() {
            graph.validate()?;
        }
        let fragment = laze_demand::DemandAnalyzer::new(graph).analyze_fragment(fragment)?;

        let mut diagnostics = builder.take_diagnostics();
        for error in collect_expr_errors(&fragment.expr) {
            diagnostics.add(error.diagnostic.clone());
        }
        diagnostics.sort();
        Ok((fragment, diagnostics))
    }

    fn builder(&self) -> ScopeGraphBuilder {
        ScopeGraphBuilder::new(self.interner.clone()).with_shadowing_warnings(self.options.warn_on_shadowing())
    }

    fn analyze_definition(&self, definition: Definition) -> DefinitionOutcome {
        let mut outcome = DefinitionOutcome::default();
        match definition {
            Definition::Method(method) => {
                let name = self.interner.qualified(method.type_name, method.name);
                log::debug!("analyzing {}", name);
                let mut builder = self.builder();
                let result = self.run_method(&mut builder, method);
                let method = self.settle(&name, builder, result, |method| collect_expr_errors(&method.body), &mut outcome);
                outcome.definition = method.map(Definition::Method);
            }
            Definition::Type(mut ty) => {
                let constructors = std::mem::take(&mut ty.constructors);
                for constructor in constructors {
                    let name = self.interner.qualified(Some(ty.name), constructor.name);
                    log::debug!("analyzing {}", name);
                    let mut builder = self.builder();
                    let result = self.run_constructor(&mut builder, constructor);
                    let settled = self.settle(
                        &name,
                        builder,
                        result,
                        |constructor| collect_parameter_errors(&constructor.arguments),
                        &mut outcome,
                    );
                    ty.constructors.extend(settled);
                }
                outcome.definition = Some(Definition::Type(ty));
            }
        }
        outcome
    }

    /// Record the diagnostics of one analyzed unit under `name`, or its
    /// failure if a pass aborted.
    fn settle<T>(
        &self,
        name: &str,
        mut builder: ScopeGraphBuilder,
        result: Result<T, PassError>,
        errors: fn(&T) -> Vec<&ErrorNode>,
        outcome: &mut DefinitionOutcome,
    ) -> Option<T> {
        match result {
            Ok(analyzed) => {
                log::debug!("finished {}", name);
                for diagnostic in builder.take_diagnostics().into_diagnostics() {
                    outcome.diagnostics.add(diagnostic.in_origin(name));
                }
                for error in errors(&analyzed) {
                    outcome.diagnostics.add(error.diagnostic.clone().in_origin(name));
                }
                Some(analyzed)
            }
            Err(error) => {
                log::warn!("aborted analysis of {}: {}", name, error);
                let detail = error.to_string();
                let diagnostic = match error {
                    PassError::AlreadyAnalyzed { .. } => {
                        Diagnostic::new(&messages::DEFINITION_0_WAS_ALREADY_ANALYZED, &[name])
                    }
                    _ => Diagnostic::new(&messages::INTERNAL_ERROR_WHILE_ANALYZING_0_1, &[name, detail.as_str()]),
                };
                outcome.diagnostics.add(diagnostic.in_origin(name));
                outcome.failures.push(DefinitionFailure {
                    definition: name.to_string(),
                    error,
                });
                None
            }
        }
    }

    fn run_method(&self, builder: &mut ScopeGraphBuilder, method: Method) -> Result<Method, PassError> {
        let method = builder.build_method(method)?;
        self.check_graph(method.scope.as_ref())?;
        laze_demand::analyze_method(method)
    }

    fn run_constructor(
        &self,
        builder: &mut ScopeGraphBuilder,
        constructor: DataConstructor,
    ) -> Result<DataConstructor, PassError> {
        let constructor = builder.build_constructor(constructor)?;
        self.check_graph(constructor.scope.as_ref())?;
        laze_demand::analyze_constructor(constructor)
    }

    fn check_graph(&self, scope: Option<&DefinitionScope>) -> Result<(), PassError> {
        if !self.options.validate_graphs() {
            return Ok(());
        }
        match scope {
            Some(scope) => Ok(scope.graph.validate()?),
            None => Err(PassError::MissingScopeGraph),
        }
    }
}
