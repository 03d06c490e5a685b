//! Analysis engine running the per-file passes
//!
//! The surface consumers drive: analyze files one at a time (each analysis
//! is a pure function of that file's tree, parallelizable by the caller),
//! feed the harvested facts into a shared [`ProjectIndex`], then resolve
//! cross-file questions against it.

use crate::config::Config;
use crate::index::{harvest, FileFacts, ProjectIndex};
use crate::semantic::SemanticModel;
use crate::tree::File;

pub struct AnalysisEngine {
    config: Config,
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs scope building, name resolution and declaration harvesting over
    /// one file.
    pub fn analyze_file(&self, file: &File) -> FileAnalysis {
        let model = SemanticModel::analyze(file);
        let facts = harvest(file, &self.config.tests);
        FileAnalysis { model, facts }
    }

    /// A project index seeded with the built-in base types plus this
    /// engine's configured stubs.
    pub fn new_index(&self) -> ProjectIndex {
        ProjectIndex::from_config(&self.config)
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything produced from one file: the resolved semantic model for
/// within-file queries, and the declaration facts destined for the index.
pub struct FileAnalysis {
    pub model: SemanticModel,
    pub facts: FileFacts,
}

impl FileAnalysis {
    /// One-file analysis with default configuration.
    pub fn analyze(file: &File) -> Self {
        AnalysisEngine::new().analyze_file(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::QualifiedName;
    use crate::tree::{
        ClassDecl, ClassKind, Expr, Literal, Name, NewExpr, Span, Stmt, ClassRef,
    };

    #[test]
    fn analyze_file_produces_model_and_facts() {
        let class = ClassDecl {
            name: "Order".to_string(),
            name_span: Span::new(6, 11),
            kind: ClassKind::Class,
            extends: Some(Name::unqualified("Model", Span::new(20, 25))),
            implements: Vec::new(),
            members: Vec::new(),
            doc_comment: None,
            attributes: Vec::new(),
            span: Span::new(0, 40),
        };
        let file = File::new(vec![
            Stmt::Class(class),
            Stmt::Expr(Expr::New(Box::new(NewExpr {
                class: ClassRef::Name(Name::unqualified("Order", Span::new(46, 51))),
                args: vec![Expr::Literal(Literal::int(7, Span::new(52, 53)))],
                span: Span::new(42, 54),
            }))),
        ]);

        let analysis = FileAnalysis::analyze(&file);

        assert_eq!(
            analysis.model.declaration_of(Span::new(46, 51)),
            Some(Span::new(6, 11))
        );
        assert_eq!(analysis.facts.classes.len(), 1);
        assert_eq!(
            analysis.facts.classes[0].superclass,
            Some(QualifiedName::global("Model"))
        );
    }

    #[test]
    fn engine_index_carries_configured_stubs() {
        let mut config = Config::default();
        config.stubs.classes.push("Redis".to_string());

        let engine = AnalysisEngine::with_config(config);
        let mut index = engine.new_index();

        let redis = index.type_symbol(&QualifiedName::global("Redis"));
        assert!(!index.get_type(redis).is_unknown());
    }
}
