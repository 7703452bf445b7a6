//! QueryEngine: compile a query, evaluate it against the store, project results.

use std::collections::BTreeSet;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::entities::{FileId, TagValuePair};
use crate::error::Result;
use crate::implication::ImplicationGraph;
use crate::projection::ResultProjector;
use crate::query::{compile, group_by_file, FileFacts, Matcher, QueryExpression, QueryParser};
use crate::store::{Catalog, FactFilter, FactStore, ImplicationSource};

/// Which output shape a query should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Files,
    Pairs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutput {
    Files(BTreeSet<FileId>),
    Pairs(Vec<TagValuePair>),
}

/// A matcher together with the implication snapshot it was compiled against.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    matcher: Matcher,
    graph: ImplicationGraph,
}

impl CompiledQuery {
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn graph(&self) -> &ImplicationGraph {
        &self.graph
    }
}

/// Query entry point over a store implementing every store trait.
///
/// The engine holds no state between calls; each call takes a fresh snapshot
/// of the implication rules. Callers own transaction boundaries.
#[derive(Debug)]
pub struct QueryEngine<S> {
    store: S,
    config: EngineConfig,
}

impl<S> QueryEngine<S>
where
    S: FactStore + Catalog + ImplicationSource,
{
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compiles `expression` without reading any facts.
    pub fn compile(&self, expression: &QueryExpression) -> Result<CompiledQuery> {
        let graph = ImplicationGraph::new(self.store.implications()?);
        let matcher = compile(expression, &self.store, &graph)?;
        log::debug!(
            "compiled query '{expression}' against {} implication(s)",
            graph.len()
        );
        Ok(CompiledQuery { matcher, graph })
    }

    pub fn compile_and_run(
        &self,
        expression: &QueryExpression,
        projection: Projection,
    ) -> Result<QueryOutput> {
        let compiled = self.compile(expression)?;
        self.run(&compiled, projection)
    }

    /// Evaluates an already compiled query.
    pub fn run(&self, compiled: &CompiledQuery, projection: Projection) -> Result<QueryOutput> {
        match projection {
            Projection::Files => self.run_files(compiled).map(QueryOutput::Files),
            Projection::Pairs => self.run_pairs(compiled).map(QueryOutput::Pairs),
        }
    }

    pub fn files_for_query(&self, expression: &QueryExpression) -> Result<BTreeSet<FileId>> {
        self.run_files(&self.compile(expression)?)
    }

    pub fn tag_value_pairs_for_query(
        &self,
        expression: &QueryExpression,
    ) -> Result<Vec<TagValuePair>> {
        self.run_pairs(&self.compile(expression)?)
    }

    fn run_files(&self, compiled: &CompiledQuery) -> Result<BTreeSet<FileId>> {
        let started = Instant::now();
        let files = self.load_candidates(compiled.matcher())?;
        let matched = self.projector(compiled).matching_files(&files);
        log::debug!(
            "matched {} of {} candidate file(s) in {}ms",
            matched.len(),
            files.len(),
            started.elapsed().as_millis()
        );
        Ok(matched)
    }

    fn run_pairs(&self, compiled: &CompiledQuery) -> Result<Vec<TagValuePair>> {
        let started = Instant::now();
        let files = self.load_candidates(compiled.matcher())?;
        let implied = self
            .config
            .include_implied_pairs
            .then_some(compiled.graph());
        let pairs = self
            .projector(compiled)
            .matching_tag_value_pairs(&files, &self.store, implied)?;
        log::debug!(
            "listed {} pair(s) from {} candidate file(s) in {}ms",
            pairs.len(),
            files.len(),
            started.elapsed().as_millis()
        );
        Ok(pairs)
    }

    fn projector<'a>(&self, compiled: &'a CompiledQuery) -> ResultProjector<'a> {
        ResultProjector::new(compiled.matcher())
            .with_parallel_threshold(self.config.parallel_threshold)
    }

    /// Parses query text and runs it.
    pub fn query(&self, text: &str, projection: Projection) -> Result<QueryOutput> {
        let expression = QueryParser::parse(text)?;
        self.compile_and_run(&expression, projection)
    }

    fn load_candidates(&self, matcher: &Matcher) -> Result<Vec<FileFacts>> {
        let candidate_tags = if self.config.prefilter_candidates {
            matcher.candidate_tags()
        } else {
            None
        };

        let Some(tags) = candidate_tags else {
            return Ok(group_by_file(self.store.find_facts(&FactFilter::all())?));
        };

        let mut files = BTreeSet::new();
        for tag in tags {
            files.extend(
                self.store
                    .find_facts(&FactFilter::tag(tag))?
                    .into_iter()
                    .map(|fact| fact.file),
            );
        }

        let mut facts = Vec::new();
        for file in files {
            facts.extend(self.store.find_facts(&FactFilter::file(file))?);
        }
        Ok(group_by_file(facts))
    }
}
