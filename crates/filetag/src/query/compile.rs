//! Lowering of query expressions into matchers.
//!
//! Every leaf resolves its tag through the catalog and expands it with the
//! implying closure, so a query for `unix` also finds files tagged with
//! anything that implies `unix`. Errors abort the whole compilation; no
//! partially compiled matcher is ever returned.

use crate::entities::{Tag, TagValue};
use crate::error::{FiletagError, Result};
use crate::implication::{ClosureSet, ImplicationGraph};
use crate::store::Catalog;

use super::comparison::{ComparisonOp, ValueComparator};
use super::expression::QueryExpression;
use super::matcher::{FactPredicate, Matcher};

/// Compiles `expression` against the catalog and implication snapshot.
pub fn compile(
    expression: &QueryExpression,
    catalog: &dyn Catalog,
    graph: &ImplicationGraph,
) -> Result<Matcher> {
    Compiler { catalog, graph }.lower(expression)
}

struct Compiler<'a> {
    catalog: &'a dyn Catalog,
    graph: &'a ImplicationGraph,
}

impl Compiler<'_> {
    fn lower(&self, expression: &QueryExpression) -> Result<Matcher> {
        match expression {
            QueryExpression::Empty => Ok(Matcher::Always),
            QueryExpression::TagPresence { name } => {
                let closure = self.tag_closure(name)?;
                Ok(Matcher::Any(FactPredicate::InClosure(closure)))
            }
            QueryExpression::AllValues { name } => {
                let closure = self.tag_closure(name)?;
                Ok(Matcher::Any(FactPredicate::TagIn(closure.tags())))
            }
            QueryExpression::Comparison { tag, value, op } => self.lower_comparison(tag, value, *op),
            QueryExpression::And(left, right) => {
                let left = self.lower(left)?;
                let right = self.lower(right)?;
                Ok(Matcher::and(left, right))
            }
        }
    }

    fn lower_comparison(&self, tag_name: &str, literal: &str, op: ComparisonOp) -> Result<Matcher> {
        let tag = self.resolve_tag(tag_name)?;
        let comparator = ValueComparator::new(literal);

        if op == ComparisonOp::Ne {
            // Negate the expanded equality per fact, among facts that imply the tag.
            let excluded = self.value_closure(&tag, literal, &comparator, ComparisonOp::Eq)?;
            let family = self.graph.implying_closure([TagValue::any(tag.id)]);
            return Ok(Matcher::Any(FactPredicate::OutsideClosure { family, excluded }));
        }

        let closure = self.value_closure(&tag, literal, &comparator, op)?;
        Ok(Matcher::Any(FactPredicate::InClosure(closure)))
    }

    /// Implying closure of every (tag, value) whose value satisfies `op`.
    fn value_closure(
        &self,
        tag: &Tag,
        literal: &str,
        comparator: &ValueComparator,
        op: ComparisonOp,
    ) -> Result<ClosureSet> {
        let seeds = self
            .catalog
            .values()?
            .into_iter()
            .filter(|value| comparator.matches(op, &value.name))
            .map(|value| TagValue::exact(tag.id, value.id))
            .collect::<Vec<_>>();

        if seeds.is_empty() && op == ComparisonOp::Eq {
            return Err(FiletagError::unknown_value(literal));
        }

        log::debug!(
            "comparison {} {op} {literal}: {} seed value(s), numeric={}",
            tag.name,
            seeds.len(),
            comparator.is_numeric()
        );
        Ok(self.graph.implying_closure(seeds))
    }

    fn tag_closure(&self, name: &str) -> Result<ClosureSet> {
        let tag = self.resolve_tag(name)?;
        Ok(self.graph.implying_closure([TagValue::any(tag.id)]))
    }

    fn resolve_tag(&self, name: &str) -> Result<Tag> {
        self.catalog
            .tag_by_name(name)?
            .ok_or_else(|| FiletagError::unknown_tag(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Fact, FileId, Implication};
    use crate::store::MemoryStore;

    struct Fixture {
        store: MemoryStore,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: MemoryStore::new(),
            }
        }

        fn tag(&self, name: &str) -> Tag {
            self.store.create_tag(name).unwrap()
        }

        fn pair(&self, tag: &str, value: Option<&str>) -> TagValue {
            let tag = self.tag(tag);
            match value {
                Some(value) => TagValue::exact(tag.id, self.store.create_value(value).unwrap().id),
                None => TagValue::any(tag.id),
            }
        }

        fn fact(&self, file: u32, tag: &str, value: Option<&str>) -> Fact {
            let pair = self.pair(tag, value);
            Fact::new(FileId(file), pair.tag, pair.value.exact_id())
        }

        fn implies(&self, source: (&str, Option<&str>), implied: (&str, Option<&str>)) {
            let rule = Implication::new(
                self.pair(source.0, source.1),
                self.pair(implied.0, implied.1),
            );
            self.store.add_implication(rule).unwrap();
        }

        fn compile(&self, expression: &QueryExpression) -> Result<Matcher> {
            compile(expression, &self.store, &self.store.implication_graph())
        }
    }

    #[test]
    fn empty_compiles_to_always() {
        let fixture = Fixture::new();
        assert_eq!(fixture.compile(&QueryExpression::Empty).unwrap(), Matcher::Always);
    }

    #[test]
    fn unknown_tag_aborts_whole_expression() {
        let fixture = Fixture::new();
        fixture.tag("known");
        let expression = QueryExpression::and(
            QueryExpression::tag("known"),
            QueryExpression::tag("nonexistent"),
        );
        match fixture.compile(&expression) {
            Err(FiletagError::UnknownTag { name }) => assert_eq!(name, "nonexistent"),
            other => panic!("expected unknown tag, got {other:?}"),
        }
    }

    #[test]
    fn tag_presence_follows_value_specific_implication() {
        let fixture = Fixture::new();
        fixture.implies(("os", Some("linux")), ("unix", None));
        let matcher = fixture.compile(&QueryExpression::tag("unix")).unwrap();

        assert!(matcher.matches_facts(&[fixture.fact(1, "os", Some("linux"))]));
        assert!(!matcher.matches_facts(&[fixture.fact(1, "os", Some("mac"))]));
        assert!(matcher.matches_facts(&[fixture.fact(1, "unix", Some("bsd"))]));
    }

    #[test]
    fn all_values_ignores_implying_value() {
        let fixture = Fixture::new();
        fixture.implies(("os", Some("linux")), ("unix", None));
        let matcher = fixture.compile(&QueryExpression::all_values("unix")).unwrap();

        assert!(matcher.matches_facts(&[fixture.fact(1, "os", Some("linux"))]));
        assert!(matcher.matches_facts(&[fixture.fact(1, "os", Some("mac"))]));
        assert!(!matcher.matches_facts(&[fixture.fact(1, "other", None)]));
    }

    #[test]
    fn wildcard_source_covers_every_value() {
        let fixture = Fixture::new();
        fixture.implies(("genre", None), ("music", None));
        let matcher = fixture.compile(&QueryExpression::tag("music")).unwrap();

        for value in ["rock", "jazz", "1"] {
            assert!(matcher.matches_facts(&[fixture.fact(1, "genre", Some(value))]));
        }
        assert!(matcher.matches_facts(&[fixture.fact(1, "genre", None)]));
    }

    #[test]
    fn comparison_numeric_and_text() {
        let fixture = Fixture::new();
        let nine = fixture.fact(1, "size", Some("9"));
        let abc = fixture.fact(2, "size", Some("abc"));
        fixture.store.create_value("10").unwrap();

        let matcher = fixture
            .compile(&QueryExpression::comparison("size", ComparisonOp::Gt, "10"))
            .unwrap();
        assert!(!matcher.matches_facts(&[nine]));
        assert!(matcher.matches_facts(&[abc]));

        let matcher = fixture
            .compile(&QueryExpression::comparison("size", ComparisonOp::Lte, "10"))
            .unwrap();
        assert!(matcher.matches_facts(&[nine]));
    }

    #[test]
    fn comparison_is_limited_to_the_tag() {
        let fixture = Fixture::new();
        let other = fixture.fact(1, "width", Some("50"));
        fixture.tag("height");
        let matcher = fixture
            .compile(&QueryExpression::comparison("height", ComparisonOp::Gt, "10"))
            .unwrap();
        assert!(!matcher.matches_facts(&[other]));
    }

    #[test]
    fn equality_follows_implications_by_identity() {
        let fixture = Fixture::new();
        fixture.implies(("album", Some("abbey-road")), ("year", Some("1969")));
        let matcher = fixture
            .compile(&QueryExpression::comparison("year", ComparisonOp::Eq, "1969"))
            .unwrap();
        assert!(matcher.matches_facts(&[fixture.fact(1, "album", Some("abbey-road"))]));

        let matcher = fixture
            .compile(&QueryExpression::comparison("year", ComparisonOp::Gt, "1900"))
            .unwrap();
        assert!(matcher.matches_facts(&[fixture.fact(1, "album", Some("abbey-road"))]));
    }

    #[test]
    fn equality_with_unknown_literal_fails() {
        let fixture = Fixture::new();
        fixture.fact(1, "year", Some("2001"));
        for op in [ComparisonOp::Eq, ComparisonOp::Ne] {
            match fixture.compile(&QueryExpression::comparison("year", op, "1999")) {
                Err(FiletagError::UnknownValue { name }) => assert_eq!(name, "1999"),
                other => panic!("expected unknown value, got {other:?}"),
            }
        }
        // Ordered comparisons do not need the literal to exist.
        assert!(fixture
            .compile(&QueryExpression::comparison("year", ComparisonOp::Lt, "1999"))
            .is_ok());
    }

    #[test]
    fn numeric_equality_matches_equivalent_spelling() {
        let fixture = Fixture::new();
        let fact = fixture.fact(1, "rating", Some("5.0"));
        let matcher = fixture
            .compile(&QueryExpression::comparison("rating", ComparisonOp::Eq, "5"))
            .unwrap();
        assert!(matcher.matches_facts(&[fact]));
    }

    #[test]
    fn not_equal_is_evaluated_per_fact() {
        let fixture = Fixture::new();
        let a = fixture.fact(1, "t", Some("a"));
        let b = fixture.fact(1, "t", Some("b"));
        let matcher = fixture
            .compile(&QueryExpression::comparison("t", ComparisonOp::Ne, "a"))
            .unwrap();

        assert!(matcher.matches_facts(&[a, b]));
        assert!(!matcher.matches_facts(&[a]));
        assert!(matcher.matches_facts(&[b]));
    }

    #[test]
    fn not_equal_excludes_implied_equality() {
        let fixture = Fixture::new();
        fixture.implies(("distro", Some("debian")), ("os", Some("linux")));
        let debian = fixture.fact(1, "distro", Some("debian"));
        let arch = fixture.fact(2, "distro", Some("arch"));
        fixture.implies(("distro", Some("arch")), ("os", Some("linux2")));

        let matcher = fixture
            .compile(&QueryExpression::comparison("os", ComparisonOp::Ne, "linux"))
            .unwrap();
        assert!(!matcher.matches_facts(&[debian]));
        assert!(matcher.matches_facts(&[arch]));
    }

    #[test]
    fn not_equal_ignores_values_that_imply_nothing() {
        let fixture = Fixture::new();
        fixture.implies(("distro", Some("debian")), ("os", Some("linux")));
        let fedora = fixture.fact(2, "distro", Some("fedora"));
        let mac = fixture.fact(3, "os", Some("mac"));

        let presence = fixture.compile(&QueryExpression::tag("os")).unwrap();
        let matcher = fixture
            .compile(&QueryExpression::comparison("os", ComparisonOp::Ne, "linux"))
            .unwrap();
        assert!(!presence.matches_facts(&[fedora]));
        assert!(!matcher.matches_facts(&[fedora]));
        assert!(matcher.matches_facts(&[mac]));
    }

    #[test]
    fn cyclic_implications_compile() {
        let fixture = Fixture::new();
        fixture.implies(("a", None), ("b", None));
        fixture.implies(("b", None), ("a", None));
        fixture.implies(("c", None), ("c", None));

        let matcher = fixture.compile(&QueryExpression::tag("a")).unwrap();
        assert!(matcher.matches_facts(&[fixture.fact(1, "b", None)]));
        let matcher = fixture.compile(&QueryExpression::tag("c")).unwrap();
        assert!(matcher.matches_facts(&[fixture.fact(1, "c", None)]));
    }
}
