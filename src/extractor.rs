//! Extraction of the resources to embed in a response's `included` member.

use tracing::trace;

use crate::defaults::DefaultWalker;
use crate::explicit::ExplicitWalker;
use crate::metadata::ResourceMetadata;
use crate::params::RequestContext;
use crate::types::{IncludedResources, Segment};

/// Computes the deduplicated set of related resources for a response.
///
/// Runs two passes over the resource graph: include-by-default relationships
/// first, then the relationships the client requested. Both write into one
/// map keyed by digest, so the explicit pass's tag wins where they overlap.
pub struct IncludedRelationshipExtractor<'a, M> {
    metadata: &'a M,
}

impl<'a, M: ResourceMetadata> IncludedRelationshipExtractor<'a, M> {
    pub fn new(metadata: &'a M) -> Self {
        Self { metadata }
    }

    /// Included resources for a single root resource.
    ///
    /// The root itself is never part of the result. A metadata failure
    /// abandons the default branch it occurs on, but ends the explicit pass;
    /// either way it is logged and whatever was collected is kept.
    pub fn extract(
        &self,
        root: Option<M::Handle>,
        context: &RequestContext,
    ) -> IncludedResources<M::Handle> {
        self.extract_all(root, context)
    }

    /// Included resources for a collection response, merged into one map.
    ///
    /// Default passes for every root run before any explicit pass, so an
    /// explicit tag is never overwritten by a later root's defaults.
    pub fn extract_all<I>(&self, roots: I, context: &RequestContext) -> IncludedResources<M::Handle>
    where
        I: IntoIterator<Item = M::Handle>,
    {
        let roots: Vec<M::Handle> = roots.into_iter().collect();
        let mut included = IncludedResources::new();

        for &root in &roots {
            DefaultWalker::new(self.metadata, context, &mut included).walk(
                Some(root),
                Segment::Top,
                1,
            );
        }

        for &root in &roots {
            let result = ExplicitWalker::new(self.metadata, &context.include, &mut included)
                .walk(Some(root), None, 1);
            if let Err(e) = result {
                trace!(error = %e, "exception while extracting included fields");
            }
        }

        included
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphAccessor, NodeId, ResourceGraph};
    use crate::params::IncludeParams;
    use crate::registry::{ResourceInformation, ResourceRegistry};
    use crate::types::{RelationshipField, ResourceDigest, MAX_RECURRENCE_LEVEL};
    use serde_json::{json, Value};

    fn library_registry() -> ResourceRegistry {
        let mut registry = ResourceRegistry::new();
        registry
            .register(
                ResourceInformation::new("authors", "Author")
                    .relationship(RelationshipField::new("profile").include_by_default(true))
                    .relationship(RelationshipField::new("books")),
            )
            .unwrap();
        registry
            .register(ResourceInformation::new("profiles", "Profile"))
            .unwrap();
        registry
            .register(
                ResourceInformation::new("books", "Book")
                    .relationship(RelationshipField::new("author")),
            )
            .unwrap();
        registry
    }

    struct Library {
        graph: ResourceGraph,
        author: NodeId,
        profile: NodeId,
        books: Vec<NodeId>,
    }

    fn library() -> Library {
        let mut graph = ResourceGraph::new();
        let author = graph.add("a1", "Author").unwrap();
        graph.set(author, "id", json!(1)).unwrap();
        let profile = graph.add("p10", "Profile").unwrap();
        graph.set(profile, "id", json!(10)).unwrap();

        let mut books = Vec::new();
        for id in [100, 101] {
            let book = graph.add(format!("b{id}"), "Book").unwrap();
            graph.set(book, "id", json!(id)).unwrap();
            graph.link(book, "author", author).unwrap();
            books.push(book);
        }

        graph.link(author, "profile", profile).unwrap();
        graph.link_many(author, "books", books.clone()).unwrap();

        Library {
            graph,
            author,
            profile,
            books,
        }
    }

    fn digest(resource_type: &str, id: &str) -> ResourceDigest {
        ResourceDigest::new(resource_type, id)
    }

    #[test]
    fn default_relation_included_without_request() {
        let registry = library_registry();
        let lib = library();
        let accessor = GraphAccessor::new(&registry, &lib.graph);

        let included = IncludedRelationshipExtractor::new(&accessor)
            .extract(Some(lib.author), &RequestContext::default());

        assert_eq!(included.len(), 1);
        let entry = &included[&digest("profiles", "10")];
        assert_eq!(entry.resource, lib.profile);
        assert_eq!(entry.segment, Segment::Top);
        assert_eq!(entry.field_name, None);
    }

    #[test]
    fn explicit_request_includes_books() {
        let registry = library_registry();
        let lib = library();
        let accessor = GraphAccessor::new(&registry, &lib.graph);
        let context = RequestContext::new(IncludeParams::new().with("authors", ["books"]))
            .element_name("authors");

        let included =
            IncludedRelationshipExtractor::new(&accessor).extract(Some(lib.author), &context);

        assert!(!included.contains_key(&digest("authors", "1")));
        assert!(included.contains_key(&digest("profiles", "10")));
        for (book, id) in lib.books.iter().zip(["100", "101"]) {
            let entry = &included[&digest("books", id)];
            assert_eq!(entry.resource, *book);
            assert_eq!(entry.segment, Segment::IncludedNested);
            assert_eq!(entry.field_name.as_deref(), Some("books"));
        }
        assert_eq!(included.len(), 3);
    }

    #[test]
    fn cycle_back_to_root_tags_author_once() {
        let registry = library_registry();
        let lib = library();
        let accessor = GraphAccessor::new(&registry, &lib.graph);
        let include = IncludeParams::new()
            .with("authors", ["books"])
            .with("books", ["author"]);
        let context = RequestContext::new(include).element_name("authors");

        let included =
            IncludedRelationshipExtractor::new(&accessor).extract(Some(lib.author), &context);

        let author = &included[&digest("authors", "1")];
        assert_eq!(author.segment, Segment::IncludedNested);
        assert_eq!(author.field_name.as_deref(), Some("author"));
        assert_eq!(included.len(), 4);
    }

    #[test]
    fn explicit_tag_overwrites_default_tag() {
        let registry = library_registry();
        let lib = library();
        let accessor = GraphAccessor::new(&registry, &lib.graph);
        let context = RequestContext::new(IncludeParams::new().with("authors", ["profile"]))
            .element_name("authors");

        let included =
            IncludedRelationshipExtractor::new(&accessor).extract(Some(lib.author), &context);

        let entry = &included[&digest("profiles", "10")];
        assert_eq!(entry.segment, Segment::IncludedNested);
        assert_eq!(entry.field_name.as_deref(), Some("profile"));
    }

    #[test]
    fn null_root_yields_nothing() {
        let registry = library_registry();
        let lib = library();
        let accessor = GraphAccessor::new(&registry, &lib.graph);
        let context = RequestContext::new(IncludeParams::new().with("authors", ["books"]));

        let included = IncludedRelationshipExtractor::new(&accessor).extract(None, &context);
        assert!(included.is_empty());
    }

    #[test]
    fn null_relationship_never_included() {
        let registry = library_registry();
        let mut lib = library();
        lib.graph.set(lib.author, "profile", Value::Null).unwrap();
        lib.graph.set(lib.author, "books", Value::Null).unwrap();
        let accessor = GraphAccessor::new(&registry, &lib.graph);
        let context = RequestContext::new(IncludeParams::new().with("authors", ["books"]))
            .element_name("authors");

        let included =
            IncludedRelationshipExtractor::new(&accessor).extract(Some(lib.author), &context);
        assert!(included.is_empty());
    }

    #[test]
    fn explicit_failure_keeps_default_results() {
        let mut registry = ResourceRegistry::new();
        registry
            .register(
                ResourceInformation::new("authors", "Author")
                    .relationship(RelationshipField::new("books"))
                    .relationship(RelationshipField::new("profile").include_by_default(true)),
            )
            .unwrap();
        registry
            .register(ResourceInformation::new("profiles", "Profile"))
            .unwrap();

        let mut graph = ResourceGraph::new();
        let author = graph.add("a1", "Author").unwrap();
        graph.set(author, "id", json!(1)).unwrap();
        let profile = graph.add("p10", "Profile").unwrap();
        graph.set(profile, "id", json!(10)).unwrap();
        graph.link(author, "profile", profile).unwrap();
        // "books" is missing entirely: reading it fails
        let accessor = GraphAccessor::new(&registry, &graph);
        let context = RequestContext::new(IncludeParams::new().with("authors", ["books"]))
            .element_name("authors");

        let included = IncludedRelationshipExtractor::new(&accessor).extract(Some(author), &context);

        assert_eq!(included.len(), 1);
        assert_eq!(included[&digest("profiles", "10")].segment, Segment::Top);
    }

    #[test]
    fn failing_default_branch_keeps_siblings() {
        let mut registry = ResourceRegistry::new();
        registry
            .register(
                ResourceInformation::new("authors", "Author")
                    .relationship(RelationshipField::new("books").include_by_default(true))
                    .relationship(RelationshipField::new("profile").include_by_default(true)),
            )
            .unwrap();
        registry
            .register(ResourceInformation::new("profiles", "Profile"))
            .unwrap();
        registry
            .register(
                ResourceInformation::new("books", "Book")
                    .relationship(RelationshipField::new("notes"))
                    .relationship(RelationshipField::new("publisher").include_by_default(true)),
            )
            .unwrap();
        registry
            .register(ResourceInformation::new("publishers", "Publisher"))
            .unwrap();

        let mut graph = ResourceGraph::new();
        let author = graph.add("a1", "Author").unwrap();
        graph.set(author, "id", json!(1)).unwrap();
        let profile = graph.add("p10", "Profile").unwrap();
        graph.set(profile, "id", json!(10)).unwrap();
        let publisher = graph.add("pub5", "Publisher").unwrap();
        graph.set(publisher, "id", json!(5)).unwrap();

        // b100 has no "notes" and no "publisher"; b101 is complete
        let broken = graph.add("b100", "Book").unwrap();
        graph.set(broken, "id", json!(100)).unwrap();
        let book = graph.add("b101", "Book").unwrap();
        graph.set(book, "id", json!(101)).unwrap();
        graph.set(book, "notes", Value::Null).unwrap();
        graph.link(book, "publisher", publisher).unwrap();

        graph.link_many(author, "books", [broken, book]).unwrap();
        graph.link(author, "profile", profile).unwrap();

        let accessor = GraphAccessor::new(&registry, &graph);
        let included = IncludedRelationshipExtractor::new(&accessor)
            .extract(Some(author), &RequestContext::default());

        assert!(included.contains_key(&digest("books", "100")));
        assert!(included.contains_key(&digest("books", "101")));
        assert_eq!(included[&digest("profiles", "10")].segment, Segment::Top);
        assert_eq!(
            included[&digest("publishers", "5")].segment,
            Segment::IncludedDefault
        );
        assert_eq!(included.len(), 4);
    }

    #[test]
    fn unused_field_is_never_read() {
        let registry = library_registry();
        let mut graph = ResourceGraph::new();
        let author = graph.add("a1", "Author").unwrap();
        graph.set(author, "id", json!(1)).unwrap();
        let profile = graph.add("p10", "Profile").unwrap();
        graph.set(profile, "id", json!(10)).unwrap();
        graph.link(author, "profile", profile).unwrap();
        // "books" is neither default nor requested, and holds a plain value
        graph.set(author, "books", json!("not a relationship")).unwrap();
        let accessor = GraphAccessor::new(&registry, &graph);

        let included = IncludedRelationshipExtractor::new(&accessor)
            .extract(Some(author), &RequestContext::default());

        assert_eq!(included.len(), 1);
        assert!(included.contains_key(&digest("profiles", "10")));
    }

    #[test]
    fn extract_all_merges_roots() {
        let registry = library_registry();
        let lib = library();
        let accessor = GraphAccessor::new(&registry, &lib.graph);
        let context = RequestContext::new(IncludeParams::new().with("books", ["author"]))
            .element_name("books");

        let included = IncludedRelationshipExtractor::new(&accessor)
            .extract_all(lib.books.iter().copied(), &context);

        // Both books lead to the same author
        let entry = &included[&digest("authors", "1")];
        assert_eq!(entry.resource, lib.author);
        assert_eq!(entry.segment, Segment::IncludedNested);

        // The author's default profile is found beneath the requested path
        let entry = &included[&digest("profiles", "10")];
        assert_eq!(entry.segment, Segment::IncludedDefault);
        assert_eq!(included.len(), 2);
    }

    #[test]
    fn later_root_defaults_keep_earlier_explicit_tag() {
        let mut registry = ResourceRegistry::new();
        registry
            .register(
                ResourceInformation::new("books", "Book")
                    .relationship(RelationshipField::new("author"))
                    .relationship(RelationshipField::new("coauthor").include_by_default(true)),
            )
            .unwrap();
        registry
            .register(ResourceInformation::new("authors", "Author"))
            .unwrap();

        let mut graph = ResourceGraph::new();
        let author = graph.add("a1", "Author").unwrap();
        graph.set(author, "id", json!(1)).unwrap();
        let first = graph.add("b100", "Book").unwrap();
        graph.set(first, "id", json!(100)).unwrap();
        graph.link(first, "author", author).unwrap();
        graph.set(first, "coauthor", Value::Null).unwrap();
        let second = graph.add("b101", "Book").unwrap();
        graph.set(second, "id", json!(101)).unwrap();
        graph.set(second, "author", Value::Null).unwrap();
        graph.link(second, "coauthor", author).unwrap();

        let accessor = GraphAccessor::new(&registry, &graph);
        let context = RequestContext::new(IncludeParams::new().with("books", ["author"]))
            .element_name("books");

        let included =
            IncludedRelationshipExtractor::new(&accessor).extract_all([first, second], &context);

        let entry = &included[&digest("authors", "1")];
        assert_eq!(entry.segment, Segment::IncludedNested);
        assert_eq!(entry.field_name.as_deref(), Some("author"));
        assert_eq!(included.len(), 1);
    }

    #[test]
    fn default_chain_stops_at_ceiling() {
        let mut registry = ResourceRegistry::new();
        registry
            .register(
                ResourceInformation::new("nodes", "Node")
                    .relationship(RelationshipField::new("next").include_by_default(true)),
            )
            .unwrap();

        let mut graph = ResourceGraph::new();
        let chain: Vec<NodeId> = (0..50)
            .map(|i| {
                let node = graph.add(format!("n{i}"), "Node").unwrap();
                graph.set(node, "id", json!(i)).unwrap();
                node
            })
            .collect();
        for pair in chain.windows(2) {
            graph.link(pair[0], "next", pair[1]).unwrap();
        }
        graph.set(chain[49], "next", Value::Null).unwrap();

        let accessor = GraphAccessor::new(&registry, &graph);
        let included =
            IncludedRelationshipExtractor::new(&accessor).extract(Some(chain[0]), &RequestContext::default());

        // Levels 1..41 each include one successor
        assert_eq!(included.len(), MAX_RECURRENCE_LEVEL - 1);
        assert!(included.contains_key(&digest("nodes", "41")));
        assert!(!included.contains_key(&digest("nodes", "42")));
    }
}
