//! Recursive type → schema resolution.
//!
//! Every nested resolution re-enters [`Resolver::resolve_type`], which runs
//! the registry in order and falls back to `any` when nothing matches. Types
//! currently being resolved are tracked by handle identity; re-entering one
//! yields a `$ref` back-edge instead of recursing forever.
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::checker::TypeChecker;
use crate::recognizer::Registry;
use crate::schema::TypeSchema;

// ------------------------------- Options --------------------------------- //

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// How generic instantiations are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum GenericMode {
    /// Resolve the unapplied generic definition; type arguments are dropped
    /// (builtin arrays excepted).
    #[default]
    Target,
    /// Resolve members on the instantiation itself, at the usage site.
    Instantiated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    pub generics: GenericMode,
    /// Nested resolutions allowed before degrading to `any`.
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { generics: GenericMode::default(), max_depth: DEFAULT_MAX_DEPTH }
    }
}

// ------------------------------- Resolver -------------------------------- //

pub struct Resolver<'c, C: TypeChecker> {
    checker: &'c C,
    registry: Registry<C>,
    options: ResolveOptions,
    in_progress: RefCell<HashSet<C::Type>>,
    depth: Cell<usize>,
}

/// What a recognizer gets to see: the checker, and callbacks bound to the
/// original usage location.
pub struct Context<'a, C: TypeChecker> {
    resolver: &'a Resolver<'a, C>,
    location: &'a C::Node,
}

impl<'c, C: TypeChecker> Resolver<'c, C> {
    pub fn new(checker: &'c C) -> Self {
        Self::with_options(checker, ResolveOptions::default())
    }

    pub fn with_options(checker: &'c C, options: ResolveOptions) -> Self {
        Self {
            checker,
            registry: Registry::default(),
            options,
            in_progress: RefCell::new(HashSet::new()),
            depth: Cell::new(0),
        }
    }

    pub fn with_registry(mut self, registry: Registry<C>) -> Self {
        self.registry = registry;
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Top-level entry: resolve the annotation and label the root with its
    /// best-effort name.
    pub fn resolve_type_node(&self, node: &C::Node) -> TypeSchema {
        let ty = self.checker.type_from_type_node(node);
        let name = type_name(self.checker, &ty, node);
        tracing::debug!(?ty, name = name.as_deref(), "resolving type schema");
        self.resolve_type(&ty, node, name)
    }

    /// `title` only labels the `any` fallback.
    pub fn resolve_type(
        &self,
        ty: &C::Type,
        location: &C::Node,
        title: Option<String>,
    ) -> TypeSchema {
        let depth = self.depth.get();
        if depth >= self.options.max_depth {
            tracing::warn!(?ty, depth, "type resolution depth limit, falling back to any");
            return TypeSchema::Any { title };
        }

        let cx = Context { resolver: self, location };
        self.depth.set(depth + 1);
        let schema = cx.guarded(ty, || Some(self.dispatch(ty, &cx, title)));
        self.depth.set(depth);

        schema.unwrap_or_else(TypeSchema::any)
    }

    fn dispatch(&self, ty: &C::Type, cx: &Context<'_, C>, title: Option<String>) -> TypeSchema {
        for recognizer in self.registry.iter() {
            if let Some(schema) = recognizer.recognize(ty, cx) {
                tracing::trace!(recognizer = recognizer.name(), ?ty, "recognized");
                return schema;
            }
        }
        tracing::warn!(
            ?ty,
            title = title.as_deref(),
            "no recognizer matched type, falling back to any"
        );
        TypeSchema::Any { title }
    }

    fn back_reference(&self, ty: &C::Type) -> TypeSchema {
        let name = self.checker.symbol(ty).map(|symbol| self.checker.symbol_name(&symbol));
        tracing::warn!(?ty, name = name.as_deref(), "recursive type, emitting back-reference");
        match name {
            Some(name) => TypeSchema::Reference(format!("#{name}")),
            None => TypeSchema::reference("#"),
        }
    }
}

impl<'a, C: TypeChecker> Context<'a, C> {
    pub fn checker(&self) -> &'a C {
        self.resolver.checker
    }

    pub fn options(&self) -> &'a ResolveOptions {
        &self.resolver.options
    }

    pub fn location(&self) -> &'a C::Node {
        self.location
    }

    /// Resolve a nested type through the whole registry.
    pub fn resolve(&self, ty: &C::Type) -> TypeSchema {
        self.resolver.resolve_type(ty, self.location, None)
    }

    /// Declared type of a member symbol as seen from the usage location.
    pub fn type_of_member(&self, symbol: &C::Symbol) -> C::Type {
        self.resolver.checker.type_of_symbol_at(symbol, self.location)
    }

    /// Run `f` with `ty` marked in progress. A type already in progress
    /// yields a back-reference without calling `f`.
    pub fn guarded(
        &self,
        ty: &C::Type,
        f: impl FnOnce() -> Option<TypeSchema>,
    ) -> Option<TypeSchema> {
        if !self.resolver.in_progress.borrow_mut().insert(ty.clone()) {
            return Some(self.resolver.back_reference(ty));
        }
        let schema = f();
        self.resolver.in_progress.borrow_mut().remove(ty);
        schema
    }
}

// --------------------------------- Names --------------------------------- //

/// Declared symbol name, else the identifier text of the reference.
pub fn type_name<C: TypeChecker>(checker: &C, ty: &C::Type, node: &C::Node) -> Option<String> {
    match checker.symbol(ty) {
        Some(symbol) => Some(checker.symbol_name(&symbol)),
        None => checker.type_node_name(node),
    }
}

/// Resolve `node` with default options and the default registry.
pub fn resolve_type_schema<C: TypeChecker>(node: &C::Node, checker: &C) -> TypeSchema {
    Resolver::new(checker).resolve_type_node(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphDocument, TypeGraph};
    use crate::recognizer::Recognizer;
    use crate::schema::Intrinsic;
    use serde_json::json;
    use std::rc::Rc;

    fn graph() -> TypeGraph {
        let doc = GraphDocument::from_json_value(json!({
            "types": {
                "number": { "kind": "intrinsic", "name": "number" },
                "Point": {
                    "kind": "object",
                    "symbol": "Point",
                    "properties": { "x": "number", "y": "number" }
                },
                "Anon": { "kind": "object", "properties": { "x": "number" } },
                "Handler": { "kind": "opaque" }
            }
        }))
        .unwrap();
        TypeGraph::new(doc).unwrap()
    }

    /// Claims every type as a fixed intrinsic and counts its calls.
    struct Always(Intrinsic, Rc<Cell<usize>>);

    impl<C: TypeChecker> Recognizer<C> for Always {
        fn name(&self) -> &'static str {
            "always"
        }
        fn recognize(&self, _ty: &C::Type, _cx: &Context<'_, C>) -> Option<TypeSchema> {
            self.1.set(self.1.get() + 1);
            Some(TypeSchema::Intrinsic(self.0))
        }
    }

    #[test]
    fn default_registry_order() {
        assert_eq!(Registry::<TypeGraph>::default().names(), ["intrinsic", "builtin", "object"]);
    }

    #[test]
    fn first_match_wins() {
        let g = graph();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let registry = Registry::empty()
            .with(Always(Intrinsic::Boolean, first.clone()))
            .with(Always(Intrinsic::String, second.clone()));
        let node = g.type_node("Point").unwrap();
        let schema = Resolver::new(&g).with_registry(registry).resolve_type_node(&node);
        assert_eq!(schema, TypeSchema::Intrinsic(Intrinsic::Boolean));
        assert_eq!((first.get(), second.get()), (1, 0));
    }

    #[test]
    fn empty_registry_falls_back_to_titled_any() {
        let g = graph();
        let node = g.type_node("Point").unwrap();
        let schema = Resolver::new(&g).with_registry(Registry::empty()).resolve_type_node(&node);
        assert_eq!(schema, TypeSchema::Any { title: Some("Point".into()) });
    }

    #[test]
    fn object_title_comes_from_the_symbol_only() {
        let g = graph();
        let node = g.type_node("Anon").unwrap();
        let schema = resolve_type_schema(&node, &g);
        assert_eq!(schema.title(), None);
        assert!(schema.is_object());
    }

    #[test]
    fn names_prefer_the_symbol() {
        let g = graph();
        let point = g.type_node("Point").unwrap();
        let handler = g.type_node("Handler").unwrap();
        let name = |ty| type_name(&g, &ty, &handler);
        assert_eq!(name(g.type_from_type_node(&point)).as_deref(), Some("Point"));
        assert_eq!(name(g.type_from_type_node(&handler)).as_deref(), Some("Handler"));
    }

    #[test]
    fn resolver_state_is_reset_between_calls() {
        let g = graph();
        let resolver = Resolver::new(&g);
        let node = g.type_node("Point").unwrap();
        let first = resolver.resolve_type_node(&node);
        let second = resolver.resolve_type_node(&node);
        assert_eq!(first, second);
        assert!(resolver.in_progress.borrow().is_empty());
        assert_eq!(resolver.depth.get(), 0);
    }
}
