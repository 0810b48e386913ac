//! A serde-loaded type graph that stands in for a live type checker.
//!
//! ```json
//! { "types": {
//!     "User":  { "kind": "object", "symbol": "User", "interface": true,
//!                "bases": ["Named"], "properties": { "tags": "Array<string>" } },
//!     "Array<string>": { "kind": "reference", "target": "Array", "arguments": ["string"] },
//!     "string": { "kind": "intrinsic", "name": "string" } } }
//! ```
//!
//! Type ids are arbitrary strings; a [`TypeNode`] names one of them the way a
//! type annotation would. Member types reached through an instantiation have
//! the target's type parameters replaced by the instantiation's arguments,
//! including inside nested instantiations and along generic bases.
use std::cell::{OnceCell, RefCell};
use std::path::Path;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use crate::checker::{TypeChecker, TypeFlags};
use crate::error::{Error, Result};
use crate::schema::Intrinsic;

// ------------------------------- Document -------------------------------- //

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphDocument {
    pub types: IndexMap<String, TypeDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDef {
    Intrinsic {
        name: Intrinsic,
    },
    Object {
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        interface: bool,
        #[serde(default)]
        bases: Vec<String>,
        /// type parameter ids; non-empty makes this a generic definition
        #[serde(default)]
        parameters: Vec<String>,
        /// data members: name → type id
        #[serde(default)]
        properties: IndexMap<String, String>,
        /// extra symbol-table names (methods) with no resolved data type
        #[serde(default)]
        members: Vec<String>,
    },
    Tuple {
        elements: Vec<String>,
    },
    Reference {
        target: String,
        #[serde(default)]
        arguments: Vec<String>,
    },
    /// Anything no recognizer claims: unions, functions, type parameters.
    Opaque {
        #[serde(default)]
        symbol: Option<String>,
    },
}

impl GraphDocument {
    pub fn from_json_str(src: &str) -> Result<Self> {
        crate::path_de::from_str_with_path(src)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        crate::path_de::from_value_with_path(value)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)?;
        Self::from_json_str(&src)
            .map_err(|error| Error::Parse(format!("{}: {error}", path.display())))
    }

    /// Later definitions replace earlier ones with the same id.
    pub fn merge(&mut self, other: GraphDocument) {
        self.types.extend(other.types);
    }
}

// --------------------------------- Graph --------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphSymbol {
    /// the declaration behind a type
    Type(TypeId),
    Property {
        owner: TypeId,
        name: String,
        /// instantiation the member was reached through
        through: Option<TypeId>,
    },
}

/// A type annotation naming one type of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    text: String,
    id: TypeId,
}

impl TypeNode {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// `TypeDef` with every id resolved to an index.
#[derive(Debug, Clone)]
enum Def {
    Intrinsic(Intrinsic),
    Object {
        symbol: Option<String>,
        interface: bool,
        bases: Vec<TypeId>,
        parameters: Vec<TypeId>,
        properties: IndexMap<String, TypeId>,
        members: Vec<String>,
    },
    Tuple(Vec<TypeId>),
    Reference { target: TypeId, arguments: Vec<TypeId> },
    Opaque(Option<String>),
}

/// Document types occupy the first ids; instantiations minted by
/// substitution are appended after them.
#[derive(Debug, Clone)]
pub struct TypeGraph {
    names: IndexSet<String>,
    defs: RefCell<Vec<Rc<Def>>>,
    /// (target, arguments) → instantiation id
    instances: RefCell<IndexMap<(TypeId, Vec<TypeId>), TypeId>>,
    unknown: OnceCell<TypeId>,
}

impl TypeGraph {
    /// Resolve and validate every id the document mentions.
    pub fn new(document: GraphDocument) -> Result<Self> {
        let names: IndexSet<String> = document.types.keys().cloned().collect();
        let lookup = |id: &String, from: &String| -> Result<TypeId> {
            names
                .get_index_of(id)
                .map(TypeId)
                .ok_or_else(|| Error::UnknownType { id: id.clone(), from: from.clone() })
        };
        let lookup_all = |ids: &[String], from: &String| -> Result<Vec<TypeId>> {
            ids.iter().map(|id| lookup(id, from)).collect()
        };

        let mut defs = Vec::with_capacity(document.types.len());
        let mut instances = IndexMap::new();
        for (from, def) in &document.types {
            let def = match def {
                TypeDef::Intrinsic { name } => Def::Intrinsic(*name),
                TypeDef::Object { symbol, interface, bases, parameters, properties, members } => {
                    Def::Object {
                        symbol: symbol.clone(),
                        interface: *interface,
                        bases: lookup_all(bases, from)?,
                        parameters: lookup_all(parameters, from)?,
                        properties: properties
                            .iter()
                            .map(|(name, id)| -> Result<(String, TypeId)> {
                                Ok((name.clone(), lookup(id, from)?))
                            })
                            .collect::<Result<_>>()?,
                        members: members.clone(),
                    }
                }
                TypeDef::Tuple { elements } => Def::Tuple(lookup_all(elements, from)?),
                TypeDef::Reference { target, arguments } => {
                    let target_id = lookup(target, from)?;
                    if !matches!(document.types.get(target), Some(TypeDef::Object { .. })) {
                        return Err(Error::InvalidTarget {
                            id: from.clone(),
                            target: target.clone(),
                        });
                    }
                    let arguments = lookup_all(arguments, from)?;
                    instances
                        .entry((target_id, arguments.clone()))
                        .or_insert(TypeId(defs.len()));
                    Def::Reference { target: target_id, arguments }
                }
                TypeDef::Opaque { symbol } => Def::Opaque(symbol.clone()),
            };
            defs.push(Rc::new(def));
        }

        let graph = Self {
            names,
            defs: RefCell::new(defs),
            instances: RefCell::new(instances),
            unknown: OnceCell::new(),
        };
        for index in 0..graph.len() {
            graph.check_acyclic_bases(TypeId(index), &mut Vec::new())?;
        }
        Ok(graph)
    }

    pub fn from_json_str(src: &str) -> Result<Self> {
        Self::new(GraphDocument::from_json_str(src)?)
    }

    pub fn id(&self, name: &str) -> Option<TypeId> {
        self.names.get_index_of(name).map(TypeId)
    }

    pub fn type_node(&self, text: &str) -> Result<TypeNode> {
        let id = self.id(text).ok_or_else(|| Error::UnknownType {
            id: text.to_owned(),
            from: "<type reference>".to_owned(),
        })?;
        Ok(TypeNode { text: text.to_owned(), id })
    }

    /// Number of types the document declared.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    // TypeIds are only minted by this graph.
    fn def(&self, id: TypeId) -> Rc<Def> {
        Rc::clone(&self.defs.borrow()[id.0])
    }

    fn push(&self, def: Def) -> TypeId {
        let mut defs = self.defs.borrow_mut();
        defs.push(Rc::new(def));
        TypeId(defs.len() - 1)
    }

    fn key(&self, id: TypeId) -> &str {
        self.names.get_index(id.0).map(String::as_str).unwrap_or_default()
    }

    /// Stand-in for member types that cannot be looked up.
    fn unknown(&self) -> TypeId {
        *self.unknown.get_or_init(|| self.push(Def::Opaque(None)))
    }

    /// The existing instantiation of `target` with `arguments`, or a new one.
    fn instantiate(&self, target: TypeId, arguments: Vec<TypeId>) -> TypeId {
        let key = (target, arguments);
        let existing = self.instances.borrow().get(&key).copied();
        if let Some(id) = existing {
            return id;
        }
        let id = self.push(Def::Reference { target: key.0, arguments: key.1.clone() });
        self.instances.borrow_mut().insert(key, id);
        id
    }

    /// Object definition behind `id`, following an instantiation to its target.
    fn declaration(&self, id: TypeId) -> Option<TypeId> {
        match &*self.def(id) {
            Def::Object { .. } => Some(id),
            Def::Reference { target, .. } => Some(*target),
            _ => None,
        }
    }

    fn bases_of(&self, id: TypeId) -> Vec<TypeId> {
        match self.declaration(id).map(|decl| self.def(decl)).as_deref() {
            Some(Def::Object { bases, .. }) => bases.clone(),
            _ => Vec::new(),
        }
    }

    fn check_acyclic_bases(&self, id: TypeId, stack: &mut Vec<TypeId>) -> Result<()> {
        let Some(decl) = self.declaration(id) else { return Ok(()) };
        if stack.contains(&decl) {
            return Err(Error::CyclicBases(self.key(decl).to_owned()));
        }
        stack.push(decl);
        for base in self.bases_of(decl) {
            self.check_acyclic_bases(base, stack)?;
        }
        stack.pop();
        Ok(())
    }

    /// Parameter → argument pairs an instantiation applies to its target.
    fn bindings(&self, instance: TypeId) -> Vec<(TypeId, TypeId)> {
        let def = self.def(instance);
        let Def::Reference { target, arguments } = &*def else { return Vec::new() };
        match &*self.def(*target) {
            Def::Object { parameters, .. } => {
                parameters.iter().copied().zip(arguments.iter().copied()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Replace bound parameters in `ty`, descending into instantiation arguments.
    fn substitute(
        &self,
        ty: TypeId,
        bindings: &[(TypeId, TypeId)],
        seen: &mut Vec<TypeId>,
    ) -> TypeId {
        if let Some((_, argument)) = bindings.iter().find(|(parameter, _)| *parameter == ty) {
            return *argument;
        }
        let def = self.def(ty);
        let Def::Reference { target, arguments } = &*def else { return ty };
        if bindings.is_empty() || seen.contains(&ty) {
            return ty;
        }
        seen.push(ty);
        let substituted: Vec<TypeId> =
            arguments.iter().map(|argument| self.substitute(*argument, bindings, seen)).collect();
        seen.pop();
        if substituted == *arguments { ty } else { self.instantiate(*target, substituted) }
    }

    fn collect_properties(&self, id: TypeId, out: &mut IndexMap<String, GraphSymbol>) {
        match &*self.def(id) {
            Def::Object { properties, .. } => {
                for base in self.bases_of(id) {
                    self.collect_properties(base, out);
                }
                for name in properties.keys() {
                    let symbol =
                        GraphSymbol::Property { owner: id, name: name.clone(), through: None };
                    out.insert(name.clone(), symbol);
                }
            }
            Def::Reference { target, .. } => {
                let bindings = self.bindings(id);
                let mut inner = IndexMap::new();
                self.collect_properties(*target, &mut inner);
                for (name, symbol) in inner {
                    let symbol = match symbol {
                        GraphSymbol::Property { owner, name, through: None }
                            if owner == *target =>
                        {
                            GraphSymbol::Property { owner, name, through: Some(id) }
                        }
                        // inherited through a generic base: apply our arguments to it
                        GraphSymbol::Property { owner, name, through: Some(base) } => {
                            let through = self.substitute(base, &bindings, &mut Vec::new());
                            GraphSymbol::Property { owner, name, through: Some(through) }
                        }
                        other => other,
                    };
                    out.insert(name, symbol);
                }
            }
            _ => {}
        }
    }
}

// -------------------------------- Checker -------------------------------- //

impl TypeChecker for TypeGraph {
    type Type = TypeId;
    type Symbol = GraphSymbol;
    type Node = TypeNode;

    fn type_from_type_node(&self, node: &TypeNode) -> TypeId {
        node.id
    }

    /// A property symbol this graph did not produce yields an opaque type.
    fn type_of_symbol_at(&self, symbol: &GraphSymbol, _location: &TypeNode) -> TypeId {
        match symbol {
            GraphSymbol::Type(id) => *id,
            GraphSymbol::Property { owner, name, through } => {
                let owner_def = self.defs.borrow().get(owner.0).cloned();
                let declared = match owner_def.as_deref() {
                    Some(Def::Object { properties, .. }) => properties.get(name.as_str()).copied(),
                    _ => None,
                };
                let Some(declared) = declared else {
                    tracing::warn!(%name, ?owner, "unknown property symbol, treating as opaque");
                    return self.unknown();
                };
                match through {
                    Some(through) => {
                        self.substitute(declared, &self.bindings(*through), &mut Vec::new())
                    }
                    None => declared,
                }
            }
        }
    }

    fn type_node_name(&self, node: &TypeNode) -> Option<String> {
        let head = node.text.split('<').next().unwrap_or_default().trim();
        let is_name = !head.is_empty()
            && head.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'));
        is_name.then(|| head.to_owned())
    }

    fn symbol(&self, ty: &TypeId) -> Option<GraphSymbol> {
        match &*self.def(*ty) {
            Def::Object { symbol: Some(_), .. } | Def::Opaque(Some(_)) => {
                Some(GraphSymbol::Type(*ty))
            }
            Def::Reference { target, .. } => self.symbol(target),
            _ => None,
        }
    }

    fn symbol_name(&self, symbol: &GraphSymbol) -> String {
        match symbol {
            GraphSymbol::Type(id) => match &*self.def(*id) {
                Def::Object { symbol: Some(name), .. } | Def::Opaque(Some(name)) => name.clone(),
                _ => self.key(*id).to_owned(),
            },
            GraphSymbol::Property { name, .. } => name.clone(),
        }
    }

    fn symbol_member_names(&self, symbol: &GraphSymbol) -> Option<Vec<String>> {
        match symbol {
            GraphSymbol::Type(id) => match &*self.def(*id) {
                Def::Object { properties, members, .. } => {
                    Some(properties.keys().chain(members).cloned().collect())
                }
                _ => None,
            },
            GraphSymbol::Property { .. } => None,
        }
    }

    fn properties(&self, ty: &TypeId) -> Vec<GraphSymbol> {
        let mut out = IndexMap::new();
        self.collect_properties(*ty, &mut out);
        out.into_values().collect()
    }

    fn flags(&self, ty: &TypeId) -> TypeFlags {
        match &*self.def(*ty) {
            Def::Intrinsic(_) | Def::Opaque(_) => TypeFlags::default(),
            Def::Object { interface, parameters, .. } => TypeFlags {
                object: true,
                tuple: false,
                reference: !parameters.is_empty(),
                interface: *interface,
            },
            Def::Tuple(_) => TypeFlags { object: true, tuple: true, ..TypeFlags::default() },
            Def::Reference { target, .. } => TypeFlags {
                object: true,
                tuple: false,
                reference: true,
                interface: self.flags(target).interface,
            },
        }
    }

    fn reference_target(&self, ty: &TypeId) -> Option<TypeId> {
        match &*self.def(*ty) {
            Def::Reference { target, .. } => Some(*target),
            Def::Object { parameters, .. } if !parameters.is_empty() => Some(*ty),
            _ => None,
        }
    }

    fn type_arguments(&self, ty: &TypeId) -> Option<Vec<TypeId>> {
        match &*self.def(*ty) {
            Def::Reference { arguments, .. } => Some(arguments.clone()),
            Def::Tuple(elements) => Some(elements.clone()),
            Def::Object { parameters, .. } if !parameters.is_empty() => Some(parameters.clone()),
            _ => None,
        }
    }

    /// Bases of an instantiation carry its arguments.
    fn base_types(&self, ty: &TypeId) -> Option<Vec<TypeId>> {
        if !self.flags(ty).interface {
            return None;
        }
        let bindings = self.bindings(*ty);
        let bases = self.bases_of(*ty).into_iter();
        Some(bases.map(|base| self.substitute(base, &bindings, &mut Vec::new())).collect())
    }

    fn intrinsic(&self, ty: &TypeId) -> Option<Intrinsic> {
        match &*self.def(*ty) {
            Def::Intrinsic(kind) => Some(*kind),
            _ => None,
        }
    }
}
