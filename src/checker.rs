//! Capabilities the resolver needs from a static type checker.
//!
//! The resolver never inspects a checker's internal representation; every
//! shape question goes through this trait. Handles are cheap clones and
//! compare by identity.
use std::fmt::Debug;
use std::hash::Hash;

use crate::schema::Intrinsic;

/// Shape queries on a type handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeFlags {
    /// record-like (object, interface, class, instantiation, tuple)
    pub object: bool,
    pub tuple: bool,
    /// generic instantiation; see [`TypeChecker::reference_target`]
    pub reference: bool,
    /// interface-like declaration that may carry base types
    pub interface: bool,
}

pub trait TypeChecker {
    type Type: Clone + Eq + Hash + Debug;
    type Symbol: Clone + Debug;
    type Node: Debug;

    /// Resolve a syntactic type annotation.
    fn type_from_type_node(&self, node: &Self::Node) -> Self::Type;

    /// Declared type of a member symbol as observed from `location`.
    fn type_of_symbol_at(&self, symbol: &Self::Symbol, location: &Self::Node) -> Self::Type;

    /// Literal identifier text when the node names a type.
    fn type_node_name(&self, node: &Self::Node) -> Option<String>;

    fn symbol(&self, ty: &Self::Type) -> Option<Self::Symbol>;

    fn symbol_name(&self, symbol: &Self::Symbol) -> String;

    /// Names in the symbol's member table, `None` when it has no table.
    fn symbol_member_names(&self, symbol: &Self::Symbol) -> Option<Vec<String>>;

    /// Property symbols exposed by the type, inherited ones included.
    fn properties(&self, ty: &Self::Type) -> Vec<Self::Symbol>;

    fn flags(&self, ty: &Self::Type) -> TypeFlags;

    /// Unapplied generic definition of an instantiation. Equal to `ty` for
    /// the definition itself.
    fn reference_target(&self, ty: &Self::Type) -> Option<Self::Type>;

    fn type_arguments(&self, ty: &Self::Type) -> Option<Vec<Self::Type>>;

    fn base_types(&self, ty: &Self::Type) -> Option<Vec<Self::Type>>;

    fn intrinsic(&self, ty: &Self::Type) -> Option<Intrinsic>;
}
