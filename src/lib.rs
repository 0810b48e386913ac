//! Type → schema resolution over a static type checker.
//!
//! A type annotation goes in, a JSON-schema-ish [`TypeSchema`] comes out.
//! Shapes are classified by an ordered chain of recognizers (intrinsic,
//! builtin containers, structural objects); anything unrecognized degrades to
//! `any`. The resulting schema, or any other plain data, can be turned into a
//! literal expression with [`encode_value_as_expression`] for embedding in
//! generated code.
pub mod builtin;
pub mod checker;
pub mod cli;
pub mod error;
pub mod expr;
pub mod graph;
pub mod intrinsic;
pub mod object;
pub mod path_de;
pub mod recognizer;
pub mod resolve;
pub mod schema;

pub use checker::{TypeChecker, TypeFlags};
pub use error::{Error, Result};
pub use expr::{Expr, encode_value_as_expression};
pub use recognizer::{Recognizer, Registry};
pub use resolve::{Context, GenericMode, ResolveOptions, Resolver, resolve_type_schema, type_name};
pub use schema::{Intrinsic, TypeSchema};
