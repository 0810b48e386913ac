//! Structural fallback for record-like types: tuples, generic instantiations,
//! inherited members and own members flattened into one property map.
use indexmap::{IndexMap, IndexSet};

use crate::builtin::recognize_builtin;
use crate::checker::TypeChecker;
use crate::recognizer::Recognizer;
use crate::resolve::{Context, GenericMode};
use crate::schema::TypeSchema;

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectRecognizer;

impl<C: TypeChecker> Recognizer<C> for ObjectRecognizer {
    fn name(&self) -> &'static str {
        "object"
    }

    fn recognize(&self, ty: &C::Type, cx: &Context<'_, C>) -> Option<TypeSchema> {
        recognize_object(ty, cx)
    }
}

pub fn recognize_object<C: TypeChecker>(ty: &C::Type, cx: &Context<'_, C>) -> Option<TypeSchema> {
    let checker = cx.checker();
    let flags = checker.flags(ty);
    if !flags.object {
        return None;
    }

    if let Some(builtin) = recognize_builtin(ty, cx) {
        return Some(builtin);
    }

    // slot types are not preserved
    if flags.tuple {
        return Some(TypeSchema::array_of(TypeSchema::any()));
    }

    // Instantiation → unapplied definition. Type arguments are not substituted.
    if flags.reference && cx.options().generics == GenericMode::Target {
        if let Some(target) = checker.reference_target(ty).filter(|target| target != ty) {
            if let Some(schema) = cx.guarded(&target, || recognize_object(&target, cx)) {
                return Some(schema);
            }
        }
    }

    let mut inherited: IndexMap<String, TypeSchema> = IndexMap::new();
    if flags.interface {
        for base in checker.base_types(ty).unwrap_or_default() {
            // later bases override earlier ones; non-object bases are dropped
            if let Some(TypeSchema::Object { properties, .. }) =
                cx.guarded(&base, || recognize_object(&base, cx))
            {
                inherited.extend(properties);
            }
        }
    }

    let own = resolve_members(ty, cx);

    let mut required: IndexSet<String> = inherited.keys().cloned().collect();
    required.extend(own.keys().cloned());

    let mut properties = inherited;
    properties.extend(own);

    let title = checker.symbol(ty).map(|symbol| checker.symbol_name(&symbol));
    Some(TypeSchema::Object { title, properties, required })
}

/// Member types are taken at the usage site, so instantiated generics see
/// their actual arguments.
fn resolve_members<C: TypeChecker>(
    ty: &C::Type,
    cx: &Context<'_, C>,
) -> IndexMap<String, TypeSchema> {
    let checker = cx.checker();
    checker
        .properties(ty)
        .iter()
        .map(|symbol| {
            let member_type = cx.type_of_member(symbol);
            (checker.symbol_name(symbol), cx.resolve(&member_type))
        })
        .collect()
}
