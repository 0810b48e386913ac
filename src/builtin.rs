//! Well-known generic containers, matched by member signature rather than by
//! declaration identity, so shadowed or duplicated lib declarations still
//! qualify.
use std::collections::BTreeSet;

use crate::checker::TypeChecker;
use crate::recognizer::Recognizer;
use crate::resolve::Context;
use crate::schema::{DATE_REF, PROMISE_REF, TypeSchema};

/// Symbol name plus the member names it must expose (a subset check).
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub symbol: &'static str,
    pub members: &'static [&'static str],
}

pub const ARRAY: Signature = Signature {
    symbol: "Array",
    members: &["length", "pop", "push", "join", "shift", "slice", "sort"],
};

pub const DATE: Signature = Signature {
    symbol: "Date",
    members: &[
        "toString",
        "toDateString",
        "toISOString",
        "toTimeString",
        "valueOf",
        "getDate",
        "getTime",
    ],
};

pub const PROMISE: Signature = Signature {
    symbol: "Promise",
    members: &["catch", "then"],
};

impl Signature {
    pub fn matches(&self, symbol_name: &str, member_names: &BTreeSet<String>) -> bool {
        symbol_name == self.symbol && self.members.iter().all(|m| member_names.contains(*m))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinRecognizer;

impl<C: TypeChecker> Recognizer<C> for BuiltinRecognizer {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn recognize(&self, ty: &C::Type, cx: &Context<'_, C>) -> Option<TypeSchema> {
        recognize_builtin(ty, cx)
    }
}

pub fn recognize_builtin<C: TypeChecker>(ty: &C::Type, cx: &Context<'_, C>) -> Option<TypeSchema> {
    let checker = cx.checker();
    if !checker.flags(ty).object {
        return None;
    }
    let symbol = checker.symbol(ty)?;
    let members: BTreeSet<String> = checker.symbol_member_names(&symbol)?.into_iter().collect();
    let name = checker.symbol_name(&symbol);

    if ARRAY.matches(&name, &members) {
        let items = match checker.type_arguments(ty).as_deref() {
            Some([item]) if checker.flags(ty).reference => cx.resolve(item),
            _ => TypeSchema::any(),
        };
        Some(TypeSchema::array_of(items))
    } else if DATE.matches(&name, &members) {
        Some(TypeSchema::reference(DATE_REF))
    } else if PROMISE.matches(&name, &members) {
        Some(TypeSchema::reference(PROMISE_REF))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(xs: &[&str]) -> BTreeSet<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn signature_is_a_subset_check() {
        let mut members = names(ARRAY.members);
        assert!(ARRAY.matches("Array", &members));
        members.insert("flatMap".into());
        assert!(ARRAY.matches("Array", &members));
        members.remove("sort");
        assert!(!ARRAY.matches("Array", &members));
    }

    #[test]
    fn signature_requires_symbol_name() {
        assert!(!PROMISE.matches("Thenable", &names(&["then", "catch"])));
        assert!(PROMISE.matches("Promise", &names(&["then", "catch", "finally"])));
    }
}
