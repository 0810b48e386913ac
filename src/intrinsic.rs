use crate::checker::TypeChecker;
use crate::recognizer::Recognizer;
use crate::resolve::Context;
use crate::schema::TypeSchema;

/// Primitive leaves (`string`, `number`, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct IntrinsicRecognizer;

impl<C: TypeChecker> Recognizer<C> for IntrinsicRecognizer {
    fn name(&self) -> &'static str {
        "intrinsic"
    }

    fn recognize(&self, ty: &C::Type, cx: &Context<'_, C>) -> Option<TypeSchema> {
        cx.checker().intrinsic(ty).map(TypeSchema::Intrinsic)
    }
}
