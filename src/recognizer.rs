//! Ordered, first-match-wins chain of type-shape recognizers.
use crate::builtin::BuiltinRecognizer;
use crate::checker::TypeChecker;
use crate::intrinsic::IntrinsicRecognizer;
use crate::object::ObjectRecognizer;
use crate::resolve::Context;
use crate::schema::TypeSchema;

pub trait Recognizer<C: TypeChecker> {
    fn name(&self) -> &'static str;

    /// `None` means "not my shape": the next recognizer gets a turn.
    fn recognize(&self, ty: &C::Type, cx: &Context<'_, C>) -> Option<TypeSchema>;
}

pub struct Registry<C: TypeChecker> {
    recognizers: Vec<Box<dyn Recognizer<C>>>,
}

impl<C: TypeChecker> Registry<C> {
    pub fn empty() -> Self {
        Self { recognizers: Vec::new() }
    }

    /// Append a recognizer; it runs after every one already registered.
    pub fn with(mut self, recognizer: impl Recognizer<C> + 'static) -> Self {
        self.recognizers.push(Box::new(recognizer));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Recognizer<C>> {
        self.recognizers.iter().map(|r| r.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }
}

/// Intrinsic, then builtin containers, then structural objects. Containers
/// are record-like too, so they must be claimed before the structural pass.
impl<C: TypeChecker> Default for Registry<C> {
    fn default() -> Self {
        Self::empty()
            .with(IntrinsicRecognizer)
            .with(BuiltinRecognizer)
            .with(ObjectRecognizer)
    }
}

impl<C: TypeChecker> std::fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
