use crate::basis::Basis;
use crate::error::GrammarError;
use crate::pred::{Pred, PredKind};

/// Splits prediction from matching: lookahead decisions are made with
/// `predictor`, while the generated parser actually matches `matcher`.
///
/// With `is_equivalency` set, downstream analysis also treats the
/// predictor's follow set as the matcher's (the `<=>` form); otherwise the
/// gate is one-way (`=>`).
#[derive(Debug, Clone, PartialEq)]
pub struct Gate<S> {
    predictor: Box<Pred<S>>,
    matcher: Box<Pred<S>>,
    is_equivalency: bool,
}

impl<S> Gate<S> {
    /// # Errors
    ///
    /// Returns [`GrammarError::NestedGate`] if either side is itself a gate.
    pub fn new(
        basis: Basis,
        predictor: Pred<S>,
        matcher: Pred<S>,
        is_equivalency: bool,
    ) -> Result<Self, GrammarError> {
        for side in [&predictor, &matcher] {
            if matches!(side.kind, PredKind::Gate(_)) {
                let at = if side.basis.is_missing() { basis } else { side.basis };
                return Err(GrammarError::nested_gate(at));
            }
        }
        Ok(Self {
            predictor: Box::new(predictor),
            matcher: Box::new(matcher),
            is_equivalency,
        })
    }

    #[must_use]
    pub fn predictor(&self) -> &Pred<S> {
        &self.predictor
    }

    #[must_use]
    pub fn matcher(&self) -> &Pred<S> {
        &self.matcher
    }

    #[must_use]
    pub const fn is_equivalency(&self) -> bool {
        self.is_equivalency
    }

    pub(crate) fn sides_mut(&mut self) -> (&mut Pred<S>, &mut Pred<S>) {
        (&mut self.predictor, &mut self.matcher)
    }
}
