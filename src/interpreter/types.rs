use crate::types::JsValue;

/// A completion record (§6.2.4).
///
/// `Normal(None)` is the empty completion of statements that produce no
/// value. Break and continue carry their target label and the value of the
/// statement list they interrupted.
#[derive(Clone, Debug)]
pub enum Completion {
    Normal(Option<JsValue>),
    Return(JsValue),
    Throw(JsValue),
    Break(Option<String>, Option<JsValue>),
    Continue(Option<String>, Option<JsValue>),
}

impl Completion {
    pub fn normal(value: JsValue) -> Self {
        Completion::Normal(Some(value))
    }

    pub fn empty() -> Self {
        Completion::Normal(None)
    }

    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Completion::Normal(_))
    }

    /// The completion's value slot, if not empty.
    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Completion::Normal(v) | Completion::Break(_, v) | Completion::Continue(_, v) => v.as_ref(),
            Completion::Return(v) | Completion::Throw(v) => Some(v),
        }
    }

    // §6.2.4.4 UpdateEmpty(completionRecord, value)
    pub(crate) fn update_empty(self, value: Option<JsValue>) -> Completion {
        match self {
            Completion::Normal(None) => Completion::Normal(value),
            Completion::Break(label, None) => Completion::Break(label, value),
            Completion::Continue(label, None) => Completion::Continue(label, value),
            other => other,
        }
    }
}
