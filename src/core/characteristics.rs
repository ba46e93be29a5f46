//! Metadata threaded through a pipeline when evaluation starts.

/// Immutable facts about the elements a stage will receive.
///
/// The source produces one value from its producer; every stage derives the
/// value it hands downstream from the one it received. Nothing is mutated in
/// place, every `with_*` call returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Characteristics {
    size: Option<u64>,
    distinct: bool,
    checked: bool,
}

impl Characteristics {
    /// Unknown size, not distinct, unchecked.
    pub const fn regular() -> Self {
        Characteristics {
            size: None,
            distinct: false,
            checked: false,
        }
    }

    /// Exact number of elements that will arrive, if known.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Whether no two value elements are equal.
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Whether element errors are expected and must be handled before a terminal.
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn with_size(self, size: Option<u64>) -> Self {
        Characteristics { size, ..self }
    }

    pub fn with_unknown_size(self) -> Self {
        self.with_size(None)
    }

    pub fn with_distinct(self, distinct: bool) -> Self {
        Characteristics { distinct, ..self }
    }

    pub fn with_checked(self, checked: bool) -> Self {
        Characteristics { checked, ..self }
    }
}

/// How a stage rewrites the checked flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckedUpdate {
    /// Errors are expected downstream from here on.
    Set,
    /// Pass the upstream flag through.
    Preserve,
    /// Every error is resolved by this stage.
    Clear,
}

impl CheckedUpdate {
    pub fn apply(self, characteristics: Characteristics) -> Characteristics {
        match self {
            CheckedUpdate::Set => characteristics.with_checked(true),
            CheckedUpdate::Preserve => characteristics,
            CheckedUpdate::Clear => characteristics.with_checked(false),
        }
    }
}
