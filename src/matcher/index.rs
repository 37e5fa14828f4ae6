use std::fmt;

/// Which element(s) of an ordered list a sub-matcher is tried against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    First,
    Last,
    Any,
    /// Zero-based position.
    At(usize),
}

impl Index {
    pub fn first() -> Self {
        Index::First
    }

    pub fn last() -> Self {
        Index::Last
    }

    pub fn any() -> Self {
        Index::Any
    }

    pub fn at(position: usize) -> Self {
        Index::At(position)
    }

    /// `At(n)` needs `n < len`; the others need a non-empty list.
    pub fn is_valid<T>(&self, list: &[T]) -> bool {
        match self {
            Index::At(n) => *n < list.len(),
            Index::First | Index::Last | Index::Any => !list.is_empty(),
        }
    }

    /// Candidates to try, empty when the index is not valid for `list`.
    pub fn select<'a, T>(&self, list: &'a [T]) -> &'a [T] {
        if !self.is_valid(list) {
            return &[];
        }
        match self {
            Index::First => &list[..1],
            Index::Last => &list[list.len() - 1..],
            Index::Any => list,
            Index::At(n) => &list[*n..*n + 1],
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::First => write!(f, "first"),
            Index::Last => write!(f, "last"),
            Index::Any => write!(f, "any"),
            Index::At(n) => write!(f, "at({n})"),
        }
    }
}
