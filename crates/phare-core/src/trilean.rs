//! Three-valued logic for queries over incomplete cross-file knowledge
//!
//! Ancestry and override queries can hit classes declared outside the
//! analyzed project. `Unknown` is a distinct, load-bearing outcome there and
//! must never be collapsed to `False` by consumers.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trilean {
    True,
    False,
    Unknown,
}

impl Trilean {
    pub fn from_bool(value: bool) -> Self {
        if value { Trilean::True } else { Trilean::False }
    }

    pub fn is_true(self) -> bool {
        self == Trilean::True
    }

    pub fn is_false(self) -> bool {
        self == Trilean::False
    }

    /// Kleene conjunction: `False` dominates, then `Unknown`.
    pub fn and(self, other: Trilean) -> Trilean {
        match (self, other) {
            (Trilean::False, _) | (_, Trilean::False) => Trilean::False,
            (Trilean::Unknown, _) | (_, Trilean::Unknown) => Trilean::Unknown,
            _ => Trilean::True,
        }
    }

    /// Kleene disjunction: `True` dominates, then `Unknown`.
    pub fn or(self, other: Trilean) -> Trilean {
        match (self, other) {
            (Trilean::True, _) | (_, Trilean::True) => Trilean::True,
            (Trilean::Unknown, _) | (_, Trilean::Unknown) => Trilean::Unknown,
            _ => Trilean::False,
        }
    }

    pub fn negate(self) -> Trilean {
        match self {
            Trilean::True => Trilean::False,
            Trilean::False => Trilean::True,
            Trilean::Unknown => Trilean::Unknown,
        }
    }
}

impl From<bool> for Trilean {
    fn from(value: bool) -> Self {
        Trilean::from_bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conjunction_truth_table() {
        assert_eq!(Trilean::True.and(Trilean::True), Trilean::True);
        assert_eq!(Trilean::True.and(Trilean::Unknown), Trilean::Unknown);
        assert_eq!(Trilean::False.and(Trilean::Unknown), Trilean::False);
        assert_eq!(Trilean::Unknown.and(Trilean::Unknown), Trilean::Unknown);
    }

    #[test]
    fn disjunction_truth_table() {
        assert_eq!(Trilean::False.or(Trilean::False), Trilean::False);
        assert_eq!(Trilean::True.or(Trilean::Unknown), Trilean::True);
        assert_eq!(Trilean::False.or(Trilean::Unknown), Trilean::Unknown);
    }

    #[test]
    fn negation_keeps_unknown() {
        assert_eq!(Trilean::Unknown.negate(), Trilean::Unknown);
        assert_eq!(Trilean::True.negate(), Trilean::False);
    }
}
