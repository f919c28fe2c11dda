use std::fmt;

/// One end of a [`Range`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound<T> {
    Included(T),
    Excluded(T),
    Unbounded,
}

/// Interval over a totally ordered type. May be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range<T> {
    pub lower: Bound<T>,
    pub upper: Bound<T>,
}

impl<T: Ord + Clone> Range<T> {
    pub fn all() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// `[from, to]`
    pub fn between(from: T, to: T) -> Self {
        Self {
            lower: Bound::Included(from),
            upper: Bound::Included(to),
        }
    }

    /// `[from, to)`
    pub fn half_open(from: T, to: T) -> Self {
        Self {
            lower: Bound::Included(from),
            upper: Bound::Excluded(to),
        }
    }

    pub fn at_least(from: T) -> Self {
        Self {
            lower: Bound::Included(from),
            upper: Bound::Unbounded,
        }
    }

    pub fn at_most(to: T) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Included(to),
        }
    }

    pub fn is(value: T) -> Self {
        Self::between(value.clone(), value)
    }

    pub fn contains(&self, value: &T) -> bool {
        let above = match &self.lower {
            Bound::Included(lower) => value >= lower,
            Bound::Excluded(lower) => value > lower,
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(upper) => value <= upper,
            Bound::Excluded(upper) => value < upper,
            Bound::Unbounded => true,
        };
        above && below
    }

    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Included(l), Bound::Included(u)) => l > u,
            (Bound::Included(l), Bound::Excluded(u))
            | (Bound::Excluded(l), Bound::Included(u))
            | (Bound::Excluded(l), Bound::Excluded(u)) => l >= u,
            _ => false,
        }
    }

    /// Tightest range contained in both.
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            lower: tighter_lower(&self.lower, &other.lower),
            upper: tighter_upper(&self.upper, &other.upper),
        }
    }
}

fn tighter_lower<T: Ord + Clone>(a: &Bound<T>, b: &Bound<T>) -> Bound<T> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Included(x), Bound::Included(y)) => Bound::Included(x.max(y).clone()),
        (Bound::Excluded(x), Bound::Excluded(y)) => Bound::Excluded(x.max(y).clone()),
        (Bound::Included(i), Bound::Excluded(e)) | (Bound::Excluded(e), Bound::Included(i)) => {
            if i > e {
                Bound::Included(i.clone())
            } else {
                Bound::Excluded(e.clone())
            }
        }
    }
}

fn tighter_upper<T: Ord + Clone>(a: &Bound<T>, b: &Bound<T>) -> Bound<T> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Included(x), Bound::Included(y)) => Bound::Included(x.min(y).clone()),
        (Bound::Excluded(x), Bound::Excluded(y)) => Bound::Excluded(x.min(y).clone()),
        (Bound::Included(i), Bound::Excluded(e)) | (Bound::Excluded(e), Bound::Included(i)) => {
            if i < e {
                Bound::Included(i.clone())
            } else {
                Bound::Excluded(e.clone())
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for Range<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lower {
            Bound::Included(v) => write!(f, "[{}", v)?,
            Bound::Excluded(v) => write!(f, "({}", v)?,
            Bound::Unbounded => f.write_str("(-inf")?,
        }
        match &self.upper {
            Bound::Included(v) => write!(f, ", {}]", v),
            Bound::Excluded(v) => write!(f, ", {})", v),
            Bound::Unbounded => f.write_str(", +inf)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_keeps_tightest_bounds() {
        let a = Range::half_open(8, 16);
        let b = Range::half_open(8, 11);
        let both = a.intersect(&b);
        assert_eq!(both, Range::half_open(8, 11));
        assert!(both.contains(&9));
        assert!(!both.contains(&11));
    }

    #[test]
    fn mixed_bounds_prefer_exclusive_on_ties() {
        let r = Range::between(1, 5).intersect(&Range::half_open(0, 5));
        assert!(!r.contains(&5));
        assert!(r.contains(&1));
    }

    #[test]
    fn disjoint_ranges_are_empty() {
        let r = Range::at_least(17).intersect(&Range::at_most(8));
        assert!(r.is_empty());
        assert!(!r.contains(&8));
        assert!(!r.contains(&17));
        assert!(Range::<u32>::all().contains(&0));
    }
}
