use super::FloatType;

/// Range of ray parameters `[min, max]`.
///
/// Any interval with `min > max` is empty. Operations that produce an empty
/// result always return the canonical [`Interval::EMPTY`], so empty intervals
/// compare equal to each other.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Interval {
    pub min: FloatType,
    pub max: FloatType,
}

impl Interval {
    pub const EMPTY: Interval = Interval {
        min: FloatType::INFINITY,
        max: FloatType::NEG_INFINITY,
    };

    pub const UNIVERSE: Interval = Interval {
        min: FloatType::NEG_INFINITY,
        max: FloatType::INFINITY,
    };

    /// Creates an interval from two bounds in any order.
    /// NaN bounds produce an empty interval.
    pub fn new(a: FloatType, b: FloatType) -> Interval {
        if a.is_nan() || b.is_nan() {
            Interval::EMPTY
        } else if a <= b {
            Interval { min: a, max: b }
        } else {
            Interval { min: b, max: a }
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.min <= self.max)
    }

    /// Intersection of two intervals.
    pub fn and(&self, other: &Interval) -> Interval {
        let ret = Interval {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        };
        if ret.is_empty() || self.is_empty() || other.is_empty() {
            Interval::EMPTY
        } else {
            ret
        }
    }

    /// Smallest interval containing both inputs.
    pub fn hull(&self, other: &Interval) -> Interval {
        if self.is_empty() {
            *other
        } else if other.is_empty() {
            *self
        } else {
            Interval {
                min: self.min.min(other.min),
                max: self.max.max(other.max),
            }
        }
    }

    pub fn contains(&self, x: FloatType) -> bool {
        self.min <= x && x <= self.max
    }

    /// The closest bound strictly in front of the ray origin, if any.
    pub fn frontmost_positive(&self) -> Option<FloatType> {
        if self.is_empty() {
            None
        } else if self.min > 0.0 {
            Some(self.min)
        } else if self.max > 0.0 {
            Some(self.max)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::test::simple_float;
    use assert2::assert;
    use proptest::prelude::*;
    use test_case::test_case;
    use test_strategy::proptest;

    fn interval() -> impl Strategy<Value = Interval> {
        prop_oneof![
            1 => Just(Interval::EMPTY),
            8 => (simple_float(), simple_float()).prop_map(|(a, b)| Interval::new(a, b)),
        ]
    }

    type Bounds = Option<(FloatType, FloatType)>;

    fn from_bounds(bounds: Bounds) -> Interval {
        bounds.map_or(Interval::EMPTY, |(min, max)| Interval::new(min, max))
    }

    #[test_case(None, None, None ; "both_empty")]
    #[test_case(Some((0.0, 0.0)), Some((0.0, 0.0)), Some((0.0, 0.0)) ; "zero_width")]
    #[test_case(Some((1.0, 2.0)), Some((1.0, 2.0)), Some((1.0, 2.0)) ; "identical")]
    #[test_case(Some((1.0, 2.0)), Some((3.0, 4.0)), None ; "disjoint")]
    #[test_case(Some((1.0, 3.0)), Some((2.0, 4.0)), Some((2.0, 3.0)) ; "overlapping")]
    #[test_case(Some((1.0, 4.0)), Some((2.0, 3.0)), Some((2.0, 3.0)) ; "nested")]
    fn and_cases(a: Bounds, b: Bounds, expected: Bounds) {
        let (a, b, expected) = (from_bounds(a), from_bounds(b), from_bounds(expected));
        assert!(a.and(&b) == expected);
        assert!(b.and(&a) == expected);
    }

    #[test]
    fn nan_bounds_are_empty() {
        assert!(Interval::new(FloatType::NAN, 1.0).is_empty());
        let open_ended = Interval {
            min: 0.0,
            max: FloatType::NAN,
        };
        assert!(open_ended.is_empty());
        assert!(open_ended.and(&Interval::UNIVERSE) == Interval::EMPTY);
    }

    #[test]
    fn frontmost_positive_picks_entry_then_exit() {
        assert!(Interval::new(1.0, 3.0).frontmost_positive() == Some(1.0));
        assert!(Interval::new(-1.0, 3.0).frontmost_positive() == Some(3.0));
        assert!(Interval::new(-3.0, -1.0).frontmost_positive() == None);
        assert!(Interval::EMPTY.frontmost_positive() == None);
    }

    #[proptest]
    fn and_is_commutative(
        #[strategy(interval())] a: Interval,
        #[strategy(interval())] b: Interval,
    ) {
        prop_assert_eq!(a.and(&b), b.and(&a));
    }

    #[proptest]
    fn and_with_empty_is_empty(#[strategy(interval())] x: Interval) {
        prop_assert_eq!(Interval::EMPTY.and(&x), Interval::EMPTY);
        prop_assert_eq!(x.and(&Interval::EMPTY), Interval::EMPTY);
    }

    #[proptest]
    fn and_is_contained_in_hull(
        #[strategy(interval())] a: Interval,
        #[strategy(interval())] b: Interval,
    ) {
        let both = a.and(&b);
        let hull = a.hull(&b);
        prop_assert!(both.is_empty() || (hull.contains(both.min) && hull.contains(both.max)));
    }
}
