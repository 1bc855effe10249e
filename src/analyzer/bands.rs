// Ordered threshold tables mapping a scalar to a label
use crate::model::BandError;

/// Contiguous bands: `value < bounds[i].0` selects `bounds[i].1`, anything at or
/// above the last bound selects `extreme`. Inclusive tables use `value <= bound`,
/// so a tie stays in the lower band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandTable<L> {
    bounds: Vec<(f64, L)>,
    extreme: L,
    inclusive: bool,
}

impl<L> BandTable<L> {
    /// Bounds must be non-decreasing and not NaN. Equal bounds leave an empty band.
    pub fn new(bounds: Vec<(f64, L)>, extreme: L) -> Result<Self, BandError> {
        for (index, (bound, _)) in bounds.iter().enumerate() {
            if bound.is_nan() {
                return Err(BandError::NanBound(index));
            }
            if index > 0 {
                let previous = bounds[index - 1].0;
                if *bound < previous {
                    return Err(BandError::Decreasing {
                        index,
                        bound: *bound,
                        previous,
                    });
                }
            }
        }
        Ok(Self {
            bounds,
            extreme,
            inclusive: false,
        })
    }

    /// Same validation as [`BandTable::new`], with `value <= bound` selecting a band.
    pub fn new_inclusive(bounds: Vec<(f64, L)>, extreme: L) -> Result<Self, BandError> {
        Ok(Self {
            inclusive: true,
            ..Self::new(bounds, extreme)?
        })
    }

    fn within(&self, value: f64, bound: f64) -> bool {
        if self.inclusive { value <= bound } else { value < bound }
    }

    pub fn classify(&self, value: f64) -> &L {
        self.bounds
            .iter()
            .find(|(bound, _)| self.within(value, *bound))
            .map(|(_, label)| label)
            .unwrap_or(&self.extreme)
    }
}

impl<L: Clone> BandTable<L> {
    /// Builds a table from literal cutoffs that are known to be ordered.
    pub fn from_static(bounds: &[(f64, L)], extreme: L) -> Result<Self, BandError> {
        Self::new(bounds.to_vec(), extreme)
    }

    /// Literal cutoffs where a value equal to a bound belongs to the band below it.
    pub fn from_static_inclusive(bounds: &[(f64, L)], extreme: L) -> Result<Self, BandError> {
        Self::new_inclusive(bounds.to_vec(), extreme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phases() -> BandTable<&'static str> {
        BandTable::from_static(
            &[
                (20.0, "No Bubble"),
                (35.0, "Early Formation"),
                (50.0, "Middle Stage"),
                (65.0, "Late-Middle Stage"),
                (80.0, "Late Stage"),
                (90.0, "Peak Formation"),
            ],
            "Imminent Burst Risk",
        )
        .unwrap()
    }

    #[test]
    fn bounds_are_exclusive_upper_limits() {
        let table = phases();
        assert_eq!(*table.classify(19.999), "No Bubble");
        assert_eq!(*table.classify(20.0), "Early Formation");
        assert_eq!(*table.classify(34.0), "Early Formation");
        assert_eq!(*table.classify(35.0), "Middle Stage");
        assert_eq!(*table.classify(90.0), "Imminent Burst Risk");
        assert_eq!(*table.classify(-1e9), "No Bubble");
        assert_eq!(*table.classify(f64::INFINITY), "Imminent Burst Risk");
    }

    #[test]
    fn bands_never_step_backwards() {
        let table = phases();
        let order = [
            "No Bubble",
            "Early Formation",
            "Middle Stage",
            "Late-Middle Stage",
            "Late Stage",
            "Peak Formation",
            "Imminent Burst Risk",
        ];
        let rank = |x: f64| order.iter().position(|l| l == table.classify(x)).unwrap();
        let mut previous = 0;
        for step in -50..=1500 {
            let current = rank(step as f64 / 10.0);
            assert!(current >= previous, "x = {}", step as f64 / 10.0);
            previous = current;
        }
        assert_eq!(previous, order.len() - 1);
    }

    #[test]
    fn equal_bounds_leave_empty_band() {
        let table = BandTable::new(vec![(0.0, "a"), (0.0, "b"), (5.0, "c")], "d").unwrap();
        assert_eq!(*table.classify(0.0), "c");
        assert_eq!(*table.classify(-0.1), "a");
    }

    #[test]
    fn inclusive_bounds_keep_ties_below() {
        let table = BandTable::from_static_inclusive(&[(0.4, "weak"), (0.7, "moderate")], "strong").unwrap();
        assert_eq!(*table.classify(0.4), "weak");
        assert_eq!(*table.classify(0.41), "moderate");
        assert_eq!(*table.classify(0.7), "moderate");
        assert_eq!(*table.classify(0.71), "strong");
    }

    #[test]
    fn rejects_bad_tables() {
        assert_eq!(
            BandTable::new(vec![(1.0, 'a'), (f64::NAN, 'b')], 'c'),
            Err(BandError::NanBound(1))
        );
        assert!(matches!(
            BandTable::new(vec![(5.0, 'a'), (1.0, 'b')], 'c'),
            Err(BandError::Decreasing { index: 1, .. })
        ));
        assert_eq!(
            BandTable::new_inclusive(vec![(f64::NAN, 'a')], 'b'),
            Err(BandError::NanBound(0))
        );
    }
}
