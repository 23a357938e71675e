//! Per-name running statistics and the merge of worker-local maps.

use ahash::AHashMap;

use crate::number;

/// Running min/max/sum/count for one name, all in whole tenths.
///
/// Integer tenths keep `sum` exact, so merging worker maps in any order gives
/// the same result as folding every record on one thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub min: i32,
    pub max: i32,
    pub sum: i64,
    pub count: u64,
}

impl Stat {
    pub fn new(tenths: i32) -> Self {
        Self {
            min: tenths,
            max: tenths,
            sum: tenths as i64,
            count: 1,
        }
    }

    pub fn record(&mut self, tenths: i32) {
        self.min = self.min.min(tenths);
        self.max = self.max.max(tenths);
        self.sum += tenths as i64;
        self.count += 1;
    }

    pub fn merge(&mut self, other: &Stat) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Mean in tenths, rounded half away from zero.
    pub fn mean_tenths(&self) -> i64 {
        let half_up = (2 * self.sum.unsigned_abs() + self.count) / (2 * self.count);
        if self.sum < 0 {
            -(half_up as i64)
        } else {
            half_up as i64
        }
    }

    pub fn min_value(&self) -> f64 {
        number::to_f64(self.min as i64)
    }

    pub fn max_value(&self) -> f64 {
        number::to_f64(self.max as i64)
    }

    pub fn mean(&self) -> f64 {
        self.sum as f64 / 10.0 / self.count as f64
    }
}

/// Map from raw name bytes to their [`Stat`]. One per worker, never shared.
#[derive(Debug, Default, Clone)]
pub struct Aggregator {
    stats: AHashMap<Box<[u8]>, Stat>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one measurement in. The name is only copied on first sight.
    pub fn record(&mut self, name: &[u8], tenths: i32) {
        match self.stats.get_mut(name) {
            Some(stat) => stat.record(tenths),
            None => {
                self.stats.insert(name.into(), Stat::new(tenths));
            }
        }
    }

    /// Takes over `other`, combining stats for names both have seen.
    pub fn merge(&mut self, other: Aggregator) {
        if self.stats.is_empty() {
            self.stats = other.stats;
            return;
        }
        for (name, stat) in other.stats {
            self.stats
                .entry(name)
                .and_modify(|existing| existing.merge(&stat))
                .or_insert(stat);
        }
    }

    pub fn get(&self, name: &[u8]) -> Option<&Stat> {
        self.stats.get(name)
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn into_entries(self) -> Vec<(Box<[u8]>, Stat)> {
        self.stats.into_iter().collect()
    }
}

/// Single-threaded fold of every worker map into one.
pub fn merge_all<I>(maps: I) -> Aggregator
where
    I: IntoIterator<Item = Aggregator>,
{
    maps.into_iter().fold(Aggregator::new(), |mut acc, map| {
        acc.merge(map);
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(values: &[i32]) -> Aggregator {
        let mut agg = Aggregator::new();
        for &v in values {
            agg.record(b"A", v);
        }
        agg
    }

    #[test]
    fn repeated_name_updates_in_place() {
        let mut agg = Aggregator::new();
        for v in [100, 120, 200] {
            agg.record(b"Paris", v);
        }
        let stat = agg.get(b"Paris").unwrap();
        assert_eq!(stat.min_value(), 10.0);
        assert_eq!(stat.max_value(), 20.0);
        assert_eq!(stat.count, 3);
        assert_eq!(stat.mean(), 14.0);
        assert_eq!(stat.mean_tenths(), 140);
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn merge_tolerates_disjoint_names() {
        let mut a = Aggregator::new();
        a.record(b"Oslo", -34);
        a.record(b"Paris", 100);
        let mut b = Aggregator::new();
        b.record(b"Paris", 200);
        b.record(b"Rome", 255);
        let c = Aggregator::new();

        let merged = merge_all([a, b, c]);
        assert_eq!(merged.len(), 3);
        assert_eq!(*merged.get(b"Oslo").unwrap(), Stat::new(-34));
        assert_eq!(*merged.get(b"Rome").unwrap(), Stat::new(255));
        let paris = merged.get(b"Paris").unwrap();
        assert_eq!((paris.min, paris.max, paris.sum, paris.count), (100, 200, 300, 2));
    }

    #[test]
    fn merge_order_does_not_matter() {
        let left = merge_all([build(&[15, -20]), build(&[75]), build(&[0, 35])]);
        let right = merge_all([build(&[0, 35]), build(&[75]), build(&[15, -20])]);
        assert_eq!(left.get(b"A"), right.get(b"A"));
    }

    #[test]
    fn partitioned_sums_match_serial_fold() {
        // 24.5, 56.2, 57.2, -99.5, 42.6, -8.7: the mean is exactly 12.05.
        let values = [245, 562, 572, -995, 426, -87];
        let serial = build(&values);
        for split in 0..=values.len() {
            let (left, right) = values.split_at(split);
            let merged = merge_all([build(left), build(right)]);
            assert_eq!(merged.get(b"A"), serial.get(b"A"), "split at {split}");
        }
        let reversed: Vec<i32> = values.iter().rev().copied().collect();
        assert_eq!(build(&reversed).get(b"A"), serial.get(b"A"));
        assert_eq!(serial.get(b"A").unwrap().mean_tenths(), 121);
    }

    #[test]
    fn mean_rounds_half_away_from_zero() {
        assert_eq!(build(&[0, 5]).get(b"A").unwrap().mean_tenths(), 3);
        assert_eq!(build(&[0, -5]).get(b"A").unwrap().mean_tenths(), -3);
        assert_eq!(build(&[-1, 0, 0]).get(b"A").unwrap().mean_tenths(), 0);
        assert_eq!(build(&[1, 0, 0]).get(b"A").unwrap().mean_tenths(), 0);
        assert_eq!(build(&[-999, 999]).get(b"A").unwrap().mean_tenths(), 0);
        assert_eq!(build(&[10, 11]).get(b"A").unwrap().mean_tenths(), 11);
    }

    #[test]
    fn empty_merge_is_empty() {
        assert!(merge_all(Vec::new()).is_empty());
    }
}
