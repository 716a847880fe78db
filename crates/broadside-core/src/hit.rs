//! Hit-probability tables for weapon variants.
//!
//! A [`HitTable`] is a pluggable policy attached to a weapon at construction.
//! It is consulted by whatever resolves combat outcomes; the module state
//! machines never read it themselves.
//!
//! A table is a list of [`HitBand`]s. A band covers every range strictly
//! below its `below_range` bound that an earlier band did not claim, and holds
//! one or more "1-in-N" dice. If a band carries several dice, one is picked
//! uniformly and then rolled. Ranges no band covers never hit.
//!
//! # Example
//!
//! ```
//! use broadside_core::hit::HitTable;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let table = HitTable::type3_127mm();
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//!
//! // Out of range: never a hit.
//! assert!(!table.roll(25.0, &mut rng));
//! ```

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One range band of a [`HitTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitBand {
    /// Exclusive upper bound of the band, in range units.
    pub below_range: f64,
    /// "1-in-N" dice; one is chosen uniformly per roll.
    pub one_in: Vec<u32>,
}

impl HitBand {
    /// Creates a band with the given dice.
    #[must_use]
    pub fn new(below_range: f64, one_in: Vec<u32>) -> Self {
        Self {
            below_range,
            one_in,
        }
    }

    /// Probability that a roll in this band hits.
    #[must_use]
    pub fn probability(&self) -> f64 {
        if self.one_in.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let dice = self.one_in.len() as f64;
        self.one_in
            .iter()
            .map(|&n| if n == 0 { 0.0 } else { 1.0 / f64::from(n) })
            .sum::<f64>()
            / dice
    }
}

/// Range-banded hit-probability policy.
///
/// Serialized as a plain band list. Deserialized bands go through
/// [`HitTable::new`], so they are sorted whatever order the input used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<HitBand>", into = "Vec<HitBand>")]
pub struct HitTable {
    bands: Vec<HitBand>,
}

impl From<Vec<HitBand>> for HitTable {
    fn from(bands: Vec<HitBand>) -> Self {
        Self::new(bands)
    }
}

impl From<HitTable> for Vec<HitBand> {
    fn from(table: HitTable) -> Self {
        table.bands
    }
}

impl HitTable {
    /// A table that never hits. This is the base weapon's policy.
    #[must_use]
    pub fn never() -> Self {
        Self::default()
    }

    /// Builds a table from bands, sorted by ascending `below_range`.
    #[must_use]
    pub fn new(mut bands: Vec<HitBand>) -> Self {
        bands.sort_by(|a, b| a.below_range.total_cmp(&b.below_range));
        Self { bands }
    }

    /// Type 3 127 mm naval gun: 1-in-6 inside 19 units.
    #[must_use]
    pub fn type3_127mm() -> Self {
        Self::new(vec![HitBand::new(19.0, vec![6])])
    }

    /// 610 mm torpedo: inside 21 units, one of 1-in-16, 1-in-6 or 1-in-13.
    #[must_use]
    pub fn triple_610mm() -> Self {
        Self::new(vec![HitBand::new(21.0, vec![16, 6, 13])])
    }

    /// The band that covers `range`, if any.
    #[must_use]
    pub fn band_for(&self, range: f64) -> Option<&HitBand> {
        if !range.is_finite() || range < 0.0 {
            return None;
        }
        self.bands.iter().find(|band| range < band.below_range)
    }

    /// Returns the bands in ascending range order.
    #[must_use]
    pub fn bands(&self) -> &[HitBand] {
        &self.bands
    }

    /// Hit probability at `range`.
    #[must_use]
    pub fn probability(&self, range: f64) -> f64 {
        self.band_for(range).map_or(0.0, HitBand::probability)
    }

    /// Rolls for a hit at `range` using the supplied random source.
    pub fn roll<R: Rng + ?Sized>(&self, range: f64, rng: &mut R) -> bool {
        let Some(band) = self.band_for(range) else {
            return false;
        };
        match band.one_in.choose(rng) {
            Some(&0) | None => false,
            Some(&n) => rng.gen_range(1..=n) == n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn never_table_never_hits() {
        let table = HitTable::never();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!((0..1000).all(|_| !table.roll(1.0, &mut rng)));
        assert_eq!(table.probability(1.0), 0.0);
    }

    #[test]
    fn out_of_band_never_hits() {
        let table = HitTable::type3_127mm();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert!((0..1000).all(|_| !table.roll(19.0, &mut rng)));
        assert!(table.band_for(-1.0).is_none());
        assert!(table.band_for(f64::NAN).is_none());
    }

    #[test]
    fn gun_band_probability_is_one_in_six() {
        let table = HitTable::type3_127mm();
        assert!((table.probability(10.0) - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn torpedo_band_averages_its_dice() {
        let table = HitTable::triple_610mm();
        let expected = (1.0 / 16.0 + 1.0 / 6.0 + 1.0 / 13.0) / 3.0;
        assert!((table.probability(20.9) - expected).abs() < 1e-12);
        assert_eq!(table.probability(21.0), 0.0);
    }

    #[test]
    fn in_band_rolls_hit_at_roughly_the_table_rate() {
        let table = HitTable::type3_127mm();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let hits = (0..6000).filter(|_| table.roll(5.0, &mut rng)).count();
        // 1000 expected; allow generous slack
        assert!((800..1200).contains(&hits), "hits = {hits}");
    }

    #[test]
    fn bands_are_sorted_on_construction() {
        let table = HitTable::new(vec![
            HitBand::new(30.0, vec![10]),
            HitBand::new(10.0, vec![2]),
        ]);
        assert_eq!(table.bands()[0].below_range, 10.0);
        assert!((table.probability(5.0) - 0.5).abs() < 1e-12);
        assert!((table.probability(15.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn same_seed_same_rolls() {
        let table = HitTable::triple_610mm();
        let mut a = ChaCha8Rng::seed_from_u64(9);
        let mut b = ChaCha8Rng::seed_from_u64(9);
        let rolls_a: Vec<bool> = (0..200).map(|_| table.roll(3.0, &mut a)).collect();
        let rolls_b: Vec<bool> = (0..200).map(|_| table.roll(3.0, &mut b)).collect();
        assert_eq!(rolls_a, rolls_b);
    }

    #[test]
    fn deserialized_bands_are_sorted() {
        let json = r#"[{"below_range":30.0,"one_in":[10]},{"below_range":10.0,"one_in":[2]}]"#;
        let table: HitTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.bands()[0].below_range, 10.0);
        assert!((table.probability(5.0) - 0.5).abs() < 1e-12);
        assert!((table.probability(15.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn serializes_as_band_list() {
        let json = serde_json::to_string(&HitTable::type3_127mm()).unwrap();
        assert_eq!(json, r#"[{"below_range":19.0,"one_in":[6]}]"#);
    }
}
