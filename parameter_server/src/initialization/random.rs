use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::{ParamGen, Result};

/// A parameter generator that follows a certain probabilistic distribution.
pub struct RandParamGen<R: Rng, D: Distribution<f32>> {
    rng: R,
    distribution: D,
}

impl<R: Rng, D: Distribution<f32>> RandParamGen<R, D> {
    /// Creates a new `RandParamGen` parameter generator.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `distribution` - The distribution to sample the random numbers from.
    pub fn new(rng: R, distribution: D) -> Self {
        Self { rng, distribution }
    }
}

impl<R: Rng> RandParamGen<R, Uniform<f32>> {
    /// Creates a new `RandParamGen` parameter generator with a uniform distribution.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `low` - The inclusive lower limit.
    /// * `high` - The exclusive upper limit.
    ///
    /// # Returns
    /// An error if the range is invalid (low >= high or not finite).
    pub fn uniform(rng: R, low: f32, high: f32) -> Result<Self> {
        Ok(Self::new(rng, Uniform::new(low, high)?))
    }

    /// Creates a new `RandParamGen` parameter generator with an inclusive uniform distribution.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `low` - The inclusive lower limit.
    /// * `high` - The inclusive upper limit.
    ///
    /// # Returns
    /// An error if the range is invalid (low > high or not finite).
    pub fn uniform_inclusive(rng: R, low: f32, high: f32) -> Result<Self> {
        Ok(Self::new(rng, Uniform::new_inclusive(low, high)?))
    }

    /// Creates a new `RandParamGen` parameter generator using Xavier uniform initialization.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `fan_in` - The number of input units in the weight tensor.
    /// * `fan_out` - The number of output units in the weight tensor.
    ///
    /// # Returns
    /// An error if the calculated range is invalid.
    pub fn xavier_uniform(rng: R, fan_in: usize, fan_out: usize) -> Result<Self> {
        let range = (6. / (fan_in + fan_out) as f32).sqrt();
        Self::uniform(rng, -range, range)
    }

    /// Creates a new `RandParamGen` parameter generator using LeCun uniform initialization.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `fan_in` - The number of input units in the weight tensor.
    ///
    /// # Returns
    /// An error if the calculated range is invalid.
    pub fn lecun_uniform(rng: R, fan_in: usize) -> Result<Self> {
        let range = (3. / fan_in as f32).sqrt();
        Self::uniform(rng, -range, range)
    }
}

impl<R: Rng> RandParamGen<R, Normal<f32>> {
    /// Creates a new `RandParamGen` parameter generator with a normal distribution.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `mean` - The mean of the distribution.
    /// * `std_dev` - The standard deviation of the distribution.
    ///
    /// # Returns
    /// An error if `std_dev` is not finite (Nan or infinite).
    pub fn normal(rng: R, mean: f32, std_dev: f32) -> Result<Self> {
        Ok(Self::new(rng, Normal::new(mean, std_dev)?))
    }

    /// Creates a new `RandParamGen` parameter generator using Kaiming normal initialization.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `fan_in` - The number of input units in the weight tensor.
    ///
    /// # Returns
    /// An error if the calculated standard deviation is not finite (Nan or infinite).
    pub fn kaiming(rng: R, fan_in: usize) -> Result<Self> {
        let std_dev = (2. / fan_in as f32).sqrt();
        Self::normal(rng, 0., std_dev)
    }

    /// Creates a new `RandParamGen` parameter generator using Xavier normal initialization.
    pub fn xavier(rng: R, fan_in: usize, fan_out: usize) -> Result<Self> {
        Self::kaiming(rng, fan_in + fan_out)
    }

    /// Creates a new `RandParamGen` parameter generator using LeCun normal initialization.
    pub fn lecun(rng: R, fan_in: usize) -> Result<Self> {
        let std_dev = (1. / fan_in as f32).sqrt();
        Self::normal(rng, 0., std_dev)
    }
}

impl<R: Rng, D: Distribution<f32>> ParamGen for RandParamGen<R, D> {
    fn fill(&mut self, out: &mut [f32]) {
        let Self { rng, distribution } = self;
        out.iter_mut().for_each(|p| *p = distribution.sample(&mut *rng));
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn same_seed_same_values() {
        let mut a = RandParamGen::normal(seeded_rng(), 0., 1.).unwrap();
        let mut b = RandParamGen::normal(seeded_rng(), 0., 1.).unwrap();

        let (mut out_a, mut out_b) = ([0.; 16], [0.; 16]);
        a.fill(&mut out_a);
        b.fill(&mut out_b);

        assert_eq!(out_a, out_b);
    }

    #[test]
    fn uniform_stays_in_range() {
        let mut param_gen = RandParamGen::xavier_uniform(seeded_rng(), 4, 2).unwrap();
        let range = 1.;

        let mut out = [0.; 64];
        param_gen.fill(&mut out);
        assert!(out.iter().all(|p| (-range..range).contains(p)));
    }

    #[test]
    fn rejects_invalid_ranges() {
        assert!(RandParamGen::uniform(seeded_rng(), 1., -1.).is_err());
        assert!(RandParamGen::kaiming(seeded_rng(), 0).is_err());
        assert!(RandParamGen::normal(seeded_rng(), 0., f32::NAN).is_err());
    }
}
