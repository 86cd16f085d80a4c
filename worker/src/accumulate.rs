use std::{collections::HashMap, num::NonZeroUsize};

use comms::Key;
use ndarray::ArrayD;

use crate::error::{Result, WorkerErr};

/// Whether a bulk cycle ends at `step`.
pub fn should_flush(step: usize, cycle: NonZeroUsize) -> bool {
    step % cycle == 0
}

/// Sums gradients locally over several steps before they are pushed.
#[derive(Debug, Default)]
pub struct BulkAccumulator {
    sums: HashMap<Key, ArrayD<f32>>,
}

impl BulkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `grad` into the running sum of `key`, without any io.
    ///
    /// # Errors
    /// Returns `WorkerErr::ShapeMismatch` if `grad` doesn't match the running sum.
    pub fn accumulate(&mut self, key: &Key, grad: &ArrayD<f32>) -> Result<()> {
        match self.sums.get_mut(key) {
            Some(sum) if sum.shape() != grad.shape() => Err(WorkerErr::ShapeMismatch {
                key: key.to_string(),
                expected: sum.shape().to_vec(),
                got: grad.shape().to_vec(),
            }),
            Some(sum) => {
                *sum += grad;
                Ok(())
            }
            None => {
                self.sums.insert(key.clone(), grad.clone());
                Ok(())
            }
        }
    }

    /// Takes the accumulated sum of `key` and resets it to zero.
    ///
    /// # Returns
    /// The sum or `None` if nothing was accumulated for `key`.
    pub fn flush(&mut self, key: &Key) -> Option<ArrayD<f32>> {
        let sum = self.sums.get_mut(key)?;
        let zeros = ArrayD::zeros(sum.raw_dim());
        Some(std::mem::replace(sum, zeros))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::IxDyn;

    use super::*;

    fn cycle(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn tensor(values: &[f32]) -> ArrayD<f32> {
        ArrayD::from_shape_vec(IxDyn(&[values.len()]), values.to_vec()).unwrap()
    }

    #[test]
    fn flushes_every_cycle() {
        let flushes: Vec<_> = (1..=9).filter(|&s| should_flush(s, cycle(3))).collect();
        assert_eq!(flushes, [3, 6, 9]);
        assert!((1..=4).all(|s| should_flush(s, cycle(1))));
    }

    #[test]
    fn flush_returns_the_cycle_sum() {
        let key = Key::parse("w_0").unwrap();
        let mut acc = BulkAccumulator::new();

        for grad in [tensor(&[1., 2.]), tensor(&[0.5, -1.]), tensor(&[3., 0.])] {
            acc.accumulate(&key, &grad).unwrap();
        }

        assert_eq!(acc.flush(&key).unwrap(), tensor(&[4.5, 1.]));

        acc.accumulate(&key, &tensor(&[1., 1.])).unwrap();
        assert_eq!(acc.flush(&key).unwrap(), tensor(&[1., 1.]));
        assert_eq!(acc.flush(&key).unwrap(), tensor(&[0., 0.]));
    }

    #[test]
    fn untouched_keys_have_nothing_to_flush() {
        let mut acc = BulkAccumulator::new();
        assert!(acc.flush(&Key::parse("b_0").unwrap()).is_none());
    }

    #[test]
    fn rejects_shape_changes() {
        let key = Key::parse("w_1").unwrap();
        let mut acc = BulkAccumulator::new();
        acc.accumulate(&key, &tensor(&[1., 2.])).unwrap();

        let err = acc.accumulate(&key, &tensor(&[1.])).unwrap_err();
        assert!(matches!(err, WorkerErr::ShapeMismatch { ref key, .. } if key == "w_1"));
    }
}
