use ndarray::ArrayD;

use crate::{
    backend::Backend,
    error::{Result, WorkerErr},
};

/// A pending range of the reduction tree.
enum Frame {
    /// The range still has to be split in halves.
    Split { lo: usize, hi: usize },
    /// Both halves are reduced, their results live at `lo` and `mid`.
    Merge { lo: usize, mid: usize },
}

/// Combines the gradients of several local devices into one, with a pairwise tree.
///
/// The tree is walked with an explicit stack of index ranges over the input, every
/// partial sum is written in place into the first slot of its range, so no sub lists
/// are allocated.
pub struct Reducer<'a> {
    backend: &'a dyn Backend,
}

impl<'a> Reducer<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Reduces `grads` into their elementwise sum.
    ///
    /// # Args
    /// * `grads` - The gradients of one parameter, one per device, all of the same shape.
    ///
    /// # Errors
    /// Returns `WorkerErr::EmptyReduction` if `grads` is empty, or the backend's error.
    pub fn reduce(&self, mut grads: Vec<ArrayD<f32>>) -> Result<ArrayD<f32>> {
        if grads.is_empty() {
            return Err(WorkerErr::EmptyReduction);
        }

        let mut stack = vec![Frame::Split {
            lo: 0,
            hi: grads.len(),
        }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Split { lo, hi } if hi - lo > 1 => {
                    let mid = lo + (hi - lo) / 2;
                    stack.push(Frame::Merge { lo, mid });
                    stack.push(Frame::Split { lo: mid, hi });
                    stack.push(Frame::Split { lo, hi: mid });
                }
                Frame::Split { .. } => {}
                Frame::Merge { lo, mid } => {
                    let (left, right) = grads.split_at_mut(mid);
                    self.backend.add_assign(&mut left[lo], &right[0])?;
                }
            }
        }

        grads.truncate(1);
        grads.pop().ok_or(WorkerErr::EmptyReduction)
    }
}
