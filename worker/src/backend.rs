use comms::specs::worker::BackendSpec;
use ndarray::ArrayD;

use crate::error::{Result, WorkerErr};

/// The capability of combining tensors on the worker.
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Should add `other` into `acc` elementwise.
    ///
    /// # Args
    /// * `acc` - The tensor holding the partial sum.
    /// * `other` - A tensor of the same shape.
    ///
    /// # Errors
    /// Returns `WorkerErr::IncompatibleShapes` if the shapes differ, or
    /// `WorkerErr::BackendUnavailable` if there is no backend.
    fn add_assign(&self, acc: &mut ArrayD<f32>, other: &ArrayD<f32>) -> Result<()>;
}

/// A backend computing on the host with `ndarray`.
#[derive(Debug, Default)]
pub struct CpuBackend;

impl Backend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn add_assign(&self, acc: &mut ArrayD<f32>, other: &ArrayD<f32>) -> Result<()> {
        if acc.shape() != other.shape() {
            return Err(WorkerErr::IncompatibleShapes {
                expected: acc.shape().to_vec(),
                got: other.shape().to_vec(),
            });
        }

        *acc += other;
        Ok(())
    }
}

/// Stands in for a tensor engine that isn't present, every use fails.
#[derive(Debug, Default)]
pub struct UnavailableBackend;

impl Backend for UnavailableBackend {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn add_assign(&self, _acc: &mut ArrayD<f32>, _other: &ArrayD<f32>) -> Result<()> {
        Err(WorkerErr::BackendUnavailable)
    }
}

/// Selects the backend once at startup.
pub fn select(spec: BackendSpec) -> Box<dyn Backend> {
    match spec {
        BackendSpec::Cpu => Box::new(CpuBackend),
        BackendSpec::Unavailable => Box::new(UnavailableBackend),
    }
}
