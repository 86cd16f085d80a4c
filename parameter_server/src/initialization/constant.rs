use super::ParamGen;

/// A parameter generator that always generates the same value.
pub struct ConstParamGen {
    value: f32,
}

impl ConstParamGen {
    /// Creates a new `ConstParamGen` parameter generator.
    ///
    /// # Arguments
    /// * `value` - The value to always generate.
    ///
    /// # Returns
    /// A new `ConstParamGen` instance.
    pub fn new(value: f32) -> Self {
        Self { value }
    }

    /// The generator used for momentum accumulators.
    pub fn zeros() -> Self {
        Self::new(0.)
    }
}

impl ParamGen for ConstParamGen {
    fn fill(&mut self, out: &mut [f32]) {
        out.fill(self.value);
    }
}
