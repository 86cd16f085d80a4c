/// A `ParamGen` generates values for the initial state of a parameter.
pub trait ParamGen {
    /// Should fill every element of `out`.
    ///
    /// # Arguments
    /// * `out` - The buffer of the parameter being materialized.
    fn fill(&mut self, out: &mut [f32]);
}

impl<P: ParamGen + ?Sized> ParamGen for Box<P> {
    fn fill(&mut self, out: &mut [f32]) {
        (**self).fill(out)
    }
}
