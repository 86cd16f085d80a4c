mod additive;
mod gradient_descent;
mod gradient_descent_with_momentum;
mod momentum;
mod optimizer;
mod policy;

pub use additive::Additive;
pub use gradient_descent::GradientDescent;
pub use gradient_descent_with_momentum::GradientDescentWithMomentum;
pub use momentum::Momentum;
pub use optimizer::Optimizer;
pub use policy::{BoxedOptimizer, UpdatePolicy};
