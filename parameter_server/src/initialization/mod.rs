mod constant;
mod error;
mod param_gen;
mod policy;
mod random;

pub use constant::ConstParamGen;
pub use error::{InitErr, RandErr, Result};
pub use param_gen::ParamGen;
pub use policy::InitPolicy;
pub use random::RandParamGen;
