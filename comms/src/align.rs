/// Primitive number types aligned to at least 4 bytes.
///
/// Receiving into a buffer of these guarantees the frame body can be reinterpreted as `f32`s.
pub trait Align4: bytemuck::Pod {}

impl Align4 for u32 {}
impl Align4 for i32 {}
impl Align4 for u64 {}
impl Align4 for i64 {}
impl Align4 for f32 {}
impl Align4 for f64 {}
