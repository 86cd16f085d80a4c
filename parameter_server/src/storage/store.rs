use std::{collections::HashMap, sync::Arc};

use comms::Key;
use log::debug;
use parking_lot::{Mutex, RwLock};

use super::{Slot, StoreErr};
use crate::{initialization::InitPolicy, optimization::UpdatePolicy};

type Slots = RwLock<HashMap<String, Arc<Mutex<Slot>>>>;

/// An addressable map from parameter key to its value.
///
/// Keys are materialized on first touch through the `InitPolicy`, exactly once, and
/// live until the store is dropped. Every key is guarded by its own lock, so requests
/// for distinct keys never wait on each other while updates to the same key are
/// serialized.
#[derive(Clone)]
pub struct ParameterStore {
    slots: Arc<Slots>,
    init: Arc<InitPolicy>,
    update: UpdatePolicy,
}

impl ParameterStore {
    /// Creates a new empty `ParameterStore`.
    ///
    /// # Arguments
    /// * `init` - The initialization hook.
    /// * `update` - The update policy.
    ///
    /// # Returns
    /// A new `ParameterStore` instance.
    pub fn new(init: InitPolicy, update: UpdatePolicy) -> Self {
        Self {
            slots: Arc::default(),
            init: Arc::new(init),
            update,
        }
    }

    /// The amount of materialized keys.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Copies the current value of `name` into `out`, materializing it with `out.len()`
    /// elements on first touch.
    ///
    /// # Arguments
    /// * `name` - The key of the parameter.
    /// * `out` - A mutable slice where the parameter will be copied.
    ///
    /// # Returns
    /// A `StoreErr` if the key is invalid or its size doesn't match `out`.
    pub fn pull(&self, name: &str, out: &mut [f32]) -> Result<(), StoreErr> {
        let slot = self.slot(name, out.len())?;
        let slot = slot.lock();
        slot.read_into(out)
    }

    /// Applies `grad` to `name` and copies the updated value into `out`.
    ///
    /// The update and the copy happen under the same lock, so `out` holds exactly
    /// the value this push produced.
    ///
    /// # Arguments
    /// * `name` - The key of the parameter.
    /// * `grad` - The pushed gradient or delta.
    /// * `out` - A mutable slice where the updated parameter will be copied.
    ///
    /// # Returns
    /// A `StoreErr` if the key is invalid or any size doesn't match.
    pub fn push(&self, name: &str, grad: &[f32], out: &mut [f32]) -> Result<(), StoreErr> {
        let slot = self.slot(name, grad.len())?;
        let mut slot = slot.lock();
        slot.update_into(grad, out)
    }

    /// Gets the slot of `name`, materializing it with `len` elements if absent.
    fn slot(&self, name: &str, len: usize) -> Result<Arc<Mutex<Slot>>, StoreErr> {
        if let Some(slot) = self.slots.read().get(name) {
            return Ok(Arc::clone(slot));
        }

        let key = Key::parse(name)?;

        // Values depend only on the key, so racing requests generate the same ones.
        let mut params = vec![0.; len].into_boxed_slice();
        self.init
            .init_layer(&key, &mut params)
            .map_err(|source| StoreErr::Init {
                key: name.to_string(),
                source,
            })?;

        let mut slots = self.slots.write();

        // Another request could have materialized it while generating.
        if let Some(slot) = slots.get(name) {
            return Ok(Arc::clone(slot));
        }

        debug!(key = name, len = len; "materialized parameter");

        let optimizer = self.update.resolve(&key, len);
        let slot = Arc::new(Mutex::new(Slot::new(key, params, optimizer)));
        slots.insert(name.to_string(), Arc::clone(&slot));
        Ok(slot)
    }
}
