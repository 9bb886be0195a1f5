use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` shares a value of type `T` between the render thread and the generation
/// workers. Cloning hands out another handle to the same value.
///
/// # Type Parameters
/// - `T`: The type of the contained resource, must be `Send + Sync`
///
/// # Examples
///
/// ```rust,ignore
/// let camera_view = MtResource::new(CameraView::default());
/// let worker_handle = camera_view.clone();
///
/// std::thread::spawn(move || {
///     let view = *worker_handle.get();
///     // generate around `view`
/// });
///
/// camera_view.get_mut().position.x += 1.0;
/// ```
///
/// # Locking
/// - Readers (`get()`) run concurrently
/// - Writers (`get_mut()`) are exclusive and block readers
/// - A poisoned lock is recovered, the guarded value is handed out as-is
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    ///
    /// # Arguments
    /// * `resource` - The value to be stored in the resource
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read guard over the contained value.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a write guard over the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync + Copy> MtResource<T> {
    /// Copies the current value out, releasing the lock immediately.
    pub fn snapshot(&self) -> T {
        *self.get()
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}
