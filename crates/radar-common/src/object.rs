//! Shared object runtime.
//!
//! Every radar entity (navigator, projection, parameter, quality field, scan,
//! volume) is handed around as a [`Handle`]. A handle is a reference-counted
//! pointer with interior mutability:
//!
//! - cloning a handle copies the reference (same identity, count + 1)
//! - [`Handle::deep_clone`] runs the type's copy-construct and returns an
//!   independent object
//! - dropping or [`Handle::release`]-ing the last handle destroys the object,
//!   exactly once
//!
//! Reference counts are not atomic. Handles are `!Send` and `!Sync`; an
//! embedding application sharing objects across threads must serialise
//! access itself.

use std::cell::{BorrowError, BorrowMutError, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::RadarResult;
use crate::stats::Instrumentation;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Type descriptor carried by every managed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectType {
    /// Type name, used in statistics and log output.
    pub name: &'static str,
}

impl ObjectType {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

/// A type that can live inside a [`Handle`].
pub trait RadarObject: Sized + 'static {
    /// Descriptor for this type.
    const TYPE: ObjectType;

    /// Copy-construct an independent instance.
    ///
    /// Owned substructure must be duplicated; members that are shared by
    /// reference (navigators, projections) should have their handle cloned
    /// instead.
    fn clone_object(&self) -> Self;
}

/// Process-unique identity of a managed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value of the identity.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ObjectCell<T: RadarObject> {
    id: ObjectId,
    value: RefCell<T>,
    instrumentation: Instrumentation,
}

impl<T: RadarObject> Drop for ObjectCell<T> {
    fn drop(&mut self) {
        tracing::trace!(object = %self.id, type_name = T::TYPE.name, "destroying object");
        self.instrumentation.destroyed(T::TYPE.name);
    }
}

/// Shared, reference-counted handle to a managed object.
pub struct Handle<T: RadarObject> {
    cell: Rc<ObjectCell<T>>,
}

impl<T: RadarObject> Handle<T> {
    /// Wrap a value in a new handle with a reference count of one.
    pub fn new(value: T) -> Self {
        Self::with_instrumentation(value, Instrumentation::none())
    }

    /// Wrap a value and report its lifetime to `instrumentation`.
    pub fn with_instrumentation(value: T, instrumentation: Instrumentation) -> Self {
        let id = ObjectId::next();
        tracing::trace!(object = %id, type_name = T::TYPE.name, "creating object");
        instrumentation.created(T::TYPE.name);
        Self {
            cell: Rc::new(ObjectCell {
                id,
                value: RefCell::new(value),
                instrumentation,
            }),
        }
    }

    /// Run a fallible constructor and wrap its result.
    ///
    /// When the constructor fails nothing is registered and whatever it had
    /// built so far is dropped before the error is returned.
    pub fn try_new<F>(construct: F) -> RadarResult<Self>
    where
        F: FnOnce() -> RadarResult<T>,
    {
        construct().map(Self::new)
    }

    /// Give up this reference.
    ///
    /// The object itself is only destroyed when this was the last reference.
    pub fn release(self) {}

    /// Number of live references to the object.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.cell)
    }

    /// Identity of the object.
    pub fn id(&self) -> ObjectId {
        self.cell.id
    }

    /// Name from the object's type descriptor.
    pub fn type_name(&self) -> &'static str {
        T::TYPE.name
    }

    /// True when both handles refer to the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Immutably borrow the object.
    ///
    /// Panics if the object is currently mutably borrowed; use
    /// [`Handle::try_borrow`] when that cannot be ruled out.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.cell.value.borrow()
    }

    /// Mutably borrow the object.
    ///
    /// Every holder of a handle sees the mutation. Objects shared between
    /// several owners (navigators, projections) should be treated as
    /// read-only once attached, or deep-cloned first.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.cell.value.borrow_mut()
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, T>, BorrowError> {
        self.cell.value.try_borrow()
    }

    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, T>, BorrowMutError> {
        self.cell.value.try_borrow_mut()
    }

    /// Copy-construct an independent object.
    ///
    /// The clone inherits the source's instrumentation.
    pub fn deep_clone(&self) -> Self {
        let value = self.borrow().clone_object();
        Self::with_instrumentation(value, self.cell.instrumentation.clone())
    }

    /// Non-owning reference that does not keep the object alive.
    pub fn downgrade(&self) -> WeakHandle<T> {
        WeakHandle {
            id: self.cell.id,
            cell: Rc::downgrade(&self.cell),
        }
    }

    pub fn instrumentation(&self) -> &Instrumentation {
        &self.cell.instrumentation
    }
}

impl<T: RadarObject> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: RadarObject + fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Handle");
        s.field("type", &T::TYPE.name)
            .field("id", &self.cell.id)
            .field("refs", &self.ref_count());
        match self.cell.value.try_borrow() {
            Ok(value) => s.field("value", &*value),
            Err(_) => s.field("value", &"<mutably borrowed>"),
        };
        s.finish()
    }
}

/// Weak counterpart of [`Handle`].
pub struct WeakHandle<T: RadarObject> {
    id: ObjectId,
    cell: Weak<ObjectCell<T>>,
}

impl<T: RadarObject> WeakHandle<T> {
    /// Get a strong handle back if the object is still alive.
    pub fn upgrade(&self) -> Option<Handle<T>> {
        self.cell.upgrade().map(|cell| Handle { cell })
    }

    pub fn is_alive(&self) -> bool {
        self.cell.strong_count() > 0
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }
}

impl<T: RadarObject> Clone for WeakHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            cell: Weak::clone(&self.cell),
        }
    }
}
