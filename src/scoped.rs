use core::{
    fmt,
    marker::PhantomData,
    mem::{self, ManuallyDrop},
    ops::Deref,
    ptr::NonNull,
};

use crate::{Referenceable, Upcast};

/// Nullable smart pointer holding one claim on an object that keeps its own
/// reference count.
///
/// A non-null `ScopedRef` always accounts for exactly one claim registered
/// through [`Referenceable::increment`], and gives it back through
/// [`Referenceable::decrement`] when dropped or reassigned. Summed over every
/// referent, the number of non-null handles pointing at it plus the claims
/// detached by [`Self::release`] equals its count.
///
/// Like [`alloc::rc::Rc`], the operations are associated functions rather
/// than methods (`ScopedRef::get(&p)`, not `p.get()`) so that they don't
/// shadow the methods of the target reached through [`Deref`].
///
/// Moving a `ScopedRef` with ordinary Rust moves transfers its claim without
/// touching the count. [`Self::take`] and [`Self::assign_take`] do the same
/// for a handle that stays in place and is left null.
pub struct ScopedRef<T: ?Sized + Referenceable> {
    ptr: Option<NonNull<T>>,
    _owns: PhantomData<T>,
}

impl<T: ?Sized + Referenceable> ScopedRef<T> {
    /// Creates a handle that holds no claim.
    #[inline(always)]
    pub const fn null() -> Self {
        Self::adopt(None)
    }

    /// Creates a handle to the referent at `ptr`, registering a new claim on
    /// it. A null `ptr` gives a null handle.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a live referent.
    #[inline(always)]
    pub unsafe fn from_raw(ptr: *const T) -> Self {
        Self::acquire(NonNull::new(ptr as *mut T))
    }

    /// Creates a handle to the referent behind `r`, registering a new claim
    /// on it.
    ///
    /// This is what lets a referent hand out new handles to itself from
    /// `&self`.
    #[inline(always)]
    pub fn from_ref(r: &T) -> Self {
        Self::acquire(Some(NonNull::from(r)))
    }

    /// Creates a handle to the same referent as `other`, viewed as `T`,
    /// registering a new claim on it. `other` is unaffected.
    pub fn upcast_from<U>(other: &ScopedRef<U>) -> Self
    where
        U: ?Sized + Upcast<T>,
    {
        Self::acquire(other.ptr.map(<U as Upcast<T>>::upcast))
    }

    /// Moves the claim out of `this` into a new handle, leaving `this` null.
    ///
    /// The count is not affected.
    #[inline(always)]
    pub fn take(this: &mut Self) -> Self {
        Self::adopt(this.ptr.take())
    }

    /// Moves the claim out of `src` into a new handle viewing the referent
    /// as `T`, leaving `src` null.
    ///
    /// The count is not affected.
    pub fn take_from<U>(src: &mut ScopedRef<U>) -> Self
    where
        U: ?Sized + Upcast<T>,
    {
        Self::adopt(ScopedRef::release(src).map(<U as Upcast<T>>::upcast))
    }

    /// Converts the handle into one viewing the same referent as `U`,
    /// keeping its claim.
    pub fn upcast<U>(this: Self) -> ScopedRef<U>
    where
        T: Upcast<U>,
        U: ?Sized + Referenceable,
    {
        ScopedRef::adopt(Self::into_raw(this).map(<T as Upcast<U>>::upcast))
    }

    /// Gets a reference to the referent, or `None` for a null handle.
    ///
    /// The count is not affected.
    #[inline(always)]
    pub fn get(this: &Self) -> Option<&T> {
        // The claim held by `this` keeps the referent alive for the borrow.
        this.ptr.map(|ptr| unsafe { &*ptr.as_ptr() })
    }

    /// Gets a raw pointer to the referent, or `None` for a null handle.
    ///
    /// The count is not affected and the pointer remains valid for as long
    /// as at least one claim remains.
    #[inline(always)]
    pub const fn as_ptr(this: &Self) -> Option<NonNull<T>> {
        this.ptr
    }

    #[inline(always)]
    pub const fn is_null(this: &Self) -> bool {
        this.ptr.is_none()
    }

    /// Returns true if both handles are null or both point to the same
    /// referent.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        match (this.ptr, other.ptr) {
            (Some(a), Some(b)) => a.cast::<()>() == b.cast::<()>(),
            (None, None) => true,
            _ => false,
        }
    }

    /// Detaches the claim from the handle and returns the referent pointer,
    /// leaving the handle null.
    ///
    /// The count is not affected: the caller now owns one claim and must
    /// eventually give it back with [`Referenceable::decrement`], or the
    /// referent leaks.
    #[inline(always)]
    #[must_use = "losing the pointer leaks the referent"]
    pub fn release(this: &mut Self) -> Option<NonNull<T>> {
        this.ptr.take()
    }

    /// Consuming version of [`Self::release`].
    #[inline(always)]
    #[must_use = "losing the pointer leaks the referent"]
    pub fn into_raw(this: Self) -> Option<NonNull<T>> {
        let mut this = ManuallyDrop::new(this);
        this.ptr.take()
    }

    /// Points the handle at the referent at `ptr` (or at nothing, if null),
    /// registering a claim on the new referent before giving up the claim on
    /// the old one.
    ///
    /// Because of that order, assigning a handle its own referent never lets
    /// the count touch zero.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a live referent.
    #[inline(always)]
    pub unsafe fn assign_raw(this: &mut Self, ptr: *const T) {
        unsafe { Self::replace(this, NonNull::new(ptr as *mut T)) }
    }

    /// Safe version of [`Self::assign_raw`] for a referent behind a live
    /// reference.
    #[inline(always)]
    pub fn assign_ref(this: &mut Self, r: Option<&T>) {
        unsafe { Self::replace(this, r.map(NonNull::from)) }
    }

    /// Points `this` at the referent of `src`, registering one new claim on
    /// it. `src` is unaffected.
    ///
    /// Assigning from a handle that aliases the same referent leaves the
    /// count unchanged.
    pub fn assign<U>(this: &mut Self, src: &ScopedRef<U>)
    where
        U: ?Sized + Upcast<T>,
    {
        // `src` holds a claim, so its referent is alive.
        unsafe { Self::replace(this, src.ptr.map(<U as Upcast<T>>::upcast)) }
    }

    /// Moves the claim held by `src` into `this`, leaving `src` null and
    /// releasing whatever `this` held before.
    ///
    /// The move goes through a temporary that is swapped into `this` and
    /// then dropped, so it stays correct when `src` and `this` share a
    /// referent.
    pub fn assign_take<U>(this: &mut Self, src: &mut ScopedRef<U>)
    where
        U: ?Sized + Upcast<T>,
    {
        let mut temp = Self::take_from(src);
        Self::swap(&mut temp, this);
    }

    /// Releases the handle's claim, if any, and leaves it null.
    #[inline(always)]
    pub fn reset(this: &mut Self) {
        drop(Self::take(this));
    }

    /// Exchanges the handle's pointer with `slot` without touching either
    /// count.
    ///
    /// # Safety
    ///
    /// A non-null pointer in `slot` must carry one claim that becomes owned
    /// by the handle; the claim the handle held, if any, becomes owned by
    /// whoever owns `slot`.
    #[inline(always)]
    pub unsafe fn swap_raw(this: &mut Self, slot: &mut Option<NonNull<T>>) {
        mem::swap(&mut this.ptr, slot);
    }

    /// Exchanges the referents of two handles without touching either
    /// count.
    #[inline(always)]
    pub fn swap(this: &mut Self, other: &mut Self) {
        // `other.ptr` is exactly one claim owned by a handle.
        unsafe { Self::swap_raw(this, &mut other.ptr) }
    }

    #[inline(always)]
    const fn adopt(ptr: Option<NonNull<T>>) -> Self {
        Self {
            ptr,
            _owns: PhantomData,
        }
    }

    #[inline(always)]
    fn acquire(ptr: Option<NonNull<T>>) -> Self {
        if let Some(ptr) = ptr {
            unsafe { ptr.as_ref() }.increment();
        }
        Self::adopt(ptr)
    }

    /// Claims `ptr`, stores it, then releases the previous referent.
    ///
    /// The claim on the new referent is always registered before the old one
    /// is released, which is what keeps self-assignment from touching zero.
    /// The pointer is stored before the release rather than after it: the
    /// counts move exactly the same way, but if destroying the old referent
    /// panics or drops other handles, `this` already points at the new
    /// referent instead of at freed memory that its own `Drop` would release
    /// a second time.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a live referent.
    unsafe fn replace(this: &mut Self, ptr: Option<NonNull<T>>) {
        if let Some(ptr) = ptr {
            unsafe { ptr.as_ref() }.increment();
        }
        if let Some(old) = mem::replace(&mut this.ptr, ptr) {
            unsafe { old.as_ref().decrement() };
        }
    }
}

impl<T: ?Sized + Referenceable> Drop for ScopedRef<T> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr {
            unsafe { ptr.as_ref().decrement() };
        }
    }
}

impl<T: ?Sized + Referenceable> Clone for ScopedRef<T> {
    /// Creates a new handle to the same referent, registering one more claim.
    #[inline(always)]
    fn clone(&self) -> Self {
        Self::acquire(self.ptr)
    }

    fn clone_from(&mut self, source: &Self) {
        Self::assign(self, source)
    }
}

impl<T: ?Sized + Referenceable> Default for ScopedRef<T> {
    #[inline(always)]
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized + Referenceable> Deref for ScopedRef<T> {
    type Target = T;

    /// Returns a reference to the referent.
    ///
    /// # Panics
    ///
    /// If the handle is null. Use [`ScopedRef::get`] to check instead.
    fn deref(&self) -> &T {
        match Self::get(self) {
            Some(r) => r,
            None => panic!("dereferenced a null ScopedRef"),
        }
    }
}

impl<T: ?Sized + Referenceable + fmt::Debug> fmt::Debug for ScopedRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::get(self) {
            Some(r) => f.debug_tuple("ScopedRef").field(&r).finish(),
            None => f.write_str("ScopedRef(null)"),
        }
    }
}

impl<T: ?Sized + Referenceable> fmt::Pointer for ScopedRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(ptr) => fmt::Pointer::fmt(&ptr, f),
            None => fmt::Pointer::fmt(&core::ptr::null::<()>(), f),
        }
    }
}

unsafe impl<T: ?Sized + Referenceable + Sync + Send> Sync for ScopedRef<T> {}
unsafe impl<T: ?Sized + Referenceable + Sync + Send> Send for ScopedRef<T> {}
