use core::ptr::NonNull;

/// An object that stores its own reference count and destroys itself when
/// the last claim on it is released.
///
/// [`ScopedRef`](crate::ScopedRef) calls [`Self::increment`] whenever it
/// registers a claim and [`Self::decrement`] whenever it gives one up, and
/// never touches the count in any other way.
///
/// The trait is object safe, so for any `trait Node: Referenceable` the
/// trait object `dyn Node` is itself `Referenceable` and can be the target of
/// a handle.
///
/// # Safety
///
/// Implementors must guarantee that:
///
/// - Every value of the type that safe code can obtain a reference to lives
///   in storage governed by its count. In practice the constructor returns a
///   handle rather than a bare value, as [`crate::sync::RefCounted::new`]
///   does, so nobody can hold the value on the stack or inside another
///   object.
/// - The value stays alive for as long as the count is nonzero, and is
///   destroyed exactly when a call to [`Self::decrement`] brings it to zero.
/// - If the type is [`Sync`], both methods can be called concurrently from
///   several threads.
pub unsafe trait Referenceable {
    /// Registers one more ownership claim.
    fn increment(&self);

    /// Releases one ownership claim, destroying the referent if it was the
    /// last one.
    ///
    /// # Safety
    ///
    /// The caller must own one claim registered through [`Self::increment`]
    /// and gives it up by calling this. The reference must not be used again
    /// afterwards, since the referent might no longer exist.
    unsafe fn decrement(&self);
}

/// Converts a pointer to a referent into a pointer to the same referent
/// viewed as a related type, typically a trait object.
///
/// Every type converts to itself. Use [`impl_upcast!`](crate::impl_upcast)
/// for the conversions from a concrete type to trait objects it implements.
///
/// # Safety
///
/// [`Self::upcast`] must return a pointer to the same object, so that
/// claims registered through the result are claims on the same count.
pub unsafe trait Upcast<U: ?Sized + Referenceable>: Referenceable {
    fn upcast(this: NonNull<Self>) -> NonNull<U>;
}

unsafe impl<T: ?Sized + Referenceable> Upcast<T> for T {
    #[inline(always)]
    fn upcast(this: NonNull<Self>) -> NonNull<T> {
        this
    }
}

/// Implements [`Upcast`] for each `Concrete => dyn Trait` pair using the
/// built-in unsizing coercion.
///
/// ```
/// use scopedref::{impl_upcast, sync::RefCounted, Referenceable, ScopedRef};
///
/// trait Named: Referenceable {
///     fn name(&self) -> &str;
/// }
///
/// impl Named for RefCounted<&'static str> {
///     fn name(&self) -> &str {
///         self
///     }
/// }
///
/// impl_upcast!(RefCounted<&'static str> => dyn Named);
///
/// let concrete = RefCounted::new("quartz");
/// let named: ScopedRef<dyn Named> = ScopedRef::upcast_from(&concrete);
/// assert_eq!(named.name(), "quartz");
/// assert_eq!(RefCounted::claim_count(&concrete), 2);
/// ```
#[macro_export]
macro_rules! impl_upcast {
    ($($from:ty => $to:ty),+ $(,)?) => {
        $(
            unsafe impl $crate::Upcast<$to> for $from {
                #[inline(always)]
                fn upcast(this: ::core::ptr::NonNull<Self>) -> ::core::ptr::NonNull<$to> {
                    this
                }
            }
        )+
    };
}
