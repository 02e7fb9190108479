//! # Capabilities
//!
//! A capability is any `'static` value attached to an entity and looked up by
//! its concrete type. [`CapabilityTag`] is the runtime key for that type;
//! [`CapabilityKey`] pairs a writable capability type with the read-only view
//! handed to read bindings.
//!
//! ## Read views
//!
//! ```text
//! CapabilityKey::<Health>::identity()           read view = &Health (the stored instance)
//! CapabilityKey::new(|h: &Health| h.current)    read view = u32, converted once per resolution
//! ```
//!
//! A read view must not expose a mutation surface. Identity keys satisfy this
//! by handing out shared borrows only; converted views are expected to be
//! plain snapshots. This is a contract on the conversion, not enforced here.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::Rc;

/// Runtime key for a capability type.
#[derive(Clone, Copy)]
pub struct CapabilityTag {
    id: TypeId,
    name: &'static str,
}

impl CapabilityTag {
    /// Returns the tag for `T`.
    #[inline]
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns the underlying type identifier.
    #[inline]
    #[must_use]
    pub fn type_id(self) -> TypeId {
        self.id
    }

    /// Returns the type name, for diagnostics only.
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for CapabilityTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CapabilityTag {}

impl Hash for CapabilityTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for CapabilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CapabilityTag").field(&self.name).finish()
    }
}

/// Type-erased read-view conversion used by the binding resolver.
pub(crate) type ErasedView = Rc<dyn Fn(&dyn Any) -> Option<Box<dyn Any>>>;

/// Descriptor pairing a writable capability type `W` with its read view `R`.
///
/// Built either with an explicit conversion ([`CapabilityKey::new`]) or as
/// the identity ([`CapabilityKey::identity`]), where the read view is the
/// stored `W` itself.
pub struct CapabilityKey<W: 'static, R: 'static = W> {
    convert: Option<Rc<dyn Fn(&W) -> R>>,
    _marker: PhantomData<fn() -> (W, R)>,
}

impl<W: 'static, R: 'static> CapabilityKey<W, R> {
    /// Creates a key with an explicit read-view conversion.
    ///
    /// The conversion must be pure and must not fail for any value that was
    /// validly stored. It runs exactly once per resolution of a read binding.
    #[must_use]
    pub fn new(convert: impl Fn(&W) -> R + 'static) -> Self {
        Self {
            convert: Some(Rc::new(convert)),
            _marker: PhantomData,
        }
    }

    /// Returns the tag of the writable capability type.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> CapabilityTag {
        CapabilityTag::of::<W>()
    }

    /// Returns `true` if the read view is the stored instance itself.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.convert.is_none()
    }

    /// Converts a stored value into its read view, or `None` for identity keys.
    #[must_use]
    pub fn provide_readonly_view(&self, value: &W) -> Option<R> {
        self.convert.as_ref().map(|convert| convert(value))
    }

    pub(crate) fn erased_view(&self) -> Option<ErasedView> {
        let convert = Rc::clone(self.convert.as_ref()?);
        Some(Rc::new(move |value: &dyn Any| {
            value
                .downcast_ref::<W>()
                .map(|value| Box::new(convert(value)) as Box<dyn Any>)
        }))
    }
}

impl<W: 'static> CapabilityKey<W, W> {
    /// Creates a key whose read view is the stored instance.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            convert: None,
            _marker: PhantomData,
        }
    }
}

impl<W: 'static, R: 'static> Clone for CapabilityKey<W, R> {
    fn clone(&self) -> Self {
        Self {
            convert: self.convert.clone(),
            _marker: PhantomData,
        }
    }
}

impl<W: 'static, R: 'static> fmt::Debug for CapabilityKey<W, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityKey")
            .field("writable", &type_name::<W>())
            .field("view", &type_name::<R>())
            .field("identity", &self.is_identity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Health {
        current: u32,
    }

    #[test]
    fn test_tag_equality_by_type() {
        assert_eq!(CapabilityTag::of::<Health>(), CapabilityTag::of::<Health>());
        assert_ne!(CapabilityTag::of::<Health>(), CapabilityTag::of::<u32>());
        assert!(CapabilityTag::of::<Health>().name().ends_with("Health"));
    }

    #[test]
    fn test_identity_key_has_no_conversion() {
        let key = CapabilityKey::<Health>::identity();
        assert!(key.is_identity());
        assert!(key.provide_readonly_view(&Health { current: 3 }).is_none());
        assert!(key.erased_view().is_none());
        assert_eq!(key.tag(), CapabilityTag::of::<Health>());
    }

    #[test]
    fn test_converted_key_views_value() {
        let key = CapabilityKey::new(|h: &Health| h.current * 2);
        assert!(!key.is_identity());
        assert_eq!(key.provide_readonly_view(&Health { current: 4 }), Some(8));

        let erased = key.erased_view().unwrap();
        let view = erased(&Health { current: 5 } as &dyn Any).unwrap();
        assert_eq!(*view.downcast::<u32>().unwrap(), 10);
        assert!(erased(&5u8 as &dyn Any).is_none());
    }
}
