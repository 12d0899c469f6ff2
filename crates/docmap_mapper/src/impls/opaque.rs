use bson::oid::ObjectId;
use bson::{Binary, Bson, DateTime, Decimal128, Timestamp};

/// Implements [`Typed`](crate::info::Typed) for leaf types that are read and
/// written through their serde implementations.
///
/// Types listed after `default:` also use their `Default` as the value of an
/// absent member in projected lookups.
///
/// ```
/// use docmap_mapper::impl_opaque;
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// enum Status {
///     Active,
///     Banned,
/// }
///
/// #[derive(serde::Serialize, serde::Deserialize, Default)]
/// struct Score(u32);
///
/// impl_opaque!(Status);
/// impl_opaque!(default: Score);
///
/// use docmap_mapper::info::Typed;
/// assert!(Status::type_info().empty_value().is_none());
/// assert!(Score::type_info().empty_value().is_some());
/// ```
#[macro_export]
macro_rules! impl_opaque {
    (default: $($ty:ty),+ $(,)?) => {
        $( $crate::impl_opaque!(@impl $ty => with_default); )+
    };
    (@impl $ty:ty => $ctor:ident) => {
        impl $crate::info::Typed for $ty {
            fn type_info() -> &'static $crate::info::TypeInfo {
                static CELL: $crate::impls::NonGenericTypeInfoCell =
                    $crate::impls::NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    $crate::info::TypeInfo::Opaque($crate::info::OpaqueInfo::$ctor::<$ty>())
                })
            }
        }
    };
    ($($ty:ty),+ $(,)?) => {
        $( $crate::impl_opaque!(@impl $ty => new); )+
    };
}

impl_opaque!(default: bool, char, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String);
impl_opaque!(default: Bson, bson::Document);
impl_opaque!(ObjectId, DateTime, Decimal128, Timestamp, Binary);
