use std::collections::{BTreeMap, HashMap};

use crate::impls::GenericTypeInfoCell;
use crate::info::{ListInfo, MapInfo, OptionInfo, TypeInfo, Typed};

impl<T: Typed> Typed for Option<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| TypeInfo::Option(OptionInfo::new::<T>()))
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| TypeInfo::List(ListInfo::new::<T>()))
    }
}

impl<V: Typed> Typed for HashMap<String, V> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| TypeInfo::Map(MapInfo::new::<Self>()))
    }
}

impl<V: Typed> Typed for BTreeMap<String, V> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| TypeInfo::Map(MapInfo::new::<Self>()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::info::{TypeInfo, Typed};

    #[test]
    fn generic_infos_are_cached_per_instantiation() {
        let a = <Vec<String>>::type_info();
        let b = <Vec<i64>>::type_info();
        assert!(core::ptr::eq(a, <Vec<String>>::type_info()));
        assert!(!core::ptr::eq(a, b));
        assert!(a.type_is::<Vec<String>>());
    }

    #[test]
    fn byte_vectors_are_byte_sequences() {
        assert!(<Vec<u8>>::type_info().is_byte_sequence());
        assert!(!<Vec<u8>>::type_info().is_container());
        assert!(<Vec<u32>>::type_info().is_container());
    }

    #[test]
    fn option_exposes_inner_info() {
        let TypeInfo::Option(info) = <Option<HashMap<String, bool>>>::type_info() else {
            panic!("expected an option");
        };
        let inner = info.inner_info().as_map().unwrap();
        assert!(inner.value_ty().is::<bool>());
    }
}
