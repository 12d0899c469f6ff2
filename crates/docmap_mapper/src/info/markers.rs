use bitflags::bitflags;

/// The wire name every identity member is written under.
pub const ID_WIRE_NAME: &str = "_id";

bitflags! {
    /// Declarative markers attached to a document member.
    ///
    /// - `ID`: the member is the document identity and is written as `_id`.
    /// - `OBJECT_ID`: the member holds an object id in a non-native representation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Markers: u8 {
        const ID        = 1 << 0;
        const OBJECT_ID = 1 << 1;
    }
}
