use bson::{Bson, Document};

// -----------------------------------------------------------------------------
// Projection

/// A set of members to include in or exclude from a fetched document.
///
/// An empty projection returns whole documents. The identity member is
/// returned unless it is excluded explicitly.
///
/// ```
/// use docmap_mapper::reference::Projection;
///
/// let projection = Projection::new().include("name").include("email");
///
/// assert_eq!(projection.len(), 2);
/// assert!(projection.is_inclusive());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    fields: Document,
}

impl Projection {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), 1_i32);
        self
    }

    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), 0_i32);
        self
    }

    /// Builds a projection from a raw projection document.
    #[inline]
    pub fn from_document(fields: Document) -> Self {
        Self { fields }
    }

    #[inline]
    pub fn as_document(&self) -> &Document {
        &self.fields
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if any member other than `_id` is included.
    pub fn is_inclusive(&self) -> bool {
        self.fields
            .iter()
            .any(|(name, flag)| name != "_id" && is_truthy(flag))
    }

    /// Applies the projection to a document.
    pub fn apply(&self, document: &Document) -> Document {
        if self.is_empty() {
            return document.clone();
        }
        let inclusive = self.is_inclusive();
        document
            .iter()
            .filter(|(name, _)| match self.fields.get(name.as_str()) {
                Some(flag) => is_truthy(flag),
                None => !inclusive || name.as_str() == "_id",
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

fn is_truthy(flag: &Bson) -> bool {
    match flag {
        Bson::Boolean(b) => *b,
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(d) => *d != 0.0,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::Projection;

    #[test]
    fn empty_projection_keeps_everything() {
        let document = doc! { "_id": 1, "a": 2 };
        assert_eq!(Projection::new().apply(&document), document);
    }

    #[test]
    fn inclusive_projection_keeps_id() {
        let document = doc! { "_id": 1, "a": 2, "b": 3 };
        let projected = Projection::new().include("b").apply(&document);
        assert_eq!(projected, doc! { "_id": 1, "b": 3 });
    }

    #[test]
    fn exclusive_projection_drops_named_members() {
        let document = doc! { "_id": 1, "a": 2, "b": 3 };
        let projected = Projection::new().exclude("a").exclude("_id").apply(&document);
        assert_eq!(projected, doc! { "b": 3 });
    }
}
