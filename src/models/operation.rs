//! Laser operation tags inferred from drawing colour conventions.
//!
//! A primitive can carry any combination of the three operations, so the
//! classifier output is an [`OperationSet`] rather than a single category:
//! a blue stroke with a black fill is both a vector engrave and a raster
//! engrave, with no precedence rule between them.

use serde::{Deserialize, Serialize};

/// One machine operation the laser performs on a primitive.
///
/// Serialized as a snake_case string (e.g. `"vector_engrave"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Full-penetration cut along the outline (red stroke).
    Cut,
    /// Surface trace along the outline (blue stroke).
    VectorEngrave,
    /// Area fill engrave (black fill).
    RasterEngrave,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::Cut,
        Operation::VectorEngrave,
        Operation::RasterEngrave,
    ];

    fn bit(self) -> u8 {
        match self {
            Operation::Cut => 0b001,
            Operation::VectorEngrave => 0b010,
            Operation::RasterEngrave => 0b100,
        }
    }
}

/// A small set of [`Operation`]s.
///
/// Serialized as a JSON array in canonical order (`["cut", "raster_engrave"]`),
/// so the on-disk shape is independent of the bit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "Vec<Operation>", from = "Vec<Operation>")]
pub struct OperationSet(u8);

impl OperationSet {
    pub fn empty() -> Self {
        OperationSet(0)
    }

    pub fn insert(&mut self, op: Operation) {
        self.0 |= op.bit();
    }

    pub fn with(mut self, op: Operation) -> Self {
        self.insert(op);
        self
    }

    pub fn contains(&self, op: Operation) -> bool {
        self.0 & op.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Operation> + '_ {
        Operation::ALL.into_iter().filter(|op| self.contains(*op))
    }

    pub fn is_cut(&self) -> bool {
        self.contains(Operation::Cut)
    }

    pub fn is_vector_engrave(&self) -> bool {
        self.contains(Operation::VectorEngrave)
    }

    pub fn is_raster_engrave(&self) -> bool {
        self.contains(Operation::RasterEngrave)
    }
}

impl From<OperationSet> for Vec<Operation> {
    fn from(set: OperationSet) -> Self {
        set.iter().collect()
    }
}

impl From<Vec<Operation>> for OperationSet {
    fn from(ops: Vec<Operation>) -> Self {
        ops.into_iter().collect()
    }
}

impl FromIterator<Operation> for OperationSet {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        let mut set = OperationSet::empty();
        for op in iter {
            set.insert(op);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_contains_nothing() {
        let set = OperationSet::empty();
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
        for op in Operation::ALL {
            assert!(!set.contains(op));
        }
    }

    #[test]
    fn insert_is_idempotent() {
        let mut set = OperationSet::empty();
        set.insert(Operation::Cut);
        set.insert(Operation::Cut);
        assert_eq!(set.iter().count(), 1);
        assert!(set.is_cut());
    }

    #[test]
    fn set_can_hold_several_operations() {
        let set = OperationSet::empty()
            .with(Operation::VectorEngrave)
            .with(Operation::RasterEngrave);
        assert!(set.is_vector_engrave());
        assert!(set.is_raster_engrave());
        assert!(!set.is_cut());
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn iter_yields_canonical_order() {
        let set: OperationSet = vec![Operation::RasterEngrave, Operation::Cut]
            .into_iter()
            .collect();
        let ops: Vec<Operation> = set.iter().collect();
        assert_eq!(ops, vec![Operation::Cut, Operation::RasterEngrave]);
    }

    #[test]
    fn set_serializes_as_snake_case_array() {
        let set = OperationSet::empty()
            .with(Operation::RasterEngrave)
            .with(Operation::VectorEngrave);
        let value = serde_json::to_value(set).expect("serialize OperationSet");
        assert_eq!(value, serde_json::json!(["vector_engrave", "raster_engrave"]));
    }

    #[test]
    fn set_deserializes_from_array_with_duplicates() {
        let set: OperationSet =
            serde_json::from_str(r#"["cut","cut","raster_engrave"]"#).expect("deserialize");
        assert_eq!(set.iter().count(), 2);
        assert!(set.is_cut());
        assert!(set.is_raster_engrave());
    }
}
