use serde::{Deserialize, Deserializer};

/// Three-state field for partial updates: distinguishes a field that was
/// not present in the request (`Absent`, leave untouched) from one that
/// was explicitly `null` (`Null`, clear it) and from a new value.
///
/// Use with `#[serde(default)]` on the containing struct field so a
/// missing key deserializes to `Absent`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// Merge this patch onto an existing nullable value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Absent => current,
            Patch::Null => None,
            Patch::Value(v) => Some(v),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A present key is either null or a value; a missing key never
        // reaches this impl (serde default covers Absent).
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}
