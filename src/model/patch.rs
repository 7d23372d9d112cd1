//! Typed partial-update fields.
//!
//! Every catalog entity accepts updates as a patch struct whose fields are
//! `Field<T>`: `Unchanged` leaves the stored value alone, `Set` replaces it.
//! Nullable columns use `Field<Option<T>>` so that clearing a value stays
//! representable (`Set(None)`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Field<T> {
    #[default]
    Unchanged,
    Set(T),
}

impl<T> Field<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Folds the patch field into the stored value.
    pub fn apply_to(self, slot: &mut T) {
        if let Self::Set(value) = self {
            *slot = value;
        }
    }

    /// The value this field would leave in place, given the current one.
    pub fn resolve<'a>(&'a self, current: &'a T) -> &'a T {
        match self {
            Self::Unchanged => current,
            Self::Set(value) => value,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unchanged, Self::Set)
    }
}

// A present JSON value (including null, for Field<Option<T>>) means Set;
// combined with #[serde(default)] on the patch struct, an absent key stays
// Unchanged.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::Set)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unchanged => serializer.serialize_none(),
            Self::Set(value) => value.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Deserialize, Default)]
    struct DemoPatch {
        #[serde(default)]
        title: Field<String>,
        #[serde(default)]
        limit: Field<Option<i32>>,
    }

    #[test]
    fn absent_key_is_unchanged() {
        let patch: DemoPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.title, Field::Unchanged);
        assert_eq!(patch.limit, Field::Unchanged);
    }

    #[test]
    fn present_key_is_set() {
        let patch: DemoPatch = serde_json::from_str(r#"{"title": "midterm"}"#).unwrap();
        assert_eq!(patch.title, Field::Set("midterm".into()));
    }

    #[test]
    fn null_clears_nullable_field() {
        let patch: DemoPatch = serde_json::from_str(r#"{"limit": null}"#).unwrap();
        assert_eq!(patch.limit, Field::Set(None));
    }

    #[test]
    fn apply_to_folds_into_slot() {
        let mut title = String::from("old");
        Field::Unchanged.apply_to(&mut title);
        assert_eq!(title, "old");
        Field::Set(String::from("new")).apply_to(&mut title);
        assert_eq!(title, "new");
    }

    #[test]
    fn resolve_prefers_patch_value() {
        let current = 3;
        assert_eq!(*Field::Unchanged.resolve(&current), 3);
        assert_eq!(*Field::Set(7).resolve(&current), 7);
    }
}
