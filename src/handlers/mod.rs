pub mod admin;
pub mod public;

use serde::{Deserialize, Deserializer};

/// For nullable columns in update payloads: an absent key keeps the current
/// value, an explicit `null` clears it. Pair with
/// `#[serde(default, deserialize_with = "nullable_update")]`.
pub(crate) fn nullable_update<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
