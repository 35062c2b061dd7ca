use serde::{Deserialize, Deserializer};

// For PATCH-like admin bodies where "absent" and "null"
// mean different things. To be used with:
// #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
// on an Option<Option<T>> field. Absent gives None, null gives
// Some(None) and a value gives Some(Some(value)).
pub fn deserialize_null_value<'de, T, D>(
  deserializer: D
) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

// My forms send empty strings for fields left blank.
pub fn empty_string_to_none(value: Option<String>) -> Option<String> {
  match value {
    Some(s) => if s.trim().is_empty()
      { None } else { Some(s) },
    None => None
  }
}
