//! Request parameter model shared by the query string, the form body and the signers.
//!
//! Values are always strings or lists of strings by the time they reach the wire; the
//! conversions in this module perform that coercion up front so the signing input and the
//! transmitted parameters can never disagree.

// std
use std::slice;
// self
use crate::{_prelude::*, error::ConfigError};

/// Single parameter value: absent, one string, or a list of strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ParamValue {
	/// Value explicitly set to nothing; the key is dropped before encoding.
	#[default]
	Null,
	/// Scalar value.
	One(String),
	/// Multiple values sent as repeated `key=value` pairs.
	Many(Vec<String>),
}
impl ParamValue {
	/// Returns `true` for [`ParamValue::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Values as a slice; scalars become a one-element slice and nulls an empty one.
	pub fn values(&self) -> &[String] {
		match self {
			Self::Null => &[],
			Self::One(value) => slice::from_ref(value),
			Self::Many(values) => values,
		}
	}
}
impl From<&str> for ParamValue {
	fn from(value: &str) -> Self {
		Self::One(value.to_owned())
	}
}
impl From<String> for ParamValue {
	fn from(value: String) -> Self {
		Self::One(value)
	}
}
impl From<&String> for ParamValue {
	fn from(value: &String) -> Self {
		Self::One(value.clone())
	}
}
impl<T> From<Option<T>> for ParamValue
where
	T: Into<ParamValue>,
{
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}
impl<T> From<Vec<T>> for ParamValue
where
	T: Display,
{
	fn from(values: Vec<T>) -> Self {
		Self::Many(values.iter().map(ToString::to_string).collect())
	}
}
impl<T> From<&[T]> for ParamValue
where
	T: Display,
{
	fn from(values: &[T]) -> Self {
		Self::Many(values.iter().map(ToString::to_string).collect())
	}
}
impl<T, const N: usize> From<[T; N]> for ParamValue
where
	T: Display,
{
	fn from(values: [T; N]) -> Self {
		Self::Many(values.iter().map(ToString::to_string).collect())
	}
}

macro_rules! impl_scalar_param {
	($($ty:ty),+ $(,)?) => {
		$(
			impl From<$ty> for ParamValue {
				fn from(value: $ty) -> Self {
					Self::One(value.to_string())
				}
			}
		)+
	};
}

impl_scalar_param!(bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// Insertion-ordered parameter mapping.
///
/// Order matters for the transmitted query/body and for the legacy signature; the canonical
/// signature sorts independently of it. Inserting an existing key replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, ParamValue)>);
impl Params {
	/// Creates an empty mapping.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style [`Params::insert`].
	pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
		self.insert(key, value);

		self
	}

	/// Inserts or replaces a parameter.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
		let key = key.into();
		let value = value.into();

		match self.0.iter_mut().find(|(existing, _)| *existing == key) {
			Some((_, slot)) => *slot = value,
			None => self.0.push((key, value)),
		}
	}

	/// Looks up a parameter by key.
	pub fn get(&self, key: &str) -> Option<&ParamValue> {
		self.0.iter().find(|(existing, _)| existing == key).map(|(_, value)| value)
	}

	/// Number of keys, nulls included.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no keys were inserted.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns `true` when at least one key carries a non-null value.
	pub fn has_values(&self) -> bool {
		self.0.iter().any(|(_, value)| !value.is_null())
	}

	/// Iterates over every entry in insertion order, nulls included.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
		self.0.iter().map(|(key, value)| (key.as_str(), value))
	}

	/// Iterates over `(key, values)` in insertion order with null-valued keys dropped.
	pub fn without_nulls(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.iter().filter(|(_, value)| !value.is_null()).map(|(key, value)| (key, value.values()))
	}

	/// Builds parameters from a JSON object.
	///
	/// Strings, numbers, booleans, nulls and arrays of those scalars are accepted. Nested
	/// objects or arrays are rejected so the failure surfaces before anything is signed or sent.
	pub fn from_json(value: JsonValue) -> Result<Self, ConfigError> {
		let JsonValue::Object(map) = value else {
			return Err(ConfigError::ParamsNotAnObject { found: json_kind(&value) });
		};
		let mut params = Self::new();

		for (key, value) in map {
			let value = match value {
				JsonValue::Null => ParamValue::Null,
				JsonValue::Array(items) => {
					let mut values = Vec::with_capacity(items.len());

					for item in items {
						match json_scalar(&item) {
							Ok(Some(text)) => values.push(text),
							Ok(None) => {},
							Err(kind) =>
								return Err(ConfigError::UnsupportedParamValue { key, kind }),
						}
					}

					ParamValue::Many(values)
				},
				other => match json_scalar(&other) {
					Ok(Some(text)) => ParamValue::One(text),
					Ok(None) => ParamValue::Null,
					Err(kind) => return Err(ConfigError::UnsupportedParamValue { key, kind }),
				},
			};

			params.insert(key, value);
		}

		Ok(params)
	}
}
impl<K, V> FromIterator<(K, V)> for Params
where
	K: Into<String>,
	V: Into<ParamValue>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		let mut params = Self::new();

		for (key, value) in iter {
			params.insert(key, value);
		}

		params
	}
}
impl TryFrom<JsonValue> for Params {
	type Error = ConfigError;

	fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
		Self::from_json(value)
	}
}

fn json_scalar(value: &JsonValue) -> Result<Option<String>, &'static str> {
	match value {
		JsonValue::Null => Ok(None),
		JsonValue::String(text) => Ok(Some(text.clone())),
		JsonValue::Number(number) => Ok(Some(number.to_string())),
		JsonValue::Bool(flag) => Ok(Some(flag.to_string())),
		other => Err(json_kind(other)),
	}
}

fn json_kind(value: &JsonValue) -> &'static str {
	match value {
		JsonValue::Null => "null",
		JsonValue::Bool(_) => "boolean",
		JsonValue::Number(_) => "number",
		JsonValue::String(_) => "string",
		JsonValue::Array(_) => "array",
		JsonValue::Object(_) => "object",
	}
}
