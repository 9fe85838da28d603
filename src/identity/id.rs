//! Record keys for callers, stored targets, and organizations.
//!
//! Upstream stores hand out either integer primary keys or opaque tokens such as UUIDs or
//! `user:42`. [`RecordKey`] keeps both shapes. A canonical decimal string (`"42"`, not `"042"`)
//! collapses to [`RecordKey::Numeric`], so a caller known as `42` in one store and `"42"` in a
//! JSON body shares one rate-limit window. Anything else is an opaque token drawn from
//! `[A-Za-z0-9._:@-]`.

// std
use std::{
	cmp::Ordering,
	hash::{Hash, Hasher},
	marker::PhantomData,
};
// self
use crate::_prelude::*;

const OPAQUE_MAX_LEN: usize = 128;

/// Error returned when a record key cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The key was empty.
	#[error("{kind} id cannot be empty.")]
	Empty {
		/// Record kind (identity, target, organization).
		kind: &'static str,
	},
	/// The opaque key is longer than the storage column allows.
	#[error("{kind} id exceeds {max} characters.")]
	TooLong {
		/// Record kind (identity, target, organization).
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
	/// The opaque key holds a character outside `[A-Za-z0-9._:@-]`.
	#[error("{kind} id contains unsupported character {character:?}.")]
	InvalidCharacter {
		/// Record kind (identity, target, organization).
		kind: &'static str,
		/// First offending character.
		character: char,
	},
}

/// Primary key of an upstream record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKey {
	/// Integer row id.
	Numeric(u64),
	/// Opaque token such as a UUID.
	Opaque(String),
}
impl RecordKey {
	fn parse(kind: &'static str, raw: &str) -> Result<Self, IdentifierError> {
		if raw.is_empty() {
			return Err(IdentifierError::Empty { kind });
		}
		if let Some(value) = canonical_numeric(raw) {
			return Ok(Self::Numeric(value));
		}
		if raw.len() > OPAQUE_MAX_LEN {
			return Err(IdentifierError::TooLong { kind, max: OPAQUE_MAX_LEN });
		}
		if let Some(character) = raw.chars().find(|c| !is_key_char(*c)) {
			return Err(IdentifierError::InvalidCharacter { kind, character });
		}

		Ok(Self::Opaque(raw.to_owned()))
	}
}
impl Display for RecordKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Numeric(value) => write!(f, "{value}"),
			Self::Opaque(token) => f.write_str(token),
		}
	}
}
impl Serialize for RecordKey {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		match self {
			Self::Numeric(value) => serializer.serialize_u64(*value),
			Self::Opaque(token) => serializer.serialize_str(token),
		}
	}
}

/// Names the record family a [`RecordId`] points into.
pub trait RecordKind
where
	Self: 'static,
{
	/// Label used in errors and `Debug` output.
	const KIND: &'static str;
}

/// Marker for caller principals.
#[derive(Debug)]
pub enum IdentityRecord {}
impl RecordKind for IdentityRecord {
	const KIND: &'static str = "Identity";
}

/// Marker for stored webhook configurations.
#[derive(Debug)]
pub enum TargetRecord {}
impl RecordKind for TargetRecord {
	const KIND: &'static str = "Target";
}

/// Marker for organizations referenced by audit entries.
#[derive(Debug)]
pub enum OrganizationRecord {}
impl RecordKind for OrganizationRecord {
	const KIND: &'static str = "Organization";
}

/// Caller principal used as the rate-limiting and audit actor key.
pub type IdentityId = RecordId<IdentityRecord>;
/// Identifier of a stored webhook target configuration.
pub type TargetId = RecordId<TargetRecord>;
/// Organization context attached to audit entries.
pub type OrganizationId = RecordId<OrganizationRecord>;

/// Typed key of one upstream record; ids of different kinds never compare equal.
pub struct RecordId<K> {
	key: RecordKey,
	kind: PhantomData<fn() -> K>,
}
impl<K> RecordId<K>
where
	K: RecordKind,
{
	/// Parses a numeric or opaque key.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		RecordKey::parse(K::KIND, value.as_ref()).map(Self::from_key)
	}

	/// Wraps an already parsed key.
	pub fn from_key(key: RecordKey) -> Self {
		Self { key, kind: PhantomData }
	}

	/// Underlying key.
	pub fn key(&self) -> &RecordKey {
		&self.key
	}

	/// Integer row id, when the key is numeric.
	pub fn as_numeric(&self) -> Option<u64> {
		match self.key {
			RecordKey::Numeric(value) => Some(value),
			RecordKey::Opaque(_) => None,
		}
	}
}
impl<K> Clone for RecordId<K> {
	fn clone(&self) -> Self {
		Self { key: self.key.clone(), kind: PhantomData }
	}
}
impl<K> PartialEq for RecordId<K> {
	fn eq(&self, other: &Self) -> bool {
		self.key == other.key
	}
}
impl<K> Eq for RecordId<K> {}
impl<K> PartialOrd for RecordId<K> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
impl<K> Ord for RecordId<K> {
	fn cmp(&self, other: &Self) -> Ordering {
		self.key.cmp(&other.key)
	}
}
impl<K> Hash for RecordId<K> {
	fn hash<H>(&self, state: &mut H)
	where
		H: Hasher,
	{
		self.key.hash(state);
	}
}
impl<K> From<u64> for RecordId<K> {
	fn from(value: u64) -> Self {
		Self { key: RecordKey::Numeric(value), kind: PhantomData }
	}
}
impl<K> Debug for RecordId<K>
where
	K: RecordKind,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}({})", K::KIND, self.key)
	}
}
impl<K> Display for RecordId<K> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.key, f)
	}
}
impl<K> FromStr for RecordId<K>
where
	K: RecordKind,
{
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl<K> Serialize for RecordId<K> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		self.key.serialize(serializer)
	}
}
impl<'de, K> Deserialize<'de> for RecordId<K>
where
	K: RecordKind,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Wire {
			Numeric(u64),
			Text(String),
		}

		match Wire::deserialize(deserializer)? {
			Wire::Numeric(value) => Ok(Self::from(value)),
			Wire::Text(raw) => Self::new(raw).map_err(serde::de::Error::custom),
		}
	}
}

fn canonical_numeric(raw: &str) -> Option<u64> {
	if !raw.bytes().all(|b| b.is_ascii_digit()) || (raw.len() > 1 && raw.starts_with('0')) {
		return None;
	}

	raw.parse().ok()
}

fn is_key_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '@' | '-')
}
