//! Universal response tree shared by every parser, token, and provider mapping.
//!
//! [`UniValue`] is a shared handle onto a node of a dynamically typed tree: `Null`, a
//! [`Scalar`], an ordered `Object`, or an ordered `Array`. JSON, XML, and query-string payloads
//! all land in the same shape so callers navigate provider responses without caring about the
//! wire format.
//!
//! # Handle semantics
//!
//! `Clone::clone` copies the handle, not the node: mutating through one alias is visible through
//! every other alias. Use [`UniValue::deep_clone`] for an independent copy.
//!
//! # Total indexing
//!
//! [`UniValue::get`] and [`UniValue::at`] never fail. A miss returns a detached empty node that
//! still remembers its parent and key, so `tree.get("a").at(3).get("b")` on an empty tree is an
//! empty node, and calling [`UniValue::set`] on it writes the whole path into the tree.

mod json;
mod query;
mod scalar;
mod xml;

pub use scalar::*;

// std
use std::sync::Weak;
// self
use crate::{_prelude::*, error::FormatError};

type NodeRef = Arc<RwLock<Node>>;

/// Key reported by a tree root.
pub const ROOT_KEY: &str = "root";

/// Structural kind of a [`UniValue`] node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
	/// Absent or explicit null.
	Null,
	/// String, number, boolean, bytes, or date-time.
	Scalar,
	/// Ordered key/value map.
	Object,
	/// Ordered list.
	Array,
}

/// Shared handle onto a node of the universal response tree.
pub struct UniValue(NodeRef);
impl UniValue {
	/// Creates an empty (`Null`) root node.
	pub fn empty() -> Self {
		Self::materialize(Plain::Null, ROOT_KEY.into(), Weak::new())
	}

	/// Creates an empty object root node.
	pub fn object() -> Self {
		Self::materialize(Plain::Object(Vec::new()), ROOT_KEY.into(), Weak::new())
	}

	/// Creates an empty array root node.
	pub fn array() -> Self {
		Self::materialize(Plain::Array(Vec::new()), ROOT_KEY.into(), Weak::new())
	}

	/// Parses a JSON document.
	pub fn parse_json(text: &str) -> Result<Self, FormatError> {
		json::parse(text).map(Self::root)
	}

	/// Parses an XML document; the root element becomes the single key of the returned object.
	pub fn parse_xml(text: &str) -> Result<Self, FormatError> {
		xml::parse(text).map(Self::root)
	}

	/// Parses an `application/x-www-form-urlencoded` parameter string.
	pub fn parse_query_string(text: &str) -> Result<Self, FormatError> {
		query::parse(text).map(Self::root)
	}

	/// Parses `text`, choosing JSON, XML, or query-string syntax from its first character.
	pub fn parse(text: &str) -> Result<Self, FormatError> {
		match text.trim_start().chars().next() {
			Some('{' | '[') => Self::parse_json(text),
			Some('<') => Self::parse_xml(text),
			_ => Self::parse_query_string(text),
		}
	}

	/// Non-failing [`parse_json`](Self::parse_json); returns `false` and an empty node on error.
	pub fn try_parse_json(text: &str) -> (bool, Self) {
		Self::settle(Self::parse_json(text))
	}

	/// Non-failing [`parse_xml`](Self::parse_xml); returns `false` and an empty node on error.
	pub fn try_parse_xml(text: &str) -> (bool, Self) {
		Self::settle(Self::parse_xml(text))
	}

	/// Non-failing [`parse_query_string`](Self::parse_query_string); returns `false` and an empty
	/// node on error.
	pub fn try_parse_query_string(text: &str) -> (bool, Self) {
		Self::settle(Self::parse_query_string(text))
	}

	/// Non-failing [`parse`](Self::parse); returns `false` and an empty node on error.
	pub fn try_parse(text: &str) -> (bool, Self) {
		Self::settle(Self::parse(text))
	}

	/// Structural kind of this node.
	pub fn kind(&self) -> ValueKind {
		match &self.0.read().data {
			Data::Null => ValueKind::Null,
			Data::Scalar(_) => ValueKind::Scalar,
			Data::Object(_) => ValueKind::Object,
			Data::Array(_) => ValueKind::Array,
		}
	}

	/// Returns `true` for `Null` nodes, including every missed lookup.
	pub fn is_null(&self) -> bool {
		matches!(self.kind(), ValueKind::Null)
	}

	/// Returns `true` for `Null`, an empty string, or a container without entries.
	pub fn is_empty(&self) -> bool {
		match &self.0.read().data {
			Data::Null => true,
			Data::Scalar(Scalar::String(text)) => text.is_empty(),
			Data::Scalar(_) => false,
			Data::Object(entries) => entries.is_empty(),
			Data::Array(items) => items.is_empty(),
		}
	}

	/// Inverse of [`is_empty`](Self::is_empty).
	pub fn has_value(&self) -> bool {
		!self.is_empty()
	}

	/// Number of items [`iter`](Self::iter) yields.
	pub fn len(&self) -> usize {
		match &self.0.read().data {
			Data::Null => 0,
			Data::Scalar(_) => 1,
			Data::Object(entries) => entries.len(),
			Data::Array(items) => items.len(),
		}
	}

	/// Key (or index) this node was reached by; [`ROOT_KEY`] for a root.
	pub fn key(&self) -> String {
		self.0.read().key.clone()
	}

	/// Node that produced this one via indexing, if it is still alive.
	pub fn parent(&self) -> Option<UniValue> {
		self.0.read().parent.upgrade().map(Self)
	}

	/// Returns `true` when both handles point at the same node.
	pub fn ptr_eq(&self, other: &UniValue) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	/// Returns the scalar held by this node.
	pub fn scalar(&self) -> Option<Scalar> {
		match &self.0.read().data {
			Data::Scalar(scalar) => Some(scalar.clone()),
			_ => None,
		}
	}

	/// Returns `true` if this object has an entry named `key`.
	pub fn contains_key(&self, key: &str) -> bool {
		match &self.0.read().data {
			Data::Object(entries) => entries.iter().any(|(name, _)| name == key),
			_ => false,
		}
	}

	/// Object keys in insertion order (empty for non-objects).
	pub fn keys(&self) -> Vec<String> {
		match &self.0.read().data {
			Data::Object(entries) => entries.iter().map(|(name, _)| name.clone()).collect(),
			_ => Vec::new(),
		}
	}

	/// Object entries in insertion order (empty for non-objects).
	pub fn entries(&self) -> Vec<(String, UniValue)> {
		match &self.0.read().data {
			Data::Object(entries) => entries.clone(),
			_ => Vec::new(),
		}
	}

	/// Looks up `key` in this object. Never fails: a miss yields a detached empty node.
	pub fn get(&self, key: &str) -> UniValue {
		let found = match &self.0.read().data {
			Data::Object(entries) =>
				entries.iter().find(|(name, _)| name == key).map(|(_, value)| value.clone()),
			_ => None,
		};

		found.unwrap_or_else(|| self.detached(Slot::Key(key.to_owned())))
	}

	/// Looks up `index` in this array. Never fails: a miss yields a detached empty node.
	pub fn at(&self, index: usize) -> UniValue {
		let found = match &self.0.read().data {
			Data::Array(items) => items.get(index).cloned(),
			_ => None,
		};

		found.unwrap_or_else(|| self.detached(Slot::Index(index)))
	}

	/// Walks `path`; numeric segments index arrays, every other segment reads object keys.
	pub fn lookup<S>(&self, path: &[S]) -> UniValue
	where
		S: AsRef<str>,
	{
		path.iter().fold(self.clone(), |node, segment| {
			let segment = segment.as_ref();

			match (node.kind(), segment.parse::<usize>()) {
				(ValueKind::Array, Ok(index)) => node.at(index),
				_ => node.get(segment),
			}
		})
	}

	/// Items in enumeration order.
	///
	/// Objects yield their values, arrays their elements, a scalar yields itself once, and `Null`
	/// yields nothing, so a provider returning one item or many iterates the same way.
	pub fn iter(&self) -> std::vec::IntoIter<UniValue> {
		let items = match &self.0.read().data {
			Data::Null => Vec::new(),
			Data::Scalar(_) => vec![self.clone()],
			Data::Object(entries) => entries.iter().map(|(_, value)| value.clone()).collect(),
			Data::Array(items) => items.clone(),
		};

		items.into_iter()
	}

	/// Replaces this node's content with a copy of `value`.
	///
	/// Calling `set` on a detached node produced by a missed lookup links it (and every missing
	/// ancestor) into the tree, creating objects for key segments and arrays for index segments.
	pub fn set(&self, value: impl Into<UniValue>) {
		let value = value.into();

		if !self.ptr_eq(&value) {
			let plain = value.plain();

			self.replace(plain);
		}

		self.attach();
	}

	/// Sets `key` on this object, converting a non-object node into an object first.
	pub fn insert(&self, key: &str, value: impl Into<UniValue>) {
		self.get(key).set(value);
	}

	/// Appends `value` to this array.
	///
	/// `Null` becomes an empty array first; any other non-array node becomes the first element of a
	/// new array.
	pub fn push(&self, value: impl Into<UniValue>) {
		let plain = value.into().plain();

		if !matches!(self.kind(), ValueKind::Null | ValueKind::Array) {
			let previous = self.plain();

			self.replace(Plain::Array(vec![previous]));
		}

		{
			let weak = Arc::downgrade(&self.0);
			let mut node = self.0.write();

			match &mut node.data {
				Data::Array(items) => {
					let index = items.len();

					items.push(Self::materialize(plain, index.to_string(), weak));
				},
				data => *data = Data::Array(vec![Self::materialize(plain, "0".into(), weak)]),
			}
		}

		self.attach();
	}

	/// Removes `key` from this object, returning the detached value.
	pub fn remove(&self, key: &str) -> Option<UniValue> {
		let removed = {
			let mut node = self.0.write();

			match &mut node.data {
				Data::Object(entries) => entries
					.iter()
					.position(|(name, _)| name == key)
					.map(|position| entries.remove(position).1),
				_ => None,
			}
		};

		if let Some(value) = &removed {
			value.0.write().parent = Weak::new();
		}

		removed
	}

	/// Returns an independent copy of this subtree rooted at a new node.
	pub fn deep_clone(&self) -> UniValue {
		Self::materialize(self.plain(), ROOT_KEY.into(), Weak::new())
	}

	/// Canonical compact JSON rendering.
	pub fn to_json(&self) -> String {
		self.to_json_value().to_string()
	}

	/// Converts the tree into a [`serde_json::Value`].
	pub fn to_json_value(&self) -> serde_json::Value {
		self.plain().into_json()
	}

	/// Deserializes the tree into `T`, reporting the failing path on mismatch.
	pub fn deserialize_into<T>(&self) -> Result<T, FormatError>
	where
		T: serde::de::DeserializeOwned,
	{
		serde_path_to_error::deserialize(self.to_json_value()).map_err(FormatError::Deserialize)
	}

	fn root(plain: Plain) -> Self {
		Self::materialize(plain, ROOT_KEY.into(), Weak::new())
	}

	fn settle(result: Result<Self, FormatError>) -> (bool, Self) {
		match result {
			Ok(value) => (true, value),
			Err(_) => (false, Self::empty()),
		}
	}

	fn from_node(node: Node) -> Self {
		Self(Arc::new(RwLock::new(node)))
	}

	fn detached(&self, slot: Slot) -> UniValue {
		Self::from_node(Node {
			key: slot.label(),
			parent: Arc::downgrade(&self.0),
			pending: Some((self.0.clone(), slot)),
			data: Data::Null,
		})
	}

	fn materialize(plain: Plain, key: String, parent: Weak<RwLock<Node>>) -> Self {
		let value = Self::from_node(Node::linked(key, parent, Data::Null));
		let data = value.children_of(plain);

		value.0.write().data = data;

		value
	}

	fn children_of(&self, plain: Plain) -> Data {
		let weak = || Arc::downgrade(&self.0);

		match plain {
			Plain::Null => Data::Null,
			Plain::Scalar(scalar) => Data::Scalar(scalar),
			Plain::Object(entries) => Data::Object(
				entries
					.into_iter()
					.map(|(key, child)| (key.clone(), Self::materialize(child, key, weak())))
					.collect(),
			),
			Plain::Array(items) => Data::Array(
				items
					.into_iter()
					.enumerate()
					.map(|(index, child)| Self::materialize(child, index.to_string(), weak()))
					.collect(),
			),
		}
	}

	fn replace(&self, plain: Plain) {
		let data = self.children_of(plain);

		self.0.write().data = data;
	}

	fn attach(&self) {
		let pending = self.0.write().pending.take();

		if let Some((parent, slot)) = pending {
			let parent = Self(parent);

			parent.adopt(slot, self.clone());
			parent.attach();
		}
	}

	fn adopt(&self, slot: Slot, child: UniValue) {
		let weak = Arc::downgrade(&self.0);
		let mut node = self.0.write();

		match slot {
			Slot::Key(key) => {
				if !matches!(node.data, Data::Object(_)) {
					node.data = Data::Object(Vec::new());
				}
				if let Data::Object(entries) = &mut node.data {
					match entries.iter_mut().find(|(name, _)| *name == key) {
						Some(entry) => entry.1 = child,
						None => entries.push((key, child)),
					}
				}
			},
			Slot::Index(index) => {
				if !matches!(node.data, Data::Array(_)) {
					node.data = Data::Array(Vec::new());
				}
				if let Data::Array(items) = &mut node.data {
					while items.len() < index {
						let filler = items.len().to_string();

						items.push(Self::from_node(Node::linked(filler, weak.clone(), Data::Null)));
					}

					if index < items.len() {
						items[index] = child;
					} else {
						items.push(child);
					}
				}
			},
		}
	}

	fn plain(&self) -> Plain {
		match &self.0.read().data {
			Data::Null => Plain::Null,
			Data::Scalar(scalar) => Plain::Scalar(scalar.clone()),
			Data::Object(entries) => Plain::Object(
				entries.iter().map(|(key, value)| (key.clone(), value.plain())).collect(),
			),
			Data::Array(items) => Plain::Array(items.iter().map(UniValue::plain).collect()),
		}
	}
}
impl Clone for UniValue {
	fn clone(&self) -> Self {
		Self(Arc::clone(&self.0))
	}
}
impl Default for UniValue {
	fn default() -> Self {
		Self::empty()
	}
}
impl Debug for UniValue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("UniValue").field(&self.to_json()).finish()
	}
}
impl Display for UniValue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.scalar() {
			Some(scalar) => f.write_str(&scalar.text()),
			None if self.is_null() => Ok(()),
			None => f.write_str(&self.to_json()),
		}
	}
}
impl PartialEq for UniValue {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other) || self.to_json() == other.to_json()
	}
}
impl PartialEq<str> for UniValue {
	fn eq(&self, other: &str) -> bool {
		self.to_string() == other
	}
}
impl PartialEq<&str> for UniValue {
	fn eq(&self, other: &&str) -> bool {
		self.to_string() == *other
	}
}
impl<'a> IntoIterator for &'a UniValue {
	type IntoIter = std::vec::IntoIter<UniValue>;
	type Item = UniValue;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
impl FromStr for UniValue {
	type Err = FormatError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl Serialize for UniValue {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		self.to_json_value().serialize(serializer)
	}
}
impl<'de> Deserialize<'de> for UniValue {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		serde_json::Value::deserialize(deserializer).map(Self::from)
	}
}
impl From<serde_json::Value> for UniValue {
	fn from(value: serde_json::Value) -> Self {
		Self::root(Plain::from_json(value))
	}
}
impl From<&UniValue> for UniValue {
	fn from(value: &UniValue) -> Self {
		value.clone()
	}
}
impl From<Scalar> for UniValue {
	fn from(value: Scalar) -> Self {
		Self::root(Plain::Scalar(value))
	}
}
impl<T> From<Option<T>> for UniValue
where
	T: Into<UniValue>,
{
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or_default()
	}
}
impl<T> From<Vec<T>> for UniValue
where
	T: Into<UniValue>,
{
	fn from(values: Vec<T>) -> Self {
		Self::root(Plain::Array(values.into_iter().map(|value| value.into().plain()).collect()))
	}
}

macro_rules! impl_scalar_from {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for UniValue {
				fn from(value: $ty) -> Self {
					Self::from(Scalar::from(value))
				}
			}
		)*
	};
}

impl_scalar_from!(&str, String, bool, i32, i64, u32, u64, f64, OffsetDateTime);

struct Node {
	key: String,
	parent: Weak<RwLock<Node>>,
	// Strong link kept only while the node is a detached lookup miss.
	pending: Option<(NodeRef, Slot)>,
	data: Data,
}
impl Node {
	fn linked(key: String, parent: Weak<RwLock<Node>>, data: Data) -> Self {
		Self { key, parent, pending: None, data }
	}
}

enum Data {
	Null,
	Scalar(Scalar),
	Object(Vec<(String, UniValue)>),
	Array(Vec<UniValue>),
}

enum Slot {
	Key(String),
	Index(usize),
}
impl Slot {
	fn label(&self) -> String {
		match self {
			Slot::Key(key) => key.clone(),
			Slot::Index(index) => index.to_string(),
		}
	}
}

/// Link-free owned tree used while parsing and copying.
#[derive(Clone, Debug)]
pub(crate) enum Plain {
	Null,
	Scalar(Scalar),
	Object(Vec<(String, Plain)>),
	Array(Vec<Plain>),
}
impl Plain {
	pub(crate) fn text(value: impl Into<String>) -> Self {
		Self::Scalar(Scalar::String(value.into()))
	}

	/// Appends `value` under `key`, folding repeated keys into an array in arrival order.
	pub(crate) fn push_grouped(entries: &mut Vec<(String, Plain)>, key: String, value: Plain) {
		match entries.iter_mut().find(|(name, _)| *name == key) {
			Some((_, Plain::Array(items))) => items.push(value),
			Some((_, existing)) => {
				let first = std::mem::replace(existing, Plain::Null);

				*existing = Plain::Array(vec![first, value]);
			},
			None => entries.push((key, value)),
		}
	}

	fn from_json(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::Null => Plain::Null,
			serde_json::Value::Bool(flag) => Plain::Scalar(Scalar::Bool(flag)),
			serde_json::Value::Number(number) => Plain::Scalar(Scalar::Number(number)),
			serde_json::Value::String(text) => Plain::text(text),
			serde_json::Value::Array(items) =>
				Plain::Array(items.into_iter().map(Plain::from_json).collect()),
			serde_json::Value::Object(entries) => Plain::Object(
				entries.into_iter().map(|(key, value)| (key, Plain::from_json(value))).collect(),
			),
		}
	}

	fn into_json(self) -> serde_json::Value {
		match self {
			Plain::Null => serde_json::Value::Null,
			Plain::Scalar(scalar) => scalar.to_json_value(),
			Plain::Object(entries) => serde_json::Value::Object(
				entries.into_iter().map(|(key, value)| (key, value.into_json())).collect(),
			),
			Plain::Array(items) =>
				serde_json::Value::Array(items.into_iter().map(Plain::into_json).collect()),
		}
	}
}
