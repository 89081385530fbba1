//! The recursively typed value model for cached cloud documents.

/// A decoded document field value.
///
/// The cache stores open-ended field bags; this tagged union is the only
/// shape they ever take inside the workspace — untyped dictionaries never
/// appear. Maps and arrays nest arbitrarily but are bounded by record size.
#[derive(Debug, Clone, PartialEq)]
pub enum FirestoreValue {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Null,
    Timestamp { seconds: i64, nanos: i32 },
    GeoPoint { lat: f64, lon: f64 },
    /// A path reference to another document.
    Reference(String),
    /// Raw bytes; also the graceful fallback for unrecognized value tags.
    Bytes(Vec<u8>),
    Map(FieldMap),
    Array(Vec<FirestoreValue>),
}

impl FirestoreValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FirestoreValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view: doubles as-is, integers widened.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FirestoreValue::Double(d) => Some(*d),
            FirestoreValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FirestoreValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FirestoreValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&FieldMap> {
        match self {
            FirestoreValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Short tag name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            FirestoreValue::String(_) => "string",
            FirestoreValue::Integer(_) => "integer",
            FirestoreValue::Double(_) => "double",
            FirestoreValue::Boolean(_) => "boolean",
            FirestoreValue::Null => "null",
            FirestoreValue::Timestamp { .. } => "timestamp",
            FirestoreValue::GeoPoint { .. } => "geopoint",
            FirestoreValue::Reference(_) => "reference",
            FirestoreValue::Bytes(_) => "bytes",
            FirestoreValue::Map(_) => "map",
            FirestoreValue::Array(_) => "array",
        }
    }
}

/// An insertion-ordered name → value mapping with unique keys.
///
/// Used both for a document's top-level fields and for nested map values.
/// Field counts are small, so lookups are linear scans.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMap {
    entries: Vec<(String, FirestoreValue)>,
}

impl FieldMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, replacing any existing value under the same name so
    /// keys stay unique.
    pub fn insert(&mut self, name: impl Into<String>, value: FirestoreValue) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FirestoreValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// First present value among `names`, in priority order. This is how
    /// synonym chains (`account_type` ← `type` ← `original_type`) resolve.
    #[must_use]
    pub fn get_any<'a>(&'a self, names: &[&str]) -> Option<&'a FirestoreValue> {
        names.iter().find_map(|n| self.get(n))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FirestoreValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl FromIterator<(String, FirestoreValue)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, FirestoreValue)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}
