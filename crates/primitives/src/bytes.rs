use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A thin wrapper around a collection of bytes. Provides hex debug
/// formatting so byte blobs stay readable in logs and error messages.
#[derive(Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Bytes<T>(pub T);

impl AsRef<[u8]> for Bytes<Vec<u8>> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl<const N: usize> AsRef<[u8]> for Bytes<[u8; N]> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<T> std::fmt::Debug for Bytes<T>
where
    T: AsRef<[u8]>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl<T> From<T> for Bytes<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl From<Bytes<Vec<u8>>> for Vec<u8> {
    fn from(value: Bytes<Vec<u8>>) -> Self {
        value.0
    }
}

impl<const N: usize> From<Bytes<[u8; N]>> for [u8; N] {
    fn from(value: Bytes<[u8; N]>) -> Self {
        value.0
    }
}

impl Bytes<Vec<u8>> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Serialize for Bytes<T>
where
    T: AsRef<[u8]>,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(&self.0)))
    }
}

impl<'de> Deserialize<'de> for Bytes<Vec<u8>> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map(Bytes).map_err(serde::de::Error::custom)
    }
}
