use std::fmt;

use inetnum::addr::Prefix;
use serde_derive::{Deserialize, Serialize};

//------------ PrefixRecord --------------------------------------------------

/// An owned `(prefix, value)` pair, as produced by the collecting iterators
/// and by deserialization.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PrefixRecord<V> {
    #[serde(with = "prefix_string")]
    pub prefix: Prefix,
    pub value: V,
}

impl<V> PrefixRecord<V> {
    pub fn new(prefix: Prefix, value: V) -> Self {
        Self { prefix, value }
    }
}

impl<V> From<(Prefix, V)> for PrefixRecord<V> {
    fn from((prefix, value): (Prefix, V)) -> Self {
        Self { prefix, value }
    }
}

impl<V: fmt::Display> fmt::Display for PrefixRecord<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.prefix, self.value)
    }
}

//------------ prefix_string -------------------------------------------------

// Prefixes travel through serde in their canonical textual form; inetnum
// provides both directions via Display and FromStr.
pub(crate) mod prefix_string {
    use inetnum::addr::Prefix;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        prefix: &Prefix,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(prefix)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Prefix, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
