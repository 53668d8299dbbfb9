//! FlatEvent - Ingestion input
//!
//! The abbreviated, flat record a webhook caller posts to `/webhook`.

use std::borrow::Cow;
use std::fmt;

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Flat event record as received on the wire
///
/// Every field is an optional string. Decoding is lenient the way a
/// webhook caller expects:
/// - missing fields and `null` values leave the field empty (or unchanged)
/// - field names match ASCII case-insensitively
/// - a repeated field keeps the last value
/// - unknown fields are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlatEvent {
    /// Event name
    pub ev: String,
    /// Event type
    pub et: String,
    /// Application id
    pub id: String,
    /// User id
    pub uid: String,
    /// Message id
    pub mid: String,
    /// Page title
    pub t: String,
    /// Page url
    pub p: String,
    /// Browser language
    pub l: String,
    /// Screen size
    pub sc: String,

    pub atrk1: String,
    pub atrv1: String,
    pub atrt1: String,
    pub atrk2: String,
    pub atrv2: String,
    pub atrt2: String,

    pub uatrk1: String,
    pub uatrv1: String,
    pub uatrt1: String,
    pub uatrk2: String,
    pub uatrv2: String,
    pub uatrt2: String,
    pub uatrk3: String,
    pub uatrv3: String,
    pub uatrt3: String,
}

/// Number of attribute triples carried by a [`FlatEvent`]
pub const ATTRIBUTE_SLOTS: usize = 2;

/// Number of trait triples carried by a [`FlatEvent`]
pub const TRAIT_SLOTS: usize = 3;

/// One `(key, value, type)` group borrowed from a [`FlatEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triple<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub kind: &'a str,
}

impl<'a> Triple<'a> {
    fn new(key: &'a str, value: &'a str, kind: &'a str) -> Self {
        Self { key, value, kind }
    }
}

impl FlatEvent {
    /// Decode a request body
    ///
    /// Only the first JSON value is read, anything after it is ignored. A
    /// top-level `null` decodes to an empty record.
    ///
    /// # Errors
    /// Empty body, malformed JSON, a non-object top level, or a non-string
    /// value in a known field.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let mut values = serde_json::Deserializer::from_slice(body).into_iter::<Option<Self>>();
        match values.next() {
            Some(decoded) => decoded.map(Option::unwrap_or_default),
            None => Err(de::Error::custom("empty request body")),
        }
    }

    /// Field slot for a wire name, matched ASCII case-insensitively
    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        let slot = match name.to_ascii_lowercase().as_str() {
            "ev" => &mut self.ev,
            "et" => &mut self.et,
            "id" => &mut self.id,
            "uid" => &mut self.uid,
            "mid" => &mut self.mid,
            "t" => &mut self.t,
            "p" => &mut self.p,
            "l" => &mut self.l,
            "sc" => &mut self.sc,
            "atrk1" => &mut self.atrk1,
            "atrv1" => &mut self.atrv1,
            "atrt1" => &mut self.atrt1,
            "atrk2" => &mut self.atrk2,
            "atrv2" => &mut self.atrv2,
            "atrt2" => &mut self.atrt2,
            "uatrk1" => &mut self.uatrk1,
            "uatrv1" => &mut self.uatrv1,
            "uatrt1" => &mut self.uatrt1,
            "uatrk2" => &mut self.uatrk2,
            "uatrv2" => &mut self.uatrv2,
            "uatrt2" => &mut self.uatrt2,
            "uatrk3" => &mut self.uatrk3,
            "uatrv3" => &mut self.uatrv3,
            "uatrt3" => &mut self.uatrt3,
            _ => return None,
        };
        Some(slot)
    }

    /// Attribute triples in slot order
    pub fn attribute_triples(&self) -> [Triple<'_>; ATTRIBUTE_SLOTS] {
        [
            Triple::new(&self.atrk1, &self.atrv1, &self.atrt1),
            Triple::new(&self.atrk2, &self.atrv2, &self.atrt2),
        ]
    }

    /// Trait triples in slot order
    pub fn trait_triples(&self) -> [Triple<'_>; TRAIT_SLOTS] {
        [
            Triple::new(&self.uatrk1, &self.uatrv1, &self.uatrt1),
            Triple::new(&self.uatrk2, &self.uatrv2, &self.uatrt2),
            Triple::new(&self.uatrk3, &self.uatrv3, &self.uatrt3),
        ]
    }
}

impl<'de> Deserialize<'de> for FlatEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(FlatEventVisitor)
    }
}

struct FlatEventVisitor;

impl<'de> Visitor<'de> for FlatEventVisitor {
    type Value = FlatEvent;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object of string fields")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut event = FlatEvent::default();
        while let Some(key) = map.next_key::<Cow<'de, str>>()? {
            match event.field_mut(&key) {
                // null keeps whatever an earlier occurrence set
                Some(slot) => {
                    if let Some(value) = map.next_value::<Option<String>>()? {
                        *slot = value;
                    }
                }
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let event = FlatEvent::from_json_slice(br#"{"ev":"click"}"#).unwrap();
        assert_eq!(event.ev, "click");
        assert_eq!(event.uid, "");
        assert_eq!(event.uatrt3, "");
    }

    #[test]
    fn test_null_and_unknown_fields() {
        let event =
            FlatEvent::from_json_slice(br#"{"ev":null,"et":"track","extra":[1,2,3]}"#).unwrap();
        assert_eq!(event.ev, "");
        assert_eq!(event.et, "track");
    }

    #[test]
    fn test_non_string_value_is_rejected() {
        assert!(FlatEvent::from_json_slice(br#"{"ev":42}"#).is_err());
    }

    #[test]
    fn test_malformed_bodies_are_rejected() {
        assert!(FlatEvent::from_json_slice(b"").is_err());
        assert!(FlatEvent::from_json_slice(b"{\"ev\":").is_err());
        assert!(FlatEvent::from_json_slice(b"[]").is_err());
    }

    #[test]
    fn test_repeated_field_keeps_last_value() {
        let event = FlatEvent::from_json_slice(br#"{"ev":"a","ev":"b"}"#).unwrap();
        assert_eq!(event.ev, "b");

        let event = FlatEvent::from_json_slice(br#"{"ev":"a","ev":null}"#).unwrap();
        assert_eq!(event.ev, "a");
    }

    #[test]
    fn test_field_names_match_case_insensitively() {
        let event = FlatEvent::from_json_slice(br#"{"EV":"click","Atrk1":"color","uAtRv3":"x"}"#)
            .unwrap();
        assert_eq!(event.ev, "click");
        assert_eq!(event.atrk1, "color");
        assert_eq!(event.uatrv3, "x");
    }

    #[test]
    fn test_trailing_data_is_ignored() {
        let event = FlatEvent::from_json_slice(br#"{"ev":"a"} trailing {"ev":"b"}"#).unwrap();
        assert_eq!(event.ev, "a");
    }

    #[test]
    fn test_top_level_null_is_empty_record() {
        let event = FlatEvent::from_json_slice(b"null").unwrap();
        assert_eq!(event, FlatEvent::default());
    }

    #[test]
    fn test_whitespace_only_body_is_rejected() {
        assert!(FlatEvent::from_json_slice(b"  \n").is_err());
    }

    #[test]
    fn test_serializes_lowercase_wire_names() {
        let event = FlatEvent {
            ev: "click".into(),
            uatrt3: "string".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["ev"], "click");
        assert_eq!(json["uatrt3"], "string");
        let back: FlatEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_triples_follow_slot_order() {
        let event = FlatEvent {
            atrk1: "color".into(),
            atrv1: "red".into(),
            atrt1: "string".into(),
            uatrk3: "plan".into(),
            ..Default::default()
        };

        let attrs = event.attribute_triples();
        assert_eq!(attrs[0], Triple::new("color", "red", "string"));
        assert_eq!(attrs[1], Triple::new("", "", ""));

        let traits = event.trait_triples();
        assert_eq!(traits[2].key, "plan");
    }
}
