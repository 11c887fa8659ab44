//! Payload-Kodierung fuer binaere Daten
//!
//! Audiodaten reisen als Base64-String innerhalb der JSON-Nachrichten.
//! Dieses Modul stellt den serde-Adapter dafuer bereit.

/// serde-Adapter: `Bytes` <-> Base64-String
///
/// Verwendung: `#[serde(with = "encoding::base64_bytes")]`
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(daten: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(daten))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let kodiert = String::deserialize(deserializer)?;
        STANDARD
            .decode(kodiert.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Huelle {
        #[serde(with = "super::base64_bytes")]
        daten: Bytes,
    }

    #[test]
    fn base64_hin_und_zurueck() {
        let original = Huelle {
            daten: Bytes::from_static(&[0x01, 0x02, 0xff]),
        };
        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains("AQL/"), "Base64 von [1,2,255] erwartet: {json}");

        let dekodiert: Huelle = serde_json::from_str(&json).unwrap();
        assert_eq!(dekodiert.daten.as_ref(), &[0x01, 0x02, 0xff]);
    }

    #[test]
    fn ungueltiges_base64_wird_abgelehnt() {
        let ergebnis: Result<Huelle, _> = serde_json::from_str(r#"{"daten":"%%%"}"#);
        assert!(ergebnis.is_err());
    }
}
