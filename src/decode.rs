// decode.rs - turns (id, raw bytes) into typed, decoded RADIUS attributes.
//
// Paired with dictionary.rs: the dictionary says *what kind* of value an
// attribute id holds, this module says *how* to turn bytes into that value.

use serde::Serialize;

use crate::dictionary::{self, AttributeType};

/// One nested sub-attribute inside a Vendor-Specific (26) payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorSubAttribute {
    pub vendor_type: u8,
    pub value_hex: String,
}

/// The decoded value of an attribute, tagged by how it was interpreted.
///
/// Fallback strings (`"0.0.0.0"`, `"::"`, hex) are the literal defaults
/// used for malformed fixed-width attributes, so callers can match on the
/// variant without re-deriving those defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum AttributeValue {
    String(String),
    Integer(u32),
    Integer64(u64),
    /// Seconds since the Unix epoch, as an RFC 3339 string for display.
    Date(chrono::DateTime<chrono::Utc>),
    IpAddr(String),
    Ipv6Addr(String),
    Ipv6Prefix(String),
    Ifid(String),
    VendorSubAttributes(Vec<VendorSubAttribute>),
    /// Hex of the raw attribute bytes: used for unknown ids and for any
    /// attribute whose payload doesn't fit its declared type.
    Raw(String),
}

/// A single decoded attribute from a RADIUS response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedAttribute {
    pub id: u8,
    pub name: String,
    /// Populated only for Vendor-Specific (26).
    pub vendor_id: Option<u32>,
    pub value: AttributeValue,
    pub raw_hex: String,
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

fn format_ipv6_no_compression(bytes: &[u8; 16]) -> String {
    let mut groups = [0u16; 8];
    for (i, group) in groups.iter_mut().enumerate() {
        *group = u16::from_be_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
    }
    groups.iter().map(|g| format!("{:x}", g)).collect::<Vec<_>>().join(":")
}

fn format_ifid(bytes: &[u8; 8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(":")
}

/// Decodes one attribute's value according to its dictionary-defined type.
///
/// Never fails: an id outside the dictionary, or a payload that doesn't
/// match its type's expected width, falls back to a fixed default rather
/// than raising an error, so a malformed attribute never aborts decoding
/// of the rest of the response.
pub fn decode_attribute(id: u8, raw: &[u8]) -> DecodedAttribute {
    let raw_hex = to_hex(raw);

    if id == 26 {
        return decode_vendor_specific(raw, raw_hex);
    }

    let Some(def) = dictionary::lookup(id) else {
        return DecodedAttribute {
            id,
            name: format!("Unknown-Attribute-{}", id),
            vendor_id: None,
            value: AttributeValue::Raw(raw_hex.clone()),
            raw_hex,
        };
    };

    let value = match def.attr_type {
        AttributeType::String => match std::str::from_utf8(raw) {
            Ok(s) => AttributeValue::String(s.to_string()),
            Err(_) => AttributeValue::Raw(raw_hex.clone()),
        },
        AttributeType::Integer => {
            if raw.len() == 4 {
                AttributeValue::Integer(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
            } else {
                AttributeValue::Integer(0)
            }
        }
        AttributeType::Integer64 => {
            if raw.len() == 8 {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(raw);
                AttributeValue::Integer64(u64::from_be_bytes(buf))
            } else {
                AttributeValue::Integer64(0)
            }
        }
        AttributeType::Date => {
            let secs = if raw.len() == 4 {
                u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])
            } else {
                0
            };
            let dt = chrono::DateTime::from_timestamp(secs as i64, 0)
                .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).expect("epoch is valid"));
            AttributeValue::Date(dt)
        }
        AttributeType::IpAddr => {
            if raw.len() == 4 {
                AttributeValue::IpAddr(format!("{}.{}.{}.{}", raw[0], raw[1], raw[2], raw[3]))
            } else {
                AttributeValue::IpAddr("0.0.0.0".to_string())
            }
        }
        AttributeType::Ipv6Addr => {
            if raw.len() == 16 {
                let mut buf = [0u8; 16];
                buf.copy_from_slice(raw);
                AttributeValue::Ipv6Addr(format_ipv6_no_compression(&buf))
            } else {
                AttributeValue::Ipv6Addr("::".to_string())
            }
        }
        AttributeType::Ipv6Prefix => AttributeValue::Ipv6Prefix(decode_ipv6_prefix(raw, &raw_hex)),
        AttributeType::Ifid => {
            if raw.len() == 8 {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(raw);
                AttributeValue::Ifid(format_ifid(&buf))
            } else {
                AttributeValue::Raw(raw_hex.clone())
            }
        }
    };

    DecodedAttribute { id, name: def.name.to_string(), vendor_id: None, value, raw_hex }
}

fn decode_ipv6_prefix(raw: &[u8], raw_hex: &str) -> String {
    if raw.len() < 2 {
        return raw_hex.to_string();
    }
    let prefix_length = raw[1];
    let prefix_bytes = &raw[2..];
    let mut padded = [0u8; 16];
    let n = prefix_bytes.len().min(16);
    padded[..n].copy_from_slice(&prefix_bytes[..n]);
    format!("{}/{}", format_ipv6_no_compression(&padded), prefix_length)
}

fn decode_vendor_specific(payload: &[u8], raw_hex: String) -> DecodedAttribute {
    if payload.len() < 4 {
        return DecodedAttribute {
            id: 26,
            name: "Vendor-Specific".to_string(),
            vendor_id: None,
            value: AttributeValue::Raw(raw_hex.clone()),
            raw_hex,
        };
    }

    let vendor_id = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let remainder = &payload[4..];

    let mut subs = Vec::new();
    let mut offset = 0;
    let mut clean = !remainder.is_empty();
    while offset < remainder.len() {
        if offset + 2 > remainder.len() {
            clean = false;
            break;
        }
        let sub_type = remainder[offset];
        let sub_len = remainder[offset + 1] as usize;
        if sub_len < 2 || offset + sub_len > remainder.len() {
            clean = false;
            break;
        }
        let sub_value = &remainder[offset + 2..offset + sub_len];
        subs.push(VendorSubAttribute { vendor_type: sub_type, value_hex: to_hex(sub_value) });
        offset += sub_len;
    }
    clean = clean && offset == remainder.len() && !subs.is_empty();

    let value = if clean {
        AttributeValue::VendorSubAttributes(subs)
    } else {
        tracing::debug!(vendor_id, "Vendor-Specific payload did not parse as clean sub-attributes");
        AttributeValue::Raw(to_hex(remainder))
    };

    DecodedAttribute {
        id: 26,
        name: "Vendor-Specific".to_string(),
        vendor_id: Some(vendor_id),
        value,
        raw_hex,
    }
}

/// Walks a response's attribute section into `(id, raw value)` pairs,
/// stopping at the first attribute that doesn't fit cleanly within `data`.
///
/// A truncated final attribute, or one with `length < 2`, stops the walk
/// without panicking and without discarding attributes already seen.
/// Exposed separately from [`decode_attributes`] because assignment
/// extraction needs the raw bytes of the target attribute, not just its
/// decoded value.
pub fn walk_attributes(data: &[u8]) -> Vec<(u8, &[u8])> {
    let mut attrs = Vec::new();
    let mut offset = 0;

    while offset + 2 <= data.len() {
        let attr_type = data[offset];
        let attr_len = data[offset + 1] as usize;

        if attr_len < 2 || offset + attr_len > data.len() {
            break;
        }

        attrs.push((attr_type, &data[offset + 2..offset + attr_len]));
        offset += attr_len;
    }

    attrs
}

/// Walks a response's attribute section, decoding every attribute that fits
/// cleanly within `data` and stopping at the first one that doesn't.
pub fn decode_attributes(data: &[u8]) -> Vec<DecodedAttribute> {
    walk_attributes(data).into_iter().map(|(id, raw)| decode_attribute(id, raw)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trips() {
        let decoded = decode_attribute(27, &42u32.to_be_bytes());
        assert_eq!(decoded.value, AttributeValue::Integer(42));
        let decoded_again = decode_attribute(27, &42u32.to_be_bytes());
        assert_eq!(decoded, decoded_again);
    }

    #[test]
    fn malformed_integer_defaults_to_zero() {
        let decoded = decode_attribute(27, &[1, 2, 3]);
        assert_eq!(decoded.value, AttributeValue::Integer(0));
    }

    #[test]
    fn unknown_attribute_uses_placeholder_name_and_hex() {
        let decoded = decode_attribute(250, &[0xde, 0xad]);
        assert_eq!(decoded.name, "Unknown-Attribute-250");
        assert_eq!(decoded.value, AttributeValue::Raw("dead".to_string()));
    }

    #[test]
    fn vendor_specific_sub_attributes_round_trip() {
        let mut payload = 9u32.to_be_bytes().to_vec();
        payload.extend_from_slice(&[1, 4, 0x41, 0x42]); // type=1, len=4, value=AB
        let decoded = decode_attribute(26, &payload);
        assert_eq!(decoded.vendor_id, Some(9));
        match &decoded.value {
            AttributeValue::VendorSubAttributes(subs) => {
                assert_eq!(subs.len(), 1);
                assert_eq!(subs[0].vendor_type, 1);
                assert_eq!(subs[0].value_hex, "4142");
            }
            other => panic!("expected vendor sub-attributes, got {:?}", other),
        }
    }

    #[test]
    fn vendor_specific_unparseable_payload_falls_back_to_hex() {
        let mut payload = 9u32.to_be_bytes().to_vec();
        payload.extend_from_slice(&[1]); // truncated sub-attribute header
        let decoded = decode_attribute(26, &payload);
        assert_eq!(decoded.vendor_id, Some(9));
        assert!(matches!(decoded.value, AttributeValue::Raw(_)));
    }

    #[test]
    fn ipv6_prefix_pads_and_suffixes_length() {
        let mut payload = vec![0u8, 64]; // reserved, prefix_length=64
        payload.extend_from_slice(&[0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0]); // 8 bytes of data
        let decoded = decode_attribute(97, &payload);
        assert_eq!(decoded.value, AttributeValue::Ipv6Prefix("2001:db8:0:0:0:0:0:0/64".to_string()));
    }

    #[test]
    fn ipv6_addr_has_no_zero_compression() {
        let mut bytes = [0u8; 16];
        bytes[15] = 1;
        let decoded = decode_attribute(95, &bytes);
        assert_eq!(decoded.value, AttributeValue::Ipv6Addr("0:0:0:0:0:0:0:1".to_string()));
    }

    #[test]
    fn attribute_walk_truncates_at_overrun_attribute() {
        // One valid Integer(27) attribute, then a second attribute claiming
        // a length that runs past the buffer end.
        let mut data = vec![27, 6];
        data.extend_from_slice(&99u32.to_be_bytes());
        data.push(11); // type
        data.push(200); // length claims 200 bytes, far beyond what's left
        data.push(0); // one stray byte

        let attrs = decode_attributes(&data);
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value, AttributeValue::Integer(99));
    }

    #[test]
    fn attribute_walk_stops_cleanly_on_short_length() {
        let mut data = vec![27, 6];
        data.extend_from_slice(&99u32.to_be_bytes());
        data.push(11); // type
        data.push(1); // length < 2, invalid

        let attrs = decode_attributes(&data);
        assert_eq!(attrs.len(), 1);
    }
}
