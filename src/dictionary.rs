// dictionary.rs - static RADIUS attribute dictionary
//
// Maps an attribute id to its name and semantic decoding type. This is a
// data table, not logic: see decode.rs for how a type is actually turned
// into a value.

/// Semantic type used to decode an attribute's raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// UTF-8 text, falling back to hex on invalid encoding.
    String,
    /// Big-endian unsigned 32-bit integer.
    Integer,
    /// Big-endian unsigned 64-bit integer.
    Integer64,
    /// Big-endian unsigned 32-bit seconds-since-epoch.
    Date,
    /// Four-byte dotted-quad IPv4 address.
    IpAddr,
    /// Sixteen-byte colon-hex IPv6 address.
    Ipv6Addr,
    /// `{reserved, prefix_len, prefix_bytes}` IPv6 prefix.
    Ipv6Prefix,
    /// Eight-byte colon-hex interface identifier.
    Ifid,
}

/// A dictionary entry: the attribute's canonical name and decoding type.
#[derive(Debug, Clone, Copy)]
pub struct AttributeDef {
    pub id: u8,
    pub name: &'static str,
    pub attr_type: AttributeType,
}

// Sorted by id so lookup() can binary-search. Covers the standard RFC 2865
// attribute space plus the IPv6 additions from RFC 3162.
const DICTIONARY: &[AttributeDef] = &[
    AttributeDef { id: 1, name: "User-Name", attr_type: AttributeType::String },
    AttributeDef { id: 2, name: "User-Password", attr_type: AttributeType::String },
    AttributeDef { id: 3, name: "CHAP-Password", attr_type: AttributeType::String },
    AttributeDef { id: 4, name: "NAS-IP-Address", attr_type: AttributeType::IpAddr },
    AttributeDef { id: 5, name: "NAS-Port", attr_type: AttributeType::Integer },
    AttributeDef { id: 6, name: "Service-Type", attr_type: AttributeType::Integer },
    AttributeDef { id: 7, name: "Framed-Protocol", attr_type: AttributeType::Integer },
    AttributeDef { id: 8, name: "Framed-IP-Address", attr_type: AttributeType::IpAddr },
    AttributeDef { id: 9, name: "Framed-IP-Netmask", attr_type: AttributeType::IpAddr },
    AttributeDef { id: 10, name: "Framed-Routing", attr_type: AttributeType::Integer },
    AttributeDef { id: 11, name: "Filter-Id", attr_type: AttributeType::String },
    AttributeDef { id: 12, name: "Framed-MTU", attr_type: AttributeType::Integer },
    AttributeDef { id: 13, name: "Framed-Compression", attr_type: AttributeType::Integer },
    AttributeDef { id: 14, name: "Login-IP-Host", attr_type: AttributeType::IpAddr },
    AttributeDef { id: 15, name: "Login-Service", attr_type: AttributeType::Integer },
    AttributeDef { id: 16, name: "Login-TCP-Port", attr_type: AttributeType::Integer },
    AttributeDef { id: 18, name: "Reply-Message", attr_type: AttributeType::String },
    AttributeDef { id: 19, name: "Callback-Number", attr_type: AttributeType::String },
    AttributeDef { id: 20, name: "Callback-Id", attr_type: AttributeType::String },
    AttributeDef { id: 22, name: "Framed-Route", attr_type: AttributeType::String },
    AttributeDef { id: 23, name: "Framed-IPX-Network", attr_type: AttributeType::Integer },
    AttributeDef { id: 24, name: "State", attr_type: AttributeType::String },
    AttributeDef { id: 25, name: "Class", attr_type: AttributeType::String },
    // id 26, Vendor-Specific, is deliberately absent: its value is a nested
    // sub-attribute structure, not a plain value of any AttributeType here,
    // and decode_attribute special-cases it before ever calling lookup().
    AttributeDef { id: 27, name: "Session-Timeout", attr_type: AttributeType::Integer },
    AttributeDef { id: 28, name: "Idle-Timeout", attr_type: AttributeType::Integer },
    AttributeDef { id: 29, name: "Termination-Action", attr_type: AttributeType::Integer },
    AttributeDef { id: 30, name: "Called-Station-Id", attr_type: AttributeType::String },
    AttributeDef { id: 31, name: "Calling-Station-Id", attr_type: AttributeType::String },
    AttributeDef { id: 32, name: "NAS-Identifier", attr_type: AttributeType::String },
    AttributeDef { id: 33, name: "Proxy-State", attr_type: AttributeType::String },
    AttributeDef { id: 34, name: "Login-LAT-Service", attr_type: AttributeType::String },
    AttributeDef { id: 35, name: "Login-LAT-Node", attr_type: AttributeType::String },
    AttributeDef { id: 36, name: "Login-LAT-Group", attr_type: AttributeType::String },
    AttributeDef { id: 37, name: "Framed-AppleTalk-Link", attr_type: AttributeType::Integer },
    AttributeDef { id: 38, name: "Framed-AppleTalk-Network", attr_type: AttributeType::Integer },
    AttributeDef { id: 39, name: "Framed-AppleTalk-Zone", attr_type: AttributeType::String },
    AttributeDef { id: 40, name: "Acct-Status-Type", attr_type: AttributeType::Integer },
    AttributeDef { id: 55, name: "Event-Timestamp", attr_type: AttributeType::Date },
    AttributeDef { id: 60, name: "CHAP-Challenge", attr_type: AttributeType::String },
    AttributeDef { id: 61, name: "NAS-Port-Type", attr_type: AttributeType::Integer },
    AttributeDef { id: 62, name: "Port-Limit", attr_type: AttributeType::Integer },
    AttributeDef { id: 63, name: "Login-LAT-Port", attr_type: AttributeType::String },
    AttributeDef { id: 77, name: "Connect-Info", attr_type: AttributeType::String },
    AttributeDef { id: 80, name: "Message-Authenticator", attr_type: AttributeType::String },
    AttributeDef { id: 87, name: "NAS-Port-Id", attr_type: AttributeType::String },
    AttributeDef { id: 95, name: "NAS-IPv6-Address", attr_type: AttributeType::Ipv6Addr },
    AttributeDef { id: 96, name: "Framed-Interface-Id", attr_type: AttributeType::Ifid },
    AttributeDef { id: 97, name: "Framed-IPv6-Prefix", attr_type: AttributeType::Ipv6Prefix },
];

/// Looks up an attribute id in the standard dictionary.
///
/// Returns `None` for ids outside the table; callers decode those as
/// `Unknown-Attribute-<id>` with a hex value.
pub fn lookup(id: u8) -> Option<AttributeDef> {
    DICTIONARY.binary_search_by_key(&id, |def| def.id).ok().map(|idx| DICTIONARY[idx])
}
