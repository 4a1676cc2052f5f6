// protocol.rs - one Access-Request/Access-Response UDP transaction.
//
// Builds a PAP Access-Request with a Message-Authenticator, sends it to a
// single host, and validates/decodes whatever comes back. Knows nothing
// about pools or failover; callers (failover.rs) pick the host.

use std::net::Ipv4Addr;
use std::time::Duration;

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use rand::{Rng, RngCore};
use regex::Regex;
use serde::Serialize;
use tokio::net::UdpSocket;

use crate::decode::{decode_attribute, to_hex, walk_attributes, DecodedAttribute};
use crate::error::{AuthError, ClientError};

type HmacMd5 = Hmac<Md5>;

const MAX_PACKET_SIZE: usize = 4096;

const CODE_ACCESS_REQUEST: u8 = 1;
const CODE_ACCESS_ACCEPT: u8 = 2;
const CODE_ACCESS_REJECT: u8 = 3;
const CODE_ACCESS_CHALLENGE: u8 = 11;

const ATTR_USER_NAME: u8 = 1;
const ATTR_USER_PASSWORD: u8 = 2;
const ATTR_NAS_IP_ADDRESS: u8 = 4;
const ATTR_NAS_PORT: u8 = 5;
const ATTR_MESSAGE_AUTHENTICATOR: u8 = 80;
const ATTR_VENDOR_SPECIFIC: u8 = 26;

/// Per-transaction options, resolved once from `ClientConfig` by the façade
/// and reused across calls, so `value_pattern` is compiled a single time
/// rather than once per authentication attempt.
#[derive(Clone)]
pub struct AuthOptions {
    pub secret: Vec<u8>,
    pub port: u16,
    pub timeout: Duration,
    pub assignment_attribute_id: u8,
    pub vendor_id: Option<u32>,
    pub vendor_type: Option<u8>,
    pub value_pattern: Option<Regex>,
}

impl AuthOptions {
    pub fn new(
        secret: Vec<u8>,
        port: u16,
        timeout: Duration,
        assignment_attribute_id: u8,
        vendor_id: Option<u32>,
        vendor_type: Option<u8>,
        value_pattern: Option<&str>,
    ) -> Result<Self, ClientError> {
        let value_pattern = value_pattern.map(Regex::new).transpose()?;
        Ok(Self {
            secret,
            port,
            timeout,
            assignment_attribute_id,
            vendor_id,
            vendor_type,
            value_pattern,
        })
    }
}

/// The result of one `authenticate` call.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    pub ok: bool,
    pub class: Option<String>,
    pub attributes: Option<Vec<DecodedAttribute>>,
    pub raw_hex: Option<String>,
    pub error: Option<AuthError>,
}

impl AuthOutcome {
    fn failure(error: AuthError, raw_hex: Option<String>) -> Self {
        Self { ok: false, class: None, attributes: None, raw_hex, error: Some(error) }
    }
}

/// RFC 2865 §5.2 PAP obfuscation: `P_i XOR MD5(secret || prev-block)`, with
/// `prev-block` seeded by the request authenticator for the first block.
/// An empty password still obfuscates one all-zero 16-byte block.
fn pap_obfuscate(secret: &[u8], request_authenticator: &[u8; 16], password: &[u8]) -> Vec<u8> {
    let block_len = if password.is_empty() { 16 } else { password.len().div_ceil(16) * 16 };
    let mut padded = vec![0u8; block_len];
    padded[..password.len()].copy_from_slice(password);

    let mut result = Vec::with_capacity(block_len);
    let mut prev = request_authenticator.to_vec();
    for chunk in padded.chunks(16) {
        let mut hasher = Md5::new();
        hasher.update(secret);
        hasher.update(&prev);
        let digest = hasher.finalize();
        let cipher: Vec<u8> = chunk.iter().zip(digest.iter()).map(|(p, b)| p ^ b).collect();
        result.extend_from_slice(&cipher);
        prev = cipher;
    }
    result
}

fn encode_attribute(buf: &mut Vec<u8>, attr_type: u8, value: &[u8]) {
    buf.push(attr_type);
    buf.push((value.len() + 2) as u8);
    buf.extend_from_slice(value);
}

/// Builds a complete Access-Request, including a real Message-Authenticator
/// HMAC computed over the packet with that attribute's value zeroed, per
/// RFC 2869 §5.14.
fn build_access_request(
    identifier: u8,
    request_authenticator: &[u8; 16],
    secret: &[u8],
    user: &str,
    password: &str,
) -> Vec<u8> {
    let mut attrs = Vec::new();
    encode_attribute(&mut attrs, ATTR_USER_NAME, user.as_bytes());

    let obfuscated = pap_obfuscate(secret, request_authenticator, password.as_bytes());
    encode_attribute(&mut attrs, ATTR_USER_PASSWORD, &obfuscated);

    encode_attribute(&mut attrs, ATTR_NAS_IP_ADDRESS, &Ipv4Addr::new(127, 0, 0, 1).octets());
    encode_attribute(&mut attrs, ATTR_NAS_PORT, &0u32.to_be_bytes());

    let message_authenticator_offset = attrs.len();
    encode_attribute(&mut attrs, ATTR_MESSAGE_AUTHENTICATOR, &[0u8; 16]);

    let total_len = 20 + attrs.len();
    let mut packet = Vec::with_capacity(total_len);
    packet.push(CODE_ACCESS_REQUEST);
    packet.push(identifier);
    packet.extend_from_slice(&(total_len as u16).to_be_bytes());
    packet.extend_from_slice(request_authenticator);
    packet.extend_from_slice(&attrs);

    match HmacMd5::new_from_slice(secret) {
        Ok(mut mac) => {
            mac.update(&packet);
            let tag = mac.finalize().into_bytes();
            let value_offset = 20 + message_authenticator_offset + 2;
            packet[value_offset..value_offset + 16].copy_from_slice(&tag);
        }
        Err(error) => {
            // Non-fatal at send time: a server that checks the attribute
            // will reject; one that doesn't never notices.
            tracing::warn!(%error, "could not compute Message-Authenticator, sending zeroed value");
        }
    }

    packet
}

/// RFC 2865 §3: `MD5(code + id + length + request-authenticator + attributes + secret)`.
fn compute_response_authenticator(
    code: u8,
    identifier: u8,
    length: u16,
    request_authenticator: &[u8; 16],
    attributes: &[u8],
    secret: &[u8],
) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update([code, identifier]);
    hasher.update(length.to_be_bytes());
    hasher.update(request_authenticator);
    hasher.update(attributes);
    hasher.update(secret);
    let digest = hasher.finalize();
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest);
    out
}

/// Extracts the configured assignment attribute's value from the raw
/// attribute list, honoring first-match-wins and the two distinct
/// Vendor-Specific parsing rules (plain string vs. vendor-id/vendor-type
/// gated sub-attribute).
fn extract_assignment(raw_attrs: &[(u8, &[u8])], options: &AuthOptions) -> Option<String> {
    for (id, raw) in raw_attrs {
        if *id != options.assignment_attribute_id {
            continue;
        }

        let candidate = if *id == ATTR_VENDOR_SPECIFIC {
            match (options.vendor_id, options.vendor_type) {
                (Some(vendor_id), Some(vendor_type)) => {
                    extract_vendor_assignment(raw, vendor_id, vendor_type)
                }
                _ => std::str::from_utf8(raw).ok().map(str::to_string),
            }
        } else {
            std::str::from_utf8(raw).ok().map(str::to_string)
        };

        let Some(candidate) = candidate else { continue };

        let value = match &options.value_pattern {
            Some(pattern) => pattern
                .captures(&candidate)
                .and_then(|captures| captures.get(1))
                .map(|m| m.as_str().to_string()),
            None => Some(candidate),
        };

        if value.is_some() {
            return value;
        }
    }
    None
}

/// Fixed single-sub-attribute Vendor-Specific parse used only for
/// assignment extraction: `{vendor-id:4}{vendor-type:1}{vendor-length:1}{value}`,
/// distinct from the general repeated-sub-attribute walk in decode.rs.
fn extract_vendor_assignment(raw: &[u8], expected_vendor_id: u32, expected_vendor_type: u8) -> Option<String> {
    if raw.len() < 6 {
        return None;
    }
    let vendor_id = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
    let vendor_type = raw[4];
    let vendor_length = raw[5] as usize;
    if vendor_id != expected_vendor_id || vendor_type != expected_vendor_type {
        return None;
    }
    if vendor_length < 2 || 6 + (vendor_length - 2) > raw.len() {
        return None;
    }
    std::str::from_utf8(&raw[6..6 + (vendor_length - 2)]).ok().map(str::to_string)
}

/// Performs one Access-Request/Access-Response transaction against `host`.
///
/// Opens a fresh socket, sends once, waits up to `options.timeout` for a
/// reply, and classifies the result. Never retransmits.
/// Socket-level errors and HMAC faults propagate as `ClientError`; a
/// timeout, short/garbled response, or authenticator mismatch are outcomes,
/// not faults, and come back as `Ok(AuthOutcome { error: Some(_), .. })`.
pub async fn authenticate(
    host: &str,
    user: &str,
    password: &str,
    options: &AuthOptions,
) -> Result<AuthOutcome, ClientError> {
    let identifier: u8 = rand::thread_rng().gen();
    let mut request_authenticator = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut request_authenticator);

    let packet = build_access_request(identifier, &request_authenticator, &options.secret, user, password);

    let socket = UdpSocket::bind("0.0.0.0:0").await?;

    tracing::debug!(host, port = options.port, identifier, "sending Access-Request");
    socket.send_to(&packet, (host, options.port)).await?;

    // Deliberately unconnected: a connected socket turns a closed remote
    // port into an immediate `ECONNREFUSED` from a stray ICMP
    // port-unreachable, which would surface a down server as an `Err`
    // instead of the timeout every other non-responsive case produces.
    let mut buf = vec![0u8; MAX_PACKET_SIZE];
    let received = match tokio::time::timeout(options.timeout, socket.recv_from(&mut buf)).await {
        Ok(Ok((n, _peer))) => n,
        Ok(Err(error)) => return Err(ClientError::Io(error)),
        Err(_elapsed) => {
            tracing::warn!(host, identifier, "Access-Request timed out");
            return Ok(AuthOutcome::failure(AuthError::Timeout, None));
        }
    };
    // `socket` is dropped (and its fd closed) at the end of this function on
    // every path, including the early returns above.

    let datagram = &buf[..received];
    if datagram.len() < 20 {
        tracing::warn!(host, identifier, len = datagram.len(), "response shorter than a RADIUS header");
        return Ok(AuthOutcome::failure(AuthError::MalformedResponse, Some(to_hex(datagram))));
    }

    let code = datagram[0];
    let response_identifier = datagram[1];
    let response_authenticator: [u8; 16] = datagram[4..20].try_into().expect("slice is exactly 16 bytes");
    let attributes_section = &datagram[20..received];

    let expected_authenticator = compute_response_authenticator(
        code,
        response_identifier,
        received as u16,
        &request_authenticator,
        attributes_section,
        &options.secret,
    );
    if expected_authenticator != response_authenticator {
        tracing::warn!(host, identifier, "response-authenticator mismatch");
        return Ok(AuthOutcome::failure(AuthError::AuthenticatorMismatch, Some(to_hex(datagram))));
    }

    let raw_attrs = walk_attributes(attributes_section);
    let decoded: Vec<DecodedAttribute> =
        raw_attrs.iter().map(|(id, raw)| decode_attribute(*id, raw)).collect();
    let class = extract_assignment(&raw_attrs, options);

    let (ok, error) = match code {
        CODE_ACCESS_ACCEPT => (true, None),
        CODE_ACCESS_REJECT => (false, Some(AuthError::AccessReject)),
        CODE_ACCESS_CHALLENGE => (false, Some(AuthError::AccessChallenge)),
        _ => (false, Some(AuthError::UnknownCode)),
    };
    tracing::debug!(host, identifier, code, ok, "Access-Request completed");

    Ok(AuthOutcome { ok, class, attributes: Some(decoded), raw_hex: Some(to_hex(datagram)), error })
}
