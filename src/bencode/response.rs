use crate::models::peer::Peer;
use std::net::IpAddr;

use super::encoder::BencodeEncode;

/// Build the bencoded success body for an announce.
///
/// Keys are emitted in canonical byte order. `interval`/`min interval` come
/// from the caller's settings snapshot. The dictionary-per-peer form is the
/// default; `compact` switches to the BEP 23/7 binary `peers`/`peers6` form.
pub fn build_success(
    peers: &[Peer],
    seeders: u32,
    leechers: u32,
    interval: i64,
    min_interval: i64,
    compact: bool,
) -> Vec<u8> {
    let capacity = if compact {
        100 + (peers.len() * 18)
    } else {
        100 + (peers.len() * 50)
    };
    let mut buf = Vec::with_capacity(capacity);

    buf.extend_from_slice(b"d");

    "complete".bencode(&mut buf);
    (seeders as i64).bencode(&mut buf);

    "incomplete".bencode(&mut buf);
    (leechers as i64).bencode(&mut buf);

    "interval".bencode(&mut buf);
    interval.bencode(&mut buf);

    "min interval".bencode(&mut buf);
    min_interval.bencode(&mut buf);

    if compact {
        "peers".bencode(&mut buf);
        encode_compact_peers_v4(peers, &mut buf);

        "peers6".bencode(&mut buf);
        encode_compact_peers_v6(peers, &mut buf);
    } else {
        "peers".bencode(&mut buf);
        encode_dict_peers(peers, &mut buf);
    }

    buf.extend_from_slice(b"e");

    buf
}

/// Build the bencoded failure body.
///
/// A single `failure reason` key; the frequency-throttle path also echoes
/// `interval`/`min interval` so compliant clients correct their cadence.
/// Success and failure bodies are mutually exclusive shapes.
pub fn build_failure(reason: &str, interval_hints: Option<(i64, i64)>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(40 + reason.len());

    buf.extend_from_slice(b"d");

    "failure reason".bencode(&mut buf);
    reason.bencode(&mut buf);

    if let Some((interval, min_interval)) = interval_hints {
        "interval".bencode(&mut buf);
        interval.bencode(&mut buf);

        "min interval".bencode(&mut buf);
        min_interval.bencode(&mut buf);
    }

    buf.extend_from_slice(b"e");

    buf
}

/// 6 bytes per IPv4 peer: 4 address octets, big-endian port.
fn encode_compact_peers_v4(peers: &[Peer], buf: &mut Vec<u8>) {
    let count = peers.iter().filter(|p| p.ip.is_ipv4()).count();
    if count == 0 {
        buf.extend_from_slice(b"0:");
        return;
    }

    let peer_bytes = count * 6;

    let mut itoa_buf = itoa::Buffer::new();
    buf.extend_from_slice(itoa_buf.format(peer_bytes).as_bytes());
    buf.extend_from_slice(b":");
    buf.reserve(peer_bytes);

    for peer in peers {
        if let IpAddr::V4(ip) = peer.ip {
            buf.extend_from_slice(&ip.octets());
            buf.extend_from_slice(&peer.port.to_be_bytes());
        }
    }
}

/// 18 bytes per IPv6 peer: 16 address octets, big-endian port.
fn encode_compact_peers_v6(peers: &[Peer], buf: &mut Vec<u8>) {
    let count = peers.iter().filter(|p| p.ip.is_ipv6()).count();
    if count == 0 {
        buf.extend_from_slice(b"0:");
        return;
    }

    let peer_bytes = count * 18;

    let mut itoa_buf = itoa::Buffer::new();
    buf.extend_from_slice(itoa_buf.format(peer_bytes).as_bytes());
    buf.extend_from_slice(b":");
    buf.reserve(peer_bytes);

    for peer in peers {
        if let IpAddr::V6(ip) = peer.ip {
            buf.extend_from_slice(&ip.octets());
            buf.extend_from_slice(&peer.port.to_be_bytes());
        }
    }
}

fn encode_dict_peers(peers: &[Peer], buf: &mut Vec<u8>) {
    buf.extend_from_slice(b"l");

    for peer in peers {
        buf.extend_from_slice(b"d");

        "ip".bencode(buf);
        peer.ip.to_string().as_str().bencode(buf);

        "peer id".bencode(buf);
        peer.peer_id.as_slice().bencode(buf);

        "port".bencode(buf);
        (peer.port as i64).bencode(buf);

        buf.extend_from_slice(b"e");
    }

    buf.extend_from_slice(b"e");
}
