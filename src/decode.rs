//! Response decoding
//!
//! Turns a raw portal response into a [`Page`]: first undo any `Content-Encoding`
//! (gzip, deflate, identity), then parse the JSON envelope. Group searches carry their
//! items in `results`, user lists in `users`; an envelope with neither is an empty page.

use crate::error::DecodeError;
use crate::types::{Cursor, Group, Member, Page, PageItems};
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use serde::Deserialize;
use std::io::Read;

/// JSON envelope shared by the portal's paginated endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    total: i64,
    #[serde(default)]
    start: i64,
    #[serde(default)]
    num: i64,
    #[serde(default = "end_of_listing")]
    next_start: i64,
    #[serde(default)]
    results: Option<Vec<Group>>,
    #[serde(default)]
    users: Option<Vec<Member>>,
}

fn end_of_listing() -> i64 {
    -1
}

/// Parse a JSON payload into a page
pub fn decode_page(body: &[u8]) -> Result<Page, DecodeError> {
    let envelope: Envelope = serde_json::from_slice(body)?;

    let items = match (envelope.results, envelope.users) {
        (Some(groups), _) if !groups.is_empty() => PageItems::Groups(groups),
        (_, Some(members)) if !members.is_empty() => PageItems::Members(members),
        (Some(groups), None) => PageItems::Groups(groups),
        (_, Some(members)) => PageItems::Members(members),
        (None, None) => PageItems::Empty,
    };

    Ok(Page {
        items,
        total_count: envelope.total,
        start_index: envelope.start,
        page_size: envelope.num,
        next: Cursor::from_wire(envelope.next_start),
    })
}

/// Undo the response's `Content-Encoding` into `buf`
///
/// `buf` is cleared first and keeps its allocation, so a pagination loop can reuse
/// it for every page. Unknown encodings are copied through untouched and left to
/// the JSON parser to reject.
pub fn decode_body(
    encoding: Option<&str>,
    raw: &[u8],
    buf: &mut Vec<u8>,
) -> Result<(), DecodeError> {
    buf.clear();

    let encoding = encoding.map(str::trim).unwrap_or("");
    let result = if encoding.eq_ignore_ascii_case("gzip") || encoding.eq_ignore_ascii_case("x-gzip")
    {
        GzDecoder::new(raw).read_to_end(buf).map(|_| ())
    } else if encoding.eq_ignore_ascii_case("deflate") {
        // HTTP "deflate" is zlib-wrapped, but some servers send raw deflate
        match ZlibDecoder::new(raw).read_to_end(buf) {
            Ok(_) => Ok(()),
            Err(_) => {
                buf.clear();
                DeflateDecoder::new(raw).read_to_end(buf).map(|_| ())
            }
        }
    } else {
        if !encoding.is_empty() && !encoding.eq_ignore_ascii_case("identity") {
            tracing::debug!(encoding, "unknown content encoding, passing body through");
        }
        buf.extend_from_slice(raw);
        Ok(())
    };

    result.map_err(|source| DecodeError::ContentEncoding {
        encoding: encoding.to_string(),
        source,
    })
}
