//! Source map v3 emission for concatenated bundles.
//!
//! Concatenation is line-preserving, so the map is exact: every output
//! line maps to column 0 of the corresponding line in its source file.
//! Mappings use the standard base64-VLQ encoding, one segment per line.

use serde_json::json;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Provenance of one output line: (source index, source line), 0-based.
pub type LineOrigin = (usize, usize);

/// Build a source map JSON document for a concatenated bundle.
///
/// `sources` are the original file paths (display form), `contents` the
/// per-source text embedded as `sourcesContent`, `lines` the provenance
/// of each output line in order.
pub fn concat_map(
    bundle_name: &str,
    sources: &[String],
    contents: &[String],
    lines: &[LineOrigin],
) -> String {
    let mut mappings = String::new();
    let mut prev_source = 0i64;
    let mut prev_line = 0i64;

    for (i, &(source, line)) in lines.iter().enumerate() {
        if i > 0 {
            mappings.push(';');
        }
        // segment: [out_column, source_delta, line_delta, source_column]
        encode_vlq(&mut mappings, 0);
        encode_vlq(&mut mappings, source as i64 - prev_source);
        encode_vlq(&mut mappings, line as i64 - prev_line);
        encode_vlq(&mut mappings, 0);
        prev_source = source as i64;
        prev_line = line as i64;
    }

    json!({
        "version": 3,
        "file": bundle_name,
        "sources": sources,
        "sourcesContent": contents,
        "names": [],
        "mappings": mappings,
    })
    .to_string()
}

/// Append one base64-VLQ value.
fn encode_vlq(out: &mut String, value: i64) {
    // sign bit goes into the lowest bit
    let mut v = if value < 0 {
        ((-value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (v & 0b11111) as usize;
        v >>= 5;
        if v > 0 {
            digit |= 0b100000; // continuation bit
        }
        out.push(BASE64[digit] as char);
        if v == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: i64) -> String {
        let mut s = String::new();
        encode_vlq(&mut s, value);
        s
    }

    #[test]
    fn test_vlq_known_values() {
        // Known base64-VLQ encodings from the Source Map v3 format
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(123), "2H");
    }

    #[test]
    fn test_concat_map_shape() {
        let map = concat_map(
            "app.js",
            &["a.js".into(), "b.js".into()],
            &["line0\nline1".into(), "only".into()],
            // two lines from a.js, then one from b.js
            &[(0, 0), (0, 1), (1, 0)],
        );

        let parsed: serde_json::Value = serde_json::from_str(&map).unwrap();
        assert_eq!(parsed["version"], 3);
        assert_eq!(parsed["file"], "app.js");
        assert_eq!(parsed["sources"].as_array().unwrap().len(), 2);
        // AAAA ; AACA (same source, next line) ; ACDA (next source, line reset)
        assert_eq!(parsed["mappings"], "AAAA;AACA;ACDA");
    }
}
