//! Content-Disposition filename extraction.

/// Extracts the filename from a raw Content-Disposition header value.
///
/// Handles `filename="quoted"`, `filename=token` and the RFC 5987
/// `filename*=UTF-8''percent-encoded` form, which wins when both are present.
pub fn disposition_filename(header_value: &str) -> Option<String> {
    let mut plain: Option<String> = None;

    for param in header_value.trim().split(';') {
        let Some((name, v)) = param.trim().split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let v = v.trim();

        if name == "filename*" {
            let encoded = v
                .get(..7)
                .filter(|p| p.eq_ignore_ascii_case("utf-8''"))
                .map(|_| &v[7..]);
            if let Some(decoded) = encoded.map(percent_decode).filter(|s| !s.is_empty()) {
                return Some(decoded);
            }
        } else if name == "filename" {
            let unquoted = match v.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
                Some(inner) => unescape_quoted(inner),
                None => v.to_string(),
            };
            if !unquoted.is_empty() {
                plain = Some(unquoted);
            }
        }
    }

    plain
}

fn unescape_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            _ => out.push(c),
        }
    }
    out
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let hex = bytes
            .get(i + 1..i + 3)
            .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
            .and_then(|h| std::str::from_utf8(h).ok())
            .and_then(|h| u8::from_str_radix(h, 16).ok());
        match (bytes[i], hex) {
            (b'%', Some(b)) => {
                out.push(b);
                i += 3;
            }
            (b, _) => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_and_token_forms() {
        assert_eq!(
            disposition_filename("attachment; filename=\"de_nuke.bsp\"").as_deref(),
            Some("de_nuke.bsp")
        );
        assert_eq!(
            disposition_filename("attachment; filename=de_nuke.bsp.bz2").as_deref(),
            Some("de_nuke.bsp.bz2")
        );
        assert_eq!(
            disposition_filename("attachment; filename=\"a \\\"b\\\".wav\"").as_deref(),
            Some("a \"b\".wav")
        );
    }

    #[test]
    fn extended_form_wins() {
        assert_eq!(
            disposition_filename(
                "attachment; filename=\"fallback.bz2\"; filename*=UTF-8''my%20map.bsp"
            )
            .as_deref(),
            Some("my map.bsp")
        );
    }

    #[test]
    fn missing_filename() {
        assert_eq!(disposition_filename("inline"), None);
        assert_eq!(disposition_filename("attachment; filename=\"\""), None);
    }
}
