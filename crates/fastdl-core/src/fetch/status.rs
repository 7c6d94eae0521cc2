//! Response status classification and header parsing.

use super::disposition::disposition_filename;
use super::COMPRESSED_SUFFIX;

/// How a response status is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatusKind {
    Success,
    /// Followed by hand when the target is plain `http`.
    Redirect,
    /// Recovered: the origin does not have the file.
    NotFound,
    /// Fatal.
    Other(u32),
}

pub fn classify_http_status(code: u32) -> HttpStatusKind {
    match code {
        200..=299 => HttpStatusKind::Success,
        300..=399 => HttpStatusKind::Redirect,
        404 => HttpStatusKind::NotFound,
        _ => HttpStatusKind::Other(code),
    }
}

/// Headers of the response currently being received.
///
/// Reset on every status line so that only the final response of a redirect
/// chain is described.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: Option<u32>,
    pub content_disposition: Option<String>,
}

impl ResponseHead {
    /// Feeds one raw header line. Returns true when the line started a new response.
    pub fn push_line(&mut self, raw: &[u8]) -> bool {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.starts_with("HTTP/") {
            *self = ResponseHead {
                status: line.split_whitespace().nth(1).and_then(|c| c.parse().ok()),
                content_disposition: None,
            };
            return true;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-disposition") {
                self.content_disposition = Some(value.trim().to_string());
            }
        }
        false
    }

    pub fn kind(&self) -> HttpStatusKind {
        classify_http_status(self.status.unwrap_or(0))
    }

    /// True when the origin names the payload with a filename that is not a
    /// `.bz2`, i.e. it is serving the uncompressed file under the compressed name.
    pub fn declares_uncompressed(&self) -> bool {
        self.content_disposition
            .as_deref()
            .and_then(disposition_filename)
            .is_some_and(|name| !name.ends_with(COMPRESSED_SUFFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(lines: &[&str]) -> ResponseHead {
        let mut h = ResponseHead::default();
        for l in lines {
            h.push_line(format!("{l}\r\n").as_bytes());
        }
        h
    }

    #[test]
    fn classify_statuses() {
        assert_eq!(classify_http_status(200), HttpStatusKind::Success);
        assert_eq!(classify_http_status(206), HttpStatusKind::Success);
        assert_eq!(classify_http_status(301), HttpStatusKind::Redirect);
        assert_eq!(classify_http_status(302), HttpStatusKind::Redirect);
        assert_eq!(classify_http_status(404), HttpStatusKind::NotFound);
        assert_eq!(classify_http_status(403), HttpStatusKind::Other(403));
        assert_eq!(classify_http_status(500), HttpStatusKind::Other(500));
        assert_eq!(classify_http_status(0), HttpStatusKind::Other(0));
    }

    #[test]
    fn redirect_chain_keeps_last_response() {
        let h = head(&[
            "HTTP/1.1 302 Found",
            "Location: http://mirror/maps/a.bsp.bz2",
            "Content-Disposition: attachment; filename=\"a.bsp\"",
            "",
            "HTTP/1.1 200 OK",
            "Content-Length: 10",
        ]);
        assert_eq!(h.status, Some(200));
        assert_eq!(h.kind(), HttpStatusKind::Success);
        assert!(h.content_disposition.is_none());
    }

    #[test]
    fn uncompressed_declaration() {
        let h = head(&[
            "HTTP/1.1 200 OK",
            "content-disposition: attachment; filename=\"de_nuke.bsp\"",
        ]);
        assert!(h.declares_uncompressed());

        let h = head(&[
            "HTTP/1.1 200 OK",
            "Content-Disposition: attachment; filename=\"de_nuke.bsp.bz2\"",
        ]);
        assert!(!h.declares_uncompressed());

        let h = head(&["HTTP/1.1 200 OK"]);
        assert!(!h.declares_uncompressed());
    }
}
