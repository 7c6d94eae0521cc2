//! Fetching one server file over HTTP.
//!
//! Uses the curl crate (libcurl easy interface) in the calling thread. Files
//! ending in `.bz2` are decoded on the fly and stored without the suffix. A
//! 404 is not an error: ancillary files the server never provides get an empty
//! placeholder so the client stops asking for them.

mod bz2;
mod disposition;
mod request;
mod sink;
mod status;

use crate::error::FetchError;
use crate::event::ServerInfo;
use sink::{BodySink, Finished};
use std::cell::RefCell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub use disposition::disposition_filename;
pub use request::{redirect_target, request_url};
pub use sink::temp_path;
pub use status::{classify_http_status, HttpStatusKind, ResponseHead};

/// Suffix of files served as bzip2 streams.
pub const COMPRESSED_SUFFIX: &str = ".bz2";

/// Extensions that get an empty placeholder when the origin answers 404:
/// navigation meshes and AI node graphs, which the game can rebuild itself.
pub const PLACEHOLDER_EXTENSIONS: [&str; 2] = ["nav", "ain"];

/// Redirect hops followed per fetch.
pub const MAX_REDIRECTS: u32 = 10;

/// Fast-download hosts commonly only serve clients that present themselves as
/// a Source engine game.
pub const USER_AGENT: &str = "Half-Life 2";
pub const REFERER_SCHEME: &str = "hl2://";

/// One attempt to fetch a relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub rel_path: String,
    pub compressed: bool,
}

impl DownloadRequest {
    pub fn new(rel_path: &str) -> Self {
        Self {
            rel_path: rel_path.to_string(),
            compressed: rel_path.ends_with(COMPRESSED_SUFFIX),
        }
    }

    /// Relative path the file is stored under (suffix stripped when compressed).
    pub fn stored_path(&self) -> &str {
        if self.compressed {
            &self.rel_path[..self.rel_path.len() - COMPRESSED_SUFFIX.len()]
        } else {
            &self.rel_path
        }
    }

    /// True when a 404 for this exact path should leave an empty file behind.
    pub fn placeholder_eligible(&self) -> bool {
        Path::new(&self.rel_path)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| PLACEHOLDER_EXTENSIONS.contains(&ext))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// File written (decoded when compressed).
    Fetched { path: PathBuf, bytes: u64 },
    /// Already on disk; no request was made.
    Skipped,
    /// 404 on a placeholder-eligible file; an empty file was created.
    Placeholder { path: PathBuf },
    /// 404; nothing written.
    Missing,
    /// The `.bz2` URL served an uncompressed payload; nothing written. The
    /// client asks for the plain name next, which is fetched then.
    NotCompressed,
}

/// Performs fetches against a fast-download origin.
#[derive(Debug, Clone)]
pub struct Fetcher {
    user_agent: String,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl Fetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn request_headers(&self, endpoint: &str) -> Vec<(&'static str, String)> {
        vec![
            ("User-Agent", self.user_agent.clone()),
            ("Referer", format!("{REFERER_SCHEME}{endpoint}")),
        ]
    }

    /// Fetches `rel_path` from `server` into `dest_root`.
    ///
    /// `rel_path` must already have passed [`crate::validate::validate`].
    pub fn fetch(
        &self,
        rel_path: &str,
        server: ServerInfo<'_>,
        dest_root: &Path,
    ) -> Result<FetchOutcome, FetchError> {
        let req = DownloadRequest::new(rel_path);
        let dest = dest_root.join(&req.rel_path);
        let stored = dest_root.join(req.stored_path());
        if dest.exists() || stored.exists() {
            tracing::debug!(rel_path, "already present; skipping");
            return Ok(FetchOutcome::Skipped);
        }

        let mut url = request_url(server.base_url, &req.rel_path)?;
        for _ in 0..=MAX_REDIRECTS {
            tracing::debug!(%url, endpoint = server.endpoint, "GET");
            let sink = BodySink::new(stored.clone(), req.compressed);
            let Exchange {
                code,
                redirect,
                sink,
            } = self.exchange(&url, server.endpoint, sink)?;

            match classify_http_status(code) {
                HttpStatusKind::Success => {
                    return match sink.finish() {
                        Ok(Finished::Written { path, bytes }) => {
                            tracing::info!(rel_path, bytes, path = %path.display(), "fetched");
                            Ok(FetchOutcome::Fetched { path, bytes })
                        }
                        Ok(Finished::NotCompressed) => {
                            tracing::info!(
                                rel_path,
                                "payload is not compressed; waiting for plain request"
                            );
                            Ok(FetchOutcome::NotCompressed)
                        }
                        Err(failure) => Err(failure.into_fetch_error(&url)),
                    };
                }
                HttpStatusKind::Redirect => {
                    sink.abandon();
                    let Some(next) = redirect else {
                        return Err(FetchError::Http { url, code });
                    };
                    tracing::debug!(from = %url, to = %next, "redirect");
                    url = redirect_target(&next)?;
                }
                HttpStatusKind::NotFound => {
                    sink.abandon();
                    return if req.placeholder_eligible() {
                        write_placeholder(&dest)?;
                        tracing::warn!(rel_path, "not found on server; wrote placeholder");
                        Ok(FetchOutcome::Placeholder { path: dest })
                    } else {
                        tracing::warn!(rel_path, "not found on server");
                        Ok(FetchOutcome::Missing)
                    };
                }
                HttpStatusKind::Other(code) => {
                    sink.abandon();
                    return Err(FetchError::Http { url, code });
                }
            }
        }
        Err(FetchError::TooManyRedirects { url })
    }

    /// One GET without following redirects.
    fn exchange(&self, url: &str, endpoint: &str, sink: BodySink) -> Result<Exchange, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let sink = RefCell::new(sink);

        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(transport)?;

        let mut list = curl::easy::List::new();
        for (k, v) in self.request_headers(endpoint) {
            list.append(&format!("{k}: {v}")).map_err(transport)?;
        }
        easy.http_headers(list).map_err(transport)?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    sink.borrow_mut().header(data);
                    true
                })
                .map_err(transport)?;
            transfer
                .write_function(|data| Ok(sink.borrow_mut().write(data)))
                .map_err(transport)?;
            transfer.perform()
        };

        let mut sink = sink.into_inner();
        if let Some(failure) = sink.take_failure() {
            sink.abandon();
            return Err(failure.into_fetch_error(url));
        }
        if let Err(source) = performed {
            // The sink stops an uncompressed payload on its first chunk.
            if !sink.refused_uncompressed() {
                sink.abandon();
                return Err(transport(source));
            }
        }

        let code = easy.response_code().map_err(transport)?;
        let redirect = easy
            .redirect_url()
            .map_err(transport)?
            .map(str::to_string);
        Ok(Exchange {
            code,
            redirect,
            sink,
        })
    }
}

struct Exchange {
    code: u32,
    redirect: Option<String>,
    sink: BodySink,
}

fn write_placeholder(path: &Path) -> Result<(), FetchError> {
    let write_err = |source| FetchError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    File::create(path).map_err(write_err)?;
    Ok(())
}
