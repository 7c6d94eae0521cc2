//! Console log line classification.
//!
//! [`classify`] is pure: it takes the current [`SessionContext`] by value and
//! hands back the updated one alongside the event (if any) the line produced.

use crate::error::ContextError;

const CONNECTED: &str = "Connected to";
const DOWNLOADING: &str = "Downloading ";
const ABORTING: &str = "Aborting download of ";
const DISCARDING: &str = "Discarding queued download of ";
const UI_STATE: &str = "ChangeGameUIState";

/// What the engine knows about the server the client is connected to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// Game server address, e.g. `1.2.3.4:27015`.
    pub endpoint: Option<String>,
    /// Last URL announced by a `Downloading` line.
    pub full_url: Option<String>,
    /// Prefix of `full_url` in front of the relative path.
    pub base_url: Option<String>,
}

/// Endpoint and base URL of the current server; both are needed to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInfo<'a> {
    pub endpoint: &'a str,
    pub base_url: &'a str,
}

impl SessionContext {
    pub fn server(&self) -> Result<ServerInfo<'_>, ContextError> {
        match (&self.endpoint, &self.base_url) {
            (Some(endpoint), Some(base_url)) => Ok(ServerInfo { endpoint, base_url }),
            _ => Err(ContextError::MissingServerInfo),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Connected { endpoint: String },
    DownloadAnnounced { url: String },
    DownloadAborted { rel_path: String },
    DownloadDiscarded { rel_path: String },
    UiStateChanged,
}

fn path_arg(rest: &str) -> String {
    rest.trim().trim_matches('"').to_string()
}

/// Classifies one log line.
///
/// `all_loaded` gates the UI-state event: it is only reported while downloads
/// are outstanding. An abort line naming a path that is not part of the
/// previously announced URL is a [`ContextError`].
pub fn classify(
    line: &str,
    mut ctx: SessionContext,
    all_loaded: bool,
) -> Result<(Option<LogEvent>, SessionContext), ContextError> {
    if line.starts_with(CONNECTED) {
        let endpoint = line.split_whitespace().last().unwrap_or_default().to_string();
        ctx = SessionContext {
            endpoint: Some(endpoint.clone()),
            full_url: None,
            base_url: None,
        };
        return Ok((Some(LogEvent::Connected { endpoint }), ctx));
    }

    if let Some(rest) = line.strip_prefix(DOWNLOADING) {
        let url = rest.trim().to_string();
        ctx.full_url = Some(url.clone());
        return Ok((Some(LogEvent::DownloadAnnounced { url }), ctx));
    }

    if let Some(rest) = line.strip_prefix(ABORTING) {
        let rel_path = path_arg(rest);
        let idx = ctx
            .full_url
            .as_deref()
            .and_then(|url| url.find(rel_path.as_str()));
        let Some(idx) = idx else {
            return Err(ContextError::PathNotInUrl {
                rel_path,
                full_url: ctx.full_url,
            });
        };
        ctx.base_url = ctx.full_url.as_deref().map(|url| url[..idx].to_string());
        return Ok((Some(LogEvent::DownloadAborted { rel_path }), ctx));
    }

    if let Some(rest) = line.strip_prefix(DISCARDING) {
        let rel_path = path_arg(rest);
        return Ok((Some(LogEvent::DownloadDiscarded { rel_path }), ctx));
    }

    if line.starts_with(UI_STATE) && !all_loaded {
        return Ok((Some(LogEvent::UiStateChanged), ctx));
    }

    Ok((None, ctx))
}
