//! Policy check for server-supplied relative paths.
//!
//! A path is only ever joined onto the download root after it passes here, so
//! a hostile server cannot write outside the content directories.

use crate::error::PathRejection;

/// Top-level directories a server may write into.
pub const WHITELIST: [&str; 5] = ["materials", "sound", "maps", "models", "particles"];

fn allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']' | '-' | ' ')
}

/// Checks `rel_path` component by component, then the top-level directory.
///
/// Component checks run before the whitelist check, so a malformed path is
/// reported as malformed even under a whitelisted directory.
pub fn validate(rel_path: &str) -> Result<(), PathRejection> {
    let mut first: Option<&str> = None;
    for raw in rel_path.split('/') {
        let part = raw.trim();
        if part.is_empty() {
            return Err(PathRejection::EmptyComponent {
                path: rel_path.to_string(),
            });
        }
        // The path is used verbatim on disk, so `maps /x` must not pass as `maps/x`.
        if part.len() != raw.len() {
            return Err(PathRejection::PaddedComponent {
                path: rel_path.to_string(),
            });
        }
        if part.contains("..") {
            return Err(PathRejection::Traversal {
                path: rel_path.to_string(),
            });
        }
        if let Some(ch) = part.chars().find(|c| !allowed_char(*c)) {
            return Err(PathRejection::InvalidCharacter {
                path: rel_path.to_string(),
                ch,
            });
        }
        first.get_or_insert(part);
    }

    let dir = first.unwrap_or_default();
    if !WHITELIST.contains(&dir) {
        return Err(PathRejection::NotWhitelisted {
            path: rel_path.to_string(),
            dir: dir.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_map() {
        assert_eq!(validate("maps/de_dust2.bsp"), Ok(()));
    }

    #[test]
    fn accepts_every_whitelisted_dir() {
        for dir in WHITELIST {
            assert_eq!(validate(&format!("{dir}/a/b-c_[1] x.vtf")), Ok(()), "{dir}");
        }
    }

    #[test]
    fn rejects_traversal() {
        assert!(matches!(
            validate("maps/../../etc/passwd"),
            Err(PathRejection::Traversal { .. })
        ));
        assert!(matches!(
            validate("maps/x..bsp"),
            Err(PathRejection::Traversal { .. })
        ));
    }

    #[test]
    fn rejects_empty_components() {
        assert!(matches!(
            validate("/maps/x.bsp"),
            Err(PathRejection::EmptyComponent { .. })
        ));
        assert!(matches!(
            validate("maps//x.bsp"),
            Err(PathRejection::EmptyComponent { .. })
        ));
        assert!(matches!(
            validate("maps/x.bsp/"),
            Err(PathRejection::EmptyComponent { .. })
        ));
        assert!(matches!(
            validate("maps/   /x.bsp"),
            Err(PathRejection::EmptyComponent { .. })
        ));
        assert!(matches!(
            validate(""),
            Err(PathRejection::EmptyComponent { .. })
        ));
    }

    #[test]
    fn rejects_invalid_characters() {
        for p in [
            "maps/x;rm.bsp",
            "sound/a\\b.wav",
            "models/caf\u{e9}.mdl",
            "materials/x\0.vmt",
            "maps/x:y.bsp",
        ] {
            assert!(
                matches!(validate(p), Err(PathRejection::InvalidCharacter { .. })),
                "{p:?}"
            );
        }
    }

    #[test]
    fn reports_offending_character() {
        assert_eq!(
            validate("maps/a$b.bsp"),
            Err(PathRejection::InvalidCharacter {
                path: "maps/a$b.bsp".to_string(),
                ch: '$',
            })
        );
    }

    #[test]
    fn rejects_non_whitelisted_dir() {
        assert_eq!(
            validate("textures/x.vtf"),
            Err(PathRejection::NotWhitelisted {
                path: "textures/x.vtf".to_string(),
                dir: "textures".to_string(),
            })
        );
        assert!(matches!(
            validate("cfg/autoexec.cfg"),
            Err(PathRejection::NotWhitelisted { .. })
        ));
        assert!(matches!(
            validate("Maps/x.bsp"),
            Err(PathRejection::NotWhitelisted { .. })
        ));
    }

    #[test]
    fn rejects_whitespace_around_components() {
        for p in ["maps /x.bsp", " maps/x.bsp", "maps/x.bsp ", "sound/ a.wav"] {
            assert_eq!(
                validate(p),
                Err(PathRejection::PaddedComponent {
                    path: p.to_string()
                }),
                "{p:?}"
            );
        }
        assert_eq!(validate("sound/a b.wav"), Ok(()));
    }

    #[test]
    fn malformed_component_wins_over_whitelist() {
        assert!(matches!(
            validate("textures/../x"),
            Err(PathRejection::Traversal { .. })
        ));
        assert!(matches!(
            validate("cfg//x"),
            Err(PathRejection::EmptyComponent { .. })
        ));
    }
}
