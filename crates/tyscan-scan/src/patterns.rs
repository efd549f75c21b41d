//! Package pattern discovery.
//!
//! A pattern is `relative` (starts with `./` or `../`) or `absolute` (a
//! module path), and either names a single package or ends recursive
//! (`/**` or the canonical `/...`). An infix `**/` implies recursion at
//! that point: `host/mod/**/x` expands to `host/mod/x/...`.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;
use tyscan_front::FrontendExport;

use crate::error::ScanError;

/// A parsed and normalized package pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    /// The pattern with recursion markers stripped.
    pub base: String,
    pub recursive: bool,
    /// Whether the raw pattern started with `./` or `../`.
    pub relative: bool,
}

impl Pattern {
    /// Parse a raw pattern, normalizing `/**` and infix `**/` to the
    /// canonical recursive form.
    pub fn expand(raw: &str) -> Result<Self, ScanError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ScanError::Config("empty package pattern".to_string()));
        }
        let relative = trimmed.starts_with("./") || trimmed.starts_with("../");
        let mut base = if relative {
            trimmed.trim_start_matches("./").trim_start_matches("../")
        } else {
            trimmed
        }
        .to_string();

        let mut recursive = false;
        if let Some(stripped) = base
            .strip_suffix("/**")
            .or_else(|| base.strip_suffix("/..."))
        {
            recursive = true;
            base = stripped.to_string();
        }
        // Infix recursion: `host/mod/**/x` means every `x` below
        // `host/mod`, canonically `host/mod/x/...`.
        if let Some(pos) = base.find("**/") {
            recursive = true;
            let (head, tail) = base.split_at(pos);
            base = format!("{}{}", head, &tail[3..]);
        }
        if base.is_empty() || base.contains("**") {
            return Err(ScanError::Config(format!("invalid pattern {raw:?}")));
        }
        Ok(Pattern {
            base,
            recursive,
            relative,
        })
    }

    /// The canonical textual form (`base` or `base/...`).
    pub fn canonical(&self) -> String {
        let prefix = if self.relative { "./" } else { "" };
        if self.recursive {
            format!("{prefix}{}/...", self.base)
        } else {
            format!("{prefix}{}", self.base)
        }
    }

    fn globs(&self) -> Vec<String> {
        // Relative patterns match by path suffix; absolute ones from the
        // path root.
        let roots = if self.relative {
            vec![self.base.clone(), format!("**/{}", self.base)]
        } else {
            vec![self.base.clone()]
        };
        let mut globs = Vec::new();
        for root in roots {
            if self.recursive {
                globs.push(format!("{root}/**"));
            }
            globs.push(root);
        }
        globs
    }
}

fn build_matcher(patterns: &[Pattern]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        for glob in pattern.globs() {
            let glob = GlobBuilder::new(&glob)
                .literal_separator(true)
                .build()
                .map_err(|e| ScanError::Config(format!("invalid pattern glob {glob:?}: {e}")))?;
            builder.add(glob);
        }
    }
    builder
        .build()
        .map_err(|e| ScanError::Config(format!("pattern set: {e}")))
}

/// Select the packages of the export matching any pattern, in export
/// order. Fails with a discovery error when nothing matches.
pub fn select_packages(
    export: &FrontendExport,
    patterns: &[Pattern],
) -> Result<Vec<usize>, ScanError> {
    let matcher = build_matcher(patterns)?;
    let selected: Vec<usize> = export
        .packages
        .iter()
        .enumerate()
        .filter(|(_, pkg)| matcher.is_match(&pkg.path))
        .map(|(index, _)| index)
        .collect();
    if selected.is_empty() {
        let shown: Vec<String> = patterns.iter().map(Pattern::canonical).collect();
        return Err(ScanError::Discovery(format!(
            "no packages match {}",
            shown.join(", ")
        )));
    }
    debug!(count = selected.len(), "packages selected");
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyscan_front::{Package, TypeTable};

    #[test]
    fn test_expand_single_package() {
        let p = Pattern::expand("./x").unwrap();
        assert_eq!(p.base, "x");
        assert!(!p.recursive);
        assert!(p.relative);
        assert_eq!(p.canonical(), "./x");
    }

    #[test]
    fn test_expand_recursive_suffixes() {
        for raw in ["./x/**", "./x/..."] {
            let p = Pattern::expand(raw).unwrap();
            assert_eq!(p.base, "x");
            assert!(p.recursive);
            assert_eq!(p.canonical(), "./x/...");
        }
        let p = Pattern::expand("host/mod/pkg/**").unwrap();
        assert_eq!(p.canonical(), "host/mod/pkg/...");
    }

    #[test]
    fn test_expand_infix_recursion() {
        let p = Pattern::expand("host/mod/**/x").unwrap();
        assert_eq!(p.base, "host/mod/x");
        assert!(p.recursive);
        assert_eq!(p.canonical(), "host/mod/x/...");
    }

    #[test]
    fn test_expand_rejects_empty_and_bare_stars() {
        assert!(Pattern::expand("").is_err());
        assert!(Pattern::expand("  ").is_err());
        assert!(Pattern::expand("a/**b").is_err());
    }

    fn export_of(paths: &[&str]) -> FrontendExport {
        let packages = paths
            .iter()
            .map(|p| Package::new(*p, p.rsplit('/').next().unwrap_or(p)))
            .collect();
        FrontendExport::new(TypeTable::new(), packages)
    }

    #[test]
    fn test_select_exact_and_recursive() {
        let export = export_of(&[
            "example.com/mod/a",
            "example.com/mod/a/inner",
            "example.com/mod/b",
        ]);

        let exact = [Pattern::expand("example.com/mod/a").unwrap()];
        assert_eq!(select_packages(&export, &exact).unwrap(), vec![0]);

        let recursive = [Pattern::expand("example.com/mod/a/...").unwrap()];
        assert_eq!(select_packages(&export, &recursive).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_select_relative_suffix() {
        let export = export_of(&["example.com/mod/tools/x", "example.com/mod/y"]);
        let rel = [Pattern::expand("./tools/x").unwrap()];
        assert_eq!(select_packages(&export, &rel).unwrap(), vec![0]);
    }

    #[test]
    fn test_select_none_is_discovery_error() {
        let export = export_of(&["example.com/mod/a"]);
        let patterns = [Pattern::expand("other.org/z").unwrap()];
        let err = select_packages(&export, &patterns).unwrap_err();
        assert!(matches!(err, ScanError::Discovery(_)));
        assert_eq!(err.exit_code(), 2);
    }
}
