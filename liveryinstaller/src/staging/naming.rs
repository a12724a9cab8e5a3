//! Display names and install folder names for liveries.

use std::sync::LazyLock;

use regex::Regex;

use crate::fs_ops::unique_suffix;
use crate::variant::AircraftVariant;

/// Name used when nothing better can be found.
pub const UNNAMED_LIVERY: &str = "Unnamed Livery";

static TITLE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*title\s*=\s*"?([^"]*?)"?\s*$"#).expect("valid title regex")
});

static STEM_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:pmdg[-_ ]?)?(?:(?:777|737|736|738|739)(?:[-_ ]?(?:200er|300er|600|700|800|900|bbj2|bbj|bdsf|bcf|er|f|w))?[-_ ]?)?",
    )
    .expect("valid prefix regex")
});

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_\s]+").expect("valid separator regex"));

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("valid sanitize regex"));

/// Candidate sources for a livery's display name, highest priority first.
#[derive(Debug, Default, Clone, Copy)]
pub struct NameSources<'a> {
    /// Name declared by a multi-livery pack manifest.
    pub pack_name: Option<&'a str>,
    /// Name supplied by the operator for a single-archive batch.
    pub custom_name: Option<&'a str>,
    /// Contents of the livery's configuration file.
    pub config_text: Option<&'a str>,
    /// Stem of the archive the livery came from.
    pub archive_stem: &'a str,
}

/// Read the livery title from configuration text.
///
/// The first title inside a `[fltsim.0]` section wins; any other title line
/// is the fallback.
pub fn title_from_config(text: &str) -> Option<String> {
    let mut in_fltsim = false;
    let mut fallback = None;

    for line in text.lines() {
        let trimmed = line.trim().trim_start_matches('\u{feff}');
        if trimmed.starts_with('[') {
            in_fltsim = trimmed
                .trim_start_matches('[')
                .split(']')
                .next()
                .map(|name| name.trim().eq_ignore_ascii_case("fltsim.0"))
                .unwrap_or(false);
            continue;
        }
        if let Some(caps) = TITLE_KEY.captures(trimmed) {
            let title = caps[1].trim();
            if title.is_empty() {
                continue;
            }
            if in_fltsim {
                return Some(title.to_string());
            }
            fallback.get_or_insert_with(|| title.to_string());
        }
    }
    fallback
}

/// Derive a readable name from an archive stem.
///
/// Strips a leading `pmdg`/model prefix, turns separators into spaces and
/// capitalizes each word: `pmdg-777-300er-delta_n701dn` becomes
/// `Delta N701dn`.
pub fn title_from_archive_stem(stem: &str) -> String {
    let stripped = STEM_PREFIX.replace(stem, "");
    let cleaned = SEPARATORS.replace_all(stripped.trim(), " ");
    let cleaned = cleaned.trim();
    let source = if cleaned.is_empty() {
        SEPARATORS.replace_all(stem.trim(), " ").trim().to_string()
    } else {
        cleaned.to_string()
    };
    if source.is_empty() {
        return UNNAMED_LIVERY.to_string();
    }

    source
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Pick the display name for a livery from the available sources.
pub fn resolve_display_name(sources: NameSources<'_>) -> String {
    let explicit = [sources.pack_name, sources.custom_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty());
    if let Some(name) = explicit {
        return name.to_string();
    }

    if let Some(title) = sources.config_text.and_then(title_from_config) {
        return title;
    }

    title_from_archive_stem(sources.archive_stem)
}

/// Make a display name safe for use as a folder name suffix.
///
/// Returns `None` when nothing usable remains.
pub fn sanitize_folder_suffix(name: &str) -> Option<String> {
    let replaced = UNSAFE_CHARS.replace_all(name, "_");
    let suffix = replaced.trim().replace('.', "_");
    if suffix.is_empty() {
        None
    } else {
        Some(suffix)
    }
}

/// Folder name of an installed livery: `<base name> <sanitized name>`.
pub fn livery_folder_name(variant: AircraftVariant, display_name: &str, archive_stem: &str) -> String {
    let suffix = sanitize_folder_suffix(display_name).unwrap_or_else(|| {
        let stem = sanitize_folder_suffix(archive_stem).unwrap_or_default();
        format!("UnnamedLivery_{}_{}", stem, unique_suffix())
    });
    format!("{} {}", variant.base_name(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_config_prefers_fltsim_section() {
        let text = "[VERSION]\ntitle=\"Wrong\"\n[fltsim.0]\n  title = \"Delta Air Lines\"\n";
        assert_eq!(title_from_config(text).unwrap(), "Delta Air Lines");
    }

    #[test]
    fn test_title_from_config_header_with_comment() {
        let text = "[general]\ntitle=Wrong\n[FLTSIM.0] ; primary\ntitle=\"Right\"\n";
        assert_eq!(title_from_config(text).unwrap(), "Right");
    }

    #[test]
    fn test_title_from_config_fallback_and_missing() {
        assert_eq!(
            title_from_config("[general]\r\ntitle=Plain\r\n").unwrap(),
            "Plain"
        );
        assert!(title_from_config("[fltsim.0]\ntitle=\"\"\n").is_none());
        assert!(title_from_config("").is_none());
    }

    #[test]
    fn test_title_from_archive_stem() {
        assert_eq!(
            title_from_archive_stem("pmdg-777-300er-delta_n701dn"),
            "Delta N701dn"
        );
        assert_eq!(title_from_archive_stem("PMDG_737-800_KLM"), "KLM");
        assert_eq!(title_from_archive_stem("FedEx 777F"), "FedEx 777F");
        assert_eq!(title_from_archive_stem("pmdg-777"), "Pmdg 777");
        assert_eq!(title_from_archive_stem(""), UNNAMED_LIVERY);
    }

    #[test]
    fn test_resolve_display_name_priority() {
        let config = "[fltsim.0]\ntitle=\"From Config\"\n";
        let all = NameSources {
            pack_name: Some("From Pack"),
            custom_name: Some("Custom"),
            config_text: Some(config),
            archive_stem: "stem",
        };
        assert_eq!(resolve_display_name(all), "From Pack");
        assert_eq!(
            resolve_display_name(NameSources {
                pack_name: None,
                ..all
            }),
            "Custom"
        );
        assert_eq!(
            resolve_display_name(NameSources {
                pack_name: None,
                custom_name: Some("  "),
                ..all
            }),
            "From Config"
        );
        assert_eq!(
            resolve_display_name(NameSources {
                archive_stem: "my_livery",
                ..NameSources::default()
            }),
            "My Livery"
        );
    }

    #[test]
    fn test_sanitize_folder_suffix() {
        assert_eq!(
            sanitize_folder_suffix("  A/B: C?v1.2 ").unwrap(),
            "A_B_ C_v1_2"
        );
        assert!(sanitize_folder_suffix("   ").is_none());
    }

    #[test]
    fn test_livery_folder_name() {
        assert_eq!(
            livery_folder_name(AircraftVariant::B777_300ER, "Emirates A6-EGO", "x"),
            "PMDG 777-300ER Emirates A6-EGO"
        );
        let fallback = livery_folder_name(AircraftVariant::B737_800, " ", "my pack");
        assert!(fallback.starts_with("PMDG 737-800 UnnamedLivery_my pack_"));
    }
}
