//! Font discovery for report rendering.
//!
//! The bundled Roboto family is searched in `PATRIMONIO_FONTS_DIR`, next to the executable and in
//! the crate's `assets/fonts`.  When none of those holds the family, the Liberation Sans family
//! shipped by most Linux distributions is used instead.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Environment variable pointing at a directory with the bundled font files.
pub const FONTS_DIR_VAR: &str = "PATRIMONIO_FONTS_DIR";

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

const SYSTEM_FALLBACK_FAMILY_NAME: &str = "LiberationSans";

const SYSTEM_FALLBACK_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/liberation-sans",
    "/usr/share/fonts/liberation",
    "/usr/share/fonts/TTF",
];

const FONT_STYLES: &[&str] = &["Regular", "Bold", "Italic", "BoldItalic"];

fn family_files(family: &str) -> impl Iterator<Item = String> + '_ {
    FONT_STYLES
        .iter()
        .map(move |style| format!("{}-{}.ttf", family, style))
}

fn has_family(directory: &Path, family: &str) -> bool {
    directory.is_dir() && family_files(family).all(|file| directory.join(file).is_file())
}

fn bundled_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env::var_os(FONTS_DIR_VAR).map(PathBuf::from) {
        if !path.as_os_str().is_empty() {
            candidates.push(path);
        }
    }

    if let Some(bin_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(bin_dir.join("assets/fonts"));
    }

    candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));
    candidates.dedup();
    candidates
}

/// Directory and family name of the first usable font family.
fn resolve_font_family() -> Result<(PathBuf, &'static str), Error> {
    let bundled = bundled_directory_candidates();
    if let Some(directory) = bundled
        .iter()
        .find(|candidate| has_family(candidate, DEFAULT_FONT_FAMILY_NAME))
    {
        return Ok((directory.clone(), DEFAULT_FONT_FAMILY_NAME));
    }

    if let Some(directory) = SYSTEM_FALLBACK_DIRS
        .iter()
        .map(PathBuf::from)
        .find(|candidate| has_family(candidate, SYSTEM_FALLBACK_FAMILY_NAME))
    {
        return Ok((directory, SYSTEM_FALLBACK_FAMILY_NAME));
    }

    let checked = bundled
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(Error::new(
        format!(
            "No usable font family. Checked {} for {} and the system font directories for {}. \
             Set {} to a directory with the font files.",
            checked, DEFAULT_FONT_FAMILY_NAME, SYSTEM_FALLBACK_FAMILY_NAME, FONTS_DIR_VAR
        ),
        io::Error::new(io::ErrorKind::NotFound, "report fonts not found"),
    ))
}

/// Loads the font family used for reports.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    let (directory, family) = resolve_font_family()?;
    if family != DEFAULT_FONT_FAMILY_NAME {
        warn!(
            "Bundled {} fonts unavailable; falling back to {} from {}",
            DEFAULT_FONT_FAMILY_NAME,
            family,
            directory.display()
        );
    } else {
        debug!("Loading {} fonts from {}", family, directory.display());
    }

    fonts::from_files(&directory, family, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                family,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

/// Indicates whether a font family can be located, bundled or system-wide.
pub fn default_fonts_available() -> bool {
    resolve_font_family().is_ok()
}

/// Whether `err` was caused by fonts missing from disk.
pub fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

#[cfg(test)]
mod tests {
    use super::{family_files, has_family};

    #[test]
    fn family_files_cover_four_styles() {
        let files: Vec<_> = family_files("Roboto").collect();
        assert_eq!(
            files,
            vec![
                "Roboto-Regular.ttf",
                "Roboto-Bold.ttf",
                "Roboto-Italic.ttf",
                "Roboto-BoldItalic.ttf"
            ]
        );
    }

    #[test]
    fn incomplete_directory_is_not_a_family() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("Roboto-Regular.ttf"), b"").expect("write");
        assert!(!has_family(dir.path(), "Roboto"));

        for file in family_files("Roboto") {
            std::fs::write(dir.path().join(file), b"").expect("write");
        }
        assert!(has_family(dir.path(), "Roboto"));
    }
}
