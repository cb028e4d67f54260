//! Version bump policy
//!
//! Versions are not parsed as strict semver. A version is
//! `major.minor.<rest>`, where `<rest>` is everything after the second dot
//! and may carry a `-tag` suffix. Bumping runs three stages:
//!
//! 1. split into segments (`VersionParts::parse`)
//! 2. increment the patch, or reset it to 0 when a minor override fires
//! 3. re-attach a tag (new tag, carried tag, or none)

use super::directives::Directives;
use crate::core::error::{PublishError, PublishResult};
use crate::manifest::PackageManifest;
use log::debug;

/// A version split into the segments the bump policy works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionParts<'a> {
  pub major: &'a str,
  pub minor: &'a str,
  /// Patch text before the first `-` of the rest segment
  pub patch: &'a str,
  /// Text after the first `-` of the rest segment, if any
  pub tag: Option<&'a str>,
}

impl<'a> VersionParts<'a> {
  /// Split a version string. Fails when there are fewer than three
  /// dot-separated segments.
  pub fn parse(version: &'a str) -> Result<Self, String> {
    let mut segments = version.splitn(3, '.');
    let (Some(major), Some(minor), Some(rest)) = (segments.next(), segments.next(), segments.next()) else {
      return Err("expected at least three dot-separated segments".to_string());
    };

    let (patch, tag) = match rest.split_once('-') {
      Some((patch, tag)) if !tag.is_empty() => (patch, Some(tag)),
      Some((patch, _)) => (patch, None),
      None => (rest, None),
    };

    Ok(Self {
      major,
      minor,
      patch,
      tag,
    })
  }
}

/// Compute the next version for `version` under `directives`.
pub fn next_version(version: &str, directives: &Directives) -> Result<String, String> {
  let parts = VersionParts::parse(version)?;

  let mut minor = parts.minor.to_string();
  let patch = match directives.minor_override.as_deref() {
    Some(new_minor) if new_minor != parts.minor => {
      minor = new_minor.to_string();
      "0".to_string()
    }
    _ => {
      let current: u64 = parts
        .patch
        .parse()
        .map_err(|_| format!("patch segment '{}' is not a number", parts.patch))?;
      current
        .checked_add(1)
        .ok_or_else(|| format!("patch segment '{}' is too large", parts.patch))?
        .to_string()
    }
  };

  let tag = match (directives.tag.as_deref(), parts.tag) {
    (Some(tag), _) => Some(tag),
    (None, Some(existing)) if !directives.no_tag => Some(existing),
    _ => None,
  };

  let major = match directives.major_override.as_deref() {
    Some(new_major) if new_major != parts.major => new_major,
    _ => parts.major,
  };

  Ok(match tag {
    Some(tag) => format!("{}.{}.{}-{}", major, minor, patch, tag),
    None => format!("{}.{}.{}", major, minor, patch),
  })
}

/// Bump the manifest's version in place and return the new version.
///
/// A malformed version leaves the manifest untouched.
pub fn bump(manifest: &mut PackageManifest, directives: &Directives) -> PublishResult<String> {
  let new_version = next_version(&manifest.version, directives).map_err(|reason| PublishError::MalformedVersion {
    package: manifest.name.clone(),
    version: manifest.version.clone(),
    reason,
  })?;

  debug!("{}: {} -> {}", manifest.name, manifest.version, new_version);
  manifest.version = new_version.clone();
  Ok(new_version)
}
