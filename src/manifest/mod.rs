mod types;

pub use types::ProjectConfiguration;

use crate::utils::APP_MANIFEST_FILE;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    ReadError(#[from] std::io::Error),
}

const PROJECT_TYPE_KEY: &str = "projectType";
const FRAMEWORK_KEY: &str = "framework";

/// First `Metadata` element (any namespace prefix), with its inner content
static METADATA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:[\w.-]+:)?Metadata\b[^>]*?(?:/>|>(.*?)</(?:[\w.-]+:)?Metadata\s*>)")
        .expect("metadata regex is valid")
});

/// Any start or empty element tag, capturing its attribute section
static ELEMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<[\w.:-]+((?:\s+[\w.:-]+\s*=\s*(?:'[^']*'|"[^"]*"))*)\s*/?>"#)
        .expect("element regex is valid")
});

static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([\w.:-]+)\s*=\s*(?:'([^']*)'|"([^"]*)")"#).expect("attribute regex is valid")
});

/// Comments, CDATA sections and processing instructions carry no elements
static NON_ELEMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<!\[CDATA\[.*?\]\]>|<\?.*?\?>")
        .expect("non-element regex is valid")
});

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|lt|gt|quot|apos|amp);").expect("entity regex is valid")
});

/// Read project type and framework from `Package.appxmanifest`.
///
/// A missing manifest yields empty values, not an error.
pub async fn read_project_configuration(
    project_path: &Path,
) -> Result<ProjectConfiguration, ManifestError> {
    let manifest_path = project_path.join(APP_MANIFEST_FILE);

    if !manifest_path.exists() {
        debug!(path = %manifest_path.display(), "No app manifest found");
        return Ok(ProjectConfiguration::default());
    }

    let content = fs::read_to_string(&manifest_path).await?;
    Ok(parse_project_configuration(&content))
}

/// Extract the `projectType` and `framework` metadata values from manifest XML
pub fn parse_project_configuration(xml: &str) -> ProjectConfiguration {
    let markup = NON_ELEMENT_RE.replace_all(xml, "");
    let metadata = match METADATA_RE.captures(&markup) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
        None => return ProjectConfiguration::default(),
    };

    ProjectConfiguration {
        project_type: find_metadata_value(metadata, PROJECT_TYPE_KEY).unwrap_or_default(),
        framework: find_metadata_value(metadata, FRAMEWORK_KEY).unwrap_or_default(),
    }
}

/// Value of the first descendant whose `Name` attribute equals `name`
fn find_metadata_value(metadata: &str, name: &str) -> Option<String> {
    ELEMENT_RE.captures_iter(metadata).find_map(|element| {
        let attributes = parse_attributes(element.get(1)?.as_str());
        if attributes.get("Name").map(String::as_str) == Some(name) {
            attributes.get("Value").cloned()
        } else {
            None
        }
    })
}

fn parse_attributes(section: &str) -> HashMap<String, String> {
    ATTRIBUTE_RE
        .captures_iter(section)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str();
            let local = key.rsplit(':').next().unwrap_or(key);
            let value = caps.get(2).or_else(|| caps.get(3))?.as_str();
            Some((local.to_string(), unescape(value)))
        })
        .collect()
}

/// Decode predefined entities and character references in a single pass
fn unescape(value: &str) -> String {
    ENTITY_RE
        .replace_all(value, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => {
                    let code = match entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
