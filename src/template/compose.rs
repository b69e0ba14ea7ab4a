use super::catalog::TemplateCatalog;
use super::engine::TemplateError;
use super::types::{GenInfo, UserSelection};
use std::collections::HashSet;

/// Turn a user selection into the ordered list of items to generate.
///
/// Dependencies come before the item that needs them and are added once, under
/// their default name, unless the selection already contains that template.
pub fn compose_new_item(
    selection: &UserSelection,
    catalog: &TemplateCatalog,
) -> Result<Vec<GenInfo>, TemplateError> {
    let selected: HashSet<&str> = selection
        .items
        .iter()
        .map(|i| i.template_id.as_str())
        .collect();

    let mut composed: Vec<GenInfo> = Vec::new();
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut added_dependencies: HashSet<String> = HashSet::new();

    for item in &selection.items {
        if item.name.trim().is_empty() {
            return Err(TemplateError::NameRequired(item.template_id.clone()));
        }
        if !is_valid_item_name(&item.name) {
            return Err(TemplateError::InvalidItemName(item.name.clone()));
        }

        let template = catalog
            .get(&item.template_id)
            .ok_or_else(|| TemplateError::TemplateNotFound(item.template_id.clone()))?;

        for dependency_id in &template.dependencies {
            if selected.contains(dependency_id.as_str())
                || added_dependencies.contains(dependency_id)
            {
                continue;
            }

            let dependency = catalog
                .get(dependency_id)
                .ok_or_else(|| TemplateError::TemplateNotFound(dependency_id.clone()))?;

            let name = if dependency.default_name.is_empty() {
                dependency.name.clone()
            } else {
                dependency.default_name.clone()
            };
            let info = GenInfo::new(name, dependency.clone());
            if let Some(key) = info.results_key() {
                seen_keys.insert(key);
            }
            added_dependencies.insert(dependency_id.clone());
            composed.push(info);
        }

        let info = GenInfo::new(item.name.clone(), template.clone());
        if let Some(key) = info.results_key() {
            if !seen_keys.insert(key.clone()) {
                return Err(TemplateError::DuplicateItem(key));
            }
        }
        composed.push(info);
    }

    Ok(composed)
}

/// Item names end up in file paths, so they must be a single path segment
fn is_valid_item_name(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(['/', '\\', ':'])
}
