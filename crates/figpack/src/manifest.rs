//! Plugin options and the manifest derived from them.
//!
//! The manifest is a pure projection: every declared option is passed
//! through as-is, the entry path is replaced by the generated script name,
//! and the UI page name is added. Nothing here has a lifecycle of its own.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the generated main script, relative to the output directory.
pub const MAIN_FILE: &str = "main.js";

/// File name of the plugin UI page, relative to the output directory.
pub const UI_FILE: &str = "index.html";

/// File name of the manifest, relative to the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorType {
    Figma,
    Figjam,
    Dev,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    CurrentUser,
    ActiveUsers,
    FileUsers,
    Payments,
    TeamLibrary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    TextReview,
    Codegen,
    Inspect,
    Vscode,
}

/// Domains the plugin may reach over the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAccess {
    pub allowed_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_allowed_domains: Option<Vec<String>>,
}

/// A language offered by a codegen plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLanguage {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

/// A user-facing preference exposed by a codegen plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "itemType", rename_all = "lowercase")]
pub enum CodegenPreference {
    #[serde(rename_all = "camelCase")]
    Unit {
        default_scale_factor: f64,
        scaled_unit: String,
        #[serde(rename = "default", default, skip_serializing_if = "Option::is_none")]
        is_default: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        included_languages: Option<Vec<String>>,
    },
    #[serde(rename_all = "camelCase")]
    Select {
        property_name: String,
        label: String,
        options: Vec<SelectOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        included_languages: Option<Vec<String>>,
    },
    #[serde(rename_all = "camelCase")]
    Action {
        property_name: String,
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        included_languages: Option<Vec<String>>,
    },
}

/// Options declared by the plugin author.
///
/// `main` is the entry source path relative to the project root; every
/// other field ends up in the manifest unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOptions {
    pub name: String,
    pub id: String,
    pub editor_type: Vec<EditorType>,
    pub api: String,
    pub main: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<Capability>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_access: Option<NetworkAccess>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codegen_languages: Option<Vec<CodeLanguage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codegen_preferences: Option<Vec<CodegenPreference>>,
}

/// The descriptor the plugin host reads to register the plugin.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest<'a> {
    name: &'a str,
    id: &'a str,
    editor_type: &'a [EditorType],
    api: &'a str,
    main: &'static str,
    ui: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<&'a [Permission]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<&'a [Capability]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    network_access: Option<&'a NetworkAccess>,
    #[serde(skip_serializing_if = "Option::is_none")]
    codegen_languages: Option<&'a [CodeLanguage]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    codegen_preferences: Option<&'a [CodegenPreference]>,
}

impl<'a> Manifest<'a> {
    pub fn from_options(options: &'a PluginOptions) -> Self {
        Self {
            name: &options.name,
            id: &options.id,
            editor_type: &options.editor_type,
            api: &options.api,
            main: MAIN_FILE,
            ui: UI_FILE,
            permissions: options.permissions.as_deref(),
            capabilities: options.capabilities.as_deref(),
            network_access: options.network_access.as_ref(),
            codegen_languages: options.codegen_languages.as_deref(),
            codegen_preferences: options.codegen_preferences.as_deref(),
        }
    }

    /// Serialize with two-space indentation.
    pub fn to_json(&self) -> String {
        // Only strings, enums, numbers and vectors: serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Render the manifest for `options`.
pub fn render(options: &PluginOptions) -> String {
    Manifest::from_options(options).to_json()
}
