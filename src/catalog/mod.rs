//! Model Catalog (§4.6): the static base model list plus the rules for
//! deriving `-search`/`-nothinking`/`-maxthinking` (and combined) variant
//! names, and for mapping any variant name back to its upstream base and
//! thinking configuration.

use std::sync::LazyLock;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BaseModel {
    pub name: &'static str,
    pub version: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub input_token_limit: u32,
    pub output_token_limit: u32,
    pub temperature: f64,
    pub max_temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
}

macro_rules! base_model {
    ($name:literal, $display:literal, $desc:literal, $in_limit:literal, $out_limit:literal) => {
        BaseModel {
            name: $name,
            version: "001",
            display_name: $display,
            description: $desc,
            input_token_limit: $in_limit,
            output_token_limit: $out_limit,
            temperature: 1.0,
            max_temperature: 2.0,
            top_p: 0.95,
            top_k: 64,
        }
    };
}

pub static BASE_MODELS: LazyLock<Vec<BaseModel>> = LazyLock::new(|| {
    vec![
        base_model!(
            "gemini-2.5-pro-preview-03-25",
            "Gemini 2.5 Pro Preview 03-25",
            "Preview version of Gemini 2.5 Pro from May 6th",
            1_048_576,
            65_535
        ),
        base_model!(
            "gemini-2.5-pro-preview-05-06",
            "Gemini 2.5 Pro Preview 05-06",
            "Preview version of Gemini 2.5 Pro from May 6th",
            1_048_576,
            65_535
        ),
        base_model!(
            "gemini-2.5-pro-preview-06-05",
            "Gemini 2.5 Pro Preview 06-05",
            "Preview version of Gemini 2.5 Pro from June 5th",
            1_048_576,
            65_535
        ),
        base_model!(
            "gemini-2.5-pro",
            "Gemini 2.5 Pro",
            "Advanced multimodal model with enhanced capabilities",
            1_048_576,
            65_535
        ),
        base_model!(
            "gemini-2.5-flash-preview-05-20",
            "Gemini 2.5 Flash Preview 05-20",
            "Preview version of Gemini 2.5 Flash from May 20th",
            1_048_576,
            65_535
        ),
        base_model!(
            "gemini-2.5-flash-preview-04-17",
            "Gemini 2.5 Flash Preview 04-17",
            "Preview version of Gemini 2.5 Flash from April 17th",
            1_048_576,
            65_535
        ),
        base_model!(
            "gemini-2.5-flash",
            "Gemini 2.5 Flash",
            "Fast and efficient multimodal model with latest improvements",
            1_048_576,
            65_535
        ),
        base_model!(
            "gemini-2.5-flash-image-preview",
            "Gemini 2.5 Flash Image Preview",
            "Gemini 2.5 Flash Image Preview",
            32_768,
            32_768
        ),
        base_model!(
            "gemini-3-pro-preview",
            "Gemini 3.0 Pro Preview 11-2025",
            "Preview version of Gemini 3.0 Pro from November 2025",
            1_048_576,
            65_535
        ),
        base_model!(
            "gemini-3-flash-preview",
            "Gemini 3.0 Flash Preview",
            "Preview version of Gemini 3.0 Flash",
            1_048_576,
            65_535
        ),
    ]
});

const SUFFIXES: [&str; 3] = ["-maxthinking", "-nothinking", "-search"];

pub fn base_model_named(name: &str) -> Option<&'static BaseModel> {
    BASE_MODELS.iter().find(|m| m.name == name)
}

/// Strips variant suffixes in the fixed order `-maxthinking`, `-nothinking`,
/// `-search`, so a combined name like `-search-maxthinking` resolves in two
/// passes.
pub fn strip_variant_suffixes(name: &str) -> &str {
    let mut current = name;
    loop {
        let stripped = SUFFIXES.iter().find_map(|suffix| current.strip_suffix(suffix));
        match stripped {
            Some(next) => current = next,
            None => return current,
        }
    }
}

fn is_thinking_eligible(base_name: &str) -> bool {
    base_name.contains("gemini-2.5-flash")
        || base_name.contains("gemini-2.5-pro")
        || base_name.contains("gemini-3-pro")
}

/// Resolved request-shaping behavior for a (possibly suffixed) model name.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantConfig {
    pub base_name: String,
    pub inject_search: bool,
    pub thinking_budget: i64,
    pub include_thoughts: bool,
}

/// Whether `name` carries an explicit thinking-variant suffix (§4.6). Such
/// names fix their own thinking budget and ignore any caller-supplied
/// reasoning effort.
pub fn has_thinking_variant_suffix(name: &str) -> bool {
    name.ends_with("-nothinking") || name.ends_with("-maxthinking")
}

/// Resolves a caller-supplied model name (base or variant) into upstream
/// request-shaping directives. Unknown base models are still resolved
/// structurally (so callers can target new upstream models before the
/// catalog is updated) but return `None` for metadata lookups.
pub fn resolve_variant(name: &str) -> VariantConfig {
    let has_search = name.contains("-search");
    let has_nothinking = name.ends_with("-nothinking");
    let has_maxthinking = name.ends_with("-maxthinking");

    let base_name = strip_variant_suffixes(name).to_string();
    let eligible = is_thinking_eligible(&base_name);

    let (thinking_budget, include_thoughts) = if has_nothinking && eligible {
        if base_name.contains("gemini-2.5-flash") {
            (0, false)
        } else {
            (128, true)
        }
    } else if has_maxthinking && eligible {
        if base_name.contains("gemini-2.5-flash") {
            (24_576, true)
        } else if base_name.contains("gemini-2.5-pro") && !base_name.contains("gemini-3") {
            (32_768, true)
        } else {
            (45_000, true)
        }
    } else {
        (-1, true)
    };

    VariantConfig {
        base_name,
        inject_search: has_search,
        thinking_budget,
        include_thoughts,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogModel {
    pub name: String,
    pub display_name: String,
    pub description: String,
}

/// The full catalog exposed to callers: base models plus every valid
/// variant (including combined search+thinking names), sorted by name
/// (§4.6).
pub fn catalog() -> Vec<CatalogModel> {
    let mut models: Vec<CatalogModel> = Vec::new();

    for base in BASE_MODELS.iter() {
        models.push(CatalogModel {
            name: base.name.to_string(),
            display_name: base.display_name.to_string(),
            description: base.description.to_string(),
        });

        let is_image_model = base.name.contains("-image-preview");
        if !is_image_model {
            models.push(CatalogModel {
                name: format!("{}-search", base.name),
                display_name: format!("{} with Google Search", base.display_name),
                description: format!("{} (includes Google Search grounding)", base.description),
            });
        }

        if is_thinking_eligible(base.name) {
            models.push(CatalogModel {
                name: format!("{}-nothinking", base.name),
                display_name: format!("{} (No Thinking)", base.display_name),
                description: format!("{} (thinking disabled)", base.description),
            });
            models.push(CatalogModel {
                name: format!("{}-maxthinking", base.name),
                display_name: format!("{} (Max Thinking)", base.display_name),
                description: format!("{} (maximum thinking budget)", base.description),
            });
            models.push(CatalogModel {
                name: format!("{}-search-nothinking", base.name),
                display_name: format!("{} with Google Search (No Thinking)", base.display_name),
                description: format!(
                    "{} (includes Google Search grounding, thinking disabled)",
                    base.description
                ),
            });
            models.push(CatalogModel {
                name: format!("{}-search-maxthinking", base.name),
                display_name: format!("{} with Google Search (Max Thinking)", base.display_name),
                description: format!(
                    "{} (includes Google Search grounding, maximum thinking budget)",
                    base.description
                ),
            });
        }
    }

    models.sort_by(|a, b| a.name.cmp(&b.name));
    models
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_models_are_ten() {
        assert_eq!(BASE_MODELS.len(), 10);
    }

    #[test]
    fn strip_combined_suffix_in_two_passes() {
        assert_eq!(
            strip_variant_suffixes("gemini-2.5-pro-search-maxthinking"),
            "gemini-2.5-pro"
        );
        assert_eq!(
            strip_variant_suffixes("gemini-2.5-flash-nothinking"),
            "gemini-2.5-flash"
        );
    }

    #[test]
    fn nothinking_budget_differs_flash_vs_pro() {
        let flash = resolve_variant("gemini-2.5-flash-nothinking");
        assert_eq!(flash.thinking_budget, 0);
        assert!(!flash.include_thoughts);

        let pro = resolve_variant("gemini-2.5-pro-nothinking");
        assert_eq!(pro.thinking_budget, 128);
        assert!(pro.include_thoughts);
    }

    #[test]
    fn maxthinking_budget_varies_by_family() {
        assert_eq!(resolve_variant("gemini-2.5-flash-maxthinking").thinking_budget, 24_576);
        assert_eq!(resolve_variant("gemini-2.5-pro-maxthinking").thinking_budget, 32_768);
        assert_eq!(resolve_variant("gemini-3-pro-preview-maxthinking").thinking_budget, 45_000);
    }

    #[test]
    fn unsuffixed_model_uses_default_budget() {
        let config = resolve_variant("gemini-2.5-pro");
        assert_eq!(config.thinking_budget, -1);
        assert!(config.include_thoughts);
        assert!(!config.inject_search);
    }

    #[test]
    fn combined_search_maxthinking_sets_both() {
        let config = resolve_variant("gemini-2.5-flash-search-maxthinking");
        assert_eq!(config.base_name, "gemini-2.5-flash");
        assert!(config.inject_search);
        assert_eq!(config.thinking_budget, 24_576);
    }

    #[test]
    fn image_preview_model_never_gets_search_variant() {
        let models = catalog();
        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        assert!(!names.contains(&"gemini-2.5-flash-image-preview-search"));
        assert!(names.contains(&"gemini-2.5-flash-image-preview"));
    }

    #[test]
    fn catalog_is_sorted_by_name() {
        let names: Vec<String> = catalog().into_iter().map(|m| m.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn base_model_lookup_finds_known_names() {
        assert!(base_model_named("gemini-2.5-pro").is_some());
        assert!(base_model_named("not-a-real-model").is_none());
    }

    #[test]
    fn thinking_variant_suffix_detection() {
        assert!(has_thinking_variant_suffix("gemini-2.5-pro-nothinking"));
        assert!(has_thinking_variant_suffix("gemini-2.5-pro-search-maxthinking"));
        assert!(!has_thinking_variant_suffix("gemini-2.5-pro-search"));
        assert!(!has_thinking_variant_suffix("gemini-2.5-pro"));
    }
}
