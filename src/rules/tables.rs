//! Pattern tables consumed by the checks.
//!
//! The raw tables are `const` data. [`RuleTables`] compiles them once per
//! run and is injected into every check, so a team can extend or replace a
//! table from `mrgate.toml` without touching check logic.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Raw Tables
// ============================================================================

/// Conventional-commit title grammar shared by the MR title and commit checks.
pub const CONVENTIONAL_TITLE: &str =
    r"(?i)^(feat|fix|docs|style|refactor|perf|test|build|ci|chore|revert)(\(.+\))?:\s.+";

/// Section headers of the MR description template.
pub const DESCRIPTION_MARKERS: &[&str] = &["## Description", "## Type of Change"];

/// Commit prefixes that mark unfinished work (compared lowercase).
pub const WIP_PREFIXES: &[&str] = &["wip", "[wip]"];

/// Basenames that must never be committed.
pub const FORBIDDEN_FILES: &[&str] = &[
    ".env",
    ".env.local",
    ".env.development",
    ".env.staging",
    ".env.production",
    "secrets.json",
    "credentials.json",
    "service-account.json",
    "key.properties",
    "keystore.properties",
];

/// Path patterns of sensitive material.
pub const SENSITIVE_PATTERNS: &[&str] = &[
    r"(?i)(^|/)id_(rsa|dsa|ecdsa|ed25519)$",
    r"(?i)private[_-]?key",
    r"(?i)\.pem$",
    r"(?i)\.key$",
    r"(?i)\.(keystore|jks)$",
    r"(?i)\.(p12|pfx)$",
    r"(?i)(^|/)[^/]*(token|credential|secret)s?[^/]*\.(json|txt|ya?ml|env)$",
];

/// Extensions of source files the content checks read.
pub const SOURCE_EXTENSIONS: &[&str] = &["dart"];

/// `(folder segment, required file suffix)` pairs of the module layout.
pub const LAYER_RULES: &[(&str, &str)] = &[
    ("controller", "_controller"),
    ("view", "_page"),
    ("repository", "_repository"),
];

/// Folder segments that make a file part of the UI layer.
pub const UI_SEGMENTS: &[&str] = &["view", "views", "widgets", "screens", "pages", "components"];

/// File-name suffixes that make a file part of the UI layer.
pub const UI_SUFFIXES: &[&str] = &["_page", "_screen", "_widget", "_view", "_dialog", "_sheet"];

/// UI constructs whose literal argument is user-facing text.
pub const HARDCODED_TEXT_PREFIXES: &[&str] = &[
    r"\b(?:Text|AppText|SelectableText)\(\s*",
    r"\bTextSpan\(\s*text:\s*",
    r"\b(?:hintText|labelText|helperText|errorText|tooltip|semanticLabel)\s*:\s*",
];

/// Comments that mark a literal as intentionally not localized.
pub const DYNAMIC_MARKERS: &[&str] = &[
    r"(?i)//\s*dynamic\b",
    r"(?i)//\s*no[-_ ]?i18n\b",
    r"(?i)//\s*ignore:\s*hardcoded",
    r"(?i)//\s*intentional(ly)?\b",
    r"(?i)//\s*debug[-_ ]only\b",
];

/// Console/print primitives.
pub const DEBUG_PRINT_PATTERNS: &[&str] = &[r"\bprint\(", r"\bdebugPrint\("];

/// `// TODO` followed by the remainder of the line.
pub const TODO_PATTERN: &str = r"//+\s*TODO\b(?P<rest>.*)";

/// Uppercase ticket token directly after `TODO`.
pub const TICKET_PATTERN: &str = r"^[\s:(\[\-]*[A-Z][A-Z0-9]+-\d+";

/// Numeric literal with an optional scaling suffix such as `.h` or `.sp`.
const DIMENSION_VALUE: &str = r"(?P<value>\d+(?:\.\d+)?)(?:\.(?P<suffix>[A-Za-z_]\w*))?";

/// Calls whose `height:` argument is a line-height multiplier, not a size.
pub const LINE_HEIGHT_CALLS: &[&str] = &["TextStyle", "StrutStyle", "copyWith"];

/// `(construct prefix, accepted suffixes, suggestion, exempt enclosing calls)`
/// for layout literals.
pub const DIMENSION_RULES: &[(&str, &[&str], &str, &[&str])] = &[
    (
        r"\bheight\s*:\s*",
        &["h", "r"],
        "Use .h for heights (e.g. height: 16.h)",
        LINE_HEIGHT_CALLS,
    ),
    (
        r"\bwidth\s*:\s*",
        &["w", "r"],
        "Use .w for widths (e.g. width: 120.w)",
        &[],
    ),
    (
        r"\bfontSize\s*:\s*",
        &["sp"],
        "Use .sp for font sizes (e.g. fontSize: 14.sp)",
        &[],
    ),
    (
        r"\b(?:BorderRadius|Radius)\.circular\(\s*",
        &["r"],
        "Use .r for radii (e.g. BorderRadius.circular(8.r))",
        &[],
    ),
    (
        r"\bEdgeInsets\.all\(\s*",
        &["r", "w", "h"],
        "Use .r for uniform padding (e.g. EdgeInsets.all(16.r))",
        &[],
    ),
    (
        r"\b(?:horizontal|left|right)\s*:\s*",
        &["w", "r"],
        "Use .w for horizontal spacing (e.g. horizontal: 16.w)",
        &[],
    ),
    (
        r"\b(?:vertical|top|bottom)\s*:\s*",
        &["h", "r"],
        "Use .h for vertical spacing (e.g. vertical: 8.h)",
        &[],
    ),
];

/// Files produced by code generators.
pub const GENERATED_GLOBS: &[&str] = &[
    "**/*.g.dart",
    "**/*.freezed.dart",
    "**/*.gr.dart",
    "**/*.config.dart",
    "**/*.mocks.dart",
    "**/*.pb.dart",
    "**/generated/**",
];

/// Test sources.
pub const TEST_GLOBS: &[&str] = &[
    "test/**",
    "**/test/**",
    "integration_test/**",
    "**/integration_test/**",
    "**/*_test.dart",
];

/// `(name, regex, skip when inside a literal)` secret detectors.
///
/// Assignment-style patterns start at an identifier, so a match inside a
/// literal is a false positive unless the name is itself a quoted map key
/// (`'x-api-key': '...'`, captured as `key_quote`). Bearer tokens and cloud
/// keys are themselves literal contents and must be matched there.
pub const SECRET_PATTERNS: &[(&str, &str, bool)] = &[
    (
        "API key",
        r#"(?i)\b(?P<name>\w*(?:api[_-]?key|apikey)\w*)(?P<key_quote>['"])?\s*[:=]\s*['"](?P<value>[^'"\n]{8,})['"]"#,
        true,
    ),
    (
        "password",
        r#"(?i)\b(?P<name>\w*(?:password|passwd|pwd)\w*)(?P<key_quote>['"])?\s*[:=]\s*['"](?P<value>[^'"\n]{4,})['"]"#,
        true,
    ),
    (
        "token or secret",
        r#"(?i)\b(?P<name>\w*(?:token|secret)\w*)(?P<key_quote>['"])?\s*[:=]\s*['"](?P<value>[^'"\n]{8,})['"]"#,
        true,
    ),
    (
        "bearer token",
        r"(?i)\bbearer\s+(?P<value>[A-Za-z0-9\-_.=]{20,})",
        false,
    ),
    ("AWS access key", r"\b(?P<value>AKIA[0-9A-Z]{16})\b", false),
];

/// Substrings of values that are obviously not real secrets.
pub const SECRET_PLACEHOLDERS: &[&str] = &[
    "your_",
    "your-",
    "yourapikey",
    "xxx",
    "placeholder",
    "example",
    "changeme",
    "dummy",
    "sample",
    "replace",
    "<",
    "${",
];

/// Identifier endings (normalized: lowercase, no `_`/`-`) that hold labels,
/// keys or UI state rather than credentials.
pub const SAFE_IDENTIFIER_SUFFIXES: &[&str] = &[
    "hint",
    "label",
    "controller",
    "field",
    "error",
    "message",
    "text",
    "validator",
    "header",
    "tokenkey",
    "storagekey",
    "prefkey",
    "fieldname",
    "type",
    "url",
    "endpoint",
    "path",
];

// ============================================================================
// Widget Rules
// ============================================================================

/// A baseline widget that must go through a project wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetReplacementSpec {
    /// Baseline construct, e.g. `ElevatedButton` or `Image.asset`.
    pub baseline: String,
    /// Mandated wrapper class, e.g. `AppButton`.
    pub replacement: String,
}

impl WidgetReplacementSpec {
    pub fn new(baseline: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            baseline: baseline.into(),
            replacement: replacement.into(),
        }
    }
}

/// Default baseline to wrapper mapping.
#[must_use]
pub fn default_widget_replacements() -> Vec<WidgetReplacementSpec> {
    [
        ("ElevatedButton", "AppButton"),
        ("TextButton", "AppButton"),
        ("OutlinedButton", "AppButton"),
        ("Text", "AppText"),
        ("Image.asset", "AppImage"),
        ("Image.network", "AppImage"),
        ("TextField", "AppTextField"),
        ("TextFormField", "AppTextField"),
    ]
    .into_iter()
    .map(|(b, r)| WidgetReplacementSpec::new(b, r))
    .collect()
}

/// Compiled widget replacement rule.
#[derive(Debug, Clone)]
pub struct WidgetRule {
    pub baseline: String,
    pub replacement: String,
    /// `\bBaseline\(` with dots escaped.
    pub usage: Regex,
    /// `\bclass\s+Replacement\b`: files defining the wrapper are exempt.
    pub definition: Regex,
}

impl WidgetRule {
    /// Compile a rule from its spec.
    ///
    /// # Errors
    ///
    /// Returns an error if either name produces an invalid pattern.
    pub fn compile(spec: &WidgetReplacementSpec) -> Result<Self> {
        let usage = Regex::new(&format!(r"\b{}\(", regex::escape(&spec.baseline)))
            .with_context(|| format!("invalid widget baseline '{}'", spec.baseline))?;
        let definition = Regex::new(&format!(r"\bclass\s+{}\b", regex::escape(&spec.replacement)))
            .with_context(|| format!("invalid widget replacement '{}'", spec.replacement))?;
        Ok(Self {
            baseline: spec.baseline.clone(),
            replacement: spec.replacement.clone(),
            usage,
            definition,
        })
    }
}

/// Redundant wrapping of an already-styled wrapper component.
#[derive(Debug, Clone)]
pub struct WrapperRule {
    /// Outer construct, e.g. `Container(`.
    pub container: Regex,
    /// Wrapped child, e.g. `child: AppButton(`.
    pub wrapped: Regex,
    /// Lines after the container line searched for the child.
    pub window: usize,
    pub message: String,
}

// ============================================================================
// Other Compiled Rules
// ============================================================================

/// Compiled folder/suffix pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRule {
    pub folder: String,
    pub suffix: String,
}

/// Compiled dimension convention.
#[derive(Debug, Clone)]
pub struct DimensionRule {
    pub pattern: Regex,
    pub accepted_suffixes: Vec<String>,
    pub suggestion: String,
    /// Enclosing calls in which a match is not a layout size.
    pub exempt_calls: Vec<String>,
}

/// Compiled secret detector.
#[derive(Debug, Clone)]
pub struct SecretPattern {
    pub name: String,
    pub regex: Regex,
    pub skip_in_literal: bool,
}

// ============================================================================
// Table Overrides
// ============================================================================

/// User-supplied additions and replacements, read from the `[rules]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOverrides {
    /// Source extensions replacing the default (`["dart"]`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_extensions: Option<Vec<String>>,
    /// Basenames added to the forbidden list.
    pub extra_forbidden_files: Vec<String>,
    /// Regexes added to the sensitive path patterns.
    pub extra_sensitive_patterns: Vec<String>,
    /// Globs added to the generated-file list.
    pub extra_generated_globs: Vec<String>,
    /// Replaces the widget mapping when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget_replacements: Option<Vec<WidgetReplacementSpec>>,
}

// ============================================================================
// Rule Tables
// ============================================================================

/// Every compiled table the checks read.
#[derive(Debug, Clone)]
pub struct RuleTables {
    pub conventional_title: Regex,
    pub description_min_len: usize,
    pub description_markers: Vec<String>,
    pub wip_prefixes: Vec<String>,
    pub forbidden_files: Vec<String>,
    pub sensitive_patterns: Vec<Regex>,
    pub source_extensions: Vec<String>,
    pub layer_rules: Vec<LayerRule>,
    pub ui_segments: Vec<String>,
    pub ui_suffixes: Vec<String>,
    pub hardcoded_patterns: Vec<Regex>,
    /// Text construct prefixes left open at the end of a line.
    pub hardcoded_open_patterns: Vec<Regex>,
    /// A literal at the start of a line, capturing `value`.
    pub leading_literal_patterns: Vec<Regex>,
    pub dynamic_markers: Vec<Regex>,
    pub debug_patterns: Vec<Regex>,
    pub todo_pattern: Regex,
    pub ticket_pattern: Regex,
    pub dimension_rules: Vec<DimensionRule>,
    pub widget_rules: Vec<WidgetRule>,
    pub wrapper_rules: Vec<WrapperRule>,
    pub secret_patterns: Vec<SecretPattern>,
    pub secret_placeholders: Vec<String>,
    pub safe_identifier_suffixes: Vec<String>,
    pub generated_files: GlobSet,
    pub test_files: GlobSet,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn compile_all<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<Vec<Regex>> {
    patterns
        .into_iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid pattern: {}", p)))
        .collect()
}

fn glob_set<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        builder.add(Glob::new(p).with_context(|| format!("invalid glob: {}", p))?);
    }
    Ok(builder.build()?)
}

/// Both quote styles of a UI text construct, capturing the literal as `value`.
fn quoted_literal_patterns(prefix: &str) -> [String; 2] {
    [
        format!(r"{}'(?P<value>(?:[^'\\\n]|\\.)*)'", prefix),
        format!(r#"{}"(?P<value>(?:[^"\\\n]|\\.)*)""#, prefix),
    ]
}

fn wrapper_rules(widgets: &[WidgetRule]) -> Result<Vec<WrapperRule>> {
    let mut wrappers: Vec<&str> = widgets.iter().map(|w| w.replacement.as_str()).collect();
    wrappers.sort_unstable();
    wrappers.dedup();
    if wrappers.is_empty() {
        return Ok(Vec::new());
    }

    let alternatives = wrappers
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");

    Ok(vec![WrapperRule {
        container: Regex::new(r"\b(?:Container|DecoratedBox)\(")?,
        wrapped: Regex::new(&format!(r"\bchild\s*:\s*(?:{})\(", alternatives))?,
        window: 3,
        message: "already-styled wrapper inside a styling container; pass style through the wrapper's parameters"
            .to_string(),
    }])
}

impl RuleTables {
    /// Compile the built-in tables.
    ///
    /// # Errors
    ///
    /// Returns an error only if a built-in pattern fails to compile.
    pub fn standard() -> Result<Self> {
        Self::with_overrides(&RuleOverrides::default())
    }

    /// Compile the built-in tables with user overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid user-supplied pattern.
    pub fn with_overrides(overrides: &RuleOverrides) -> Result<Self> {
        let mut forbidden_files = owned(FORBIDDEN_FILES);
        forbidden_files.extend(overrides.extra_forbidden_files.iter().cloned());

        let sensitive_patterns = compile_all(
            SENSITIVE_PATTERNS
                .iter()
                .copied()
                .chain(overrides.extra_sensitive_patterns.iter().map(String::as_str)),
        )?;

        let hardcoded: Vec<String> = HARDCODED_TEXT_PREFIXES
            .iter()
            .flat_map(|p| quoted_literal_patterns(p))
            .collect();

        let hardcoded_open: Vec<String> = HARDCODED_TEXT_PREFIXES
            .iter()
            .map(|p| format!("{}$", p))
            .collect();

        let dimension_rules = DIMENSION_RULES
            .iter()
            .map(|(prefix, accepted, suggestion, exempt)| {
                Ok(DimensionRule {
                    pattern: Regex::new(&format!("{}{}", prefix, DIMENSION_VALUE))?,
                    accepted_suffixes: owned(accepted),
                    suggestion: (*suggestion).to_string(),
                    exempt_calls: owned(exempt),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let widget_specs = overrides
            .widget_replacements
            .clone()
            .unwrap_or_else(default_widget_replacements);
        let widget_rules = widget_specs
            .iter()
            .map(WidgetRule::compile)
            .collect::<Result<Vec<_>>>()?;
        let wrapper_rules = wrapper_rules(&widget_rules)?;

        let secret_patterns = SECRET_PATTERNS
            .iter()
            .map(|(name, pattern, skip)| {
                Ok(SecretPattern {
                    name: (*name).to_string(),
                    regex: Regex::new(pattern)?,
                    skip_in_literal: *skip,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            conventional_title: Regex::new(CONVENTIONAL_TITLE)?,
            description_min_len: 10,
            description_markers: owned(DESCRIPTION_MARKERS),
            wip_prefixes: owned(WIP_PREFIXES),
            forbidden_files,
            sensitive_patterns,
            source_extensions: overrides
                .source_extensions
                .clone()
                .unwrap_or_else(|| owned(SOURCE_EXTENSIONS)),
            layer_rules: LAYER_RULES
                .iter()
                .map(|(folder, suffix)| LayerRule {
                    folder: (*folder).to_string(),
                    suffix: (*suffix).to_string(),
                })
                .collect(),
            ui_segments: owned(UI_SEGMENTS),
            ui_suffixes: owned(UI_SUFFIXES),
            hardcoded_patterns: compile_all(hardcoded.iter().map(String::as_str))?,
            hardcoded_open_patterns: compile_all(hardcoded_open.iter().map(String::as_str))?,
            leading_literal_patterns: compile_all(
                quoted_literal_patterns(r"^\s*").iter().map(String::as_str),
            )?,
            dynamic_markers: compile_all(DYNAMIC_MARKERS.iter().copied())?,
            debug_patterns: compile_all(DEBUG_PRINT_PATTERNS.iter().copied())?,
            todo_pattern: Regex::new(TODO_PATTERN)?,
            ticket_pattern: Regex::new(TICKET_PATTERN)?,
            dimension_rules,
            widget_rules,
            wrapper_rules,
            secret_patterns,
            secret_placeholders: owned(SECRET_PLACEHOLDERS),
            safe_identifier_suffixes: owned(SAFE_IDENTIFIER_SUFFIXES),
            generated_files: glob_set(
                GENERATED_GLOBS
                    .iter()
                    .copied()
                    .chain(overrides.extra_generated_globs.iter().map(String::as_str)),
            )?,
            test_files: glob_set(TEST_GLOBS.iter().copied())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tables_compile() {
        let tables = RuleTables::standard().unwrap();
        assert_eq!(tables.hardcoded_patterns.len(), HARDCODED_TEXT_PREFIXES.len() * 2);
        assert_eq!(tables.dimension_rules.len(), DIMENSION_RULES.len());
        assert_eq!(tables.widget_rules.len(), 8);
        assert_eq!(tables.wrapper_rules.len(), 1);
    }

    #[test]
    fn test_conventional_title_grammar() {
        let tables = RuleTables::standard().unwrap();
        let re = &tables.conventional_title;
        assert!(re.is_match("feat(login): add forgot password"));
        assert!(re.is_match("FIX: crash on start"));
        assert!(re.is_match("chore(deps): bump"));
        assert!(!re.is_match("Added login feature"));
        assert!(!re.is_match("feat:missing space"));
        assert!(!re.is_match("feature: not a type"));
    }

    #[test]
    fn test_hardcoded_patterns_capture_value() {
        let tables = RuleTables::standard().unwrap();
        let line = r#"child: Text('Welcome back'),"#;
        let value = tables
            .hardcoded_patterns
            .iter()
            .find_map(|p| p.captures(line))
            .and_then(|c| c.name("value"))
            .map(|m| m.as_str());
        assert_eq!(value, Some("Welcome back"));

        let escaped = r#"Text("say \"hi\"")"#;
        assert!(tables.hardcoded_patterns.iter().any(|p| p.is_match(escaped)));
    }

    #[test]
    fn test_open_prefix_and_leading_literal() {
        let tables = RuleTables::standard().unwrap();
        assert!(tables
            .hardcoded_open_patterns
            .iter()
            .any(|p| p.is_match("      AppText(")));
        assert!(!tables
            .hardcoded_open_patterns
            .iter()
            .any(|p| p.is_match("AppText(title),")));

        let value = tables
            .leading_literal_patterns
            .iter()
            .find_map(|p| p.captures("    'Welcome back to the application',"))
            .and_then(|c| c.name("value"))
            .map(|m| m.as_str());
        assert_eq!(value, Some("Welcome back to the application"));
    }

    #[test]
    fn test_dimension_value_and_suffix() {
        let tables = RuleTables::standard().unwrap();
        let height = &tables.dimension_rules[0];

        let caps = height.pattern.captures("height: 16.h,").unwrap();
        assert_eq!(&caps["value"], "16");
        assert_eq!(caps.name("suffix").map(|m| m.as_str()), Some("h"));

        let caps = height.pattern.captures("height: 16.5,").unwrap();
        assert_eq!(&caps["value"], "16.5");
        assert!(caps.name("suffix").is_none());
    }

    #[test]
    fn test_widget_rule_uses_word_boundary() {
        let rule = WidgetRule::compile(&WidgetReplacementSpec::new("Text", "AppText")).unwrap();
        assert!(rule.usage.is_match("child: Text('x')"));
        assert!(!rule.usage.is_match("child: AppText('x')"));
        assert!(!rule.usage.is_match("RichText(text: span)"));
        assert!(rule.definition.is_match("class AppText extends StatelessWidget {"));
    }

    #[test]
    fn test_dotted_baseline_is_escaped() {
        let rule =
            WidgetRule::compile(&WidgetReplacementSpec::new("Image.asset", "AppImage")).unwrap();
        assert!(rule.usage.is_match("Image.asset('a.png')"));
        assert!(!rule.usage.is_match("ImageXasset('a.png')"));
    }

    #[test]
    fn test_overrides_extend_tables() {
        let overrides = RuleOverrides {
            source_extensions: Some(vec!["dart".into(), "kt".into()]),
            extra_forbidden_files: vec!["firebase_options.dart".into()],
            extra_sensitive_patterns: vec![r"\.mobileprovision$".into()],
            extra_generated_globs: vec!["**/*.chopper.dart".into()],
            widget_replacements: Some(vec![WidgetReplacementSpec::new("Card", "AppCard")]),
        };
        let tables = RuleTables::with_overrides(&overrides).unwrap();
        assert!(tables.forbidden_files.contains(&"firebase_options.dart".to_string()));
        assert!(tables
            .sensitive_patterns
            .iter()
            .any(|p| p.is_match("ios/dist.mobileprovision")));
        assert!(tables.generated_files.is_match("lib/api.chopper.dart"));
        assert_eq!(tables.widget_rules.len(), 1);
        assert_eq!(tables.source_extensions.len(), 2);
    }

    #[test]
    fn test_invalid_override_pattern_is_reported() {
        let overrides = RuleOverrides {
            extra_sensitive_patterns: vec!["(unclosed".into()],
            ..RuleOverrides::default()
        };
        let err = RuleTables::with_overrides(&overrides).unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }
}
