//! Default build settings for the generated configurations.
//!
//! The tables reproduce the settings a fresh iOS application project starts
//! with. Keys are sorted again at serialisation time, so table order carries
//! no meaning.

use super::{BuildConfiguration, ProjectSettings, SettingValue, Settings};

const PROJECT_COMMON: &[(&str, &str)] = &[
    ("ALWAYS_SEARCH_USER_PATHS", "NO"),
    ("ASASSETCATALOG_COMPILER_GENERATE_SWIFT_ASSET_SYMBOL_EXTENSIONS", "YES"),
    ("CLANG_ANALYZER_NONNULL", "YES"),
    ("CLANG_ANALYZER_NUMBER_OBJECT_CONVERSION", "YES_AGGRESSIVE"),
    ("CLANG_CXX_LANGUAGE_STANDARD", "gnu++20"),
    ("CLANG_ENABLE_MODULES", "YES"),
    ("CLANG_ENABLE_OBJC_ARC", "YES"),
    ("CLANG_ENABLE_OBJC_WEAK", "YES"),
    ("CLANG_WARN_BLOCK_CAPTURE_AUTORELEASING", "YES"),
    ("CLANG_WARN_BOOL_CONVERSION", "YES"),
    ("CLANG_WARN_COMMA", "YES"),
    ("CLANG_WARN_CONSTANT_CONVERSION", "YES"),
    ("CLANG_WARN_DEPRECATED_OBJC_IMPLEMENTATIONS", "YES"),
    ("CLANG_WARN_DIRECT_OBJC_ISA_USAGE", "YES_ERROR"),
    ("CLANG_WARN_DOCUMENTATION_COMMENTS", "YES"),
    ("CLANG_WARN_EMPTY_BODY", "YES"),
    ("CLANG_WARN_ENUM_CONVERSION", "YES"),
    ("CLANG_WARN_INFINITE_RECURSION", "YES"),
    ("CLANG_WARN_INT_CONVERSION", "YES"),
    ("CLANG_WARN_NON_LITERAL_NULL_CONVERSION", "YES"),
    ("CLANG_WARN_OBJC_IMPLICIT_RETAIN_SELF", "YES"),
    ("CLANG_WARN_OBJC_LITERAL_CONVERSION", "YES"),
    ("CLANG_WARN_OBJC_ROOT_CLASS", "YES_ERROR"),
    ("CLANG_WARN_QUOTED_INCLUDE_IN_FRAMEWORK_HEADER", "YES"),
    ("CLANG_WARN_RANGE_LOOP_ANALYSIS", "YES"),
    ("CLANG_WARN_STRICT_PROTOTYPES", "YES"),
    ("CLANG_WARN_SUSPICIOUS_MOVE", "YES"),
    ("CLANG_WARN_UNGUARDED_AVAILABILITY", "YES_AGGRESSIVE"),
    ("CLANG_WARN_UNREACHABLE_CODE", "YES"),
    ("CLANG_WARN__DUPLICATE_METHOD_MATCH", "YES"),
    ("COPY_PHASE_STRIP", "NO"),
    ("ENABLE_STRICT_OBJC_MSGSEND", "YES"),
    ("ENABLE_USER_SCRIPT_SANDBOXING", "YES"),
    ("GCC_C_LANGUAGE_STANDARD", "gnu17"),
    ("GCC_NO_COMMON_BLOCKS", "YES"),
    ("GCC_WARN_64_TO_32_BIT_CONVERSION", "YES"),
    ("GCC_WARN_ABOUT_RETURN_TYPE", "YES_ERROR"),
    ("GCC_WARN_UNDECLARED_SELECTOR", "YES"),
    ("GCC_WARN_UNINITIALIZED_AUTOS", "YES_AGGRESSIVE"),
    ("GCC_WARN_UNUSED_FUNCTION", "YES"),
    ("GCC_WARN_UNUSED_VARIABLE", "YES"),
    ("LOCALIZATION_PREFERS_STRING_CATALOGS", "YES"),
    ("MTL_FAST_MATH", "YES"),
    ("SDKROOT", "iphoneos"),
];

const PROJECT_DEBUG: &[(&str, &str)] = &[
    ("DEBUG_INFORMATION_FORMAT", "dwarf"),
    ("ENABLE_TESTABILITY", "YES"),
    ("GCC_DYNAMIC_NO_PIC", "NO"),
    ("GCC_OPTIMIZATION_LEVEL", "0"),
    ("MTL_ENABLE_DEBUG_INFO", "INCLUDE_SOURCE"),
    ("ONLY_ACTIVE_ARCH", "YES"),
    ("SWIFT_ACTIVE_COMPILATION_CONDITIONS", "DEBUG"),
    ("SWIFT_OPTIMIZATION_LEVEL", "-Onone"),
];

const PROJECT_RELEASE: &[(&str, &str)] = &[
    ("DEBUG_INFORMATION_FORMAT", "dwarf-with-dsym"),
    ("ENABLE_NS_ASSERTIONS", "NO"),
    ("MTL_ENABLE_DEBUG_INFO", "NO"),
    ("SWIFT_COMPILATION_MODE", "wholemodule"),
    ("VALIDATE_PRODUCT", "YES"),
];

const TARGET_COMMON: &[(&str, &str)] = &[
    ("ASASSETCATALOG_COMPILER_APPICON_NAME", "AppIcon"),
    ("ASASSETCATALOG_COMPILER_GLOBAL_ACCENT_COLOR_NAME", "AccentColor"),
    ("CODE_SIGN_STYLE", "Automatic"),
    ("DEVELOPMENT_ASSET_PATHS", ""),
    ("ENABLE_PREVIEWS", "YES"),
    ("GENERATE_INFOPLIST_FILE", "NO"),
    ("INFOPLIST_KEY_UIApplicationSceneManifest_Generation", "YES"),
    ("INFOPLIST_KEY_UIApplicationSupportsIndirectInputEvents", "YES"),
    ("INFOPLIST_KEY_UILaunchScreen_Generation", "YES"),
    (
        "INFOPLIST_KEY_UISupportedInterfaceOrientations_iPad",
        "UIInterfaceOrientationPortrait UIInterfaceOrientationPortraitUpsideDown UIInterfaceOrientationLandscapeLeft UIInterfaceOrientationLandscapeRight",
    ),
    (
        "INFOPLIST_KEY_UISupportedInterfaceOrientations_iPhone",
        "UIInterfaceOrientationPortrait UIInterfaceOrientationLandscapeLeft UIInterfaceOrientationLandscapeRight",
    ),
    ("SWIFT_EMIT_LOC_STRINGS", "YES"),
    ("TARGETED_DEVICE_FAMILY", "1,2"),
];

fn extend(settings: &mut Settings, table: &[(&str, &str)]) {
    settings.extend(
        table
            .iter()
            .map(|(key, value)| ((*key).to_owned(), SettingValue::from(*value))),
    );
}

fn list(items: &[&str]) -> SettingValue {
    SettingValue::List(items.iter().map(|item| (*item).to_owned()).collect())
}

/// Project-level settings for `configuration`.
#[must_use]
pub fn project_settings(configuration: BuildConfiguration, project: &ProjectSettings) -> Settings {
    let mut settings = Settings::new();
    extend(&mut settings, PROJECT_COMMON);
    match configuration {
        BuildConfiguration::Debug => {
            extend(&mut settings, PROJECT_DEBUG);
            settings.insert(
                "GCC_PREPROCESSOR_DEFINITIONS".into(),
                list(&["DEBUG=1", "$(inherited)"]),
            );
        }
        BuildConfiguration::Release => extend(&mut settings, PROJECT_RELEASE),
    }
    settings.insert(
        "IPHONEOS_DEPLOYMENT_TARGET".into(),
        project.deployment_target.as_str().into(),
    );
    settings
}

/// Target-level settings; identical for both configurations unless the
/// project overrides them.
#[must_use]
pub fn target_settings(project: &ProjectSettings) -> Settings {
    let mut settings = Settings::new();
    extend(&mut settings, TARGET_COMMON);
    let derived = [
        ("CURRENT_PROJECT_VERSION", project.current_project_version.as_str()),
        ("INFOPLIST_FILE", project.info_plist.as_str()),
        ("MARKETING_VERSION", project.marketing_version.as_str()),
        ("PRODUCT_NAME", project.name.as_str()),
        ("SWIFT_VERSION", project.swift_version.as_str()),
    ];
    extend(&mut settings, &derived);
    settings.insert(
        "LD_RUNPATH_SEARCH_PATHS".into(),
        list(&["$(inherited)", "@executable_path/Frameworks"]),
    );
    settings.insert(
        "PRODUCT_BUNDLE_IDENTIFIER".into(),
        project.bundle_identifier().into(),
    );
    settings.extend(
        project
            .build_settings
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    settings
}
