//! Variant selection over module metadata
//!
//! A variant is a candidate when all of these hold:
//! - its capabilities are acceptable for the unit (none, exactly the unit's
//!   own, or one of the known exceptions below)
//! - its platform attribute, if any, names the target platform
//! - its category, if any, is `library`
//! - its usage, if any, fits the requested scope
//!
//! Exactly one candidate is selected. None is not an error; several is.

use graft_metadata::{Capability, ModuleMetadata, Variant};
use graft_types::{Coordinate, Platform, Scope};

pub const PLATFORM_ATTRIBUTE: &str = "org.jetbrains.kotlin.platform.type";
pub const USAGE_ATTRIBUTE: &str = "org.gradle.usage";
pub const CATEGORY_ATTRIBUTE: &str = "org.gradle.category";
pub const JVM_ENVIRONMENT_ATTRIBUTE: &str = "org.gradle.jvm.environment";

/// Modules whose variants also provide the kotlin-test framework capability
const KOTLIN_TEST_MODULES: [&str; 2] = ["kotlin-test-junit", "kotlin-test-junit5"];
const KOTLIN_TEST_FRAMEWORK_CAPABILITY: &str = "kotlin-test-framework-impl";

const GOOGLE_COLLECTIONS_GROUP: &str = "com.google.collections";
const GOOGLE_COLLECTIONS_NAME: &str = "google-collections";

/// Outcome of selecting a variant
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    Selected(&'a Variant),
    None,
    /// More than one candidate; nothing is selected
    Ambiguous,
}

/// Choose the variant of `metadata` that applies to `coordinate` for the
/// given scope and platform
///
/// Returns the selection plus the names of every remaining candidate, which
/// callers use to report ambiguity.
#[must_use]
pub fn select_variant<'a>(
    metadata: &'a ModuleMetadata,
    coordinate: &Coordinate,
    scope: Scope,
    platform: Platform,
) -> (Selection<'a>, Vec<&'a str>) {
    let candidates: Vec<&Variant> = metadata
        .variants
        .iter()
        .filter(|variant| capabilities_match(variant, coordinate, platform))
        .filter(|variant| platform_matches(variant, platform))
        .filter(|variant| category_matches(variant))
        .filter(|variant| usage_matches(variant, scope, platform))
        .collect();

    let names = candidates.iter().map(|variant| variant.name.as_str()).collect();
    let selection = match candidates.as_slice() {
        [] => Selection::None,
        [only] => Selection::Selected(only),
        _ => Selection::Ambiguous,
    };
    (selection, names)
}

fn is_own(capability: &Capability, coordinate: &Coordinate) -> bool {
    capability.group == coordinate.group && capability.name == coordinate.module
}

/// Capability filter, including the two exceptions where a variant
/// legitimately declares an extra capability next to the unit's own
pub(crate) fn capabilities_match(
    variant: &Variant,
    coordinate: &Coordinate,
    platform: Platform,
) -> bool {
    match variant.capabilities.as_slice() {
        [] => true,
        [only] => is_own(only, coordinate),
        many => {
            if !many.iter().any(|capability| is_own(capability, coordinate)) {
                return false;
            }
            let extras = || many.iter().filter(|capability| !is_own(capability, coordinate));

            if KOTLIN_TEST_MODULES.contains(&coordinate.module.as_str())
                && extras().all(|capability| capability.name == KOTLIN_TEST_FRAMEWORK_CAPABILITY)
            {
                return true;
            }

            // guava publishes google-collections as a second capability on
            // each JVM flavour; take the one built for the target environment
            extras().all(|capability| {
                capability.group == GOOGLE_COLLECTIONS_GROUP
                    && capability.name == GOOGLE_COLLECTIONS_NAME
            }) && platform.jvm_environment().is_some()
                && variant.attribute(JVM_ENVIRONMENT_ATTRIBUTE) == platform.jvm_environment()
        }
    }
}

fn platform_matches(variant: &Variant, platform: Platform) -> bool {
    variant
        .attribute(PLATFORM_ATTRIBUTE)
        .is_none_or(|value| value == platform.as_attribute())
}

fn category_matches(variant: &Variant) -> bool {
    variant
        .attribute(CATEGORY_ATTRIBUTE)
        .is_none_or(|category| category == "library")
}

fn usage_matches(variant: &Variant, scope: Scope, platform: Platform) -> bool {
    let Some(usage) = variant.attribute(USAGE_ATTRIBUTE) else {
        return true;
    };
    if usage == "kotlin-metadata" {
        return platform == Platform::Common;
    }
    match scope {
        Scope::Compile => usage.ends_with("-api"),
        Scope::Runtime | Scope::Test => usage.ends_with("-runtime"),
    }
}
