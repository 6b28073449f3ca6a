//! onboarding::title
//!
//! Project names from onboarding issue titles.

use super::OnboardingError;

/// Tag that onboarding issue titles start with.
pub const ONBOARDING_TAG: &str = "[PROJECT ONBOARDING]";

/// Extract the project name from an issue title.
///
/// Titles look like `[PROJECT ONBOARDING] envoy`. Any leading bracketed tag
/// is accepted; a title without one is taken whole.
///
/// # Errors
///
/// `OnboardingError::InvalidTitle` when no name remains, or the tag is not
/// closed.
///
/// # Example
///
/// ```
/// use maintainerd::onboarding::project_name_from_title;
///
/// assert_eq!(project_name_from_title("[PROJECT ONBOARDING] envoy").unwrap(), "envoy");
/// assert!(project_name_from_title("[PROJECT ONBOARDING]   ").is_err());
/// ```
pub fn project_name_from_title(title: &str) -> Result<String, OnboardingError> {
    let title = title.trim();
    let rest = match title.strip_prefix('[') {
        Some(tagged) => match tagged.split_once(']') {
            Some((_, rest)) => rest,
            None => return Err(OnboardingError::InvalidTitle(title.to_string())),
        },
        None => title,
    };

    let name = rest.trim();
    if name.is_empty() {
        return Err(OnboardingError::InvalidTitle(title.to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_title() {
        let title = format!("{} Kubernetes Dashboard", ONBOARDING_TAG);
        assert_eq!(project_name_from_title(&title).unwrap(), "Kubernetes Dashboard");
    }

    #[test]
    fn other_tags_and_spacing() {
        assert_eq!(project_name_from_title("  [Onboarding]envoy  ").unwrap(), "envoy");
        assert_eq!(project_name_from_title("linkerd").unwrap(), "linkerd");
    }

    #[test]
    fn empty_names_fail() {
        for title in ["", "   ", "[PROJECT ONBOARDING]", "[PROJECT ONBOARDING]   "] {
            assert!(matches!(
                project_name_from_title(title),
                Err(OnboardingError::InvalidTitle(_))
            ));
        }
    }

    #[test]
    fn unclosed_tag_fails() {
        assert!(project_name_from_title("[PROJECT ONBOARDING envoy").is_err());
    }
}
