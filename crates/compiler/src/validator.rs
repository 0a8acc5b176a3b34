//! Post-render checks on compiled agents. Findings are warnings only.

use skillforge_matrix::frontmatter::split_frontmatter;

/// Section markers every compiled agent carries. `<output_format>` and the
/// other optional sections depend on which fragments the agent ships.
pub const CONVENTIONAL_SECTIONS: [&str; 2] = ["<role>", "<workflow>"];

#[cfg(test)]
use mockall::automock;

/// Inspects rendered agent output and returns non-fatal warnings.
#[cfg_attr(test, automock)]
pub trait OutputValidator: Send + Sync {
    fn validate(&self, agent: &str, output: &str) -> Vec<String>;
}

/// Checks for YAML frontmatter and the conventional section markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionValidator;

impl OutputValidator for SectionValidator {
    fn validate(&self, agent: &str, output: &str) -> Vec<String> {
        let mut warnings = Vec::new();
        let (frontmatter, body) = split_frontmatter(output);
        match frontmatter {
            None => warnings.push(format!("{agent}: missing YAML frontmatter")),
            Some(yaml) if serde_yaml::from_str::<serde_yaml::Mapping>(yaml).is_err() => {
                warnings.push(format!("{agent}: frontmatter is not a YAML mapping"))
            }
            Some(_) => {}
        }
        for section in CONVENTIONAL_SECTIONS {
            if !body.contains(section) {
                warnings.push(format!("{agent}: missing conventional section {section}"));
            }
        }
        warnings
    }
}
