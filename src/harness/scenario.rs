use std::path::{Path, PathBuf};

use super::types::{HarnessResult, Scenario};
use crate::probe::Variant;

/// The `:WToggleClean` suite
pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "should look clean with the default theme",
            "clean_default.png",
            &["+WToggleClean"],
        ),
        Scenario::new(
            "should look clean with a dark theme",
            "clean_dark.png",
            &["+\"colorscheme desert\"", "+WToggleClean"],
        ),
        Scenario::new(
            "should update window brush when color scheme changes",
            "clean_dark.png",
            &["+WToggleClean", "+\"colorscheme desert\""],
        ),
        Scenario::new(
            "should look clean with guioptions already disabled",
            "clean_dark.png",
            &[
                "+\"set guioptions=\"",
                "+\"set columns=80\"",
                "+\"colorscheme desert\"",
                "+WToggleClean",
            ],
        ),
        Scenario::new(
            "should restore default state with default color scheme",
            "default.png",
            &["+WToggleClean", "+redraw", "+WToggleClean"],
        ),
        Scenario::new(
            "should restore default state with dark color scheme",
            "default_dark.png",
            &[
                "+\"colorscheme desert\"",
                "+WToggleClean",
                "+redraw",
                "+WToggleClean",
            ],
        ),
    ]
}

/// Load scenarios from a JSON array of `{desc, ref, args}` objects
pub fn load_scenarios(path: &Path) -> HarnessResult<Vec<Scenario>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// `<ref_root>/<variant>/<reference>`
pub fn reference_path(ref_root: &Path, variant: Variant, reference: &str) -> PathBuf {
    ref_root.join(variant.as_str()).join(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_suite_shape() {
        let scenarios = builtin_scenarios();
        assert_eq!(scenarios.len(), 6);
        assert_eq!(scenarios[0].reference, "clean_default.png");
        assert_eq!(scenarios[0].args, vec!["+WToggleClean"]);
        assert_eq!(scenarios[4].reference, "default.png");
        assert_eq!(scenarios[4].args.len(), 3);
    }

    #[test]
    fn test_reference_path_switches_on_variant() {
        let root = Path::new("test/ref");
        assert_eq!(
            reference_path(root, Variant::Server, "default.png"),
            PathBuf::from("test/ref/server/default.png")
        );
        assert_eq!(
            reference_path(root, Variant::Desktop, "default.png"),
            PathBuf::from("test/ref/desktop/default.png")
        );
    }

    #[test]
    fn test_load_scenarios_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenarios.json");
        std::fs::write(
            &path,
            r#"[{"desc": "plain", "ref": "default.png"}, {"desc": "clean", "ref": "clean_default.png", "args": ["+WToggleClean"]}]"#,
        )
        .unwrap();

        let scenarios = load_scenarios(&path).unwrap();
        assert_eq!(scenarios.len(), 2);
        assert!(scenarios[0].args.is_empty());
        assert_eq!(scenarios[1].args, vec!["+WToggleClean"]);
    }

    #[test]
    fn test_load_scenarios_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{").unwrap();
        assert!(matches!(
            load_scenarios(&path),
            Err(crate::harness::types::HarnessError::Scenario(_))
        ));
    }
}
