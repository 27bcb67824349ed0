//! Editor command-line construction.
//!
//! Arguments are produced in Windows verbatim form: nested Ex commands carry
//! their own double quotes (`+"set title"`) so that gvim's command-line
//! parser sees one argument per command. [`unquote_verbatim`] recovers the
//! parsed form for platforms that pass argv directly.

use std::path::{Path, PathBuf};

use crate::config::DEFAULT_TITLE;

/// Fixed launch settings shared by every scenario
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Plugin directory appended to `runtimepath`
    pub plugin_path: PathBuf,
    /// Window title, fixed so the capture script can find the window
    pub title: String,
}

impl LaunchConfig {
    /// Create a launch config for the plugin at the given path
    pub fn new(plugin_path: impl Into<PathBuf>) -> Self {
        Self {
            plugin_path: plugin_path.into(),
            title: DEFAULT_TITLE.to_string(),
        }
    }

    /// Set the window title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Build the full argument list: fixed flags first, then `commands` verbatim
    pub fn arguments(&self, commands: &[String]) -> Vec<String> {
        let mut args = vec![
            // No compatible mode
            "-N".to_string(),
            // Skip .vimrc and .gvimrc
            "-u".to_string(),
            "NORC".to_string(),
            "-U".to_string(),
            "NORC".to_string(),
            "--cmd".to_string(),
            format!(
                "\"set noswapfile | set rtp+={} | set shortmess+=I\"",
                display_path(&self.plugin_path)
            ),
            // A blinking cursor makes captures nondeterministic
            "+\"set guicursor=n:blinkon0\"".to_string(),
            "+\"set title\"".to_string(),
            format!("+\"set titlestring={}\"", self.title),
        ];
        args.extend(commands.iter().cloned());
        args
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Strip the command-line quoting of a verbatim argument.
///
/// `+"set title"` becomes `+set title`, `"a | b"` becomes `a | b`; arguments
/// without surrounding quotes are returned unchanged.
pub fn unquote_verbatim(arg: &str) -> String {
    let (prefix, rest) = match arg.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", arg),
    };
    match rest.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        Some(inner) => format!("{}{}", prefix, inner),
        None => arg.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn commands(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_fixed_flags_precede_commands() {
        let config = LaunchConfig::new("/src/wimproved.vim");
        let args = config.arguments(&commands(&["+WToggleClean"]));
        assert_eq!(
            args,
            vec![
                "-N",
                "-u",
                "NORC",
                "-U",
                "NORC",
                "--cmd",
                "\"set noswapfile | set rtp+=/src/wimproved.vim | set shortmess+=I\"",
                "+\"set guicursor=n:blinkon0\"",
                "+\"set title\"",
                "+\"set titlestring=wimproved.vim\"",
                "+WToggleClean",
            ]
        );
    }

    #[test]
    fn test_commands_cannot_displace_fixed_flags() {
        let config = LaunchConfig::new("plugin");
        let empty = config.arguments(&[]);
        let scenario = commands(&["-u", "evil.vim", "+\"colorscheme desert\""]);
        let args = config.arguments(&scenario);

        assert_eq!(&args[..empty.len()], empty.as_slice());
        assert_eq!(&args[empty.len()..], scenario.as_slice());
    }

    #[test]
    fn test_custom_title() {
        let args = LaunchConfig::new("p").title("vt").arguments(&[]);
        assert_eq!(args.last().map(String::as_str), Some("+\"set titlestring=vt\""));
    }

    #[test]
    fn test_unquote_verbatim() {
        assert_eq!(unquote_verbatim("+\"set title\""), "+set title");
        assert_eq!(unquote_verbatim("\"set a | set b\""), "set a | set b");
        assert_eq!(unquote_verbatim("+WToggleClean"), "+WToggleClean");
        assert_eq!(unquote_verbatim("-N"), "-N");
        assert_eq!(unquote_verbatim("\""), "\"");
    }
}
