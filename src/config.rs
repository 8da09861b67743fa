use std::{env, path::{Path, PathBuf}};

/// Settings for the interpreter and the driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Directory whose `*.scm` files are evaluated into every new global frame
    pub library: Option<PathBuf>,
    /// Run the REPL even when stdin is not a terminal
    pub interactive: bool,
}

impl Config {
    /// Reads `SCHEMER_LIBRARY` and `SCHEMER_INTERACTIVE`.
    pub fn from_env() -> Self {
        Self {
            library: env::var_os("SCHEMER_LIBRARY").map(PathBuf::from),
            interactive: env::var_os("SCHEMER_INTERACTIVE").is_some(),
        }
    }

    pub fn with_library<P: AsRef<Path>>(mut self, library: P) -> Self {
        self.library = Some(library.as_ref().to_path_buf());
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let config = Config::default()
            .with_library("/usr/share/schemer")
            .with_interactive(true);

        assert_eq!(config.library, Some(PathBuf::from("/usr/share/schemer")));
        assert!(config.interactive);
        assert_eq!(Config::default().library, None);
    }
}
