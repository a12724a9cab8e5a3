//! User configuration.
//!
//! The installer reads `~/.liveryinstaller/config.ini` to fill in defaults
//! for the command line. The file is never written by the installer.
//!
//! ```ini
//! [paths]
//! community_dir = ~/MSFS/Community
//! reference_dir = ~/.liveryinstaller/reference
//! converter = ~/tools/ptp-converter.exe
//!
//! [state]
//! pmdg-aircraft-77w = ~/MSFS/LocalState/packages/pmdg-aircraft-77w
//!
//! [install]
//! variant = 777-300ER
//! converter_timeout_secs = 300
//! ```

mod file;
mod parser;

pub use file::{
    config_directory, config_file_path, ConfigFile, ConfigFileError, InstallSection,
    PathsSection,
};
