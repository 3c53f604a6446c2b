//! Throwaway node configurations for command tests.

use std::path::PathBuf;

use tempfile::TempDir;

/// A config file in a temp dir. The runtime socket does not exist, so
/// every container reads as not running and no DNS query is sent.
pub struct TestNode {
    _dir: TempDir,
    pub config_path: PathBuf,
    pub state_path: PathBuf,
}

impl TestNode {
    pub fn new(threshold: u32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let state_path = dir.path().join("state.redb");
        Self::with_state_path(dir, state_path, threshold)
    }

    pub fn with_state_path(dir: TempDir, state_path: PathBuf, threshold: u32) -> Self {
        let config_path = dir.path().join("dnsha.toml");
        let socket = dir.path().join("docker.sock");
        std::fs::write(
            &config_path,
            format!(
                "[node]\nname = 'dns-test'\n\n\
                 [heal]\nthreshold = {threshold}\nstate_path = '{}'\n\n\
                 [runtime]\nsocket = '{}'\ntimeout = '1s'\n\n\
                 [hook]\ndeadline = '5s'\n",
                state_path.display(),
                socket.display(),
            ),
        )
        .unwrap();
        Self {
            _dir: dir,
            config_path,
            state_path,
        }
    }

    /// A config file that parses but fails validation.
    pub fn invalid() -> Self {
        let node = Self::new(1);
        std::fs::write(&node.config_path, "[heal]\nthreshold = 0\n").unwrap();
        node
    }
}
