use std::path::Path;

use tempfile::TempDir;

use huddle::board::BoardStore;
use huddle::config::BoardsConfig;
use huddle::directory::DirectoryStore;
use huddle::grant::GrantStore;
use huddle::project::ProjectStore;
use huddle::storage::Storage;

/// An isolated data directory with stores over it.
pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let env = Self { dir };
        env.storage().init().expect("init storage");
        env
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn storage(&self) -> Storage {
        Storage::new(self.dir.path().to_path_buf())
    }

    pub fn directory(&self) -> DirectoryStore {
        DirectoryStore::new(self.storage())
    }

    pub fn grants(&self) -> GrantStore {
        GrantStore::new(self.storage())
    }

    pub fn projects(&self) -> ProjectStore {
        ProjectStore::new(self.storage())
    }

    pub fn boards(&self) -> BoardStore {
        BoardStore::new(self.storage())
    }

    pub fn boards_config(&self) -> BoardsConfig {
        BoardsConfig::default()
    }
}

/// A `huddle` command pointed at the test data dir, acting as `user`.
pub fn huddle_cmd(env: &TestEnv, user: &str) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("huddle").expect("huddle binary");
    cmd.env("HUDDLE_DATA_DIR", env.path());
    cmd.env("HUDDLE_USER", user);
    cmd
}
