// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.


use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

static FILE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// A settings file in the temp directory, removed on drop.
pub struct TempSettingsFile {
    pub path: PathBuf,
}

impl TempSettingsFile {
    pub fn with_contents(contents: &str) -> Self {
        let id = FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "prefstore_settings_{}_{id}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).expect("Failed to write settings file");
        Self { path }
    }

    pub fn rewrite(&self, contents: &str) {
        std::fs::write(&self.path, contents).expect("Failed to rewrite settings file");
    }
}

impl Drop for TempSettingsFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
