#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Movement export with three orders; `39999` falls outside the default prefix.
pub const MOVEMENTS_CSV: &str = "\
Material,Material Description,Order,Qty in Un. of Entry
40001,Bracket,1000001,60
40001,Bracket,1000001,40
40002,Hinge,1000002,\"1.250,5\"
39999,Packaging,1000001,7
40003,Screw,1000099,3
";

/// Maps orders to lines; order `1000099` is deliberately absent.
pub const MAPPING_CSV: &str = "\
Order,Production Line
1000001,LINE 01
1000002,LINE 40
";

/// Manual grid pasted twice for LINE 01 and with a duplicate `40001` column.
pub const MANUAL_CSV: &str = "\
Line,40001,40002,40001
LINE 01,50,,30
LINE 01,10,,0
LINE 40,,\"1.250,5\",
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes the three standard inputs and returns (movements, mapping, manual).
    pub fn standard_inputs(&self) -> (PathBuf, PathBuf, PathBuf) {
        (
            self.write("movements.csv", MOVEMENTS_CSV),
            self.write("mapping.csv", MAPPING_CSV),
            self.write("manual.csv", MANUAL_CSV),
        )
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("read workspace file")
    }
}
