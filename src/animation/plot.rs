// Plain-text export of mix diagnostics
// <dir>/<source>_<target>__heatmap.txt holds one row of distances per source frame,
// <dir>/<source>_<target>__refFrames.txt holds the winning target frame per source frame

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct PlotWriter {
    heatmap: BufWriter<File>,
    ref_frames: BufWriter<File>,
    prefix: PathBuf,
    failed: bool,
}

impl PlotWriter {
    /// Create `dir` if needed and open both tables. Returns `None`, after
    /// logging a warning, when the directory or files cannot be used.
    pub fn open(dir: &Path, source: &str, target: &str) -> Option<Self> {
        if let Err(err) = fs::create_dir_all(dir) {
            log::warn!(
                "Couldn't use {} to store plot data: {err}",
                dir.display()
            );
            return None;
        }

        let prefix = dir.join(format!("{source}_{target}"));
        let open = |suffix: &str| {
            let path = with_suffix(&prefix, suffix);
            File::create(&path)
                .map(BufWriter::new)
                .map_err(|err| log::warn!("Couldn't create {}: {err}", path.display()))
                .ok()
        };

        Some(Self {
            heatmap: open("__heatmap.txt")?,
            ref_frames: open("__refFrames.txt")?,
            prefix,
            failed: false,
        })
    }

    pub fn heatmap_path(&self) -> PathBuf {
        with_suffix(&self.prefix, "__heatmap.txt")
    }

    pub fn ref_frames_path(&self) -> PathBuf {
        with_suffix(&self.prefix, "__refFrames.txt")
    }

    /// Append one distance; `last` ends the current row
    pub fn distance(&mut self, value: f32, last: bool) {
        let sep = if last { "\n" } else { " " };
        let res = write!(self.heatmap, "{value}{sep}");
        self.check(res);
    }

    pub fn winner(&mut self, source: usize, target: usize) {
        let res = writeln!(self.ref_frames, "{source} {target}");
        self.check(res);
    }

    pub fn finish(mut self) {
        let res = self.heatmap.flush().and_then(|_| self.ref_frames.flush());
        self.check(res);
        if !self.failed {
            log::debug!("Plot data written to {}", self.prefix.display());
        }
    }

    fn check(&mut self, res: std::io::Result<()>) {
        if let Err(err) = res {
            if !self.failed {
                log::warn!("Writing plot data to {} failed: {err}", self.prefix.display());
            }
            self.failed = true;
        }
    }
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("plots");

        let mut writer = PlotWriter::open(&target, "idle", "run").unwrap();
        writer.distance(1.5, false);
        writer.distance(0.0, true);
        writer.winner(0, 1);
        let heatmap = writer.heatmap_path();
        let ref_frames = writer.ref_frames_path();
        writer.finish();

        assert_eq!(heatmap, target.join("idle_run__heatmap.txt"));
        assert_eq!(fs::read_to_string(heatmap).unwrap(), "1.5 0\n");
        assert_eq!(fs::read_to_string(ref_frames).unwrap(), "0 1\n");
    }

    #[test]
    fn unusable_directory_disables_export() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, "not a directory").unwrap();

        assert!(PlotWriter::open(&file, "a", "b").is_none());
    }
}
