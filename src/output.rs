use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::vector::Vec3;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("meshvox-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_write_points() {
        let dir = scratch_dir("points");
        let path = dir.join("inside.dat");
        write_points(&path, &[Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.5, 0.0, -1.0)]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "1 2 3\n4.5 0 -1\n");
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_write_report() {
        #[derive(Serialize)]
        struct Row {
            tick: usize,
        }

        let dir = scratch_dir("report");
        let path = dir.join("report.json");
        write_report(&path, &[Row { tick: 0 }, Row { tick: 1 }]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[1]["tick"], 1);
        fs::remove_dir_all(dir).unwrap();
    }
}

/// Write points to a file, one `x y z` line each
pub fn write_points(path: &Path, points: &[Vec3]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("could not create {:?}", path))?;
    let mut writer = BufWriter::new(file);

    for p in points {
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }
    writer.flush()?;

    Ok(())
}

/// Write any serialisable report to a file as pretty-printed JSON
pub fn write_report<T: Serialize + ?Sized>(path: &Path, report: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("could not create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
