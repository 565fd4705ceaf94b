use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipArchive;

/// A loaded .sb3 project: the parsed project.json plus every other archive
/// entry kept as opaque bytes. Assets are never inspected or re-encoded; they
/// ride along unchanged into the output archive.
pub struct ProjectArchive {
    pub project: Value,
    pub assets: HashMap<String, Vec<u8>>,
}

pub fn read_sb3(input: &Path) -> Result<ProjectArchive> {
    check_extension(input)?;
    let file =
        fs::File::open(input).with_context(|| format!("Failed to open '{}'.", input.display()))?;
    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("'{}' is not a valid zip/.sb3 file.", input.display()))?;
    read_archive(&mut zip, &input.display().to_string())
}

pub fn read_sb3_bytes(bytes: &[u8]) -> Result<ProjectArchive> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))
        .map_err(|_| anyhow!("Input is not a valid zip/.sb3 archive."))?;
    read_archive(&mut zip, "<bytes>")
}

fn read_archive<R: Read + Seek>(zip: &mut ZipArchive<R>, label: &str) -> Result<ProjectArchive> {
    let mut project_json_str = String::new();
    {
        let mut entry = zip
            .by_name("project.json")
            .map_err(|_| anyhow!("project.json not found in '{}'.", label))?;
        entry.read_to_string(&mut project_json_str)?;
    }
    let project: Value = serde_json::from_str(&project_json_str)
        .with_context(|| format!("Invalid project.json inside '{}'.", label))?;

    let mut assets = HashMap::new();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        if name == "project.json" || name.ends_with('/') {
            continue;
        }
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        assets.insert(name, bytes);
    }

    Ok(ProjectArchive { project, assets })
}

pub fn write_sb3(archive: &ProjectArchive, output: &Path) -> Result<()> {
    check_extension(output)?;
    let bytes = build_sb3_bytes(archive)?;
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output, bytes).with_context(|| format!("Failed to write '{}'.", output.display()))?;
    Ok(())
}

pub fn build_sb3_bytes(archive: &ProjectArchive) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::<u8>::new());
    let mut zip = zip::ZipWriter::new(&mut buffer);
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("project.json", opts)?;
    zip.write_all(&serde_json::to_vec(&archive.project)?)?;

    let mut assets = archive.assets.iter().collect::<Vec<_>>();
    assets.sort_by(|(left_name, _), (right_name, _)| left_name.cmp(right_name));
    for (name, bytes) in assets {
        zip.start_file(name.as_str(), opts)?;
        zip.write_all(bytes)?;
    }
    zip.finish()?;
    Ok(buffer.into_inner())
}

fn check_extension(path: &Path) -> Result<()> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("sb3") {
        bail!("'{}' is not a .sb3 file.", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_archive() -> ProjectArchive {
        ProjectArchive {
            project: json!({ "targets": [], "meta": {} }),
            assets: HashMap::from([
                ("aa.svg".to_string(), b"<svg/>".to_vec()),
                ("bb.wav".to_string(), vec![0u8, 1, 2]),
            ]),
        }
    }

    #[test]
    fn bytes_round_trip_preserves_project_and_assets() {
        let bytes = build_sb3_bytes(&sample_archive()).unwrap();
        let reread = read_sb3_bytes(&bytes).unwrap();
        assert_eq!(reread.project, json!({ "targets": [], "meta": {} }));
        assert_eq!(reread.assets.len(), 2);
        assert_eq!(reread.assets["aa.svg"], b"<svg/>".to_vec());
        assert_eq!(reread.assets["bb.wav"], vec![0u8, 1, 2]);
    }

    #[test]
    fn missing_project_json_is_an_error() {
        let mut buffer = Cursor::new(Vec::<u8>::new());
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let opts = SimpleFileOptions::default();
        zip.start_file("not-a-project.txt", opts).unwrap();
        zip.write_all(b"hello").unwrap();
        zip.finish().unwrap();
        let bytes = buffer.into_inner();
        assert!(read_sb3_bytes(&bytes).is_err());
    }

    #[test]
    fn wrong_extension_is_rejected() {
        assert!(read_sb3(Path::new("project.zip")).is_err());
        assert!(write_sb3(&sample_archive(), Path::new("out.txt")).is_err());
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(read_sb3_bytes(b"definitely not a zip").is_err());
    }
}
