//! Output file rendering
//!
//! Every file is rendered in memory first and only written once all of them
//! are ready. Files are staged under temporary names and renamed into place.
//! A failed write or rename removes every staged file not yet moved.

use anyhow::{Context, Result};
use chaintable_common::{Chain, OutputConfig};
use std::path::{Path, PathBuf};
use tracing::info;

pub const CHAINS_FILE: &str = "generated_chains.csv";
pub const CHAIN_TABLE_FILE: &str = "generated_chain_table.csv";
pub const CREATE_TARGET_FILE: &str = "create_target_cmd.txt";
pub const REMOVE_TARGET_FILE: &str = "remove_target_cmd.txt";

/// Rendered output files, ready to be written
pub struct RenderedOutput {
    files: Vec<(&'static str, String)>,
}

impl RenderedOutput {
    /// Render all output files for a chain list
    pub fn render(chains: &[Chain], output: &OutputConfig) -> Self {
        Self {
            files: vec![
                (CHAINS_FILE, render_chains_csv(chains)),
                (CHAIN_TABLE_FILE, render_chain_table_csv(chains)),
                (CREATE_TARGET_FILE, render_create_target_cmds(chains, output)),
                (REMOVE_TARGET_FILE, render_remove_target_cmds(chains)),
            ],
        }
    }

    /// File names and contents
    pub fn files(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.files
            .iter()
            .map(|(name, contents)| (*name, contents.as_str()))
    }

    /// Write every file into `dir`, creating it if needed
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(self.files.len());
        for (name, contents) in &self.files {
            let tmp = dir.join(format!(".{name}.tmp"));
            if let Err(e) = std::fs::write(&tmp, contents) {
                discard(&staged);
                return Err(e).with_context(|| format!("Failed to write {}", tmp.display()));
            }
            staged.push((tmp, dir.join(name)));
        }

        for (i, (tmp, path)) in staged.iter().enumerate() {
            if let Err(e) = std::fs::rename(tmp, path) {
                discard(&staged[i..]);
                return Err(e)
                    .with_context(|| format!("Failed to move {} into place", path.display()));
            }
            info!("Wrote {}", path.display());
        }
        Ok(())
    }
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = std::fs::remove_file(tmp);
    }
}

fn join_lines(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// `ChainId,TargetId,...` table; the header has one column per member of
/// the first chain
pub fn render_chains_csv(chains: &[Chain]) -> String {
    let width = chains.first().map_or(0, Chain::len);
    let header: Vec<&str> = std::iter::once("ChainId")
        .chain(std::iter::repeat_n("TargetId", width))
        .collect();

    let mut lines = Vec::with_capacity(chains.len() + 1);
    lines.push(header.join(","));
    for chain in chains {
        let mut row = vec![chain.chain_id.to_string()];
        row.extend(chain.target_ids().map(|id| id.to_string()));
        lines.push(row.join(","));
    }
    join_lines(&lines)
}

/// Flat list of chain ids
pub fn render_chain_table_csv(chains: &[Chain]) -> String {
    let mut lines = Vec::with_capacity(chains.len() + 1);
    lines.push("ChainId".to_string());
    lines.extend(chains.iter().map(|chain| chain.chain_id.to_string()));
    join_lines(&lines)
}

/// One `create-target` admin command per chain member, in chain order
pub fn render_create_target_cmds(chains: &[Chain], output: &OutputConfig) -> String {
    let mut options = String::new();
    if !output.chunk_sizes.is_empty() {
        options.push_str(" --chunk-size ");
        options.push_str(&output.chunk_sizes.join(" "));
    }
    if output.use_new_chunk_engine {
        options.push_str(" --use-new-chunk-engine");
    }

    let lines: Vec<String> = chains
        .iter()
        .flat_map(|chain| chain.target_list.iter().map(move |t| (chain.chain_id, t)))
        .map(|(chain_id, target)| {
            format!(
                "create-target --node-id {} --disk-index {} --target-id {} --chain-id {}{options}",
                target.node_id, target.disk_index, target.target_id, chain_id
            )
        })
        .collect();
    join_lines(&lines)
}

/// `offline-target` followed by `remove-target` for every chain member
pub fn render_remove_target_cmds(chains: &[Chain]) -> String {
    let lines: Vec<String> = chains
        .iter()
        .flat_map(|chain| chain.target_list.iter())
        .flat_map(|target| {
            [
                format!(
                    "offline-target --node-id {} --target-id {}",
                    target.node_id, target.target_id
                ),
                format!(
                    "remove-target --node-id {} --target-id {}",
                    target.node_id, target.target_id
                ),
            ]
        })
        .collect();
    join_lines(&lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaintable_common::{ChainTableType, TopologyParams};
    use chaintable_placement::{IncidenceRelation, generate_chains};
    use tempfile::tempdir;

    fn chains(scheme: ChainTableType) -> Vec<Chain> {
        let params = TopologyParams {
            chain_table_type: scheme,
            node_id_begin: 1,
            node_id_end: 4,
            ..TopologyParams::default()
        };
        let relation = IncidenceRelation::from_pairs([(1, 1), (2, 1), (3, 2), (4, 2)]);
        generate_chains(&params, &relation).unwrap().into_chains()
    }

    #[test]
    fn test_render_chains_csv() {
        let csv = render_chains_csv(&chains(ChainTableType::Cr));
        assert_eq!(
            csv,
            "ChainId,TargetId,TargetId\n\
             1000100001,1000000100101,1000000200101\n\
             1000100002,1000000300101,1000000400101\n"
        );
    }

    #[test]
    fn test_render_chain_table_csv() {
        let csv = render_chain_table_csv(&chains(ChainTableType::Ec));
        assert_eq!(
            csv,
            "ChainId\n1000100001\n1000100002\n1000100003\n1000100004\n"
        );
    }

    #[test]
    fn test_render_create_target_cmds() {
        let output = OutputConfig {
            chunk_sizes: vec!["64KiB".to_string(), "512KiB".to_string()],
            ..OutputConfig::default()
        };
        let cmds = render_create_target_cmds(&chains(ChainTableType::Cr), &output);
        let first = cmds.lines().next().unwrap();
        assert_eq!(
            first,
            "create-target --node-id 1 --disk-index 0 --target-id 1000000100101 \
             --chain-id 1000100001 --chunk-size 64KiB 512KiB --use-new-chunk-engine"
        );
        assert_eq!(cmds.lines().count(), 4);
    }

    #[test]
    fn test_render_create_target_cmds_without_options() {
        let output = OutputConfig {
            use_new_chunk_engine: false,
            ..OutputConfig::default()
        };
        let cmds = render_create_target_cmds(&chains(ChainTableType::Ec), &output);
        assert!(cmds.lines().all(|line| line.ends_with(char::is_numeric)));
    }

    #[test]
    fn test_render_remove_target_cmds() {
        let cmds = render_remove_target_cmds(&chains(ChainTableType::Cr));
        let lines: Vec<&str> = cmds.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "offline-target --node-id 1 --target-id 1000000100101");
        assert_eq!(lines[1], "remove-target --node-id 1 --target-id 1000000100101");
        assert_eq!(lines[7], "remove-target --node-id 4 --target-id 1000000400101");
    }

    #[test]
    fn test_write_to_creates_all_files() {
        let dir = tempdir().unwrap();
        let out_dir = dir.path().join("output");
        let rendered = RenderedOutput::render(&chains(ChainTableType::Cr), &OutputConfig::default());
        rendered.write_to(&out_dir).unwrap();

        for name in [CHAINS_FILE, CHAIN_TABLE_FILE, CREATE_TARGET_FILE, REMOVE_TARGET_FILE] {
            assert!(out_dir.join(name).is_file(), "{name} missing");
        }
        let leftovers = std::fs::read_dir(&out_dir)
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        let table = std::fs::read_to_string(out_dir.join(CHAIN_TABLE_FILE)).unwrap();
        assert_eq!(table, "ChainId\n1000100001\n1000100002\n");
    }

    #[test]
    fn test_write_to_rename_failure_discards_staged_files() {
        let dir = tempdir().unwrap();
        let out_dir = dir.path().join("output");
        // A non-empty directory in the way of the second file blocks its rename
        let blocker = out_dir.join(CHAIN_TABLE_FILE);
        std::fs::create_dir_all(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), "x").unwrap();

        let rendered = RenderedOutput::render(&chains(ChainTableType::Cr), &OutputConfig::default());
        assert!(rendered.write_to(&out_dir).is_err());

        let leftovers = std::fs::read_dir(&out_dir)
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
        assert!(!out_dir.join(CREATE_TARGET_FILE).exists());
        assert!(!out_dir.join(REMOVE_TARGET_FILE).exists());
    }
}
