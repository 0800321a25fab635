use std::path::PathBuf;
use std::process;

use anyhow::Result;
use bdiff_engine::{bdiff_files, BdiffOptions, DiffAlgorithm};
use clap::Parser;

/// Compute a semantic edit script between two text files.
#[derive(Parser)]
#[command(name = "bdiff", version, about, disable_version_flag = true)]
pub struct Cli {
    /// Print version
    #[arg(
        short = 'v',
        long = "version",
        action = clap::ArgAction::Version,
        value_parser = clap::value_parser!(bool)
    )]
    version: Option<bool>,

    /// File path to the source file
    src: PathBuf,

    /// File path to the destination file
    dest: PathBuf,

    /// Diff algorithm for raw change detection
    #[arg(long, value_name = "algorithm", default_value = "Histogram")]
    diff_algorithm: DiffAlgorithmArg,

    /// Number of spaces a tab character represents
    #[arg(long, value_name = "n", default_value_t = 4)]
    indent_tabs_size: usize,

    /// Minimum number of lines required for a valid move block
    #[arg(long, value_name = "n", default_value_t = 2)]
    min_move_block_length: usize,

    /// Minimum number of lines required for a valid copy block
    #[arg(long, value_name = "n", default_value_t = 2)]
    min_copy_block_length: usize,

    /// Number of context lines above/below a line used for similarity
    #[arg(long, value_name = "n", default_value_t = 4)]
    ctx_length: usize,

    /// Weight of line content similarity in the synthetic score
    #[arg(long, value_name = "w", default_value_t = 0.6)]
    line_sim_weight: f64,

    /// Minimum synthetic similarity to qualify lines as related
    #[arg(long, value_name = "t", default_value_t = 0.5)]
    sim_threshold: f64,

    /// Maximum number of source lines for a valid merge
    #[arg(long, value_name = "n", default_value_t = 8)]
    max_merge_lines: usize,

    /// Maximum number of destination lines for a valid split
    #[arg(long, value_name = "n", default_value_t = 8)]
    max_split_lines: usize,

    /// Count punctuation-only lines toward move block length
    #[arg(long)]
    pure_mv_block_contain_punc: bool,

    /// Count punctuation-only lines toward copy block length
    #[arg(long)]
    pure_cp_block_contain_punc: bool,

    /// Disable line-level updates within move blocks
    #[arg(long = "disable-counting-mv-block-update")]
    disable_counting_mv_block_update: bool,

    /// Disable line-level updates within copy blocks
    #[arg(long = "disable-counting-cp-block-update")]
    disable_counting_cp_block_update: bool,

    /// Disable detection of move operations
    #[arg(long = "disable-identifying-move")]
    disable_identifying_move: bool,

    /// Disable detection of copy operations
    #[arg(long = "disable-identifying-copy")]
    disable_identifying_copy: bool,

    /// Disable detection of single-line update operations
    #[arg(long = "disable-identifying-update")]
    disable_identifying_update: bool,

    /// Disable detection of line split operations
    #[arg(long = "disable-identifying-split")]
    disable_identifying_split: bool,

    /// Disable detection of line merge operations
    #[arg(long = "disable-identifying-merge")]
    disable_identifying_merge: bool,

    /// Print the edit script as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
#[value(rename_all = "PascalCase")]
enum DiffAlgorithmArg {
    Histogram,
    Myers,
}

impl From<DiffAlgorithmArg> for DiffAlgorithm {
    fn from(arg: DiffAlgorithmArg) -> Self {
        match arg {
            DiffAlgorithmArg::Histogram => DiffAlgorithm::Histogram,
            DiffAlgorithmArg::Myers => DiffAlgorithm::Myers,
        }
    }
}

impl Cli {
    fn options(&self) -> BdiffOptions {
        BdiffOptions {
            diff_algorithm: self.diff_algorithm.into(),
            indent_tabs_size: self.indent_tabs_size,
            min_move_block_length: self.min_move_block_length,
            min_copy_block_length: self.min_copy_block_length,
            ctx_length: self.ctx_length,
            line_sim_weight: self.line_sim_weight,
            sim_threshold: self.sim_threshold,
            max_merge_lines: self.max_merge_lines,
            max_split_lines: self.max_split_lines,
            pure_mv_block_contain_punc: self.pure_mv_block_contain_punc,
            pure_cp_block_contain_punc: self.pure_cp_block_contain_punc,
            count_mv_block_update: !self.disable_counting_mv_block_update,
            count_cp_block_update: !self.disable_counting_cp_block_update,
            identify_move: !self.disable_identifying_move,
            identify_copy: !self.disable_identifying_copy,
            identify_update: !self.disable_identifying_update,
            identify_split: !self.disable_identifying_split,
            identify_merge: !self.disable_identifying_merge,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("fatal: {e}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let records = bdiff_files(&cli.src, &cli.dest, &cli.options())?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for record in &records {
            println!("{record}");
        }
    }

    Ok(0)
}
