use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sb3mask-rs",
    about = "Scratch .sb3 obfuscator: renames identifiers and recodes integer literals."
)]
pub struct Args {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        help = "JSON file with obfuscation options. Without it every category is renamed with 10-character random hex and integer literals are recoded."
    )]
    pub options: Option<PathBuf>,
}
