use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ezf", about = "easyfile: crash-safe JSON and YAML file tool", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults file (YAML, or JSON by extension)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print files concurrently, in the order given
    Cat(CatArgs),
    /// Convert between JSON and YAML, chosen by extension
    Convert(ConvertArgs),
    /// Re-encode a file in place
    Fmt(FmtArgs),
    /// Check that files decode cleanly
    Check(CheckArgs),
}

#[derive(Args)]
pub struct CatArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct ConvertArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    /// JSON indentation; 0 writes compact JSON
    #[arg(long)]
    pub indent: Option<usize>,
    /// Skip the fsync before the rename
    #[arg(long)]
    pub no_sync: bool,
}

#[derive(Args)]
pub struct FmtArgs {
    pub path: PathBuf,
    #[arg(long)]
    pub indent: Option<usize>,
}

#[derive(Args)]
pub struct CheckArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cat() {
        let cli = Cli::try_parse_from(["ezf", "cat", "a.txt", "b.txt"]).unwrap();
        let Command::Cat(args) = cli.command else {
            panic!("expected cat");
        };
        assert_eq!(args.paths, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
    }

    #[test]
    fn parse_cat_requires_paths() {
        assert!(Cli::try_parse_from(["ezf", "cat"]).is_err());
    }

    #[test]
    fn parse_convert() {
        let cli = Cli::try_parse_from(["ezf", "convert", "in.json", "out.yaml", "--no-sync"]).unwrap();
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.input, PathBuf::from("in.json"));
        assert_eq!(args.output, PathBuf::from("out.yaml"));
        assert!(args.no_sync);
        assert_eq!(args.indent, None);
    }

    #[test]
    fn parse_fmt_indent() {
        let cli = Cli::try_parse_from(["ezf", "fmt", "conf.json", "--indent", "4"]).unwrap();
        let Command::Fmt(args) = cli.command else {
            panic!("expected fmt");
        };
        assert_eq!(args.indent, Some(4));
    }

    #[test]
    fn parse_check() {
        let cli = Cli::try_parse_from(["ezf", "check", "a.json", "b.yml"]).unwrap();
        assert!(matches!(cli.command, Command::Check(_)));
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from(["ezf", "check", "a.json", "-v", "--config", "ezf.yaml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("ezf.yaml")));
    }
}
