use std::path::Path;

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use easyfile::{EasyFileConfig, File, Format, OffloadScheduler, WriteOptions};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => EasyFileConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EasyFileConfig::default(),
    };

    match cli.command {
        Command::Cat(args) => cmd_cat(args, &config),
        Command::Convert(args) => cmd_convert(args, &config),
        Command::Fmt(args) => cmd_fmt(args, &config),
        Command::Check(args) => cmd_check(args),
    }
}

fn format_of(path: &Path) -> anyhow::Result<Format> {
    Format::from_path(path).ok_or_else(|| {
        anyhow!(
            "cannot tell the format of {}: expected .json, .yaml or .yml",
            path.display()
        )
    })
}

fn cmd_cat(args: CatArgs, config: &EasyFileConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let texts = runtime.block_on(async {
        let sched = OffloadScheduler::new(config.offload_config())?;
        anyhow::Ok(File::read_many_async(&sched, &args.paths).await?)
    })?;
    for text in texts {
        print!("{text}");
    }
    Ok(())
}

fn cmd_convert(args: ConvertArgs, config: &EasyFileConfig) -> anyhow::Result<()> {
    let from = format_of(&args.input)?;
    let to = format_of(&args.output)?;
    let options = WriteOptions {
        durable: config.durable && !args.no_sync,
    };
    let indent = args.indent.unwrap_or(config.json_indent);

    let value = File::new(&args.input).load(from)?;
    File::new(&args.output)
        .with_write_options(options)
        .dump(&value, to, indent)?;
    println!(
        "{} {} ({}) → {} ({})",
        "✓".green().bold(),
        args.input.display(),
        from,
        args.output.display().to_string().bold(),
        to
    );
    Ok(())
}

fn cmd_fmt(args: FmtArgs, config: &EasyFileConfig) -> anyhow::Result<()> {
    let format = format_of(&args.path)?;
    let file = File::new(&args.path).with_write_options(config.write_options());
    let value = file.load(format)?;
    file.dump(&value, format, args.indent.unwrap_or(config.json_indent))?;
    println!("{} Formatted {}", "✓".green().bold(), args.path.display().to_string().bold());
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let total = args.paths.len();
    let mut failed = 0usize;
    for path in &args.paths {
        let result = format_of(path).and_then(|format| Ok(File::new(path).load(format)?));
        match result {
            Ok(_) => println!("  {} {}", "ok".green(), path.display()),
            Err(err) => {
                failed += 1;
                println!("  {} {}: {}", "failed".red().bold(), path.display(), err);
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {total} files failed to decode");
    }
    println!("{} {} files ok", "✓".green().bold(), total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use easyfile::Value;

    use super::*;

    #[test]
    fn format_inference() {
        assert_eq!(format_of(Path::new("a.YML")).unwrap(), Format::Yaml);
        assert!(format_of(Path::new("notes.txt")).is_err());
    }

    #[test]
    fn convert_json_to_yaml_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("in.json");
        let yaml = dir.path().join("out/converted.yaml");
        let back = dir.path().join("back.json");
        fs::write(&json, r#"{"name":"Easy File","tags":["a","b"],"count":3}"#).unwrap();

        cmd_convert(
            ConvertArgs {
                input: json.clone(),
                output: yaml.clone(),
                indent: None,
                no_sync: true,
            },
            &EasyFileConfig::default(),
        )
        .unwrap();
        let loaded = File::new(&yaml).load_yaml().unwrap();
        assert_eq!(loaded["tags"][1], Value::from("b"));

        cmd_convert(
            ConvertArgs {
                input: yaml,
                output: back.clone(),
                indent: Some(0),
                no_sync: false,
            },
            &EasyFileConfig::default(),
        )
        .unwrap();
        assert_eq!(
            fs::read_to_string(&back).unwrap(),
            r#"{"name":"Easy File","tags":["a","b"],"count":3}"#
        );
    }

    #[test]
    fn fmt_uses_config_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compact.json");
        fs::write(&path, r#"{"a":1}"#).unwrap();
        let config = EasyFileConfig {
            json_indent: 4,
            ..EasyFileConfig::default()
        };

        cmd_fmt(FmtArgs { path: path.clone(), indent: None }, &config).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n    \"a\": 1\n}");
    }

    #[test]
    fn check_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.yaml");
        let bad = dir.path().join("bad.json");
        fs::write(&good, "a: 1\n").unwrap();
        fs::write(&bad, "{bad json").unwrap();

        assert!(cmd_check(CheckArgs { paths: vec![good.clone()] }).is_ok());
        let err = cmd_check(CheckArgs {
            paths: vec![good, bad, PathBuf::from("missing.json")],
        })
        .unwrap_err();
        assert!(err.to_string().contains("2 of 3"), "{err}");
    }

    #[test]
    fn cat_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("here.txt");
        fs::write(&present, "hi").unwrap();
        let args = CatArgs {
            paths: vec![present, dir.path().join("gone.txt")],
        };
        assert!(cmd_cat(args, &EasyFileConfig::default()).is_err());
    }
}
