use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use edumate_rust::ImportArgs;

const USAGE: &str = "usage: edumate-import <file.json> [--document <id>] [--source-uri <uri>]";

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    match edumate_rust::run_import(args).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            eprintln!("edumate-import: nothing was imported");
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("edumate-import fatal: {e:#}");
            std::process::exit(1);
        }
    }
}

fn parse_args() -> Result<ImportArgs> {
    let mut file = None;
    let mut document_id = None;
    let mut source_uri = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--document" => {
                document_id = Some(args.next().ok_or_else(|| anyhow!("--document missing value"))?);
            }
            "--source-uri" => {
                source_uri = Some(args.next().ok_or_else(|| anyhow!("--source-uri missing value"))?);
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with("--") => return Err(anyhow!("Unknown argument: {other}")),
            other => {
                if file.replace(PathBuf::from(other)).is_some() {
                    return Err(anyhow!("only one input file is accepted\n{USAGE}"));
                }
            }
        }
    }

    let file = file.ok_or_else(|| anyhow!("missing input file\n{USAGE}"))?;
    Ok(ImportArgs { file, document_id, source_uri })
}
