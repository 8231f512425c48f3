use std::path::PathBuf;

use formplayer_core::QueryInputs;

/// Global options plus the subcommand and its operands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub apps: Option<PathBuf>,
    pub history: Option<PathBuf>,
    pub app_id: Option<String>,
    pub command: Option<String>,
    pub operands: Vec<String>,
}

pub fn parse_args(args: Vec<String>) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--config" | "--apps" | "--history" | "--app" => {
                let Some(value) = args.get(i + 1) else {
                    return Err(format!("{arg} requires a value"));
                };
                match arg {
                    "--config" => parsed.config = Some(PathBuf::from(value)),
                    "--apps" => parsed.apps = Some(PathBuf::from(value)),
                    "--history" => parsed.history = Some(PathBuf::from(value)),
                    _ => parsed.app_id = Some(value.clone()),
                }
                i += 2;
            }
            other if parsed.command.is_none() => {
                parsed.command = Some(other.to_string());
                i += 1;
            }
            other => {
                parsed.operands.push(other.to_string());
                i += 1;
            }
        }
    }
    Ok(parsed)
}

/// `dob=2001-02-03 name=ada` → query inputs.
pub fn parse_inputs(operands: &[String]) -> Result<QueryInputs, String> {
    let mut inputs = Vec::with_capacity(operands.len());
    for operand in operands {
        let Some((key, value)) = operand.split_once('=') else {
            return Err(format!("expected key=value, got {operand}"));
        };
        if key.is_empty() {
            return Err(format!("empty key in {operand}"));
        }
        inputs.push((key.to_string(), value.to_string()));
    }
    Ok(QueryInputs::new(inputs))
}

pub fn parse_depth(operands: &[String]) -> Result<usize, String> {
    match operands {
        [depth] => depth
            .parse::<usize>()
            .map_err(|_| format!("invalid depth: {depth}")),
        _ => Err("crumb takes exactly one depth".to_string()),
    }
}

pub fn parse_page(operands: &[String]) -> Result<u32, String> {
    match operands {
        [page] => page
            .parse::<u32>()
            .map_err(|_| format!("invalid page: {page}")),
        _ => Err("page takes exactly one page number".to_string()),
    }
}
