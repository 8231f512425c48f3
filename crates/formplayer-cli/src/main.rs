mod args;
mod render;
mod settings;

use std::env;

use formplayer_core::persistence::HistoryLog;
use formplayer_core::url::UrlFragment;
use formplayer_core::NavEffect;
use formplayer_core::SelectionToken;
use formplayer_core::SessionStore;
use formplayer_gateway::AppCatalog;
use formplayer_gateway::LocalFormplayer;
use tracing_subscriber::EnvFilter;

use crate::args::parse_args;
use crate::args::parse_depth;
use crate::args::parse_inputs;
use crate::args::parse_page;
use crate::args::CliArgs;
use crate::render::render_notice;
use crate::render::render_screen;
use crate::settings::load_config;
use crate::settings::resolve;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args(env::args().skip(1).collect())?;
    let Some(command) = args.command.clone() else {
        print_help();
        return Ok(());
    };

    match command.as_str() {
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("formplayer {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "start" | "select" | "query" | "search" | "page" | "crumb" | "back" | "forward"
        | "open" | "url" => navigate(&command, &args),
        _ => {
            print_help();
            Err(format!("unknown command: {command}").into())
        }
    }
}

fn navigate(command: &str, args: &CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    init_tracing(&config.logging.filter);
    let resolved = resolve(args, &config);

    let catalog = match &resolved.apps_path {
        Some(path) => AppCatalog::load(path)?,
        None => AppCatalog::fixture(),
    };
    let formplayer = LocalFormplayer::new(catalog).with_page_size(config.gateway.page_size);

    let link = match command {
        "open" => {
            let [href] = args.operands.as_slice() else {
                return Err("open takes exactly one link".into());
            };
            Some(UrlFragment::from_href(href)?)
        }
        _ => None,
    };

    let history = HistoryLog::open(&resolved.history_path)?;
    let mut store = SessionStore::open(resolved.app_id.as_str(), history)?
        .with_notice_capacity(config.session.notification_capacity);
    if args.app_id.is_some() && store.descriptor().app_id != resolved.app_id {
        report(store.switch_app(resolved.app_id.as_str(), &formplayer)?);
    }

    let effects = match command {
        "url" => {
            println!("{}", store.url().to_href());
            return Ok(());
        }
        "back" => store.go_back(&formplayer)?,
        "forward" => store.go_forward(&formplayer)?,
        "start" => store.start(&formplayer)?,
        "open" => match &link {
            Some(fragment) => store.open_link(fragment, &formplayer)?,
            None => return Err("open takes exactly one link".into()),
        },
        _ => {
            let mut effects = store.start(&formplayer)?;
            effects.extend(match command {
                "select" => {
                    if args.operands.is_empty() {
                        return Err("select takes at least one token".into());
                    }
                    let mut effects = Vec::new();
                    for raw in &args.operands {
                        effects.extend(
                            store.select(SelectionToken::parse_untyped(raw), &formplayer)?,
                        );
                    }
                    effects
                }
                "query" => store.submit_query(parse_inputs(&args.operands)?, &formplayer)?,
                "search" => {
                    let text = args.operands.join(" ");
                    store.set_search(Some(text), &formplayer)?
                }
                "page" => {
                    let page = parse_page(&args.operands)?;
                    store.set_page(page.saturating_sub(1), &formplayer)?
                }
                "crumb" => store.navigate_to_depth(parse_depth(&args.operands)?, &formplayer)?,
                other => return Err(format!("unknown command: {other}").into()),
            });
            effects
        }
    };

    report(effects);
    for line in render_screen(store.screen(), store.response()) {
        println!("{line}");
    }
    Ok(())
}

fn report(effects: Vec<NavEffect>) {
    for effect in effects {
        match effect {
            NavEffect::Notify(notice) => eprintln!("{}", render_notice(&notice)),
            NavEffect::SessionCleared => eprintln!("session cleared"),
            NavEffect::UrlChanged(fragment) => {
                tracing::debug!(url = %fragment.to_href(), "url changed");
            }
            NavEffect::Render(_) => {}
        }
    }
}

fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_help() {
    println!("formplayer {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  formplayer start");
    println!("  formplayer select TOKEN...      (command index, case id or `action N`)");
    println!("  formplayer query KEY=VALUE...");
    println!("  formplayer search [TEXT]");
    println!("  formplayer page N               (1-based)");
    println!("  formplayer crumb DEPTH");
    println!("  formplayer back | forward");
    println!("  formplayer open '#...'");
    println!("  formplayer url");
    println!("  formplayer --help | --version");
    println!("Options:");
    println!("  --config PATH   --apps PATH   --history PATH   --app ID");
}
