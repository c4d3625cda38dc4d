//! Tangle CLI
//!
//! Deferred-ambiguity parsing from the command line.

use tangle_diagnostic::emitter::ColorMode;
use tanglec::commands::{check_grammar, explain_error, print_tokens, run_parse};
use tanglec::ParseArgs;

fn main() {
    tanglec::init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "check" => {
            let Some(path) = positional(&args[2..]).first().copied() else {
                eprintln!("Usage: tangle check <grammar> [--list] [--color=<mode>]");
                std::process::exit(1);
            };
            let list = args.iter().any(|a| a == "--list");
            check_grammar(path, color_flag(&args[2..]), list);
        }
        "tokens" => {
            let [grammar, file] = positional(&args[2..])[..] else {
                eprintln!("Usage: tangle tokens <grammar> <file>");
                std::process::exit(1);
            };
            print_tokens(grammar, file, color_flag(&args[2..]));
        }
        "parse" => match ParseArgs::parse(&args[2..]) {
            Ok(parse_args) => run_parse(&parse_args),
            Err(message) => {
                eprintln!("error: {message}");
                eprintln!();
                eprintln!("Usage: tangle parse <grammar> <files...> [options]");
                eprintln!("Run `tangle help` for the list of options.");
                std::process::exit(1);
            }
        },
        "help" | "--help" | "-h" => match args.get(2) {
            Some(code) => explain_error(code),
            None => print_usage(),
        },
        "version" | "--version" | "-V" => {
            println!("Tangle {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

/// Arguments that are neither flags nor the value of `--color`.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--color" {
            iter.next();
        } else if !arg.starts_with('-') {
            out.push(arg.as_str());
        }
    }
    out
}

/// `--color=<mode>` or `--color <mode>` anywhere in `args`; `auto` otherwise.
fn color_flag(args: &[String]) -> ColorMode {
    let value = args.iter().enumerate().find_map(|(i, arg)| {
        if let Some(value) = arg.strip_prefix("--color=") {
            Some(value)
        } else if arg == "--color" {
            args.get(i + 1).map(String::as_str)
        } else {
            None
        }
    });
    match value.map(str::parse::<ColorMode>) {
        Some(Ok(mode)) => mode,
        Some(Err(message)) => {
            eprintln!("error: {message}");
            std::process::exit(1);
        }
        None => ColorMode::Auto,
    }
}

fn print_usage() {
    println!("Tangle (deferred-ambiguity parser)");
    println!();
    println!("Usage: tangle <command> [options]");
    println!();
    println!("Commands:");
    println!("  check <grammar>              Validate a grammar and summarize it");
    println!("  tokens <grammar> <file>      Show how a file is tokenized");
    println!("  parse <grammar> <files...>   Parse files and print their trees");
    println!("  help [code]                  Show this help, or explain an error code");
    println!("  version                      Show version information");
    println!();
    println!("Check options:");
    println!("  --list                       List every production");
    println!();
    println!("Parse options:");
    println!("  --start <rule>               Parse from this rule instead of the start rule");
    println!("  --lookahead <n>              Tokens inspected before forking (default: 2)");
    println!("  --max-fork-span <n>          Tokens a fork may stay open (default: 512)");
    println!("  --max-candidates <n>         Live candidates allowed (default: 256)");
    println!("  --recover <rule>             Parse a sequence of <rule>, skipping broken ones");
    println!("  --sync <a,b,...>             Token kinds that end a broken unit");
    println!("  --stats                      Print fork statistics");
    println!();
    println!("Common options:");
    println!("  --color <mode>               auto (default), always or never");
    println!();
    println!("Environment:");
    println!("  RUST_LOG=tangle_parse=trace  Trace forks, merges and eliminations");
    println!("  TANGLE_LOG_TREE=1            Render traces as an indented tree");
    println!();
    println!("Examples:");
    println!("  tangle check json.tg --list");
    println!("  tangle tokens json.tg data.json");
    println!("  tangle parse json.tg a.json b.json --stats");
    println!("  tangle parse c.tg main.c --recover stmt --sync ';,}}'");
    println!("  tangle help E1001");
}
