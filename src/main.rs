// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Krang XWin CLI
//!
//! Inspect wire messages and preview pages, or run an in-process exchange
//! between a preview window and a CMS window.

use std::env;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use serde_json::json;

use krang_xwin::behaviour::Bindings;
use krang_xwin::dom::load_html_file;
use krang_xwin::preview::{is_on_edit_screen_query, template_finder_click, IS_ON_EDIT_SCREEN};
use krang_xwin::rpc::{ChannelConfig, Handlers, IncomingEnvelope, OutgoingEnvelope, Responder, WindowInfoService};
use krang_xwin::{krang_rules, open_window, RpcChannel};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "krang_xwin=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "decode" => {
            if args.len() < 3 {
                eprintln!("Usage: krang-xwin decode <message>");
                return ExitCode::from(1);
            }
            decode_message(&args[2])
        }
        "behaviours" => {
            if args.len() < 3 {
                eprintln!("Usage: krang-xwin behaviours <html file>");
                return ExitCode::from(1);
            }
            list_behaviours(&args[2])
        }
        "finder" => {
            if args.len() < 4 {
                eprintln!("Usage: krang-xwin finder <html file> <element id> [cms url]");
                return ExitCode::from(1);
            }
            let cms_url = args.get(4).map(String::as_str).unwrap_or("http://localhost");
            find_template(&args[2], &args[3], cms_url)
        }
        "demo" => run_demo().await,
        "--help" | "-h" | "help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "--version" | "-v" | "version" => {
            println!("krang-xwin {}", krang_xwin::VERSION);
            return ExitCode::SUCCESS;
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"Krang XWin - Cross-window RPC for the Krang CMS UI

USAGE:
    krang-xwin <COMMAND> [OPTIONS]

COMMANDS:
    decode <message>                 Decode a request or response message
    behaviours <html file>           List behaviours bound in a page
    finder <html file> <id> [cms]    Show template info for an element
    demo                             Run an info query between two windows
    help                             Show this help message
    version                          Show version information

EXAMPLES:
    krang-xwin decode '{{"type":"request","callId":1,"cmsURL":"https://cms.example.com"}}'
    krang-xwin behaviours workspace.html
    krang-xwin finder preview.html para https://cms.example.com
"#
    );
}

fn decode_message(data: &str) -> anyhow::Result<()> {
    if data.trim_start().starts_with('{') {
        let request = OutgoingEnvelope::decode(data).context("decoding request")?;
        println!("=== Request ===");
        println!("Type: {}", request.operation);
        match request.call_id {
            Some(id) => println!("Call: {}", id),
            None => println!("Call: (none)"),
        }
        println!("{}", serde_json::to_string_pretty(&request.options)?);
        return Ok(());
    }

    let response = IncomingEnvelope::decode(data).context("decoding response")?;
    println!("=== Response ===");
    println!("Tag: {} (terminal: {})", response.tag, response.tag.is_terminal());
    match response.call_id {
        Some(id) => println!("Call: {}", id),
        None => println!("Call: (none)"),
    }
    println!("Payload: {}", serde_json::to_string_pretty(&response.payload)?);
    println!("Prefs: {}", response.prefs);
    println!("Config: {}", response.config);
    Ok(())
}

fn list_behaviours(path: &str) -> anyhow::Result<()> {
    let document = load_html_file(path).with_context(|| format!("loading {}", path))?;
    let mut rules = krang_rules()?;
    let mut bindings = Bindings::new();
    let applied = rules.apply(&document, &mut bindings);

    println!("=== Behaviours ({} bound) ===", applied);
    for (node, binding) in bindings.iter() {
        println!("  - node {:?}: {:?}", node, binding);
    }
    Ok(())
}

fn find_template(path: &str, element_id: &str, cms_url: &str) -> anyhow::Result<()> {
    let document = load_html_file(path).with_context(|| format!("loading {}", path))?;
    let element = document
        .get_element_by_id(element_id)
        .ok_or_else(|| anyhow!("no element with id '{}'", element_id))?;

    match template_finder_click(&element, cms_url)? {
        Some(click) => {
            println!("{}", click.popup.header);
            println!("{}", click.popup.body);
        }
        None => println!("Element is part of the finder UI"),
    }
    Ok(())
}

async fn run_demo() -> anyhow::Result<()> {
    let cms_url = "https://cms.example.com";
    let (preview, preview_inbox) = open_window("https://www.example.com/story.html")?;
    let (cms, cms_inbox) = open_window("https://cms.example.com/krang/")?;

    let mut responder = Responder::new(cms.clone(), cms_inbox, "https://www.example.com")?;
    let service = WindowInfoService::new(|question: &str| match question {
        IS_ON_EDIT_SCREEN => json!("yes"),
        _ => json!("no"),
    });
    let server = tokio::spawn(async move { responder.serve_one(&service).await });

    let mut channel = RpcChannel::new(preview, preview_inbox, cms_url)?.with_config(ChannelConfig::immediate());
    let query = is_on_edit_screen_query(cms_url);
    query.invoke(
        &mut channel,
        &cms,
        Handlers::new()
            .response(|answer, _, _| println!("{}? {}", IS_ON_EDIT_SCREEN, answer))
            .finish(|_, _, _| println!("Query finished")),
    )?;

    channel.run_until_settled().await?;
    server.await.context("responder task")??;
    Ok(())
}
