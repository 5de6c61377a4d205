//! hostctl: 多主机传输层的命令行工具：查看主机目录、发送单次请求
//!
//! Usage:
//!   hostctl hosts [--config <path>]                      Show the host catalog
//!   hostctl call [--config <path>] [--write] <path>      Send one call through the rotating client
//!   hostctl version                                      Show version information

use multihost_transport::{
    CallType, ClientConfig, HostCatalog, HostClient, HostClientBuilder, RequestDescriptor,
    StaticCredentials,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("multihost_transport=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "hosts" => cmd_hosts(&args[2..]),
        "call" => cmd_call(&args[2..]),
        "version" | "--version" | "-V" => cmd_version(),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"hostctl: multihost-transport 命令行工具

USAGE:
    hostctl <COMMAND> [OPTIONS]

COMMANDS:
    hosts [--config <path>]                    Show the host catalog and scopes
    call [--config <path>] [--write] <path>    Send one call and report the hosts tried
    version                                    Show version information
    help                                       Show this help message

ENVIRONMENT:
    MULTIHOST_HOSTS              Host catalog, e.g. "write:w1.example.com,r1.example.com"
    MULTIHOST_CREDENTIALS        Prefix for <PREFIX>_APPLICATION_ID / <PREFIX>_API_KEY
    MULTIHOST_READ_TIMEOUT_MS    Base read deadline (other MULTIHOST_* knobs apply too)
    RUST_LOG                     Log filter (default multihost_transport=info)"#
    );
}

fn cmd_version() {
    println!("hostctl (multihost-transport {})", env!("CARGO_PKG_VERSION"));
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn load_builder(args: &[String]) -> multihost_transport::Result<HostClientBuilder> {
    let mut builder = match flag_value(args, "--config") {
        Some(path) => HostClientBuilder::from_config(ClientConfig::from_path(path)?)?,
        None => HostClientBuilder::new().hosts(HostCatalog::from_env()?),
    };
    if let Ok(prefix) = std::env::var("MULTIHOST_CREDENTIALS") {
        builder = builder.credentials(Arc::new(StaticCredentials::from_env(&prefix)?));
    }
    Ok(builder)
}

fn fail(err: multihost_transport::Error) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}

fn cmd_hosts(args: &[String]) {
    let client = match load_builder(args).and_then(HostClientBuilder::build) {
        Ok(c) => c,
        Err(e) => fail(e),
    };
    print_hosts(&client);
}

fn print_hosts(client: &HostClient) {
    let base = client.config().timeout_for(CallType::Read);
    for host in client.hosts() {
        let scope = host.scope.map(|s| s.as_str()).unwrap_or("read+write");
        let state = if host.is_up { "up" } else { "down" };
        println!(
            "  [{}] {:<40} {:<10} {:<4} retries={} read_timeout={}ms",
            host.index,
            host.url.as_str(),
            scope,
            state,
            host.retry_count,
            host.timeout(base).as_millis()
        );
    }
}

fn cmd_call(args: &[String]) {
    let mut path: Option<&str> = None;
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        match arg.as_str() {
            "--config" => skip_next = true,
            "--write" => {}
            other => path = Some(other),
        }
    }
    let Some(path) = path else {
        eprintln!("Error: call needs a request path, e.g. /1/indexes");
        std::process::exit(1);
    };
    let write = args.iter().any(|a| a == "--write");

    let client = match load_builder(args).and_then(HostClientBuilder::build) {
        Ok(c) => c,
        Err(e) => fail(e),
    };
    let descriptor = if write {
        RequestDescriptor::write(path)
    } else {
        RequestDescriptor::read(path)
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => fail(e.into()),
    };

    match runtime.block_on(client.execute_with_stats(descriptor)) {
        Ok((resp, stats)) => {
            println!(
                "HTTP {} from {} after {} attempt(s) in {}ms",
                resp.status,
                stats.host.as_deref().unwrap_or("-"),
                stats.attempts,
                stats.duration_ms
            );
            for (i, host) in stats.attempted_hosts.iter().enumerate() {
                println!("  attempt {}: {}", i + 1, host);
            }
            println!("{}", resp.text());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            println!("Host state after the call:");
            print_hosts(&client);
            std::process::exit(1);
        }
    }
}
