use nim_server::Server;
use std::net::{SocketAddr, ToSocketAddrs};

fn init_logging() {
    const LOG_ENV: &str = "RUST_LOG";
    use std::str::FromStr;
    use tracing::Level;
    use tracing_subscriber::EnvFilter;

    let filter = std::env::var(LOG_ENV)
        .map(|env| {
            EnvFilter::from_str(env.to_uppercase().as_str())
                .unwrap_or_else(|err| panic!("invalid `{}` environment variable {}", LOG_ENV, err))
        })
        .unwrap_or(EnvFilter::default().add_directive(Level::INFO.into()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn usage() -> ! {
    eprintln!("Usage: nim-server <host> <port>");
    std::process::exit(1);
}

/// Resolve the `<host> <port>` arguments, exiting with code 1 on any
/// usage or resolution problem.
fn parse_args() -> SocketAddr {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 2 {
        usage();
    }
    let port: u16 = match args[1].parse() {
        Ok(port) => port,
        Err(err) => {
            eprintln!("invalid port `{}`: {}", args[1], err);
            std::process::exit(1);
        }
    };
    match (args[0].as_str(), port).to_socket_addrs() {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => addr,
            None => {
                eprintln!("could not resolve host `{}`", args[0]);
                std::process::exit(1);
            }
        },
        Err(err) => {
            eprintln!("could not resolve host `{}`: {}", args[0], err);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let addr = parse_args();
    let server = Server::bind(addr).await?;
    tracing::info!("Starting server on {}", server.local_addr()?);
    server.run().await?;
    Ok(())
}
