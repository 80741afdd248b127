mod mirror;
mod session;
mod view;

use mirror::Mirror;
use nim::wire::ToServer;
use session::Session;
use std::net::{SocketAddr, ToSocketAddrs};
use tokio::io::{AsyncBufReadExt, BufReader};
use view::TerminalView;

fn init_logging() {
    const LOG_ENV: &str = "RUST_LOG";
    use std::str::FromStr;
    use tracing::Level;

    let level = std::env::var(LOG_ENV)
        .map(|env| {
            Level::from_str(env.to_uppercase().as_str())
                .unwrap_or_else(|err| panic!("invalid `{}` environment variable {}", LOG_ENV, err))
        })
        .unwrap_or(Level::INFO);

    // The terminal belongs to the view, so the log goes to a file.
    tracing_subscriber::fmt()
        .with_writer(|| {
            let log_file_path = xdg::BaseDirectories::with_prefix("nim-client")
                .unwrap()
                .get_cache_home()
                .join("client.log");
            if !log_file_path.exists() {
                std::fs::create_dir_all(&log_file_path.parent().unwrap()).unwrap();
            }
            let log_file = std::fs::OpenOptions::new()
                .read(true)
                .append(true)
                .create(true)
                .open(log_file_path)
                .unwrap();
            log_file
        })
        .with_max_level(level)
        .init();
}

fn usage() -> ! {
    eprintln!("Usage: nim-client <serverhost> <serverport> <clienthost> <clientport> <playername>");
    std::process::exit(1);
}

fn resolve(host: &str, port: &str) -> SocketAddr {
    let port: u16 = match port.parse() {
        Ok(port) => port,
        Err(err) => {
            eprintln!("invalid port `{}`: {}", port, err);
            std::process::exit(1);
        }
    };
    match (host, port).to_socket_addrs() {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => addr,
            None => {
                eprintln!("could not resolve `{}`", host);
                std::process::exit(1);
            }
        },
        Err(err) => {
            eprintln!("could not resolve `{}`: {}", host, err);
            std::process::exit(1);
        }
    }
}

struct Config {
    server: SocketAddr,
    local: SocketAddr,
    name: String,
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 5 {
        usage();
    }
    Config {
        server: resolve(&args[0], &args[1]),
        local: resolve(&args[2], &args[3]),
        name: args[4].clone(),
    }
}

/// Parse one line of player input into an intent. `None` means the line was
/// not understood.
fn parse_intent(line: &str) -> Option<ToServer> {
    let mut words = line.split_whitespace();
    match words.next()? {
        "take" => {
            let heap = words.next()?.parse().ok()?;
            let count = words.next()?.parse().ok()?;
            Some(ToServer::Take { heap, count })
        }
        "new" => Some(ToServer::NewGame),
        "quit" => Some(ToServer::Quit),
        _ => None,
    }
}

async fn read_input(session: Session) -> Result<(), session::Error> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            // EOF leaves the session like an explicit quit.
            Ok(None) | Err(_) => {
                session.send(ToServer::Quit).await?;
                return Ok(());
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_intent(&line) {
            Some(intent) => {
                let leaving = intent == ToServer::Quit;
                session.send(intent).await?;
                if leaving {
                    return Ok(());
                }
            }
            None => {
                eprintln!("commands: take <heap> <count> | new | quit");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let config = parse_args();

    let session = Session::create(config.local, config.server, &config.name).await?;
    let mirror = Mirror::new(TerminalView::new());

    let run_session_task = {
        let session = session.clone();
        tokio::spawn(async move { session.run(mirror).await })
    };

    let read_input_task = tokio::spawn(async move { read_input(session).await });

    tokio::select! {
        value = run_session_task => value??,
        value = read_input_task => value??,
    };
    Ok(())
}
