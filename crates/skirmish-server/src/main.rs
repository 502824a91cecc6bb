// main.rs — Entry point. Converted in spirit from myq2-sys/src/main.rs:
// parse argv, bind the socket, hand off to the frame loop. Anything that
// can fail here is fatal; everything past `Server::new` is infallible and
// runs until the process is killed.

use skirmish_server::{config, logging, net, server::Server, tick};

fn main() {
    let config = match config::parse_args(std::env::args()) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("usage: skirmish-server [port] [--multiplayer-test] [--verbose]");
            eprintln!("{message}");
            std::process::exit(1);
        }
    };

    logging::set_verbose(config.verbose);

    let socket = match net::bind(config.port) {
        Ok(socket) => socket,
        Err(e) => {
            eprintln!("failed to bind udp port {}: {e}", config.port);
            std::process::exit(1);
        }
    };

    logging::log_info(&format!(
        "skirmish-server listening on {} (ai_enabled={})",
        config.port, config.ai_enabled
    ));

    let mut server = Server::new(config, socket);
    tick::run(&mut server);
}
