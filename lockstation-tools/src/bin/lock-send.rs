//! lock-send
//!
//! One-shot sender for scripting and bench checks: encodes a single
//! register operation (or sends a raw command verbatim), then prints
//! whatever the station says back for a short window.

use getopts::Options;
use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use lockstation::command;
use lockstation::link::{self, Channel, RxEvent};
use lockstation_tools::config::PanelConfig;

macro_rules! log{
    ($msg:expr)=>{
    {
        println!("{} {}", chrono::Local::now().format("%T%.3f"), $msg);
    }
    };
    ($f:expr,$($a:tt)*)=>{
    {
        log!(format!($f, $($a)*));
    }
    };
}

fn main() -> ExitCode {
    let mut opts = Options::new();
    opts.optopt("c", "config", "Config file (YAML)", "path");
    opts.optopt("p", "", "Serial port (overrides config)", "port");
    opts.optopt("b", "", "Baud rate (overrides config)", "rate");
    opts.optopt("w", "", "Seconds to wait for responses (default 2)", "seconds");
    opts.optflag("h", "help", "Print this help");

    let args: Vec<String> = env::args().collect();

    macro_rules! die{
        ($f:expr,$($a:tt)*)=>{
        {
            die!(format!($f, $($a)*));
        }
        };
        ($msg:expr)=>{
        {
            eprintln!("ERROR: {}", $msg);
            return ExitCode::FAILURE;
        }
        };
    }
    macro_rules! die_usage{
        ($msg:expr)=>{
        {
            let usage = format!(
                "Usage: {} [options] upsert <register> <key>\n       {} [options] delete <register>\n       {} [options] raw <command>",
                &args[0], &args[0], &args[0]
            );
            die!("{}\n{}", $msg, opts.usage(&usage));
        }
        };
    }

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => die_usage!(f.to_string()),
    };

    if matches.opt_present("h") {
        let usage = format!(
            "Usage: {} [options] upsert <register> <key>\n       {} [options] delete <register>\n       {} [options] raw <command>",
            &args[0], &args[0], &args[0]
        );
        println!("{}", opts.usage(&usage));
        return ExitCode::SUCCESS;
    }

    let mut config = if let Some(path) = matches.opt_str("c") {
        match PanelConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => die!("reading config: {}", e),
        }
    } else {
        PanelConfig::default()
    };
    if let Some(port) = matches.opt_str("p") {
        config.link.port = port;
    }
    if let Some(rate) = matches.opt_str("b") {
        config.link.baud = match rate.parse::<u32>() {
            Ok(rate) => rate,
            Err(_) => die!("invalid baud rate '{}'", rate),
        };
    }
    let wait = matches.opt_str("w").unwrap_or("2".to_string());
    let wait = match wait.parse::<u64>() {
        Ok(seconds) => Duration::from_secs(seconds),
        Err(_) => die!("invalid wait '{}'", wait),
    };

    let cmd = match matches.free.first().map(String::as_str) {
        Some("upsert") => {
            if matches.free.len() != 3 {
                die_usage!("upsert needs a register and a key");
            }
            let register = &matches.free[1];
            if !config.registers.iter().any(|r| r == register) {
                die!("unknown register '{}' (have: {})", register, config.registers.join(", "));
            }
            command::encode_upsert(register, &matches.free[2])
        }
        Some("delete") => {
            if matches.free.len() != 2 {
                die_usage!("delete needs a register");
            }
            let register = &matches.free[1];
            if !config.registers.iter().any(|r| r == register) {
                die!("unknown register '{}' (have: {})", register, config.registers.join(", "));
            }
            command::encode_delete(register)
        }
        Some("raw") => {
            if matches.free.len() < 2 {
                die_usage!("raw needs a command");
            }
            matches.free[1..].join(" ")
        }
        Some(other) => die_usage!(format!("unknown operation '{}'", other)),
        None => die_usage!("need an operation"),
    };

    let mut chan = match Channel::open(
        &config.link.port,
        config.link.baud,
        Duration::from_millis(config.link.timeout_ms),
    ) {
        Ok(chan) => chan,
        Err(e) => die!("opening serial port {}: {:?}", config.link.port, e),
    };
    let rx_chan = match chan.try_clone() {
        Ok(rx_chan) => rx_chan,
        Err(e) => die!("cloning serial handle: {:?}", e),
    };
    let rx = match link::spawn_reader(rx_chan) {
        Ok(rx) => rx,
        Err(e) => die!("starting serial reader thread: {}", e),
    };

    if let Err(e) = chan.write_command(&cmd) {
        die!("sending '{}': {:?}", cmd, e);
    }
    log!("[SENT] - {}", cmd);

    let deadline = Instant::now() + wait;
    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        match rx.recv_timeout(deadline - now) {
            Ok(RxEvent::Line(line)) => log!("[RECEIVED] - {}", line),
            Ok(RxEvent::Error(err)) => log!("[ERROR] - serial read: {}", err),
            Err(_) => break,
        }
    }

    ExitCode::SUCCESS
}
